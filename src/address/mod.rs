//! Email addresses and envelopes

mod envelope;
mod types;

pub use self::{
    envelope::Envelope,
    types::{Address, AddressError},
};
