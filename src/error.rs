//! Error type for envelopes

use std::{
    error::Error as StdError,
    fmt::{self, Display, Formatter},
};

use crate::address::AddressError;

/// Error type for envelope construction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// Missing to in envelope
    MissingTo,
    /// Invalid address in envelope
    Address(AddressError),
}

impl Display for Error {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            Error::MissingTo => fmt.write_str("missing destination address, invalid envelope"),
            Error::Address(e) => write!(fmt, "invalid address in envelope: {e}"),
        }
    }
}

impl From<AddressError> for Error {
    fn from(err: AddressError) -> Error {
        Error::Address(err)
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Address(e) => Some(e),
            Error::MissingTo => None,
        }
    }
}
