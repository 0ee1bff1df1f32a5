//! mailhog-sendmail delivers already-serialized emails by piping them into a local
//! sendmail-compatible binary, [MailHog]'s `mhsendmail` by default.
//!
//! The crate is built around a small [`Transport`] abstraction. The
//! [`SendmailTransport`] implements it by spawning the configured command through
//! the system shell, adding a `-f<sender>` flag when the command has none, and
//! writing the message to the child's standard input with LF line endings. Unless
//! the command line contains `-i` or `-oi`, lines starting with a `.` are
//! dot-stuffed so that the binary does not mistake them for the end of the data.
//!
//! ```rust,no_run
//! use mailhog_sendmail::{Address, Envelope, SendmailTransport, Transport};
//!
//! # use std::error::Error;
//! # fn main() -> Result<(), Box<dyn Error>> {
//! let envelope = Envelope::new(
//!     Some("nobody@domain.tld".parse::<Address>()?),
//!     vec!["hei@domain.tld".parse::<Address>()?],
//! )?;
//!
//! let sender = SendmailTransport::mailhog();
//! sender.send_raw(&envelope, b"Subject: Happy new year\r\n\r\nBe happy!\r\n")?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! * **tracing** (default): log the start and end of every delivery with [tracing]
//! * **serde**: (de)serialize addresses, envelopes and sendmail commands
//! * **tokio1**: [`AsyncSendmailTransport`] and the [`AsyncTransport`] trait, based on tokio 1.x
//!
//! [MailHog]: https://github.com/mailhog/MailHog
//! [tracing]: https://docs.rs/tracing

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]
#![deny(
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unused_import_braces,
    rust_2018_idioms,
    clippy::string_add,
    clippy::string_add_assign,
    clippy::clone_on_ref_ptr,
    clippy::verbose_file_reads,
    clippy::unnecessary_self_imports,
    clippy::string_to_string,
    clippy::mem_forget,
    clippy::cast_lossless,
    clippy::inefficient_to_string,
    clippy::inline_always,
    clippy::linkedlist,
    clippy::macro_use_imports,
    clippy::manual_assert,
    clippy::unnecessary_join,
    clippy::wildcard_imports,
    clippy::zero_sized_map_values
)]

pub mod address;
pub mod error;
pub mod transport;

#[cfg(feature = "tokio1")]
pub use tokio1_crate as tokio1;

use std::error::Error as StdError;

#[doc(inline)]
pub use crate::address::{Address, AddressError, Envelope};
#[doc(inline)]
pub use crate::error::Error;
#[cfg(feature = "tokio1")]
#[doc(inline)]
pub use crate::transport::{sendmail::AsyncSendmailTransport, AsyncTransport};
#[doc(inline)]
pub use crate::transport::{
    event::{Event, Listener},
    sendmail::{SendmailCodec, SendmailCommand, SendmailTransport},
    stub::StubTransport,
    Transport,
};

pub(crate) type BoxError = Box<dyn StdError + Send + Sync>;
