//! The stub transport logs message envelopes as well as contents. It can be useful for testing
//! purposes, or as the delegate of a [`SendmailTransport`](crate::SendmailTransport).
//!
//! #### Stub Transport
//!
//! The stub transport returns the result it was built with, for every message.
//!
//! ```rust
//! use mailhog_sendmail::{Envelope, StubTransport, Transport};
//!
//! # use std::error::Error;
//! # fn main() -> Result<(), Box<dyn Error>> {
//! let envelope = Envelope::parse(Some("nobody@domain.tld"), ["hei@domain.tld"])?;
//!
//! let sender = StubTransport::new_ok();
//! let result = sender.send_raw(&envelope, b"Be happy!");
//! assert!(result.is_ok());
//! assert_eq!(
//!     sender.messages(),
//!     vec![(envelope, "Be happy!".to_owned())]
//! );
//! # Ok(())
//! # }
//! ```

use std::{
    borrow::Cow,
    sync::{Arc, Mutex, PoisonError},
};

#[cfg(feature = "tokio1")]
use async_trait::async_trait;

#[cfg(feature = "tokio1")]
use crate::transport::AsyncTransport;
use crate::{
    transport::error::{self, Error},
    Envelope, Transport,
};

/// Identifier of stub transports, unless overridden
pub const STUB_IDENTIFIER: &str = "stub://";

/// This transport logs messages and always returns the given response
#[derive(Debug, Clone)]
pub struct StubTransport {
    response: Result<(), &'static str>,
    identifier: Cow<'static, str>,
    message_log: Arc<Mutex<Vec<(Envelope, String)>>>,
}

impl StubTransport {
    /// Creates a new transport that always returns the given Result
    ///
    /// An error message is turned into a client [`Error`].
    pub fn new(response: Result<(), &'static str>) -> StubTransport {
        StubTransport {
            response,
            identifier: Cow::Borrowed(STUB_IDENTIFIER),
            message_log: Arc::new(Mutex::new(vec![])),
        }
    }

    /// Creates a new transport that always returns a success response
    pub fn new_ok() -> StubTransport {
        Self::new(Ok(()))
    }

    /// Creates a new transport that always returns an error
    pub fn new_error() -> StubTransport {
        Self::new(Err("stub error"))
    }

    /// Identifies the transport with `identifier` instead of [`STUB_IDENTIFIER`]
    pub fn with_identifier(mut self, identifier: impl Into<Cow<'static, str>>) -> StubTransport {
        self.identifier = identifier.into();
        self
    }

    /// Return all logged messages sent using [`Transport::send_raw`] or
    /// [`Transport::send_chunks`], on this transport or any of its clones
    pub fn messages(&self) -> Vec<(Envelope, String)> {
        self.message_log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn log(
        &self,
        envelope: &Envelope,
        chunks: &mut dyn Iterator<Item = Vec<u8>>,
    ) -> Result<(), Error> {
        let email = chunks.flatten().collect::<Vec<u8>>();

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "{}: {} bytes from {:?} to {:?}",
            self.identifier,
            email.len(),
            envelope.from(),
            envelope.to()
        );

        self.message_log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((envelope.clone(), String::from_utf8_lossy(&email).into_owned()));
        self.response.map_err(error::client)
    }
}

impl Transport for StubTransport {
    type Ok = ();
    type Error = Error;

    fn send_chunks(
        &self,
        envelope: &Envelope,
        chunks: &mut dyn Iterator<Item = Vec<u8>>,
    ) -> Result<Self::Ok, Self::Error> {
        self.log(envelope, chunks)
    }

    fn identify(&self) -> Cow<'_, str> {
        Cow::Borrowed(&*self.identifier)
    }
}

#[cfg(feature = "tokio1")]
#[async_trait]
impl AsyncTransport for StubTransport {
    type Ok = ();
    type Error = Error;

    async fn send_chunks(
        &self,
        envelope: &Envelope,
        chunks: &mut (dyn Iterator<Item = Vec<u8>> + Send),
    ) -> Result<Self::Ok, Self::Error> {
        self.log(envelope, chunks)
    }

    fn identify(&self) -> Cow<'_, str> {
        Cow::Borrowed(&*self.identifier)
    }
}
