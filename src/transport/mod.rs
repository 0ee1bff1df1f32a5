//! ### Sending Messages
//!
//! Transports take an already serialized message and hand it over to
//! something able to deliver it. A message is given either as one byte slice
//! or as a sequence of chunks, consumed once and in order.
//!
//! The following transports are available:
//!
//! * The `SendmailTransport` pipes messages into a sendmail-compatible command,
//!   or forwards them to another transport it was configured to delegate to.
//! * The `StubTransport` is useful for debugging and testing, it only records
//!   the messages it is given.

use std::{borrow::Cow, iter};

#[cfg(feature = "tokio1")]
use async_trait::async_trait;

use crate::Envelope;

pub mod error;
pub mod event;
pub mod sendmail;
pub mod stub;

pub use self::error::Error;

/// Blocking Transport method for emails
pub trait Transport {
    /// Response produced by the Transport
    type Ok;
    /// Error produced by the Transport
    type Error;

    /// Sends the email given as one single buffer
    fn send_raw(&self, envelope: &Envelope, email: &[u8]) -> Result<Self::Ok, Self::Error> {
        self.send_chunks(envelope, &mut iter::once(email.to_vec()))
    }

    /// Sends the email given as a sequence of chunks
    fn send_chunks(
        &self,
        envelope: &Envelope,
        chunks: &mut dyn Iterator<Item = Vec<u8>>,
    ) -> Result<Self::Ok, Self::Error>;

    /// Identifies the transport, e.g. in logs
    fn identify(&self) -> Cow<'_, str>;
}

/// tokio 1.x based Transport method for emails
#[cfg(feature = "tokio1")]
#[cfg_attr(docsrs, doc(cfg(feature = "tokio1")))]
#[async_trait]
pub trait AsyncTransport {
    /// Response produced by the Transport
    type Ok;
    /// Error produced by the Transport
    type Error;

    /// Sends the email given as one single buffer
    async fn send_raw(&self, envelope: &Envelope, email: &[u8]) -> Result<Self::Ok, Self::Error> {
        self.send_chunks(envelope, &mut iter::once(email.to_vec()))
            .await
    }

    /// Sends the email given as a sequence of chunks
    async fn send_chunks(
        &self,
        envelope: &Envelope,
        chunks: &mut (dyn Iterator<Item = Vec<u8>> + Send),
    ) -> Result<Self::Ok, Self::Error>;

    /// Identifies the transport, e.g. in logs
    fn identify(&self) -> Cow<'_, str>;
}
