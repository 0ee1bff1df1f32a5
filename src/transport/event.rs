//! Delivery notifications
//!
//! A [`Listener`] attached to a transport is told when a delivery starts and
//! when it stops. Closures taking an [`Event`] are listeners too.
//!
//! ```rust
//! use mailhog_sendmail::{Event, SendmailTransport};
//!
//! let sender = SendmailTransport::mailhog().with_listener(|event: &Event<'_>| {
//!     println!("{event}");
//! });
//! ```

use std::fmt::{self, Display, Formatter};

use crate::Envelope;

/// Something that happened to a delivery
#[derive(Debug, Clone, Copy)]
pub enum Event<'a> {
    /// The transport is about to hand the message over
    Started {
        /// Identifier of the transport handling the message
        transport: &'a str,
        /// Envelope of the message
        envelope: &'a Envelope,
    },
    /// The transport is done with the message
    Stopped {
        /// Identifier of the transport handling the message
        transport: &'a str,
        /// Envelope of the message
        envelope: &'a Envelope,
        /// Whether the message was accepted
        success: bool,
    },
}

impl Event<'_> {
    /// Identifier of the transport handling the message
    pub fn transport(&self) -> &str {
        match self {
            Event::Started { transport, .. } | Event::Stopped { transport, .. } => transport,
        }
    }

    /// Envelope of the message
    pub fn envelope(&self) -> &Envelope {
        match self {
            Event::Started { envelope, .. } | Event::Stopped { envelope, .. } => envelope,
        }
    }
}

impl Display for Event<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Event::Started { transport, .. } => write!(f, "email transport \"{transport}\" starting"),
            Event::Stopped {
                transport,
                success: true,
                ..
            } => write!(f, "email transport \"{transport}\" stopped"),
            Event::Stopped { transport, .. } => {
                write!(f, "email transport \"{transport}\" stopped with an error")
            }
        }
    }
}

/// Receives delivery events
pub trait Listener: Send + Sync {
    /// Called synchronously from the delivering thread
    fn on_event(&self, event: &Event<'_>);
}

impl<F> Listener for F
where
    F: Fn(&Event<'_>) + Send + Sync,
{
    fn on_event(&self, event: &Event<'_>) {
        self(event)
    }
}
