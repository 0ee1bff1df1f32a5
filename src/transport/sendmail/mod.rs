//! The sendmail transport sends the email using a local sendmail command.
//!
//! #### Sendmail Transport
//!
//! The command line is run through the system shell. Unless it already has a
//! ` -f` flag, `-f<sender>` is appended with the shell-escaped envelope sender.
//! The message is written to the standard input of the process with LF line
//! endings, and is dot-stuffed unless the command line contains ` -i` or ` -oi`.
//! An exit status of 0 means the message was accepted.
//!
//! ```rust,no_run
//! use mailhog_sendmail::{Envelope, SendmailTransport, Transport};
//!
//! # use std::error::Error;
//! # fn main() -> Result<(), Box<dyn Error>> {
//! let envelope = Envelope::parse(Some("nobody@domain.tld"), ["hei@domain.tld"])?;
//!
//! let sender = SendmailTransport::new("/usr/sbin/sendmail -t");
//! let result = sender.send_raw(&envelope, b"Subject: Happy new year\r\n\r\nBe happy!\r\n");
//! assert!(result.is_ok());
//! # Ok(())
//! # }
//! ```
//!
//! A transport can also be built around another transport, in which case it
//! only forwards messages to it:
//!
//! ```rust
//! use mailhog_sendmail::{SendmailTransport, StubTransport, Transport};
//!
//! let sender = SendmailTransport::delegated(StubTransport::new_ok());
//! assert_eq!(sender.identify(), "stub://");
//! ```

use std::{
    borrow::Cow,
    fmt::{self, Debug, Display, Formatter},
    sync::Arc,
};

#[cfg(feature = "tokio1")]
use async_trait::async_trait;

pub use self::{
    codec::SendmailCodec,
    command::{has_sender_flag, shell_escape, stuffs_dots, SendmailCommand, MAILHOG_COMMAND},
};
use self::process::ProcessStream;
#[cfg(feature = "tokio1")]
use crate::transport::AsyncTransport;
use crate::{
    transport::{
        error::{self, Error},
        event::{Event, Listener},
    },
    Envelope, Transport,
};

mod codec;
mod command;
mod process;

/// Identifier of transports running a sendmail command
pub const SENDMAIL_IDENTIFIER: &str = "process://sendmail";

type BoxTransport = Box<dyn Transport<Ok = (), Error = Error> + Send + Sync>;

/// Sends an email using a `sendmail` command
pub struct SendmailTransport {
    mode: Mode,
    notifier: Notifier,
}

enum Mode {
    Direct(SendmailCommand),
    Delegated(BoxTransport),
}

impl SendmailTransport {
    /// Creates a new transport running the given sendmail command
    pub fn new<C: Into<SendmailCommand>>(command: C) -> SendmailTransport {
        SendmailTransport {
            mode: Mode::Direct(command.into()),
            notifier: Notifier::default(),
        }
    }

    /// Creates a new transport running MailHog's `mhsendmail`, see
    /// [`MAILHOG_COMMAND`]
    pub fn mailhog() -> SendmailTransport {
        SendmailTransport::new(SendmailCommand::mailhog())
    }

    /// Creates a new transport forwarding every message to `transport`
    pub fn delegated<T>(transport: T) -> SendmailTransport
    where
        T: Transport<Ok = (), Error = Error> + Send + Sync + 'static,
    {
        SendmailTransport {
            mode: Mode::Delegated(Box::new(transport)),
            notifier: Notifier::default(),
        }
    }

    /// Notifies `listener` when deliveries start and stop
    pub fn with_listener<L: Listener + 'static>(mut self, listener: L) -> SendmailTransport {
        self.notifier.listener = Some(Arc::new(listener));
        self
    }

    /// Whether the listener is also notified of messages forwarded to a delegate
    ///
    /// Defaults to `false`, leaving notifications to the delegate.
    pub fn notify_delegated(mut self, notify: bool) -> SendmailTransport {
        self.notifier.delegated = notify;
        self
    }

    /// The command run by the transport, unless it delegates
    pub fn command(&self) -> Option<&SendmailCommand> {
        match &self.mode {
            Mode::Direct(command) => Some(command),
            Mode::Delegated(_) => None,
        }
    }
}

impl Transport for SendmailTransport {
    type Ok = ();
    type Error = Error;

    fn send_chunks(
        &self,
        envelope: &Envelope,
        chunks: &mut dyn Iterator<Item = Vec<u8>>,
    ) -> Result<Self::Ok, Self::Error> {
        let command = match &self.mode {
            Mode::Direct(command) => command,
            Mode::Delegated(transport) if self.notifier.delegated => {
                let id = transport.identify();
                return self
                    .notifier
                    .around(&id, envelope, || transport.send_chunks(envelope, chunks));
            }
            Mode::Delegated(transport) => return transport.send_chunks(envelope, chunks),
        };

        let (line, mut codec) = prepare(command, envelope)?;

        self.notifier.around(SENDMAIL_IDENTIFIER, envelope, || {
            let mut stream = ProcessStream::spawn(command, &line)?;
            let mut buf = Vec::new();
            for chunk in chunks {
                buf.clear();
                codec.encode(&chunk, &mut buf);
                if !buf.is_empty() {
                    stream.write(&buf)?;
                }
            }

            buf.clear();
            codec.finish(&mut buf);
            if !buf.is_empty() {
                stream.write(&buf)?;
            }
            stream.flush()?;
            stream.terminate()
        })
    }

    fn identify(&self) -> Cow<'_, str> {
        match &self.mode {
            Mode::Direct(_) => Cow::Borrowed(SENDMAIL_IDENTIFIER),
            Mode::Delegated(transport) => transport.identify(),
        }
    }
}

impl Display for SendmailTransport {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.identify())
    }
}

impl Debug for SendmailTransport {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut builder = f.debug_struct("SendmailTransport");
        match &self.mode {
            Mode::Direct(command) => builder.field("command", command),
            Mode::Delegated(transport) => builder.field("delegate", &transport.identify()),
        };
        builder.finish_non_exhaustive()
    }
}

/// Asynchronously sends an email using a `sendmail` command
#[cfg(feature = "tokio1")]
#[cfg_attr(docsrs, doc(cfg(feature = "tokio1")))]
pub struct AsyncSendmailTransport {
    mode: AsyncMode,
    notifier: Notifier,
}

#[cfg(feature = "tokio1")]
type BoxAsyncTransport = Box<dyn AsyncTransport<Ok = (), Error = Error> + Send + Sync>;

#[cfg(feature = "tokio1")]
enum AsyncMode {
    Direct(SendmailCommand),
    Delegated(BoxAsyncTransport),
}

#[cfg(feature = "tokio1")]
impl AsyncSendmailTransport {
    /// Creates a new transport running the given sendmail command
    pub fn new<C: Into<SendmailCommand>>(command: C) -> AsyncSendmailTransport {
        AsyncSendmailTransport {
            mode: AsyncMode::Direct(command.into()),
            notifier: Notifier::default(),
        }
    }

    /// Creates a new transport running MailHog's `mhsendmail`, see
    /// [`MAILHOG_COMMAND`]
    pub fn mailhog() -> AsyncSendmailTransport {
        AsyncSendmailTransport::new(SendmailCommand::mailhog())
    }

    /// Creates a new transport forwarding every message to `transport`
    pub fn delegated<T>(transport: T) -> AsyncSendmailTransport
    where
        T: AsyncTransport<Ok = (), Error = Error> + Send + Sync + 'static,
    {
        AsyncSendmailTransport {
            mode: AsyncMode::Delegated(Box::new(transport)),
            notifier: Notifier::default(),
        }
    }

    /// Notifies `listener` when deliveries start and stop
    pub fn with_listener<L: Listener + 'static>(mut self, listener: L) -> AsyncSendmailTransport {
        self.notifier.listener = Some(Arc::new(listener));
        self
    }

    /// Whether the listener is also notified of messages forwarded to a delegate
    pub fn notify_delegated(mut self, notify: bool) -> AsyncSendmailTransport {
        self.notifier.delegated = notify;
        self
    }
}

#[cfg(feature = "tokio1")]
#[async_trait]
impl AsyncTransport for AsyncSendmailTransport {
    type Ok = ();
    type Error = Error;

    async fn send_chunks(
        &self,
        envelope: &Envelope,
        chunks: &mut (dyn Iterator<Item = Vec<u8>> + Send),
    ) -> Result<Self::Ok, Self::Error> {
        use self::process::tokio1::AsyncProcessStream;

        let command = match &self.mode {
            AsyncMode::Direct(command) => command,
            AsyncMode::Delegated(transport) => {
                if !self.notifier.delegated {
                    return transport.send_chunks(envelope, chunks).await;
                }
                let id = transport.identify();
                self.notifier.started(&id, envelope);
                let result = transport.send_chunks(envelope, chunks).await;
                self.notifier.stopped(&id, envelope, result.is_ok());
                return result;
            }
        };

        let (line, mut codec) = prepare(command, envelope)?;

        self.notifier.started(SENDMAIL_IDENTIFIER, envelope);
        let result = async {
            let mut stream = AsyncProcessStream::spawn(command, &line)?;
            let mut buf = Vec::new();
            for chunk in chunks {
                buf.clear();
                codec.encode(&chunk, &mut buf);
                if !buf.is_empty() {
                    stream.write(&buf).await?;
                }
            }

            buf.clear();
            codec.finish(&mut buf);
            if !buf.is_empty() {
                stream.write(&buf).await?;
            }
            stream.flush().await?;
            stream.terminate().await
        }
        .await;
        self.notifier.stopped(SENDMAIL_IDENTIFIER, envelope, result.is_ok());

        result
    }

    fn identify(&self) -> Cow<'_, str> {
        match &self.mode {
            AsyncMode::Direct(_) => Cow::Borrowed(SENDMAIL_IDENTIFIER),
            AsyncMode::Delegated(transport) => transport.identify(),
        }
    }
}

#[cfg(feature = "tokio1")]
impl Display for AsyncSendmailTransport {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.identify())
    }
}

#[cfg(feature = "tokio1")]
impl Debug for AsyncSendmailTransport {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut builder = f.debug_struct("AsyncSendmailTransport");
        match &self.mode {
            AsyncMode::Direct(command) => builder.field("command", command),
            AsyncMode::Delegated(transport) => builder.field("delegate", &transport.identify()),
        };
        builder.finish_non_exhaustive()
    }
}

/// Builds the command line for `envelope` and the codec matching it.
fn prepare(
    command: &SendmailCommand,
    envelope: &Envelope,
) -> Result<(String, SendmailCodec), Error> {
    let sender = envelope
        .from()
        .ok_or_else(|| error::address("missing envelope sender"))?;
    let line = command.line_for(sender)?;
    let codec = SendmailCodec::new(stuffs_dots(&line));
    Ok((line, codec))
}

#[derive(Default)]
struct Notifier {
    listener: Option<Arc<dyn Listener>>,
    /// Also notify around deliveries forwarded to a delegate
    delegated: bool,
}

impl Notifier {
    fn around<F>(&self, transport: &str, envelope: &Envelope, deliver: F) -> Result<(), Error>
    where
        F: FnOnce() -> Result<(), Error>,
    {
        self.started(transport, envelope);
        let result = deliver();
        self.stopped(transport, envelope, result.is_ok());
        result
    }

    fn started(&self, transport: &str, envelope: &Envelope) {
        self.emit(&Event::Started {
            transport,
            envelope,
        });
    }

    fn stopped(&self, transport: &str, envelope: &Envelope, success: bool) {
        self.emit(&Event::Stopped {
            transport,
            envelope,
            success,
        });
    }

    fn emit(&self, event: &Event<'_>) {
        #[cfg(feature = "tracing")]
        tracing::debug!("{event}");

        if let Some(listener) = &self.listener {
            listener.on_event(event);
        }
    }
}
