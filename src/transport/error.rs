//! Error and result type for transports

use std::{error::Error as StdError, fmt, io};

use crate::BoxError;

// Inspired by https://github.com/seanmonstar/reqwest/blob/a8566383168c0ef06c21f38cbc9213af6ff6db31/src/error.rs

/// The Errors that may occur when delivering an email
pub struct Error {
    inner: Box<Inner>,
}

struct Inner {
    kind: Kind,
    source: Option<BoxError>,
}

impl Error {
    pub(crate) fn new<E>(kind: Kind, source: Option<E>) -> Error
    where
        E: Into<BoxError>,
    {
        Error {
            inner: Box::new(Inner {
                kind,
                source: source.map(Into::into),
            }),
        }
    }

    /// Returns true if the envelope sender could not be turned into a `-f` flag
    pub fn is_address(&self) -> bool {
        matches!(self.inner.kind, Kind::Address)
    }

    /// Returns true if the delivery process could not be spawned
    pub fn is_spawn(&self) -> bool {
        matches!(self.inner.kind, Kind::Spawn)
    }

    /// Returns true if writing the message to the process failed
    pub fn is_write(&self) -> bool {
        matches!(self.inner.kind, Kind::Write(_))
    }

    /// Returns true if the process exited unsuccessfully
    pub fn is_exit(&self) -> bool {
        matches!(self.inner.kind, Kind::Exit(_))
    }

    /// Returns true if waiting for the process or collecting its output failed
    pub fn is_wait(&self) -> bool {
        matches!(self.inner.kind, Kind::Wait)
    }

    /// Returns true if the error was produced by the transport itself, without a process
    pub fn is_client(&self) -> bool {
        matches!(self.inner.kind, Kind::Client)
    }

    /// Returns the exit code of the process, if it exited unsuccessfully.
    ///
    /// `None` is also returned when the process was terminated by a signal.
    pub fn status(&self) -> Option<i32> {
        match self.inner.kind {
            Kind::Exit(code) => code,
            _ => None,
        }
    }

    /// Returns the number of bytes written to the process before writing failed.
    pub fn bytes_written(&self) -> Option<usize> {
        match self.inner.kind {
            Kind::Write(written) => Some(written),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub(crate) enum Kind {
    /// Missing or unusable envelope sender
    Address,
    /// The process could not be created
    Spawn,
    /// The pipe broke after the given number of bytes
    Write(usize),
    /// The process could not be waited for
    Wait,
    /// The process exited with a failure status
    Exit(Option<i32>),
    /// Error not related to a process
    Client,
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut builder = f.debug_struct("mailhog_sendmail::transport::Error");

        builder.field("kind", &self.inner.kind);

        if let Some(ref source) = self.inner.source {
            builder.field("source", source);
        }

        builder.finish()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.kind {
            Kind::Address => f.write_str("invalid envelope sender")?,
            Kind::Spawn => f.write_str("could not spawn process")?,
            Kind::Write(written) => write!(f, "write failed after {written} bytes")?,
            Kind::Wait => f.write_str("could not wait for process")?,
            Kind::Exit(Some(code)) => write!(f, "process exited with status {code}")?,
            Kind::Exit(None) => f.write_str("process terminated by signal")?,
            Kind::Client => f.write_str("internal client error")?,
        };

        if let Some(ref e) = self.inner.source {
            write!(f, ": {e}")?;
        }

        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.inner.source.as_ref().map(|e| {
            let r: &(dyn std::error::Error + 'static) = &**e;
            r
        })
    }
}

pub(crate) fn address<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Address, Some(e))
}

pub(crate) fn spawn(e: io::Error) -> Error {
    Error::new(Kind::Spawn, Some(e))
}

pub(crate) fn write(written: usize, e: io::Error) -> Error {
    Error::new(Kind::Write(written), Some(e))
}

pub(crate) fn wait<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Wait, Some(e))
}

/// Builds the error for an unsuccessful exit, using stderr as diagnostic and
/// falling back to stdout when stderr is empty.
pub(crate) fn exit(code: Option<i32>, stdout: &[u8], stderr: &[u8]) -> Error {
    let diagnostic = [stderr, stdout]
        .into_iter()
        .map(|out| String::from_utf8_lossy(out).trim().to_owned())
        .find(|out| !out.is_empty());
    Error::new(Kind::Exit(code), diagnostic)
}

pub(crate) fn client<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Client, Some(e))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn exit_prefers_stderr() {
        let err = exit(Some(75), b"queued\n", b"  temporary failure\n");
        assert!(err.is_exit());
        assert_eq!(err.status(), Some(75));
        assert_eq!(
            err.to_string(),
            "process exited with status 75: temporary failure"
        );
    }

    #[test]
    fn exit_falls_back_to_stdout() {
        let err = exit(Some(1), b"no route\n", b"");
        assert_eq!(err.to_string(), "process exited with status 1: no route");
    }

    #[test]
    fn exit_without_output_has_no_source() {
        let err = exit(None, b"", b"\n");
        assert!(err.source().is_none());
        assert_eq!(err.status(), None);
        assert_eq!(err.to_string(), "process terminated by signal");
    }

    #[test]
    fn write_reports_progress() {
        let err = write(4096, io::Error::from(io::ErrorKind::BrokenPipe));
        assert!(err.is_write());
        assert_eq!(err.bytes_written(), Some(4096));
        assert!(err.source().is_some());
    }

    #[test]
    fn wait_is_not_a_write_failure() {
        let err = wait(io::Error::from(io::ErrorKind::Interrupted));
        assert!(err.is_wait());
        assert!(!err.is_write());
        assert_eq!(err.bytes_written(), None);
        assert_eq!(err.status(), None);
        assert!(err.to_string().starts_with("could not wait for process: "));
    }
}
