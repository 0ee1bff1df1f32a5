//! Child processes fed through their standard input
//!
//! A stream goes through spawn, any number of writes, flush, then terminate.
//! The output of the child is read in the background from spawn on, so a
//! child writing more than a pipe buffer never blocks on it. Dropping a stream
//! before it was terminated kills and reaps the child, so no process or pipe
//! outlives a failed delivery.

use std::{
    io::{self, Read, Write},
    process::{Child, ChildStdin, Output},
    thread::{self, JoinHandle},
};

use super::command::SendmailCommand;
use crate::transport::error::{self, Error};

type Drain = JoinHandle<io::Result<Vec<u8>>>;

pub(super) struct ProcessStream {
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stdout: Option<Drain>,
    stderr: Option<Drain>,
    written: usize,
}

impl ProcessStream {
    pub(super) fn spawn(command: &SendmailCommand, line: &str) -> Result<Self, Error> {
        let mut child = command.process(line).spawn().map_err(error::spawn)?;
        let stdin = child.stdin.take();
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        Ok(Self {
            child: Some(child),
            stdin,
            stdout,
            stderr,
            written: 0,
        })
    }

    pub(super) fn write(&mut self, chunk: &[u8]) -> Result<(), Error> {
        let stdin = self.stdin.as_mut().ok_or_else(|| closed(self.written))?;
        match stdin.write_all(chunk) {
            Ok(()) => {
                self.written += chunk.len();
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Err(self.broken_pipe(e)),
            Err(e) => Err(error::write(self.written, e)),
        }
    }

    /// Flushes and closes the standard input of the child
    pub(super) fn flush(&mut self) -> Result<(), Error> {
        if let Some(mut stdin) = self.stdin.take() {
            stdin.flush().map_err(|e| error::write(self.written, e))?;
        }
        Ok(())
    }

    /// Waits for the child to exit
    pub(super) fn terminate(mut self) -> Result<(), Error> {
        self.flush()?;
        match self.wait()? {
            Some(output) => check(&output),
            None => Ok(()),
        }
    }

    /// The child stopped reading: its exit status explains why, if it failed
    fn broken_pipe(&mut self, e: io::Error) -> Error {
        self.stdin = None;
        match self.wait() {
            Ok(Some(output)) if !output.status.success() => unsuccessful(&output),
            _ => error::write(self.written, e),
        }
    }

    fn wait(&mut self) -> Result<Option<Output>, Error> {
        let Some(mut child) = self.child.take() else {
            return Ok(None);
        };

        let status = child.wait().map_err(error::wait)?;
        Ok(Some(Output {
            status,
            stdout: join(self.stdout.take())?,
            stderr: join(self.stderr.take())?,
        }))
    }
}

impl Drop for ProcessStream {
    fn drop(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        // readers stop by themselves once the pipes are closed
    }
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> Drain {
    thread::spawn(move || {
        let mut buf = Vec::new();
        pipe.read_to_end(&mut buf)?;
        Ok(buf)
    })
}

fn join(drain: Option<Drain>) -> Result<Vec<u8>, Error> {
    match drain {
        Some(handle) => handle
            .join()
            .map_err(|_| error::wait("output reader panicked"))?
            .map_err(error::wait),
        None => Ok(Vec::new()),
    }
}

fn check(output: &Output) -> Result<(), Error> {
    if output.status.success() {
        Ok(())
    } else {
        Err(unsuccessful(output))
    }
}

fn unsuccessful(output: &Output) -> Error {
    error::exit(output.status.code(), &output.stdout, &output.stderr)
}

fn closed(written: usize) -> Error {
    error::write(written, io::ErrorKind::BrokenPipe.into())
}

#[cfg(feature = "tokio1")]
pub(super) mod tokio1 {
    use std::{io, process::Output};

    use tokio1_crate::{
        io::{AsyncRead, AsyncReadExt, AsyncWriteExt},
        process::{Child, ChildStdin, Command},
        task::JoinHandle,
    };

    use super::{check, closed, unsuccessful, SendmailCommand};
    use crate::transport::error::{self, Error};

    type Drain = JoinHandle<io::Result<Vec<u8>>>;

    pub(in crate::transport::sendmail) struct AsyncProcessStream {
        child: Child,
        stdin: Option<ChildStdin>,
        stdout: Option<Drain>,
        stderr: Option<Drain>,
        written: usize,
    }

    impl AsyncProcessStream {
        pub(in crate::transport::sendmail) fn spawn(
            command: &SendmailCommand,
            line: &str,
        ) -> Result<Self, Error> {
            let mut child = Command::from(command.process(line))
                .kill_on_drop(true)
                .spawn()
                .map_err(error::spawn)?;
            let stdin = child.stdin.take();
            let stdout = child.stdout.take().map(drain);
            let stderr = child.stderr.take().map(drain);

            Ok(Self {
                child,
                stdin,
                stdout,
                stderr,
                written: 0,
            })
        }

        pub(in crate::transport::sendmail) async fn write(
            &mut self,
            chunk: &[u8],
        ) -> Result<(), Error> {
            let stdin = self.stdin.as_mut().ok_or_else(|| closed(self.written))?;
            let result = stdin.write_all(chunk).await;
            match result {
                Ok(()) => {
                    self.written += chunk.len();
                    Ok(())
                }
                Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Err(self.broken_pipe(e).await),
                Err(e) => Err(error::write(self.written, e)),
            }
        }

        pub(in crate::transport::sendmail) async fn flush(&mut self) -> Result<(), Error> {
            if let Some(mut stdin) = self.stdin.take() {
                stdin
                    .shutdown()
                    .await
                    .map_err(|e| error::write(self.written, e))?;
            }
            Ok(())
        }

        pub(in crate::transport::sendmail) async fn terminate(mut self) -> Result<(), Error> {
            self.flush().await?;
            let output = self.wait().await?;
            check(&output)
        }

        async fn broken_pipe(&mut self, e: io::Error) -> Error {
            self.stdin = None;
            match self.wait().await {
                Ok(output) if !output.status.success() => unsuccessful(&output),
                _ => error::write(self.written, e),
            }
        }

        async fn wait(&mut self) -> Result<Output, Error> {
            let status = self.child.wait().await.map_err(error::wait)?;
            Ok(Output {
                status,
                stdout: join(self.stdout.take()).await?,
                stderr: join(self.stderr.take()).await?,
            })
        }
    }

    fn drain<R: AsyncRead + Unpin + Send + 'static>(mut pipe: R) -> Drain {
        tokio1_crate::spawn(async move {
            let mut buf = Vec::new();
            pipe.read_to_end(&mut buf).await?;
            Ok(buf)
        })
    }

    async fn join(drain: Option<Drain>) -> Result<Vec<u8>, Error> {
        match drain {
            Some(handle) => handle.await.map_err(error::wait)?.map_err(error::wait),
            None => Ok(Vec::new()),
        }
    }
}
