use crate::command::SyncCommand;
use crate::error::Error;
use crate::pump::RunEnd;
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::process::{ExitStatus, Stdio};
use tokio::io::BufReader;
use tokio::process::{Child, Command};
use tracing::{debug, error};

/// Readable end of the child's combined stdout/stderr.
#[cfg(unix)]
pub type OutputStream = tokio::net::unix::pipe::Receiver;

#[cfg(not(unix))]
pub type OutputStream = tokio::process::ChildStdout;

/// A running rsync process and the single reader of its output.
///
/// Created by [`launch`] and consumed by [`ChildProcessHandle::release_until`].
pub struct ChildProcessHandle {
    pid: Option<u32>,
    output: BufReader<OutputStream>,
    child: Child,
}

impl ChildProcessHandle {
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn output_mut(&mut self) -> &mut BufReader<OutputStream> {
        &mut self.output
    }

    /// Close the output stream and reap the process.
    ///
    /// Unless the run ended because rsync closed its output, the process is
    /// killed first so it cannot outlive the run. After end-of-stream the
    /// wait is still raced against `cancel`; if that wins the process is
    /// killed and the returned end becomes [`RunEnd::Cancelled`].
    pub async fn release_until<F>(
        self,
        end: RunEnd,
        mut cancel: Pin<&mut F>,
    ) -> (RunEnd, Option<ExitStatus>)
    where
        F: Future<Output = ()>,
    {
        let ChildProcessHandle {
            pid,
            output,
            mut child,
        } = self;
        drop(output);

        let mut end = end;
        if end == RunEnd::EndOfStream {
            // cancel has not fired yet, otherwise the pump would have ended
            // with Cancelled
            let exited = tokio::select! {
                biased;
                status = child.wait() => Some(status),
                _ = cancel.as_mut() => None,
            };
            if let Some(status) = exited {
                return (end, reaped(pid, status));
            }
            debug!("Cancelled while waiting for rsync (pid {:?}) to exit", pid);
            end = RunEnd::Cancelled;
        }

        debug!("Killing rsync (pid {:?}) after {:?}", pid, end);
        if let Err(err) = child.start_kill() {
            debug!("rsync (pid {:?}) already gone: {}", pid, err);
        }
        let status = child.wait().await;
        (end, reaped(pid, status))
    }
}

fn reaped(pid: Option<u32>, status: io::Result<ExitStatus>) -> Option<ExitStatus> {
    match status {
        Ok(status) => {
            debug!("rsync (pid {:?}) exited: {}", pid, status);
            Some(status)
        }
        Err(err) => {
            error!("Failed to reap rsync (pid {:?}): {}", pid, err);
            None
        }
    }
}

/// Spawn `command` with stdout and stderr merged into one non-blocking
/// stream. Must be called from within a tokio runtime.
pub fn launch(command: &SyncCommand) -> Result<ChildProcessHandle, Error> {
    let (child, output) =
        spawn_merged(command).map_err(|err| map_spawn_error(err, &command.program))?;

    let pid = child.id();
    debug!("Spawned '{}' with pid {:?}", command, pid);

    Ok(ChildProcessHandle {
        pid,
        output: BufReader::new(output),
        child,
    })
}

fn configure(command: &SyncCommand) -> Command {
    let mut cmd = Command::new(&command.program);
    cmd.args(&command.args)
        .stdin(Stdio::null())
        .kill_on_drop(true);
    cmd
}

#[cfg(unix)]
fn spawn_merged(command: &SyncCommand) -> io::Result<(Child, OutputStream)> {
    use std::os::fd::OwnedFd;
    use tokio::net::unix::pipe;

    let (reader, writer) = io::pipe()?;
    let stderr_writer = writer.try_clone()?;

    // The Command holds the parent's copies of the write end; it has to be
    // dropped before end-of-stream can ever be observed.
    let child = {
        let mut cmd = configure(command);
        cmd.stdout(writer).stderr(stderr_writer);
        cmd.spawn()?
    };

    let output = pipe::Receiver::from_owned_fd(OwnedFd::from(reader))?;
    Ok((child, output))
}

#[cfg(not(unix))]
fn spawn_merged(command: &SyncCommand) -> io::Result<(Child, OutputStream)> {
    let mut cmd = configure(command);
    cmd.stdout(Stdio::piped()).stderr(Stdio::inherit());
    let mut child = cmd.spawn()?;
    let output = child
        .stdout
        .take()
        .ok_or_else(|| io::Error::other("Failed to capture stdout"))?;
    Ok((child, output))
}

fn map_spawn_error(err: io::Error, program: &str) -> Error {
    error!("Failed to spawn '{}': {} (kind: {:?})", program, err, err.kind());
    if err.kind() == io::ErrorKind::NotFound {
        Error::CommandNotFound(program.to_string())
    } else {
        Error::Launch {
            program: program.to_string(),
            source: err,
        }
    }
}
