//! Child-process transport over tokio pipes.

use super::Transport;
use async_trait::async_trait;
use std::ffi::{OsStr, OsString};
use std::io;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::debug;

/// A spawned `sqlite3` with piped stdin/stdout. stderr is inherited so the
/// shell's own diagnostics reach the terminal.
#[derive(Debug)]
pub struct ProcessTransport {
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: Option<Lines<BufReader<ChildStdout>>>,
}

impl ProcessTransport {
    /// Spawn `program` with `args`. The child is killed if the transport is
    /// dropped without `shutdown`.
    pub fn spawn<S: AsRef<OsStr>>(program: S, args: &[OsString]) -> io::Result<Self> {
        let mut child = Command::new(program.as_ref())
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()?;

        debug!(
            program = %program.as_ref().to_string_lossy(),
            pid = ?child.id(),
            "spawned sqlite3"
        );

        let stdin = child.stdin.take();
        let stdout = child.stdout.take().map(|out| BufReader::new(out).lines());

        Ok(ProcessTransport { child, stdin, stdout })
    }

    /// OS process id, while the child is running
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }
}

#[async_trait]
impl Transport for ProcessTransport {
    async fn send(&mut self, text: &str) -> io::Result<()> {
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "stdin already closed"))?;
        stdin.write_all(text.as_bytes()).await?;
        stdin.flush().await
    }

    async fn recv_line(&mut self) -> io::Result<Option<String>> {
        match self.stdout.as_mut() {
            Some(lines) => lines.next_line().await,
            None => Ok(None),
        }
    }

    async fn shutdown(&mut self) -> io::Result<Option<i32>> {
        drop(self.stdin.take());
        drop(self.stdout.take());
        let status = self.child.wait().await?;
        debug!(?status, "sqlite3 exited");
        Ok(status.code())
    }
}
