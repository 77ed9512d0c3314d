/// Transport - the byte channel a session drives
///
/// A transport is one child process as seen through its pipes: text goes in,
/// lines come out, and shutting it down reports how the process exited.
/// `ProcessTransport` spawns a real `sqlite3`; `ScriptedTransport` answers
/// from memory so the protocol can be exercised without a binary.

pub mod process;
pub mod scripted;

pub use process::ProcessTransport;
pub use scripted::{ScriptedTransport, SentLog};

use async_trait::async_trait;
use std::io;

#[async_trait]
pub trait Transport: Send {
    /// Write `text` to the child's stdin and flush it
    async fn send(&mut self, text: &str) -> io::Result<()>;

    /// Next line of stdout without its line terminator, `None` at EOF
    async fn recv_line(&mut self) -> io::Result<Option<String>>;

    /// Close stdin and stdout, wait for the child and return its exit code.
    /// `None` means the child was terminated by a signal.
    async fn shutdown(&mut self) -> io::Result<Option<i32>>;
}
