//! In-memory transport that plays back canned shell output.

use super::Transport;
use crate::framer::SENTINEL;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io;
use std::sync::Arc;

#[derive(Debug, Clone)]
enum Reply {
    Lines(Vec<String>),
    Exit(i32),
}

#[derive(Debug, Default)]
struct Sent {
    statements: Vec<String>,
    shutdowns: usize,
}

/// Everything written to a `ScriptedTransport`, shared with the test
#[derive(Debug, Clone, Default)]
pub struct SentLog(Arc<Mutex<Sent>>);

impl SentLog {
    pub fn entries(&self) -> Vec<String> {
        self.0.lock().statements.clone()
    }

    pub fn last(&self) -> Option<String> {
        self.0.lock().statements.last().cloned()
    }

    pub fn len(&self) -> usize {
        self.0.lock().statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.lock().statements.is_empty()
    }

    /// Number of times the transport was shut down
    pub fn shutdowns(&self) -> usize {
        self.0.lock().shutdowns
    }
}

/// Fake `sqlite3`.
///
/// Starts by emitting the readiness sentinel (or a custom banner). Every
/// `send` is treated as one statement and answered with the next scripted
/// reply followed by the sentinel; once the script runs out, statements get
/// an empty result.
#[derive(Debug)]
pub struct ScriptedTransport {
    output: VecDeque<String>,
    replies: VecDeque<Reply>,
    sent: SentLog,
    exit_code: Option<i32>,
    exited: bool,
}

impl Default for ScriptedTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedTransport {
    pub fn new() -> Self {
        ScriptedTransport {
            output: VecDeque::from([SENTINEL.to_string()]),
            replies: VecDeque::new(),
            sent: SentLog::default(),
            exit_code: Some(0),
            exited: false,
        }
    }

    /// Replace the startup output (to simulate a shell that never gets ready)
    pub fn with_banner<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output = lines.into_iter().map(Into::into).collect();
        self
    }

    /// Queue the raw stdout lines for the next statement
    pub fn respond<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.replies
            .push_back(Reply::Lines(lines.into_iter().map(Into::into).collect()));
        self
    }

    /// Queue a JSON result set rendered the way `-json` mode prints it
    pub fn respond_rows(self, rows: &[serde_json::Value]) -> Self {
        let last = rows.len().saturating_sub(1);
        let lines: Vec<String> = rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let open = if i == 0 { "[" } else { "" };
                let close = if i == last { "]" } else { "," };
                format!("{}{}{}", open, row, close)
            })
            .collect();
        self.respond(lines)
    }

    /// The next statement makes the shell exit with `code` without output
    pub fn respond_exit(mut self, code: i32) -> Self {
        self.replies.push_back(Reply::Exit(code));
        self
    }

    /// Exit code reported by `shutdown` (`None` for a signal)
    pub fn exit_code(mut self, code: Option<i32>) -> Self {
        self.exit_code = code;
        self
    }

    pub fn sent_log(&self) -> SentLog {
        self.sent.clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&mut self, text: &str) -> io::Result<()> {
        if self.exited {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "shell has exited"));
        }
        self.sent.0.lock().statements.push(text.to_string());

        match self.replies.pop_front() {
            Some(Reply::Lines(lines)) => {
                self.output.extend(lines);
                self.output.push_back(SENTINEL.to_string());
            }
            Some(Reply::Exit(code)) => {
                self.exit_code = Some(code);
                self.exited = true;
            }
            None => self.output.push_back(SENTINEL.to_string()),
        }
        Ok(())
    }

    async fn recv_line(&mut self) -> io::Result<Option<String>> {
        Ok(self.output.pop_front())
    }

    async fn shutdown(&mut self) -> io::Result<Option<i32>> {
        self.sent.0.lock().shutdowns += 1;
        self.exited = true;
        self.output.clear();
        Ok(self.exit_code)
    }
}
