//! Lazy row sequences and the busy lease they hold.

use super::Session;
use crate::error::{ShellError, ShellResult};
use crate::framer::{Frame, RowFramer};
use crate::transport::Transport;
use crate::types::Row;
use serde::de::DeserializeOwned;
use tokio::sync::MutexGuard;
use tracing::warn;

/// Exclusive claim on a session for one statement.
///
/// Acquiring flips the session to Busy; dropping always flips it back to
/// Idle, whichever way the statement ended. If the statement's sentinel is
/// still unread at that point the session remembers to drain it first on the
/// next call.
#[derive(Debug)]
pub(crate) struct Lease<'a> {
    session: &'a Session,
    pub(crate) owes_drain: bool,
}

impl<'a> Lease<'a> {
    pub(crate) fn acquire(session: &'a Session) -> ShellResult<Self> {
        let owes_drain = session.begin()?;
        Ok(Lease { session, owes_drain })
    }
}

impl Drop for Lease<'_> {
    fn drop(&mut self) {
        self.session.finish(self.owes_drain);
    }
}

/// One statement's output as raw JSON object text, one item per row.
///
/// The sequence is one-shot. Reading the end-of-result sentinel releases the
/// session immediately; dropping the sequence early releases it too.
pub struct RawRows<'a> {
    // Field order matters: the transport guard must be released before the
    // lease marks the session Idle.
    transport: Option<MutexGuard<'a, Box<dyn Transport>>>,
    lease: Option<Lease<'a>>,
    framer: RowFramer,
}

impl<'a> RawRows<'a> {
    pub(crate) fn new(transport: MutexGuard<'a, Box<dyn Transport>>, lease: Lease<'a>) -> Self {
        RawRows {
            transport: Some(transport),
            lease: Some(lease),
            framer: RowFramer::new(),
        }
    }

    /// Next row's JSON text, `None` once the result is complete
    pub async fn next(&mut self) -> ShellResult<Option<String>> {
        loop {
            let transport = match self.transport.as_mut() {
                Some(transport) => transport,
                None => return Ok(None),
            };

            let received = transport.recv_line().await?;
            let line = match received {
                Some(line) => line,
                None => {
                    warn!(
                        lines = self.framer.lines_seen(),
                        "sqlite3 closed its output before the end of the result"
                    );
                    self.release(false);
                    return Ok(None);
                }
            };

            match self.framer.feed(&line) {
                Some(Frame::Row(row)) => return Ok(Some(row.to_string())),
                Some(Frame::End) => {
                    self.release(false);
                    return Ok(None);
                }
                None => continue,
            }
        }
    }

    /// Read and discard the rest of the result
    pub async fn drain(&mut self) -> ShellResult<usize> {
        let mut discarded = 0;
        while self.next().await?.is_some() {
            discarded += 1;
        }
        Ok(discarded)
    }

    /// The end of the result has been reached
    pub fn is_finished(&self) -> bool {
        self.lease.is_none()
    }

    fn release(&mut self, owes_drain: bool) {
        self.transport.take();
        if let Some(mut lease) = self.lease.take() {
            lease.owes_drain = owes_drain;
        }
    }
}

impl std::fmt::Debug for RawRows<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawRows")
            .field("finished", &self.is_finished())
            .field("framer", &self.framer)
            .finish()
    }
}

/// One statement's output decoded into rows
#[derive(Debug)]
pub struct Rows<'a> {
    raw: RawRows<'a>,
}

impl<'a> Rows<'a> {
    pub(crate) fn new(raw: RawRows<'a>) -> Self {
        Rows { raw }
    }

    /// Next row, `None` once the result is complete
    pub async fn next(&mut self) -> ShellResult<Option<Row>> {
        self.next_as().await
    }

    /// Next row decoded into `T`
    pub async fn next_as<T: DeserializeOwned>(&mut self) -> ShellResult<Option<T>> {
        match self.raw.next().await? {
            Some(line) => match serde_json::from_str(&line) {
                Ok(value) => Ok(Some(value)),
                Err(source) => Err(ShellError::malformed_row(line, source)),
            },
            None => Ok(None),
        }
    }

    /// Collect the remaining rows
    pub async fn collect(mut self) -> ShellResult<Vec<Row>> {
        let mut rows = Vec::new();
        while let Some(row) = self.next().await? {
            rows.push(row);
        }
        Ok(rows)
    }

    pub fn is_finished(&self) -> bool {
        self.raw.is_finished()
    }

    pub fn into_raw(self) -> RawRows<'a> {
        self.raw
    }
}
