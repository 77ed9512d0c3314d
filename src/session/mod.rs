/// Session - one sqlite3 shell process and the statements run on it
///
/// A session owns exactly one transport. Statements are written as
/// `<sql>;\n.print *\n` and their output is read back up to the `*` line.
///
/// Execution is single-flight: while a row sequence is open the session is
/// Busy and every other call fails with `AlreadyExecuting` instead of
/// waiting. Callers that need parallelism open more sessions.
///
/// Lifecycle: `open`/`with_transport` perform the startup handshake and
/// return an Idle session; `close` shuts the process down and checks its
/// exit code. Nothing here retries, and there are no timeouts: a hung child
/// hangs its session.

pub mod config;
pub mod rows;

pub use config::{SessionConfig, SessionConfigBuilder};
pub use rows::{RawRows, Rows};

use crate::binder;
use crate::error::{ShellError, ShellResult};
use crate::framer::{self, SENTINEL};
use crate::transport::{ProcessTransport, Transport};
use crate::types::{Params, Row};
use parking_lot::Mutex;
use rows::Lease;
use serde::de::DeserializeOwned;
use tracing::{debug, error, trace, warn};

/// Observable session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Busy,
    Closed,
}

#[derive(Debug)]
struct SessionState {
    phase: Phase,
    /// An abandoned statement's output is still sitting in the pipe
    pending_drain: bool,
}

pub struct Session {
    transport: tokio::sync::Mutex<Box<dyn Transport>>,
    state: Mutex<SessionState>,
}

impl Session {
    /// Spawn the shell described by `config` and wait for it to become ready
    pub async fn open(config: &SessionConfig) -> ShellResult<Self> {
        config.validate()?;
        let args = config.command_args();
        debug!(executable = %config.executable.display(), ?args, "starting sqlite3");
        let transport = ProcessTransport::spawn(&config.executable, &args)?;
        Self::with_transport(transport).await
    }

    /// Run the startup handshake over an existing transport
    pub async fn with_transport<T: Transport + 'static>(transport: T) -> ShellResult<Self> {
        let mut transport: Box<dyn Transport> = Box::new(transport);

        let line = match transport.recv_line().await {
            Ok(line) => line,
            Err(e) => {
                error!(error = %e, "failed reading sqlite3 readiness line");
                teardown(transport.as_mut()).await;
                return Err(e.into());
            }
        };

        if line.as_deref() != Some(SENTINEL) {
            error!(?line, "sqlite3 did not print the readiness sentinel");
            teardown(transport.as_mut()).await;
            return Err(ShellError::StartupFailed { line });
        }

        debug!("sqlite3 ready");
        Ok(Session {
            transport: tokio::sync::Mutex::new(transport),
            state: Mutex::new(SessionState {
                phase: Phase::Idle,
                pending_drain: false,
            }),
        })
    }

    pub fn state(&self) -> Phase {
        self.state.lock().phase
    }

    /// Run a statement and stream its rows as raw JSON text
    pub async fn query_raw<P: Into<Params>>(&self, sql: &str, params: P) -> ShellResult<RawRows<'_>> {
        let params = params.into();
        let mut lease = Lease::acquire(self)?;
        let statement = binder::bind(sql, &params)?;

        let mut transport = self
            .transport
            .try_lock()
            .map_err(|_| ShellError::AlreadyExecuting)?;

        if lease.owes_drain {
            let discarded = drain_to_sentinel(&mut **transport).await?;
            warn!(discarded, "drained output left by an abandoned statement");
            lease.owes_drain = false;
        }

        trace!(statement = %statement, "submitting statement");
        transport.send(&framer::statement_text(&statement)).await?;
        lease.owes_drain = true;

        Ok(RawRows::new(transport, lease))
    }

    /// Run a statement and stream its rows decoded as JSON objects
    pub async fn query<P: Into<Params>>(&self, sql: &str, params: P) -> ShellResult<Rows<'_>> {
        Ok(Rows::new(self.query_raw(sql, params).await?))
    }

    /// Run a statement and collect every row
    pub async fn query_all<P: Into<Params>>(&self, sql: &str, params: P) -> ShellResult<Vec<Row>> {
        self.query(sql, params).await?.collect().await
    }

    /// Run a statement and decode every row into `T`
    pub async fn query_all_as<T, P>(&self, sql: &str, params: P) -> ShellResult<Vec<T>>
    where
        T: DeserializeOwned,
        P: Into<Params>,
    {
        let mut rows = self.query(sql, params).await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next_as::<T>().await? {
            out.push(row);
        }
        Ok(out)
    }

    /// First row of the result, if any. The rest is read and discarded.
    pub async fn query_one<P: Into<Params>>(&self, sql: &str, params: P) -> ShellResult<Option<Row>> {
        let mut rows = self.query(sql, params).await?;
        let first = rows.next().await?;
        rows.into_raw().drain().await?;
        Ok(first)
    }

    /// Run a statement whose rows are not needed
    pub async fn execute<P: Into<Params>>(&self, sql: &str, params: P) -> ShellResult<()> {
        let discarded = self.query_raw(sql, params).await?.drain().await?;
        if discarded > 0 {
            debug!(discarded, "execute discarded result rows");
        }
        Ok(())
    }

    /// Rowid of the most recent successful INSERT on this connection
    pub async fn last_insert_rowid(&self) -> ShellResult<i64> {
        self.scalar_i64("SELECT last_insert_rowid() AS value").await
    }

    /// Rows modified by the most recent INSERT, UPDATE or DELETE
    pub async fn changes(&self) -> ShellResult<i64> {
        self.scalar_i64("SELECT changes() AS value").await
    }

    async fn scalar_i64(&self, sql: &str) -> ShellResult<i64> {
        let row = self
            .query_one(sql, ())
            .await?
            .ok_or_else(|| ShellError::unexpected_result(format!("`{}` returned no rows", sql)))?;
        row.get("value")
            .and_then(serde_json::Value::as_i64)
            .ok_or_else(|| {
                ShellError::unexpected_result(format!(
                    "`{}` returned {} without an integer column `value`",
                    sql,
                    serde_json::Value::Object(row.clone())
                ))
            })
    }

    /// Close the shell's pipes, wait for it to exit and check the exit code
    pub async fn close(&self) -> ShellResult<()> {
        {
            let mut state = self.state.lock();
            match state.phase {
                Phase::Busy => return Err(ShellError::AlreadyExecuting),
                Phase::Closed => return Err(ShellError::Closed),
                Phase::Idle => state.phase = Phase::Closed,
            }
        }

        let mut transport = self
            .transport
            .try_lock()
            .map_err(|_| ShellError::AlreadyExecuting)?;
        let code = transport.shutdown().await?;
        debug!(?code, "sqlite3 session closed");

        match code {
            Some(0) => Ok(()),
            code => Err(ShellError::AbnormalExit { code }),
        }
    }

    /// Idle -> Busy. Returns whether an abandoned result must be drained first.
    fn begin(&self) -> ShellResult<bool> {
        let mut state = self.state.lock();
        match state.phase {
            Phase::Busy => Err(ShellError::AlreadyExecuting),
            Phase::Closed => Err(ShellError::Closed),
            Phase::Idle => {
                state.phase = Phase::Busy;
                Ok(std::mem::take(&mut state.pending_drain))
            }
        }
    }

    /// Busy -> Idle, on every exit path of a statement
    fn finish(&self, owes_drain: bool) {
        let mut state = self.state.lock();
        if state.phase == Phase::Busy {
            state.phase = Phase::Idle;
        }
        state.pending_drain = owes_drain;
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session").field("state", &*self.state.lock()).finish()
    }
}

async fn drain_to_sentinel(transport: &mut dyn Transport) -> ShellResult<usize> {
    let mut discarded = 0;
    while let Some(line) = transport.recv_line().await? {
        if line == SENTINEL {
            break;
        }
        discarded += 1;
    }
    Ok(discarded)
}

async fn teardown(transport: &mut dyn Transport) {
    match transport.shutdown().await {
        Ok(code) => debug!(?code, "sqlite3 torn down after failed startup"),
        Err(e) => warn!(error = %e, "failed to tear down sqlite3 after failed startup"),
    }
}
