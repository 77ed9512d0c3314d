//! # sqlite-pipe
//!
//! Talk to SQLite by driving the `sqlite3` command-line shell over its
//! stdin/stdout instead of linking the engine.
//!
//! The crate is the protocol layer: parameters are bound into SQL text
//! ([`binder`]), statements are written with a trailing `.print *`, and the
//! shell's `-json` output is cut back into rows ([`framer`]). A [`Session`]
//! owns the one child process and allows one statement in flight at a time.
//!
//! ```no_run
//! use sqlite_pipe::{params, Session, SessionConfig};
//!
//! # async fn demo() -> sqlite_pipe::ShellResult<()> {
//! let session = Session::open(&SessionConfig::with_database("app.db")).await?;
//! session.execute("CREATE TABLE IF NOT EXISTS kv (k TEXT, v INTEGER)", ()).await?;
//! session.execute("INSERT INTO kv VALUES (?, ?)", params!["answer", 42]).await?;
//!
//! let rows = session.query_all("SELECT k, v FROM kv WHERE v > ?", params![0]).await?;
//! assert_eq!(rows[0]["k"], "answer");
//! session.close().await?;
//! # Ok(())
//! # }
//! ```

#![warn(clippy::all)]

pub mod binder;
pub mod error;
pub mod framer;
pub mod session;
pub mod transport;
pub mod types;

pub use binder::{bind, format_literal};
pub use error::{BindError, ShellError, ShellResult};
pub use session::{Phase, RawRows, Rows, Session, SessionConfig, SessionConfigBuilder};
pub use transport::{ProcessTransport, ScriptedTransport, Transport};
pub use types::{Param, Params, Row};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
