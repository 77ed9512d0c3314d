//! Error types for sqlite-pipe

use thiserror::Error;

pub type ShellResult<T> = Result<T, ShellError>;

/// Main error type for session operations
#[derive(Error, Debug)]
pub enum ShellError {
    /// Parameters did not line up with the template's placeholders
    #[error("Binding error: {0}")]
    Bind(#[from] BindError),

    /// The child never printed the readiness sentinel
    #[error("sqlite3 did not become ready (first line: {line:?})")]
    StartupFailed { line: Option<String> },

    /// Another statement is still streaming on this session
    #[error("a statement is already executing on this session")]
    AlreadyExecuting,

    /// A line between sentinels was not a JSON object
    #[error("malformed row {line:?}: {source}")]
    MalformedRow {
        line: String,
        #[source]
        source: serde_json::Error,
    },

    /// A helper query came back without the shape it relies on
    #[error("unexpected result: {reason}")]
    UnexpectedResult { reason: String },

    /// close() reaped a child that did not exit cleanly
    #[error("sqlite3 exited abnormally ({})", describe_exit(.code))]
    AbnormalExit { code: Option<i32> },

    /// The session has already been closed
    #[error("session is closed")]
    Closed,

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Template/parameter mismatches, raised before anything is written
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BindError {
    #[error("missing positional parameter at index {index}")]
    MissingPositionalParameter { index: usize },

    #[error("more parameters supplied than placeholders in {template:?}")]
    UnconsumedParameters { template: String },

    #[error("missing named parameter {key:?}")]
    MissingNamedParameter { key: String },
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "terminated by signal".to_string(),
    }
}

impl ShellError {
    pub fn config(message: impl Into<String>) -> Self {
        ShellError::Config { message: message.into() }
    }

    pub fn malformed_row(line: impl Into<String>, source: serde_json::Error) -> Self {
        ShellError::MalformedRow { line: line.into(), source }
    }

    pub fn unexpected_result(reason: impl Into<String>) -> Self {
        ShellError::UnexpectedResult { reason: reason.into() }
    }

    /// True for errors after which the session can no longer be used
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ShellError::StartupFailed { .. } | ShellError::AbnormalExit { .. } | ShellError::Closed
        )
    }
}
