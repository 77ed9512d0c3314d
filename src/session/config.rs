use crate::error::{ShellError, ShellResult};
use crate::framer::SENTINEL;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::PathBuf;

/// Environment variable overriding the shell executable
pub const ENV_EXECUTABLE: &str = "SQLITE_PIPE_EXECUTABLE";
/// Environment variable overriding the database path
pub const ENV_DATABASE: &str = "SQLITE_PIPE_DATABASE";

/// How to launch the shell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Program to run
    pub executable: PathBuf,
    /// Database file, appended as the last argument. `None` is an in-memory database.
    pub database: Option<PathBuf>,
    /// Replaces the whole argument list, database path included
    pub args: Option<Vec<String>>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            executable: PathBuf::from("sqlite3"),
            database: None,
            args: None,
        }
    }
}

impl SessionConfig {
    /// Configuration for a database file
    pub fn with_database(path: impl Into<PathBuf>) -> Self {
        SessionConfig {
            database: Some(path.into()),
            ..Default::default()
        }
    }

    /// Parse and validate a configuration written in TOML
    pub fn from_toml_str(source: &str) -> ShellResult<Self> {
        let config: SessionConfig = toml::from_str(source)
            .map_err(|e| ShellError::config(format!("invalid session config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> ShellResult<()> {
        if self.executable.as_os_str().is_empty() {
            return Err(ShellError::config("executable must not be empty"));
        }

        if let Some(args) = &self.args {
            if args.is_empty() {
                return Err(ShellError::config(
                    "argument override must not be empty; leave it unset for the defaults",
                ));
            }
        }

        Ok(())
    }

    /// Arguments passed to the executable.
    ///
    /// The defaults put the shell in batch mode with JSON rows and no
    /// headers, turn on binary output and print the readiness sentinel before
    /// reading stdin.
    pub fn command_args(&self) -> Vec<OsString> {
        if let Some(args) = &self.args {
            return args.iter().map(OsString::from).collect();
        }

        let mut args: Vec<OsString> = vec![
            "-batch".into(),
            "-noheader".into(),
            "-json".into(),
            "-cmd".into(),
            ".binary on".into(),
            "-cmd".into(),
            format!(".print {}", SENTINEL).into(),
        ];
        if let Some(database) = &self.database {
            args.push(database.clone().into_os_string());
        }
        args
    }

    /// Apply environment-specific overrides
    pub fn apply_environment_overrides(&mut self) {
        if let Some(executable) = std::env::var_os(ENV_EXECUTABLE) {
            if !executable.is_empty() {
                self.executable = PathBuf::from(executable);
            }
        }

        if let Some(database) = std::env::var_os(ENV_DATABASE) {
            if !database.is_empty() {
                self.database = Some(PathBuf::from(database));
            }
        }
    }

    /// Create a builder for fluent configuration
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder::new()
    }
}

/// Configuration builder for fluent API
#[derive(Debug)]
pub struct SessionConfigBuilder {
    config: SessionConfig,
}

impl SessionConfigBuilder {
    pub fn new() -> Self {
        SessionConfigBuilder {
            config: SessionConfig::default(),
        }
    }

    pub fn executable(mut self, executable: impl Into<PathBuf>) -> Self {
        self.config.executable = executable.into();
        self
    }

    pub fn database(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.database = Some(path.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.args = Some(args.into_iter().map(Into::into).collect());
        self
    }

    pub fn from_environment(mut self) -> Self {
        self.config.apply_environment_overrides();
        self
    }

    pub fn build(self) -> ShellResult<SessionConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for SessionConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: Vec<OsString>) -> Vec<String> {
        args.into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_default_args() {
        let config = SessionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(
            strings(config.command_args()),
            vec!["-batch", "-noheader", "-json", "-cmd", ".binary on", "-cmd", ".print *"]
        );
    }

    #[test]
    fn test_database_is_last_argument() {
        let config = SessionConfig::with_database("/tmp/app.db");
        let args = strings(config.command_args());
        assert_eq!(args.last().map(String::as_str), Some("/tmp/app.db"));
        assert_eq!(args.len(), 8);
    }

    #[test]
    fn test_args_override_everything() {
        let config = SessionConfig::builder()
            .database("ignored.db")
            .args(["-json", "other.db"])
            .build()
            .unwrap();
        assert_eq!(strings(config.command_args()), vec!["-json", "other.db"]);
    }

    #[test]
    fn test_invalid_config() {
        let empty_args = SessionConfig::builder().args(Vec::<String>::new()).build();
        assert!(matches!(empty_args, Err(ShellError::Config { .. })));

        let empty_exe = SessionConfig::builder().executable("").build();
        assert!(matches!(empty_exe, Err(ShellError::Config { .. })));
    }

    #[test]
    fn test_from_toml() {
        let config = SessionConfig::from_toml_str(
            r#"
            executable = "/opt/sqlite/bin/sqlite3"
            database = "data.db"
            "#,
        )
        .unwrap();
        assert_eq!(config.executable, PathBuf::from("/opt/sqlite/bin/sqlite3"));
        assert_eq!(config.database, Some(PathBuf::from("data.db")));
        assert_eq!(config.args, None);

        assert_eq!(SessionConfig::from_toml_str("").unwrap(), SessionConfig::default());
        assert!(SessionConfig::from_toml_str("args = []").is_err());
        assert!(SessionConfig::from_toml_str("executable = 3").is_err());
    }

    #[test]
    fn test_environment_overrides() {
        std::env::set_var(ENV_EXECUTABLE, "/usr/local/bin/sqlite3");
        std::env::set_var(ENV_DATABASE, "env.db");
        let config = SessionConfig::builder().from_environment().build().unwrap();
        std::env::remove_var(ENV_EXECUTABLE);
        std::env::remove_var(ENV_DATABASE);

        assert_eq!(config.executable, PathBuf::from("/usr/local/bin/sqlite3"));
        assert_eq!(config.database, Some(PathBuf::from("env.db")));
    }
}
