//! Shared configuration for the Tessera bridge.
//!
//! [`Config`] is assembled by `ortho_config` from layered sources, lowest
//! precedence first: built-in defaults, a configuration file
//! (`--config-path` or `TESSERA_CONFIG_PATH`), `TESSERA_*` environment
//! variables, then command-line flags. Every field has a serde default so a
//! partial file or an empty environment still yields a complete value.
//!
//! Load with `Config::load()` for the process arguments or
//! `Config::load_from_iter(args)` for an explicit list; both return
//! `Result<Config, Arc<ortho_config::OrthoError>>`.

use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

mod defaults;
mod logging;

pub use defaults::{
    DEFAULT_LOG_FILTER, DEFAULT_REPOSITORY, DEFAULT_VCS_PROGRAM, default_log_filter,
    default_log_filter_string, default_log_format, default_repository, default_vcs_program,
};
pub use logging::{LogFormat, LogFormatParseError};

/// Layered configuration for the bridge and its telemetry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "TESSERA")]
pub struct Config {
    /// Program name or path of the version-control tool.
    #[serde(default = "defaults::default_vcs_program")]
    pub vcs_program: String,
    /// Working directory for every tool invocation.
    #[serde(default = "defaults::default_repository")]
    pub repository: Utf8PathBuf,
    /// Optional limit on a single invocation; absent means wait until exit.
    #[serde(default)]
    pub command_timeout_secs: Option<u64>,
    /// `tracing` filter expression.
    #[serde(default = "defaults::default_log_filter_string")]
    pub log_filter: String,
    /// Log output format.
    #[serde(default = "defaults::default_log_format")]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            vcs_program: default_vcs_program(),
            repository: default_repository(),
            command_timeout_secs: None,
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
        }
    }
}

impl Config {
    /// Version-control program name or path.
    #[must_use]
    pub fn vcs_program(&self) -> &str {
        &self.vcs_program
    }

    /// Repository directory for tool invocations.
    #[must_use]
    pub fn repository(&self) -> &Utf8Path {
        &self.repository
    }

    /// Timeout applied to each tool invocation, if any.
    #[must_use]
    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout_secs.map(Duration::from_secs)
    }

    /// Configured log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Configured log format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn default_matches_documented_values() {
        let config = Config::default();
        assert_eq!(config.vcs_program(), "jj");
        assert_eq!(config.repository(), Utf8Path::new("."));
        assert_eq!(config.command_timeout(), None);
        assert_eq!(config.log_filter(), default_log_filter());
        assert_eq!(config.log_format(), LogFormat::Json);
    }

    #[test]
    fn timeout_converts_to_duration() {
        let config = Config {
            command_timeout_secs: Some(7),
            ..Config::default()
        };
        assert_eq!(config.command_timeout(), Some(Duration::from_secs(7)));
    }
}
