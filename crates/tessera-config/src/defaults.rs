//! Built-in configuration values.

use camino::Utf8PathBuf;

use crate::logging::LogFormat;

/// Default version-control program, resolved through `PATH`.
pub const DEFAULT_VCS_PROGRAM: &str = "jj";

/// Default repository directory for tool invocations.
pub const DEFAULT_REPOSITORY: &str = ".";

/// Default log filter expression.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Owned default program name for serde.
pub fn default_vcs_program() -> String {
    DEFAULT_VCS_PROGRAM.to_owned()
}

/// Default repository directory.
pub fn default_repository() -> Utf8PathBuf {
    Utf8PathBuf::from(DEFAULT_REPOSITORY)
}

/// Default log filter expression.
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format.
pub fn default_log_format() -> LogFormat {
    LogFormat::Json
}
