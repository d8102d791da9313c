//! Log output formats understood by the telemetry layer.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Output format for bridge log events.
///
/// Parsing is case-insensitive so `--log-format Compact` and
/// `TESSERA_LOG_FORMAT=json` both resolve.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// One JSON object per event, fields flattened.
    #[default]
    Json,
    /// Single-line human-readable events.
    Compact,
}

impl LogFormat {
    /// Returns `true` for machine-readable formats.
    #[must_use]
    pub const fn is_structured(self) -> bool {
        matches!(self, Self::Json)
    }
}

/// Error returned when text names no known [`LogFormat`].
pub type LogFormatParseError = strum::ParseError;
