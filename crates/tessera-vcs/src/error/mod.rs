//! Domain errors raised by the bridge and its command runner.
//!
//! All errors use `thiserror`-derived enums with structured context so callers
//! can inspect the failure programmatically. I/O errors are wrapped in `Arc`
//! to keep the enums small and `Send + Sync`.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tessera_buffer::BufferError;
use thiserror::Error;

/// Bounded collections and inputs guarded by the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    /// Virtual files held by one bridge.
    VirtualFiles,
    /// Commands waiting in the pending queue.
    PendingCommands,
    /// Bytes in a virtual file path.
    PathBytes,
    /// Arguments passed to one tool invocation.
    CommandArguments,
}

impl Resource {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::VirtualFiles => "virtual file",
            Self::PendingCommands => "pending command",
            Self::PathBytes => "path length",
            Self::CommandArguments => "command argument",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failures of a single external tool invocation.
#[derive(Debug, Clone, Error)]
pub enum CommandError {
    /// The process could not be spawned.
    #[error("'{program}' failed to start: {source}")]
    SpawnFailed {
        /// Program that was invoked.
        program: String,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// The process did not expose a stdout stream.
    #[error("'{program}' did not provide an output stream")]
    MissingStdout {
        /// Program that was invoked.
        program: String,
    },

    /// The process exited with a non-zero status.
    #[error("'{program}' exited with status {status}: {}", .stderr.trim())]
    NonZeroExit {
        /// Program that was invoked.
        program: String,
        /// Process exit status.
        status: i32,
        /// Captured standard error, possibly truncated.
        stderr: String,
    },

    /// The process was terminated by a signal.
    #[error("'{program}' terminated abnormally")]
    Terminated {
        /// Program that was invoked.
        program: String,
    },

    /// The process wrote more than the capture limit to stdout.
    #[error("'{program}' produced more than {limit} bytes of output")]
    OutputLimitExceeded {
        /// Program that was invoked.
        program: String,
        /// Capture limit in bytes.
        limit: usize,
    },

    /// The process outlived the configured timeout and was killed.
    #[error("'{program}' timed out after {timeout:?}")]
    Timeout {
        /// Program that was invoked.
        program: String,
        /// Configured timeout.
        timeout: Duration,
    },

    /// Communicating with or waiting on the process failed.
    #[error("I/O error while running '{program}': {source}")]
    Io {
        /// Program that was invoked.
        program: String,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },
}

impl CommandError {
    /// Returns the program named by the failed invocation.
    #[must_use]
    pub fn program(&self) -> &str {
        match self {
            Self::SpawnFailed { program, .. }
            | Self::MissingStdout { program }
            | Self::NonZeroExit { program, .. }
            | Self::Terminated { program }
            | Self::OutputLimitExceeded { program, .. }
            | Self::Timeout { program, .. }
            | Self::Io { program, .. } => program,
        }
    }
}

/// Errors arising from bridge operations.
#[derive(Debug, Clone, Error)]
pub enum BridgeError {
    /// A buffer operation rejected the request.
    #[error(transparent)]
    Buffer(#[from] BufferError),

    /// A bounded collection or input would exceed its limit.
    #[error("{resource} capacity of {limit} exceeded")]
    CapacityExceeded {
        /// The bounded resource.
        resource: Resource,
        /// The fixed limit.
        limit: usize,
    },

    /// The external tool failed.
    #[error("external command failed: {0}")]
    ExternalCommand(#[from] CommandError),

    /// No virtual file exists at the given path.
    #[error("no virtual file at '{path}'")]
    UnknownFile {
        /// Path that was looked up.
        path: String,
    },

    /// A virtual file path was empty.
    #[error("virtual file paths must not be empty")]
    EmptyPath,

    /// A revision identifier cannot be passed to the tool.
    #[error("invalid revision identifier '{revision}'")]
    InvalidRevision {
        /// Rejected identifier.
        revision: String,
    },

    /// A protected range index does not exist in the virtual file.
    #[error("virtual file '{path}' has no protected range {index}")]
    UnknownRange {
        /// Virtual file path.
        path: String,
        /// Requested range index.
        index: usize,
    },

    /// Replacement text for a protected range has the wrong length.
    #[error("replacement of {actual} bytes does not fit protected range of {expected} bytes")]
    RangeLengthMismatch {
        /// Length of the protected range.
        expected: usize,
        /// Length of the replacement text.
        actual: usize,
    },
}
