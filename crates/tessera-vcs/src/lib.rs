//! Bridge between a version-control tool and protected editor buffers.
//!
//! The bridge runs the tool (`jj` by default), classifies its output into
//! read-only regions, and presents the result as [`VirtualFile`]s whose
//! protected bytes cannot be changed by ordinary edits. Scanning watched
//! files for user text queues follow-up `commit` invocations, which
//! [`VcsBridge::dispatch_pending`] runs in order.
//!
//! Execution is abstracted by [`CommandRunner`]; [`ProcessRunner`] runs the
//! tool as a child process with bounded output capture and an optional
//! timeout.
//!
//! ```rust,no_run
//! use tessera_config::Config;
//! use tessera_vcs::{STATUS_PATH, VcsBridge, telemetry};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::default();
//! telemetry::initialise(&config)?;
//!
//! let mut bridge = VcsBridge::from_config(&config);
//! bridge.generate_status()?;
//! if let Some(file) = bridge.file_mut(STATUS_PATH) {
//!     let end = file.text().len();
//!     file.insert(end, b"Describe the change\n")?;
//! }
//! bridge.scan_edits()?;
//! for outcome in bridge.dispatch_pending() {
//!     println!("{}: {}", outcome.command().invocation(), outcome.is_success());
//! }
//! # Ok(())
//! # }
//! ```

mod bridge;
mod classify;
mod command;
mod error;
mod pending;
pub mod process;
mod runner;
pub mod telemetry;
mod vfs;

#[cfg(test)]
mod tests;

pub use bridge::{BridgeSettings, DispatchOutcome, MAX_VIRTUAL_FILES, SharedBridge, VcsBridge};
pub use classify::{
    CHANGE_LABELS, Classification, ClassifiedRange, REVISION_HEADER_PREFIXES,
    STATUS_SECTION_HEADERS, classify_revision, classify_status,
};
pub use command::{
    CapturedOutput, CommandArgs, CommandInvocation, MAX_CAPTURE_BYTES, MAX_COMMAND_ARGS,
    READ_CHUNK_BYTES,
};
pub use error::{BridgeError, CommandError, Resource};
pub use pending::{FOLLOW_UP_SUBCOMMAND, MAX_PENDING_COMMANDS, PendingCommand, PendingQueue};
pub use process::ProcessRunner;
pub use runner::CommandRunner;
pub use vfs::{
    EditableSpan, MAX_PATH_BYTES, REVISION_PATH_PREFIX, STATUS_PATH, VfsPath, ViewKind,
    VirtualFile,
};
