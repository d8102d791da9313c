//! Orchestration of tool invocations, virtual files and follow-up commands.
//!
//! [`VcsBridge`] owns every virtual file it generates and the queue of
//! follow-up commands produced by edit scans. All state changes are
//! synchronous and happen on the caller's thread; [`SharedBridge`] adds a
//! mutex for callers that share one bridge between threads.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, warn};

use tessera_config::Config;

use crate::command::{CapturedOutput, CommandArgs, CommandInvocation};
use crate::error::{BridgeError, CommandError, Resource};
use crate::pending::{FOLLOW_UP_SUBCOMMAND, PendingCommand, PendingQueue};
use crate::process::ProcessRunner;
use crate::runner::CommandRunner;
use crate::vfs::{VfsPath, ViewKind, VirtualFile};

/// Tracing target for bridge operations.
const BRIDGE_TARGET: &str = "tessera_vcs::bridge";

/// Maximum number of virtual files held by one bridge.
pub const MAX_VIRTUAL_FILES: usize = 1000;

/// Where and with which program the bridge runs the tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeSettings {
    program: String,
    repository: PathBuf,
}

impl BridgeSettings {
    /// Creates settings for `program` run inside `repository`.
    #[must_use]
    pub fn new(program: impl Into<String>, repository: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            repository: repository.into(),
        }
    }

    /// Takes the program and repository from `config`.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.vcs_program(), config.repository().as_std_path())
    }

    /// Program name or path.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Repository directory.
    #[must_use]
    pub fn repository(&self) -> &Path {
        &self.repository
    }
}

/// Result of running one queued command.
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    command: PendingCommand,
    result: Result<CapturedOutput, CommandError>,
}

impl DispatchOutcome {
    /// The command that ran.
    #[must_use]
    pub const fn command(&self) -> &PendingCommand {
        &self.command
    }

    /// Captured output or the failure.
    #[must_use]
    pub const fn result(&self) -> &Result<CapturedOutput, CommandError> {
        &self.result
    }

    /// Returns `true` when the command succeeded.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Bridges the version-control tool and protected virtual files.
///
/// # Example
///
/// ```rust
/// use tessera_vcs::{
///     BridgeSettings, CapturedOutput, CommandError, CommandInvocation, CommandRunner, VcsBridge,
/// };
///
/// struct Canned;
///
/// impl CommandRunner for Canned {
///     fn run(&self, _: &CommandInvocation) -> Result<CapturedOutput, CommandError> {
///         Ok(CapturedOutput::new(b"Commit: abc123\n".to_vec()))
///     }
/// }
///
/// let mut bridge = VcsBridge::new(BridgeSettings::new("jj", "."), Canned);
/// let path = bridge.generate_status()?;
/// let file = bridge.file(path.as_str()).expect("generated file");
/// assert_eq!(file.readonly_ranges().count(), 1);
/// # Ok::<(), tessera_vcs::BridgeError>(())
/// ```
#[derive(Debug)]
pub struct VcsBridge<R> {
    settings: BridgeSettings,
    runner: R,
    files: BTreeMap<VfsPath, VirtualFile>,
    pending: PendingQueue,
}

impl VcsBridge<ProcessRunner> {
    /// Creates a bridge that runs the configured program as a child process,
    /// honouring the configured timeout.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            BridgeSettings::from_config(config),
            ProcessRunner::with_timeout(config.command_timeout()),
        )
    }
}

impl<R> VcsBridge<R> {
    /// Creates an empty bridge.
    #[must_use]
    pub const fn new(settings: BridgeSettings, runner: R) -> Self {
        Self {
            settings,
            runner,
            files: BTreeMap::new(),
            pending: PendingQueue::new(),
        }
    }

    /// Program and repository settings.
    #[must_use]
    pub const fn settings(&self) -> &BridgeSettings {
        &self.settings
    }

    /// The command runner.
    #[must_use]
    pub const fn runner(&self) -> &R {
        &self.runner
    }

    /// Looks up a virtual file.
    #[must_use]
    pub fn file(&self, path: &str) -> Option<&VirtualFile> {
        self.files.get(path)
    }

    /// Looks up a virtual file for editing.
    pub fn file_mut(&mut self, path: &str) -> Option<&mut VirtualFile> {
        self.files.get_mut(path)
    }

    /// Paths of every virtual file in sorted order.
    pub fn paths(&self) -> impl Iterator<Item = &VfsPath> {
        self.files.keys()
    }

    /// Number of virtual files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns `true` when no virtual files exist.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Removes a virtual file, freeing its slot.
    pub fn discard(&mut self, path: &str) -> Option<VirtualFile> {
        self.files.remove(path)
    }

    /// Includes a file in edit scans.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::UnknownFile`] when no file exists at `path`.
    pub fn watch(&mut self, path: &str) -> Result<(), BridgeError> {
        self.existing_mut(path)?.set_watched(true);
        Ok(())
    }

    /// Excludes a file from edit scans.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::UnknownFile`] when no file exists at `path`.
    pub fn unwatch(&mut self, path: &str) -> Result<(), BridgeError> {
        self.existing_mut(path)?.set_watched(false);
        Ok(())
    }

    /// Queued follow-up commands.
    #[must_use]
    pub const fn pending(&self) -> &PendingQueue {
        &self.pending
    }

    /// Removes and returns every queued command in FIFO order.
    pub fn drain_pending(&mut self) -> Vec<PendingCommand> {
        self.pending.drain()
    }

    /// Scans watched files and queues one follow-up command per file that
    /// holds user text. Returns the number of commands queued.
    ///
    /// Detection depends on whether editable text exists, not on whether it
    /// changed since the last scan, so repeated scans queue again.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::CapacityExceeded`] when the queue fills;
    /// commands queued earlier in the same scan remain queued.
    pub fn scan_edits(&mut self) -> Result<usize, BridgeError> {
        let mut queued = 0;
        for file in self.files.values().filter(|file| file.is_watched()) {
            let spans = file.editable_spans();
            if spans.is_empty() {
                continue;
            }

            let message = file.editable_text();
            let args =
                CommandArgs::try_from_iter([FOLLOW_UP_SUBCOMMAND, "--message", message.as_str()])?;
            let command = PendingCommand::new(file.path().clone(), self.invocation(args));
            if let Err(error) = self.pending.push(command) {
                warn!(
                    target: BRIDGE_TARGET,
                    path = %file.path(),
                    %error,
                    "pending command queue is full"
                );
                return Err(error);
            }

            queued += 1;
            debug!(
                target: BRIDGE_TARGET,
                path = %file.path(),
                spans = spans.len(),
                pending = self.pending.len(),
                "queued follow-up command"
            );
        }
        Ok(queued)
    }

    /// Rewrites protected range `range_index` of the file at `path` with
    /// `data` of the same length, bypassing protection.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::UnknownFile`], [`BridgeError::UnknownRange`] or
    /// [`BridgeError::RangeLengthMismatch`]; the file is unchanged on error.
    pub fn refresh_protected(
        &mut self,
        path: &str,
        range_index: usize,
        data: &[u8],
    ) -> Result<(), BridgeError> {
        self.existing_mut(path)?.refresh_range(range_index, data)
    }

    fn existing_mut(&mut self, path: &str) -> Result<&mut VirtualFile, BridgeError> {
        self.files
            .get_mut(path)
            .ok_or_else(|| BridgeError::UnknownFile {
                path: path.to_owned(),
            })
    }

    fn invocation(&self, args: CommandArgs) -> CommandInvocation {
        CommandInvocation::new(self.settings.program(), self.settings.repository(), args)
    }

    fn ensure_slot(&self, path: &VfsPath) -> Result<(), BridgeError> {
        if !self.files.contains_key(path) && self.files.len() >= MAX_VIRTUAL_FILES {
            return Err(BridgeError::CapacityExceeded {
                resource: Resource::VirtualFiles,
                limit: MAX_VIRTUAL_FILES,
            });
        }
        Ok(())
    }
}

impl<R: CommandRunner> VcsBridge<R> {
    /// Runs the tool's status command and stores the result at
    /// [`crate::STATUS_PATH`], replacing any earlier status view.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::ExternalCommand`] when the tool fails,
    /// [`BridgeError::Buffer`] when the output holds too many protected
    /// regions, and [`BridgeError::CapacityExceeded`] when the bridge is
    /// full. Existing state is unchanged on error.
    pub fn generate_status(&mut self) -> Result<VfsPath, BridgeError> {
        let args = CommandArgs::try_from_iter(["status"])?;
        self.generate(VfsPath::status(), ViewKind::Status, args)
    }

    /// Runs the tool's diff command for `revision` and stores the result at
    /// `tessera://revision/<revision>`.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::InvalidRevision`] for identifiers that cannot
    /// be passed safely, plus the errors of [`VcsBridge::generate_status`].
    pub fn generate_revision(&mut self, revision: &str) -> Result<VfsPath, BridgeError> {
        let path = VfsPath::revision(revision)?;
        let args = CommandArgs::try_from_iter(["diff", "-r", revision])?;
        let kind = ViewKind::Revision {
            revision: revision.to_owned(),
        };
        self.generate(path, kind, args)
    }

    /// Runs every queued command in FIFO order and empties the queue.
    ///
    /// Failures are logged and reported in the outcomes; nothing is retried.
    pub fn dispatch_pending(&mut self) -> Vec<DispatchOutcome> {
        self.pending
            .drain()
            .into_iter()
            .map(|command| {
                let result = self.runner.run(command.invocation());
                match &result {
                    Ok(output) => debug!(
                        target: BRIDGE_TARGET,
                        origin = %command.origin(),
                        stdout_bytes = output.len(),
                        "follow-up command completed"
                    ),
                    Err(error) => warn!(
                        target: BRIDGE_TARGET,
                        origin = %command.origin(),
                        command = %command.invocation(),
                        %error,
                        "follow-up command failed"
                    ),
                }
                DispatchOutcome { command, result }
            })
            .collect()
    }

    fn generate(
        &mut self,
        path: VfsPath,
        kind: ViewKind,
        args: CommandArgs,
    ) -> Result<VfsPath, BridgeError> {
        self.ensure_slot(&path)?;

        let invocation = self.invocation(args);
        let output = self.runner.run(&invocation).inspect_err(|error| {
            warn!(
                target: BRIDGE_TARGET,
                path = %path,
                command = %invocation,
                %error,
                "tool invocation failed"
            );
        })?;

        let mut file = VirtualFile::populate(path.clone(), kind, output.into_stdout())?;
        if let Some(previous) = self.files.get(&path) {
            file.set_watched(previous.is_watched());
        }

        debug!(
            target: BRIDGE_TARGET,
            path = %path,
            bytes = file.text().len(),
            protected = file.buffer().protected_ranges().len(),
            "generated virtual file"
        );
        self.files.insert(path.clone(), file);
        Ok(path)
    }
}

/// A [`VcsBridge`] behind a mutex.
///
/// A poisoned lock is recovered rather than reported.
#[derive(Debug)]
pub struct SharedBridge<R> {
    inner: Mutex<VcsBridge<R>>,
}

impl<R> SharedBridge<R> {
    /// Wraps a bridge.
    #[must_use]
    pub const fn new(bridge: VcsBridge<R>) -> Self {
        Self {
            inner: Mutex::new(bridge),
        }
    }

    /// Runs `operation` with exclusive access to the bridge.
    pub fn with<T>(&self, operation: impl FnOnce(&mut VcsBridge<R>) -> T) -> T {
        let mut guard = self
            .inner
            .lock()
            .unwrap_or_else(|poison| poison.into_inner());
        operation(&mut guard)
    }

    /// Unwraps the bridge.
    #[must_use]
    pub fn into_inner(self) -> VcsBridge<R> {
        self.inner
            .into_inner()
            .unwrap_or_else(|poison| poison.into_inner())
    }
}

#[cfg(test)]
mod tests;
