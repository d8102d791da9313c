//! Bounded FIFO of follow-up tool invocations awaiting dispatch.

use std::collections::VecDeque;

use crate::command::CommandInvocation;
use crate::error::{BridgeError, Resource};
use crate::vfs::VfsPath;

/// Maximum number of queued commands.
pub const MAX_PENDING_COMMANDS: usize = 100;

/// Subcommand issued when a watched file holds user text.
pub const FOLLOW_UP_SUBCOMMAND: &str = "commit";

/// A queued invocation and the virtual file whose edit produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCommand {
    origin: VfsPath,
    invocation: CommandInvocation,
}

impl PendingCommand {
    /// Creates a pending command.
    #[must_use]
    pub const fn new(origin: VfsPath, invocation: CommandInvocation) -> Self {
        Self { origin, invocation }
    }

    /// Virtual file that triggered the command.
    #[must_use]
    pub const fn origin(&self) -> &VfsPath {
        &self.origin
    }

    /// Invocation to run.
    #[must_use]
    pub const fn invocation(&self) -> &CommandInvocation {
        &self.invocation
    }
}

/// FIFO of [`PendingCommand`]s capped at [`MAX_PENDING_COMMANDS`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingQueue {
    commands: VecDeque<PendingCommand>,
}

impl PendingQueue {
    /// Creates an empty queue.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            commands: VecDeque::new(),
        }
    }

    /// Appends a command.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::CapacityExceeded`] when the queue is full; the
    /// queue is left unchanged.
    pub fn push(&mut self, command: PendingCommand) -> Result<(), BridgeError> {
        if self.commands.len() >= MAX_PENDING_COMMANDS {
            return Err(BridgeError::CapacityExceeded {
                resource: Resource::PendingCommands,
                limit: MAX_PENDING_COMMANDS,
            });
        }
        self.commands.push_back(command);
        Ok(())
    }

    /// Removes and returns the oldest command.
    pub fn pop(&mut self) -> Option<PendingCommand> {
        self.commands.pop_front()
    }

    /// Removes every command in FIFO order.
    pub fn drain(&mut self) -> Vec<PendingCommand> {
        self.commands.drain(..).collect()
    }

    /// Number of queued commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Returns `true` when nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Iterates over queued commands, oldest first.
    pub fn iter(&self) -> std::collections::vec_deque::Iter<'_, PendingCommand> {
        self.commands.iter()
    }
}
