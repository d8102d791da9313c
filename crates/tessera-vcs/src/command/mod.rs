//! Descriptions of external tool invocations and their captured output.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{BridgeError, Resource};

/// Maximum number of arguments passed to one invocation.
pub const MAX_COMMAND_ARGS: usize = 32;

/// Maximum number of stdout bytes captured from one invocation (10 MiB).
pub const MAX_CAPTURE_BYTES: usize = 10 * 1024 * 1024;

/// Size of each read from a child's output stream.
pub const READ_CHUNK_BYTES: usize = 8 * 1024;

/// Bounded, ordered argument list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandArgs(Vec<String>);

impl CommandArgs {
    /// Creates an empty argument list.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Builds an argument list from an iterator.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::CapacityExceeded`] when the iterator yields more
    /// than [`MAX_COMMAND_ARGS`] items.
    pub fn try_from_iter<I, S>(args: I) -> Result<Self, BridgeError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut list = Self::new();
        for arg in args {
            list.push(arg)?;
        }
        Ok(list)
    }

    /// Appends an argument.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::CapacityExceeded`] when the list is full.
    pub fn push(&mut self, arg: impl Into<String>) -> Result<(), BridgeError> {
        if self.0.len() >= MAX_COMMAND_ARGS {
            return Err(BridgeError::CapacityExceeded {
                resource: Resource::CommandArguments,
                limit: MAX_COMMAND_ARGS,
            });
        }
        self.0.push(arg.into());
        Ok(())
    }

    /// Returns the arguments as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Returns the number of arguments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` when there are no arguments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the arguments.
    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }
}

impl<'a> IntoIterator for &'a CommandArgs {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// A single run of the version-control tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInvocation {
    program: String,
    working_dir: PathBuf,
    args: CommandArgs,
}

impl CommandInvocation {
    /// Creates an invocation of `program` inside `working_dir`.
    #[must_use]
    pub fn new(
        program: impl Into<String>,
        working_dir: impl Into<PathBuf>,
        args: CommandArgs,
    ) -> Self {
        Self {
            program: program.into(),
            working_dir: working_dir.into(),
            args,
        }
    }

    /// Program name or path.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Directory the tool runs in.
    #[must_use]
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Arguments passed after the program name.
    #[must_use]
    pub const fn args(&self) -> &CommandArgs {
        &self.args
    }

    /// First argument, conventionally the tool's subcommand.
    #[must_use]
    pub fn subcommand(&self) -> Option<&str> {
        self.args.as_slice().first().map(String::as_str)
    }
}

impl fmt::Display for CommandInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Standard output captured from a successful invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedOutput {
    stdout: Vec<u8>,
}

impl CapturedOutput {
    /// Wraps captured stdout bytes.
    #[must_use]
    pub fn new(stdout: impl Into<Vec<u8>>) -> Self {
        Self {
            stdout: stdout.into(),
        }
    }

    /// Captured bytes.
    #[must_use]
    pub fn stdout(&self) -> &[u8] {
        &self.stdout
    }

    /// Consumes the capture, returning the bytes.
    #[must_use]
    pub fn into_stdout(self) -> Vec<u8> {
        self.stdout
    }

    /// Number of captured bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stdout.len()
    }

    /// Returns `true` when nothing was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stdout.is_empty()
    }
}
