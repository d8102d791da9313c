//! The seam between the bridge and the external version-control tool.
//!
//! [`CommandRunner`] abstracts how an invocation is executed so the bridge can
//! be driven by [`crate::process::ProcessRunner`] in production and by test
//! doubles elsewhere.

use crate::command::{CapturedOutput, CommandInvocation};
use crate::error::CommandError;

/// Executes a tool invocation and captures its standard output.
pub trait CommandRunner {
    /// Runs `invocation` to completion.
    ///
    /// # Errors
    ///
    /// Returns a [`CommandError`] when the tool cannot be started, fails, or
    /// produces output the runner refuses to capture.
    fn run(&self, invocation: &CommandInvocation) -> Result<CapturedOutput, CommandError>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run(&self, invocation: &CommandInvocation) -> Result<CapturedOutput, CommandError> {
        (**self).run(invocation)
    }
}

impl<R: CommandRunner + ?Sized> CommandRunner for Box<R> {
    fn run(&self, invocation: &CommandInvocation) -> Result<CapturedOutput, CommandError> {
        (**self).run(invocation)
    }
}
