//! Crate-level test doubles and behaviour tests.

use std::cell::RefCell;
use std::collections::VecDeque;

use mockall::mock;

use crate::command::{CapturedOutput, CommandInvocation};
use crate::error::CommandError;
use crate::runner::CommandRunner;


/// Status output exercising every status rule.
pub(crate) const STATUS_SAMPLE: &str =
    "Working copy changes:\n  modified: src/main\nCommit: abc123\nParent: xyz789\n";

mock! {
    pub Runner {}

    impl CommandRunner for Runner {
        fn run(&self, invocation: &CommandInvocation) -> Result<CapturedOutput, CommandError>;
    }
}

/// Runner that replies from a script and records every invocation.
#[derive(Debug, Default)]
pub(crate) struct ScriptedRunner {
    replies: RefCell<VecDeque<Result<CapturedOutput, CommandError>>>,
    fallback: Vec<u8>,
    seen: RefCell<Vec<CommandInvocation>>,
}

impl ScriptedRunner {
    /// Replies with `output` whenever the script is exhausted.
    pub(crate) fn always(output: &str) -> Self {
        Self {
            fallback: output.as_bytes().to_vec(),
            ..Self::default()
        }
    }

    /// Queues a one-off reply ahead of the fallback.
    pub(crate) fn then_reply(&self, reply: Result<CapturedOutput, CommandError>) {
        self.replies.borrow_mut().push_back(reply);
    }

    /// Invocations seen so far.
    pub(crate) fn seen(&self) -> Vec<CommandInvocation> {
        self.seen.borrow().clone()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, invocation: &CommandInvocation) -> Result<CapturedOutput, CommandError> {
        self.seen.borrow_mut().push(invocation.clone());
        self.replies
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Ok(CapturedOutput::new(self.fallback.clone())))
    }
}

/// A failure as the tool would report a bad revision.
pub(crate) fn tool_failure() -> CommandError {
    CommandError::NonZeroExit {
        program: "jj".to_owned(),
        status: 1,
        stderr: "Error: Revision \"nope\" doesn't exist".to_owned(),
    }
}
