//! Process-based execution of the version-control tool.
//!
//! [`ProcessRunner`] implements [`CommandRunner`] by spawning the tool with
//! stdin closed and both output streams piped. Stdout is read on a dedicated
//! thread in [`READ_CHUNK_BYTES`] chunks and capped at [`MAX_CAPTURE_BYTES`].
//! Stderr is drained on a second thread so the child never blocks on a full
//! pipe, and its text is attached to non-zero exit errors. The calling thread
//! polls for exit and kills the child when the optional timeout elapses or
//! the capture limit is hit.

use std::io::{self, Read};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::command::{CapturedOutput, CommandInvocation, MAX_CAPTURE_BYTES, READ_CHUNK_BYTES};
use crate::error::CommandError;
use crate::runner::CommandRunner;

/// Tracing target for tool process operations.
const PROCESS_TARGET: &str = "tessera_vcs::process";

/// Interval between exit checks while the child runs.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Stderr bytes kept for error reporting; the rest is read and discarded.
const STDERR_RETAINED_BYTES: usize = 64 * 1024;

/// Runs invocations as child processes.
///
/// # Example
///
/// ```rust,no_run
/// use std::time::Duration;
///
/// use tessera_vcs::{CommandArgs, CommandInvocation, CommandRunner, ProcessRunner};
///
/// let runner = ProcessRunner::with_timeout(Some(Duration::from_secs(30)));
/// let args = CommandArgs::try_from_iter(["status"])?;
/// let output = runner.run(&CommandInvocation::new("jj", ".", args))?;
/// assert!(!output.is_empty());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessRunner {
    timeout: Option<Duration>,
}

impl ProcessRunner {
    /// Creates a runner that waits for every child to exit.
    #[must_use]
    pub const fn new() -> Self {
        Self { timeout: None }
    }

    /// Creates a runner that kills children outliving `timeout`.
    #[must_use]
    pub const fn with_timeout(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    /// Configured timeout, if any.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

impl CommandRunner for ProcessRunner {
    fn run(&self, invocation: &CommandInvocation) -> Result<CapturedOutput, CommandError> {
        run_process(invocation, self.timeout)
    }
}

/// Result of reading a child's stdout.
enum Capture {
    Complete(Vec<u8>),
    Overflow,
    Failed(io::Error),
}

fn run_process(
    invocation: &CommandInvocation,
    timeout: Option<Duration>,
) -> Result<CapturedOutput, CommandError> {
    let program = invocation.program();

    debug!(
        target: PROCESS_TARGET,
        program,
        working_dir = %invocation.working_dir().display(),
        args = ?invocation.args().as_slice(),
        "spawning tool process"
    );

    let mut child = Command::new(program)
        .args(invocation.args())
        .current_dir(invocation.working_dir())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|err| CommandError::SpawnFailed {
            program: program.to_owned(),
            source: Arc::new(err),
        })?;

    let Some(stdout) = child.stdout.take() else {
        reap(&mut child);
        return Err(CommandError::MissingStdout {
            program: program.to_owned(),
        });
    };

    let stderr_drain = child
        .stderr
        .take()
        .map(|stderr| thread::spawn(move || drain_stderr(stderr)));

    let overflowed = Arc::new(AtomicBool::new(false));
    let reader_flag = Arc::clone(&overflowed);
    let stdout_reader =
        thread::spawn(move || capture_stdout(stdout, MAX_CAPTURE_BYTES, &reader_flag));

    let supervised = supervise(program, &mut child, &overflowed, timeout);
    let capture = join_capture(stdout_reader);
    let stderr = stderr_drain.map(join_stderr).unwrap_or_default();

    if !stderr.is_empty() {
        debug!(
            target: PROCESS_TARGET,
            program,
            stderr = %stderr.trim(),
            "tool stderr output"
        );
    }

    let status = supervised?;

    let stdout = match capture {
        Capture::Complete(bytes) => bytes,
        Capture::Overflow => return Err(output_limit(program)),
        Capture::Failed(err) => return Err(io_error(program, err)),
    };

    check_status(program, status, stderr)?;

    debug!(
        target: PROCESS_TARGET,
        program,
        stdout_bytes = stdout.len(),
        "tool process completed"
    );

    Ok(CapturedOutput::new(stdout))
}

/// Polls the child until it exits, the timeout elapses, or the reader
/// reports an overflow. Interrupted children are killed and reaped.
fn supervise(
    program: &str,
    child: &mut Child,
    overflowed: &AtomicBool,
    timeout: Option<Duration>,
) -> Result<ExitStatus, CommandError> {
    let start = Instant::now();

    loop {
        if overflowed.load(Ordering::Acquire) {
            warn!(
                target: PROCESS_TARGET,
                program,
                limit = MAX_CAPTURE_BYTES,
                "tool output exceeded capture limit, killing process"
            );
            reap(child);
            return Err(output_limit(program));
        }

        match child.try_wait() {
            Ok(Some(status)) => {
                debug!(target: PROCESS_TARGET, program, ?status, "tool process exited");
                return Ok(status);
            }
            Ok(None) => {}
            Err(err) => {
                reap(child);
                return Err(io_error(program, err));
            }
        }

        if let Some(limit) = timeout.filter(|limit| start.elapsed() > *limit) {
            warn!(
                target: PROCESS_TARGET,
                program,
                timeout_ms = u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
                "tool timed out, killing process"
            );
            reap(child);
            return Err(CommandError::Timeout {
                program: program.to_owned(),
                timeout: limit,
            });
        }

        thread::sleep(POLL_INTERVAL);
    }
}

/// Maps an exit status onto success or a structured failure.
fn check_status(program: &str, status: ExitStatus, stderr: String) -> Result<(), CommandError> {
    if status.success() {
        return Ok(());
    }
    Err(status.code().map_or_else(
        || CommandError::Terminated {
            program: program.to_owned(),
        },
        |code| CommandError::NonZeroExit {
            program: program.to_owned(),
            status: code,
            stderr,
        },
    ))
}

/// Reads stdout in fixed-size chunks until EOF or the limit is passed.
fn capture_stdout(mut stdout: impl Read, limit: usize, overflowed: &AtomicBool) -> Capture {
    let mut captured = Vec::new();
    let mut chunk = [0_u8; READ_CHUNK_BYTES];

    loop {
        match stdout.read(&mut chunk) {
            Ok(0) => return Capture::Complete(captured),
            Ok(read) => {
                if captured.len().saturating_add(read) > limit {
                    overflowed.store(true, Ordering::Release);
                    return Capture::Overflow;
                }
                captured.extend_from_slice(chunk.get(..read).unwrap_or_default());
            }
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => return Capture::Failed(err),
        }
    }
}

/// Reads stderr to EOF, keeping at most [`STDERR_RETAINED_BYTES`].
fn drain_stderr(mut stderr: impl Read) -> String {
    let mut retained = Vec::new();
    let mut chunk = [0_u8; READ_CHUNK_BYTES];

    loop {
        match stderr.read(&mut chunk) {
            Ok(0) => break,
            Ok(read) => {
                let room = STDERR_RETAINED_BYTES.saturating_sub(retained.len());
                let kept = read.min(room);
                retained.extend_from_slice(chunk.get(..kept).unwrap_or_default());
            }
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(_) => break,
        }
    }

    String::from_utf8_lossy(&retained).into_owned()
}

fn join_capture(handle: JoinHandle<Capture>) -> Capture {
    handle
        .join()
        .unwrap_or_else(|_| Capture::Failed(io::Error::other("stdout reader panicked")))
}

fn join_stderr(handle: JoinHandle<String>) -> String {
    handle.join().unwrap_or_default()
}

/// Kills the child and waits so it does not linger as a zombie.
fn reap(child: &mut Child) {
    drop(child.kill());
    drop(child.wait());
}

fn output_limit(program: &str) -> CommandError {
    CommandError::OutputLimitExceeded {
        program: program.to_owned(),
        limit: MAX_CAPTURE_BYTES,
    }
}

fn io_error(program: &str, err: io::Error) -> CommandError {
    CommandError::Io {
        program: program.to_owned(),
        source: Arc::new(err),
    }
}
