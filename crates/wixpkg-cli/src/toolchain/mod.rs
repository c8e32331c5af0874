//! External toolchain invocation
//!
//! Every external program (wix.exe, signtool) is run through a [`ToolRunner`],
//! so the build flow can be exercised without a Windows toolchain.

pub mod locate;
pub mod signer;
pub mod wix;

use crate::errors::BuildError;
use crate::logger;
use std::ffi::{OsStr, OsString};
use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Captured result of one external command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Turn an unsuccessful run into `BuildError::CommandFailed`
    pub fn into_result(self, command: String) -> Result<Self, BuildError> {
        if self.success {
            Ok(self)
        } else {
            Err(BuildError::CommandFailed {
                command,
                status: self.status,
                stderr: self.stderr.trim().to_string(),
            })
        }
    }
}

pub trait ToolRunner {
    fn run(&self, program: &Path, args: &[OsString]) -> Result<CommandOutput, BuildError>;
}

/// Human-readable command line for logs and errors
pub fn command_line(program: &Path, args: &[OsString]) -> String {
    std::iter::once(program.as_os_str())
        .chain(args.iter().map(OsString::as_os_str))
        .map(quote)
        .collect::<Vec<_>>()
        .join(" ")
}

fn quote(part: &OsStr) -> String {
    let part = part.to_string_lossy();
    if part.contains(' ') {
        format!("\"{}\"", part)
    } else {
        part.into_owned()
    }
}

/// Runs programs as child processes, killing any that outlive the timeout
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    timeout: Duration,
}

impl ProcessRunner {
    pub fn new(timeout: Duration) -> Self {
        ProcessRunner { timeout }
    }
}

impl ToolRunner for ProcessRunner {
    fn run(&self, program: &Path, args: &[OsString]) -> Result<CommandOutput, BuildError> {
        let display = command_line(program, args);
        logger::debug(&format!("Running: {}", display));

        let spawn_error = |source| BuildError::Spawn {
            program: program.display().to_string(),
            source,
        };

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(spawn_error)?;

        // Drain both pipes concurrently so a chatty child cannot block on a full buffer
        let stdout = child.stdout.take().map(read_to_string_in_background);
        let stderr = child.stderr.take().map(read_to_string_in_background);

        let started = Instant::now();
        let status = loop {
            match child.try_wait().map_err(spawn_error)? {
                Some(status) => break status,
                None if started.elapsed() >= self.timeout => {
                    let _ = child.kill();
                    let _ = child.wait();
                    logger::capture_output(&display, None, "", "timed out");
                    return Err(BuildError::Timeout {
                        command: display,
                        timeout: self.timeout,
                    });
                }
                None => thread::sleep(POLL_INTERVAL),
            }
        };

        let stdout = join_output(stdout);
        let stderr = join_output(stderr);
        logger::capture_output(&display, status.code(), &stdout, &stderr);

        Ok(CommandOutput {
            success: status.success(),
            status: status.code(),
            stdout,
            stderr,
        })
    }
}

fn read_to_string_in_background<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut buffer = Vec::new();
        let _ = pipe.read_to_end(&mut buffer);
        String::from_utf8_lossy(&buffer).into_owned()
    })
}

fn join_output(handle: Option<JoinHandle<String>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    /// Records invocations and replays queued outputs in order
    #[derive(Default)]
    pub struct FakeRunner {
        pub calls: RefCell<Vec<Vec<String>>>,
        responses: RefCell<VecDeque<CommandOutput>>,
    }

    impl FakeRunner {
        pub fn respond(&self, success: bool, stdout: &str) -> &Self {
            self.responses.borrow_mut().push_back(CommandOutput {
                success,
                status: Some(if success { 0 } else { 1 }),
                stdout: stdout.to_string(),
                stderr: if success { String::new() } else { "failed".to_string() },
            });
            self
        }

        pub fn call(&self, index: usize) -> Vec<String> {
            self.calls.borrow().get(index).cloned().unwrap_or_default()
        }

        pub fn call_count(&self) -> usize {
            self.calls.borrow().len()
        }
    }

    impl ToolRunner for FakeRunner {
        fn run(&self, program: &Path, args: &[OsString]) -> Result<CommandOutput, BuildError> {
            let mut call = vec![program.to_string_lossy().into_owned()];
            call.extend(args.iter().map(|a| a.to_string_lossy().into_owned()));
            self.calls.borrow_mut().push(call);
            Ok(self
                .responses
                .borrow_mut()
                .pop_front()
                .unwrap_or(CommandOutput {
                    success: true,
                    status: Some(0),
                    ..CommandOutput::default()
                }))
        }
    }
}
