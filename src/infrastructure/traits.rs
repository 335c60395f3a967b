//! I/O boundary traits for testability
//!
//! These traits abstract external I/O operations, allowing services
//! to be tested with mock implementations.

use std::collections::BTreeMap;
use std::io;
use std::io::Read;
use std::path::PathBuf;
use std::process::{Command, Stdio};

/// Fully resolved description of one external process run.
///
/// The argument vector is passed to process creation verbatim, never
/// through a shell, so values keep embedded whitespace and shell-special
/// characters as single arguments.
#[derive(Debug, Clone, Default)]
pub struct ProcessSpec {
    pub program: String,
    pub args: Vec<String>,
    /// Current directory for the child (parent's cwd when `None`)
    pub cwd: Option<PathBuf>,
    /// Environment overrides, applied on top of the inherited environment
    /// or onto an empty one when `inherit_env` is false
    pub env: BTreeMap<String, String>,
    pub inherit_env: bool,
    /// Pipe and capture stdout/stderr; when false the child inherits the
    /// parent's streams
    pub capture: bool,
}

/// Exit code and captured text of a finished process.
///
/// Text fields are `None` when the run streamed to inherited stdio.
#[derive(Debug, Clone, Default)]
pub struct ProcessOutput {
    pub code: i32,
    pub stdout: Option<String>,
    pub stderr: Option<String>,
}

/// External command runner abstraction.
pub trait CommandRunner: Send + Sync {
    /// Run a command to completion and report its outcome.
    ///
    /// An `Err` means the process could not be started at all; a started
    /// process that exits non-zero is an `Ok` with that code.
    fn run(&self, spec: &ProcessSpec) -> io::Result<ProcessOutput>;
}

/// Real command runner implementation.
#[derive(Debug, Default)]
pub struct SystemCommandRunner;

impl CommandRunner for SystemCommandRunner {
    fn run(&self, spec: &ProcessSpec) -> io::Result<ProcessOutput> {
        let mut command = Command::new(&spec.program);
        command.args(&spec.args);
        if let Some(dir) = &spec.cwd {
            command.current_dir(dir);
        }
        if !spec.inherit_env {
            command.env_clear();
        }
        command.envs(&spec.env);

        if spec.capture {
            command
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped());
        } else {
            command.stdout(Stdio::inherit()).stderr(Stdio::inherit());
        }

        let mut child = command.spawn()?;

        let (stdout, stderr) = if spec.capture {
            let mut err_pipe = child.stderr.take().ok_or_else(|| {
                io::Error::new(io::ErrorKind::Other, "child stderr not captured")
            })?;
            let mut out_pipe = child.stdout.take().ok_or_else(|| {
                io::Error::new(io::ErrorKind::Other, "child stdout not captured")
            })?;

            // Both pipes must drain at the same time: a child that fills one
            // pipe buffer while we block reading the other would deadlock.
            let err_reader = std::thread::spawn(move || -> io::Result<Vec<u8>> {
                let mut buf = Vec::new();
                err_pipe.read_to_end(&mut buf)?;
                Ok(buf)
            });

            let mut out_buf = Vec::new();
            out_pipe.read_to_end(&mut out_buf)?;

            let err_buf = err_reader
                .join()
                .map_err(|_| io::Error::new(io::ErrorKind::Other, "stderr reader panicked"))??;

            (
                Some(String::from_utf8_lossy(&out_buf).into_owned()),
                Some(String::from_utf8_lossy(&err_buf).into_owned()),
            )
        } else {
            (None, None)
        };

        let status = child.wait()?;
        // code() is None when the child was killed by a signal
        let code = status.code().unwrap_or(-1);

        Ok(ProcessOutput {
            code,
            stdout,
            stderr,
        })
    }
}
