//! Subprocess execution with timing/debug logging and an optional timeout.
//!
//! Grounded in the teacher's `shell_exec::run` (log the command line, time
//! it, log a one-line trace with the duration), generalized to invoke `git`
//! directly as argv rather than through a shell — this crate never needs
//! shell interpretation for its own git calls, and the clone-plan hook
//! runner (`shell-words`-split argv) goes through the same path.

use std::ffi::OsStr;
use std::io::{self, Read};
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use wait_timeout::ChildExt;

#[derive(Debug, Clone)]
pub struct CmdOutput {
    pub status_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CmdOutput {
    pub fn success(&self) -> bool {
        self.status_code == Some(0)
    }
}

#[derive(Debug)]
pub enum CmdError {
    Io(io::Error),
    TimedOut,
}

impl std::fmt::Display for CmdError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CmdError::Io(e) => write!(f, "{e}"),
            CmdError::TimedOut => write!(f, "command timed out"),
        }
    }
}

/// A single external command to run in `cwd`, with an optional wall-clock
/// timeout and a scrubbed environment.
pub struct Cmd {
    inner: Command,
    program: String,
    args: Vec<String>,
    timeout: Option<Duration>,
}

impl Cmd {
    pub fn new(program: impl AsRef<OsStr>, cwd: &Path) -> Self {
        let program_str = program.as_ref().to_string_lossy().into_owned();
        let mut inner = Command::new(program.as_ref());
        inner.current_dir(cwd);
        inner.stdin(Stdio::null());
        Self {
            inner,
            program: program_str,
            args: Vec::new(),
            timeout: None,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_string_lossy().into_owned());
        self.inner.arg(arg);
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        for a in args {
            self = self.arg(a);
        }
        self
    }

    pub fn env(mut self, key: impl AsRef<OsStr>, value: impl AsRef<OsStr>) -> Self {
        self.inner.env(key, value);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn cmd_str(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }

    /// Run the command, logging `$ <cmd> [<context>]` and a trailing trace
    /// line with duration, matching the teacher's `[wt-trace]` convention.
    pub fn run(mut self, context: Option<&str>) -> Result<CmdOutput, CmdError> {
        let cmd_str = self.cmd_str();
        match context {
            Some(ctx) => log::debug!("$ {cmd_str} [{ctx}]"),
            None => log::debug!("$ {cmd_str}"),
        }

        self.inner.stdout(Stdio::piped());
        self.inner.stderr(Stdio::piped());

        let t0 = Instant::now();
        let mut child = self.inner.spawn().map_err(CmdError::Io)?;

        let status = match self.timeout {
            None => {
                let output = child.wait_with_output().map_err(CmdError::Io)?;
                let duration_ms = t0.elapsed().as_secs_f64() * 1000.0;
                log::debug!(
                    "[gzr-trace] cmd=\"{}\" dur={:.1}ms ok={}",
                    cmd_str,
                    duration_ms,
                    output.status.success()
                );
                return Ok(CmdOutput {
                    status_code: output.status.code(),
                    stdout: String::from_utf8_lossy(&output.stdout).replace('\r', ""),
                    stderr: String::from_utf8_lossy(&output.stderr).replace('\r', ""),
                });
            }
            Some(limit) => match child.wait_timeout(limit).map_err(CmdError::Io)? {
                Some(status) => status,
                None => {
                    let _ = child.kill();
                    let _ = child.wait();
                    let duration_ms = t0.elapsed().as_secs_f64() * 1000.0;
                    log::debug!("[gzr-trace] cmd=\"{cmd_str}\" dur={duration_ms:.1}ms timed-out=true");
                    return Err(CmdError::TimedOut);
                }
            },
        };

        // The process has already exited here; read out whatever is left in
        // its pipes rather than calling `wait_with_output` (which would wait()
        // a second time on an already-reaped child).
        let mut stdout = String::new();
        let mut stderr = String::new();
        if let Some(mut out) = child.stdout.take() {
            let _ = out.read_to_string(&mut stdout);
        }
        if let Some(mut err) = child.stderr.take() {
            let _ = err.read_to_string(&mut stderr);
        }

        let duration_ms = t0.elapsed().as_secs_f64() * 1000.0;
        log::debug!(
            "[gzr-trace] cmd=\"{}\" dur={:.1}ms ok={}",
            cmd_str,
            duration_ms,
            status.success()
        );

        Ok(CmdOutput {
            status_code: status.code(),
            stdout: stdout.replace('\r', ""),
            stderr: stderr.replace('\r', ""),
        })
    }
}
