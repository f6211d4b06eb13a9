// src/kitchen/tool.rs

//! External tool invocation
//!
//! Every configure, make and doc step goes through [`ExternalTool`], so
//! tests can substitute a fake that records invocations instead of running
//! a compiler. The environment of each child is explicit: nothing is set on
//! the current process.

use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::Duration;
use tracing::debug;
use wait_timeout::ChildExt;

/// A single external command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    /// Variables added to the inherited environment of the child
    pub env: BTreeMap<String, String>,
}

impl Invocation {
    pub fn new(program: impl Into<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.into(),
            env: BTreeMap::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Shell-like rendering for logs
    pub fn command_line(&self) -> String {
        let mut line = String::new();
        for (key, value) in &self.env {
            line.push_str(&format!("{}={} ", key, value));
        }
        line.push_str(&self.program);
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

/// How an external command ended
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExitResult {
    /// Exit code; `None` when killed by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ExitResult {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs external commands for the kitchen
pub trait ExternalTool: Send + Sync {
    /// Run `invocation` to completion
    ///
    /// A non-zero exit is not an error at this level; it comes back in
    /// [`ExitResult::code`]. Failing to spawn is.
    fn invoke(&self, invocation: &Invocation) -> Result<ExitResult>;
}

/// Runs real processes
#[derive(Debug, Clone, Default)]
pub struct SystemTool {
    timeout: Option<Duration>,
}

impl SystemTool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kill any child that runs longer than `timeout`
    ///
    /// On unix each child leads its own process group and the whole group
    /// is killed, so compilers started by make go down with it. Elsewhere
    /// only the direct child is killed.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Resolve the program to run
    ///
    /// Relative paths with a separator (`./configure`) are taken relative
    /// to the invocation's working directory; bare names go through `PATH`.
    fn resolve_program(program: &str, cwd: &Path) -> PathBuf {
        let path = Path::new(program);
        if path.is_absolute() {
            path.to_path_buf()
        } else if program.contains('/') {
            cwd.join(path)
        } else {
            which::which(program).unwrap_or_else(|_| path.to_path_buf())
        }
    }
}

fn drain<R: Read + Send + 'static>(reader: Option<R>) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut reader) = reader {
            let _ = reader.read_to_end(&mut buf);
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}

/// Kill a timed-out child and everything in its process group
#[cfg(unix)]
fn kill_tree(child: &mut Child) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let group = Pid::from_raw(child.id() as i32);
    if let Err(e) = killpg(group, Signal::SIGKILL) {
        debug!("killpg({}) failed: {}, killing child only", group, e);
        let _ = child.kill();
    }
}

#[cfg(not(unix))]
fn kill_tree(child: &mut Child) {
    let _ = child.kill();
}

impl ExternalTool for SystemTool {
    fn invoke(&self, invocation: &Invocation) -> Result<ExitResult> {
        let program = Self::resolve_program(&invocation.program, &invocation.cwd);
        debug!("Executing: {}", invocation.command_line());

        let mut command = Command::new(&program);
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        let mut child = command
            .args(&invocation.args)
            .current_dir(&invocation.cwd)
            .envs(&invocation.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                Error::Io(std::io::Error::new(
                    e.kind(),
                    format!("Failed to spawn {}: {}", program.display(), e),
                ))
            })?;

        // Pipes are drained concurrently so a chatty build cannot block on a
        // full pipe while we wait on it.
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = match self.timeout {
            Some(timeout) => match child.wait_timeout(timeout)? {
                Some(status) => status,
                None => {
                    kill_tree(&mut child);
                    let _ = child.wait();
                    return Err(Error::ToolTimeout {
                        stage: invocation.program.clone(),
                        seconds: timeout.as_secs(),
                    });
                }
            },
            None => child.wait()?,
        };

        Ok(ExitResult {
            code: status.code(),
            stdout: stdout.join().unwrap_or_default(),
            stderr: stderr.join().unwrap_or_default(),
        })
    }
}
