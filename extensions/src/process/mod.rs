//! Runs an engine as a child process speaking JSON lines on stdin/stdout.
//!
//! Stderr is reserved for the engine's own diagnostics. Every stderr line is
//! forwarded to `tracing` under the `tdlink::engine` target and never parsed.

mod error;

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::lines::LinesTransport;

pub use error::ProcessError;

/// The transport half handed out by [`EngineProcess::spawn`].
pub type ProcessTransport = LinesTransport<ChildStdout, ChildStdin>;

/// How to launch an engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
    pub cwd: Option<PathBuf>,
}

impl EngineCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        EngineCommand {
            program: program.into(),
            args: Vec::new(),
            env: HashMap::new(),
            cwd: None,
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

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    fn name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.program.display().to_string())
    }

    // Bare names are resolved through PATH by the OS, so only paths are checked.
    fn check(&self) -> Result<(), ProcessError> {
        if self.program.components().count() > 1 && !self.program.is_file() {
            return Err(ProcessError::ExecutableNotFound(self.program.clone()));
        }
        if let Some(dir) = &self.cwd {
            if !dir.is_dir() {
                return Err(ProcessError::WorkingDirNotFound(dir.clone()));
            }
        }
        Ok(())
    }
}

/// A running engine. Dropping it kills the child.
#[derive(Debug)]
pub struct EngineProcess {
    name: String,
    child: Child,
    stderr_task: Option<JoinHandle<()>>,
}

impl EngineProcess {
    /// Spawns the engine and returns it together with a transport over its
    /// stdio, ready for `Client::connect`.
    pub fn spawn(command: &EngineCommand) -> Result<(Self, ProcessTransport), ProcessError> {
        command.check()?;
        let name = command.name();

        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .envs(&command.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &command.cwd {
            cmd.current_dir(dir);
        }

        let mut child = cmd
            .spawn()
            .map_err(|e| ProcessError::Spawn(command.program.clone(), e))?;
        info!(engine = %name, pid = child.id(), "Spawned engine process");

        let stdin = child.stdin.take().ok_or(ProcessError::MissingPipe("stdin"))?;
        let stdout = child.stdout.take().ok_or(ProcessError::MissingPipe("stdout"))?;
        let stderr_task = child
            .stderr
            .take()
            .map(|stderr| tokio::spawn(forward_stderr(name.clone(), stderr)));

        let process = EngineProcess {
            name,
            child,
            stderr_task,
        };
        Ok((process, LinesTransport::new(stdout, stdin)))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The OS process id, or `None` once the child has been reaped.
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    pub fn try_wait(&mut self) -> Result<Option<ExitStatus>, ProcessError> {
        self.child.try_wait().map_err(ProcessError::Wait)
    }

    /// Waits for the engine to exit on its own, typically after the client
    /// closed its stdin.
    pub async fn wait(&mut self) -> Result<ExitStatus, ProcessError> {
        let status = self.child.wait().await.map_err(ProcessError::Wait)?;
        if let Some(task) = self.stderr_task.take() {
            let _ = task.await;
        }
        if status.success() {
            debug!(engine = %self.name, %status, "Engine exited");
        } else {
            warn!(engine = %self.name, %status, "Engine exited with failure");
        }
        Ok(status)
    }

    pub async fn kill(&mut self) -> Result<(), ProcessError> {
        self.child.kill().await?;
        if let Some(task) = self.stderr_task.take() {
            task.abort();
        }
        Ok(())
    }
}

async fn forward_stderr(name: String, stderr: ChildStderr) {
    let mut lines = BufReader::new(stderr).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => debug!(target: "tdlink::engine", engine = %name, "{line}"),
            Ok(None) => break,
            Err(e) => {
                warn!(engine = %name, error = %e, "Failed to read engine stderr");
                break;
            }
        }
    }
}
