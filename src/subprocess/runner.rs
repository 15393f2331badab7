use async_trait::async_trait;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

use super::error::ProcessError;

#[derive(Debug, Clone)]
pub struct ProcessCommand {
    pub program: String,
    pub args: Vec<String>,
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    Error(i32),
    Signal(i32),
}

impl ExitStatus {
    pub fn success(&self) -> bool {
        matches!(self, ExitStatus::Success)
    }

    pub fn code(&self) -> Option<i32> {
        match self {
            ExitStatus::Success => Some(0),
            ExitStatus::Error(code) => Some(*code),
            ExitStatus::Signal(_) => None,
        }
    }
}

/// Runs one external process to completion, capturing both output channels.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(&self, command: ProcessCommand) -> Result<ProcessOutput, ProcessError>;
}

pub struct TokioProcessRunner;

impl TokioProcessRunner {
    /// Normalize a line by removing trailing newlines
    fn normalize_line(mut line: String) -> String {
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        line
    }

    /// Read a channel line by line until EOF. Invalid UTF-8 is replaced rather
    /// than failing the capture.
    async fn read_lines<R>(reader: Option<R>) -> Result<Vec<String>, ProcessError>
    where
        R: AsyncRead + Unpin,
    {
        let Some(reader) = reader else {
            return Ok(Vec::new());
        };

        let mut reader = BufReader::new(reader);
        let mut lines = Vec::new();
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).await? == 0 {
                break;
            }
            let line = String::from_utf8_lossy(&buf).into_owned();
            lines.push(Self::normalize_line(line));
        }
        Ok(lines)
    }

    /// Log command execution details
    fn log_command_start(command: &ProcessCommand) {
        tracing::debug!(
            "Executing subprocess: {} ({} args)",
            command.program,
            command.args.len()
        );
        tracing::trace!("Subprocess args: {:?}", command.args);

        // Prompts travel as arguments; very large ones can hit E2BIG
        let args_size: usize = command.args.iter().map(|s| s.len()).sum();
        if args_size > 100_000 {
            tracing::warn!(
                "Large arguments detected: {} args, {} total bytes",
                command.args.len(),
                args_size
            );
        }
    }

    /// Configure the command with its pipes
    fn configure_command(command: &ProcessCommand) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new(&command.program);
        cmd.args(&command.args);

        cmd.stdin(std::process::Stdio::null());
        cmd.stdout(std::process::Stdio::piped());
        cmd.stderr(std::process::Stdio::piped());

        // Dropping the run future (client went away) must not leave an orphan
        cmd.kill_on_drop(true);
        cmd
    }

    /// Convert process exit status to our ExitStatus enum
    fn parse_exit_status(status: std::process::ExitStatus) -> ExitStatus {
        if status.success() {
            ExitStatus::Success
        } else if let Some(code) = status.code() {
            ExitStatus::Error(code)
        } else {
            Self::parse_signal_status(status)
        }
    }

    /// Parse signal status on Unix systems
    #[cfg(unix)]
    fn parse_signal_status(status: std::process::ExitStatus) -> ExitStatus {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            ExitStatus::Signal(signal)
        } else {
            ExitStatus::Error(1)
        }
    }

    #[cfg(not(unix))]
    fn parse_signal_status(_status: std::process::ExitStatus) -> ExitStatus {
        ExitStatus::Error(1)
    }

    /// Map spawn error to ProcessError
    fn map_spawn_error(error: std::io::Error, command: &ProcessCommand) -> ProcessError {
        match error.kind() {
            std::io::ErrorKind::NotFound => ProcessError::CommandNotFound(command.program.clone()),
            std::io::ErrorKind::PermissionDenied => {
                ProcessError::PermissionDenied(command.program.clone())
            }
            _ => ProcessError::SpawnFailed {
                command: command.program.clone(),
                source: error,
            },
        }
    }

    /// Drain both channels and wait for exit
    async fn collect(
        child: &mut tokio::process::Child,
    ) -> Result<(Vec<String>, Vec<String>, std::process::ExitStatus), ProcessError> {
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let (stdout, stderr, status) = tokio::join!(
            Self::read_lines(stdout),
            Self::read_lines(stderr),
            child.wait()
        );

        Ok((stdout?, stderr?, status?))
    }

    /// Kill a child that overran its deadline and reap it
    async fn terminate(child: &mut tokio::process::Child, program: &str, limit: Duration) {
        tracing::warn!("Subprocess '{}' exceeded {:?}, killing it", program, limit);
        if let Err(e) = child.kill().await {
            tracing::error!("Failed to kill subprocess '{}': {}", program, e);
        }
    }

    /// Log the process execution result
    fn log_result(result: &ProcessOutput, command: &ProcessCommand) {
        match &result.status {
            ExitStatus::Success => {
                tracing::debug!(
                    "Subprocess completed successfully in {:?}: {}",
                    result.duration,
                    command.program
                );
                tracing::trace!("Stdout length: {} bytes", result.stdout.len());
                tracing::trace!("Stderr length: {} bytes", result.stderr.len());
            }
            ExitStatus::Error(code) => {
                tracing::debug!(
                    "Subprocess failed with exit code {} in {:?}: {}",
                    code,
                    result.duration,
                    command.program
                );
                if !result.stderr.is_empty() {
                    tracing::trace!("Stderr: {}", result.stderr);
                }
            }
            ExitStatus::Signal(signal) => {
                tracing::warn!(
                    "Subprocess terminated by signal {} in {:?}: {}",
                    signal,
                    result.duration,
                    command.program
                );
            }
        }
    }
}

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run(&self, command: ProcessCommand) -> Result<ProcessOutput, ProcessError> {
        let start = Instant::now();

        Self::log_command_start(&command);

        let mut child = Self::configure_command(&command).spawn().map_err(|e| {
            tracing::error!(
                "Failed to spawn '{}': {:?} (kind: {:?})",
                command.program,
                e,
                e.kind()
            );
            Self::map_spawn_error(e, &command)
        })?;

        let collected = match command.timeout {
            Some(limit) => {
                let outcome = tokio::time::timeout(limit, Self::collect(&mut child)).await;
                match outcome {
                    Ok(collected) => collected?,
                    Err(_) => {
                        Self::terminate(&mut child, &command.program, limit).await;
                        return Err(ProcessError::Timeout(limit));
                    }
                }
            }
            None => Self::collect(&mut child).await?,
        };

        let (stdout, stderr, status) = collected;
        let result = ProcessOutput {
            status: Self::parse_exit_status(status),
            stdout: stdout.join("\n"),
            stderr: stderr.join("\n"),
            duration: start.elapsed(),
        };

        Self::log_result(&result, &command);

        Ok(result)
    }
}
