//! The encode capability and its FFmpeg implementation.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use metrics::histogram;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStderr, Command};
use tracing::{debug, info, warn};
use vtx_models::EncodingProfile;

use crate::command::{resolve_ffmpeg, FfmpegCommand};
use crate::error::{MediaError, MediaResult};

/// Encode duration histogram, labelled by outcome.
pub const ENCODE_DURATION_SECONDS: &str = "vtx_encode_duration_seconds";

/// Lines of encoder stderr kept for the failure log.
const STDERR_TAIL_LINES: usize = 20;

/// How long to keep reading stderr after a timed-out encoder is killed. A
/// surviving grandchild can hold the pipe open indefinitely.
const KILLED_DRAIN_GRACE: Duration = Duration::from_secs(2);

/// Exit result of one encoder run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeOutcome {
    Success,
    /// The process ran and exited non-zero. `exit_code` is `None` when it was
    /// terminated by a signal.
    Failed { exit_code: Option<i32> },
}

impl EncodeOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, EncodeOutcome::Success)
    }
}

/// Something that turns an input file into an output file for a profile.
#[async_trait]
pub trait Encoder: Send + Sync {
    async fn run(
        &self,
        profile: &EncodingProfile,
        input: &Path,
        output: &Path,
    ) -> MediaResult<EncodeOutcome>;
}

/// Runs the FFmpeg binary.
///
/// Encoder stderr is forwarded line by line to this process's stderr and fully
/// drained before `run` returns, so the child never blocks on a full pipe.
#[derive(Debug, Clone)]
pub struct FfmpegEncoder {
    binary: PathBuf,
    timeout: Option<Duration>,
}

impl FfmpegEncoder {
    /// Use `binary` as-is.
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            timeout: None,
        }
    }

    /// Resolve the binary from an optional configured path, falling back to PATH.
    pub fn locate(configured: Option<&Path>) -> MediaResult<Self> {
        Ok(Self::new(resolve_ffmpeg(configured)?))
    }

    /// Kill the encode after `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Run a prepared command.
    pub async fn run_command(&self, cmd: &FfmpegCommand) -> MediaResult<EncodeOutcome> {
        if !cmd.input().exists() {
            return Err(MediaError::FileNotFound(cmd.input().to_path_buf()));
        }

        let args = cmd.build_args();
        debug!("Running FFmpeg: {} {}", self.binary.display(), args.join(" "));

        let mut child = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => MediaError::BinaryNotFound(self.binary.clone()),
                _ => MediaError::Io(e),
            })?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| MediaError::internal("encoder stderr not captured"))?;
        let mut drain = tokio::spawn(forward_stderr(stderr));

        let start = Instant::now();
        let waited = self.wait_for_exit(&mut child).await;

        let tail = if waited.is_ok() {
            drain.await.unwrap_or_default()
        } else {
            match tokio::time::timeout(KILLED_DRAIN_GRACE, &mut drain).await {
                Ok(joined) => joined.unwrap_or_default(),
                Err(_) => {
                    warn!("Encoder stderr still open after kill, abandoning it");
                    drain.abort();
                    Vec::new()
                }
            }
        };

        let elapsed = start.elapsed().as_secs_f64();
        let outcome = match waited {
            Ok(status) if status.success() => EncodeOutcome::Success,
            Ok(status) => EncodeOutcome::Failed {
                exit_code: status.code(),
            },
            Err(e) => {
                histogram!(ENCODE_DURATION_SECONDS, "outcome" => "error").record(elapsed);
                return Err(e);
            }
        };

        match outcome {
            EncodeOutcome::Success => {
                histogram!(ENCODE_DURATION_SECONDS, "outcome" => "success").record(elapsed);
                info!(elapsed_secs = elapsed, "Encode finished");
            }
            EncodeOutcome::Failed { exit_code } => {
                histogram!(ENCODE_DURATION_SECONDS, "outcome" => "failed").record(elapsed);
                warn!(
                    exit_code = ?exit_code,
                    stderr_tail = %tail.join("\n"),
                    "Encode exited unsuccessfully"
                );
            }
        }

        Ok(outcome)
    }

    /// Wait for the child, killing it when the timeout expires.
    async fn wait_for_exit(&self, child: &mut Child) -> MediaResult<std::process::ExitStatus> {
        let Some(timeout) = self.timeout else {
            return Ok(child.wait().await?);
        };

        match tokio::time::timeout(timeout, child.wait()).await {
            Ok(status) => Ok(status?),
            Err(_) => {
                warn!("FFmpeg timed out after {} seconds, killing process", timeout.as_secs());
                let _ = child.kill().await;
                Err(MediaError::Timeout(timeout.as_secs()))
            }
        }
    }
}

#[async_trait]
impl Encoder for FfmpegEncoder {
    async fn run(
        &self,
        profile: &EncodingProfile,
        input: &Path,
        output: &Path,
    ) -> MediaResult<EncodeOutcome> {
        let cmd = FfmpegCommand::for_profile(profile, input, output);
        self.run_command(&cmd).await
    }
}

/// Copy encoder stderr to our stderr until EOF, keeping the last few lines.
async fn forward_stderr(stderr: ChildStderr) -> Vec<String> {
    let mut lines = BufReader::new(stderr).lines();
    let mut host = tokio::io::stderr();
    let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);

    while let Ok(Some(line)) = lines.next_line().await {
        let _ = host.write_all(line.as_bytes()).await;
        let _ = host.write_all(b"\n").await;

        if tail.len() == STDERR_TAIL_LINES {
            tail.pop_front();
        }
        tail.push_back(line);
    }
    let _ = host.flush().await;

    tail.into_iter().collect()
}
