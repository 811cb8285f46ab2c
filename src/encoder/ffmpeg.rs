use super::{CaptureProcess, CaptureRequest, Encoder, ProbeOutcome, RemuxRequest};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, Command};

/// Shells out to an ffmpeg executable
pub struct FfmpegEncoder {
    program: String,
    stop_timeout: Duration,
}

impl FfmpegEncoder {
    pub fn new(program: impl Into<String>, stop_timeout: Duration) -> Self {
        Self {
            program: program.into(),
            stop_timeout,
        }
    }
}

#[async_trait]
impl Encoder for FfmpegEncoder {
    async fn probe(&self) -> ProbeOutcome {
        let status = Command::new(&self.program)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        match status {
            // Without arguments ffmpeg prints its usage and exits with 1
            Ok(status) if status.success() || status.code() == Some(1) => ProbeOutcome::Installed,
            Ok(status) => {
                tracing::warn!("{} exited with {} when probed", self.program, status);
                ProbeOutcome::NotInstalled
            }
            Err(e) if e.kind() == ErrorKind::NotFound => ProbeOutcome::NotInstalled,
            Err(e) => ProbeOutcome::ProbeFailed(e.to_string()),
        }
    }

    async fn launch_capture(&self, request: &CaptureRequest<'_>) -> Result<Box<dyn CaptureProcess>> {
        tracing::debug!("Launching {} {:?}", self.program, request.args());

        let child = Command::new(&self.program)
            .args(request.args())
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to spawn {}", self.program))?;

        Ok(Box::new(FfmpegCapture {
            child,
            stop_timeout: self.stop_timeout,
        }))
    }

    async fn remux(&self, request: &RemuxRequest<'_>) -> Result<()> {
        tracing::debug!("Running {} {:?}", self.program, request.args());

        let output = Command::new(&self.program)
            .args(request.args())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .with_context(|| format!("Failed to execute {}", self.program))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let tail = stderr.lines().last().unwrap_or_default();
            anyhow::bail!("{} exited with {}: {}", self.program, output.status, tail.trim());
        }

        Ok(())
    }
}

struct FfmpegCapture {
    child: Child,
    stop_timeout: Duration,
}

#[async_trait]
impl CaptureProcess for FfmpegCapture {
    async fn terminate(&mut self) -> Result<()> {
        // "q" on stdin makes ffmpeg write the container trailer before exiting
        if let Some(mut stdin) = self.child.stdin.take() {
            if let Err(e) = stdin.write_all(b"q").await {
                tracing::warn!("Failed to ask capture process to quit: {}", e);
            }
        }

        match tokio::time::timeout(self.stop_timeout, self.child.wait()).await {
            Ok(status) => {
                let status = status.context("Failed to wait on capture process")?;
                tracing::debug!("Capture process exited with {}", status);
            }
            Err(_) => {
                tracing::warn!(
                    "Capture process did not exit within {:?}, killing it",
                    self.stop_timeout
                );
                self.child
                    .kill()
                    .await
                    .context("Failed to kill capture process")?;
            }
        }

        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_program_is_not_installed() {
        let encoder = FfmpegEncoder::new("timelapse-no-such-encoder", Duration::from_secs(1));
        assert_eq!(encoder.probe().await, ProbeOutcome::NotInstalled);
    }

    #[tokio::test]
    async fn test_usage_exit_code_counts_as_installed() {
        // `false` exits with status 1, like ffmpeg printing its usage
        let encoder = FfmpegEncoder::new("false", Duration::from_secs(1));
        assert_eq!(encoder.probe().await, ProbeOutcome::Installed);
    }

    #[tokio::test]
    async fn test_remux_failure_is_an_error() {
        let encoder = FfmpegEncoder::new("false", Duration::from_secs(1));
        let request = RemuxRequest {
            time_scale: 1.0,
            input: std::path::Path::new("/nonexistent/in.mp4"),
            output: std::path::Path::new("/nonexistent/out.mp4"),
        };

        assert!(encoder.remux(&request).await.is_err());
    }
}
