use crate::collaborators::Desktop;
use crate::platform::Platform;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::io::Write;
use std::process::{Command, Stdio};
use tokio::task;

/// Opens links and files with the platform opener and writes the clipboard
pub struct SystemDesktop {
    platform: Platform,
}

impl SystemDesktop {
    pub fn new(platform: Platform) -> Self {
        Self { platform }
    }
}

#[async_trait]
impl Desktop for SystemDesktop {
    async fn open(&self, target: &str) -> Result<()> {
        let opener = self.platform.opener()?;
        tracing::info!("Opening {} with {}", target, opener);

        let child = tokio::process::Command::new(opener)
            .arg(target)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to spawn {}", opener))?;

        // Openers may linger; only their failure is interesting
        tokio::task::spawn(async move {
            match child.wait_with_output().await {
                Ok(output) => {
                    // explorer exits with 1 even when it succeeded
                    if !output.status.success() && opener != "explorer" {
                        let stderr = String::from_utf8_lossy(&output.stderr);
                        tracing::warn!("{} exited with {}: {}", opener, output.status, stderr.trim());
                    }
                }
                Err(e) => tracing::warn!("Failed to wait on {}: {}", opener, e),
            }
        });

        Ok(())
    }

    async fn copy_to_clipboard(&self, text: &str) -> Result<()> {
        let candidates = self.platform.clipboard_commands()?;
        let text = text.to_string();

        task::spawn_blocking(move || {
            let mut last_error = None;

            for command in candidates {
                match copy_with(command, &text) {
                    Ok(()) => {
                        tracing::info!("Copied {} chars with {}", text.len(), command[0]);
                        return Ok(());
                    }
                    Err(e) => {
                        tracing::debug!("{} failed: {:#}", command[0], e);
                        last_error = Some(e);
                    }
                }
            }

            Err(last_error.unwrap_or_else(|| anyhow::anyhow!("No clipboard command available")))
                .context("Could not copy timelapse path to clipboard")
        })
        .await
        .context("spawn_blocking failed")?
    }
}

fn copy_with(command: &[&str], text: &str) -> Result<()> {
    let mut child = Command::new(command[0])
        .args(&command[1..])
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .with_context(|| format!("Failed to spawn {}", command[0]))?;

    child
        .stdin
        .take()
        .with_context(|| format!("Failed to get {} stdin", command[0]))?
        .write_all(text.as_bytes())
        .with_context(|| format!("Failed to write to {}", command[0]))?;

    let status = child
        .wait()
        .with_context(|| format!("{} failed", command[0]))?;
    if !status.success() {
        anyhow::bail!("{} exited with {}", command[0], status);
    }

    Ok(())
}
