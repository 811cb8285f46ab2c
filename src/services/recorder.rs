use crate::messages::{RecorderCommand, RecordingState};
use crate::services::controller::RecordingController;
use anyhow::Result;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

/// Owns the recording controller and serves commands to it one at a time
///
/// The controller's futures are not `Send` (the capture handle is only
/// `Send`), so this service must be spawned on a LocalSet using
/// tokio::task::spawn_local.
pub struct Recorder {
    controller: RecordingController,
    cmd_rx: mpsc::Receiver<RecorderCommand>,
    shutdown_timeout: Duration,
}

impl Recorder {
    pub fn new(
        controller: RecordingController,
        cmd_rx: mpsc::Receiver<RecorderCommand>,
        shutdown_timeout: Duration,
    ) -> Self {
        Self {
            controller,
            cmd_rx,
            shutdown_timeout,
        }
    }

    pub async fn run(mut self) {
        while let Some(cmd) = self.cmd_rx.recv().await {
            self.handle_command(cmd).await;
        }

        // Every handle is gone; make sure nothing is left recording
        self.controller.shutdown(self.shutdown_timeout).await;
        tracing::debug!("Recorder stopped");
    }

    async fn handle_command(&mut self, cmd: RecorderCommand) {
        match cmd {
            RecorderCommand::Start(reply) => {
                let _ = reply.send(self.controller.start().await);
            }

            RecorderCommand::Stop(reply) => {
                let _ = reply.send(self.controller.stop().await);
            }

            RecorderCommand::Toggle(reply) => {
                let _ = reply.send(self.controller.toggle().await);
            }

            RecorderCommand::State(reply) => {
                let _ = reply.send(self.controller.state());
            }

            RecorderCommand::Shutdown(reply) => {
                self.controller.shutdown(self.shutdown_timeout).await;
                let _ = reply.send(());
            }
        }
    }
}

/// Handle for communicating with the Recorder
#[derive(Clone)]
pub struct RecorderHandle {
    tx: mpsc::Sender<RecorderCommand>,
}

impl RecorderHandle {
    pub fn new(tx: mpsc::Sender<RecorderCommand>) -> Self {
        Self { tx }
    }

    pub async fn start(&self) -> Result<()> {
        self.request(RecorderCommand::Start).await?
    }

    pub async fn stop(&self) -> Result<()> {
        self.request(RecorderCommand::Stop).await?
    }

    pub async fn toggle(&self) -> Result<()> {
        self.request(RecorderCommand::Toggle).await?
    }

    pub async fn state(&self) -> Result<RecordingState> {
        self.request(RecorderCommand::State).await
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.request(RecorderCommand::Shutdown).await
    }

    async fn request<T>(&self, cmd: impl FnOnce(oneshot::Sender<T>) -> RecorderCommand) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(cmd(reply))
            .await
            .map_err(|e| anyhow::anyhow!("Failed to send recorder command: {}", e))?;

        rx.await
            .map_err(|e| anyhow::anyhow!("Failed to receive recorder response: {}", e))
    }
}
