use crate::collaborators::{self, Desktop, FilePicker, Notifier, Settings};
use crate::encoder::{CaptureProcess, CaptureRequest, Encoder, ProbeOutcome};
use crate::error::ControllerError;
use crate::messages::{NoticeAction, NoticeLevel, RecordingState, StatusItem};
use crate::naming;
use crate::platform::Platform;
use crate::services::elapsed::ElapsedTicker;
use crate::services::finalizer::{FinalizationRequest, Finalizer};
use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

pub const FFMPEG_DOWNLOAD_URL: &str = "https://ffmpeg.org/download.html";

const SAVE_ACTIONS: [NoticeAction; 3] = [
    NoticeAction::Open,
    NoticeAction::OpenAndCopy,
    NoticeAction::CopyToClipboard,
];

/// Services the controller calls out to
#[derive(Clone)]
pub struct Collaborators {
    pub encoder: Arc<dyn Encoder>,
    pub settings: Arc<dyn Settings>,
    pub notifier: Arc<dyn Notifier>,
    pub picker: Arc<dyn FilePicker>,
    pub desktop: Arc<dyn Desktop>,
}

struct ActiveRecording {
    temporary_file: PathBuf,
    started_at: Option<Instant>,
    capture: Option<Box<dyn CaptureProcess>>,
}

/// Drives one screen capture at a time through
/// NotRecording -> Starting -> Recording -> Stopping -> Finalizing -> NotRecording
///
/// Holds the capture process exclusively. The controller is driven from a
/// single task, so the state itself serializes start and stop requests.
pub struct RecordingController {
    state: RecordingState,
    active: Option<ActiveRecording>,
    encoder_available: bool,
    platform: Platform,
    display: String,
    encoder: Arc<dyn Encoder>,
    finalizer: Finalizer,
    settings: Arc<dyn Settings>,
    notifier: Arc<dyn Notifier>,
    picker: Arc<dyn FilePicker>,
    desktop: Arc<dyn Desktop>,
    status: Arc<watch::Sender<StatusItem>>,
    ticker: Option<ElapsedTicker>,
}

impl RecordingController {
    pub fn new(collaborators: Collaborators, platform: Platform, display: impl Into<String>) -> Self {
        let (status, _) = watch::channel(StatusItem::for_state(RecordingState::NotRecording));

        Self {
            state: RecordingState::NotRecording,
            active: None,
            encoder_available: true,
            platform,
            display: display.into(),
            finalizer: Finalizer::new(collaborators.encoder.clone()),
            encoder: collaborators.encoder,
            settings: collaborators.settings,
            notifier: collaborators.notifier,
            picker: collaborators.picker,
            desktop: collaborators.desktop,
            status: Arc::new(status),
            ticker: None,
        }
    }

    pub fn state(&self) -> RecordingState {
        self.state
    }

    pub fn subscribe(&self) -> watch::Receiver<StatusItem> {
        self.status.subscribe()
    }

    /// One-time encoder check; a missing encoder disables recording for good
    pub async fn probe_encoder(&mut self) {
        match self.encoder.probe().await {
            ProbeOutcome::Installed => {
                tracing::info!("ffmpeg found");
            }
            ProbeOutcome::NotInstalled => {
                tracing::error!("ffmpeg not found, recording disabled");
                self.encoder_available = false;
                self.show_unavailable().await;
            }
            ProbeOutcome::ProbeFailed(e) => {
                tracing::warn!("Could not check for ffmpeg: {}", e);
                self.notifier
                    .notify(
                        NoticeLevel::Warning,
                        "Could not check if ffmpeg is installed. Features of Timelapse may not work!",
                        &[],
                    )
                    .await;
            }
        }
    }

    pub async fn toggle(&mut self) -> Result<()> {
        match self.state {
            RecordingState::NotRecording => self.start().await,
            RecordingState::Recording => self.stop().await,
            state => {
                tracing::debug!("Busy ({}), ignoring toggle", state);
                Ok(())
            }
        }
    }

    pub async fn start(&mut self) -> Result<()> {
        if !self.encoder_available {
            self.show_unavailable().await;
            return Ok(());
        }

        if self.state != RecordingState::NotRecording {
            return Err(ControllerError::Busy(self.state).into());
        }

        let input_driver = self.platform.input_driver()?;

        tracing::info!("Starting recording");
        self.advance();

        let temporary_file = match naming::temporary_recording_file() {
            Ok(path) => path,
            Err(e) => return self.abort_start(e).await,
        };

        self.active = Some(ActiveRecording {
            temporary_file: temporary_file.clone(),
            started_at: None,
            capture: None,
        });

        let request = CaptureRequest {
            input_driver,
            framerate: self.settings.source_fps(),
            display: &self.display,
            output: &temporary_file,
        };

        let capture = match self.encoder.launch_capture(&request).await {
            Ok(capture) => capture,
            Err(e) => return self.abort_start(e).await,
        };

        let started_at = Instant::now();
        if let Some(active) = self.active.as_mut() {
            active.capture = Some(capture);
            active.started_at = Some(started_at);
        }

        self.advance();
        self.ticker = Some(ElapsedTicker::start(started_at, self.status.clone()));
        tracing::info!("Recording to {:?}", temporary_file);

        Ok(())
    }

    pub async fn stop(&mut self) -> Result<()> {
        if !self.encoder_available {
            self.show_unavailable().await;
            return Ok(());
        }

        if self.state != RecordingState::Recording {
            return Err(ControllerError::NotRecording(self.state).into());
        }

        let Some(active) = self.active.as_mut() else {
            panic!("Tried to stop recording when not currently recording");
        };

        if let Some(started_at) = active.started_at {
            tracing::info!("Stopping recording after {:?}", started_at.elapsed());
        }

        let mut capture = active.capture.take();
        let temporary_file = active.temporary_file.clone();

        self.advance();

        if let Some(capture) = capture.as_mut() {
            if let Err(e) = capture.terminate().await {
                tracing::error!("Failed to stop capture process: {:#}", e);
            }
        }
        drop(capture);

        let destination = self.choose_destination().await;

        self.advance();

        let saved = match destination {
            Ok(destination) => {
                let request = FinalizationRequest {
                    temporary_file,
                    destination,
                    final_fps: self.settings.final_fps(),
                };
                self.finalizer
                    .finalize(&request)
                    .await
                    .then_some(request.destination)
            }
            Err(e) => {
                tracing::error!("No destination for timelapse: {:#}", e);
                None
            }
        };

        self.active = None;
        self.advance();

        match saved {
            Some(path) => self.report_saved(&path).await,
            None => {
                self.notifier
                    .notify(NoticeLevel::Error, "Could not save timelapse!", &[])
                    .await;
            }
        }

        Ok(())
    }

    /// Best-effort save of a recording still running at exit
    ///
    /// Nothing is shown to the user; the outcome only goes to the log.
    pub async fn shutdown(&mut self, timeout: Duration) {
        self.ticker = None;

        let Some(mut active) = self.active.take() else {
            return;
        };

        tracing::info!("Saving active recording before exit");
        match tokio::time::timeout(timeout, self.save_on_exit(&mut active)).await {
            Ok(Ok(path)) => tracing::info!("Saved timelapse on exit: {:?}", path),
            Ok(Err(e)) => tracing::warn!("Could not save timelapse on exit: {:#}", e),
            Err(_) => tracing::warn!("Saving timelapse on exit timed out after {:?}", timeout),
        }

        self.state = RecordingState::NotRecording;
        self.status
            .send_replace(StatusItem::for_state(RecordingState::NotRecording));
    }

    async fn save_on_exit(&self, active: &mut ActiveRecording) -> Result<PathBuf> {
        if let Some(capture) = active.capture.as_mut() {
            if let Err(e) = capture.terminate().await {
                tracing::error!("Failed to stop capture process: {:#}", e);
            }
        }

        let request = FinalizationRequest {
            temporary_file: active.temporary_file.clone(),
            destination: naming::new_save_file(&self.settings.save_directory())?,
            final_fps: self.settings.final_fps(),
        };

        if !self.finalizer.finalize(&request).await {
            anyhow::bail!("finalize failed, capture kept at {:?}", request.temporary_file);
        }

        Ok(request.destination)
    }

    /// Move to the next state in the cycle and publish it
    fn advance(&mut self) {
        let next = self.state.next();
        tracing::debug!("Recording state: {} -> {}", self.state, next);

        self.state = next;
        self.ticker = None;
        self.status.send_replace(StatusItem::for_state(next));
    }

    async fn abort_start(&mut self, error: anyhow::Error) -> Result<()> {
        tracing::error!("Failed to start recording: {:#}", error);

        self.active = None;
        self.state = RecordingState::NotRecording;
        self.status
            .send_replace(StatusItem::for_state(RecordingState::NotRecording));

        self.notifier
            .notify(NoticeLevel::Error, "Could not start recording!", &[])
            .await;

        Ok(())
    }

    async fn choose_destination(&self) -> Result<PathBuf> {
        match self.picker.pick_save_path().await {
            Some(path) => Ok(std::path::absolute(path)?),
            None => naming::new_save_file(&self.settings.save_directory()),
        }
    }

    async fn report_saved(&self, path: &Path) {
        let message = format!("Saved timelapse: {}", path.display());
        let action = self
            .notifier
            .notify(NoticeLevel::Info, &message, &SAVE_ACTIONS)
            .await;

        let result = match action {
            Some(NoticeAction::Open) => collaborators::open_video(self.desktop.as_ref(), path).await,
            Some(NoticeAction::OpenAndCopy) => match self.copy_path(path).await {
                Ok(()) => collaborators::open_video(self.desktop.as_ref(), path).await,
                Err(e) => Err(e),
            },
            Some(NoticeAction::CopyToClipboard) => self.copy_path(path).await,
            Some(NoticeAction::VisitWebsite) | None => Ok(()),
        };

        if let Err(e) = result {
            tracing::error!("Follow-up action failed: {:#}", e);
            self.notifier
                .notify(NoticeLevel::Error, &format!("{:#}", e), &[])
                .await;
        }
    }

    async fn copy_path(&self, path: &Path) -> Result<()> {
        self.desktop
            .copy_to_clipboard(&path.to_string_lossy())
            .await?;
        self.notifier
            .notify(NoticeLevel::Info, "Copied timelapse path to clipboard", &[])
            .await;
        Ok(())
    }

    async fn show_unavailable(&self) {
        let action = self
            .notifier
            .notify(
                NoticeLevel::Error,
                "ffmpeg is not installed! Timelapse requires ffmpeg to record your screen and speed up the video.",
                &[NoticeAction::VisitWebsite],
            )
            .await;

        if action != Some(NoticeAction::VisitWebsite) {
            return;
        }

        if let Err(e) = self.desktop.open(FFMPEG_DOWNLOAD_URL).await {
            tracing::error!("Failed to open {}: {:#}", FFMPEG_DOWNLOAD_URL, e);
            self.notifier
                .notify(NoticeLevel::Error, &format!("{:#}", e), &[])
                .await;
        }
    }
}
