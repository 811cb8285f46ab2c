use crate::collaborators::Notifier;
use crate::config::Config;
use crate::console::{ConsoleInput, ConsoleNotifier, ConsolePicker};
use crate::desktop::SystemDesktop;
use crate::encoder::FfmpegEncoder;
use crate::messages::{NoticeLevel, StatusItem, UserCommand};
use crate::platform::Platform;
use crate::services::{Collaborators, Recorder, RecorderHandle, RecordingController};

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};

pub struct App {
    recorder: RecorderHandle,
    notifier: Arc<dyn Notifier>,
    input: ConsoleInput,
}

impl App {
    pub async fn new(config: Config) -> Result<Self> {
        let platform = Platform::current();
        let input = ConsoleInput::from_stdin();
        let notifier: Arc<dyn Notifier> = Arc::new(ConsoleNotifier::new(input.clone()));

        let encoder = FfmpegEncoder::new(
            config.encoder.clone(),
            Duration::from_secs(config.stop_timeout_secs),
        );
        let shutdown_timeout = Duration::from_secs(config.shutdown_timeout_secs);
        let display = config.display.clone();

        let collaborators = Collaborators {
            encoder: Arc::new(encoder),
            settings: Arc::new(config),
            notifier: notifier.clone(),
            picker: Arc::new(ConsolePicker::new(input.clone())),
            desktop: Arc::new(SystemDesktop::new(platform.clone())),
        };

        let mut controller = RecordingController::new(collaborators, platform, display);
        controller.probe_encoder().await;

        Self::watch_status(controller.subscribe());
        let recorder = Self::setup_recorder(controller, shutdown_timeout);

        tracing::info!("Ready! Type start, stop, toggle, status or quit");

        Ok(Self {
            recorder,
            notifier,
            input,
        })
    }

    pub async fn run(self) -> Result<()> {
        loop {
            tracing::debug!("Main loop: waiting for command");
            tokio::select! {
                line = self.input.next_line() => {
                    let Some(line) = line else {
                        tracing::info!("Input closed, shutting down");
                        break;
                    };

                    match UserCommand::parse(&line) {
                        Some(UserCommand::Quit) => break,
                        Some(command) => tokio::select! {
                            result = self.handle_command(command) => {
                                if let Err(e) = result {
                                    tracing::error!("Error handling {:?}: {:#}", command, e);
                                    self.notifier
                                        .notify(NoticeLevel::Error, &e.to_string(), &[])
                                        .await;
                                }
                            }
                            _ = tokio::signal::ctrl_c() => {
                                // Prompts still waiting for input take their defaults
                                tracing::info!("Received Ctrl+C during {:?}, shutting down", command);
                                self.input.close();
                                break;
                            }
                        },
                        None if line.trim().is_empty() => {}
                        None => println!("Unknown command: {}", line.trim()),
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Received Ctrl+C, shutting down");
                    break;
                }
            }
        }

        self.recorder.shutdown().await?;
        tracing::info!("Timelapse shutdown complete");
        Ok(())
    }

    async fn handle_command(&self, command: UserCommand) -> Result<()> {
        match command {
            UserCommand::Start => self.recorder.start().await,
            UserCommand::Stop => self.recorder.stop().await,
            UserCommand::Toggle => self.recorder.toggle().await,
            UserCommand::Status => {
                println!("State: {}", self.recorder.state().await?);
                Ok(())
            }
            UserCommand::Quit => Ok(()),
        }
    }

    fn setup_recorder(controller: RecordingController, shutdown_timeout: Duration) -> RecorderHandle {
        // Create and spawn Recorder (using spawn_local because it's !Send)
        let (recorder_tx, recorder_rx) = mpsc::channel(10);
        let recorder = Recorder::new(controller, recorder_rx, shutdown_timeout);
        tokio::task::spawn_local(recorder.run());

        RecorderHandle::new(recorder_tx)
    }

    fn watch_status(mut status: watch::Receiver<StatusItem>) {
        tokio::spawn(async move {
            let mut state = status.borrow().state;

            while status.changed().await.is_ok() {
                let item = status.borrow_and_update().clone();
                if item.state != state {
                    tracing::info!(
                        "Status: {} [{}] {:?}: {}",
                        item.label,
                        item.state,
                        item.command,
                        item.tooltip
                    );
                    state = item.state;
                } else {
                    tracing::debug!("Status tooltip: {}", item.tooltip);
                }
            }
        });
    }
}
