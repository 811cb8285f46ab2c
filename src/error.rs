use crate::messages::RecordingState;

/// Rejections the recording controller reports to its caller
#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error("a recording is already in progress ({0})")]
    Busy(RecordingState),

    #[error("no recording to stop ({0})")]
    NotRecording(RecordingState),

    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),
}
