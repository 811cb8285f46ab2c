use anyhow::Result;
use std::fmt;
use tokio::sync::oneshot;

/// Commands for the Recorder service
pub enum RecorderCommand {
    Start(oneshot::Sender<Result<()>>),
    Stop(oneshot::Sender<Result<()>>),
    Toggle(oneshot::Sender<Result<()>>),
    State(oneshot::Sender<RecordingState>),
    Shutdown(oneshot::Sender<()>),
}

/// Commands accepted by the app loop
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UserCommand {
    Start,
    Stop,
    Toggle,
    Status,
    Quit,
}

impl UserCommand {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "start" => Some(Self::Start),
            "stop" => Some(Self::Stop),
            "toggle" | "t" => Some(Self::Toggle),
            "status" | "s" => Some(Self::Status),
            "quit" | "exit" | "q" => Some(Self::Quit),
            _ => None,
        }
    }
}

/// Recording lifecycle, cycled in declaration order
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordingState {
    NotRecording,
    Starting,
    Recording,
    Stopping,
    Finalizing,
}

impl RecordingState {
    /// The only state this one may move to.
    pub fn next(self) -> Self {
        match self {
            Self::NotRecording => Self::Starting,
            Self::Starting => Self::Recording,
            Self::Recording => Self::Stopping,
            Self::Stopping => Self::Finalizing,
            Self::Finalizing => Self::NotRecording,
        }
    }
}

impl fmt::Display for RecordingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotRecording => "not recording",
            Self::Starting => "starting",
            Self::Recording => "recording",
            Self::Stopping => "stopping",
            Self::Finalizing => "finalizing",
        };
        f.write_str(name)
    }
}

/// Command a status item triggers when activated
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusCommand {
    StartRecording,
    StopRecording,
}

/// Status surface (observable via watch channel)
#[derive(Clone, Debug, PartialEq)]
pub struct StatusItem {
    pub state: RecordingState,
    pub label: &'static str,
    pub command: Option<StatusCommand>,
    pub tooltip: String,
}

impl StatusItem {
    pub fn for_state(state: RecordingState) -> Self {
        match state {
            RecordingState::NotRecording => Self {
                state,
                label: "● Record",
                command: Some(StatusCommand::StartRecording),
                tooltip: "Start recording a timelapse".to_string(),
            },
            RecordingState::Starting | RecordingState::Stopping | RecordingState::Finalizing => {
                Self {
                    state,
                    label: "…",
                    command: None,
                    tooltip: "Please wait".to_string(),
                }
            }
            RecordingState::Recording => Self {
                state,
                label: "● Stop",
                command: Some(StatusCommand::StopRecording),
                tooltip: "00:00:00".to_string(),
            },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// Actions a notice may offer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeAction {
    Open,
    OpenAndCopy,
    CopyToClipboard,
    VisitWebsite,
}

impl NoticeAction {
    pub fn label(self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::OpenAndCopy => "Open & copy",
            Self::CopyToClipboard => "Copy to clipboard",
            Self::VisitWebsite => "Visit website in browser",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_cycle_returns_to_start() {
        let mut state = RecordingState::NotRecording;
        let mut seen = vec![state];
        for _ in 0..5 {
            state = state.next();
            seen.push(state);
        }

        assert_eq!(
            seen,
            vec![
                RecordingState::NotRecording,
                RecordingState::Starting,
                RecordingState::Recording,
                RecordingState::Stopping,
                RecordingState::Finalizing,
                RecordingState::NotRecording,
            ]
        );
    }

    #[test]
    fn test_recording_never_moves_back_to_starting() {
        assert_ne!(RecordingState::Recording.next(), RecordingState::Starting);
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(UserCommand::parse("start"), Some(UserCommand::Start));
        assert_eq!(UserCommand::parse("  STOP \n"), Some(UserCommand::Stop));
        assert_eq!(UserCommand::parse("q"), Some(UserCommand::Quit));
        assert_eq!(UserCommand::parse("record"), None);
    }

    #[test]
    fn test_status_binds_commands() {
        let idle = StatusItem::for_state(RecordingState::NotRecording);
        assert_eq!(idle.command, Some(StatusCommand::StartRecording));

        let busy = StatusItem::for_state(RecordingState::Finalizing);
        assert_eq!(busy.command, None);
        assert_eq!(busy.tooltip, "Please wait");

        let recording = StatusItem::for_state(RecordingState::Recording);
        assert_eq!(recording.command, Some(StatusCommand::StopRecording));
    }
}
