pub mod ffmpeg;

pub use ffmpeg::FfmpegEncoder;

use anyhow::Result;
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::Path;

/// Result of the startup availability check
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProbeOutcome {
    Installed,
    NotInstalled,
    /// The check itself could not be run
    ProbeFailed(String),
}

/// Screen grab parameters
#[derive(Debug)]
pub struct CaptureRequest<'a> {
    pub input_driver: &'a str,
    pub framerate: u32,
    pub display: &'a str,
    pub output: &'a Path,
}

impl CaptureRequest<'_> {
    pub fn args(&self) -> Vec<OsString> {
        vec![
            "-f".into(),
            self.input_driver.into(),
            "-framerate".into(),
            self.framerate.to_string().into(),
            "-i".into(),
            self.display.into(),
            self.output.into(),
        ]
    }
}

/// Timestamp rescale of a finished capture, without re-encoding
#[derive(Debug)]
pub struct RemuxRequest<'a> {
    pub time_scale: f64,
    pub input: &'a Path,
    pub output: &'a Path,
}

impl RemuxRequest<'_> {
    pub fn args(&self) -> Vec<OsString> {
        vec![
            "-itsscale".into(),
            self.time_scale.to_string().into(),
            "-i".into(),
            self.input.into(),
            "-c".into(),
            "copy".into(),
            self.output.into(),
        ]
    }
}

/// A running capture process, owned by whoever launched it
#[async_trait]
pub trait CaptureProcess: Send {
    /// Ask the process to stop and wait until it has exited
    async fn terminate(&mut self) -> Result<()>;
}

/// Everything the recorder needs from the external encoder
#[async_trait]
pub trait Encoder: Send + Sync {
    async fn probe(&self) -> ProbeOutcome;

    /// Returns once the process has been spawned
    async fn launch_capture(&self, request: &CaptureRequest<'_>) -> Result<Box<dyn CaptureProcess>>;

    /// Runs to completion; a non-zero exit is an error
    async fn remux(&self, request: &RemuxRequest<'_>) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_args() {
        let request = CaptureRequest {
            input_driver: "x11grab",
            framerate: 1,
            display: ":0.0",
            output: Path::new("/tmp/timelapse-temp-ab.mp4"),
        };

        assert_eq!(
            request.args(),
            vec!["-f", "x11grab", "-framerate", "1", "-i", ":0.0", "/tmp/timelapse-temp-ab.mp4"]
                .into_iter()
                .map(OsString::from)
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_remux_args() {
        let request = RemuxRequest {
            time_scale: 0.5,
            input: Path::new("/tmp/in.mp4"),
            output: Path::new("/srv/out.mp4"),
        };

        assert_eq!(
            request.args(),
            vec!["-itsscale", "0.5", "-i", "/tmp/in.mp4", "-c", "copy", "/srv/out.mp4"]
                .into_iter()
                .map(OsString::from)
                .collect::<Vec<_>>()
        );
    }
}
