use crate::encoder::{Encoder, RemuxRequest};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A finished capture and where its timelapse should end up
#[derive(Debug, Clone)]
pub struct FinalizationRequest {
    pub temporary_file: PathBuf,
    pub destination: PathBuf,
    pub final_fps: u32,
}

impl FinalizationRequest {
    /// Factor applied to input timestamps: one captured frame per output frame
    pub fn time_scale(&self) -> f64 {
        1.0 / self.final_fps as f64
    }
}

/// Turns a raw capture into the saved timelapse
///
/// On success the destination exists and the capture is gone. On failure the
/// capture is left exactly where it was so it can be recovered by hand.
pub struct Finalizer {
    encoder: Arc<dyn Encoder>,
}

impl Finalizer {
    pub fn new(encoder: Arc<dyn Encoder>) -> Self {
        Self { encoder }
    }

    pub async fn finalize(&self, request: &FinalizationRequest) -> bool {
        match self.try_finalize(request).await {
            Ok(()) => {
                tracing::info!("Saved timelapse to {:?}", request.destination);
                true
            }
            Err(e) => {
                tracing::error!(
                    "Failed to finalize {:?} into {:?}: {:#}",
                    request.temporary_file,
                    request.destination,
                    e
                );
                false
            }
        }
    }

    async fn try_finalize(&self, request: &FinalizationRequest) -> Result<()> {
        if same_file(&request.temporary_file, &request.destination) {
            anyhow::bail!("Destination is the capture file itself");
        }

        // Existing files at the destination are overwritten
        delete_file(&request.destination)?;

        self.encoder
            .remux(&RemuxRequest {
                time_scale: request.time_scale(),
                input: &request.temporary_file,
                output: &request.destination,
            })
            .await?;

        delete_file(&request.temporary_file)
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    if let (Ok(a), Ok(b)) = (a.canonicalize(), b.canonicalize()) {
        return a == b;
    }

    matches!(
        (std::path::absolute(a), std::path::absolute(b)),
        (Ok(a), Ok(b)) if a == b
    )
}

fn delete_file(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("Failed to delete {:?}", path)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::{CaptureProcess, CaptureRequest, ProbeOutcome};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Copies input to output, or fails when told to
    struct CopyingEncoder {
        fail: bool,
        scales: Mutex<Vec<f64>>,
    }

    impl CopyingEncoder {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                fail,
                scales: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Encoder for CopyingEncoder {
        async fn probe(&self) -> ProbeOutcome {
            ProbeOutcome::Installed
        }

        async fn launch_capture(
            &self,
            _request: &CaptureRequest<'_>,
        ) -> Result<Box<dyn CaptureProcess>> {
            anyhow::bail!("not used")
        }

        async fn remux(&self, request: &RemuxRequest<'_>) -> Result<()> {
            self.scales.lock().unwrap().push(request.time_scale);
            if self.fail {
                anyhow::bail!("exit status: 1");
            }
            std::fs::copy(request.input, request.output)?;
            Ok(())
        }
    }

    fn request_in(dir: &Path, final_fps: u32) -> FinalizationRequest {
        let temporary_file = dir.join("timelapse-temp-1.mp4");
        std::fs::write(&temporary_file, b"frames").unwrap();
        FinalizationRequest {
            temporary_file,
            destination: dir.join("out.mp4"),
            final_fps,
        }
    }

    #[test]
    fn test_time_scale() {
        let mut request = FinalizationRequest {
            temporary_file: PathBuf::from("/tmp/a.mp4"),
            destination: PathBuf::from("/tmp/b.mp4"),
            final_fps: 60,
        };
        assert_eq!(request.time_scale(), 1.0 / 60.0);

        request.final_fps = 1;
        assert_eq!(request.time_scale(), 1.0);
    }

    #[tokio::test]
    async fn test_success_moves_capture_to_destination() {
        let dir = tempfile::tempdir().unwrap();
        let request = request_in(dir.path(), 60);
        let encoder = CopyingEncoder::new(false);
        let finalizer = Finalizer::new(encoder.clone());

        assert!(finalizer.finalize(&request).await);

        assert!(request.destination.exists());
        assert!(!request.temporary_file.exists());
        assert_eq!(*encoder.scales.lock().unwrap(), vec![1.0 / 60.0]);
    }

    #[tokio::test]
    async fn test_failure_keeps_capture() {
        let dir = tempfile::tempdir().unwrap();
        let request = request_in(dir.path(), 60);
        let finalizer = Finalizer::new(CopyingEncoder::new(true));

        assert!(!finalizer.finalize(&request).await);

        assert!(request.temporary_file.exists());
        assert_eq!(std::fs::read(&request.temporary_file).unwrap(), b"frames");
    }

    #[tokio::test]
    async fn test_existing_destination_is_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let request = request_in(dir.path(), 30);
        std::fs::write(&request.destination, b"old video").unwrap();
        let finalizer = Finalizer::new(CopyingEncoder::new(false));

        assert!(finalizer.finalize(&request).await);

        assert_eq!(std::fs::read(&request.destination).unwrap(), b"frames");
    }

    #[tokio::test]
    async fn test_never_loses_both_files() {
        for fail in [false, true] {
            let dir = tempfile::tempdir().unwrap();
            let request = request_in(dir.path(), 60);
            let finalizer = Finalizer::new(CopyingEncoder::new(fail));

            let saved = finalizer.finalize(&request).await;

            if saved {
                assert!(request.destination.exists() && !request.temporary_file.exists());
            } else {
                assert!(request.temporary_file.exists());
            }
        }
    }

    #[tokio::test]
    async fn test_destination_equal_to_capture_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let mut request = request_in(dir.path(), 60);
        request.destination = dir.path().join(".").join("timelapse-temp-1.mp4");
        let encoder = CopyingEncoder::new(false);
        let finalizer = Finalizer::new(encoder.clone());

        assert!(!finalizer.finalize(&request).await);

        assert_eq!(std::fs::read(&request.temporary_file).unwrap(), b"frames");
        assert!(encoder.scales.lock().unwrap().is_empty());
    }
}
