use crate::messages::{NoticeAction, NoticeLevel};
use anyhow::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Read-only recording options
pub trait Settings: Send + Sync {
    fn save_directory(&self) -> PathBuf;
    fn source_fps(&self) -> u32;
    fn final_fps(&self) -> u32;
}

/// Shows messages to the user
///
/// Returns the action the user picked, or `None` when the notice was dismissed.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(
        &self,
        level: NoticeLevel,
        message: &str,
        actions: &[NoticeAction],
    ) -> Option<NoticeAction>;
}

/// Asks the user where to save a timelapse
#[async_trait]
pub trait FilePicker: Send + Sync {
    /// `None` when the user cancelled
    async fn pick_save_path(&self) -> Option<PathBuf>;
}

/// Hands files and links to the rest of the desktop
#[async_trait]
pub trait Desktop: Send + Sync {
    async fn open(&self, target: &str) -> Result<()>;
    async fn copy_to_clipboard(&self, text: &str) -> Result<()>;
}

/// Open a saved video with the default player
pub async fn open_video(desktop: &dyn Desktop, path: &Path) -> Result<()> {
    desktop.open(&path.to_string_lossy()).await
}
