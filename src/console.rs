use crate::collaborators::{FilePicker, Notifier};
use crate::messages::{NoticeAction, NoticeLevel};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{Mutex, mpsc, watch};

/// Lines typed on stdin, shared by the command loop and the prompts
#[derive(Clone)]
pub struct ConsoleInput {
    lines: Arc<Mutex<mpsc::Receiver<String>>>,
    closed: Arc<watch::Sender<bool>>,
}

impl ConsoleInput {
    pub fn new(lines: mpsc::Receiver<String>) -> Self {
        Self {
            lines: Arc::new(Mutex::new(lines)),
            closed: Arc::new(watch::channel(false).0),
        }
    }

    /// Start forwarding stdin lines
    pub fn from_stdin() -> Self {
        let (tx, rx) = mpsc::channel(10);

        tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if tx.send(line).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        tracing::error!("Failed to read stdin: {}", e);
                        break;
                    }
                }
            }
            tracing::debug!("stdin closed");
        });

        Self::new(rx)
    }

    /// `None` once stdin or this input is closed
    pub async fn next_line(&self) -> Option<String> {
        let mut closed = self.closed.subscribe();
        if *closed.borrow_and_update() {
            return None;
        }

        tokio::select! {
            line = async { self.lines.lock().await.recv().await } => line,
            _ = closed.wait_for(|closed| *closed) => None,
        }
    }

    /// Answer every pending and future read with `None`
    pub fn close(&self) {
        self.closed.send_replace(true);
    }
}

pub struct ConsoleNotifier {
    input: ConsoleInput,
}

impl ConsoleNotifier {
    pub fn new(input: ConsoleInput) -> Self {
        Self { input }
    }
}

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn notify(
        &self,
        level: NoticeLevel,
        message: &str,
        actions: &[NoticeAction],
    ) -> Option<NoticeAction> {
        let tag = match level {
            NoticeLevel::Info => "info",
            NoticeLevel::Warning => "warning",
            NoticeLevel::Error => "error",
        };
        println!("[{}] {}", tag, message);

        if actions.is_empty() {
            return None;
        }

        for (i, action) in actions.iter().enumerate() {
            println!("  {}) {}", i + 1, action.label());
        }
        println!("  enter) dismiss");

        let line = self.input.next_line().await?;
        choose_action(&line, actions)
    }
}

pub struct ConsolePicker {
    input: ConsoleInput,
}

impl ConsolePicker {
    pub fn new(input: ConsoleInput) -> Self {
        Self { input }
    }
}

#[async_trait]
impl FilePicker for ConsolePicker {
    async fn pick_save_path(&self) -> Option<PathBuf> {
        println!("Timelapse output file (enter for default):");
        let line = self.input.next_line().await?;
        let path = line.trim();

        (!path.is_empty()).then(|| PathBuf::from(path))
    }
}

/// 1-based menu choice; anything else dismisses
fn choose_action(line: &str, actions: &[NoticeAction]) -> Option<NoticeAction> {
    let choice: usize = line.trim().parse().ok()?;
    actions.get(choice.checked_sub(1)?).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACTIONS: [NoticeAction; 3] = [
        NoticeAction::Open,
        NoticeAction::OpenAndCopy,
        NoticeAction::CopyToClipboard,
    ];

    #[test]
    fn test_choose_action() {
        assert_eq!(choose_action("1", &ACTIONS), Some(NoticeAction::Open));
        assert_eq!(choose_action(" 3\n", &ACTIONS), Some(NoticeAction::CopyToClipboard));
        assert_eq!(choose_action("", &ACTIONS), None);
        assert_eq!(choose_action("0", &ACTIONS), None);
        assert_eq!(choose_action("4", &ACTIONS), None);
        assert_eq!(choose_action("open", &ACTIONS), None);
    }

    #[tokio::test]
    async fn test_notifier_reads_choice() {
        let (tx, rx) = mpsc::channel(4);
        let notifier = ConsoleNotifier::new(ConsoleInput::new(rx));
        tx.send("2".to_string()).await.unwrap();

        let action = notifier
            .notify(NoticeLevel::Info, "Saved timelapse: /tmp/x.mp4", &ACTIONS)
            .await;

        assert_eq!(action, Some(NoticeAction::OpenAndCopy));
    }

    #[tokio::test]
    async fn test_notifier_without_actions_does_not_read() {
        let (tx, rx) = mpsc::channel(4);
        let input = ConsoleInput::new(rx);
        let notifier = ConsoleNotifier::new(input.clone());
        tx.send("status".to_string()).await.unwrap();

        assert_eq!(notifier.notify(NoticeLevel::Error, "boom", &[]).await, None);
        assert_eq!(input.next_line().await.as_deref(), Some("status"));
    }

    #[tokio::test]
    async fn test_close_releases_waiting_prompt() {
        let (_tx, rx) = mpsc::channel(4);
        let input = ConsoleInput::new(rx);
        let picker = ConsolePicker::new(input.clone());

        let pending = tokio::spawn(async move { picker.pick_save_path().await });
        tokio::task::yield_now().await;
        input.close();

        assert_eq!(pending.await.unwrap(), None);
        assert_eq!(input.next_line().await, None);
    }

    #[tokio::test]
    async fn test_picker_empty_line_cancels() {
        let (tx, rx) = mpsc::channel(4);
        let picker = ConsolePicker::new(ConsoleInput::new(rx));

        tx.send("".to_string()).await.unwrap();
        assert_eq!(picker.pick_save_path().await, None);

        tx.send("/srv/out.mp4".to_string()).await.unwrap();
        assert_eq!(picker.pick_save_path().await, Some(PathBuf::from("/srv/out.mp4")));
    }
}
