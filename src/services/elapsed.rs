use crate::messages::{RecordingState, StatusItem};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// `HH:MM:SS`, hours are not wrapped
pub fn format_elapsed(elapsed_ms: u64) -> String {
    let total_seconds = elapsed_ms / 1000;
    let seconds = total_seconds % 60;
    let minutes = (total_seconds / 60) % 60;
    let hours = total_seconds / 3600;

    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

/// Refreshes the status tooltip once a second while recording
///
/// Dropping the ticker aborts the task.
pub struct ElapsedTicker {
    task: JoinHandle<()>,
}

impl ElapsedTicker {
    pub fn start(started_at: Instant, status: Arc<watch::Sender<StatusItem>>) -> Self {
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;
                let elapsed = started_at.elapsed().as_millis() as u64;
                // A tick racing a state change must not overwrite the new tooltip
                status.send_if_modified(|item| {
                    if item.state != RecordingState::Recording {
                        return false;
                    }
                    item.tooltip = format_elapsed(elapsed);
                    true
                });
            }
        });

        Self { task }
    }
}

impl Drop for ElapsedTicker {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(0), "00:00:00");
        assert_eq!(format_elapsed(999), "00:00:00");
        assert_eq!(format_elapsed(61_000), "00:01:01");
        assert_eq!(format_elapsed(3_661_000), "01:01:01");
        assert_eq!(format_elapsed(36_000_000), "10:00:00");
    }

    #[test]
    fn test_hours_do_not_wrap() {
        assert_eq!(format_elapsed(108_000_000), "30:00:00");
        assert_eq!(format_elapsed(360_000_000), "100:00:00");
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticker_updates_tooltip_until_dropped() {
        let status = Arc::new(watch::channel(StatusItem::for_state(RecordingState::Recording)).0);
        let mut rx = status.subscribe();

        let ticker = ElapsedTicker::start(Instant::now(), status.clone());
        tokio::time::sleep(Duration::from_millis(2_500)).await;
        assert_eq!(rx.borrow_and_update().tooltip, "00:00:02");

        drop(ticker);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(status.borrow().tooltip, "00:00:02");
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticker_leaves_other_states_alone() {
        let status = Arc::new(watch::channel(StatusItem::for_state(RecordingState::Stopping)).0);
        let mut rx = status.subscribe();

        let _ticker = ElapsedTicker::start(Instant::now(), status.clone());
        tokio::time::sleep(Duration::from_millis(2_500)).await;

        assert!(!rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), StatusItem::for_state(RecordingState::Stopping));
    }
}
