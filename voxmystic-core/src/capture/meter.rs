use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::LevelFrame;

/// Periodically renders the latest input level while a recording runs.
///
/// The render task ends when the level sender goes away, and is aborted
/// when the meter is dropped.
pub struct LevelMeter {
    handle: JoinHandle<()>,
}

impl LevelMeter {
    pub fn spawn<F>(
        mut levels: watch::Receiver<LevelFrame>,
        frame_interval: Duration,
        mut render: F,
    ) -> Self
    where
        F: FnMut(LevelFrame) + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(frame_interval);
            loop {
                ticker.tick().await;
                if levels.has_changed().is_err() {
                    break;
                }
                let frame = *levels.borrow_and_update();
                render(frame);
            }
        });
        Self { handle }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for LevelMeter {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Render a level as a fixed width bar of `width` cells
pub fn level_bar(frame: LevelFrame, width: usize) -> String {
    let filled = ((frame.rms.clamp(0.0, 1.0) * 2.0).min(1.0) * width as f32).round() as usize;
    let filled = filled.min(width);
    format!("{}{}", "#".repeat(filled), "-".repeat(width - filled))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn stops_rendering_once_dropped() {
        let (tx, rx) = watch::channel(LevelFrame::default());
        let renders = Arc::new(AtomicUsize::new(0));
        let counter = renders.clone();

        let meter = LevelMeter::spawn(rx, Duration::from_millis(2), move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        tx.send_replace(LevelFrame {
            rms: 0.2,
            peak: 0.4,
        });
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(renders.load(Ordering::SeqCst) > 0);

        drop(meter);
        tokio::time::sleep(Duration::from_millis(5)).await;
        let settled = renders.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(renders.load(Ordering::SeqCst), settled);
    }

    #[tokio::test]
    async fn ends_when_sender_closes() {
        let (tx, rx) = watch::channel(LevelFrame::default());
        let meter = LevelMeter::spawn(rx, Duration::from_millis(1), |_| {});
        drop(tx);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(meter.is_finished());
    }

    #[test]
    fn bar_scales_with_rms() {
        assert_eq!(level_bar(LevelFrame::default(), 4), "----");
        let loud = LevelFrame {
            rms: 0.9,
            peak: 1.0,
        };
        assert_eq!(level_bar(loud, 4), "####");
        let half = LevelFrame {
            rms: 0.25,
            peak: 0.5,
        };
        assert_eq!(level_bar(half, 4), "##--");
    }
}
