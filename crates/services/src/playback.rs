//! Timer-driven progress for the embedded video player.

use std::time::Duration;

use portal_core::model::Percent;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::debug;

use crate::progress_store::MaterialProgress;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackConfig {
    pub tick: Duration,
    /// Percentage points added per tick.
    pub step: f64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_secs(1),
            step: 1.0,
        }
    }
}

/// An open player. Progress grows by `step` every `tick` until the material
/// is complete or the player is closed.
///
/// Must be started inside a Tokio runtime. Dropping the player stops the
/// timer without marking anything complete.
pub struct VideoPlayback {
    progress: MaterialProgress,
    ticker: JoinHandle<()>,
}

impl VideoPlayback {
    #[must_use]
    pub fn start(progress: MaterialProgress, config: PlaybackConfig) -> Self {
        let mut handle = progress.clone();
        let ticker = tokio::spawn(async move {
            let mut interval = time::interval(config.tick);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval.tick().await;
            loop {
                interval.tick().await;
                let now = handle.update(|p| p.value() + config.step);
                if now.is_complete() {
                    debug!(material = %handle.id(), "playback reached the end");
                    break;
                }
            }
        });
        Self { progress, ticker }
    }

    /// Current progress of the material being played.
    #[must_use]
    pub fn progress(&self) -> Percent {
        self.progress.progress()
    }

    /// True while the timer is still advancing progress.
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.ticker.is_finished()
    }

    /// Closes the player: stops the timer and marks the material complete.
    pub fn close(mut self) -> Percent {
        self.ticker.abort();
        self.progress.mark_complete();
        self.progress.progress()
    }
}

impl Drop for VideoPlayback {
    fn drop(&mut self) {
        self.ticker.abort();
    }
}
