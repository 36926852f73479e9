// File: handpilot-core/src/tasks/frame_worker.rs
//
// The camera side of the loop: read -> classify -> stabilize -> dispatch,
// one frame at a time on a blocking thread.

use std::sync::Arc;
use std::time::{Duration, Instant};
use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use handpilot_common::models::{EventSource, Gesture};
use handpilot_common::traits::FrameSource;

use crate::dispatcher::DispatcherHandle;
use crate::eventbus::EventBus;
use crate::stabilizer::{GestureStabilizer, StabilizerConfig};
use crate::vision::Classifier;

/// Summary of a finished frame worker run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameWorkerStats {
    pub frames: u64,
    pub frame_errors: u64,
    pub events: u64,
}

/// Frame timestamps: wall-clock at start plus monotonic elapsed time, so a
/// system clock step cannot stall or skip the stabilizer's hold timer.
#[derive(Debug, Clone, Copy)]
pub struct FrameClock {
    started_at: DateTime<Utc>,
    started: Instant,
}

impl FrameClock {
    pub fn start() -> Self {
        Self {
            started_at: Utc::now(),
            started: Instant::now(),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        let elapsed = chrono::Duration::from_std(self.started.elapsed())
            .unwrap_or_else(|_| chrono::Duration::zero());
        self.started_at + elapsed
    }
}

/// Spawns the frame loop on tokio's blocking pool. It runs until the source
/// reports end of stream or the bus' shutdown flag is set.
///
/// `frame_interval` paces the loop for sources that would otherwise spin
/// (file replay); pass `Duration::ZERO` for a live camera.
pub fn spawn_frame_worker<S>(
    mut source: S,
    classifier: Classifier,
    stabilizer_config: StabilizerConfig,
    dispatcher: DispatcherHandle,
    bus: Arc<EventBus>,
    frame_interval: Duration,
) -> JoinHandle<FrameWorkerStats>
where
    S: FrameSource + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut stabilizer = GestureStabilizer::new(stabilizer_config, EventSource::Camera);
        let mut stats = FrameWorkerStats::default();
        let clock = FrameClock::start();
        info!("Frame worker started");

        while !bus.is_shutdown() {
            let gesture = match source.read_frame() {
                Ok(Some(frame)) => {
                    stats.frames += 1;
                    classifier.classify(frame)
                }
                Ok(None) => {
                    info!("Frame source exhausted after {} frame(s)", stats.frames);
                    break;
                }
                Err(e) => {
                    stats.frame_errors += 1;
                    warn!("Skipping frame: {}", e);
                    Gesture::None
                }
            };

            if let Some(event) = stabilizer.observe(gesture, clock.now()) {
                debug!("camera gesture {}", event.gesture);
                stats.events += 1;
                dispatcher.dispatch(event);
            }

            if !frame_interval.is_zero() {
                std::thread::sleep(frame_interval);
            }
        }

        info!(
            "Frame worker stopped: {} frame(s), {} error(s), {} event(s)",
            stats.frames, stats.frame_errors, stats.events
        );
        stats
    })
}
