// File: handpilot-core/tests/test_utils/mod.rs
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use parking_lot::Mutex;
use image::{GrayImage, Luma, Rgb, RgbImage};
use tokio::sync::mpsc;

use handpilot_common::models::{
    Command, Completion, Direction, EventSource, Gesture, GestureEvent, TelemetrySample,
};
use handpilot_common::traits::{CompletionCallback, TelemetryCallback, VehicleControl};
use handpilot_core::eventbus::PilotEvent;
use handpilot_core::Error;

#[derive(Default)]
struct Recorded {
    target: Option<String>,
    commands: Vec<Command>,
    pending: VecDeque<(Command, CompletionCallback)>,
    telemetry: Option<TelemetryCallback>,
}

/// A vehicle that records every command and holds its completion callback
/// until the test decides how (and whether) it finishes.
#[derive(Default)]
pub struct RecordingVehicle {
    inner: Mutex<Recorded>,
}

impl RecordingVehicle {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn commands(&self) -> Vec<Command> {
        self.inner.lock().commands.clone()
    }

    pub fn target(&self) -> Option<String> {
        self.inner.lock().target.clone()
    }

    pub fn pending(&self) -> usize {
        self.inner.lock().pending.len()
    }

    /// Fires the oldest outstanding completion callback.
    pub fn complete_next(&self, success: bool) -> Option<Command> {
        let (command, cb) = self.inner.lock().pending.pop_front()?;
        let completion = if success {
            Completion::succeeded(1, "ok")
        } else {
            Completion::failed(1, "refused")
        };
        cb(completion);
        Some(command)
    }

    pub fn push_telemetry(&self, samples: Vec<TelemetrySample>) -> bool {
        let guard = self.inner.lock();
        match &guard.telemetry {
            Some(cb) => {
                cb(1, samples);
                true
            }
            None => false,
        }
    }

    fn record(&self, command: Command, on_complete: CompletionCallback) {
        let mut guard = self.inner.lock();
        guard.commands.push(command.clone());
        guard.pending.push_back((command, on_complete));
    }
}

#[async_trait]
impl VehicleControl for RecordingVehicle {
    async fn connect(&self, target: &str) -> Result<(), Error> {
        self.inner.lock().target = Some(target.to_string());
        Ok(())
    }

    fn takeoff(&self, altitude: f32, on_complete: CompletionCallback) {
        self.record(Command::Takeoff { altitude }, on_complete);
    }

    fn land(&self, on_complete: CompletionCallback) {
        self.record(Command::Land, on_complete);
    }

    fn set_heading(&self, degrees: f32, on_complete: CompletionCallback) {
        self.record(Command::SetHeading { degrees }, on_complete);
    }

    fn move_to(&self, direction: Direction, distance: f32, on_complete: CompletionCallback) {
        self.record(Command::Move { direction, distance }, on_complete);
    }

    fn send_telemetry(&self, on_telemetry: TelemetryCallback) {
        self.inner.lock().telemetry = Some(on_telemetry);
    }
}

pub fn camera(gesture: Gesture) -> GestureEvent {
    GestureEvent::new(gesture, EventSource::Camera)
}

pub fn drain(rx: &mut mpsc::Receiver<PilotEvent>) -> Vec<PilotEvent> {
    let mut out = Vec::new();
    while let Ok(evt) = rx.try_recv() {
        out.push(evt);
    }
    out
}

/// Polls `cond` every few milliseconds for up to two seconds.
pub async fn wait_until<F: Fn() -> bool>(cond: F) -> bool {
    for _ in 0..400 {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    cond()
}

/// Synthetic hand mask: `valleys + 1` upright fingers on a palm, with
/// narrow gaps between fingers. The middle fingers are the tallest so every
/// fingertip sits on the convex hull and each gap is one sharp valley.
pub fn hand_mask(valleys: usize) -> GrayImage {
    const FINGER_W: u32 = 24;
    const GAP_W: u32 = 10;
    const LEFT: u32 = 40;
    const PALM_TOP: u32 = 140;
    const PALM_BOTTOM: u32 = 210;

    let fingers = valleys as u32 + 1;
    let palm_right = LEFT + fingers * FINGER_W + valleys as u32 * GAP_W;
    let mid = (fingers as f64 - 1.0) / 2.0;

    let mut mask = GrayImage::new(240, 240);
    for y in PALM_TOP..PALM_BOTTOM {
        for x in LEFT..palm_right {
            mask.put_pixel(x, y, Luma([255]));
        }
    }
    for i in 0..fingers {
        let offset = i as f64 - mid;
        let length = 90 - (12.0 * offset * offset).round() as u32;
        let x0 = LEFT + i * (FINGER_W + GAP_W);
        for y in (PALM_TOP - length)..PALM_TOP {
            for x in x0..x0 + FINGER_W {
                mask.put_pixel(x, y, Luma([255]));
            }
        }
    }
    mask
}

/// Paints `mask` in a skin tone on a black background.
pub fn skin_frame(mask: &GrayImage) -> RgbImage {
    RgbImage::from_fn(mask.width(), mask.height(), |x, y| {
        if mask.get_pixel(x, y).0[0] > 0 {
            Rgb([200, 150, 120])
        } else {
            Rgb([0, 0, 0])
        }
    })
}
