// tests/pipeline_tests.rs

mod test_utils;

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use image::RgbImage;

use handpilot_common::models::{Command, Frame, Gesture, VehicleState};
use handpilot_common::traits::FrameSource;
use handpilot_core::dispatcher::{Dispatcher, DispatcherConfig};
use handpilot_core::eventbus::{EventBus, PilotEvent};
use handpilot_core::platforms::SimulatedVehicle;
use handpilot_core::stabilizer::StabilizerConfig;
use handpilot_core::tasks::{spawn_frame_worker, FrameWorkerStats};
use handpilot_core::telemetry::TelemetryTracker;
use handpilot_core::vision::Classifier;
use handpilot_core::Error;

use test_utils::{drain, hand_mask, skin_frame, wait_until, RecordingVehicle};

/// Hands out a fixed script of frame results, then end of stream.
struct ScriptedSource {
    script: VecDeque<Result<Option<Frame>, Error>>,
}

impl ScriptedSource {
    fn new(script: Vec<Result<Option<Frame>, Error>>) -> Self {
        Self { script: script.into() }
    }
}

impl FrameSource for ScriptedSource {
    fn read_frame(&mut self) -> Result<Option<Frame>, Error> {
        self.script.pop_front().unwrap_or(Ok(None))
    }
}

fn black(seq: u64) -> Result<Option<Frame>, Error> {
    Ok(Some(Frame::new(seq, RgbImage::new(240, 240))))
}

fn hand(seq: u64, valleys: usize) -> Result<Option<Frame>, Error> {
    Ok(Some(Frame::new(seq, skin_frame(&hand_mask(valleys)))))
}

#[tokio::test]
async fn test_held_palm_takes_off_once() -> Result<(), Error> {
    let bus = Arc::new(EventBus::new());
    let vehicle = RecordingVehicle::new();
    let handle = Dispatcher::new(vehicle.clone(), bus.clone(), DispatcherConfig::default()).spawn();

    let script = vec![
        black(1),
        hand(2, 4),
        hand(3, 4),
        Err(Error::Image("dropped frame".into())),
        hand(5, 4),
        hand(6, 4),
        black(7),
    ];
    let worker = spawn_frame_worker(
        ScriptedSource::new(script),
        Classifier::default(),
        StabilizerConfig::default(),
        handle.clone(),
        bus.clone(),
        Duration::ZERO,
    );
    let stats = worker.await.unwrap();
    assert_eq!(
        stats,
        FrameWorkerStats { frames: 6, frame_errors: 1, events: 1 }
    );

    assert_eq!(handle.state().await?, VehicleState::TakingOff);
    assert_eq!(vehicle.commands(), vec![Command::Takeoff { altitude: 20.0 }]);
    handle.shutdown().await
}

#[tokio::test]
async fn test_parity_mode_forwards_every_frame() -> Result<(), Error> {
    let bus = Arc::new(EventBus::new());
    let vehicle = RecordingVehicle::new();
    let handle = Dispatcher::new(vehicle.clone(), bus.clone(), DispatcherConfig::default()).spawn();
    let mut rx = bus.subscribe("test", 64);

    let worker = spawn_frame_worker(
        ScriptedSource::new(vec![hand(1, 4), hand(2, 4), hand(3, 4)]),
        Classifier::default(),
        StabilizerConfig { silence_frames: 0, hold_ms: 0 },
        handle.clone(),
        bus.clone(),
        Duration::ZERO,
    );
    assert_eq!(worker.await.unwrap().events, 3);
    handle.state().await?;

    // three palms reach the dispatcher but only the first passes the gate
    let events = drain(&mut rx);
    let detected = events
        .iter()
        .filter(|e| matches!(e, PilotEvent::GestureDetected(g) if g.gesture == Gesture::Palm))
        .count();
    let rejected = events
        .iter()
        .filter(|e| matches!(e, PilotEvent::CommandRejected { .. }))
        .count();
    assert_eq!((detected, rejected), (3, 2));
    assert_eq!(vehicle.commands().len(), 1);
    handle.shutdown().await
}

#[tokio::test]
async fn test_worker_stops_on_shutdown() {
    struct Endless;
    impl FrameSource for Endless {
        fn read_frame(&mut self) -> Result<Option<Frame>, Error> {
            Ok(Some(Frame::new(0, RgbImage::new(8, 8))))
        }
    }

    let bus = Arc::new(EventBus::new());
    let handle = Dispatcher::new(RecordingVehicle::new(), bus.clone(), DispatcherConfig::default()).spawn();
    let worker = spawn_frame_worker(
        Endless,
        Classifier::default(),
        StabilizerConfig::default(),
        handle,
        bus.clone(),
        Duration::from_millis(1),
    );

    tokio::time::sleep(Duration::from_millis(20)).await;
    bus.shutdown();
    let stats = tokio::time::timeout(Duration::from_secs(2), worker)
        .await
        .expect("worker should stop")
        .unwrap();
    assert!(stats.frames > 0);
    assert_eq!(stats.events, 0);
}

#[tokio::test]
async fn test_full_loop_with_simulated_vehicle() -> Result<(), Error> {
    let bus = Arc::new(EventBus::new());
    let sim = SimulatedVehicle::new(1, Duration::from_millis(10));
    let tracker = TelemetryTracker::new(bus.clone());
    let handle = Dispatcher::new(Arc::new(sim.clone()), bus.clone(), DispatcherConfig::default())
        .with_telemetry(tracker.clone())
        .spawn();
    handle.connect("simulacion").await?;

    let worker = spawn_frame_worker(
        ScriptedSource::new(vec![hand(1, 4), hand(2, 4)]),
        Classifier::default(),
        StabilizerConfig::default(),
        handle.clone(),
        bus.clone(),
        Duration::ZERO,
    );
    worker.await.unwrap();

    assert!(wait_until(|| sim.altitude() == 20.0).await);
    assert!(wait_until(|| tracker.altitude() == Some(20.0)).await);
    assert_eq!(handle.state().await?, VehicleState::Airborne);

    // closed hand lands
    let worker = spawn_frame_worker(
        ScriptedSource::new(vec![hand(3, 0), hand(4, 0)]),
        Classifier::default(),
        StabilizerConfig::default(),
        handle.clone(),
        bus.clone(),
        Duration::ZERO,
    );
    worker.await.unwrap();
    assert!(wait_until(|| tracker.altitude() == Some(0.0)).await);
    assert_eq!(handle.state().await?, VehicleState::Grounded);
    handle.shutdown().await
}
