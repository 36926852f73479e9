// File: handpilot-core/src/platforms/simulated.rs
//
// In-process stand-in for a real vehicle link: every command completes
// after a fixed delay on a background task, and altitude/heading changes are
// pushed on the telemetry feed.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tracing::{debug, info};

use handpilot_common::models::{Completion, Direction, TelemetrySample, ALTITUDE_SAMPLE};
use handpilot_common::traits::{CompletionCallback, TelemetryCallback, VehicleControl};
use handpilot_common::Error;

#[derive(Default)]
struct SimState {
    target: Option<String>,
    altitude: f32,
    heading: f32,
    telemetry: Option<Arc<TelemetryCallback>>,
    /// Command names whose next invocation fails.
    fail_next: HashSet<&'static str>,
}

#[derive(Clone)]
pub struct SimulatedVehicle {
    vehicle_id: u8,
    delay: Duration,
    state: Arc<Mutex<SimState>>,
}

impl SimulatedVehicle {
    pub fn new(vehicle_id: u8, delay: Duration) -> Self {
        Self {
            vehicle_id,
            delay,
            state: Arc::new(Mutex::new(SimState::default())),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.state.lock().target.is_some()
    }

    pub fn altitude(&self) -> f32 {
        self.state.lock().altitude
    }

    pub fn heading(&self) -> f32 {
        self.state.lock().heading
    }

    /// Makes the next `command` ("takeoff", "land", "set_heading", "move") fail.
    pub fn fail_next(&self, command: &'static str) {
        self.state.lock().fail_next.insert(command);
    }

    /// Runs `apply` after the configured delay, then reports the outcome.
    /// `apply` returns the status string on success.
    fn complete_later<F>(&self, command: &'static str, on_complete: CompletionCallback, apply: F)
    where
        F: FnOnce(&mut SimState) -> String + Send + 'static,
    {
        let vehicle_id = self.vehicle_id;
        let delay = self.delay;
        let state = self.state.clone();

        let job = move || {
            let (completion, telemetry, samples) = {
                let mut st = state.lock();
                let completion = if st.target.is_none() {
                    Completion::failed(vehicle_id, "not connected")
                } else if st.fail_next.remove(command) {
                    Completion::failed(vehicle_id, format!("{} rejected by vehicle", command))
                } else {
                    Completion::succeeded(vehicle_id, apply(&mut *st))
                };
                let samples = vec![
                    TelemetrySample::new(ALTITUDE_SAMPLE, st.altitude),
                    TelemetrySample::new("Heading", st.heading),
                ];
                (completion, st.telemetry.clone(), samples)
            };
            debug!("sim vehicle {}: {} -> {:?}", vehicle_id, command, completion.status);
            if completion.success {
                if let Some(cb) = telemetry {
                    cb(vehicle_id, samples);
                }
            }
            on_complete(completion);
        };

        match Handle::try_current() {
            Ok(rt) => {
                rt.spawn(async move {
                    tokio::time::sleep(delay).await;
                    job();
                });
            }
            Err(_) => {
                std::thread::spawn(move || {
                    std::thread::sleep(delay);
                    job();
                });
            }
        }
    }
}

#[async_trait]
impl VehicleControl for SimulatedVehicle {
    async fn connect(&self, target: &str) -> Result<(), Error> {
        if target.trim().is_empty() {
            return Err(Error::Vehicle("empty connection target".into()));
        }
        tokio::time::sleep(self.delay).await;
        self.state.lock().target = Some(target.to_string());
        info!("Simulated vehicle {} connected to '{}'", self.vehicle_id, target);
        Ok(())
    }

    fn takeoff(&self, altitude: f32, on_complete: CompletionCallback) {
        self.complete_later("takeoff", on_complete, move |st| {
            st.altitude = altitude;
            "airborne".to_string()
        });
    }

    fn land(&self, on_complete: CompletionCallback) {
        self.complete_later("land", on_complete, |st| {
            st.altitude = 0.0;
            "landed".to_string()
        });
    }

    fn set_heading(&self, degrees: f32, on_complete: CompletionCallback) {
        self.complete_later("set_heading", on_complete, move |st| {
            st.heading = degrees.rem_euclid(360.0);
            format!("heading {}", st.heading)
        });
    }

    fn move_to(&self, direction: Direction, distance: f32, on_complete: CompletionCallback) {
        self.complete_later("move", on_complete, move |st| {
            match direction {
                Direction::Up => st.altitude += distance,
                Direction::Down => st.altitude = (st.altitude - distance).max(0.0),
                _ => {}
            }
            format!("moved {} {}", direction, distance)
        });
    }

    fn send_telemetry(&self, on_telemetry: TelemetryCallback) {
        self.state.lock().telemetry = Some(Arc::new(on_telemetry));
    }
}
