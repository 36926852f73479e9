// File: handpilot-core/src/telemetry.rs
//
// Consumer side of the vehicle's telemetry push feed. The loop only cares
// about altitude; every other sample is ignored.

use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::trace;

use handpilot_common::models::{find_altitude, TelemetrySample, ALTITUDE_SAMPLE};
use handpilot_common::traits::TelemetryCallback;

use crate::eventbus::{EventBus, PilotEvent};

#[derive(Clone)]
pub struct TelemetryTracker {
    altitude: Arc<watch::Sender<Option<f32>>>,
    bus: Arc<EventBus>,
    runtime: Option<Handle>,
}

impl TelemetryTracker {
    /// Must be created inside a tokio runtime for altitude updates to reach
    /// the event bus; outside one, updates are only kept locally.
    pub fn new(bus: Arc<EventBus>) -> Self {
        let (tx, _rx) = watch::channel(None);
        Self {
            altitude: Arc::new(tx),
            bus,
            runtime: Handle::try_current().ok(),
        }
    }

    /// Latest reported altitude, if any sample has arrived yet.
    pub fn altitude(&self) -> Option<f32> {
        *self.altitude.borrow()
    }

    pub fn watch_altitude(&self) -> watch::Receiver<Option<f32>> {
        self.altitude.subscribe()
    }

    /// Handles one telemetry batch as pushed by the vehicle.
    pub fn on_telemetry(&self, vehicle_id: u8, samples: &[TelemetrySample]) {
        let Some(alt) = find_altitude(samples) else {
            trace!("telemetry batch from {} without {}", vehicle_id, ALTITUDE_SAMPLE);
            return;
        };
        self.altitude.send_replace(Some(alt));

        if let Some(rt) = &self.runtime {
            let bus = self.bus.clone();
            rt.spawn(async move {
                bus.publish(PilotEvent::Telemetry {
                    vehicle_id,
                    name: ALTITUDE_SAMPLE.to_string(),
                    value: alt,
                })
                .await;
            });
        }
    }

    /// Boxed callback suitable for `VehicleControl::send_telemetry`.
    pub fn callback(&self) -> TelemetryCallback {
        let tracker = self.clone();
        Box::new(move |id: u8, samples: Vec<TelemetrySample>| {
            tracker.on_telemetry(id, &samples)
        })
    }
}
