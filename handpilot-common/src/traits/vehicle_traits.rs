use async_trait::async_trait;
use crate::error::Error;
use crate::models::telemetry::TelemetrySample;
use crate::models::vehicle::{Completion, Direction};

/// Invoked once when a non-blocking vehicle command finishes.
pub type CompletionCallback = Box<dyn FnOnce(Completion) + Send + 'static>;

/// Invoked for every telemetry batch the vehicle pushes: `(vehicle_id, samples)`.
pub type TelemetryCallback = Box<dyn Fn(u8, Vec<TelemetrySample>) + Send + Sync + 'static>;

/// The vehicle link as seen by the dispatcher.
///
/// Every command method must return immediately; the outcome arrives later
/// through `on_complete`, on whatever thread the implementation likes.
#[async_trait]
pub trait VehicleControl: Send + Sync {
    async fn connect(&self, target: &str) -> Result<(), Error>;

    fn takeoff(&self, altitude: f32, on_complete: CompletionCallback);

    fn land(&self, on_complete: CompletionCallback);

    fn set_heading(&self, degrees: f32, on_complete: CompletionCallback);

    fn move_to(&self, direction: Direction, distance: f32, on_complete: CompletionCallback);

    /// Registers the telemetry push feed.
    fn send_telemetry(&self, on_telemetry: TelemetryCallback);
}
