pub mod vehicle_traits;
pub mod frame_traits;

pub use vehicle_traits::{CompletionCallback, TelemetryCallback, VehicleControl};
pub use frame_traits::FrameSource;
