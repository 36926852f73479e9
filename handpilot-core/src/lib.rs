// src/lib.rs

pub mod vision;
pub mod stabilizer;
pub mod dispatcher;
pub mod channel;
pub mod eventbus;
pub mod telemetry;
pub mod platforms;
pub mod sources;
pub mod tasks;
pub mod config;

pub use handpilot_common::error::Error;
pub use config::PilotConfig;
pub use dispatcher::{Dispatcher, DispatcherHandle};
pub use eventbus::{EventBus, PilotEvent};
