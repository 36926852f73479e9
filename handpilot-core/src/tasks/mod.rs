// File: handpilot-core/src/tasks/mod.rs

pub mod frame_worker;
pub mod event_logger;

pub use frame_worker::{spawn_frame_worker, FrameWorkerStats};
pub use event_logger::spawn_event_logger;
