// File: handpilot-core/src/platforms/mod.rs

pub mod simulated;

pub use simulated::SimulatedVehicle;
