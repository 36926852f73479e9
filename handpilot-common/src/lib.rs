//! handpilot-common/src/lib.rs
//!
//! Types and boundary traits shared by the HandPilot crates.

pub mod error;
pub mod models;
pub mod traits;

pub use error::Error;
