#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod config;
pub mod decay;
pub mod error;
pub mod gesture;
pub mod lifecycle;
pub mod notification;
pub mod overlay;
pub mod platform;
pub mod suppression;
pub mod telemetry;
pub mod types;

pub use config::Config;
pub use overlay::{Engine, EngineHandle};

pub type Result<T> = std::result::Result<T, error::Error>;
