//! Preheat Keeper - policy controller library
//!
//! Manages P2P-distribution provider instances and content-preheat
//! policies, keeping each policy's trigger reconciled with an external
//! job scheduler.

pub mod config;
pub mod error;
pub mod models;
pub mod provider;
pub mod services;
pub mod store;
pub mod telemetry;

pub use config::Config;
pub use error::{AppError, Result};
