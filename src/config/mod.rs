//! Application Configuration Module
//!
//! Service, model, dataset, constraint and search settings loaded from TOML.
//!
//! ## Loading Order
//!
//! 1. `ALLOY_CONFIG` environment variable (path to TOML file)
//! 2. `alloy_config.toml` in the current working directory
//! 3. Built-in defaults (`defaults.rs`)
//!
//! The loaded `AppConfig` is handed to `AlloyService::new`; nothing reads
//! configuration through global state.

mod app_config;
pub mod defaults;
pub mod validation;

pub use app_config::*;
