// src/config/mod.rs

//! Configuration loading and validation for voltsched.
//!
//! Responsibilities:
//! - Define the TOML-backed application table (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate ids, edges and graph shape before anything runs (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, load_from_str};
pub use model::{
    ConfigFile, ConfigSection, EdgeConfig, EdgeKindConfig, RawConfigFile, SupplySection,
    TaskConfig,
};
