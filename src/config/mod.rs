// src/config/mod.rs

//! Configuration loading and validation for scriptherd.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate basic invariants like sane script descriptors (`validate.rs`).
//!
//! The script table is read-only to the supervisor core; a config CRUD
//! surface, if any, lives outside this crate.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path};
pub use model::{ConfigFile, ConfigSection, ScriptConfig};
pub use validate::validate_config;
