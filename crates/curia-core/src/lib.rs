//! # curia-core
//!
//! Core types shared by every curia crate: the error enum, connection and
//! logging settings, and the tracing setup helper. This crate has no database
//! dependencies.
//!
//! ## Modules
//!
//! - [`error`] - Error types and result aliases
//! - [`settings`] - Settings structs for logging and named connections
//! - [`settings_loader`] - Loading settings from TOML/JSON and the environment
//! - [`logging`] - Tracing-based logging integration

pub mod error;
pub mod logging;
pub mod settings;
pub mod settings_loader;

// Re-export the most commonly used types at the crate root.
pub use error::{CuriaError, CuriaResult};
pub use settings::{ConnectionSettings, DatabaseSection, Settings};
