//! BuiltWith Core - Foundation crate for the BuiltWith API client.
//!
//! This crate provides the error taxonomy, configuration management and
//! validated shared types that the client and CLI crates depend on.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths and env overrides
//! - [`types`] - Shared newtypes and enums (`OutputFormat`, `CountryCode`, `ApiKey`, `Timestamp`)
//!
//! # Example
//!
//! ```rust
//! use builtwith_core::{AppConfig, OutputFormat};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::default();
//! assert_eq!(config.batch.batch_size, builtwith_core::MAX_DOMAINS_PER_REQUEST);
//!
//! let format: OutputFormat = "xml".parse()?;
//! assert!(format.supports_keywords());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod types;

/// Service-side cap on domains in one keywords request.
pub const MAX_DOMAINS_PER_REQUEST: usize = 16;

// Re-export commonly used types
pub use config::{ApiConfig, AppConfig, BatchConfig, PaginationConfig, API_KEY_ENV};
pub use error::{BuiltWithError, ConfigError, ConfigResult, ErrorKind, Result};
pub use types::{ApiKey, CountryCode, OutputFormat, Timestamp};
