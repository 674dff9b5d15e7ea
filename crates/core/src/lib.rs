//! Core utilities for the apkpolicy tools
//!
//! This crate provides the shared foundation used by the policy engine and
//! its command line front-end:
//!
//! - **Error handling**: errors with codes, context, and recovery suggestions
//! - **Configuration**: TOML-based project configuration with validation
//!
//! # Example
//!
//! ```rust,no_run
//! use apkpolicy_core::config::Config;
//!
//! let config = Config::load(None, std::path::Path::new(".")).expect("invalid configuration");
//! println!("building {}", config.schema.project.application_id);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;

pub use error::{Error, ErrorCode, Result, ResultExt};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{Config, ConfigSchema};
    pub use crate::error::{exit_codes, Error, ErrorCode, Result, ResultExt};
}
