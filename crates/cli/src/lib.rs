//! CLI utilities for the apkpolicy tools
//!
//! Provides shared terminal output:
//! - Status messages
//! - Key/value rows and yes/no flags for policy reports

#![warn(missing_docs)]

pub mod output;
