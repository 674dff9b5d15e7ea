//! Release-signing and reproducible-packaging policy for Android builds
//!
//! This crate decides, from configuration and environment inputs read once
//! at start-up:
//! - Which signing identity a build uses (release keystore or debug fallback)
//! - Minification, resource shrinking, and obfuscation rule files per build type
//! - Archive determinism (fixed timestamps, stable entry order)
//! - Which proprietary dependency groups are excluded from every project
//! - Where each project writes its build output
//!
//! # Example
//!
//! ```rust,no_run
//! use apkpolicy_android::env::ProcessEnv;
//! use apkpolicy_android::optimization::BuildType;
//! use apkpolicy_android::policy::{PolicyInputs, SigningAndPackagingPolicy};
//! use apkpolicy_core::config::ConfigSchema;
//!
//! let inputs = PolicyInputs::capture(ConfigSchema::default(), ".", &ProcessEnv);
//! let policy = SigningAndPackagingPolicy::new(inputs);
//! let plan = policy.plan(BuildType::Release);
//! println!("signing with {}", plan.signing.config_name);
//! ```

#![warn(missing_docs)]

pub mod archive;
pub mod credentials;
pub mod env;
pub mod exclusions;
pub mod layout;
pub mod optimization;
pub mod policy;
pub mod registry;
pub mod signing;
