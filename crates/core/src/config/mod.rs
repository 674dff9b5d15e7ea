//! Configuration loading and schema definitions
//!
//! Project configuration lives in `apkpolicy.toml`. Values supplied by the
//! cross-platform build tool (SDK levels, version code and name) are carried
//! as opaque pass-through values and only checked for well-formedness.

mod loader;
mod schema;
mod validate;

pub use loader::{Config, CONFIG_CANDIDATES};
pub use schema::*;
