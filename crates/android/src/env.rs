//! Environment access
//!
//! Credentials are read from exactly one place: an [`EnvSource`] handed to
//! [`CredentialBundle::from_env`](crate::credentials::CredentialBundle::from_env).
//! Tests inject maps instead of mutating the process environment.

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

/// A read-only view of environment variables
pub trait EnvSource {
    /// Value of `key`, or `None` when unset or not valid unicode
    fn var(&self, key: &str) -> Option<String>;
}

/// The environment of the current process
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl<S: BuildHasher> EnvSource for HashMap<String, String, S> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl EnvSource for BTreeMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl<T: EnvSource + ?Sized> EnvSource for &T {
    fn var(&self, key: &str) -> Option<String> {
        (**self).var(key)
    }
}
