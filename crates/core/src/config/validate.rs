//! Well-formedness checks for declarative configuration
//!
//! Any failure here is a configuration evaluation error and aborts before a
//! build plan is produced.

use super::schema::ConfigSchema;
use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;

static DOTTED_VERSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+(\.\d+)*([-+][0-9A-Za-z.-]+)?$").expect("valid regex"));

static PACKAGE_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9_]*(\.[A-Za-z][A-Za-z0-9_]*)+$").expect("valid regex")
});

impl ConfigSchema {
    /// Validate the schema, reporting every problem found
    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();
        let sdk = &self.sdk;
        let project = &self.project;

        if !PACKAGE_NAME.is_match(&project.namespace) {
            problems.push(format!("project.namespace '{}' is not a package name", project.namespace));
        }
        if !PACKAGE_NAME.is_match(&project.application_id) {
            problems.push(format!(
                "project.application_id '{}' is not a package name",
                project.application_id
            ));
        }
        if project.subprojects.iter().any(|name| name.trim().is_empty() || name == "app") {
            problems.push("project.subprojects must not contain blank names or 'app'".to_string());
        }

        if sdk.min_sdk > sdk.target_sdk {
            problems.push(format!(
                "sdk.min_sdk ({}) is greater than sdk.target_sdk ({})",
                sdk.min_sdk, sdk.target_sdk
            ));
        }
        if sdk.target_sdk > sdk.compile_sdk {
            problems.push(format!(
                "sdk.target_sdk ({}) is greater than sdk.compile_sdk ({})",
                sdk.target_sdk, sdk.compile_sdk
            ));
        }
        if sdk.version_code == 0 {
            problems.push("sdk.version_code must be positive".to_string());
        }
        if !DOTTED_VERSION.is_match(&sdk.version_name) {
            problems.push(format!("sdk.version_name '{}' is not a version string", sdk.version_name));
        }
        if !DOTTED_VERSION.is_match(&sdk.ndk_version) {
            problems.push(format!("sdk.ndk_version '{}' is not a version string", sdk.ndk_version));
        }

        if self.optimization.default_rules.trim().is_empty()
            || self.optimization.custom_rules.trim().is_empty()
        {
            problems.push("optimization rule file names must not be blank".to_string());
        }
        if self.signing.debug_keystore.trim().is_empty() {
            problems.push("signing.debug_keystore must not be blank".to_string());
        }

        if problems.is_empty() {
            return Ok(());
        }

        tracing::error!(count = problems.len(), "Configuration failed validation");
        Err(Error::config_validation(problems.join("; "))
            .with_suggestion("Fix the listed values in apkpolicy.toml"))
    }
}
