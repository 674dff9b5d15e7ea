//! Per-build-type code and resource optimization

use apkpolicy_core::config::OptimizationConfig;
use apkpolicy_core::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Build variant selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildType {
    /// Distributable build
    Release,
    /// Local development build
    Debug,
}

impl BuildType {
    /// Both build types
    pub const ALL: [BuildType; 2] = [BuildType::Release, BuildType::Debug];

    /// Registry name of the build type
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            BuildType::Release => "release",
            BuildType::Debug => "debug",
        }
    }
}

impl fmt::Display for BuildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BuildType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "release" => Ok(BuildType::Release),
            "debug" => Ok(BuildType::Debug),
            other => Err(Error::validation(format!("Unknown build type: {other}"))
                .with_suggestion("Use 'release' or 'debug'")),
        }
    }
}

/// An obfuscation rule file reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", content = "name", rename_all = "lowercase")]
pub enum RuleFile {
    /// Rules bundled with the Android build tools, looked up by name
    Bundled(String),
    /// Rules file in the app module
    Project(String),
}

impl RuleFile {
    /// File name of the rules
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            RuleFile::Bundled(name) | RuleFile::Project(name) => name,
        }
    }
}

impl fmt::Display for RuleFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleFile::Bundled(name) => write!(f, "{name} (bundled)"),
            RuleFile::Project(name) => f.write_str(name),
        }
    }
}

/// Minification and shrinking settings for one build type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizationPolicy {
    /// Minify and obfuscate code
    pub minify: bool,
    /// Strip unused resources
    pub shrink_resources: bool,
    /// Rule files, applied in order
    pub obfuscation_rule_files: Vec<RuleFile>,
}

impl OptimizationPolicy {
    /// Policy for `build_type`, with rule file names from `rules`
    #[must_use]
    pub fn for_build_type(build_type: BuildType, rules: &OptimizationConfig) -> Self {
        match build_type {
            BuildType::Release => Self {
                minify: true,
                shrink_resources: true,
                obfuscation_rule_files: vec![
                    RuleFile::Bundled(rules.default_rules.clone()),
                    RuleFile::Project(rules.custom_rules.clone()),
                ],
            },
            BuildType::Debug => Self {
                minify: false,
                shrink_resources: false,
                obfuscation_rule_files: Vec::new(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_policy() {
        let policy = OptimizationPolicy::for_build_type(BuildType::Release, &OptimizationConfig::default());

        assert!(policy.minify);
        assert!(policy.shrink_resources);
        assert_eq!(
            policy.obfuscation_rule_files,
            vec![
                RuleFile::Bundled("proguard-android-optimize.txt".to_string()),
                RuleFile::Project("proguard-rules.pro".to_string()),
            ]
        );
    }

    #[test]
    fn test_debug_policy() {
        let policy = OptimizationPolicy::for_build_type(BuildType::Debug, &OptimizationConfig::default());

        assert!(!policy.minify);
        assert!(!policy.shrink_resources);
        assert!(policy.obfuscation_rule_files.is_empty());
    }

    #[test]
    fn test_release_policy_is_idempotent() {
        let rules = OptimizationConfig::default();
        assert_eq!(
            OptimizationPolicy::for_build_type(BuildType::Release, &rules),
            OptimizationPolicy::for_build_type(BuildType::Release, &rules)
        );
    }

    #[test]
    fn test_custom_rule_names() {
        let rules = OptimizationConfig {
            default_rules: "proguard-android.txt".to_string(),
            custom_rules: "rules/app.pro".to_string(),
        };
        let policy = OptimizationPolicy::for_build_type(BuildType::Release, &rules);
        let names: Vec<_> = policy.obfuscation_rule_files.iter().map(RuleFile::name).collect();
        assert_eq!(names, vec!["proguard-android.txt", "rules/app.pro"]);
    }

    #[test]
    fn test_build_type_parse() {
        assert_eq!("Release".parse::<BuildType>().unwrap(), BuildType::Release);
        assert_eq!(" debug ".parse::<BuildType>().unwrap(), BuildType::Debug);
        assert!("profile".parse::<BuildType>().is_err());
    }

    #[test]
    fn test_rule_file_serialization() {
        let json = serde_json::to_string(&RuleFile::Bundled("x.txt".to_string())).unwrap();
        assert_eq!(json, r#"{"source":"bundled","name":"x.txt"}"#);
    }
}
