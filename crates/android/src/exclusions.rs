//! Proprietary dependency exclusions
//!
//! Artifacts built with this policy must never link against Google Play
//! distribution or Play Services code, so those groups are removed from the
//! dependency graph of every project whether requested directly or
//! transitively.

use apkpolicy_core::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Google Play distribution and in-app update libraries
pub const PLAY_GROUP: &str = "com.google.android.play";
/// Google Play Services
pub const GMS_GROUP: &str = "com.google.android.gms";

/// Play modules that are excluded by name in addition to the group rule
const PLAY_MODULES: &[&str] = &[
    "core",
    "core-ktx",
    "feature-delivery",
    "feature-delivery-ktx",
    "asset-delivery",
    "asset-delivery-ktx",
    "app-update",
    "app-update-ktx",
];

/// A Maven module coordinate, `group:module[:version]`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coordinate {
    #[allow(missing_docs)]
    pub group: String,
    #[allow(missing_docs)]
    pub module: String,
    #[allow(missing_docs)]
    pub version: Option<String>,
}

impl Coordinate {
    /// Coordinate without a version
    pub fn new(group: impl Into<String>, module: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            module: module.into(),
            version: None,
        }
    }

    /// Parse `group:module` or `group:module:version`
    ///
    /// Whitespace around each part is ignored.
    pub fn parse(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split(':').map(str::trim).collect();
        let invalid = || {
            Error::validation(format!("Invalid dependency coordinate: {s}"))
                .with_suggestion("Use group:module or group:module:version")
        };

        if parts.iter().any(|p| p.is_empty()) {
            return Err(invalid());
        }

        match parts.as_slice() {
            [group, module] => Ok(Self::new(*group, *module)),
            [group, module, version] => Ok(Self {
                version: Some((*version).to_string()),
                ..Self::new(*group, *module)
            }),
            _ => Err(invalid()),
        }
    }
}

impl FromStr for Coordinate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group, self.module)?;
        if let Some(version) = &self.version {
            write!(f, ":{version}")?;
        }
        Ok(())
    }
}

/// Exclude a whole group, or one module of it
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExclusionRule {
    /// Group to match
    pub group: String,
    /// Module to match; `None` matches every module in the group
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
}

impl ExclusionRule {
    /// Rule matching every module in `group`
    pub fn group(group: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            module: None,
        }
    }

    /// Rule matching a single module
    pub fn module(group: impl Into<String>, module: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            module: Some(module.into()),
        }
    }

    /// Whether `coordinate` is excluded by this rule
    #[must_use]
    pub fn matches(&self, coordinate: &Coordinate) -> bool {
        self.group == coordinate.group
            && self
                .module
                .as_ref()
                .is_none_or(|module| *module == coordinate.module)
    }
}

impl fmt::Display for ExclusionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.module {
            Some(module) => write!(f, "{}:{}", self.group, module),
            None => write!(f, "{}:*", self.group),
        }
    }
}

/// Set of rules removed from every dependency resolution
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DependencyExclusionSet {
    rules: BTreeSet<ExclusionRule>,
}

impl DependencyExclusionSet {
    /// The fixed set covering Play distribution and Play Services
    #[must_use]
    pub fn proprietary() -> Self {
        let rules = PLAY_MODULES
            .iter()
            .map(|module| ExclusionRule::module(PLAY_GROUP, *module))
            .chain([ExclusionRule::group(PLAY_GROUP), ExclusionRule::group(GMS_GROUP)])
            .collect();

        Self { rules }
    }

    /// Whether any rule excludes `coordinate`
    #[must_use]
    pub fn excludes(&self, coordinate: &Coordinate) -> bool {
        self.rules.iter().any(|rule| rule.matches(coordinate))
    }

    /// Rule that excludes `coordinate`, preferring the most specific one
    #[must_use]
    pub fn matching_rule(&self, coordinate: &Coordinate) -> Option<&ExclusionRule> {
        let mut matching = self.rules.iter().filter(|rule| rule.matches(coordinate));
        let first = matching.next()?;
        Some(
            std::iter::once(first)
                .chain(matching)
                .find(|rule| rule.module.is_some())
                .unwrap_or(first),
        )
    }

    /// Keep only the coordinates that survive the exclusions
    pub fn filter<'a, I>(&self, coordinates: I) -> Vec<&'a Coordinate>
    where
        I: IntoIterator<Item = &'a Coordinate>,
    {
        coordinates
            .into_iter()
            .filter(|coordinate| {
                let excluded = self.excludes(coordinate);
                if excluded {
                    tracing::debug!(dependency = %coordinate, "Excluded proprietary dependency");
                }
                !excluded
            })
            .collect()
    }

    /// Rules in stable order
    pub fn rules(&self) -> impl Iterator<Item = &ExclusionRule> {
        self.rules.iter()
    }

    /// Distinct groups touched by any rule
    #[must_use]
    pub fn groups(&self) -> BTreeSet<&str> {
        self.rules.iter().map(|rule| rule.group.as_str()).collect()
    }

    /// Number of rules
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// True when there are no rules
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_two_groups() {
        let set = DependencyExclusionSet::proprietary();
        let groups: Vec<_> = set.groups().into_iter().collect();
        assert_eq!(groups, vec![GMS_GROUP, PLAY_GROUP]);
        assert_eq!(set.len(), PLAY_MODULES.len() + 2);
    }

    #[test]
    fn test_fixed_across_calls() {
        assert_eq!(
            DependencyExclusionSet::proprietary(),
            DependencyExclusionSet::proprietary()
        );
    }

    #[test]
    fn test_excludes_whole_groups() {
        let set = DependencyExclusionSet::proprietary();

        assert!(set.excludes(&Coordinate::new(GMS_GROUP, "play-services-location")));
        assert!(set.excludes(&Coordinate::new(PLAY_GROUP, "review")));
        assert!(set.excludes(&Coordinate::parse("com.google.android.play:app-update:2.1.0").unwrap()));
    }

    #[test]
    fn test_keeps_third_party_groups() {
        let set = DependencyExclusionSet::proprietary();

        assert!(!set.excludes(&Coordinate::new("androidx.core", "core-ktx")));
        assert!(!set.excludes(&Coordinate::new("com.google.android.material", "material")));
        assert!(!set.excludes(&Coordinate::new("com.google.android", "play")));
    }

    #[test]
    fn test_matching_rule_prefers_module() {
        let set = DependencyExclusionSet::proprietary();

        let rule = set.matching_rule(&Coordinate::new(PLAY_GROUP, "core-ktx")).unwrap();
        assert_eq!(rule, &ExclusionRule::module(PLAY_GROUP, "core-ktx"));

        let rule = set.matching_rule(&Coordinate::new(PLAY_GROUP, "review")).unwrap();
        assert_eq!(rule, &ExclusionRule::group(PLAY_GROUP));

        assert!(set.matching_rule(&Coordinate::new("org.jetbrains", "annotations")).is_none());
    }

    #[test]
    fn test_filter() {
        let set = DependencyExclusionSet::proprietary();
        let deps = vec![
            Coordinate::new("androidx.media3", "media3-exoplayer"),
            Coordinate::new(GMS_GROUP, "play-services-base"),
            Coordinate::new(PLAY_GROUP, "feature-delivery"),
            Coordinate::new("org.jetbrains.kotlin", "kotlin-stdlib"),
        ];

        let kept: Vec<String> = set.filter(&deps).iter().map(ToString::to_string).collect();
        assert_eq!(
            kept,
            vec!["androidx.media3:media3-exoplayer", "org.jetbrains.kotlin:kotlin-stdlib"]
        );
    }

    #[test]
    fn test_coordinate_parse_errors() {
        assert!(Coordinate::parse("just-a-group").is_err());
        assert!(Coordinate::parse("a::c").is_err());
        assert!(Coordinate::parse("a:b:c:d").is_err());
        assert!("a:b".parse::<Coordinate>().is_ok());
    }

    #[test]
    fn test_coordinate_parts_are_trimmed() {
        let coordinate = Coordinate::parse("com.google.android.play : core-ktx : 1.8.1 ").unwrap();
        assert_eq!(coordinate.group, PLAY_GROUP);
        assert_eq!(coordinate.module, "core-ktx");
        assert_eq!(coordinate.version.as_deref(), Some("1.8.1"));
        assert!(DependencyExclusionSet::proprietary().excludes(&coordinate));
        assert!(Coordinate::parse("a: ").is_err());
    }

    #[test]
    fn test_rule_display() {
        assert_eq!(ExclusionRule::group(GMS_GROUP).to_string(), "com.google.android.gms:*");
        assert_eq!(
            ExclusionRule::module(PLAY_GROUP, "core").to_string(),
            "com.google.android.play:core"
        );
    }
}
