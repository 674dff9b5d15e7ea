//! Named signing configs and build types
//!
//! Two small registries stand in for nested build-script blocks. The
//! `release` signing config is always registered but only carries an
//! identity when release credentials were complete; the `release` build type
//! picks it if so and falls back to `debug` otherwise.

use crate::optimization::{BuildType, OptimizationPolicy};
use crate::signing::{DebugIdentity, ReleaseIdentity, SigningIdentity};
use apkpolicy_core::config::OptimizationConfig;
use std::collections::BTreeMap;

/// Name of the debug signing config
pub const DEBUG_SIGNING_CONFIG: &str = "debug";
/// Name of the release signing config
pub const RELEASE_SIGNING_CONFIG: &str = "release";

/// A registered signing config
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningConfigEntry {
    /// Registry name
    pub name: String,
    /// Identity, or `None` when the config was declared but never populated
    pub identity: Option<SigningIdentity>,
}

impl SigningConfigEntry {
    /// Whether the config has a store file
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.identity.is_some()
    }
}

/// Name → signing config
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SigningConfigRegistry {
    configs: BTreeMap<String, SigningConfigEntry>,
}

impl SigningConfigRegistry {
    /// Registry with `debug` and `release` entries
    #[must_use]
    pub fn standard(debug: DebugIdentity, release: Option<ReleaseIdentity>) -> Self {
        let mut registry = Self::default();
        registry.register(DEBUG_SIGNING_CONFIG, Some(SigningIdentity::Debug(debug)));
        registry.register(RELEASE_SIGNING_CONFIG, release.map(SigningIdentity::Release));
        registry
    }

    /// Add or replace a config
    pub fn register(&mut self, name: &str, identity: Option<SigningIdentity>) {
        self.configs.insert(
            name.to_string(),
            SigningConfigEntry {
                name: name.to_string(),
                identity,
            },
        );
    }

    /// Look up a config by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SigningConfigEntry> {
        self.configs.get(name)
    }

    /// Look up a config only if it has an identity
    #[must_use]
    pub fn find_configured(&self, name: &str) -> Option<&SigningConfigEntry> {
        self.get(name).filter(|entry| entry.is_configured())
    }

    /// Registered names, sorted
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.configs.keys().map(String::as_str)
    }
}

/// Configuration of one build type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildTypeConfig {
    /// Build type
    pub build_type: BuildType,
    /// Name of the signing config used
    pub signing_config: String,
    /// Optimization settings
    pub optimization: OptimizationPolicy,
}

/// Name → build type config
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildTypeRegistry {
    types: BTreeMap<String, BuildTypeConfig>,
}

impl BuildTypeRegistry {
    /// `release` and `debug` wired against `signing`
    #[must_use]
    pub fn standard(signing: &SigningConfigRegistry, rules: &OptimizationConfig) -> Self {
        let release_signing = if signing.find_configured(RELEASE_SIGNING_CONFIG).is_some() {
            RELEASE_SIGNING_CONFIG
        } else {
            tracing::debug!("Release signing config has no store file, release uses debug signing");
            DEBUG_SIGNING_CONFIG
        };

        let mut registry = Self::default();
        for build_type in BuildType::ALL {
            let signing_config = match build_type {
                BuildType::Release => release_signing,
                BuildType::Debug => DEBUG_SIGNING_CONFIG,
            };
            registry.types.insert(
                build_type.name().to_string(),
                BuildTypeConfig {
                    build_type,
                    signing_config: signing_config.to_string(),
                    optimization: OptimizationPolicy::for_build_type(build_type, rules),
                },
            );
        }
        registry
    }

    /// Look up a build type by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&BuildTypeConfig> {
        self.types.get(name)
    }

    /// Config of a build type
    #[must_use]
    pub fn config_for(&self, build_type: BuildType) -> Option<&BuildTypeConfig> {
        self.get(build_type.name())
    }

    /// Identity a build type signs with, if its signing config is populated
    #[must_use]
    pub fn signing_identity<'a>(
        &self,
        build_type: BuildType,
        signing: &'a SigningConfigRegistry,
    ) -> Option<&'a SigningIdentity> {
        let config = self.config_for(build_type)?;
        signing.get(&config.signing_config)?.identity.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::CredentialBundle;
    use crate::signing::{KeystoreReference, SignatureSchemes};
    use std::path::Path;

    fn release_identity() -> ReleaseIdentity {
        let bundle = CredentialBundle::new(
            Some("/k/release.jks".to_string()),
            Some("a".to_string()),
            Some("upload".to_string()),
            Some("b".to_string()),
        );
        ReleaseIdentity {
            keystore: KeystoreReference::from_credentials(&bundle.complete().unwrap(), Path::new("/")),
            schemes: SignatureSchemes::release(),
        }
    }

    #[test]
    fn test_release_config_always_registered() {
        let registry = SigningConfigRegistry::standard(DebugIdentity::new("/d.keystore"), None);

        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["debug", "release"]);
        assert!(!registry.get(RELEASE_SIGNING_CONFIG).unwrap().is_configured());
        assert!(registry.find_configured(RELEASE_SIGNING_CONFIG).is_none());
    }

    #[test]
    fn test_release_build_type_uses_release_config_when_populated() {
        let signing =
            SigningConfigRegistry::standard(DebugIdentity::new("/d.keystore"), Some(release_identity()));
        let types = BuildTypeRegistry::standard(&signing, &OptimizationConfig::default());

        assert_eq!(
            types.config_for(BuildType::Release).unwrap().signing_config,
            RELEASE_SIGNING_CONFIG
        );
        assert!(types
            .signing_identity(BuildType::Release, &signing)
            .unwrap()
            .is_release());
    }

    #[test]
    fn test_release_build_type_falls_back_to_debug() {
        let signing = SigningConfigRegistry::standard(DebugIdentity::new("/d.keystore"), None);
        let types = BuildTypeRegistry::standard(&signing, &OptimizationConfig::default());

        assert_eq!(
            types.config_for(BuildType::Release).unwrap().signing_config,
            DEBUG_SIGNING_CONFIG
        );
        let identity = types.signing_identity(BuildType::Release, &signing).unwrap();
        assert_eq!(identity, &SigningIdentity::Debug(DebugIdentity::new("/d.keystore")));
    }

    #[test]
    fn test_debug_build_type_always_debug() {
        let signing =
            SigningConfigRegistry::standard(DebugIdentity::new("/d.keystore"), Some(release_identity()));
        let types = BuildTypeRegistry::standard(&signing, &OptimizationConfig::default());

        let debug = types.config_for(BuildType::Debug).unwrap();
        assert_eq!(debug.signing_config, DEBUG_SIGNING_CONFIG);
        assert!(!debug.optimization.minify);
    }
}
