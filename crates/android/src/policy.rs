//! Signing and packaging policy
//!
//! [`SigningAndPackagingPolicy`] is built once from [`PolicyInputs`]: the
//! validated configuration plus a credential bundle captured from the
//! environment. After construction it is immutable and every query is a
//! pure function of those inputs.

use crate::archive::ArchiveDeterminismPolicy;
use crate::credentials::CredentialBundle;
use crate::env::EnvSource;
use crate::exclusions::DependencyExclusionSet;
use crate::layout::{ProjectLayout, ProjectSettings};
use crate::optimization::{BuildType, OptimizationPolicy};
use crate::registry::{BuildTypeRegistry, SigningConfigRegistry, DEBUG_SIGNING_CONFIG};
use crate::signing::{
    DebugIdentity, KeystoreReference, ReleaseIdentity, SignatureSchemes, SigningIdentity,
    SigningSummary,
};
use apkpolicy_core::config::{ConfigSchema, SdkConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Everything the policy is computed from
#[derive(Debug, Clone)]
pub struct PolicyInputs {
    /// Release credentials, read once
    pub credentials: CredentialBundle,
    /// Validated project configuration
    pub config: ConfigSchema,
    /// Directory relative paths in the configuration are resolved against
    pub working_dir: PathBuf,
}

impl PolicyInputs {
    /// Capture credentials from `env` alongside the configuration
    pub fn capture(config: ConfigSchema, working_dir: impl Into<PathBuf>, env: &dyn EnvSource) -> Self {
        Self {
            credentials: CredentialBundle::from_env(env),
            config,
            working_dir: working_dir.into(),
        }
    }
}

/// Decides signing, optimization, archive, and dependency settings
#[derive(Debug, Clone)]
pub struct SigningAndPackagingPolicy {
    config: ConfigSchema,
    layout: ProjectLayout,
    debug_identity: DebugIdentity,
    signing_identity: SigningIdentity,
    signing_configs: SigningConfigRegistry,
    build_types: BuildTypeRegistry,
}

impl SigningAndPackagingPolicy {
    /// Build the policy; the signing identity is derived here, once
    #[must_use]
    pub fn new(inputs: PolicyInputs) -> Self {
        let PolicyInputs {
            credentials,
            config,
            working_dir,
        } = inputs;

        let layout = ProjectLayout::new(
            &working_dir.join(&config.project.android_dir),
            &config.project.build_root,
            &config.project.subprojects,
        );
        let debug_identity = DebugIdentity::new(config.signing.debug_keystore_path(&working_dir));

        let signing_identity =
            resolve_signing_identity(&credentials, &layout.app_dir(), &debug_identity);

        let release = match &signing_identity {
            SigningIdentity::Release(release) => Some(release.clone()),
            SigningIdentity::Debug(_) => None,
        };
        let signing_configs = SigningConfigRegistry::standard(debug_identity.clone(), release);
        let build_types = BuildTypeRegistry::standard(&signing_configs, &config.optimization);

        Self {
            config,
            layout,
            debug_identity,
            signing_identity,
            signing_configs,
            build_types,
        }
    }

    /// Identity for `credentials`, falling back to this policy's debug identity
    #[must_use]
    pub fn resolve_signing_identity(&self, credentials: &CredentialBundle) -> SigningIdentity {
        resolve_signing_identity(credentials, &self.layout.app_dir(), &self.debug_identity)
    }

    /// Identity derived at construction, used by release builds
    #[must_use]
    pub fn signing_identity(&self) -> &SigningIdentity {
        &self.signing_identity
    }

    /// Identity a given build type signs with
    #[must_use]
    pub fn signing_identity_for(&self, build_type: BuildType) -> &SigningIdentity {
        self.build_types
            .signing_identity(build_type, &self.signing_configs)
            .unwrap_or(&self.signing_identity)
    }

    /// Optimization settings for a build type
    #[must_use]
    pub fn optimization_policy_for(&self, build_type: BuildType) -> OptimizationPolicy {
        self.build_types
            .config_for(build_type)
            .map(|config| config.optimization.clone())
            .unwrap_or_else(|| OptimizationPolicy::for_build_type(build_type, &self.config.optimization))
    }

    /// Determinism settings shared by every archive task
    #[must_use]
    pub const fn archive_determinism_policy() -> ArchiveDeterminismPolicy {
        ArchiveDeterminismPolicy::reproducible()
    }

    /// Dependencies removed from every project
    #[must_use]
    pub fn dependency_exclusions() -> DependencyExclusionSet {
        DependencyExclusionSet::proprietary()
    }

    /// Directory layout
    #[must_use]
    pub fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    /// Signing config registry
    #[must_use]
    pub fn signing_configs(&self) -> &SigningConfigRegistry {
        &self.signing_configs
    }

    /// Build type registry
    #[must_use]
    pub fn build_types(&self) -> &BuildTypeRegistry {
        &self.build_types
    }

    /// Full plan for one build type
    #[must_use]
    pub fn plan(&self, build_type: BuildType) -> BuildPlan {
        let signing_config = self
            .build_types
            .config_for(build_type)
            .map_or(DEBUG_SIGNING_CONFIG, |config| config.signing_config.as_str());
        let identity = self.signing_identity_for(build_type);
        let exclusions = Self::dependency_exclusions();

        tracing::info!(
            build_type = %build_type,
            signing_config,
            release_signed = identity.is_release(),
            "Planned build"
        );

        BuildPlan {
            build_type,
            namespace: self.config.project.namespace.clone(),
            application_id: self.config.project.application_id.clone(),
            sdk: self.config.sdk.clone(),
            signing: identity.summary(signing_config),
            optimization: self.optimization_policy_for(build_type),
            archive: Self::archive_determinism_policy(),
            include_dependency_info: false,
            projects: self.layout.projects(&exclusions),
            exclusions,
            root_build_dir: self.layout.root_build_dir().to_path_buf(),
        }
    }
}

/// Release identity iff `credentials` is complete, else `debug`
///
/// Missing credentials are not an error: builds without access to release
/// secrets are signed with the debug identity instead.
#[must_use]
pub fn resolve_signing_identity(
    credentials: &CredentialBundle,
    base_dir: &Path,
    debug: &DebugIdentity,
) -> SigningIdentity {
    match credentials.complete() {
        Some(complete) => {
            let keystore = KeystoreReference::from_credentials(&complete, base_dir);
            tracing::info!(
                keystore = %keystore.path().display(),
                key_alias = keystore.key_alias(),
                "Release signing configured"
            );
            SigningIdentity::Release(ReleaseIdentity {
                keystore,
                schemes: SignatureSchemes::release(),
            })
        }
        None => {
            let missing: Vec<String> = credentials
                .missing_fields()
                .iter()
                .map(ToString::to_string)
                .collect();
            tracing::debug!(
                missing = %missing.join(","),
                "Release credentials incomplete, using debug signing"
            );
            SigningIdentity::Debug(debug.clone())
        }
    }
}

/// Everything decided for one build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildPlan {
    /// Build type planned
    pub build_type: BuildType,
    /// App namespace
    pub namespace: String,
    /// Application id
    pub application_id: String,
    /// Values passed through from the cross-platform tool
    pub sdk: SdkConfig,
    /// Selected signing identity, without secrets
    pub signing: SigningSummary,
    /// Minification and shrinking
    pub optimization: OptimizationPolicy,
    /// Archive determinism
    pub archive: ArchiveDeterminismPolicy,
    /// Embed dependency metadata in the artifact
    pub include_dependency_info: bool,
    /// Excluded dependencies
    pub exclusions: DependencyExclusionSet,
    /// Root build output directory
    pub root_build_dir: PathBuf,
    /// Per-project settings
    pub projects: Vec<ProjectSettings>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::{KEYSTORE_PATH_VAR, KEY_ALIAS_VAR, KEY_PASSWORD_VAR, STORE_PASSWORD_VAR};
    use crate::exclusions::{GMS_GROUP, PLAY_GROUP};
    use crate::optimization::RuleFile;
    use crate::signing::IdentityKind;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn all_set() -> HashMap<String, String> {
        env(&[
            (KEYSTORE_PATH_VAR, "/ci/secrets/release.jks"),
            (STORE_PASSWORD_VAR, "store-pw"),
            (KEY_ALIAS_VAR, "upload"),
            (KEY_PASSWORD_VAR, "key-pw"),
        ])
    }

    fn config() -> ConfigSchema {
        let mut config = ConfigSchema::default();
        config.project.android_dir = PathBuf::from("android");
        config.signing.debug_keystore = "/ci/home/.android/debug.keystore".to_string();
        config
    }

    fn policy_with(env: &HashMap<String, String>) -> SigningAndPackagingPolicy {
        SigningAndPackagingPolicy::new(PolicyInputs::capture(config(), "/work/musicore", env))
    }

    #[test]
    fn test_all_credentials_select_release_identity() {
        let policy = policy_with(&all_set());

        match policy.signing_identity() {
            SigningIdentity::Release(release) => {
                assert_eq!(release.schemes.enabled(), vec![1, 2]);
                assert_eq!(release.schemes.disabled(), vec![3, 4]);
                assert_eq!(release.keystore.path(), Path::new("/ci/secrets/release.jks"));
                assert_eq!(release.keystore.store_password().expose(), "store-pw");
            }
            other => panic!("expected release identity, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_key_password_falls_back_to_debug() {
        let mut vars = all_set();
        vars.remove(KEY_PASSWORD_VAR);
        let policy = policy_with(&vars);

        assert_eq!(
            policy.signing_identity(),
            &SigningIdentity::Debug(DebugIdentity::new("/ci/home/.android/debug.keystore"))
        );
    }

    #[test]
    fn test_empty_store_password_falls_back_to_debug() {
        let mut vars = all_set();
        vars.insert(STORE_PASSWORD_VAR.to_string(), String::new());

        assert!(!policy_with(&vars).signing_identity().is_release());
    }

    #[test]
    fn test_relative_keystore_resolves_against_app_module() {
        let mut vars = all_set();
        vars.insert(KEYSTORE_PATH_VAR.to_string(), "upload.jks".to_string());
        let policy = policy_with(&vars);

        assert_eq!(
            policy.signing_identity().keystore_path(),
            Path::new("/work/musicore/android/app/upload.jks")
        );
    }

    #[test]
    fn test_relative_debug_keystore_resolves_against_project_dir() {
        let mut config = config();
        config.signing.debug_keystore = "keys/debug.keystore".to_string();
        let policy =
            SigningAndPackagingPolicy::new(PolicyInputs::capture(config, "/work/musicore", &HashMap::new()));

        assert_eq!(
            policy.signing_identity().keystore_path(),
            Path::new("/work/musicore/keys/debug.keystore")
        );
        assert_eq!(
            policy.signing_identity_for(BuildType::Debug).keystore_path(),
            Path::new("/work/musicore/keys/debug.keystore")
        );
    }

    #[test]
    fn test_resolve_is_independent_of_captured_credentials() {
        let policy = policy_with(&HashMap::new());
        let bundle = CredentialBundle::from_env(&all_set());

        assert!(policy.resolve_signing_identity(&bundle).is_release());
        assert!(!policy.signing_identity().is_release());
    }

    #[test]
    fn test_debug_build_type_plan() {
        let plan = policy_with(&all_set()).plan(BuildType::Debug);

        assert_eq!(
            plan.optimization,
            OptimizationPolicy {
                minify: false,
                shrink_resources: false,
                obfuscation_rule_files: vec![],
            }
        );
        assert_eq!(plan.signing.kind, IdentityKind::Debug);
        assert_eq!(plan.signing.config_name, "debug");
    }

    #[test]
    fn test_release_plan_with_credentials() {
        let plan = policy_with(&all_set()).plan(BuildType::Release);

        assert_eq!(plan.signing.kind, IdentityKind::Release);
        assert_eq!(plan.signing.config_name, "release");
        assert!(plan.optimization.minify);
        assert!(plan.optimization.shrink_resources);
        assert_eq!(
            plan.optimization.obfuscation_rule_files,
            vec![
                RuleFile::Bundled("proguard-android-optimize.txt".to_string()),
                RuleFile::Project("proguard-rules.pro".to_string()),
            ]
        );
        assert!(!plan.include_dependency_info);
        assert_eq!(plan.root_build_dir, PathBuf::from("/work/build"));
    }

    #[test]
    fn test_release_plan_without_credentials_uses_debug_config() {
        let plan = policy_with(&HashMap::new()).plan(BuildType::Release);

        assert_eq!(plan.signing.kind, IdentityKind::Debug);
        assert_eq!(plan.signing.config_name, "debug");
        assert!(plan.optimization.minify);
    }

    #[test]
    fn test_archive_policy_constant_across_build_types() {
        let policy = policy_with(&all_set());
        let archives: Vec<_> = BuildType::ALL.iter().map(|bt| policy.plan(*bt).archive).collect();

        assert!(archives.iter().all(|a| *a == ArchiveDeterminismPolicy::reproducible()));
        assert_eq!(
            SigningAndPackagingPolicy::archive_determinism_policy(),
            SigningAndPackagingPolicy::archive_determinism_policy()
        );
    }

    #[test]
    fn test_optimization_is_idempotent() {
        let policy = policy_with(&all_set());
        assert_eq!(
            policy.optimization_policy_for(BuildType::Release),
            policy.optimization_policy_for(BuildType::Release)
        );
    }

    #[test]
    fn test_plan_exclusions_limited_to_proprietary_groups() {
        let plan = policy_with(&HashMap::new()).plan(BuildType::Release);
        let groups: Vec<_> = plan.exclusions.groups().into_iter().collect();

        assert_eq!(groups, vec![GMS_GROUP, PLAY_GROUP]);
        assert!(plan.projects.iter().all(|p| p.exclusions == plan.exclusions));
    }

    #[test]
    fn test_plan_json_has_no_secrets() {
        let plan = policy_with(&all_set()).plan(BuildType::Release);
        let json = serde_json::to_string(&plan).unwrap();

        assert!(!json.contains("store-pw"));
        assert!(!json.contains("key-pw"));
        assert!(json.contains("\"build_type\":\"release\""));
    }
}
