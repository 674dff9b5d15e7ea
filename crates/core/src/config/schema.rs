//! Configuration schema definitions

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ConfigSchema {
    /// Android project identity and directory layout
    #[serde(default)]
    pub project: ProjectConfig,

    /// Values handed over by the cross-platform build tool
    #[serde(default)]
    pub sdk: SdkConfig,

    /// Obfuscation rule file names
    #[serde(default)]
    pub optimization: OptimizationConfig,

    /// Signing settings that are not secrets
    #[serde(default)]
    pub signing: SigningConfig,
}

/// Android project identity and directory layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Kotlin/Java namespace of the app module
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Published application id
    #[serde(default = "default_namespace")]
    pub application_id: String,

    /// Android project directory, relative to the working directory
    #[serde(default = "default_android_dir")]
    pub android_dir: PathBuf,

    /// Root build directory, relative to the Android project directory
    #[serde(default = "default_build_root")]
    pub build_root: PathBuf,

    /// Subprojects besides `app` (plugin modules and the like)
    #[serde(default)]
    pub subprojects: Vec<String>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            application_id: default_namespace(),
            android_dir: default_android_dir(),
            build_root: default_build_root(),
            subprojects: Vec::new(),
        }
    }
}

fn default_namespace() -> String {
    "com.example.app".to_string()
}

fn default_android_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_build_root() -> PathBuf {
    PathBuf::from("../../build")
}

/// SDK levels and versioning supplied by the cross-platform build tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SdkConfig {
    #[serde(default = "default_compile_sdk")]
    #[allow(missing_docs)]
    pub compile_sdk: u32,

    #[serde(default = "default_min_sdk")]
    #[allow(missing_docs)]
    pub min_sdk: u32,

    #[serde(default = "default_compile_sdk")]
    #[allow(missing_docs)]
    pub target_sdk: u32,

    /// NDK version, e.g. `27.0.12077973`
    #[serde(default = "default_ndk_version")]
    pub ndk_version: String,

    /// Monotonic store version code
    #[serde(default = "default_version_code")]
    pub version_code: u64,

    /// User-visible version name
    #[serde(default = "default_version_name")]
    pub version_name: String,

    /// Java source/target compatibility level
    #[serde(default = "default_java_version")]
    pub java_version: u32,
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self {
            compile_sdk: default_compile_sdk(),
            min_sdk: default_min_sdk(),
            target_sdk: default_compile_sdk(),
            ndk_version: default_ndk_version(),
            version_code: default_version_code(),
            version_name: default_version_name(),
            java_version: default_java_version(),
        }
    }
}

fn default_compile_sdk() -> u32 {
    35
}

fn default_min_sdk() -> u32 {
    21
}

fn default_ndk_version() -> String {
    "27.0.12077973".to_string()
}

fn default_version_code() -> u64 {
    1
}

fn default_version_name() -> String {
    "1.0.0".to_string()
}

fn default_java_version() -> u32 {
    11
}

/// Obfuscation rule file configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizationConfig {
    /// Rules shipped with the Android build tools
    #[serde(default = "default_default_rules")]
    pub default_rules: String,

    /// Rules maintained in the project
    #[serde(default = "default_custom_rules")]
    pub custom_rules: String,
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        Self {
            default_rules: default_default_rules(),
            custom_rules: default_custom_rules(),
        }
    }
}

fn default_default_rules() -> String {
    "proguard-android-optimize.txt".to_string()
}

fn default_custom_rules() -> String {
    "proguard-rules.pro".to_string()
}

/// Non-secret signing configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningConfig {
    /// Debug keystore used when release credentials are unavailable
    #[serde(default = "default_debug_keystore")]
    pub debug_keystore: String,
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            debug_keystore: default_debug_keystore(),
        }
    }
}

impl SigningConfig {
    /// Debug keystore location with `~` expanded; relative paths are taken
    /// from `base`
    #[must_use]
    pub fn debug_keystore_path(&self, base: &Path) -> PathBuf {
        let expanded = PathBuf::from(shellexpand::tilde(&self.debug_keystore).into_owned());
        if expanded.is_absolute() {
            expanded
        } else {
            base.join(expanded)
        }
    }
}

fn default_debug_keystore() -> String {
    "~/.android/debug.keystore".to_string()
}
