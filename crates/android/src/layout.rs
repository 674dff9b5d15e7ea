//! Project layout and per-project settings
//!
//! The Android project lives inside a larger cross-platform checkout and its
//! build output is redirected to a shared directory outside of it. Each
//! subproject writes to its own directory below that root.

use crate::exclusions::DependencyExclusionSet;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

/// Name of the application module
pub const APP_PROJECT: &str = "app";

/// A Maven repository every project resolves from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Repository {
    /// Google's Maven repository
    Google,
    /// Maven Central
    MavenCentral,
}

impl Repository {
    /// Repositories applied to all projects, in lookup order
    pub const ALL: [Repository; 2] = [Repository::Google, Repository::MavenCentral];

    /// Base URL of the repository
    #[must_use]
    pub fn url(self) -> &'static str {
        match self {
            Repository::Google => "https://dl.google.com/dl/android/maven2/",
            Repository::MavenCentral => "https://repo.maven.apache.org/maven2/",
        }
    }
}

/// Settings applied to one project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSettings {
    /// Project path, e.g. `:` or `:app`
    pub path: String,
    /// Output directory
    pub build_dir: PathBuf,
    /// Repositories, in lookup order
    pub repositories: Vec<Repository>,
    /// Dependency exclusions applied to every configuration
    pub exclusions: DependencyExclusionSet,
}

/// Directory layout of the Android build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    android_dir: PathBuf,
    root_build_dir: PathBuf,
    subprojects: Vec<String>,
}

impl ProjectLayout {
    /// Layout for the project in `android_dir`
    ///
    /// `build_root` is relative to `android_dir` unless absolute. The `app`
    /// module is always present; `subprojects` lists the others.
    #[must_use]
    pub fn new(android_dir: &Path, build_root: &Path, subprojects: &[String]) -> Self {
        let android_dir = normalize(android_dir);
        let root_build_dir = normalize(&android_dir.join(build_root));

        let mut others: Vec<String> = subprojects
            .iter()
            .filter(|name| name.as_str() != APP_PROJECT)
            .cloned()
            .collect();
        others.sort();
        others.dedup();

        Self {
            android_dir,
            root_build_dir,
            subprojects: others,
        }
    }

    /// Android project directory
    #[must_use]
    pub fn android_dir(&self) -> &Path {
        &self.android_dir
    }

    /// Directory of the app module
    #[must_use]
    pub fn app_dir(&self) -> PathBuf {
        self.android_dir.join(APP_PROJECT)
    }

    /// Build directory of the root project
    #[must_use]
    pub fn root_build_dir(&self) -> &Path {
        &self.root_build_dir
    }

    /// Build directory of a subproject
    #[must_use]
    pub fn build_dir_for(&self, project: &str) -> PathBuf {
        self.root_build_dir.join(project)
    }

    /// Subprojects in evaluation order: `app` first, then the rest by name
    #[must_use]
    pub fn evaluation_order(&self) -> Vec<&str> {
        std::iter::once(APP_PROJECT)
            .chain(self.subprojects.iter().map(String::as_str))
            .collect()
    }

    /// Directories removed by the `clean` target
    #[must_use]
    pub fn clean_targets(&self) -> Vec<PathBuf> {
        vec![self.root_build_dir.clone()]
    }

    /// Settings for the root project and every subproject
    #[must_use]
    pub fn projects(&self, exclusions: &DependencyExclusionSet) -> Vec<ProjectSettings> {
        let root = ProjectSettings {
            path: ":".to_string(),
            build_dir: self.root_build_dir.clone(),
            repositories: Repository::ALL.to_vec(),
            exclusions: exclusions.clone(),
        };

        std::iter::once(root)
            .chain(self.evaluation_order().into_iter().map(|name| ProjectSettings {
                path: format!(":{name}"),
                build_dir: self.build_dir_for(name),
                repositories: Repository::ALL.to_vec(),
                exclusions: exclusions.clone(),
            }))
            .collect()
    }
}

/// Lexically resolve `.` and `..` components
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let can_pop = matches!(
                    out.components().next_back(),
                    Some(Component::Normal(_))
                );
                if can_pop {
                    out.pop();
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}
