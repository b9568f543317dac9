//! Resolved classpaths
//!
//! A `Classpath` binds a dependency set, its fingerprint and the local
//! artifact files it resolved to. Two classpaths are equal when their
//! fingerprints are.

use crate::dependency::DependencySet;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

/// Separator used to join artifact paths (the host's path-list separator)
pub const PATH_SEPARATOR: char = if cfg!(windows) { ';' } else { ':' };

static EMPTY: OnceLock<Arc<Classpath>> = OnceLock::new();

/// Immutable resolved classpath
#[derive(Debug, Clone)]
pub struct Classpath {
    dependencies: DependencySet,
    artifacts: Vec<PathBuf>,
    fingerprint: String,
}

impl Classpath {
    pub fn new(dependencies: DependencySet, artifacts: Vec<PathBuf>) -> Self {
        let fingerprint = dependencies.fingerprint();
        Self::with_fingerprint(dependencies, artifacts, fingerprint)
    }

    /// Build a classpath whose fingerprint was already computed
    pub(crate) fn with_fingerprint(
        dependencies: DependencySet,
        artifacts: Vec<PathBuf>,
        fingerprint: String,
    ) -> Self {
        Self {
            dependencies,
            artifacts,
            fingerprint,
        }
    }

    /// The shared classpath for code without dependencies
    pub fn empty() -> Arc<Classpath> {
        EMPTY
            .get_or_init(|| Arc::new(Classpath::new(DependencySet::new(), Vec::new())))
            .clone()
    }

    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }

    pub fn dependencies(&self) -> &DependencySet {
        &self.dependencies
    }

    pub fn artifacts(&self) -> &[PathBuf] {
        &self.artifacts
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Artifact paths joined with `PATH_SEPARATOR`
    pub fn joined_artifacts(&self) -> String {
        self.artifacts
            .iter()
            .map(|p| absolute(p).display().to_string())
            .collect::<Vec<_>>()
            .join(&PATH_SEPARATOR.to_string())
    }
}

impl PartialEq for Classpath {
    fn eq(&self, other: &Self) -> bool {
        self.fingerprint == other.fingerprint
    }
}

impl Eq for Classpath {}

impl Hash for Classpath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.fingerprint.hash(state);
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
