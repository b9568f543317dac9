//! Dependency resolution
//!
//! A [`Resolver`] turns one dependency into the local artifact files it
//! needs. [`resolve_all`] does this for a whole set.

pub mod maven;

pub use maven::MavenResolver;

use crate::dependency::{Dependency, DependencySet};
use crate::error::JGrabResult;
use async_trait::async_trait;
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::debug;

/// Fetches artifacts for a dependency
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Local files providing `dependency`
    async fn resolve(&self, dependency: &Dependency) -> JGrabResult<Vec<PathBuf>>;

    /// Human-readable resolver name
    fn name(&self) -> &'static str;
}

/// Resolve every dependency of `dependencies` in canonical order.
///
/// Artifacts are concatenated and duplicates dropped, keeping the first
/// occurrence. The first failure aborts the whole resolution.
pub async fn resolve_all(
    resolver: &dyn Resolver,
    dependencies: &DependencySet,
) -> JGrabResult<Vec<PathBuf>> {
    let mut seen = HashSet::new();
    let mut artifacts = Vec::new();

    for dependency in dependencies {
        debug!("Resolving {} with {}", dependency, resolver.name());
        for artifact in resolver.resolve(dependency).await? {
            if seen.insert(artifact.clone()) {
                artifacts.push(artifact);
            }
        }
    }

    Ok(artifacts)
}
