//! Maven repository resolver
//!
//! Resolves direct artifacts only. Lookup order for a pinned version:
//!
//! 1. the local Maven repository
//! 2. jars previously downloaded into the JGrab artifacts directory
//! 3. each remote repository in turn
//!
//! A `latest` version is first pinned using the remote
//! `maven-metadata.xml`. Offline mode never touches the network.

use crate::config::schema::ResolverConfig;
use crate::dependency::Dependency;
use crate::error::{JGrabError, JGrabResult};
use crate::resolver::Resolver;
use async_trait::async_trait;
use regex::Regex;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, info, warn};

static RELEASE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<release>\s*([^<\s]+)\s*</release>").expect("valid regex"));

static LATEST_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<latest>\s*([^<\s]+)\s*</latest>").expect("valid regex"));

static VERSION_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<version>\s*([^<\s]+)\s*</version>").expect("valid regex"));

/// Resolver backed by Maven-layout repositories
#[derive(Clone)]
pub struct MavenResolver {
    repositories: Vec<String>,
    local_repository: Option<PathBuf>,
    artifacts_dir: PathBuf,
    offline: bool,
    agent: ureq::Agent,
}

impl MavenResolver {
    /// Resolver downloading into `artifacts_dir` from `repositories`
    pub fn new(repositories: Vec<String>, artifacts_dir: impl Into<PathBuf>) -> Self {
        Self {
            repositories: repositories
                .into_iter()
                .map(|r| r.trim_end_matches('/').to_string())
                .collect(),
            local_repository: None,
            artifacts_dir: artifacts_dir.into(),
            offline: false,
            agent: agent(Duration::from_secs(60)),
        }
    }

    pub fn from_config(config: &ResolverConfig, artifacts_dir: impl Into<PathBuf>) -> Self {
        Self::new(config.repositories.clone(), artifacts_dir)
            .with_local_repository(config.local_repository())
            .with_offline(config.offline)
            .with_timeout(config.timeout())
    }

    pub fn with_local_repository(mut self, local_repository: Option<PathBuf>) -> Self {
        self.local_repository = local_repository;
        self
    }

    pub fn with_offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.agent = agent(timeout);
        self
    }

    fn resolve_blocking(&self, dependency: &Dependency) -> JGrabResult<Vec<PathBuf>> {
        let pinned = if dependency.is_latest() {
            let version = self.latest_version(dependency)?;
            info!("Resolved {} to version {}", dependency, version);
            dependency.with_version(version)
        } else {
            dependency.clone()
        };

        if let Some(local) = self.local_jar(&pinned) {
            debug!("Using local repository artifact {}", local.display());
            return Ok(vec![local]);
        }

        let target = self.cached_jar_path(&pinned);
        if target.is_file() {
            debug!("Using previously downloaded artifact {}", target.display());
            return Ok(vec![target]);
        }

        if self.offline {
            return Err(JGrabError::ArtifactNotFound(pinned.to_string()));
        }

        let mut last_error = None;
        for repository in &self.repositories {
            let url = artifact_url(repository, &pinned);
            match self.download(&url, &target) {
                Ok(true) => {
                    info!("Downloaded {}", url);
                    return Ok(vec![target]);
                }
                Ok(false) => debug!("{} not found in {}", pinned, repository),
                Err(e) if e.is_retryable() => {
                    warn!("{}, trying next repository", e);
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| JGrabError::ArtifactNotFound(pinned.to_string())))
    }

    fn latest_version(&self, dependency: &Dependency) -> JGrabResult<String> {
        if self.offline {
            return Err(JGrabError::Resolution {
                dependency: dependency.to_string(),
                reason: "cannot resolve the latest version in offline mode".to_string(),
            });
        }

        let mut last_error = None;
        for repository in &self.repositories {
            let url = metadata_url(repository, dependency);
            debug!("Fetching {}", url);
            let metadata = match self.fetch_text(&url) {
                Ok(Some(metadata)) => metadata,
                Ok(None) => continue,
                Err(e) if e.is_retryable() => {
                    warn!("{}, trying next repository", e);
                    last_error = Some(e);
                    continue;
                }
                Err(e) => return Err(e),
            };
            if let Some(version) = latest_from_metadata(&metadata) {
                return Ok(version);
            }
        }

        Err(last_error.unwrap_or_else(|| JGrabError::ArtifactNotFound(dependency.to_string())))
    }

    fn local_jar(&self, dependency: &Dependency) -> Option<PathBuf> {
        let root = self.local_repository.as_ref()?;
        let jar = root
            .join(group_path(dependency.group()))
            .join(dependency.module())
            .join(dependency.version())
            .join(jar_name(dependency));
        jar.is_file().then_some(jar)
    }

    fn cached_jar_path(&self, dependency: &Dependency) -> PathBuf {
        self.artifacts_dir
            .join(dependency.group())
            .join(jar_name(dependency))
    }

    /// GET `url` as text; `None` on 404
    fn fetch_text(&self, url: &str) -> JGrabResult<Option<String>> {
        match self.agent.get(url).call() {
            Ok(mut response) => response
                .body_mut()
                .read_to_string()
                .map(Some)
                .map_err(|e| http_error(url, e)),
            Err(ureq::Error::StatusCode(404)) => Ok(None),
            Err(e) => Err(http_error(url, e)),
        }
    }

    /// Download `url` into `target`; `false` on 404
    fn download(&self, url: &str, target: &Path) -> JGrabResult<bool> {
        let mut response = match self.agent.get(url).call() {
            Ok(response) => response,
            Err(ureq::Error::StatusCode(404)) => return Ok(false),
            Err(e) => return Err(http_error(url, e)),
        };

        let dir = target
            .parent()
            .ok_or_else(|| JGrabError::Internal(format!("no parent for {}", target.display())))?;
        std::fs::create_dir_all(dir)
            .map_err(|e| JGrabError::io(format!("creating {}", dir.display()), e))?;

        let mut temp = tempfile::NamedTempFile::new_in(dir)
            .map_err(|e| JGrabError::io(format!("creating temp file in {}", dir.display()), e))?;

        let mut reader = response.body_mut().as_reader();
        std::io::copy(&mut reader, &mut temp).map_err(|e| JGrabError::Http {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        temp.flush()
            .map_err(|e| JGrabError::io(format!("writing {}", target.display()), e))?;

        temp.persist(target)
            .map_err(|e| JGrabError::io(format!("moving download to {}", target.display()), e.error))?;

        Ok(true)
    }
}

#[async_trait]
impl Resolver for MavenResolver {
    async fn resolve(&self, dependency: &Dependency) -> JGrabResult<Vec<PathBuf>> {
        let resolver = self.clone();
        let dependency = dependency.clone();
        tokio::task::spawn_blocking(move || resolver.resolve_blocking(&dependency))
            .await
            .map_err(|e| JGrabError::Internal(format!("resolver task failed: {}", e)))?
    }

    fn name(&self) -> &'static str {
        "maven"
    }
}

fn agent(timeout: Duration) -> ureq::Agent {
    ureq::Agent::config_builder()
        .timeout_global(Some(timeout))
        .build()
        .into()
}

fn http_error(url: &str, e: ureq::Error) -> JGrabError {
    JGrabError::Http {
        url: url.to_string(),
        reason: e.to_string(),
    }
}

fn group_path(group: &str) -> String {
    group.replace('.', "/")
}

fn jar_name(dependency: &Dependency) -> String {
    format!("{}-{}.jar", dependency.module(), dependency.version())
}

fn artifact_url(repository: &str, dependency: &Dependency) -> String {
    format!(
        "{}/{}/{}/{}/{}",
        repository,
        group_path(dependency.group()),
        dependency.module(),
        dependency.version(),
        jar_name(dependency)
    )
}

fn metadata_url(repository: &str, dependency: &Dependency) -> String {
    format!(
        "{}/{}/{}/maven-metadata.xml",
        repository,
        group_path(dependency.group()),
        dependency.module()
    )
}

/// Pick the version to use from a `maven-metadata.xml` document
fn latest_from_metadata(metadata: &str) -> Option<String> {
    if let Some(caps) = RELEASE_TAG.captures(metadata) {
        return Some(caps[1].to_string());
    }
    if let Some(caps) = LATEST_TAG.captures(metadata) {
        return Some(caps[1].to_string());
    }

    VERSION_TAG
        .captures_iter(metadata)
        .map(|caps| caps[1].to_string())
        .max_by(|a, b| comparable(a).cmp(&comparable(b)))
}

/// Versions like `1.2` or `20.0` are padded so `semver` accepts them
fn comparable(version: &str) -> semver::Version {
    if let Ok(v) = semver::Version::parse(version) {
        return v;
    }

    let (numbers, suffix) = match version.find(|c: char| !(c.is_ascii_digit() || c == '.')) {
        Some(i) => (&version[..i], &version[i..]),
        None => (version, ""),
    };
    let mut parts: Vec<&str> = numbers.trim_end_matches('.').split('.').collect();
    while parts.len() < 3 {
        parts.push("0");
    }
    let padded = format!("{}{}", parts[..3].join("."), suffix);

    semver::Version::parse(&padded).unwrap_or_else(|_| semver::Version::new(0, 0, 0))
}
