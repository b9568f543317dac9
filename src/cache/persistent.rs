//! Persistent dependency cache
//!
//! Maps set fingerprints to resolved classpaths and persists them as one
//! text line per classpath:
//!
//! ```text
//! group:module:version,group:module:version /abs/a.jar:/abs/b.jar
//! ```
//!
//! The backing file is read lazily on the first non-empty lookup and is only
//! rewritten by an explicit [`PersistentCache::save`].

use crate::cache::flight::FlightMap;
use crate::classpath::{Classpath, PATH_SEPARATOR};
use crate::dependency::DependencySet;
use crate::error::{JGrabError, JGrabResult};
use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// Fingerprint-keyed cache of resolved classpaths backed by a text file
pub struct PersistentCache {
    cache_file: PathBuf,
    loaded: OnceCell<()>,
    entries: FlightMap<Arc<Classpath>>,
}

impl PersistentCache {
    pub fn new(cache_file: impl Into<PathBuf>) -> Self {
        Self {
            cache_file: cache_file.into(),
            loaded: OnceCell::new(),
            entries: FlightMap::new(),
        }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.cache_file
    }

    /// Whether the backing file has been merged into memory
    pub fn is_loaded(&self) -> bool {
        self.loaded.initialized()
    }

    /// Get the classpath for `dependencies`, calling `resolve` on a miss.
    ///
    /// An empty set returns [`Classpath::empty`] without touching the disk.
    /// Concurrent misses for the same set call `resolve` once; a failed
    /// resolution is returned to its caller and nothing is cached.
    pub async fn classpath_of<F, Fut>(
        &self,
        dependencies: &DependencySet,
        resolve: F,
    ) -> JGrabResult<Arc<Classpath>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = JGrabResult<Vec<PathBuf>>>,
    {
        if dependencies.is_empty() {
            return Ok(Classpath::empty());
        }

        self.ensure_loaded().await;

        let fingerprint = dependencies.fingerprint();
        self.entries
            .get_or_try_init(&fingerprint, || async {
                debug!(%fingerprint, "Resolving dependencies {}", dependencies);
                let artifacts = resolve().await?;
                info!("Resolved {} into {} artifacts", dependencies, artifacts.len());
                Ok::<_, JGrabError>(Arc::new(Classpath::with_fingerprint(
                    dependencies.clone(),
                    artifacts,
                    fingerprint.clone(),
                )))
            })
            .await
    }

    async fn ensure_loaded(&self) {
        self.loaded
            .get_or_init(|| async {
                for (fingerprint, classpath) in self.load_cache().await {
                    self.entries.insert(fingerprint, classpath).await;
                }
            })
            .await;
    }

    /// Read the backing file into a fresh map.
    ///
    /// Unreadable files yield an empty map. Malformed lines and lines whose
    /// artifacts no longer exist are skipped individually.
    pub async fn load_cache(&self) -> HashMap<String, Arc<Classpath>> {
        debug!("Loading dependencies cache from {}", self.cache_file.display());

        let content = match fs::read_to_string(&self.cache_file).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No dependencies cache at {}", self.cache_file.display());
                return HashMap::new();
            }
            Err(e) => {
                warn!("Unable to read dependencies cache entries: {}", e);
                return HashMap::new();
            }
        };

        let mut cache = HashMap::new();
        for line in content.lines() {
            if let Some(classpath) = parse_entry(line) {
                cache.insert(classpath.fingerprint().to_string(), Arc::new(classpath));
            }
        }

        debug!("Loaded {} cache entries", cache.len());
        cache
    }

    /// Persist every resolved classpath.
    ///
    /// Does nothing if the cache was never loaded. Removes the backing file
    /// when the cache is empty. Otherwise writes a temp file next to the
    /// backing file and renames it over the original.
    pub async fn save(&self) -> JGrabResult<()> {
        if !self.is_loaded() {
            debug!("The cache was not loaded, will not save the current cache");
            return Ok(());
        }

        let mut classpaths = self.entries.values().await;

        if classpaths.is_empty() {
            debug!("The cache is empty, will delete the cache file");
            return match fs::remove_file(&self.cache_file).await {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(JGrabError::io(
                    format!("deleting cache file {}", self.cache_file.display()),
                    e,
                )),
            };
        }

        classpaths.sort_by_key(|c| c.dependencies().notation());

        let dir = match self.cache_file.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| JGrabError::io(format!("creating cache directory {}", dir.display()), e))?;

        let temp_file = dir.join(format!("temp-cache-{}", std::process::id()));
        let mut contents = String::new();
        for classpath in &classpaths {
            contents.push_str(&format_entry(classpath));
            contents.push('\n');
        }

        let mut file = fs::File::create(&temp_file)
            .await
            .map_err(|e| JGrabError::io(format!("creating {}", temp_file.display()), e))?;
        file.write_all(contents.as_bytes())
            .await
            .map_err(|e| JGrabError::io(format!("writing {}", temp_file.display()), e))?;
        file.sync_all()
            .await
            .map_err(|e| JGrabError::io(format!("syncing {}", temp_file.display()), e))?;
        drop(file);

        match fs::rename(&temp_file, &self.cache_file).await {
            Ok(()) => {
                info!("Dependencies cache saved at {}", self.cache_file.display());
            }
            Err(e) => {
                warn!(
                    "Unable to save cache to {} ({}). Cache was saved at {}",
                    self.cache_file.display(),
                    e,
                    temp_file.display()
                );
            }
        }

        Ok(())
    }
}

fn format_entry(classpath: &Classpath) -> String {
    format!(
        "{} {}",
        classpath.dependencies().notation(),
        classpath.joined_artifacts()
    )
}

fn parse_entry(line: &str) -> Option<Classpath> {
    let parts: Vec<&str> = line.split(' ').collect();

    if parts.len() != 2 {
        if !line.trim().is_empty() {
            info!("Ignoring cache entry because it has an unexpected format: {}", line);
        }
        return None;
    }

    let dependencies = match DependencySet::parse_list(parts[0]) {
        Ok(deps) => deps,
        Err(e) => {
            warn!("Invalid cache entry: {} ({})", line, e);
            return None;
        }
    };

    let artifacts: Vec<PathBuf> = parts[1].split(PATH_SEPARATOR).map(PathBuf::from).collect();

    if !artifacts.iter().all(|a| a.is_file()) {
        info!("Ignoring cache entry because not all lib files exist: {}", dependencies);
        return None;
    }

    debug!("Loading dependency entry from cache: {} -> {:?}", dependencies, artifacts);
    Some(Classpath::new(dependencies, artifacts))
}
