//! Configuration management for JGrab

pub mod schema;

pub use schema::Config;

use crate::error::{JGrabError, JGrabResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Environment variable overriding the JGrab home directory
pub const HOME_ENV: &str = "JGRAB_HOME";

/// The JGrab home directory and the files kept in it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Home {
    dir: PathBuf,
}

impl Home {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Locate the home: `explicit`, then `JGRAB_HOME`, then `~/.jgrab`
    pub fn locate(explicit: Option<&Path>) -> Self {
        if let Some(dir) = explicit {
            return Self::new(dir);
        }
        if let Some(dir) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
            return Self::new(dir);
        }
        Self::new(
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".jgrab"),
        )
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Session token written by the daemon
    pub fn token_path(&self) -> PathBuf {
        self.dir.join("token")
    }

    /// Persistent dependency cache
    pub fn cache_path(&self) -> PathBuf {
        self.dir.join("deps-cache")
    }

    /// Downloaded jars
    pub fn artifacts_dir(&self) -> PathBuf {
        self.dir.join("artifacts")
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.join("config.toml")
    }

    /// Output of a daemon started in the background
    pub fn daemon_log_path(&self) -> PathBuf {
        self.dir.join("daemon.log")
    }

    /// Create the home directory
    pub async fn ensure_exists(&self) -> JGrabResult<()> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| JGrabError::ConfigDirCreate {
                path: self.dir.clone(),
                source: e,
            })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o700);
            std::fs::set_permissions(&self.dir, perms)
                .map_err(|e| JGrabError::io("setting home dir permissions", e))?;
        }

        Ok(())
    }
}

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Config manager for the `config.toml` in `home`
    pub fn new(home: &Home) -> Self {
        Self {
            config_path: home.config_path(),
        }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Load configuration, using defaults if the file does not exist
    pub async fn load(&self) -> JGrabResult<Config> {
        if !self.config_path.exists() {
            debug!("Config file not found, using defaults");
            return Ok(Config::default());
        }

        self.load_from_file(&self.config_path).await
    }

    /// Load configuration from a specific file
    pub async fn load_from_file(&self, path: &Path) -> JGrabResult<Config> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| JGrabError::io(format!("reading config from {}", path.display()), e))?;

        toml::from_str(&content).map_err(|e| JGrabError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Save configuration to file
    pub async fn save(&self, config: &Config) -> JGrabResult<()> {
        self.ensure_config_dir().await?;

        let content = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, content).await.map_err(|e| {
            JGrabError::io(
                format!("writing config to {}", self.config_path.display()),
                e,
            )
        })?;

        info!("Configuration saved to {}", self.config_path.display());
        Ok(())
    }

    async fn ensure_config_dir(&self) -> JGrabResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| JGrabError::ConfigDirCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }
        Ok(())
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_default_when_missing() {
        let temp = TempDir::new().unwrap();
        let manager = ConfigManager::with_path(temp.path().join("nonexistent.toml"));

        let config = manager.load().await.unwrap();
        assert_eq!(config.daemon.port, schema::DEFAULT_PORT);
    }

    #[tokio::test]
    async fn save_and_load_roundtrip() {
        let temp = TempDir::new().unwrap();
        let manager = ConfigManager::new(&Home::new(temp.path()));

        let mut config = Config::default();
        config.daemon.port = 6123;
        config.resolver.offline = true;

        manager.save(&config).await.unwrap();
        let loaded = manager.load().await.unwrap();

        assert_eq!(loaded.daemon.port, 6123);
        assert!(loaded.resolver.offline);
    }

    #[tokio::test]
    async fn invalid_config_names_the_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "[daemon\nport = ").unwrap();

        let err = ConfigManager::with_path(path.clone()).load().await.unwrap_err();
        match err {
            JGrabError::ConfigInvalid { path: p, .. } => assert_eq!(p, path),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn home_layout() {
        let home = Home::new("/tmp/jg");
        assert_eq!(home.token_path(), PathBuf::from("/tmp/jg/token"));
        assert_eq!(home.cache_path(), PathBuf::from("/tmp/jg/deps-cache"));
        assert_eq!(home.artifacts_dir(), PathBuf::from("/tmp/jg/artifacts"));
        assert_eq!(home.daemon_log_path(), PathBuf::from("/tmp/jg/daemon.log"));
    }

    #[test]
    #[serial]
    fn home_resolution_order() {
        let previous = std::env::var_os(HOME_ENV);
        std::env::set_var(HOME_ENV, "/from/env");

        assert_eq!(Home::locate(Some(Path::new("/explicit"))).dir(), Path::new("/explicit"));
        assert_eq!(Home::locate(None).dir(), Path::new("/from/env"));

        std::env::remove_var(HOME_ENV);
        assert!(Home::locate(None).dir().ends_with(".jgrab"));

        if let Some(previous) = previous {
            std::env::set_var(HOME_ENV, previous);
        }
    }
}
