//! Configuration schema for JGrab
//!
//! Configuration is stored at `~/.jgrab/config.toml`

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default TCP port of the daemon
pub const DEFAULT_PORT: u16 = 5002;

/// Maven Central
pub const MAVEN_CENTRAL: &str = "https://repo1.maven.org/maven2";

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Daemon settings
    pub daemon: DaemonConfig,

    /// Dependency resolution settings
    pub resolver: ResolverConfig,

    /// Java toolchain settings
    pub executor: ExecutorConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// Daemon configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    /// Address the daemon binds and clients connect to
    pub host: String,

    /// TCP port
    pub port: u16,

    /// How often the dependency cache is written to disk
    pub save_interval_secs: u64,

    /// Connection attempts while waiting for a freshly started daemon
    pub connect_retries: u32,
}

impl DaemonConfig {
    /// `host:port`
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn save_interval(&self) -> Duration {
        Duration::from_secs(self.save_interval_secs.max(1))
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            save_interval_secs: 3600,
            connect_retries: 5,
        }
    }
}

/// Dependency resolver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Remote Maven repositories, tried in order
    pub repositories: Vec<String>,

    /// Local Maven repository (defaults to `~/.m2/repository`)
    pub local_repository: Option<PathBuf>,

    /// Never touch the network
    pub offline: bool,

    /// HTTP timeout per request
    pub timeout_secs: u64,
}

impl ResolverConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Configured local repository or the conventional one under the user's home
    pub fn local_repository(&self) -> Option<PathBuf> {
        self.local_repository
            .clone()
            .or_else(|| dirs::home_dir().map(|home| home.join(".m2").join("repository")))
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            repositories: vec![MAVEN_CENTRAL.to_string()],
            local_repository: None,
            offline: false,
            timeout_secs: 60,
        }
    }
}

/// Java toolchain configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// JDK directory; falls back to `JAVA_HOME`, then `PATH`
    pub java_home: Option<PathBuf>,
}
