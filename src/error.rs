//! Error types for JGrab
//!
//! All modules use `JGrabResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for JGrab operations
pub type JGrabResult<T> = Result<T, JGrabError>;

/// All errors that can occur in JGrab
#[derive(Error, Debug)]
pub enum JGrabError {
    // Input errors
    #[error("Bad dependency declaration (not of the form group:module[:version]): {0}")]
    InvalidDependency(String),

    #[error("no snippet provided to execute")]
    EmptySnippet,

    #[error("File does not exist: {0}")]
    FileNotFound(PathBuf),

    #[error("Not a file: {0}. JGrab can only run a single Java file or a Java snippet")]
    NotAFile(PathBuf),

    // Resolution errors
    #[error("Artifact not found in any repository: {0}")]
    ArtifactNotFound(String),

    #[error("Unable to resolve {dependency}: {reason}")]
    Resolution { dependency: String, reason: String },

    #[error("HTTP request to {url} failed: {reason}")]
    Http { url: String, reason: String },

    // Execution errors
    #[error("Java code compilation failed")]
    Compilation,

    #[error("Program exited with code {0}")]
    ProgramFailed(i32),

    #[error("Java not found: {0}")]
    JavaNotFound(String),

    #[error("Unable to build execution context: {0}")]
    Context(String),

    // Daemon errors
    #[error("Unable to bind daemon to {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write session token {path}: {source}")]
    TokenWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read session token {path}: {source}")]
    TokenRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JGrab daemon is not running at {0}")]
    DaemonNotRunning(String),

    #[error("Unable to start JGrab daemon: {0}")]
    DaemonStart(String),

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Process errors
    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl JGrabError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::DaemonNotRunning(_) | Self::Http { .. })
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::DaemonNotRunning(_) => Some("Run: jgrab start"),
            Self::JavaNotFound(_) => {
                Some("Set the JAVA_HOME environment variable to point to a valid Java SDK directory")
            }
            Self::Bind { .. } => Some("Make sure the daemon port is not already bound"),
            Self::InvalidDependency(_) => Some("Declare dependencies as: // #jgrab group:module[:version]"),
            _ => None,
        }
    }
}
