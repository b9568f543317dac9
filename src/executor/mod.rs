//! Code execution abstraction
//!
//! An [`Executor`] builds reusable execution contexts from artifact lists and
//! runs source code against them. Program output goes to an explicit sink
//! passed to [`Executor::run`], never to the process's own stdout.

pub mod java;

pub use java::JavaExecutor;

use crate::error::{JGrabError, JGrabResult};
use crate::source::SourceCode;
use async_trait::async_trait;
use std::ffi::{OsStr, OsString};
use std::path::PathBuf;
use tokio::io::AsyncWrite;

/// Artifacts made visible to executed code
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    artifacts: Vec<PathBuf>,
    class_path: Option<OsString>,
}

impl ExecutionContext {
    /// Context with no extra artifacts
    pub fn empty() -> Self {
        Self::default()
    }

    /// Validate every artifact and join them into a class path
    pub fn from_artifacts(artifacts: &[PathBuf]) -> JGrabResult<Self> {
        let mut resolved = Vec::with_capacity(artifacts.len());

        for artifact in artifacts {
            if !artifact.is_file() {
                return Err(JGrabError::Context(format!(
                    "artifact is not a file: {}",
                    artifact.display()
                )));
            }
            let absolute = std::path::absolute(artifact).map_err(|e| {
                JGrabError::io(format!("resolving artifact path {}", artifact.display()), e)
            })?;
            resolved.push(absolute);
        }

        let class_path = if resolved.is_empty() {
            None
        } else {
            Some(
                std::env::join_paths(&resolved)
                    .map_err(|e| JGrabError::Context(e.to_string()))?,
            )
        };

        Ok(Self {
            artifacts: resolved,
            class_path,
        })
    }

    pub fn artifacts(&self) -> &[PathBuf] {
        &self.artifacts
    }

    /// Joined class path, `None` for the empty context
    pub fn class_path(&self) -> Option<&OsStr> {
        self.class_path.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}

/// Compiles and runs source code
#[async_trait]
pub trait Executor: Send + Sync {
    /// Build a context exposing `artifacts`. May be slow; callers cache it.
    fn build_context(&self, artifacts: &[PathBuf]) -> JGrabResult<ExecutionContext> {
        ExecutionContext::from_artifacts(artifacts)
    }

    /// Compile and run `code`, writing all of its output to `out`
    async fn run(
        &self,
        code: &SourceCode,
        args: &[String],
        context: &ExecutionContext,
        out: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> JGrabResult<()>;

    /// One line describing the underlying runtime
    async fn runtime_version(&self) -> String;

    /// Human-readable executor name
    fn name(&self) -> &'static str;
}
