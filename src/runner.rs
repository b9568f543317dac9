//! Request execution pipeline
//!
//! Source → declared dependencies → cached classpath → cached execution
//! context → executor. Shared by the daemon and by `--no-daemon` runs.

use crate::cache::{ExecutionContextCache, PersistentCache};
use crate::error::{JGrabError, JGrabResult};
use crate::executor::Executor;
use crate::resolver::{resolve_all, Resolver};
use crate::source::SourceCode;
use std::sync::Arc;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

/// Runs source code with its dependencies
pub struct Runner {
    cache: Arc<PersistentCache>,
    contexts: ExecutionContextCache,
    resolver: Arc<dyn Resolver>,
    executor: Arc<dyn Executor>,
}

impl Runner {
    pub fn new(
        cache: Arc<PersistentCache>,
        resolver: Arc<dyn Resolver>,
        executor: Arc<dyn Executor>,
    ) -> Self {
        Self {
            cache,
            contexts: ExecutionContextCache::new(Arc::clone(&executor)),
            resolver,
            executor,
        }
    }

    pub fn cache(&self) -> &Arc<PersistentCache> {
        &self.cache
    }

    /// Build execution contexts for everything already in the cache file
    pub async fn prewarm(&self) {
        let cached = self.cache.load_cache().await;
        if cached.is_empty() {
            return;
        }

        info!("Pre-building {} execution context(s)", cached.len());
        self.contexts.populate(cached.values()).await;
        debug!("{} execution context(s) ready", self.contexts.len().await);
    }

    /// Resolve `code`'s dependencies and run it, writing its output to `out`
    pub async fn run(
        &self,
        code: &SourceCode,
        args: &[String],
        out: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> JGrabResult<()> {
        let dependencies = code.dependencies()?;
        debug!("Declared dependencies: {}", dependencies);

        let classpath = self
            .cache
            .classpath_of(&dependencies, || {
                resolve_all(self.resolver.as_ref(), &dependencies)
            })
            .await?;

        let context = self.contexts.context_for(&classpath).await?;

        self.executor.run(code, args, &context, out).await
    }

    /// Write the daemon and runtime version lines
    pub async fn write_version(&self, out: &mut (dyn AsyncWrite + Unpin + Send)) -> JGrabResult<()> {
        let text = format!(
            "JGrab Daemon Version: {}\n{}\n",
            env!("CARGO_PKG_VERSION"),
            self.executor.runtime_version().await
        );
        out.write_all(text.as_bytes())
            .await
            .map_err(|e| JGrabError::io("writing version", e))?;
        out.flush()
            .await
            .map_err(|e| JGrabError::io("writing version", e))
    }
}
