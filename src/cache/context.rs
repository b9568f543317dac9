//! Execution context cache
//!
//! Building a context can be slow, so each classpath's context is built once
//! and shared. The empty classpath always maps to one constant context.

use crate::cache::flight::FlightMap;
use crate::classpath::Classpath;
use crate::error::{JGrabError, JGrabResult};
use crate::executor::{ExecutionContext, Executor};
use std::sync::Arc;
use tracing::{debug, warn};

/// Fingerprint-keyed cache of execution contexts
pub struct ExecutionContextCache {
    executor: Arc<dyn Executor>,
    contexts: FlightMap<Arc<ExecutionContext>>,
    empty: Arc<ExecutionContext>,
}

impl ExecutionContextCache {
    pub fn new(executor: Arc<dyn Executor>) -> Self {
        Self {
            executor,
            contexts: FlightMap::new(),
            empty: Arc::new(ExecutionContext::empty()),
        }
    }

    /// Context for `classpath`, built at most once per fingerprint
    pub async fn context_for(&self, classpath: &Classpath) -> JGrabResult<Arc<ExecutionContext>> {
        if classpath.is_empty() {
            return Ok(Arc::clone(&self.empty));
        }

        self.contexts
            .get_or_try_init(classpath.fingerprint(), || async {
                debug!("Building execution context for {}", classpath.dependencies());
                let executor = Arc::clone(&self.executor);
                let artifacts = classpath.artifacts().to_vec();
                let context = tokio::task::spawn_blocking(move || executor.build_context(&artifacts))
                    .await
                    .map_err(|e| JGrabError::Internal(format!("context build task failed: {}", e)))??;
                Ok::<_, JGrabError>(Arc::new(context))
            })
            .await
    }

    /// Build contexts ahead of time. Failures are logged and skipped.
    pub async fn populate<'a, I>(&self, classpaths: I)
    where
        I: IntoIterator<Item = &'a Arc<Classpath>>,
    {
        for classpath in classpaths {
            if let Err(e) = self.context_for(classpath).await {
                warn!(
                    "Unable to pre-build execution context for {}: {}",
                    classpath.dependencies(),
                    e
                );
            }
        }
    }

    /// Number of built contexts, not counting the empty one
    pub async fn len(&self) -> usize {
        self.contexts.len().await
    }

    pub async fn is_empty(&self) -> bool {
        self.contexts.is_empty().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dependency::DependencySet;
    use crate::source::SourceCode;
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;
    use tokio::io::AsyncWrite;

    #[derive(Default)]
    struct CountingExecutor {
        builds: AtomicUsize,
    }

    #[async_trait]
    impl Executor for CountingExecutor {
        fn build_context(&self, artifacts: &[PathBuf]) -> JGrabResult<ExecutionContext> {
            self.builds.fetch_add(1, Ordering::SeqCst);
            ExecutionContext::from_artifacts(artifacts)
        }

        async fn run(
            &self,
            _code: &SourceCode,
            _args: &[String],
            _context: &ExecutionContext,
            _out: &mut (dyn AsyncWrite + Unpin + Send),
        ) -> JGrabResult<()> {
            Ok(())
        }

        async fn runtime_version(&self) -> String {
            "counting".to_string()
        }

        fn name(&self) -> &'static str {
            "counting"
        }
    }

    fn classpath(list: &str, artifacts: Vec<PathBuf>) -> Arc<Classpath> {
        Arc::new(Classpath::new(DependencySet::parse_list(list).unwrap(), artifacts))
    }

    #[tokio::test]
    async fn empty_classpath_uses_constant_context() {
        let executor = Arc::new(CountingExecutor::default());
        let cache = ExecutionContextCache::new(executor.clone());

        let a = cache.context_for(&Classpath::empty()).await.unwrap();
        let b = cache.context_for(&Classpath::empty()).await.unwrap();

        assert!(Arc::ptr_eq(&a, &b));
        assert!(a.is_empty());
        assert_eq!(executor.builds.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn context_is_built_once_per_fingerprint() {
        let dir = TempDir::new().unwrap();
        let jar = dir.path().join("lib.jar");
        std::fs::write(&jar, b"").unwrap();

        let executor = Arc::new(CountingExecutor::default());
        let cache = ExecutionContextCache::new(executor.clone());
        let cp = classpath("g:m:1", vec![jar.clone()]);

        let first = cache.context_for(&cp).await.unwrap();
        let second = cache.context_for(&cp).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.artifacts().len(), 1);
        assert_eq!(executor.builds.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn populate_skips_failures() {
        let dir = TempDir::new().unwrap();
        let jar = dir.path().join("ok.jar");
        std::fs::write(&jar, b"").unwrap();

        let executor = Arc::new(CountingExecutor::default());
        let cache = ExecutionContextCache::new(executor.clone());
        let good = classpath("g:ok:1", vec![jar]);
        let bad = classpath("g:bad:1", vec![dir.path().join("missing.jar")]);

        cache.populate([&bad, &good]).await;

        assert_eq!(cache.len().await, 1);
        assert_eq!(executor.builds.load(Ordering::SeqCst), 2);
    }
}
