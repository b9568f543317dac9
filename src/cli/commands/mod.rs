//! CLI command implementations

pub mod config;
pub mod daemon;
pub mod eval;
pub mod run;
pub mod start;
pub mod stop;
pub mod version;

pub use config::execute as config;
pub use daemon::execute as daemon;
pub use eval::execute as eval;
pub use run::execute as run;
pub use start::execute as start;
pub use stop::execute as stop;
pub use version::execute as version;

use crate::cache::PersistentCache;
use crate::config::{Config, Home};
use crate::error::JGrabResult;
use crate::executor::JavaExecutor;
use crate::resolver::MavenResolver;
use crate::runner::Runner;
use crate::source::SourceCode;
use std::sync::Arc;
use tracing::warn;

/// Resolver and executor configured for this machine
pub(crate) fn local_backends(home: &Home, config: &Config) -> (MavenResolver, JavaExecutor) {
    let resolver = MavenResolver::from_config(&config.resolver, home.artifacts_dir());
    let executor = JavaExecutor::new(config.executor.java_home.as_deref());
    (resolver, executor)
}

/// Run code in this process, sharing the daemon's dependency cache file
pub(crate) async fn run_in_process(
    home: &Home,
    config: &Config,
    code: &SourceCode,
    args: &[String],
) -> JGrabResult<()> {
    home.ensure_exists().await?;

    let (resolver, executor) = local_backends(home, config);
    let cache = Arc::new(PersistentCache::new(home.cache_path()));
    let runner = Runner::new(Arc::clone(&cache), Arc::new(resolver), Arc::new(executor));

    let mut stdout = tokio::io::stdout();
    let result = runner.run(code, args, &mut stdout).await;

    if let Err(e) = cache.save().await {
        warn!("Failed to save dependencies cache: {}", e);
    }
    result
}
