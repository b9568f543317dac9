//! Daemon command - serve requests in the foreground

use super::local_backends;
use crate::config::{Config, Home};
use crate::daemon;
use crate::error::JGrabResult;
use crate::ui::{self, UiContext};
use std::sync::Arc;

/// Execute the daemon command
pub async fn execute(home: &Home, config: &Config) -> JGrabResult<()> {
    let ctx = UiContext::detect();
    let (resolver, executor) = local_backends(home, config);

    ui::step_info(&ctx, "Starting JGrab daemon");
    ui::key_value(&ctx, "address", &config.daemon.address());
    ui::key_value(&ctx, "home", &home.dir().display().to_string());
    ui::key_value(&ctx, "java", &executor.java().display().to_string());
    ui::key_value(
        &ctx,
        "repositories",
        &config.resolver.repositories.join(", "),
    );

    daemon::run(home, config, Arc::new(resolver), Arc::new(executor)).await
}
