//! Start command - start the daemon in the background

use crate::client::{DaemonClient, START_MESSAGE};
use crate::config::{Config, Home};
use crate::error::JGrabResult;
use crate::ui::{self, UiContext};

/// Execute the start command
pub async fn execute(home: &Home, config: &Config) -> JGrabResult<()> {
    let ctx = UiContext::detect();
    let client = DaemonClient::new(home, &config.daemon);

    if client.is_running().await {
        ui::step_info(
            &ctx,
            &format!("JGrab daemon already running at {}", client.address()),
        );
        return Ok(());
    }

    let mut stdout = tokio::io::stdout();
    client.send_retrying(START_MESSAGE, &mut stdout, &ctx).await?;

    ui::step_ok(
        &ctx,
        &format!("JGrab daemon running at {}", client.address()),
    );
    Ok(())
}
