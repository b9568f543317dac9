//! Version command - show client, daemon and Java versions

use crate::client::{version_message, DaemonClient};
use crate::config::{Config, Home};
use crate::error::{JGrabError, JGrabResult};
use crate::ui::{self, UiContext};

/// Execute the version command
pub async fn execute(home: &Home, config: &Config) -> JGrabResult<()> {
    println!("JGrab Client Version: {}", env!("CARGO_PKG_VERSION"));

    let client = DaemonClient::new(home, &config.daemon);
    let mut stdout = tokio::io::stdout();

    match client.send(version_message(), &mut stdout).await {
        Err(JGrabError::DaemonNotRunning(addr)) => {
            ui::step_warn_hint(
                &UiContext::detect(),
                &format!("JGrab daemon is not running at {}", addr),
                "Run: jgrab start",
            );
            Ok(())
        }
        other => other,
    }
}
