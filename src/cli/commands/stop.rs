//! Stop command - stop the running daemon

use crate::client::{stop_message, DaemonClient};
use crate::config::{Config, Home};
use crate::error::{JGrabError, JGrabResult};

/// Execute the stop command
pub async fn execute(home: &Home, config: &Config) -> JGrabResult<()> {
    let client = DaemonClient::new(home, &config.daemon);
    let mut stdout = tokio::io::stdout();

    match client.send(stop_message(), &mut stdout).await {
        Err(JGrabError::DaemonNotRunning(_)) => {
            println!("daemon is not running");
            Ok(())
        }
        other => other,
    }
}
