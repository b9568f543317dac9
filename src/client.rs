//! Client side of the daemon protocol
//!
//! Sends one message per connection: the session token line, then the
//! message, then a half-close. Everything the daemon writes back is copied
//! to the caller's sink until the daemon closes the connection.

use crate::config::schema::DaemonConfig;
use crate::config::Home;
use crate::daemon::request::{SNIPPET_OPTION, STOP_OPTION, VERSION_OPTION};
use crate::daemon::SessionToken;
use crate::error::{JGrabError, JGrabResult};
use crate::ui::{TaskSpinner, UiContext};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::process::{Child, Command};
use tracing::{debug, info};

/// Message starting the daemon without running anything visible
pub const START_MESSAGE: &str = "-e null";

const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Message running a file's contents, passing `args` when there are any
pub fn file_message(contents: &str, args: &[String]) -> String {
    if args.is_empty() {
        contents.to_string()
    } else {
        format!("[{}]\n{}", args.join(" "), contents)
    }
}

/// Message evaluating a snippet
pub fn snippet_message(snippet: &str) -> String {
    format!("{} {}", SNIPPET_OPTION, snippet)
}

pub fn stop_message() -> &'static str {
    STOP_OPTION
}

pub fn version_message() -> &'static str {
    VERSION_OPTION
}

/// Connection details for a local daemon
pub struct DaemonClient {
    address: String,
    token_path: PathBuf,
    home_dir: PathBuf,
    log_path: PathBuf,
    connect_retries: u32,
}

impl DaemonClient {
    pub fn new(home: &Home, config: &DaemonConfig) -> Self {
        Self {
            address: config.address(),
            token_path: home.token_path(),
            home_dir: home.dir().to_path_buf(),
            log_path: home.daemon_log_path(),
            connect_retries: config.connect_retries,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Whether something accepts connections at the daemon address
    pub async fn is_running(&self) -> bool {
        TcpStream::connect(&self.address).await.is_ok()
    }

    /// Send `message` and copy the reply to `out`
    pub async fn send(
        &self,
        message: &str,
        out: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> JGrabResult<()> {
        let stream = TcpStream::connect(&self.address)
            .await
            .map_err(|_| JGrabError::DaemonNotRunning(self.address.clone()))?;

        let token = SessionToken::read_from(&self.token_path).await?;

        let (mut reader, mut writer) = stream.into_split();
        let request = format!("{}\n{}", token, message);
        writer
            .write_all(request.as_bytes())
            .await
            .map_err(|e| JGrabError::io("sending request to daemon", e))?;
        writer
            .shutdown()
            .await
            .map_err(|e| JGrabError::io("sending request to daemon", e))?;

        tokio::io::copy(&mut reader, out)
            .await
            .map_err(|e| JGrabError::io("reading daemon response", e))?;
        out.flush()
            .await
            .map_err(|e| JGrabError::io("writing daemon response", e))
    }

    /// Send `message`, starting a daemon first if none is running
    pub async fn send_retrying(
        &self,
        message: &str,
        out: &mut (dyn AsyncWrite + Unpin + Send),
        ctx: &UiContext,
    ) -> JGrabResult<()> {
        match self.send(message, out).await {
            Err(JGrabError::DaemonNotRunning(_)) => {}
            other => return other,
        }

        let mut spinner = TaskSpinner::new(ctx);
        spinner.start("Starting JGrab daemon...");

        let mut child = match self.spawn_daemon().await {
            Ok(child) => child,
            Err(e) => {
                spinner.stop_error("Unable to start JGrab daemon");
                return Err(e);
            }
        };

        for attempt in 1..=self.connect_retries {
            tokio::time::sleep(RETRY_DELAY).await;

            if let Some(status) = child
                .try_wait()
                .map_err(|e| JGrabError::io("checking daemon process", e))?
            {
                spinner.stop_error("JGrab daemon exited");
                return Err(JGrabError::DaemonStart(format!(
                    "the daemon died prematurely ({}), see {}",
                    status,
                    self.log_path.display()
                )));
            }

            if !self.is_running().await {
                debug!("Daemon not reachable yet (attempt {})", attempt);
                spinner.message(&format!(
                    "Waiting for JGrab daemon ({}/{})...",
                    attempt, self.connect_retries
                ));
                continue;
            }

            spinner.stop("JGrab daemon started");
            return self.send(message, out).await;
        }

        spinner.stop_error("JGrab daemon did not start");
        Err(JGrabError::DaemonStart(format!(
            "no connection after {} attempts. Make sure {} is not already bound",
            self.connect_retries, self.address
        )))
    }

    /// Launch `jgrab daemon` in the background, logging to the home directory
    async fn spawn_daemon(&self) -> JGrabResult<Child> {
        let exe = std::env::current_exe()
            .map_err(|e| JGrabError::io("locating the jgrab executable", e))?;

        tokio::fs::create_dir_all(&self.home_dir)
            .await
            .map_err(|e| JGrabError::io(format!("creating {}", self.home_dir.display()), e))?;

        let log = std::fs::File::create(&self.log_path)
            .map_err(|e| JGrabError::io(format!("creating {}", self.log_path.display()), e))?;
        let log_err = log
            .try_clone()
            .map_err(|e| JGrabError::io(format!("opening {}", self.log_path.display()), e))?;

        let mut cmd = Command::new(&exe);
        cmd.arg("--home")
            .arg(&self.home_dir)
            .arg("daemon")
            .stdin(Stdio::null())
            .stdout(Stdio::from(log))
            .stderr(Stdio::from(log_err));

        // keep terminal signals aimed at the client away from the daemon
        #[cfg(unix)]
        cmd.process_group(0);

        let child = cmd
            .spawn()
            .map_err(|e| JGrabError::command_failed(format!("{} daemon", exe.display()), e))?;

        info!("Daemon started, pid={:?}", child.id());
        Ok(child)
    }
}
