//! JGrab daemon
//!
//! A TCP server that runs code on behalf of clients. Connections are handled
//! one at a time, each to completion, before the next one is accepted.
//!
//! # Protocol
//!
//! 1. The client sends the session token as the first line.
//! 2. It then sends the request body and half-closes the connection.
//! 3. The daemon streams back whatever the request produces and closes.
//!
//! A wrong token gets a single error line and the connection is closed.

pub mod request;
pub mod token;

pub use request::{Request, NO_INPUT_MESSAGE};
pub use token::SessionToken;

use crate::cache::PersistentCache;
use crate::config::{Config, Home};
use crate::error::{JGrabError, JGrabResult};
use crate::executor::Executor;
use crate::resolver::Resolver;
use crate::runner::Runner;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, trace, warn};

pub use crate::config::schema::DEFAULT_PORT;

/// Line sent back before the daemon stops
pub const STOPPED_MESSAGE: &str = "=== JGrab Daemon stopped ===";

/// Line sent back on a token mismatch
pub const UNAUTHORIZED_MESSAGE: &str = "ERROR: unauthorized request (invalid session token)";

const DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Whether the accept loop keeps going after a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

/// TCP daemon serving run requests
pub struct Daemon {
    listener: TcpListener,
    token: SessionToken,
    runner: Arc<Runner>,
}

impl Daemon {
    /// Bind the daemon's listening socket
    pub async fn bind(addr: &str, token: SessionToken, runner: Arc<Runner>) -> JGrabResult<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| JGrabError::Bind {
                addr: addr.to_string(),
                source: e,
            })?;

        Ok(Self {
            listener,
            token,
            runner,
        })
    }

    pub fn local_addr(&self) -> JGrabResult<SocketAddr> {
        self.listener
            .local_addr()
            .map_err(|e| JGrabError::io("reading daemon address", e))
    }

    /// Accept and handle connections until a stop request arrives
    pub async fn serve(&self) -> JGrabResult<()> {
        info!("JGrab daemon accepting connections");

        loop {
            let (stream, peer) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    continue;
                }
            };

            debug!(%peer, "Client connected");

            match self.handle_client(stream).await {
                Ok(Flow::Stop) => break,
                Ok(Flow::Continue) => {}
                Err(e) => warn!("Problem handling client message: {}", e),
            }
        }

        info!("JGrab daemon stopped");
        Ok(())
    }

    async fn handle_client(&self, stream: TcpStream) -> std::io::Result<Flow> {
        let (reader, mut writer) = stream.into_split();
        let mut reader = BufReader::new(reader);

        let mut token_line = String::new();
        if reader.read_line(&mut token_line).await? == 0 {
            trace!("Connection closed without a token");
            return Ok(Flow::Continue);
        }

        if !self.token.matches(&token_line) {
            warn!("Rejected request with invalid session token");
            write_line(&mut writer, UNAUTHORIZED_MESSAGE).await?;
            writer.shutdown().await?;
            // unread input would turn the close into a reset
            let _ = tokio::time::timeout(
                DRAIN_TIMEOUT,
                tokio::io::copy(&mut reader, &mut tokio::io::sink()),
            )
            .await;
            return Ok(Flow::Continue);
        }

        let mut body = Vec::new();
        reader.read_to_end(&mut body).await?;
        let body = String::from_utf8_lossy(&body);

        let flow = self.dispatch(Request::parse(&body), &mut writer).await?;

        match close(&mut writer).await {
            Ok(()) => Ok(flow),
            Err(e) if flow == Flow::Stop => {
                debug!("Stop confirmation not delivered: {}", e);
                Ok(Flow::Stop)
            }
            Err(e) => Err(e),
        }
    }

    async fn dispatch(
        &self,
        request: Request,
        out: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> std::io::Result<Flow> {
        match request {
            Request::Stop => {
                info!("--stop option received, stopping JGrab Daemon");
                if let Err(e) = write_line(out, STOPPED_MESSAGE).await {
                    debug!("Stop confirmation not delivered: {}", e);
                }
                return Ok(Flow::Stop);
            }
            Request::PrintVersion => {
                info!("--version option received");
                if let Err(e) = self.runner.write_version(out).await {
                    write_line(out, &format!("ERROR: {}", e)).await?;
                }
            }
            Request::NoOp { message } => {
                write_line(out, &message).await?;
            }
            Request::Execute { code, args } => {
                trace!(
                    "Source code:\n------------------------------------\n{}\n------------------------------------",
                    code
                );
                if let Err(e) = self.runner.run(&code, &args, out).await {
                    debug!("Request failed: {}", e);
                    write_line(out, &format!("ERROR: {}", e)).await?;
                }
            }
        }

        Ok(Flow::Continue)
    }
}

async fn close(writer: &mut (dyn AsyncWrite + Unpin + Send)) -> std::io::Result<()> {
    writer.flush().await?;
    writer.shutdown().await
}

async fn write_line(out: &mut (dyn AsyncWrite + Unpin + Send), line: &str) -> std::io::Result<()> {
    out.write_all(line.as_bytes()).await?;
    out.write_all(b"\n").await?;
    out.flush().await
}

/// Start a daemon in the current process and serve until stopped.
///
/// Binds, then writes a fresh session token, pre-builds cached execution
/// contexts and saves the dependency cache periodically and on exit.
pub async fn run(
    home: &Home,
    config: &Config,
    resolver: Arc<dyn Resolver>,
    executor: Arc<dyn Executor>,
) -> JGrabResult<()> {
    home.ensure_exists().await?;

    let cache = Arc::new(PersistentCache::new(home.cache_path()));
    let runner = Arc::new(Runner::new(Arc::clone(&cache), resolver, executor));

    // a daemon already bound to the port keeps its token
    let token = SessionToken::generate();
    let daemon = Daemon::bind(&config.daemon.address(), token.clone(), Arc::clone(&runner)).await?;
    token.write_to(&home.token_path()).await?;
    info!("JGrab daemon listening on {}", daemon.local_addr()?);

    runner.prewarm().await;

    let saver = tokio::spawn(save_periodically(
        Arc::clone(&cache),
        config.daemon.save_interval(),
    ));

    let result = tokio::select! {
        result = daemon.serve() => result,
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
            Ok(())
        }
    };

    saver.abort();
    save_cache(&cache).await;

    result
}

async fn save_periodically(cache: Arc<PersistentCache>, period: Duration) {
    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    loop {
        ticker.tick().await;
        save_cache(&cache).await;
    }
}

async fn save_cache(cache: &PersistentCache) {
    if let Err(e) = cache.save().await {
        warn!("Failed to save dependencies cache: {}", e);
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Unable to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Unable to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
