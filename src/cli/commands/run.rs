//! Run command - run a Java file or standard input

use super::run_in_process;
use crate::cli::args::RunArgs;
use crate::client::{file_message, DaemonClient};
use crate::config::{Config, Home};
use crate::error::{JGrabError, JGrabResult};
use crate::source::SourceCode;
use crate::ui::UiContext;
use tokio::io::AsyncReadExt;
use tracing::debug;

/// Execute the run command
pub async fn execute(args: RunArgs, home: &Home, config: &Config) -> JGrabResult<()> {
    let code = match &args.file {
        Some(path) => SourceCode::from_file(path).await?,
        None => {
            debug!("Reading source code from stdin");
            SourceCode::new(read_stdin().await?)
        }
    };

    if args.no_daemon {
        return run_in_process(home, config, &code, &args.args).await;
    }

    let client = DaemonClient::new(home, &config.daemon);
    let message = file_message(code.code(), &args.args);
    let mut stdout = tokio::io::stdout();
    client
        .send_retrying(&message, &mut stdout, &UiContext::detect())
        .await
}

async fn read_stdin() -> JGrabResult<String> {
    let mut input = String::new();
    tokio::io::stdin()
        .read_to_string(&mut input)
        .await
        .map_err(|e| JGrabError::io("reading standard input", e))?;
    Ok(input)
}
