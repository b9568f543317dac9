//! Eval command - evaluate a Java snippet

use super::run_in_process;
use crate::cli::args::EvalArgs;
use crate::client::{snippet_message, DaemonClient};
use crate::config::{Config, Home};
use crate::error::{JGrabError, JGrabResult};
use crate::source::SourceCode;
use crate::ui::UiContext;

/// Execute the eval command
pub async fn execute(args: EvalArgs, home: &Home, config: &Config) -> JGrabResult<()> {
    let snippet = args.snippet();
    let snippet = snippet.trim();
    if snippet.is_empty() {
        return Err(JGrabError::EmptySnippet);
    }

    if args.no_daemon {
        return run_in_process(home, config, &SourceCode::new(snippet), &[]).await;
    }

    let client = DaemonClient::new(home, &config.daemon);
    let mut stdout = tokio::io::stdout();
    client
        .send_retrying(&snippet_message(snippet), &mut stdout, &UiContext::detect())
        .await
}
