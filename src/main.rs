//! JGrab - run Java code without a build system
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use jgrab::cli::{commands, Cli, Commands};
use jgrab::config::{ConfigManager, Home};
use jgrab::error::JGrabResult;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> JGrabResult<()> {
    let cli = Cli::parse();

    let home = Home::locate(cli.home.as_deref());
    let config = ConfigManager::new(&home).load().await?;

    // 0 = warn, 1 = info, 2 = debug, 3+ = trace; RUST_LOG wins when set
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match cli.verbose {
        0 => EnvFilter::new("jgrab=warn"),
        1 => EnvFilter::new("jgrab=info"),
        2 => EnvFilter::new("jgrab=debug"),
        _ => EnvFilter::new("jgrab=trace"),
    });

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if config.general.log_format == "json" {
        subscriber.json().init();
    } else if matches!(cli.command, Commands::Daemon) {
        subscriber.init();
    } else {
        subscriber.without_time().init();
    }

    jgrab::ui::init_theme();
    debug!("JGrab home: {}", home.dir().display());

    match cli.command {
        Commands::Run(args) => commands::run(args, &home, &config).await,
        Commands::Eval(args) => commands::eval(args, &home, &config).await,
        Commands::Daemon => commands::daemon(&home, &config).await,
        Commands::Start => commands::start(&home, &config).await,
        Commands::Stop => commands::stop(&home, &config).await,
        Commands::Version => commands::version(&home, &config).await,
        Commands::Config(args) => commands::config(args, &home, &config).await,
    }
}
