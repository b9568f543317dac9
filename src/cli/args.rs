//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// JGrab - run Java code without a build system
///
/// Runs single Java files and snippets through a background daemon,
/// fetching the dependencies they declare with `// #jgrab group:module:version`.
#[derive(Parser, Debug)]
#[command(name = "jgrab")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// JGrab home directory (defaults to ~/.jgrab)
    #[arg(long, global = true, env = "JGRAB_HOME")]
    pub home: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a Java file (reads standard input when no file is given)
    Run(RunArgs),

    /// Evaluate a Java snippet
    Eval(EvalArgs),

    /// Run the daemon in the foreground
    Daemon,

    /// Start the daemon in the background
    Start,

    /// Stop the running daemon
    Stop,

    /// Show client, daemon and Java versions
    Version,

    /// Show or initialize configuration
    Config(ConfigArgs),
}

/// Arguments for the run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Run in this process instead of through the daemon
    #[arg(long)]
    pub no_daemon: bool,

    /// Java source file
    pub file: Option<PathBuf>,

    /// Arguments passed to the program's main method
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

/// Arguments for the eval command
#[derive(Parser, Debug)]
pub struct EvalArgs {
    /// Run in this process instead of through the daemon
    #[arg(long)]
    pub no_daemon: bool,

    /// Java statements or expression, joined with spaces
    #[arg(required = true, num_args = 1.., allow_hyphen_values = true)]
    pub snippet: Vec<String>,
}

impl EvalArgs {
    pub fn snippet(&self) -> String {
        self.snippet.join(" ")
    }
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_run_with_args() {
        let cli = Cli::parse_from(["jgrab", "run", "Hello.java", "a", "-b", "--c"]);
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.file, Some(PathBuf::from("Hello.java")));
                assert_eq!(args.args, vec!["a", "-b", "--c"]);
                assert!(!args.no_daemon);
            }
            _ => panic!("expected Run command"),
        }
    }

    #[test]
    fn cli_parses_run_from_stdin() {
        let cli = Cli::parse_from(["jgrab", "run", "--no-daemon"]);
        match cli.command {
            Commands::Run(args) => {
                assert!(args.file.is_none());
                assert!(args.args.is_empty());
                assert!(args.no_daemon);
            }
            _ => panic!("expected Run command"),
        }
    }

    #[test]
    fn cli_parses_eval() {
        let cli = Cli::parse_from(["jgrab", "eval", "1", "+", "1"]);
        match cli.command {
            Commands::Eval(args) => assert_eq!(args.snippet(), "1 + 1"),
            _ => panic!("expected Eval command"),
        }
    }

    #[test]
    fn eval_requires_snippet() {
        assert!(Cli::try_parse_from(["jgrab", "eval"]).is_err());
    }

    #[test]
    fn cli_parses_daemon_commands() {
        assert!(matches!(
            Cli::parse_from(["jgrab", "daemon"]).command,
            Commands::Daemon
        ));
        assert!(matches!(
            Cli::parse_from(["jgrab", "start"]).command,
            Commands::Start
        ));
        assert!(matches!(
            Cli::parse_from(["jgrab", "stop"]).command,
            Commands::Stop
        ));
        assert!(matches!(
            Cli::parse_from(["jgrab", "version"]).command,
            Commands::Version
        ));
    }

    #[test]
    fn cli_parses_global_flags() {
        let cli = Cli::parse_from(["jgrab", "stop", "-vv", "--home", "/tmp/jg"]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.home, Some(PathBuf::from("/tmp/jg")));
    }

    #[test]
    fn cli_parses_config_init() {
        let cli = Cli::parse_from(["jgrab", "config", "init", "--force"]);
        match cli.command {
            Commands::Config(args) => {
                assert!(matches!(args.action, Some(ConfigAction::Init { force: true })));
            }
            _ => panic!("expected Config command"),
        }
    }
}
