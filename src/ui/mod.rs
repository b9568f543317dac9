//! Terminal UI for status messages
//!
//! Program output owns stdout, so everything here writes to stderr. Uses
//! `cliclack` spinners and log lines in an interactive terminal and plain
//! prefixed lines otherwise.
//!
//! # Example
//!
//! ```rust,ignore
//! use jgrab::ui::{self, UiContext, TaskSpinner};
//!
//! let ctx = UiContext::detect();
//!
//! let mut spinner = TaskSpinner::new(&ctx);
//! spinner.start("Starting JGrab daemon...");
//! // ... wait for the daemon ...
//! spinner.stop("Daemon started");
//!
//! ui::step_warn_hint(&ctx, "Daemon is not running", "Run: jgrab start");
//! ```

mod context;
mod output;
mod progress;
mod theme;

pub use context::UiContext;
pub use output::{key_value, step_info, step_ok, step_warn_hint};
pub use progress::TaskSpinner;
pub use theme::{init_theme, JGrabTheme};
