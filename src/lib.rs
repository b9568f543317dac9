//! JGrab - run Java code without a build system
//!
//! A background daemon receives Java files and snippets over a local TCP
//! socket, resolves the dependencies they declare in `// #jgrab` comments,
//! caches the resolved classpaths on disk and runs the code.

pub mod cache;
pub mod classpath;
pub mod cli;
pub mod client;
pub mod config;
pub mod daemon;
pub mod dependency;
pub mod error;
pub mod executor;
pub mod resolver;
pub mod runner;
pub mod source;
pub mod ui;

pub use error::{JGrabError, JGrabResult};
