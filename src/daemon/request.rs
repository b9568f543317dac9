//! Daemon requests
//!
//! Everything a client sends after its token line is parsed into one
//! [`Request`]. The accepted shapes are:
//!
//! | Content | Request |
//! |---------|---------|
//! | `[a b c]` followed by more lines | `Execute` with args `a b c` |
//! | `--stop` | `Stop` |
//! | `--version` | `PrintVersion` |
//! | `-e <snippet>` | `Execute` of the snippet |
//! | anything else | `Execute` of the whole text |

use crate::error::JGrabError;
use crate::source::SourceCode;
use regex::Regex;
use std::sync::LazyLock;

pub const STOP_OPTION: &str = "--stop";
pub const VERSION_OPTION: &str = "--version";
pub const SNIPPET_OPTION: &str = "-e";

/// Reply when a request has no content
pub const NO_INPUT_MESSAGE: &str = "ERROR: communication error (no input received)";

static ARGUMENTS_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[.+\]$").expect("valid regex"));

/// A parsed client request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Stop accepting connections
    Stop,
    /// Report daemon and runtime versions
    PrintVersion,
    /// Nothing to run; `message` is sent back to the client
    NoOp { message: String },
    /// Run code with arguments
    Execute { code: SourceCode, args: Vec<String> },
}

impl Request {
    /// Parse the request body (everything after the token line)
    pub fn parse(body: &str) -> Self {
        if body.trim().is_empty() {
            return Request::NoOp {
                message: NO_INPUT_MESSAGE.to_string(),
            };
        }

        let (first_line, rest) = match body.split_once('\n') {
            Some((first, rest)) => (first.trim_end_matches('\r'), rest),
            None => (body, ""),
        };

        if !rest.is_empty() && ARGUMENTS_LINE.is_match(first_line) {
            let inner = &first_line[1..first_line.len() - 1];
            let args = inner
                .split(' ')
                .filter(|arg| !arg.is_empty())
                .map(String::from)
                .collect();
            return Request::Execute {
                code: SourceCode::new(rest),
                args,
            };
        }

        let input = body.trim();

        if input == STOP_OPTION {
            return Request::Stop;
        }

        if input == VERSION_OPTION {
            return Request::PrintVersion;
        }

        if let Some(snippet) = snippet_of(input) {
            if snippet.is_empty() {
                return Request::NoOp {
                    message: format!("ERROR: {}", JGrabError::EmptySnippet),
                };
            }
            return Request::Execute {
                code: SourceCode::new(snippet),
                args: Vec::new(),
            };
        }

        Request::Execute {
            code: SourceCode::new(input),
            args: Vec::new(),
        }
    }
}

/// Text after a leading `-e` marker, trimmed
fn snippet_of(input: &str) -> Option<&str> {
    let after = input.strip_prefix(SNIPPET_OPTION)?;
    match after.chars().next() {
        None => Some(""),
        Some(c) if c.is_whitespace() => Some(after.trim()),
        Some(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn execute(request: Request) -> (SourceCode, Vec<String>) {
        match request {
            Request::Execute { code, args } => (code, args),
            other => panic!("expected Execute, got {other:?}"),
        }
    }

    #[test]
    fn control_values() {
        assert_eq!(Request::parse("--stop\n"), Request::Stop);
        assert_eq!(Request::parse("  --version  "), Request::PrintVersion);
    }

    #[test]
    fn arguments_line_followed_by_class() {
        let (code, args) = execute(Request::parse("[a  b c]\npublic class Main {}\n"));

        assert_eq!(args, vec!["a", "b", "c"]);
        assert_eq!(code.code(), "public class Main {}\n");
        assert_eq!(code.class_name(), Some("Main"));
    }

    #[test]
    fn lone_arguments_line_is_source() {
        let (code, args) = execute(Request::parse("[1, 2, 3]"));
        assert!(args.is_empty());
        assert_eq!(code.code(), "[1, 2, 3]");
    }

    #[test]
    fn snippet_marker() {
        let (code, args) = execute(Request::parse("-e  2 + 2 \n"));
        assert!(args.is_empty());
        assert_eq!(code.code(), "2 + 2");
        assert!(code.is_snippet());
    }

    #[test]
    fn empty_snippet_is_reported() {
        assert_eq!(
            Request::parse("-e   \n"),
            Request::NoOp {
                message: "ERROR: no snippet provided to execute".to_string()
            }
        );
    }

    #[test]
    fn marker_must_be_separate_word() {
        let (code, _) = execute(Request::parse("-ex"));
        assert_eq!(code.code(), "-ex");
    }

    #[test]
    fn missing_input() {
        assert!(matches!(Request::parse(""), Request::NoOp { .. }));
        assert!(matches!(Request::parse("\n\n"), Request::NoOp { .. }));
    }

    #[test]
    fn raw_source_is_trimmed() {
        let (code, _) = execute(Request::parse("\n  System.out.println(1);\n"));
        assert_eq!(code.code(), "System.out.println(1);");
    }
}
