//! Source code analysis
//!
//! Finds `// #jgrab group:module[:version]` declarations and decides whether
//! a piece of code is a full class or a snippet.

use crate::dependency::{Dependency, DependencySet};
use crate::error::{JGrabError, JGrabResult};
use regex::Regex;
use std::fmt;
use std::path::Path;
use std::sync::LazyLock;
use tracing::debug;

static JGRAB_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*//\s*#jgrab\s+([a-zA-Z\-_0-9:.]+)\s*$").expect("valid regex"));

static PACKAGE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*package\s+([a-zA-Z_0-9.$]+)\s*;?\s*$").expect("valid regex"));

static CLASS_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*((public|static|private|abstract|final)\s+)*\s*class\s+(?P<name>[a-zA-Z_0-9.$]+).*$")
        .expect("valid regex")
});

/// Source text submitted for execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceCode {
    code: String,
    class_name: Option<String>,
}

impl SourceCode {
    pub fn new(code: impl Into<String>) -> Self {
        let code = code.into();
        let class_name = extract_class_name(&code);
        debug!("Class name: {:?}", class_name);
        Self { code, class_name }
    }

    /// Read a source file
    pub async fn from_file(path: &Path) -> JGrabResult<Self> {
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|_| JGrabError::FileNotFound(path.to_path_buf()))?;

        if !metadata.is_file() {
            return Err(JGrabError::NotAFile(path.to_path_buf()));
        }

        let code = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| JGrabError::io(format!("reading {}", path.display()), e))?;

        Ok(Self::new(code))
    }

    /// Every dependency declared in the source
    pub fn dependencies(&self) -> JGrabResult<DependencySet> {
        self.code
            .lines()
            .filter_map(|line| JGRAB_PATTERN.captures(line))
            .map(|caps| Dependency::parse(&caps[1]))
            .collect()
    }

    /// Fully-qualified name of the class declared in the source, if any
    pub fn class_name(&self) -> Option<&str> {
        self.class_name.as_deref()
    }

    /// Snippets have no class declaration and get wrapped before running
    pub fn is_snippet(&self) -> bool {
        self.class_name.is_none()
    }

    pub fn code(&self) -> &str {
        &self.code
    }
}

impl fmt::Display for SourceCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code)
    }
}

fn extract_class_name(code: &str) -> Option<String> {
    let mut package: Option<&str> = None;

    for line in code.lines() {
        if package.is_none() {
            if let Some(caps) = PACKAGE_PATTERN.captures(line) {
                package = caps.get(1).map(|m| m.as_str());
                continue;
            }
        }

        if let Some(caps) = CLASS_PATTERN.captures(line) {
            let name = &caps["name"];
            return Some(match package {
                Some(pkg) => format!("{}.{}", pkg, name),
                None => name.to_string(),
            });
        }
    }

    None
}
