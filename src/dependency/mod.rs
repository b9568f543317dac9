//! Dependency declarations and dependency sets
//!
//! A dependency is written `group:module[:version]`; the version defaults to
//! `latest`. Dependencies order by their canonical notation
//! `group:module:version`, which is what makes set fingerprints reproducible.

mod fingerprint;

pub use fingerprint::fingerprint;

use crate::error::{JGrabError, JGrabResult};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::iter;
use std::str::FromStr;

/// Version used when a declaration omits one
pub const LATEST_VERSION: &str = "latest";

/// A single declared library reference
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Dependency {
    group: String,
    module: String,
    version: String,
}

impl Dependency {
    /// Parse a `group:module[:version]` declaration
    pub fn parse(declaration: &str) -> JGrabResult<Self> {
        let parts: Vec<&str> = declaration.trim().split(':').collect();

        if !(2..=3).contains(&parts.len()) || parts.iter().any(|p| p.is_empty()) {
            return Err(JGrabError::InvalidDependency(declaration.to_string()));
        }

        Ok(Self {
            group: parts[0].to_string(),
            module: parts[1].to_string(),
            version: parts.get(2).unwrap_or(&LATEST_VERSION).to_string(),
        })
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Whether the version must be looked up in a repository
    pub fn is_latest(&self) -> bool {
        self.version == LATEST_VERSION
    }

    /// Copy of this dependency pinned to a concrete version
    pub fn with_version(&self, version: impl Into<String>) -> Self {
        Self {
            group: self.group.clone(),
            module: self.module.clone(),
            version: version.into(),
        }
    }

    /// `group:module:version`
    pub fn canonical_notation(&self) -> String {
        format!("{}:{}:{}", self.group, self.module, self.version)
    }

    fn notation_bytes(&self) -> impl Iterator<Item = u8> + '_ {
        self.group
            .bytes()
            .chain(iter::once(b':'))
            .chain(self.module.bytes())
            .chain(iter::once(b':'))
            .chain(self.version.bytes())
    }
}

impl Ord for Dependency {
    fn cmp(&self, other: &Self) -> Ordering {
        self.notation_bytes().cmp(other.notation_bytes())
    }
}

impl PartialOrd for Dependency {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl FromStr for Dependency {
    type Err = JGrabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.module, self.version)
    }
}

/// A unique set of dependencies kept in canonical order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencySet(BTreeSet<Dependency>);

impl DependencySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a comma-separated list of declarations
    pub fn parse_list(list: &str) -> JGrabResult<Self> {
        list.split(',').map(Dependency::parse).collect()
    }

    pub fn insert(&mut self, dependency: Dependency) -> bool {
        self.0.insert(dependency)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Dependency> {
        self.0.iter()
    }

    /// Fingerprint of the whole set
    pub fn fingerprint(&self) -> String {
        fingerprint(&self.0)
    }

    /// Comma-joined canonical notations, as stored in the cache file
    pub fn notation(&self) -> String {
        self.0
            .iter()
            .map(Dependency::canonical_notation)
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl FromIterator<Dependency> for DependencySet {
    fn from_iter<I: IntoIterator<Item = Dependency>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a DependencySet {
    type Item = &'a Dependency;
    type IntoIter = std::collections::btree_set::Iter<'a, Dependency>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for DependencySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.notation())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_declaration() {
        let dep = Dependency::parse("com.google.guava:guava:19.0").unwrap();
        assert_eq!(dep.group(), "com.google.guava");
        assert_eq!(dep.module(), "guava");
        assert_eq!(dep.version(), "19.0");
        assert!(!dep.is_latest());
    }

    #[test]
    fn parse_defaults_version_to_latest() {
        let dep: Dependency = "other-dep:name".parse().unwrap();
        assert_eq!(dep.canonical_notation(), "other-dep:name:latest");
        assert!(dep.is_latest());
    }

    #[test]
    fn parse_rejects_wrong_segment_count() {
        assert!(matches!(
            Dependency::parse("guava"),
            Err(JGrabError::InvalidDependency(_))
        ));
        assert!(Dependency::parse("a:b:c:d").is_err());
        assert!(Dependency::parse("a::1.0").is_err());
        assert!(Dependency::parse("").is_err());
    }

    #[test]
    fn ordering_follows_canonical_notation() {
        // '.' sorts before ':', so field-wise comparison would disagree here
        let short = Dependency::parse("a:x:1").unwrap();
        let dotted = Dependency::parse("a.b:x:1").unwrap();

        assert!(dotted < short);
        assert!(dotted.canonical_notation() < short.canonical_notation());
    }

    #[test]
    fn set_removes_duplicates_and_sorts() {
        let set: DependencySet = ["b:m:1", "a:m:1", "b:m:1"]
            .iter()
            .map(|d| Dependency::parse(d).unwrap())
            .collect();

        assert_eq!(set.len(), 2);
        assert_eq!(set.notation(), "a:m:1,b:m:1");
    }

    #[test]
    fn parse_list_round_trips_notation() {
        let set = DependencySet::parse_list("some:valid-dep:1.0,other-dep:name").unwrap();
        assert_eq!(set.notation(), "other-dep:name:latest,some:valid-dep:1.0");
        assert_eq!(DependencySet::parse_list(&set.notation()).unwrap(), set);
    }

    #[test]
    fn with_version_pins() {
        let dep = Dependency::parse("g:m").unwrap().with_version("2.1");
        assert_eq!(dep.to_string(), "g:m:2.1");
    }
}
