//! Reserved-name registry.
//!
//! Names are kept for many unrelated reasons (language keywords, user keep
//! lists, SDK API surfaces collected by a scanner, keep annotations). Each
//! source lives in its own partition so that a kept name can be explained.
//! The registry is populated once per project and is read-only afterwards.

use crate::config::MangleConfig;
use crate::error::{Error, Result};
use crate::reserved;
use regex_lite::Regex;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Source of a reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Partition {
    /// Keywords and runtime globals.
    Language,
    /// Property names the runtime looks up by name.
    RuntimeProperty,
    /// User keep-names, applying to identifiers and properties alike.
    Reserved,
    /// User keep-global-names.
    Global,
    /// User keep-property-names.
    Property,
    /// SDK / dependency API names found by the project scanner.
    Sdk,
    /// Struct and enum member names.
    StructMember,
    /// Names declared by keep annotations.
    AtKeep,
}

impl Partition {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Language => "language",
            Self::RuntimeProperty => "runtime-property",
            Self::Reserved => "keep-name",
            Self::Global => "keep-global-name",
            Self::Property => "keep-property-name",
            Self::Sdk => "sdk-api",
            Self::StructMember => "struct-member",
            Self::AtKeep => "keep-annotation",
        }
    }
}

/// Why a name was retained.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeepReason {
    pub partition: Partition,
    /// The wildcard pattern that matched, if the match was not exact.
    pub pattern: Option<String>,
}

impl fmt::Display for KeepReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.pattern {
            Some(pattern) => write!(f, "{} pattern `{pattern}`", self.partition.as_str()),
            None => f.write_str(self.partition.as_str()),
        }
    }
}

const GLOBAL_SETS: &[Partition] = &[
    Partition::Reserved,
    Partition::Global,
    Partition::Sdk,
    Partition::AtKeep,
];

const PROPERTY_SETS: &[Partition] = &[
    Partition::Reserved,
    Partition::Property,
    Partition::Sdk,
    Partition::StructMember,
    Partition::AtKeep,
];

#[derive(Debug, Clone)]
struct Wildcard {
    partition: Partition,
    source: String,
    regex: Regex,
}

/// Partitioned reserved-name sets and wildcard patterns.
#[derive(Debug, Clone, Default)]
pub struct WhitelistRegistry {
    sets: HashMap<Partition, HashSet<String>>,
    wildcards: Vec<Wildcard>,
}

impl WhitelistRegistry {
    /// Registry holding only the built-in language reservations.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from the keep lists of a configuration.
    pub fn from_config(config: &MangleConfig) -> Result<Self> {
        let mut builder = WhitelistBuilder::new();
        builder.reserve_all(Partition::Reserved, &config.keep_names)?;
        builder.reserve_all(Partition::Global, &config.keep_global_names)?;
        builder.reserve_all(Partition::Property, &config.keep_property_names)?;
        Ok(builder.build())
    }

    /// Whether an identifier name must not be renamed or produced.
    #[must_use]
    pub fn is_reserved_global(&self, name: &str) -> bool {
        self.global_reason(name).is_some()
    }

    /// Whether a property name must not be renamed or produced.
    #[must_use]
    pub fn is_reserved_property(&self, name: &str) -> bool {
        self.property_reason(name).is_some()
    }

    /// Whether a local variable must keep its name.
    #[must_use]
    pub fn is_reserved_local(&self, name: &str) -> bool {
        self.local_reason(name).is_some()
    }

    #[must_use]
    pub fn global_reason(&self, name: &str) -> Option<KeepReason> {
        if reserved::is_keyword(name) || reserved::is_runtime_global(name) {
            return Some(exact(Partition::Language));
        }
        self.lookup(name, GLOBAL_SETS)
    }

    #[must_use]
    pub fn property_reason(&self, name: &str) -> Option<KeepReason> {
        if reserved::is_keyword(name) {
            return Some(exact(Partition::Language));
        }
        if reserved::is_runtime_property(name) {
            return Some(exact(Partition::RuntimeProperty));
        }
        self.lookup(name, PROPERTY_SETS)
    }

    #[must_use]
    pub fn local_reason(&self, name: &str) -> Option<KeepReason> {
        self.lookup(name, &[Partition::Reserved])
    }

    fn lookup(&self, name: &str, partitions: &[Partition]) -> Option<KeepReason> {
        for partition in partitions {
            if self
                .sets
                .get(partition)
                .is_some_and(|set| set.contains(name))
            {
                return Some(exact(*partition));
            }
        }
        self.wildcards
            .iter()
            .find(|w| partitions.contains(&w.partition) && w.regex.is_match(name))
            .map(|w| KeepReason {
                partition: w.partition,
                pattern: Some(w.source.clone()),
            })
    }

    /// Number of exact names held by a partition.
    #[must_use]
    pub fn len(&self, partition: Partition) -> usize {
        self.sets.get(&partition).map_or(0, HashSet::len)
    }
}

fn exact(partition: Partition) -> KeepReason {
    KeepReason {
        partition,
        pattern: None,
    }
}

/// Accumulates reservations before freezing them into a registry.
#[derive(Debug, Default)]
pub struct WhitelistBuilder {
    registry: WhitelistRegistry,
}

impl WhitelistBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve one name; names containing `*` or `?` become patterns.
    pub fn reserve(&mut self, partition: Partition, name: &str) -> Result<&mut Self> {
        if is_wildcard(name) {
            let regex = wildcard_regex(name)?;
            self.registry.wildcards.push(Wildcard {
                partition,
                source: name.to_string(),
                regex,
            });
        } else if !name.is_empty() {
            self.registry
                .sets
                .entry(partition)
                .or_default()
                .insert(name.to_string());
        }
        Ok(self)
    }

    pub fn reserve_all<I, S>(&mut self, partition: Partition, names: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            self.reserve(partition, name.as_ref())?;
        }
        Ok(self)
    }

    #[must_use]
    pub fn build(self) -> WhitelistRegistry {
        self.registry
    }
}

fn is_wildcard(name: &str) -> bool {
    name.contains('*') || name.contains('?')
}

/// Compile a `*`/`?` wildcard into an anchored regex.
fn wildcard_regex(pattern: &str) -> Result<Regex> {
    let mut source = String::with_capacity(pattern.len() + 8);
    source.push('^');
    let mut literal = String::new();
    for ch in pattern.chars() {
        if ch == '*' || ch == '?' {
            source.push_str(&regex_lite::escape(&literal));
            literal.clear();
            source.push_str(if ch == '*' { ".*" } else { "." });
        } else {
            literal.push(ch);
        }
    }
    source.push_str(&regex_lite::escape(&literal));
    source.push('$');
    Regex::new(&source).map_err(|e| Error::InvalidPattern {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> WhitelistRegistry {
        let mut builder = WhitelistBuilder::new();
        builder
            .reserve_all(Partition::Global, ["keepMe", "lib*"])
            .unwrap()
            .reserve_all(Partition::Property, ["prop?"])
            .unwrap()
            .reserve(Partition::Sdk, "getContext")
            .unwrap()
            .reserve(Partition::StructMember, "title")
            .unwrap()
            .reserve(Partition::Reserved, "shared")
            .unwrap();
        builder.build()
    }

    #[test]
    fn test_language_reserved_everywhere() {
        let reg = WhitelistRegistry::new();
        assert!(reg.is_reserved_global("do"));
        assert!(reg.is_reserved_global("console"));
        assert!(reg.is_reserved_property("in"));
        assert!(reg.is_reserved_property("prototype"));
        assert!(!reg.is_reserved_global("prototype"));
        assert!(!reg.is_reserved_property("console"));
    }

    #[test]
    fn test_partitions_apply_to_their_tests() {
        let reg = registry();
        assert!(reg.is_reserved_global("keepMe"));
        assert!(!reg.is_reserved_property("keepMe"));
        assert!(reg.is_reserved_property("title"));
        assert!(!reg.is_reserved_global("title"));
        assert!(reg.is_reserved_global("getContext"));
        assert!(reg.is_reserved_property("getContext"));
        assert!(reg.is_reserved_local("shared"));
        assert!(!reg.is_reserved_local("keepMe"));
    }

    #[test]
    fn test_wildcards() {
        let reg = registry();
        assert!(reg.is_reserved_global("library"));
        assert!(reg.is_reserved_global("lib"));
        assert!(!reg.is_reserved_global("glib"));
        assert!(reg.is_reserved_property("prop1"));
        assert!(!reg.is_reserved_property("prop12"));
        assert!(!reg.is_reserved_property("prop"));
    }

    #[test]
    fn test_wildcard_escapes_regex_syntax() {
        let mut builder = WhitelistBuilder::new();
        builder.reserve(Partition::Global, "$a.*").unwrap();
        let reg = builder.build();
        assert!(reg.is_reserved_global("$a.b"));
        assert!(!reg.is_reserved_global("$ab"));
    }

    #[test]
    fn test_reasons() {
        let reg = registry();
        assert_eq!(
            reg.global_reason("library").map(|r| r.to_string()),
            Some("keep-global-name pattern `lib*`".to_string())
        );
        assert_eq!(
            reg.property_reason("title").map(|r| r.partition),
            Some(Partition::StructMember)
        );
        assert_eq!(reg.global_reason("nothing"), None);
    }

    #[test]
    fn test_from_config() {
        let config = MangleConfig::default()
            .with_keep_global_names(["api*"])
            .with_keep_property_names(["width"]);
        let reg = WhitelistRegistry::from_config(&config).unwrap();
        assert!(reg.is_reserved_global("apiLevel"));
        assert!(reg.is_reserved_property("width"));
        assert_eq!(reg.len(Partition::Property), 1);
    }
}
