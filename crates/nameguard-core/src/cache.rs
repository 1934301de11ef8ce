//! Persisted name cache, the input of the next incremental build.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Names chosen for one file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FileNameCache {
    /// Scope-qualified key (`path#name`) → mangled name.
    pub identifier_cache: BTreeMap<String, String>,
    /// `name:startLine:endLine` of renamed class methods → mangled name.
    pub member_method_cache: BTreeMap<String, String>,
}

impl FileNameCache {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.identifier_cache.is_empty() && self.member_method_cache.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NameCache {
    pub files: BTreeMap<String, FileNameCache>,
    /// Original → mangled names shared by every file.
    pub global_table: BTreeMap<String, String>,
}

impl NameCache {
    /// Read a cache written by [`NameCache::save`].
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| Error::CacheRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| Error::CacheParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load the cache if the file exists, or start empty.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| Error::other(format!("Failed to serialize name cache: {e}")))?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|source| Error::CacheWrite {
                    path: path.to_path_buf(),
                    source,
                })?;
            }
        }
        std::fs::write(path, json).map_err(|source| Error::CacheWrite {
            path: path.to_path_buf(),
            source,
        })
    }
}
