use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Which rename categories are enabled and how candidate names are produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MangleConfig {
    /// Rename local variables, parameters and labels.
    pub identifiers: bool,

    /// Rename top-level (file scope) bindings that are not exported.
    pub toplevel: bool,

    /// Rename object, class, interface and enum property names.
    /// Constructor parameter-properties follow this switch.
    pub property: bool,

    /// Rename exported names.
    pub export: bool,

    /// Also rename string-literal property keys (`obj["name"]`, `{ "name": 1 }`).
    pub string_property: bool,

    /// Record why every kept name was kept.
    pub explain_kept_names: bool,

    /// When both `toplevel` and `export` are on, refuse candidates that equal
    /// a name imported into or exported from the current file.
    pub guard_file_export_names: bool,

    /// Candidate name production.
    pub generator: GeneratorConfig,

    /// Names never renamed, in any position. Wildcards `*` and `?` allowed.
    pub keep_names: Vec<String>,

    /// Identifier names never renamed. Wildcards allowed.
    pub keep_global_names: Vec<String>,

    /// Property names never renamed. Wildcards allowed.
    pub keep_property_names: Vec<String>,
}

impl Default for MangleConfig {
    fn default() -> Self {
        Self {
            identifiers: true,
            toplevel: false,
            property: false,
            export: false,
            string_property: false,
            explain_kept_names: false,
            guard_file_export_names: true,
            generator: GeneratorConfig::default(),
            keep_names: Vec::new(),
            keep_global_names: Vec::new(),
            keep_property_names: Vec::new(),
        }
    }
}

impl MangleConfig {
    /// Parse a JSON configuration document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|source| Error::ConfigParse { source })
    }

    /// Load configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    #[must_use]
    pub fn with_identifiers(mut self, enabled: bool) -> Self {
        self.identifiers = enabled;
        self
    }

    #[must_use]
    pub fn with_toplevel(mut self, enabled: bool) -> Self {
        self.toplevel = enabled;
        self
    }

    #[must_use]
    pub fn with_property(mut self, enabled: bool) -> Self {
        self.property = enabled;
        self
    }

    #[must_use]
    pub fn with_export(mut self, enabled: bool) -> Self {
        self.export = enabled;
        self
    }

    #[must_use]
    pub fn with_string_property(mut self, enabled: bool) -> Self {
        self.string_property = enabled;
        self
    }

    #[must_use]
    pub fn with_explain_kept_names(mut self, enabled: bool) -> Self {
        self.explain_kept_names = enabled;
        self
    }

    #[must_use]
    pub fn with_generator(mut self, generator: GeneratorConfig) -> Self {
        self.generator = generator;
        self
    }

    #[must_use]
    pub fn with_keep_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keep_names.extend(names.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn with_keep_global_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keep_global_names
            .extend(names.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn with_keep_property_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keep_property_names
            .extend(names.into_iter().map(Into::into));
        self
    }

    /// Whether no-binding import/export specifier names take part in renaming.
    #[must_use]
    pub fn renames_no_binding_names(&self) -> bool {
        self.toplevel && self.export
    }
}

/// Name generator selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NameGeneratorKind {
    /// `a, b, ..., z, a1, b1, ...`
    #[default]
    Ordered,
    /// `_0x0, _0x1, ...`
    Hex,
    /// Words from a user dictionary, then suffixed words.
    Dictionary,
}

impl NameGeneratorKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ordered => "ordered",
            Self::Hex => "hex",
            Self::Dictionary => "dictionary",
        }
    }
}

/// Options for the candidate name generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GeneratorConfig {
    pub kind: NameGeneratorKind,
    /// Prefix for hex names.
    pub prefix: String,
    /// Minimum number of hex digits.
    pub hex_width: usize,
    /// Words for the dictionary generator.
    pub dictionary: Vec<String>,
    /// Cycle through `A..Z` after `a..z` in the ordered generator.
    pub uppercase: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            kind: NameGeneratorKind::Ordered,
            prefix: "_0x".to_string(),
            hex_width: 0,
            dictionary: Vec::new(),
            uppercase: false,
        }
    }
}

impl GeneratorConfig {
    #[must_use]
    pub fn hex(prefix: impl Into<String>) -> Self {
        Self {
            kind: NameGeneratorKind::Hex,
            prefix: prefix.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn dictionary<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind: NameGeneratorKind::Dictionary,
            dictionary: words.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }
}
