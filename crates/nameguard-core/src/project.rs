//! Project driver: owns every cross-file table and mangles files one by one.

use crate::cache::{FileNameCache, NameCache};
use crate::config::MangleConfig;
use crate::error::Result;
use crate::generator::{build_generator, NameGenerator};
use crate::mangle::{self, MangleContext, UnitOutcome};
use crate::report::{BuildReport, SkippedFile};
use crate::scope::{self, ScopeTree};
use crate::source::{self, SourceUnit};
use crate::tables::{GlobalMangledTable, HistoryTable};
use crate::whitelist::WhitelistRegistry;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::{debug, info, warn};

/// Result of a whole build.
#[derive(Debug)]
pub struct BuildOutput {
    /// Input of the next incremental build.
    pub name_cache: NameCache,
    pub report: BuildReport,
}

/// One obfuscation build over a set of source units.
///
/// Files are processed strictly one at a time; the global mangled table and
/// generator are shared by all of them, the history table is read-only.
pub struct Project {
    config: MangleConfig,
    registry: WhitelistRegistry,
    global: GlobalMangledTable,
    generator: Box<dyn NameGenerator>,
    history: HistoryTable,
    previous: NameCache,
    kept_properties: HashSet<String>,
    no_binding: BTreeMap<String, BTreeSet<String>>,
    files: BTreeMap<String, FileNameCache>,
    report: BuildReport,
}

impl Project {
    /// Start a build; the keep lists of `config` seed the whitelist.
    pub fn new(config: MangleConfig) -> Result<Self> {
        let registry = WhitelistRegistry::from_config(&config)?;
        let generator = build_generator(&config.generator);
        Ok(Self {
            config,
            registry,
            global: GlobalMangledTable::new(),
            generator,
            history: HistoryTable::new(),
            previous: NameCache::default(),
            kept_properties: HashSet::new(),
            no_binding: BTreeMap::new(),
            files: BTreeMap::new(),
            report: BuildReport::default(),
        })
    }

    /// Replace the registry built from the configuration, e.g. with one that
    /// also carries scanned SDK names.
    #[must_use]
    pub fn with_registry(mut self, registry: WhitelistRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Seed names from the previous build's cache.
    #[must_use]
    pub fn with_history(mut self, cache: NameCache) -> Self {
        self.history = HistoryTable::from_cache(&cache);
        self.previous = cache;
        self
    }

    #[must_use]
    pub fn config(&self) -> &MangleConfig {
        &self.config
    }

    #[must_use]
    pub fn global_table(&self) -> &GlobalMangledTable {
        &self.global
    }

    /// Property names kept project-wide because ambient code declares them.
    #[must_use]
    pub fn kept_properties(&self) -> &HashSet<String> {
        &self.kept_properties
    }

    /// Keep additional property names project-wide.
    pub fn reserve_properties<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.kept_properties
            .extend(names.into_iter().map(Into::into));
    }

    /// Re-export, import and referenced names of `path` that have no local
    /// declaration.
    #[must_use]
    pub fn no_binding_names(&self, path: &str) -> Option<&BTreeSet<String>> {
        self.no_binding.get(path)
    }

    /// Mangle one parsed unit in place.
    pub fn mangle_unit(&mut self, unit: &mut SourceUnit) -> Result<()> {
        let tree = scope::analyze(&unit.module, &unit.path, unit.is_declaration);
        self.reserve_properties(mangle::ambient_property_names(&tree));
        self.run(unit, tree)
    }

    /// Parse, mangle and print one file. A file that does not parse is
    /// skipped: it yields `None` and is listed in the report.
    pub fn mangle_source(&mut self, path: &str, source: &str) -> Result<Option<String>> {
        let mut unit = match source::parse_source(path, source) {
            Ok(unit) => unit,
            Err(e) if e.is_recoverable() => {
                self.skip(path, &e.to_string());
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        self.mangle_unit(&mut unit)?;
        source::print(&unit).map(Some)
    }

    /// Mangle a batch of units. Declaration files go first, and the ambient
    /// member names of every unit are known before any file is renamed.
    pub fn mangle_all(&mut self, units: &mut [SourceUnit]) -> Result<()> {
        let mut order: Vec<usize> = (0..units.len()).collect();
        order.sort_by_key(|&i| !units[i].is_declaration);

        let mut trees: Vec<Option<ScopeTree>> = units
            .iter()
            .map(|unit| Some(scope::analyze(&unit.module, &unit.path, unit.is_declaration)))
            .collect();
        for tree in trees.iter().flatten() {
            let names = mangle::ambient_property_names(tree);
            self.reserve_properties(names);
        }

        for i in order {
            if let Some(tree) = trees[i].take() {
                self.run(&mut units[i], tree)?;
            }
        }
        Ok(())
    }

    fn run(&mut self, unit: &mut SourceUnit, tree: ScopeTree) -> Result<()> {
        let mut ctx = MangleContext {
            config: &self.config,
            registry: &self.registry,
            global: &mut self.global,
            history: &self.history,
            generator: self.generator.as_mut(),
            kept_properties: &self.kept_properties,
        };
        let outcome = mangle::mangle_analyzed(&mut ctx, unit, tree)?;
        self.record(&unit.path, outcome);
        Ok(())
    }

    fn record(&mut self, path: &str, outcome: UnitOutcome) {
        let UnitOutcome {
            cache,
            report,
            no_binding_names,
        } = outcome;
        for diagnostic in &report.diagnostics {
            debug!(file = %path, %diagnostic, "diagnostic");
        }
        if !no_binding_names.is_empty() {
            self.no_binding.insert(path.to_string(), no_binding_names);
        }
        self.files.insert(path.to_string(), cache);
        self.report.push(report);
    }

    fn skip(&mut self, path: &str, message: &str) {
        warn!(file = %path, error = %message, "skipping file");
        self.report.skipped.push(SkippedFile {
            path: path.to_string(),
            message: message.to_string(),
        });
    }

    /// Close the build and produce the cache for the next one.
    ///
    /// Files of the previous build that were not processed keep their cache
    /// entries, and so do global-table entries nobody re-committed.
    #[must_use]
    pub fn finish(self) -> BuildOutput {
        let mut files: BTreeMap<String, FileNameCache> = self
            .files
            .into_iter()
            .filter(|(_, cache)| !cache.is_empty())
            .collect();
        let mut carried = 0usize;
        for (path, cache) in self.previous.files {
            if !files.contains_key(&path) && !self.report.files.iter().any(|f| f.path == path) {
                files.insert(path, cache);
                carried += 1;
            }
        }

        let mut global_table = self.global.to_map();
        for (original, mangled) in self.previous.global_table {
            if !global_table.contains_key(&original) && !self.global.contains_value(&mangled) {
                global_table.insert(original, mangled);
            }
        }

        info!(
            files = self.report.files.len(),
            skipped = self.report.skipped.len(),
            renamed = self.report.renamed_total(),
            diagnostics = self.report.diagnostic_count(),
            carried,
            "mangle build finished"
        );
        BuildOutput {
            name_cache: NameCache {
                files,
                global_table,
            },
            report: self.report,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_failure_is_skipped() {
        let mut project = Project::new(MangleConfig::default()).unwrap();
        let out = project.mangle_source("bad.js", "let = ;").unwrap();
        assert!(out.is_none());
        let good = project
            .mangle_source("good.js", "function f(param) { return param; }")
            .unwrap()
            .unwrap();
        assert!(good.contains("function f(a)"));

        let output = project.finish();
        assert_eq!(output.report.skipped.len(), 1);
        assert_eq!(output.report.skipped[0].path, "bad.js");
        assert!(output.name_cache.files.contains_key("good.js"));
        assert!(!output.name_cache.files.contains_key("bad.js"));
    }

    #[test]
    fn test_keep_patterns_from_config() {
        let config = MangleConfig::default().with_keep_names(["keep*"]);
        let mut project = Project::new(config).unwrap();
        let out = project
            .mangle_source("k.js", "function f(keepMe, other) { return keepMe + other; }")
            .unwrap()
            .unwrap();
        assert!(out.contains("keepMe"));
        assert!(!out.contains("other"));
    }

    #[test]
    fn test_declarations_reserve_member_names() {
        let config = MangleConfig::default().with_property(true);
        let mut project = Project::new(config).unwrap();
        let mut units = vec![
            source::parse_source("app.ts", "const cfg = { apiKey: 'k', retries: 3 }; use(cfg.apiKey, cfg.retries);")
                .unwrap(),
            source::parse_source("env.d.ts", "interface Env { apiKey: string }").unwrap(),
        ];
        project.mangle_all(&mut units).unwrap();
        let out = source::print(&units[0]).unwrap();
        assert!(out.contains("apiKey: 'k'") || out.contains("apiKey: \"k\""));
        assert!(out.contains("cfg.apiKey"));
        assert!(!out.contains("retries"));
        assert!(project.kept_properties().contains("apiKey"));
    }

    #[test]
    fn test_finish_carries_previous_entries() {
        let mut previous = NameCache::default();
        let mut old = FileNameCache::default();
        old.identifier_cache.insert("f#x".into(), "a".into());
        previous.files.insert("untouched.js".into(), old);
        previous.global_table.insert("legacy".into(), "zz".into());

        let mut project = Project::new(MangleConfig::default())
            .unwrap()
            .with_history(previous);
        project
            .mangle_source("new.js", "function g(y) { return y; }")
            .unwrap();
        let output = project.finish();
        assert!(output.name_cache.files.contains_key("untouched.js"));
        assert!(output.name_cache.files.contains_key("new.js"));
        assert_eq!(
            output.name_cache.global_table.get("legacy").map(String::as_str),
            Some("zz")
        );
    }

    #[test]
    fn test_no_binding_registry() {
        let config = MangleConfig::default().with_toplevel(true).with_export(true);
        let mut project = Project::new(config).unwrap();
        project
            .mangle_source("a.ts", "export { Widget as Gadget } from './w';")
            .unwrap();
        let names = project.no_binding_names("a.ts").unwrap();
        assert!(names.contains("Widget"));
        assert!(names.contains("Gadget"));
    }
}
