//! Name assignment for one source unit.
//!
//! Mangling a file happens in three phases:
//! 1. Reserve: every binding that must keep its name records that name as
//!    used in its scope chain, so nothing else is renamed onto it.
//! 2. Assign: scopes are visited top-down (root first, children in creation
//!    order). Labels, plain bindings, class/interface/enum/object members and
//!    constructor parameter-properties each get their final name.
//! 3. Rewrite: every recorded occurrence in the syntax tree is replaced by
//!    its target's final name (see [`rewrite`]).
//!
//! Names follow one of two rules. Local bindings only need to be unique among
//! the scopes that can see them, so each scope visit draws from a fresh
//! generator. Property-style bindings (members, file-scope and exported names)
//! must be spelled the same in every file, so they are keyed by their
//! original text in the project-wide [`GlobalMangledTable`] and drawn from the
//! project's shared generator.
//!
//! Unresolved references are treated like re-exported names: they go through
//! the property path under the key `#name`, so they take whatever name the
//! declaration in another file takes, whichever file is processed first.

mod rewrite;

use crate::cache::FileNameCache;
use crate::config::MangleConfig;
use crate::error::{Error, Result};
use crate::generator::{build_generator, NameGenerator};
use crate::report::FileReport;
use crate::scope::{self, BindingId, BindingKind, PropertyOrigin, RenameRule, ScopeId, ScopeTree, Target};
use crate::source::SourceUnit;
use crate::tables::{GlobalMangledTable, HistoryTable};
use crate::whitelist::WhitelistRegistry;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use swc_common::SourceMap;
use tracing::{debug, warn};

/// Candidates drawn for one name before giving up.
pub const MAX_NAME_ATTEMPTS: usize = 1_000_000;

/// Cross-file state a file is mangled against. Owned by the project driver.
pub struct MangleContext<'a> {
    pub config: &'a MangleConfig,
    pub registry: &'a WhitelistRegistry,
    pub global: &'a mut GlobalMangledTable,
    pub history: &'a HistoryTable,
    /// Shared by every property-style name of the build.
    pub generator: &'a mut dyn NameGenerator,
    /// Property names declared by ambient code anywhere in the project.
    pub kept_properties: &'a HashSet<String>,
}

/// What mangling one file produced besides the rewritten tree.
#[derive(Debug, Default)]
pub struct UnitOutcome {
    pub cache: FileNameCache,
    pub report: FileReport,
    /// Import/export specifier names and references with no local declaration.
    pub no_binding_names: BTreeSet<String>,
}

/// Analyze, assign and rewrite one unit in place.
pub fn mangle_unit(ctx: &mut MangleContext<'_>, unit: &mut SourceUnit) -> Result<UnitOutcome> {
    let tree = scope::analyze(&unit.module, &unit.path, unit.is_declaration);
    mangle_analyzed(ctx, unit, tree)
}

/// Assign and rewrite a unit whose scope tree was already built.
pub fn mangle_analyzed(
    ctx: &mut MangleContext<'_>,
    unit: &mut SourceUnit,
    tree: ScopeTree,
) -> Result<UnitOutcome> {
    let mut mangler = Mangler::new(ctx, &unit.path, tree);
    mangler.assign(&unit.cm)?;
    rewrite::rewrite(&mut mangler, &mut unit.module)?;
    Ok(mangler.finish())
}

/// Property-style names of ambient declarations in `tree`: members, and
/// file-scope names other files may reach as free references. Other files
/// must not rename them.
#[must_use]
pub fn ambient_property_names(tree: &ScopeTree) -> Vec<String> {
    tree.bindings
        .iter()
        .filter(|b| b.ambient && matches!(b.rule, RenameRule::Property(_)))
        .map(|b| b.name.clone())
        .collect()
}

// =============================================================================
// Per-file state
// =============================================================================

pub(crate) struct Mangler<'c, 'a> {
    ctx: &'c mut MangleContext<'a>,
    path: String,
    tree: ScopeTree,
    /// Why each binding keeps its name, if it does.
    kept: Vec<Option<String>>,
    /// Member names kept in this file; property accesses to them stay too.
    kept_members: HashSet<String>,
    /// Final text of each unresolved reference name; `None` keeps it.
    free_names: HashMap<String, Option<String>>,
    /// Property-path names committed in this file, mapped to their original.
    committed: HashMap<String, String>,
    file_history: Option<&'a BTreeMap<String, String>>,
    history_values: HashSet<String>,
    cache: FileNameCache,
    report: FileReport,
}

impl<'c, 'a> Mangler<'c, 'a> {
    fn new(ctx: &'c mut MangleContext<'a>, path: &str, tree: ScopeTree) -> Self {
        let history: &'a HistoryTable = ctx.history;
        let file_history = history.file(path);
        let history_values = file_history
            .map(|entries| entries.values().cloned().collect())
            .unwrap_or_default();
        let mut report = FileReport::new(path);
        report.diagnostics.clone_from(&tree.diagnostics);
        Self {
            ctx,
            path: path.to_string(),
            tree,
            kept: Vec::new(),
            kept_members: HashSet::new(),
            free_names: HashMap::new(),
            committed: HashMap::new(),
            file_history,
            history_values,
            cache: FileNameCache::default(),
            report,
        }
    }

    fn finish(self) -> UnitOutcome {
        debug!(
            file = %self.path,
            renamed = self.report.renamed,
            from_history = self.report.from_history.len(),
            "mangled"
        );
        UnitOutcome {
            cache: self.cache,
            report: self.report,
            no_binding_names: self.tree.no_binding_names,
        }
    }

    fn config(&self) -> &MangleConfig {
        self.ctx.config
    }

    fn explain(&mut self, name: &str, reason: &str) {
        if self.ctx.config.explain_kept_names {
            self.report.kept.record(name, reason);
        }
    }

    // =========================================================================
    // Assignment walk
    // =========================================================================

    fn assign(&mut self, cm: &SourceMap) -> Result<()> {
        self.reserve_kept();
        self.assign_free_names()?;
        for scope in self.tree.preorder() {
            self.assign_labels(scope)?;
            if self.tree.scopes[scope].kind.is_member_scope() {
                self.assign_members(scope, cm)?;
            } else {
                // Parameter-properties go first so the constructor's plain
                // locals avoid their names.
                self.assign_param_properties(scope)?;
                self.assign_locals(scope)?;
            }
        }
        Ok(())
    }

    fn rule_enabled(&self, rule: RenameRule) -> bool {
        let config = self.config();
        match rule {
            RenameRule::Local => config.identifiers,
            RenameRule::Property(PropertyOrigin::Toplevel) => config.toplevel,
            RenameRule::Property(PropertyOrigin::Export) => config.toplevel && config.export,
            RenameRule::Property(_) => config.property,
        }
    }

    fn keep_reason(&self, id: BindingId, poisoned_refs: &HashSet<BindingId>) -> Option<String> {
        let b = &self.tree.bindings[id];
        let scope = &self.tree.scopes[b.scope];
        let registry = self.ctx.registry;

        if b.ambient {
            return Some("ambient".to_string());
        }
        if self.tree.is_binding_poisoned(id) || poisoned_refs.contains(&id) {
            return Some("malformed-statement".to_string());
        }
        let reserved = match b.rule {
            RenameRule::Local => {
                if scope.kind.is_member_scope() {
                    return Some("member-scope-binding".to_string());
                }
                if scope.has_dynamic_eval {
                    return Some("dynamic-eval".to_string());
                }
                registry.local_reason(&b.name)
            }
            RenameRule::Property(origin) => {
                if origin != PropertyOrigin::Member
                    && origin != PropertyOrigin::ParamProperty
                    && scope.has_dynamic_eval
                {
                    return Some("dynamic-eval".to_string());
                }
                let reason = registry.property_reason(&b.name);
                if reason.is_none() && origin.is_toplevel() {
                    registry.global_reason(&b.name)
                } else {
                    reason
                }
            }
        };
        if let Some(reason) = reserved {
            return Some(reason.to_string());
        }
        if matches!(b.rule, RenameRule::Property(_)) && self.ctx.kept_properties.contains(&b.name) {
            return Some("ambient-member".to_string());
        }
        if !self.rule_enabled(b.rule) {
            return Some("category-disabled".to_string());
        }
        None
    }

    /// Bindings referenced from a malformed statement, whose occurrences
    /// there will not be rewritten.
    fn poisoned_references(&self) -> HashSet<BindingId> {
        if self.tree.poisoned.is_empty() {
            return HashSet::new();
        }
        self.tree
            .occurrences
            .iter()
            .filter_map(|(&(lo, hi), target)| match target {
                Target::Binding(id) if self.in_poisoned(lo, hi) => Some(*id),
                _ => None,
            })
            .collect()
    }

    fn in_poisoned(&self, lo: u32, hi: u32) -> bool {
        self.tree
            .poisoned
            .iter()
            .any(|p| p.lo.0 <= lo && hi <= p.hi.0)
    }

    /// Name every unresolved reference before any local is named, so locals
    /// avoid the result. A name also referenced from a malformed statement
    /// keeps its text, since that occurrence is not rewritten; so does every
    /// one in a file that reaches `eval` or `with`.
    fn assign_free_names(&mut self) -> Result<()> {
        if !self.config().toplevel {
            return Ok(());
        }
        let dynamic = self.tree.root().has_dynamic_eval;
        let mut names: BTreeMap<String, bool> = BTreeMap::new();
        for (&(lo, hi), target) in &self.tree.occurrences {
            if let Target::Free(name) = target {
                let poisoned = self.in_poisoned(lo, hi);
                *names.entry(name.clone()).or_default() |= poisoned;
            }
        }
        for (name, poisoned) in names {
            let mangled = if poisoned {
                self.explain(&name, "malformed-statement");
                None
            } else if dynamic {
                self.explain(&name, "dynamic-eval");
                None
            } else {
                let key = format!("#{name}");
                self.property_name(&name, Some(&key), PropertyOrigin::Toplevel, Some(ScopeTree::ROOT))?
            };
            self.free_names.insert(name, mangled);
        }
        Ok(())
    }

    /// Final text of an unresolved reference, if it changes.
    pub(crate) fn free_name(&self, name: &str) -> Option<&str> {
        self.free_names.get(name)?.as_deref()
    }

    fn reserve_kept(&mut self) {
        let poisoned_refs = self.poisoned_references();
        let kept: Vec<Option<String>> = (0..self.tree.bindings.len())
            .map(|id| self.keep_reason(id, &poisoned_refs))
            .collect();
        self.kept = kept;

        for id in 0..self.tree.bindings.len() {
            let Some(reason) = self.kept[id].clone() else {
                continue;
            };
            let b = &self.tree.bindings[id];
            let (name, scope, rule, kind) = (b.name.clone(), b.scope, b.rule, b.kind);
            self.explain(&name, &reason);
            if matches!(
                rule,
                RenameRule::Property(
                    PropertyOrigin::Member
                        | PropertyOrigin::ParamProperty
                        | PropertyOrigin::NamespaceMember
                )
            ) {
                self.kept_members.insert(name.clone());
            }
            // Member names and export aliases never shadow identifiers.
            if rule != RenameRule::Property(PropertyOrigin::Member) && kind != BindingKind::ExportAlias {
                self.tree.mark_used(scope, &name);
            }
        }
    }

    fn assign_labels(&mut self, scope: ScopeId) -> Result<()> {
        let labels = self.tree.scopes[scope].labels.clone();
        if labels.is_empty() || !self.config().identifiers {
            return Ok(());
        }
        let mut generator = build_generator(&self.config().generator);
        for id in labels {
            let label = &self.tree.labels[id];
            let poisoned = self.tree.is_poisoned(label.span)
                || label.references.iter().any(|r| self.tree.is_poisoned(*r));
            if poisoned {
                let name = label.name.clone();
                self.explain(&name, "malformed-statement");
                continue;
            }

            let mut outer = HashSet::new();
            let mut parent = label.parent;
            while let Some(p) = parent {
                let l = &self.tree.labels[p];
                outer.insert(l.mangled.clone().unwrap_or_else(|| l.name.clone()));
                parent = l.parent;
            }

            let original = label.name.clone();
            let name = draw(generator.as_mut(), &original, |candidate| {
                !self.ctx.registry.is_reserved_global(candidate)
                    && candidate != original
                    && !outer.contains(candidate)
            })?;
            self.tree.labels[id].mangled = Some(name);
            self.report.renamed += 1;
        }
        Ok(())
    }

    fn assign_members(&mut self, scope: ScopeId, cm: &SourceMap) -> Result<()> {
        let bindings = self.tree.scopes[scope].bindings.clone();
        for id in bindings {
            if self.kept[id].is_some() {
                continue;
            }
            let RenameRule::Property(origin) = self.tree.bindings[id].rule else {
                continue;
            };
            let original = self.tree.bindings[id].name.clone();
            let key = self.tree.key(id);
            let Some(name) = self.property_name(&original, Some(&key), origin, Some(scope))? else {
                continue;
            };
            if let Some(span) = self.tree.bindings[id].method_span {
                let start = cm.lookup_char_pos(span.lo).line;
                let end = cm.lookup_char_pos(span.hi).line;
                self.cache
                    .member_method_cache
                    .insert(format!("{original}:{start}:{end}"), name.clone());
            }
            self.set_mangled(id, name);
        }
        Ok(())
    }

    fn assign_param_properties(&mut self, scope: ScopeId) -> Result<()> {
        for id in self.tree.scopes[scope].param_properties.clone() {
            if self.kept[id].is_some() {
                continue;
            }
            let original = self.tree.bindings[id].name.clone();
            let key = self.tree.key(id);
            if let Some(name) = self.property_name(
                &original,
                Some(&key),
                PropertyOrigin::ParamProperty,
                Some(scope),
            )? {
                self.set_mangled(id, name);
            }
        }
        Ok(())
    }

    /// Plain bindings of a non-member scope. Names reused from tables are
    /// settled before any new name is drawn.
    fn assign_locals(&mut self, scope: ScopeId) -> Result<()> {
        let s = &self.tree.scopes[scope];
        let bindings: Vec<BindingId> = s
            .bindings
            .iter()
            .copied()
            .filter(|id| !s.excluded.contains(id))
            .collect();

        let mut pending = Vec::new();
        for id in bindings {
            if self.kept[id].is_some() {
                continue;
            }
            let key = self.tree.key(id);
            match self.tree.bindings[id].rule {
                RenameRule::Property(origin) => {
                    let original = self.tree.bindings[id].name.clone();
                    if self.keeps_for_conflict(&original, origin, Some(scope)) {
                        continue;
                    }
                    match self.reuse_property(&original, Some(&key), origin, Some(scope)) {
                        Some((name, from_history)) => {
                            if from_history {
                                self.report.from_history.push(key.clone());
                            }
                            self.commit_property(&original, Some(&key), origin, Some(scope), &name);
                            self.set_mangled(id, name);
                        }
                        None => pending.push(id),
                    }
                }
                RenameRule::Local => match self.local_history(id, &key) {
                    Some(name) => {
                        self.report.from_history.push(key.clone());
                        self.commit_local(id, &key, name);
                    }
                    None => pending.push(id),
                },
            }
        }
        if pending.is_empty() {
            return Ok(());
        }

        let mut generator = build_generator(&self.config().generator);
        for id in pending {
            let key = self.tree.key(id);
            match self.tree.bindings[id].rule {
                RenameRule::Property(origin) => {
                    let original = self.tree.bindings[id].name.clone();
                    let name = self.mint_property(&original, origin, Some(scope))?;
                    self.commit_property(&original, Some(&key), origin, Some(scope), &name);
                    self.set_mangled(id, name);
                }
                RenameRule::Local => {
                    let name = self.mint_local(id, generator.as_mut())?;
                    self.commit_local(id, &key, name);
                }
            }
        }
        Ok(())
    }

    // =========================================================================
    // Local rule
    // =========================================================================

    fn local_history(&self, id: BindingId, key: &str) -> Option<String> {
        let name = self.file_history?.get(key)?;
        let b = &self.tree.bindings[id];
        let acceptable = !self.ctx.registry.is_reserved_global(name)
            && *name != b.name
            && !self.tree.is_used_in_chain(b.scope, name)
            && !self.ctx.global.contains_value(name);
        acceptable.then(|| name.clone())
    }

    fn mint_local(&self, id: BindingId, generator: &mut dyn NameGenerator) -> Result<String> {
        let b = &self.tree.bindings[id];
        draw(generator, &b.name, |candidate| {
            !self.ctx.registry.is_reserved_global(candidate)
                && candidate != b.name
                && !self.tree.is_used_in_chain(b.scope, candidate)
                && !self.ctx.global.contains_value(candidate)
                && !self.history_values.contains(candidate)
                && !self.ctx.history.is_occupied(candidate)
        })
    }

    fn commit_local(&mut self, id: BindingId, key: &str, name: String) {
        let scope = self.tree.bindings[id].scope;
        self.tree.scopes[scope].used_names.insert(name.clone());
        self.cache
            .identifier_cache
            .insert(key.to_string(), name.clone());
        debug!(file = %self.path, key = %key, name = %name, "local renamed");
        self.set_mangled(id, name);
    }

    fn set_mangled(&mut self, id: BindingId, name: String) {
        let binding = &mut self.tree.bindings[id];
        if name != binding.name {
            self.report.renamed += 1;
        }
        binding.mangled = Some(name);
    }

    // =========================================================================
    // Property rule
    // =========================================================================

    /// Final name of a property-style name, or `None` if it is kept.
    ///
    /// `key` is the scope-qualified key used for the identifier cache and the
    /// file history; `scope` is where the name binds as an identifier, if
    /// anywhere.
    pub(crate) fn property_name(
        &mut self,
        original: &str,
        key: Option<&str>,
        origin: PropertyOrigin,
        scope: Option<ScopeId>,
    ) -> Result<Option<String>> {
        if self.is_kept_property(original, origin) || self.keeps_for_conflict(original, origin, scope) {
            return Ok(None);
        }
        let name = match self.reuse_property(original, key, origin, scope) {
            Some((name, from_history)) => {
                if from_history {
                    self.report
                        .from_history
                        .push(key.unwrap_or(original).to_string());
                }
                name
            }
            None => self.mint_property(original, origin, scope)?,
        };
        self.commit_property(original, key, origin, scope, &name);
        Ok(Some(name))
    }

    fn is_kept_property(&mut self, original: &str, origin: PropertyOrigin) -> bool {
        let registry = self.ctx.registry;
        let reason = registry
            .property_reason(original)
            .or_else(|| {
                if origin.is_toplevel() {
                    registry.global_reason(original)
                } else {
                    None
                }
            })
            .map(|r| r.to_string())
            .or_else(|| {
                self.ctx
                    .kept_properties
                    .contains(original)
                    .then(|| "ambient-member".to_string())
            })
            .or_else(|| {
                (!origin.is_toplevel() && self.kept_members.contains(original))
                    .then(|| "kept-member".to_string())
            });
        match reason {
            Some(reason) => {
                self.explain(original, &reason);
                true
            }
            None => false,
        }
    }

    /// Whether the project-wide name of `original` is already visible, for
    /// another purpose, where this identifier binds. The identifier then keeps
    /// its original text; taking the name would capture the other use.
    fn keeps_for_conflict(&mut self, original: &str, origin: PropertyOrigin, scope: Option<ScopeId>) -> bool {
        let Some(name) = self.ctx.global.get(original) else {
            return false;
        };
        let Some(chain) = Self::chain_scope(origin, scope) else {
            return false;
        };
        let taken = self.tree.is_used_in_chain(chain, name)
            && self.committed.get(name).map(String::as_str) != Some(original);
        if !taken {
            return false;
        }
        warn!(
            file = %self.path,
            name = %original,
            mangled = %name,
            "project-wide name already in use here, keeping original"
        );
        self.tree.mark_used(chain, original);
        if !origin.is_toplevel() {
            // Accesses to the member in this file must keep matching it.
            self.kept_members.insert(original.to_string());
        }
        self.explain(original, "name-conflict");
        true
    }

    /// Scope whose chain a property-style name must not shadow.
    fn chain_scope(origin: PropertyOrigin, scope: Option<ScopeId>) -> Option<ScopeId> {
        match origin {
            PropertyOrigin::Member => None,
            _ if origin.is_toplevel() => Some(scope.unwrap_or(ScopeTree::ROOT)),
            _ => scope,
        }
    }

    fn property_candidate_ok(
        &self,
        candidate: &str,
        original: &str,
        origin: PropertyOrigin,
        scope: Option<ScopeId>,
        fresh: bool,
    ) -> bool {
        let registry = self.ctx.registry;
        if registry.is_reserved_property(candidate) || registry.is_reserved_global(candidate) {
            return false;
        }
        if candidate == original || self.ctx.global.contains_value(candidate) {
            return false;
        }
        if Self::chain_scope(origin, scope).is_some_and(|s| self.tree.is_used_in_chain(s, candidate)) {
            return false;
        }
        let config = self.config();
        if origin.is_toplevel() && config.toplevel && config.export && config.guard_file_export_names {
            let root = self.tree.root();
            if root.imports.contains(candidate) || root.exports.contains(candidate) {
                return false;
            }
        }
        if self.ctx.kept_properties.contains(candidate) || self.kept_members.contains(candidate) {
            return false;
        }
        !fresh
            || (!self.history_values.contains(candidate) && !self.ctx.history.is_occupied(candidate))
    }

    /// Name from the current global table, the previous global table or the
    /// file history, in that order. The flag tells whether it came from the
    /// previous build.
    fn reuse_property(
        &self,
        original: &str,
        key: Option<&str>,
        origin: PropertyOrigin,
        scope: Option<ScopeId>,
    ) -> Option<(String, bool)> {
        if let Some(name) = self.ctx.global.get(original) {
            return Some((name.to_string(), false));
        }
        let acceptable =
            |name: &&str| self.property_candidate_ok(name, original, origin, scope, false);
        if let Some(name) = self.ctx.history.previous_global(original).filter(acceptable) {
            return Some((name.to_string(), true));
        }
        key.and_then(|k| self.file_history?.get(k))
            .map(String::as_str)
            .filter(acceptable)
            .map(|name| (name.to_string(), true))
    }

    fn mint_property(
        &mut self,
        original: &str,
        origin: PropertyOrigin,
        scope: Option<ScopeId>,
    ) -> Result<String> {
        for _ in 0..MAX_NAME_ATTEMPTS {
            let candidate = self.ctx.generator.next_name();
            if self.property_candidate_ok(&candidate, original, origin, scope, true) {
                return Ok(candidate);
            }
        }
        Err(Error::NameSpaceExhausted {
            original: original.to_string(),
            attempts: MAX_NAME_ATTEMPTS,
        })
    }

    fn commit_property(
        &mut self,
        original: &str,
        key: Option<&str>,
        origin: PropertyOrigin,
        scope: Option<ScopeId>,
        name: &str,
    ) {
        self.ctx.global.insert(original, name);
        self.committed.insert(name.to_string(), original.to_string());
        if let Some(scope) = scope.or_else(|| Self::chain_scope(origin, None)) {
            self.tree.mark_used(scope, name);
        }
        if let Some(key) = key {
            self.cache
                .identifier_cache
                .insert(key.to_string(), name.to_string());
        }
    }
}

/// Draw candidates until `accept` takes one.
fn draw(
    generator: &mut dyn NameGenerator,
    original: &str,
    mut accept: impl FnMut(&str) -> bool,
) -> Result<String> {
    for _ in 0..MAX_NAME_ATTEMPTS {
        let candidate = generator.next_name();
        if accept(&candidate) {
            return Ok(candidate);
        }
    }
    Err(Error::NameSpaceExhausted {
        original: original.to_string(),
        attempts: MAX_NAME_ATTEMPTS,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::NameCache;
    use crate::generator::OrderedNameGenerator;
    use crate::source::{parse_source, print};

    struct Fixture {
        config: MangleConfig,
        registry: WhitelistRegistry,
        global: GlobalMangledTable,
        history: HistoryTable,
        generator: OrderedNameGenerator,
        kept_properties: HashSet<String>,
    }

    impl Fixture {
        fn new(config: MangleConfig) -> Self {
            let registry = WhitelistRegistry::from_config(&config).unwrap();
            Self {
                config,
                registry,
                global: GlobalMangledTable::new(),
                history: HistoryTable::new(),
                generator: OrderedNameGenerator::default(),
                kept_properties: HashSet::new(),
            }
        }

        fn run(&mut self, path: &str, src: &str) -> (String, UnitOutcome) {
            let mut unit = parse_source(path, src).unwrap();
            let mut ctx = MangleContext {
                config: &self.config,
                registry: &self.registry,
                global: &mut self.global,
                history: &self.history,
                generator: &mut self.generator,
                kept_properties: &self.kept_properties,
            };
            let outcome = mangle_unit(&mut ctx, &mut unit).unwrap();
            (print(&unit).unwrap(), outcome)
        }
    }

    fn mangle_with(config: MangleConfig, src: &str) -> String {
        Fixture::new(config).run("a.ts", src).0
    }

    #[test]
    fn test_locals_renamed() {
        let result = mangle_with(
            MangleConfig::default(),
            "function foo(longParam, anotherParam) { return longParam + anotherParam; }",
        );
        assert!(result.contains("function foo"));
        assert!(!result.contains("longParam"));
        assert!(!result.contains("anotherParam"));
        assert!(result.contains("return a + b"));
    }

    #[test]
    fn test_free_names_not_taken() {
        let result = mangle_with(
            MangleConfig::default(),
            "function f(x) { return a + x; }",
        );
        // `a` is a free reference; the parameter must not become `a`.
        assert!(result.contains("function f(b)"));
        assert!(result.contains("return a + b"));
    }

    #[test]
    fn test_sibling_scopes_reuse_names() {
        let result = mangle_with(
            MangleConfig::default(),
            "function f1() { let x = 1; return x; }\nfunction f2() { let y = 2; return y; }",
        );
        assert!(result.contains("let a = 1"));
        assert!(result.contains("let a = 2"));
    }

    #[test]
    fn test_inner_scope_avoids_outer_names() {
        let result = mangle_with(
            MangleConfig::default(),
            "function f() { let outer = 1; { let inner = 2; use(outer, inner); } }",
        );
        assert!(result.contains("let a = 1"));
        assert!(result.contains("let b = 2"));
        assert!(result.contains("use(a, b)"));
    }

    #[test]
    fn test_toplevel_disabled_by_default() {
        let result = mangle_with(MangleConfig::default(), "const myVariable = 1; log(myVariable);");
        assert!(result.contains("const myVariable = 1"));
    }

    #[test]
    fn test_toplevel_renamed_when_enabled() {
        let result = mangle_with(
            MangleConfig::default().with_toplevel(true),
            "const myVariable = 1; console.log(myVariable);",
        );
        assert!(result.contains("const a = 1"));
        assert!(result.contains("console.log(a)"));
    }

    #[test]
    fn test_param_property_with_property_obfuscation() {
        let mut fixture = Fixture::new(MangleConfig::default().with_property(true));
        let (result, outcome) = fixture.run(
            "a.ts",
            "class A { p = 5; constructor(public x: number) { use(x); } }",
        );
        assert!(result.contains("a = 5"));
        assert!(result.contains("public b: number"));
        assert!(result.contains("use(b)"));
        assert_eq!(fixture.global.get("p"), Some("a"));
        assert_eq!(fixture.global.get("x"), Some("b"));
        assert_eq!(
            outcome.cache.identifier_cache.get("A.constructor#x").map(String::as_str),
            Some("b")
        );
    }

    #[test]
    fn test_param_property_untouched_without_property_obfuscation() {
        let result = mangle_with(
            MangleConfig::default(),
            "class A { p = 5; constructor(public x: number, y: number) { use(x, y); } }",
        );
        assert!(result.contains("p = 5"));
        assert!(result.contains("public x: number"));
        assert!(result.contains("use(x, a)"));
    }

    #[test]
    fn test_member_method_cache() {
        let mut fixture = Fixture::new(MangleConfig::default().with_property(true));
        let (result, outcome) = fixture.run(
            "a.ts",
            "class Runner {\n  run() {\n    return 1;\n  }\n}\nnew Runner().run();",
        );
        assert!(result.contains("new Runner().a()"));
        assert_eq!(
            outcome.cache.member_method_cache.get("run:2:4").map(String::as_str),
            Some("a")
        );
    }

    #[test]
    fn test_reserved_properties_kept() {
        let result = mangle_with(
            MangleConfig::default().with_property(true),
            "const o = { length: 1, width: 2 }; console.log(o.length, o.width);",
        );
        assert!(result.contains("length: 1"));
        assert!(result.contains("a: 2"));
        assert!(result.contains("console.log(o.length, o.a)"));
    }

    #[test]
    fn test_eval_scope_kept() {
        let result = mangle_with(
            MangleConfig::default(),
            "function f(keep) { eval('keep'); } function g(gone) { return gone; }",
        );
        assert!(result.contains("function f(keep)"));
        assert!(!result.contains("gone"));
    }

    #[test]
    fn test_labels_avoid_ancestor_labels() {
        let mut fixture = Fixture::new(MangleConfig::default());
        let (result, outcome) = fixture.run(
            "a.js",
            "outer: for (;;) { inner: for (;;) { break outer; } }",
        );
        assert!(result.contains("a: for"));
        assert!(result.contains("b: for"));
        assert!(result.contains("break a"));
        assert_eq!(outcome.report.renamed, 2);
    }

    #[test]
    fn test_history_reused() {
        let mut cache = NameCache::default();
        let mut file = FileNameCache::default();
        file.identifier_cache.insert("f#value".into(), "q".into());
        cache.files.insert("a.ts".into(), file);

        let mut fixture = Fixture::new(MangleConfig::default());
        fixture.history = HistoryTable::from_cache(&cache);
        let (result, outcome) = fixture.run("a.ts", "function f(value, other) { return value + other; }");
        assert!(result.contains("function f(q, a)"));
        assert_eq!(outcome.report.from_history, vec!["f#value".to_string()]);
    }

    #[test]
    fn test_keep_names_explained() {
        let config = MangleConfig::default()
            .with_keep_names(["keepMe"])
            .with_explain_kept_names(true);
        let mut fixture = Fixture::new(config);
        let (result, outcome) = fixture.run("a.ts", "function f(keepMe, drop) { return keepMe + drop; }");
        assert!(result.contains("function f(keepMe, a)"));
        assert!(outcome
            .report
            .kept
            .reasons("keepMe")
            .is_some_and(|r| r.contains("keep-name")));
    }

    #[test]
    fn test_ambient_property_names() {
        let unit = parse_source("env.d.ts", "interface Env { apiKey: string } declare namespace Sdk { export const version: string; }").unwrap();
        let tree = scope::analyze(&unit.module, &unit.path, unit.is_declaration);
        let names = ambient_property_names(&tree);
        assert!(names.contains(&"apiKey".to_string()));
        assert!(names.contains(&"version".to_string()));
    }

    #[test]
    fn test_exhausted_name_space() {
        struct Stuck;
        impl NameGenerator for Stuck {
            fn next_name(&mut self) -> String {
                "if".to_string()
            }
            fn reset(&mut self) {}
        }
        let err = draw(&mut Stuck, "x", |c| c != "if").unwrap_err();
        assert!(matches!(err, Error::NameSpaceExhausted { .. }));
    }

    #[test]
    fn test_project_name_kept_out_where_visible() {
        let config = MangleConfig::default()
            .with_toplevel(true)
            .with_explain_kept_names(true);
        let mut fixture = Fixture::new(config);
        // Another file already named the member `foo` as `a`.
        fixture.global.insert("foo", "a");
        let (result, outcome) = fixture.run("m.js", "const foo = 1; console.log(a, foo);");
        assert!(result.contains("const foo = 1"));
        assert!(result.contains("console.log(b, foo)"));
        assert!(outcome
            .report
            .kept
            .reasons("foo")
            .is_some_and(|r| r.contains("name-conflict")));
    }

    #[test]
    fn test_namespace_member_kept_out_where_visible() {
        let mut fixture = Fixture::new(MangleConfig::default().with_property(true));
        fixture.global.insert("foo", "a");
        let (result, _) = fixture.run(
            "n.ts",
            "namespace N { export const foo = 1; function g() { return a + foo; } }",
        );
        assert!(result.contains("export const foo = 1"));
        assert!(result.contains("return a + foo"));

        let (result, _) = fixture.run("u.ts", "namespace M { export const foo = 1; } M.foo; a;");
        assert!(result.contains("M.foo"));
    }

    #[test]
    fn test_free_names_share_project_names() {
        let mut fixture = Fixture::new(MangleConfig::default().with_toplevel(true));
        let (result, outcome) = fixture.run("m.js", "function run(x) { return helper(x); }");
        let helper = fixture.global.get("helper").unwrap().to_string();
        assert!(result.contains(&format!("return {helper}(")));
        assert!(!result.contains(&format!("({helper})")));
        assert!(outcome.no_binding_names.contains("helper"));

        let (result, _) = fixture.run("h.js", "function helper(v) { return v * 2; }");
        assert!(result.contains(&format!("function {helper}(")));
    }

    #[test]
    fn test_free_names_kept_with_eval() {
        let result = mangle_with(
            MangleConfig::default().with_toplevel(true),
            "function run() { eval('1'); return helper(); }",
        );
        assert!(result.contains("return helper()"));
        assert!(result.contains("function run()"));
    }

    #[test]
    fn test_previous_global_values_not_minted() {
        let mut cache = NameCache::default();
        cache.global_table.insert("other".into(), "a".into());
        cache.global_table.insert("more".into(), "b".into());

        let mut fixture = Fixture::new(MangleConfig::default().with_property(true));
        fixture.history = HistoryTable::from_cache(&cache);
        let (result, _) = fixture.run("a.js", "function f(value) { return value; }");
        assert!(result.contains("function f(c)"));

        let (result, _) = fixture.run("b.js", "const o = { width: 1 }; use(o.width);");
        assert!(result.contains("c: 1"));
        assert!(result.contains("use(o.c)"));
    }

    #[test]
    fn test_file_history_values_not_minted() {
        let mut cache = NameCache::default();
        let mut file = FileNameCache::default();
        file.identifier_cache.insert("gone#old".into(), "a".into());
        cache.files.insert("a.ts".into(), file);

        let mut fixture = Fixture::new(MangleConfig::default());
        fixture.history = HistoryTable::from_cache(&cache);
        let (result, outcome) = fixture.run("a.ts", "function f(value) { return value; }");
        assert!(result.contains("function f(b)"));
        assert!(outcome.report.from_history.is_empty());
    }

    #[test]
    fn test_file_import_names_guarded() {
        let src = "import { a as local } from 'm';\nconst longName = local;\nexport { longName };";
        let config = MangleConfig::default().with_toplevel(true).with_export(true);

        let mut fixture = Fixture::new(config.clone());
        fixture.run("a.ts", src);
        assert_ne!(fixture.global.get("local"), Some("a"));
        assert_ne!(fixture.global.get("longName"), Some("a"));

        let mut unguarded = config;
        unguarded.guard_file_export_names = false;
        let mut fixture = Fixture::new(unguarded);
        fixture.run("a.ts", src);
        assert_eq!(fixture.global.get("local"), Some("a"));
    }
}
