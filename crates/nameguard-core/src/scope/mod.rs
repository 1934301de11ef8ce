//! Lexical scope model for one source unit.
//!
//! The tree is an arena: scopes, bindings and labels are addressed by index
//! and refer to each other by id. It is built by [`analyzer::analyze`],
//! updated by the mangling walk of the same file and dropped afterwards.

pub mod analyzer;

use crate::report::Diagnostic;
use std::collections::{BTreeSet, HashMap, HashSet};
use swc_common::Span;

pub use analyzer::analyze;

pub type ScopeId = usize;
pub type BindingId = usize;
pub type LabelId = usize;

/// Position of an identifier node, `(lo, hi)`.
pub type SpanKey = (u32, u32);

#[must_use]
pub fn span_key(span: Span) -> SpanKey {
    (span.lo.0, span.hi.0)
}

// =============================================================================
// Scopes
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    /// Root of a script.
    Global,
    /// Root of an ES module, or a TS namespace / module declaration.
    Module,
    Function,
    Class,
    For,
    Switch,
    Block,
    /// Interfaces and type aliases.
    Interface,
    Catch,
    Enum,
    ObjectLiteral,
}

impl ScopeKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::Module => "module",
            Self::Function => "function",
            Self::Class => "class",
            Self::For => "for",
            Self::Switch => "switch",
            Self::Block => "block",
            Self::Interface => "interface",
            Self::Catch => "catch",
            Self::Enum => "enum",
            Self::ObjectLiteral => "object",
        }
    }

    /// Scopes whose bindings are mostly property names.
    #[must_use]
    pub fn is_member_scope(&self) -> bool {
        matches!(
            self,
            Self::Class | Self::Interface | Self::Enum | Self::ObjectLiteral
        )
    }

    /// Where `var` declarations land.
    #[must_use]
    pub fn is_hoist_target(&self) -> bool {
        matches!(self, Self::Global | Self::Module | Self::Function)
    }
}

#[derive(Debug)]
pub struct Scope {
    pub kind: ScopeKind,
    pub span: Span,
    /// Local name: the declared name, or `<kind>@<n>` when anonymous.
    pub name: String,
    /// Dotted location path, unique within the file. Empty for the root.
    pub path: String,
    pub parent: Option<ScopeId>,
    pub children: Vec<ScopeId>,
    /// Bindings declared directly here, in declaration order.
    pub bindings: Vec<BindingId>,
    /// Bindings not renamed by the local walk of this scope.
    pub excluded: BTreeSet<BindingId>,
    /// Constructor parameter-properties declared in this scope.
    pub param_properties: Vec<BindingId>,
    pub labels: Vec<LabelId>,
    /// Import names (root only).
    pub imports: BTreeSet<String>,
    /// Export surface names (root only).
    pub exports: BTreeSet<String>,
    /// Names, original or mangled, that a new name here must not take.
    pub used_names: HashSet<String>,
    pub ambient: bool,
    pub has_dynamic_eval: bool,
    /// Name → binding, for bindings visible to references.
    names: HashMap<String, BindingId>,
    /// Name → member binding (class, interface, enum and object members).
    members: HashMap<String, BindingId>,
    anonymous: usize,
}

impl Scope {
    fn new(kind: ScopeKind, span: Span, name: String, path: String, parent: Option<ScopeId>) -> Self {
        Self {
            kind,
            span,
            name,
            path,
            parent,
            children: Vec::new(),
            bindings: Vec::new(),
            excluded: BTreeSet::new(),
            param_properties: Vec::new(),
            labels: Vec::new(),
            imports: BTreeSet::new(),
            exports: BTreeSet::new(),
            used_names: HashSet::new(),
            ambient: false,
            has_dynamic_eval: false,
            names: HashMap::new(),
            members: HashMap::new(),
            anonymous: 0,
        }
    }

    #[must_use]
    pub fn binding_named(&self, name: &str) -> Option<BindingId> {
        self.names.get(name).copied()
    }
}

// =============================================================================
// Bindings
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingKind {
    Var,
    Let,
    Const,
    Function,
    Class,
    Param,
    CatchParam,
    Import,
    TypeParam,
    Interface,
    TypeAlias,
    Enum,
    Namespace,
    Member,
    ParamProperty,
    ExportAlias,
}

impl BindingKind {
    /// Kinds never reachable by a plain identifier reference.
    #[must_use]
    pub fn is_hidden(&self) -> bool {
        matches!(self, Self::Member | Self::ExportAlias)
    }
}

/// Why a binding is renamed through the global table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyOrigin {
    /// Class, interface, enum or object-literal member.
    Member,
    /// Constructor parameter-property.
    ParamProperty,
    /// Exported member of a namespace, reachable as `ns.name`.
    NamespaceMember,
    /// Non-exported file-scope binding.
    Toplevel,
    /// Exported file-scope binding or export alias.
    Export,
}

impl PropertyOrigin {
    /// Origins whose names are visible to other files as identifiers.
    #[must_use]
    pub fn is_toplevel(&self) -> bool {
        matches!(self, Self::Toplevel | Self::Export)
    }
}

/// How a binding's new name is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenameRule {
    /// Unique within the scopes that can see it.
    Local,
    /// Consistent project-wide, keyed by the original name.
    Property(PropertyOrigin),
}

#[derive(Debug, Clone)]
pub struct Binding {
    pub name: String,
    pub kind: BindingKind,
    pub scope: ScopeId,
    /// Declaration sites.
    pub sites: Vec<Span>,
    pub rule: RenameRule,
    pub exported: bool,
    /// For export aliases, the local binding they re-export.
    pub alias_of: Option<BindingId>,
    pub ambient: bool,
    /// Span of the method body when this member is a class method.
    pub method_span: Option<Span>,
    /// Committed new name.
    pub mangled: Option<String>,
}

impl Binding {
    /// The name occurrences of this binding print as.
    #[must_use]
    pub fn final_name(&self) -> &str {
        self.mangled.as_deref().unwrap_or(&self.name)
    }
}

// =============================================================================
// Labels and occurrences
// =============================================================================

#[derive(Debug, Clone)]
pub struct Label {
    pub name: String,
    pub span: Span,
    pub scope: ScopeId,
    /// Innermost enclosing label of the same function.
    pub parent: Option<LabelId>,
    pub references: Vec<Span>,
    pub mangled: Option<String>,
}

/// What an identifier occurrence resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Binding(BindingId),
    Label(LabelId),
    /// Import/export specifier name with no local declaration.
    NoBinding(String),
    /// Unresolved reference.
    Free(String),
    /// Identifier-typed property name outside any member scope.
    Property(String),
}

// =============================================================================
// Tree
// =============================================================================

#[derive(Debug)]
pub struct ScopeTree {
    pub scopes: Vec<Scope>,
    pub bindings: Vec<Binding>,
    pub labels: Vec<Label>,
    pub occurrences: HashMap<SpanKey, Target>,
    /// Statements whose analysis failed.
    pub poisoned: Vec<Span>,
    pub diagnostics: Vec<Diagnostic>,
    /// Names seen as [`Target::NoBinding`] or [`Target::Free`].
    pub no_binding_names: BTreeSet<String>,
    children_by_name: HashMap<(ScopeId, String), ScopeId>,
}

impl ScopeTree {
    pub const ROOT: ScopeId = 0;

    #[must_use]
    pub fn new(root_kind: ScopeKind, span: Span) -> Self {
        Self {
            scopes: vec![Scope::new(root_kind, span, String::new(), String::new(), None)],
            bindings: Vec::new(),
            labels: Vec::new(),
            occurrences: HashMap::new(),
            poisoned: Vec::new(),
            diagnostics: Vec::new(),
            no_binding_names: BTreeSet::new(),
            children_by_name: HashMap::new(),
        }
    }

    #[must_use]
    pub fn root(&self) -> &Scope {
        &self.scopes[Self::ROOT]
    }

    /// Open a child scope, sharing an existing same-path scope of the same
    /// kind (overloads, accessor pairs, declaration merging).
    pub fn add_scope(
        &mut self,
        parent: ScopeId,
        kind: ScopeKind,
        name: Option<&str>,
        span: Span,
    ) -> ScopeId {
        let local = match name {
            Some(name) => {
                if let Some(&existing) = self.children_by_name.get(&(parent, name.to_string())) {
                    if self.scopes[existing].kind == kind {
                        return existing;
                    }
                    let alt = format!("{name}@{}", kind.as_str());
                    if let Some(&existing) = self.children_by_name.get(&(parent, alt.clone())) {
                        return existing;
                    }
                    alt
                } else {
                    name.to_string()
                }
            }
            None => {
                let n = self.scopes[parent].anonymous;
                self.scopes[parent].anonymous += 1;
                format!("{}@{n}", kind.as_str())
            }
        };

        let id = self.scopes.len();
        let parent_path = &self.scopes[parent].path;
        let path = if parent_path.is_empty() {
            local.clone()
        } else {
            format!("{parent_path}.{local}")
        };
        let mut scope = Scope::new(kind, span, local.clone(), path, Some(parent));
        scope.ambient = self.scopes[parent].ambient;
        self.scopes.push(scope);
        self.scopes[parent].children.push(id);
        self.children_by_name.insert((parent, local), id);
        id
    }

    /// Nearest scope that receives `var` declarations.
    #[must_use]
    pub fn hoist_target(&self, scope: ScopeId) -> ScopeId {
        let mut current = scope;
        loop {
            if self.scopes[current].kind.is_hoist_target() {
                return current;
            }
            match self.scopes[current].parent {
                Some(parent) => current = parent,
                None => return current,
            }
        }
    }

    /// Declare `name` in `scope`. A second declaration of the same name
    /// adds a site to the existing binding.
    pub fn declare(
        &mut self,
        scope: ScopeId,
        name: &str,
        kind: BindingKind,
        span: Span,
    ) -> BindingId {
        let existing = if kind == BindingKind::Member {
            self.scopes[scope].members.get(name).copied()
        } else if kind == BindingKind::ExportAlias {
            None
        } else {
            self.scopes[scope].names.get(name).copied()
        };
        if let Some(id) = existing {
            if !span.is_dummy() {
                self.bindings[id].sites.push(span);
                self.occurrences.insert(span_key(span), Target::Binding(id));
            }
            return id;
        }

        let id = self.bindings.len();
        self.bindings.push(Binding {
            name: name.to_string(),
            kind,
            scope,
            sites: vec![span],
            rule: RenameRule::Local,
            exported: false,
            alias_of: None,
            ambient: self.scopes[scope].ambient,
            method_span: None,
            mangled: None,
        });
        let s = &mut self.scopes[scope];
        s.bindings.push(id);
        match kind {
            BindingKind::Member => {
                s.members.insert(name.to_string(), id);
            }
            BindingKind::ExportAlias => {}
            _ => {
                s.names.insert(name.to_string(), id);
            }
        }
        if !span.is_dummy() {
            self.occurrences.insert(span_key(span), Target::Binding(id));
        }
        id
    }

    /// Resolve a reference by walking the scope chain.
    #[must_use]
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<BindingId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let s = &self.scopes[id];
            if let Some(&binding) = s.names.get(name) {
                return Some(binding);
            }
            // Enum initializers may refer to sibling members by bare name.
            if s.kind == ScopeKind::Enum {
                if let Some(&binding) = s.members.get(name) {
                    return Some(binding);
                }
            }
            current = s.parent;
        }
        None
    }

    /// Flag a scope and all its ancestors as reachable by `eval` / `with`.
    pub fn mark_dynamic_eval(&mut self, scope: ScopeId) {
        let mut current = Some(scope);
        while let Some(id) = current {
            self.scopes[id].has_dynamic_eval = true;
            current = self.scopes[id].parent;
        }
    }

    /// Record `name` as used in `scope` and every ancestor.
    pub fn mark_used(&mut self, scope: ScopeId, name: &str) {
        let mut current = Some(scope);
        while let Some(id) = current {
            self.scopes[id].used_names.insert(name.to_string());
            current = self.scopes[id].parent;
        }
    }

    /// Whether `name` is used by `scope` or any ancestor.
    #[must_use]
    pub fn is_used_in_chain(&self, scope: ScopeId, name: &str) -> bool {
        let mut current = Some(scope);
        while let Some(id) = current {
            if self.scopes[id].used_names.contains(name) {
                return true;
            }
            current = self.scopes[id].parent;
        }
        false
    }

    #[must_use]
    pub fn is_poisoned(&self, span: Span) -> bool {
        self.poisoned
            .iter()
            .any(|p| p.lo <= span.lo && span.hi <= p.hi)
    }

    /// Whether any declaration site of a binding lies in a poisoned span.
    #[must_use]
    pub fn is_binding_poisoned(&self, binding: BindingId) -> bool {
        self.bindings[binding].sites.iter().any(|s| self.is_poisoned(*s))
    }

    /// Scope-qualified key of a binding, `path#name`.
    #[must_use]
    pub fn key(&self, binding: BindingId) -> String {
        let b = &self.bindings[binding];
        format!("{}#{}", self.scopes[b.scope].path, b.name)
    }

    #[must_use]
    pub fn target(&self, span: Span) -> Option<&Target> {
        self.occurrences.get(&span_key(span))
    }

    /// Scope ids in pre-order: root, then children in creation order.
    #[must_use]
    pub fn preorder(&self) -> Vec<ScopeId> {
        let mut order = Vec::with_capacity(self.scopes.len());
        let mut stack = vec![Self::ROOT];
        while let Some(id) = stack.pop() {
            order.push(id);
            for &child in self.scopes[id].children.iter().rev() {
                stack.push(child);
            }
        }
        order
    }

    /// Scope path → scope id, for lookups by location.
    #[must_use]
    pub fn scope_by_path(&self, path: &str) -> Option<ScopeId> {
        self.scopes.iter().position(|s| s.path == path)
    }

    /// Assign every binding its rename rule once exports are known.
    pub(crate) fn classify(&mut self) {
        for id in 0..self.bindings.len() {
            let b = &self.bindings[id];
            let scope = &self.scopes[b.scope];
            let rule = match b.kind {
                BindingKind::Member => RenameRule::Property(PropertyOrigin::Member),
                BindingKind::ParamProperty => RenameRule::Property(PropertyOrigin::ParamProperty),
                BindingKind::ExportAlias => RenameRule::Property(PropertyOrigin::Export),
                BindingKind::TypeParam => RenameRule::Local,
                _ if b.scope == Self::ROOT => {
                    if b.exported {
                        RenameRule::Property(PropertyOrigin::Export)
                    } else {
                        RenameRule::Property(PropertyOrigin::Toplevel)
                    }
                }
                _ if scope.kind == ScopeKind::Module && b.exported => {
                    RenameRule::Property(PropertyOrigin::NamespaceMember)
                }
                _ => RenameRule::Local,
            };
            self.bindings[id].rule = rule;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swc_common::{BytePos, DUMMY_SP};

    fn span(lo: u32, hi: u32) -> Span {
        Span::new(BytePos(lo), BytePos(hi))
    }

    #[test]
    fn test_paths_and_anonymous_names() {
        let mut tree = ScopeTree::new(ScopeKind::Module, DUMMY_SP);
        let f = tree.add_scope(ScopeTree::ROOT, ScopeKind::Function, Some("f"), span(1, 10));
        let b0 = tree.add_scope(f, ScopeKind::Block, None, span(2, 5));
        let b1 = tree.add_scope(f, ScopeKind::Block, None, span(5, 8));
        assert_eq!(tree.scopes[f].path, "f");
        assert_eq!(tree.scopes[b0].path, "f.block@0");
        assert_eq!(tree.scopes[b1].path, "f.block@1");
    }

    #[test]
    fn test_same_path_scopes_are_shared() {
        let mut tree = ScopeTree::new(ScopeKind::Module, DUMMY_SP);
        let a = tree.add_scope(ScopeTree::ROOT, ScopeKind::Function, Some("f"), span(1, 2));
        let b = tree.add_scope(ScopeTree::ROOT, ScopeKind::Function, Some("f"), span(3, 4));
        let c = tree.add_scope(ScopeTree::ROOT, ScopeKind::Module, Some("f"), span(5, 6));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(tree.scopes[c].path, "f@module");
        assert_eq!(tree.root().children.len(), 2);
    }

    #[test]
    fn test_lookup_skips_members() {
        let mut tree = ScopeTree::new(ScopeKind::Module, DUMMY_SP);
        let class = tree.add_scope(ScopeTree::ROOT, ScopeKind::Class, Some("A"), span(1, 20));
        let outer = tree.declare(ScopeTree::ROOT, "x", BindingKind::Let, span(30, 31));
        tree.declare(class, "x", BindingKind::Member, span(5, 6));
        assert_eq!(tree.lookup(class, "x"), Some(outer));
    }

    #[test]
    fn test_redeclaration_adds_site() {
        let mut tree = ScopeTree::new(ScopeKind::Module, DUMMY_SP);
        let a = tree.declare(ScopeTree::ROOT, "v", BindingKind::Var, span(1, 2));
        let b = tree.declare(ScopeTree::ROOT, "v", BindingKind::Var, span(8, 9));
        assert_eq!(a, b);
        assert_eq!(tree.bindings[a].sites.len(), 2);
        assert_eq!(tree.key(a), "#v");
    }

    #[test]
    fn test_used_names_propagate_up() {
        let mut tree = ScopeTree::new(ScopeKind::Module, DUMMY_SP);
        let f = tree.add_scope(ScopeTree::ROOT, ScopeKind::Function, Some("f"), span(1, 10));
        let g = tree.add_scope(f, ScopeKind::Function, Some("g"), span(2, 9));
        tree.mark_used(g, "a");
        assert!(tree.is_used_in_chain(ScopeTree::ROOT, "a"));
        assert!(tree.is_used_in_chain(g, "a"));
        tree.mark_used(ScopeTree::ROOT, "b");
        assert!(tree.is_used_in_chain(g, "b"));
        assert!(!tree.scopes[g].used_names.contains("b"));
    }

    #[test]
    fn test_preorder() {
        let mut tree = ScopeTree::new(ScopeKind::Module, DUMMY_SP);
        let f = tree.add_scope(ScopeTree::ROOT, ScopeKind::Function, Some("f"), span(1, 10));
        let inner = tree.add_scope(f, ScopeKind::Block, None, span(2, 3));
        let g = tree.add_scope(ScopeTree::ROOT, ScopeKind::Function, Some("g"), span(11, 20));
        assert_eq!(tree.preorder(), vec![ScopeTree::ROOT, f, inner, g]);
    }

    #[test]
    fn test_poisoned_spans() {
        let mut tree = ScopeTree::new(ScopeKind::Module, DUMMY_SP);
        tree.poisoned.push(span(10, 20));
        assert!(tree.is_poisoned(span(12, 13)));
        assert!(!tree.is_poisoned(span(19, 21)));
    }
}
