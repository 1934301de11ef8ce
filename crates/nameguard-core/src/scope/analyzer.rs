//! Scope analysis: one traversal of a module building its [`ScopeTree`].
//!
//! Declarations are recorded as they are met; references are collected with
//! the scope they appear in and resolved once the traversal is complete, so
//! hoisted functions and `var`s resolve regardless of source order.
//!
//! A statement that contains a malformed fragment (an `Invalid` node or a
//! jump to an undefined label) is not analyzed further than its siblings
//! need: the fault is logged, recorded as a diagnostic, and the statement's
//! span is poisoned so that nothing inside it gets renamed.

use super::{span_key, BindingId, BindingKind, Label, ScopeId, ScopeKind, ScopeTree, Target};
use crate::report::Diagnostic;
use swc_common::{Span, Spanned};
use swc_ecma_ast::*;
use swc_ecma_visit::{Visit, VisitWith};
use thiserror::Error;
use tracing::{debug, warn};

/// A malformed fragment found while analyzing a statement.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AnalyzeFault {
    pub span: Span,
    pub message: String,
}

impl AnalyzeFault {
    fn new(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
        }
    }
}

/// Build the scope tree of `module`.
///
/// `is_declaration` marks every binding ambient (`.d.ts` units).
#[must_use]
pub fn analyze(module: &Module, path: &str, is_declaration: bool) -> ScopeTree {
    let is_module = module
        .body
        .iter()
        .any(|item| matches!(item, ModuleItem::ModuleDecl(_)));
    let root_kind = if is_module {
        ScopeKind::Module
    } else {
        ScopeKind::Global
    };

    let mut tree = ScopeTree::new(root_kind, module.span);
    tree.scopes[ScopeTree::ROOT].ambient = is_declaration;

    let mut analyzer = Analyzer {
        path,
        tree,
        scope: ScopeTree::ROOT,
        labels: Vec::new(),
        ambient: usize::from(is_declaration),
        fault: None,
        references: Vec::new(),
        exports: Vec::new(),
    };
    module.visit_with(&mut analyzer);
    analyzer.finish()
}

struct PendingExport {
    scope: ScopeId,
    orig: (String, Span),
    exported: Option<(String, Span)>,
}

struct Analyzer<'a> {
    path: &'a str,
    tree: ScopeTree,
    scope: ScopeId,
    /// Enclosing labeled statements of the current function, innermost last.
    labels: Vec<usize>,
    /// Depth of `declare` contexts.
    ambient: usize,
    fault: Option<AnalyzeFault>,
    references: Vec<(ScopeId, Span, String)>,
    exports: Vec<PendingExport>,
}

impl Analyzer<'_> {
    // =========================================================================
    // Bookkeeping
    // =========================================================================

    fn enter(&mut self, kind: ScopeKind, name: Option<&str>, span: Span) -> ScopeId {
        let id = self.tree.add_scope(self.scope, kind, name, span);
        if self.ambient > 0 {
            self.tree.scopes[id].ambient = true;
        }
        id
    }

    fn declare(&mut self, scope: ScopeId, ident: &Ident, kind: BindingKind) -> BindingId {
        let id = self.tree.declare(scope, &ident.sym, kind, ident.span);
        if self.ambient > 0 {
            self.tree.bindings[id].ambient = true;
        }
        id
    }

    fn declare_member(&mut self, scope: ScopeId, name: &str, span: Span) -> BindingId {
        let id = self.tree.declare(scope, name, BindingKind::Member, span);
        if self.ambient > 0 {
            self.tree.bindings[id].ambient = true;
        }
        id
    }

    fn reference(&mut self, ident: &Ident) {
        if ident.span.is_dummy() {
            return;
        }
        self.references
            .push((self.scope, ident.span, ident.sym.to_string()));
    }

    fn no_binding(&mut self, name: &str, span: Span) {
        self.tree
            .occurrences
            .insert(span_key(span), Target::NoBinding(name.to_string()));
        self.tree.no_binding_names.insert(name.to_string());
    }

    fn raise(&mut self, span: Span, message: impl Into<String>) {
        if self.fault.is_none() {
            self.fault = Some(AnalyzeFault::new(span, message));
        }
    }

    fn record_fault(&mut self, span: Span, fault: AnalyzeFault) {
        warn!(
            file = %self.path,
            lo = fault.span.lo.0,
            message = %fault.message,
            "skipping malformed statement"
        );
        self.tree
            .diagnostics
            .push(Diagnostic::warning(fault.span, fault.message));
        self.tree.poisoned.push(span);
    }

    /// Visit one statement-level node, capturing any fault raised inside it.
    fn analyze_stmt<N: VisitWith<Self>>(&mut self, node: &N) -> Result<(), AnalyzeFault> {
        let outer = self.fault.take();
        node.visit_children_with(self);
        match std::mem::replace(&mut self.fault, outer) {
            Some(fault) => Err(fault),
            None => Ok(()),
        }
    }

    fn with_scope(&mut self, scope: ScopeId, f: impl FnOnce(&mut Self)) {
        let saved = std::mem::replace(&mut self.scope, scope);
        f(self);
        self.scope = saved;
    }

    fn with_ambient(&mut self, ambient: bool, f: impl FnOnce(&mut Self)) {
        if ambient {
            self.ambient += 1;
        }
        f(self);
        if ambient {
            self.ambient -= 1;
        }
    }

    // =========================================================================
    // Declarations
    // =========================================================================

    fn declare_pat(&mut self, pat: &Pat, kind: BindingKind, scope: ScopeId) {
        match pat {
            Pat::Ident(b) => {
                self.declare(scope, &b.id, kind);
                b.type_ann.visit_with(self);
            }
            Pat::Array(a) => {
                for elem in a.elems.iter().flatten() {
                    self.declare_pat(elem, kind, scope);
                }
                a.type_ann.visit_with(self);
            }
            Pat::Object(o) => {
                for prop in &o.props {
                    match prop {
                        ObjectPatProp::KeyValue(kv) => {
                            kv.key.visit_with(self);
                            self.declare_pat(&kv.value, kind, scope);
                        }
                        ObjectPatProp::Assign(a) => {
                            self.declare(scope, &a.key.id, kind);
                            a.value.visit_with(self);
                        }
                        ObjectPatProp::Rest(r) => self.declare_pat(&r.arg, kind, scope),
                    }
                }
                o.type_ann.visit_with(self);
            }
            Pat::Rest(r) => {
                self.declare_pat(&r.arg, kind, scope);
                r.type_ann.visit_with(self);
            }
            Pat::Assign(a) => {
                self.declare_pat(&a.left, kind, scope);
                a.right.visit_with(self);
            }
            Pat::Expr(e) => e.visit_with(self),
            Pat::Invalid(inv) => self.raise(inv.span, "invalid binding pattern"),
        }
    }

    fn var_decl(&mut self, decl: &VarDecl) {
        let (kind, scope) = match decl.kind {
            VarDeclKind::Var => (BindingKind::Var, self.tree.hoist_target(self.scope)),
            VarDeclKind::Let => (BindingKind::Let, self.scope),
            VarDeclKind::Const => (BindingKind::Const, self.scope),
        };
        self.with_ambient(decl.declare, |this| {
            for declarator in &decl.decls {
                this.declare_pat(&declarator.name, kind, scope);
                declarator.init.visit_with(this);
            }
        });
    }

    /// Function-like scope: parameters and body share one scope.
    fn function(&mut self, function: &Function, scope: ScopeId) {
        let labels = std::mem::take(&mut self.labels);
        self.with_scope(scope, |this| {
            function.decorators.visit_with(this);
            function.type_params.visit_with(this);
            for param in &function.params {
                param.decorators.visit_with(this);
                this.declare_pat(&param.pat, BindingKind::Param, scope);
            }
            function.return_type.visit_with(this);
            if let Some(body) = &function.body {
                body.stmts.visit_with(this);
            }
        });
        self.labels = labels;
    }

    fn class(&mut self, class: &Class, name: Option<&Ident>, declaration: bool) {
        class.decorators.visit_with(self);
        class.super_class.visit_with(self);
        class.implements.visit_with(self);

        let scope = self.enter(ScopeKind::Class, name.map(|i| &*i.sym), class.span);
        if let (Some(ident), false) = (name, declaration) {
            self.declare(scope, ident, BindingKind::Class);
        }
        self.with_scope(scope, |this| {
            class.type_params.visit_with(this);
            class.super_type_params.visit_with(this);
            for member in &class.body {
                this.class_member(member, scope);
            }
        });
    }

    fn class_member(&mut self, member: &ClassMember, class_scope: ScopeId) {
        match member {
            ClassMember::Constructor(c) => self.constructor(c),
            ClassMember::Method(m) => {
                let mut scope_name = None;
                if let Some((name, member)) = self.member_key(&m.key, class_scope) {
                    if let Some(id) = member {
                        self.tree.bindings[id].method_span.get_or_insert(m.span);
                    }
                    scope_name = Some(name);
                }
                let scope = self.enter(ScopeKind::Function, scope_name.as_deref(), m.function.span);
                self.function(&m.function, scope);
            }
            ClassMember::PrivateMethod(m) => {
                let scope = self.enter(ScopeKind::Function, None, m.function.span);
                self.function(&m.function, scope);
            }
            ClassMember::ClassProp(p) => {
                p.decorators.visit_with(self);
                self.member_key(&p.key, class_scope);
                p.type_ann.visit_with(self);
                p.value.visit_with(self);
            }
            ClassMember::PrivateProp(p) => {
                p.decorators.visit_with(self);
                p.type_ann.visit_with(self);
                p.value.visit_with(self);
            }
            ClassMember::AutoAccessor(a) => {
                a.decorators.visit_with(self);
                if let Key::Public(key) = &a.key {
                    self.member_key(key, class_scope);
                }
                a.type_ann.visit_with(self);
                a.value.visit_with(self);
            }
            ClassMember::StaticBlock(b) => {
                let scope = self.enter(ScopeKind::Function, None, b.span);
                let labels = std::mem::take(&mut self.labels);
                self.with_scope(scope, |this| b.body.stmts.visit_with(this));
                self.labels = labels;
            }
            ClassMember::TsIndexSignature(s) => s.visit_with(self),
            ClassMember::Empty(_) => {}
        }
    }

    /// Declare a member for an identifier key, or visit a computed key.
    /// Returns the key text usable as a scope name.
    fn member_key(
        &mut self,
        key: &PropName,
        scope: ScopeId,
    ) -> Option<(String, Option<BindingId>)> {
        match key {
            PropName::Ident(i) => {
                let id = self.declare_member(scope, &i.sym, i.span);
                Some((i.sym.to_string(), Some(id)))
            }
            PropName::Str(s) => Some((s.value.to_string(), None)),
            PropName::Computed(c) => {
                c.expr.visit_with(self);
                None
            }
            PropName::Num(_) | PropName::BigInt(_) => None,
        }
    }

    fn constructor(&mut self, ctor: &Constructor) {
        // Synthetic constructors inserted by earlier passes have no source.
        if ctor.span.is_dummy() {
            return;
        }
        let scope = self.enter(ScopeKind::Function, Some("constructor"), ctor.span);
        let labels = std::mem::take(&mut self.labels);
        self.with_scope(scope, |this| {
            let mut param_props = Vec::new();
            for param in &ctor.params {
                match param {
                    ParamOrTsParamProp::Param(p) => {
                        p.decorators.visit_with(this);
                        this.declare_pat(&p.pat, BindingKind::Param, scope);
                    }
                    ParamOrTsParamProp::TsParamProp(tp) => {
                        tp.decorators.visit_with(this);
                        match &tp.param {
                            TsParamPropParam::Ident(b) => {
                                param_props.push(this.declare(scope, &b.id, BindingKind::ParamProperty));
                                b.type_ann.visit_with(this);
                            }
                            TsParamPropParam::Assign(a) => {
                                if let Pat::Ident(b) = &*a.left {
                                    param_props
                                        .push(this.declare(scope, &b.id, BindingKind::ParamProperty));
                                    b.type_ann.visit_with(this);
                                } else {
                                    this.declare_pat(&a.left, BindingKind::Param, scope);
                                }
                                a.right.visit_with(this);
                            }
                        }
                    }
                }
            }
            for id in param_props {
                let s = &mut this.tree.scopes[scope];
                s.excluded.insert(id);
                if !s.param_properties.contains(&id) {
                    s.param_properties.push(id);
                }
            }
            if let Some(body) = &ctor.body {
                body.stmts.visit_with(this);
            }
        });
        self.labels = labels;
    }

    /// Interface members and type-literal members. Members of an interface
    /// become bindings; type-literal keys become property occurrences.
    fn type_element(&mut self, elem: &TsTypeElement, member_scope: Option<ScopeId>) {
        let (key, computed) = match elem {
            TsTypeElement::TsPropertySignature(p) => (&p.key, p.computed),
            TsTypeElement::TsMethodSignature(m) => (&m.key, m.computed),
            TsTypeElement::TsGetterSignature(g) => (&g.key, g.computed),
            TsTypeElement::TsSetterSignature(s) => (&s.key, s.computed),
            _ => {
                elem.visit_children_with(self);
                return;
            }
        };
        match ident_key(key, computed) {
            Some((name, span)) => match member_scope {
                Some(scope) => {
                    self.declare_member(scope, &name, span);
                }
                None => {
                    self.tree
                        .occurrences
                        .insert(span_key(span), Target::Property(name));
                }
            },
            None => key.visit_with(self),
        }
        match elem {
            TsTypeElement::TsPropertySignature(p) => p.type_ann.visit_with(self),
            TsTypeElement::TsMethodSignature(m) => {
                m.type_params.visit_with(self);
                m.params.visit_with(self);
                m.type_ann.visit_with(self);
            }
            TsTypeElement::TsGetterSignature(g) => g.type_ann.visit_with(self),
            TsTypeElement::TsSetterSignature(s) => s.param.visit_with(self),
            _ => {}
        }
    }

    fn namespace_body(&mut self, body: &TsNamespaceBody) {
        match body {
            TsNamespaceBody::TsModuleBlock(block) => block.body.visit_with(self),
            TsNamespaceBody::TsNamespaceDecl(decl) => {
                // `namespace A.B {}`: B is an exported member of A.
                let id = self.declare(self.scope, &decl.id, BindingKind::Namespace);
                self.tree.bindings[id].exported = true;
                let scope = self.enter(ScopeKind::Module, Some(&*decl.id.sym), decl.span);
                self.with_scope(scope, |this| this.namespace_body(&decl.body));
            }
        }
    }

    /// Names a declaration binds in the scope it appears in.
    fn declared_names(decl: &Decl) -> Vec<String> {
        fn pat_names(pat: &Pat, out: &mut Vec<String>) {
            match pat {
                Pat::Ident(b) => out.push(b.id.sym.to_string()),
                Pat::Array(a) => a.elems.iter().flatten().for_each(|p| pat_names(p, out)),
                Pat::Object(o) => {
                    for prop in &o.props {
                        match prop {
                            ObjectPatProp::KeyValue(kv) => pat_names(&kv.value, out),
                            ObjectPatProp::Assign(a) => out.push(a.key.id.sym.to_string()),
                            ObjectPatProp::Rest(r) => pat_names(&r.arg, out),
                        }
                    }
                }
                Pat::Rest(r) => pat_names(&r.arg, out),
                Pat::Assign(a) => pat_names(&a.left, out),
                Pat::Expr(_) | Pat::Invalid(_) => {}
            }
        }

        let mut names = Vec::new();
        match decl {
            Decl::Class(c) => names.push(c.ident.sym.to_string()),
            Decl::Fn(f) => names.push(f.ident.sym.to_string()),
            Decl::Var(v) => v.decls.iter().for_each(|d| pat_names(&d.name, &mut names)),
            Decl::Using(u) => u.decls.iter().for_each(|d| pat_names(&d.name, &mut names)),
            Decl::TsInterface(i) => names.push(i.id.sym.to_string()),
            Decl::TsTypeAlias(t) => names.push(t.id.sym.to_string()),
            Decl::TsEnum(e) => names.push(e.id.sym.to_string()),
            Decl::TsModule(m) => {
                if let TsModuleName::Ident(i) = &m.id {
                    names.push(i.sym.to_string());
                }
            }
        }
        names
    }

    fn mark_exported(&mut self, name: &str) {
        let candidates = [self.scope, self.tree.hoist_target(self.scope)];
        for scope in candidates {
            if let Some(id) = self.tree.scopes[scope].binding_named(name) {
                self.tree.bindings[id].exported = true;
                break;
            }
        }
        if self.scope == ScopeTree::ROOT {
            self.tree.scopes[ScopeTree::ROOT]
                .exports
                .insert(name.to_string());
        }
    }

    fn add_export_surface(&mut self, name: &str) {
        if self.scope == ScopeTree::ROOT {
            self.tree.scopes[ScopeTree::ROOT]
                .exports
                .insert(name.to_string());
        }
    }

    // =========================================================================
    // Resolution
    // =========================================================================

    fn finish(mut self) -> ScopeTree {
        for export in std::mem::take(&mut self.exports) {
            self.resolve_export(export);
        }

        for (scope, span, name) in std::mem::take(&mut self.references) {
            match self.tree.lookup(scope, &name) {
                Some(id) => {
                    self.tree
                        .occurrences
                        .insert(span_key(span), Target::Binding(id));
                }
                None => {
                    self.tree.mark_used(ScopeTree::ROOT, &name);
                    self.tree.no_binding_names.insert(name.clone());
                    self.tree
                        .occurrences
                        .insert(span_key(span), Target::Free(name));
                }
            }
        }

        self.tree.classify();
        debug!(
            file = %self.path,
            scopes = self.tree.scopes.len(),
            bindings = self.tree.bindings.len(),
            faults = self.tree.diagnostics.len(),
            "analyzed"
        );
        self.tree
    }

    fn resolve_export(&mut self, export: PendingExport) {
        let (orig, orig_span) = export.orig;
        let Some(local) = self.tree.lookup(export.scope, &orig) else {
            self.no_binding(&orig, orig_span);
            if let Some((name, span)) = export.exported {
                self.no_binding(&name, span);
            }
            return;
        };
        self.tree
            .occurrences
            .insert(span_key(orig_span), Target::Binding(local));

        match export.exported {
            Some((name, span)) if name != orig => {
                if name == "default" {
                    return;
                }
                let alias = self
                    .tree
                    .declare(export.scope, &name, BindingKind::ExportAlias, span);
                let binding = &mut self.tree.bindings[alias];
                binding.alias_of = Some(local);
                binding.exported = true;
            }
            Some((_, span)) => {
                self.tree.bindings[local].exported = true;
                self.tree
                    .occurrences
                    .insert(span_key(span), Target::Binding(local));
            }
            None => self.tree.bindings[local].exported = true,
        }
    }
}

fn ident_key(key: &Expr, computed: bool) -> Option<(String, Span)> {
    match (key, computed) {
        (Expr::Ident(i), false) => Some((i.sym.to_string(), i.span)),
        _ => None,
    }
}

fn module_export_name(name: &ModuleExportName) -> Option<(String, Span)> {
    match name {
        ModuleExportName::Ident(i) => Some((i.sym.to_string(), i.span)),
        ModuleExportName::Str(_) => None,
    }
}

// =============================================================================
// Traversal
// =============================================================================

impl Visit for Analyzer<'_> {
    fn visit_module_item(&mut self, item: &ModuleItem) {
        match item {
            ModuleItem::Stmt(stmt) => self.visit_stmt(stmt),
            ModuleItem::ModuleDecl(decl) => {
                if let Err(fault) = self.analyze_stmt(decl) {
                    self.record_fault(decl.span(), fault);
                }
            }
        }
    }

    fn visit_stmt(&mut self, stmt: &Stmt) {
        if let Err(fault) = self.analyze_stmt(stmt) {
            self.record_fault(stmt.span(), fault);
        }
    }

    // ----- modules -----------------------------------------------------------

    fn visit_import_decl(&mut self, n: &ImportDecl) {
        let scope = self.scope;
        for spec in &n.specifiers {
            let local = match spec {
                ImportSpecifier::Named(named) => {
                    if let Some((name, span)) = named.imported.as_ref().and_then(module_export_name) {
                        self.no_binding(&name, span);
                        self.tree.scopes[scope].imports.insert(name);
                    }
                    &named.local
                }
                ImportSpecifier::Default(d) => &d.local,
                ImportSpecifier::Namespace(ns) => &ns.local,
            };
            self.declare(scope, local, BindingKind::Import);
            self.tree.scopes[scope].imports.insert(local.sym.to_string());
        }
    }

    fn visit_ts_import_equals_decl(&mut self, n: &TsImportEqualsDecl) {
        let id = self.declare(self.scope, &n.id, BindingKind::Import);
        self.tree.scopes[self.scope]
            .imports
            .insert(n.id.sym.to_string());
        if n.is_export {
            self.tree.bindings[id].exported = true;
            self.add_export_surface(&n.id.sym);
        }
        n.module_ref.visit_with(self);
    }

    fn visit_export_decl(&mut self, n: &ExportDecl) {
        n.decl.visit_with(self);
        for name in Self::declared_names(&n.decl) {
            self.mark_exported(&name);
        }
    }

    fn visit_export_default_decl(&mut self, n: &ExportDefaultDecl) {
        self.add_export_surface("default");
        match &n.decl {
            DefaultDecl::Fn(f) => match &f.ident {
                Some(ident) => {
                    self.declare(self.scope, ident, BindingKind::Function);
                    let scope = self.enter(ScopeKind::Function, Some(&*ident.sym), f.function.span);
                    self.function(&f.function, scope);
                }
                None => f.visit_with(self),
            },
            DefaultDecl::Class(c) => {
                if let Some(ident) = &c.ident {
                    self.declare(self.scope, ident, BindingKind::Class);
                }
                self.class(&c.class, c.ident.as_ref(), true);
            }
            DefaultDecl::TsInterfaceDecl(i) => i.visit_with(self),
        }
    }

    fn visit_export_default_expr(&mut self, n: &ExportDefaultExpr) {
        self.add_export_surface("default");
        n.expr.visit_with(self);
    }

    fn visit_named_export(&mut self, n: &NamedExport) {
        for spec in &n.specifiers {
            match spec {
                ExportSpecifier::Named(named) => {
                    let Some(orig) = module_export_name(&named.orig) else {
                        continue;
                    };
                    let exported = named.exported.as_ref().and_then(module_export_name);
                    let surface = exported.as_ref().map_or(&orig.0, |(name, _)| name).clone();
                    self.add_export_surface(&surface);
                    if n.src.is_some() {
                        self.no_binding(&orig.0, orig.1);
                        if let Some((name, span)) = exported {
                            self.no_binding(&name, span);
                        }
                    } else {
                        self.exports.push(PendingExport {
                            scope: self.scope,
                            orig,
                            exported,
                        });
                    }
                }
                ExportSpecifier::Namespace(ns) => {
                    if let Some((name, span)) = module_export_name(&ns.name) {
                        self.add_export_surface(&name);
                        self.no_binding(&name, span);
                    }
                }
                ExportSpecifier::Default(d) => {
                    self.add_export_surface(&d.exported.sym);
                    self.no_binding(&d.exported.sym, d.exported.span);
                }
            }
        }
    }

    fn visit_ts_namespace_export_decl(&mut self, _: &TsNamespaceExportDecl) {}

    // ----- declarations ------------------------------------------------------

    fn visit_var_decl(&mut self, n: &VarDecl) {
        self.var_decl(n);
    }

    fn visit_using_decl(&mut self, n: &UsingDecl) {
        for declarator in &n.decls {
            self.declare_pat(&declarator.name, BindingKind::Const, self.scope);
            declarator.init.visit_with(self);
        }
    }

    fn visit_fn_decl(&mut self, n: &FnDecl) {
        self.with_ambient(n.declare, |this| {
            this.declare(this.scope, &n.ident, BindingKind::Function);
            let scope = this.enter(ScopeKind::Function, Some(&*n.ident.sym), n.function.span);
            this.function(&n.function, scope);
        });
    }

    fn visit_fn_expr(&mut self, n: &FnExpr) {
        let scope = self.enter(
            ScopeKind::Function,
            n.ident.as_ref().map(|i| &*i.sym),
            n.function.span,
        );
        if let Some(ident) = &n.ident {
            self.declare(scope, ident, BindingKind::Function);
        }
        self.function(&n.function, scope);
    }

    fn visit_arrow_expr(&mut self, n: &ArrowExpr) {
        let scope = self.enter(ScopeKind::Function, None, n.span);
        let labels = std::mem::take(&mut self.labels);
        self.with_scope(scope, |this| {
            n.type_params.visit_with(this);
            for param in &n.params {
                this.declare_pat(param, BindingKind::Param, scope);
            }
            n.return_type.visit_with(this);
            match &*n.body {
                BlockStmtOrExpr::BlockStmt(block) => block.stmts.visit_with(this),
                BlockStmtOrExpr::Expr(expr) => expr.visit_with(this),
            }
        });
        self.labels = labels;
    }

    fn visit_class_decl(&mut self, n: &ClassDecl) {
        self.with_ambient(n.declare, |this| {
            this.declare(this.scope, &n.ident, BindingKind::Class);
            this.class(&n.class, Some(&n.ident), true);
        });
    }

    fn visit_class_expr(&mut self, n: &ClassExpr) {
        self.class(&n.class, n.ident.as_ref(), false);
    }

    fn visit_ts_interface_decl(&mut self, n: &TsInterfaceDecl) {
        self.with_ambient(n.declare, |this| {
            this.declare(this.scope, &n.id, BindingKind::Interface);
            let scope = this.enter(ScopeKind::Interface, Some(&*n.id.sym), n.span);
            this.with_scope(scope, |this| {
                n.type_params.visit_with(this);
                n.extends.visit_with(this);
                for elem in &n.body.body {
                    this.type_element(elem, Some(scope));
                }
            });
        });
    }

    fn visit_ts_type_alias_decl(&mut self, n: &TsTypeAliasDecl) {
        self.with_ambient(n.declare, |this| {
            this.declare(this.scope, &n.id, BindingKind::TypeAlias);
            let scope = this.enter(ScopeKind::Interface, Some(&*n.id.sym), n.span);
            this.with_scope(scope, |this| {
                n.type_params.visit_with(this);
                n.type_ann.visit_with(this);
            });
        });
    }

    fn visit_ts_enum_decl(&mut self, n: &TsEnumDecl) {
        self.with_ambient(n.declare, |this| {
            this.declare(this.scope, &n.id, BindingKind::Enum);
            let scope = this.enter(ScopeKind::Enum, Some(&*n.id.sym), n.span);
            this.with_scope(scope, |this| {
                for member in &n.members {
                    if let TsEnumMemberId::Ident(id) = &member.id {
                        this.declare_member(scope, &id.sym, id.span);
                    }
                    member.init.visit_with(this);
                }
            });
        });
    }

    fn visit_ts_module_decl(&mut self, n: &TsModuleDecl) {
        let ambient = n.declare || n.global;
        self.with_ambient(ambient, |this| {
            let scope = match &n.id {
                TsModuleName::Ident(id) if !n.global => {
                    this.declare(this.scope, id, BindingKind::Namespace);
                    this.enter(ScopeKind::Module, Some(&*id.sym), n.span)
                }
                _ => this.enter(ScopeKind::Module, None, n.span),
            };
            if let Some(body) = &n.body {
                this.with_scope(scope, |this| this.namespace_body(body));
            }
        });
    }

    fn visit_ts_type_param(&mut self, n: &TsTypeParam) {
        self.declare(self.scope, &n.name, BindingKind::TypeParam);
        n.constraint.visit_with(self);
        n.default.visit_with(self);
    }

    fn visit_ts_type_element(&mut self, n: &TsTypeElement) {
        self.type_element(n, None);
    }

    /// Parameters of function types and signatures bind nothing.
    fn visit_ts_fn_param(&mut self, n: &TsFnParam) {
        match n {
            TsFnParam::Ident(b) => b.type_ann.visit_with(self),
            TsFnParam::Array(a) => a.type_ann.visit_with(self),
            TsFnParam::Rest(r) => r.type_ann.visit_with(self),
            TsFnParam::Object(o) => o.type_ann.visit_with(self),
        }
    }

    fn visit_ts_tuple_element(&mut self, n: &TsTupleElement) {
        n.ty.visit_with(self);
    }

    fn visit_ts_import_type(&mut self, n: &TsImportType) {
        n.type_args.visit_with(self);
    }

    // ----- scopes ------------------------------------------------------------

    fn visit_block_stmt(&mut self, n: &BlockStmt) {
        let scope = self.enter(ScopeKind::Block, None, n.span);
        self.with_scope(scope, |this| n.stmts.visit_with(this));
    }

    fn visit_for_stmt(&mut self, n: &ForStmt) {
        let scope = self.enter(ScopeKind::For, None, n.span);
        self.with_scope(scope, |this| n.visit_children_with(this));
    }

    fn visit_for_in_stmt(&mut self, n: &ForInStmt) {
        let scope = self.enter(ScopeKind::For, None, n.span);
        self.with_scope(scope, |this| n.visit_children_with(this));
    }

    fn visit_for_of_stmt(&mut self, n: &ForOfStmt) {
        let scope = self.enter(ScopeKind::For, None, n.span);
        self.with_scope(scope, |this| n.visit_children_with(this));
    }

    fn visit_switch_stmt(&mut self, n: &SwitchStmt) {
        n.discriminant.visit_with(self);
        let scope = self.enter(ScopeKind::Switch, None, n.span);
        self.with_scope(scope, |this| n.cases.visit_with(this));
    }

    fn visit_catch_clause(&mut self, n: &CatchClause) {
        let scope = self.enter(ScopeKind::Catch, None, n.span);
        if let Some(param) = &n.param {
            self.with_scope(scope, |this| this.declare_pat(param, BindingKind::CatchParam, scope));
        }
        self.with_scope(scope, |this| n.body.stmts.visit_with(this));
    }

    fn visit_object_lit(&mut self, n: &ObjectLit) {
        let scope = self.enter(ScopeKind::ObjectLiteral, None, n.span);
        self.with_scope(scope, |this| {
            for prop in &n.props {
                let prop = match prop {
                    PropOrSpread::Spread(s) => {
                        s.expr.visit_with(this);
                        continue;
                    }
                    PropOrSpread::Prop(p) => p,
                };
                match &**prop {
                    Prop::Shorthand(ident) => {
                        // The identifier is both the key and a reference;
                        // its span belongs to the reference.
                        this.declare_member(scope, &ident.sym, ident.span);
                        this.tree.occurrences.remove(&span_key(ident.span));
                        this.reference(ident);
                    }
                    Prop::Assign(a) => {
                        this.declare_member(scope, &a.key.sym, a.key.span);
                        this.tree.occurrences.remove(&span_key(a.key.span));
                        this.reference(&a.key);
                        a.value.visit_with(this);
                    }
                    Prop::KeyValue(kv) => {
                        this.member_key(&kv.key, scope);
                        kv.value.visit_with(this);
                    }
                    Prop::Getter(g) => {
                        let name = this.member_key(&g.key, scope).map(|(n, _)| n);
                        let fn_scope = this.enter(ScopeKind::Function, name.as_deref(), g.span);
                        this.with_scope(fn_scope, |this| {
                            g.type_ann.visit_with(this);
                            if let Some(body) = &g.body {
                                body.stmts.visit_with(this);
                            }
                        });
                    }
                    Prop::Setter(s) => {
                        let name = this.member_key(&s.key, scope).map(|(n, _)| n);
                        let fn_scope = this.enter(ScopeKind::Function, name.as_deref(), s.span);
                        this.with_scope(fn_scope, |this| {
                            if let Some(this_param) = &s.this_param {
                                this.declare_pat(this_param, BindingKind::Param, fn_scope);
                            }
                            this.declare_pat(&s.param, BindingKind::Param, fn_scope);
                            if let Some(body) = &s.body {
                                body.stmts.visit_with(this);
                            }
                        });
                    }
                    Prop::Method(m) => {
                        let name = this.member_key(&m.key, scope).map(|(n, _)| n);
                        let fn_scope =
                            this.enter(ScopeKind::Function, name.as_deref(), m.function.span);
                        this.function(&m.function, fn_scope);
                    }
                }
            }
        });
    }

    // ----- statements --------------------------------------------------------

    fn visit_with_stmt(&mut self, n: &WithStmt) {
        n.obj.visit_with(self);
        self.tree.mark_dynamic_eval(self.scope);
        n.body.visit_with(self);
    }

    fn visit_labeled_stmt(&mut self, n: &LabeledStmt) {
        let id = self.tree.labels.len();
        self.tree.labels.push(Label {
            name: n.label.sym.to_string(),
            span: n.label.span,
            scope: self.scope,
            parent: self.labels.last().copied(),
            references: Vec::new(),
            mangled: None,
        });
        self.tree.scopes[self.scope].labels.push(id);
        self.tree
            .occurrences
            .insert(span_key(n.label.span), Target::Label(id));

        self.labels.push(id);
        n.body.visit_with(self);
        self.labels.pop();
    }

    fn visit_break_stmt(&mut self, n: &BreakStmt) {
        if let Some(label) = &n.label {
            self.label_reference(label);
        }
    }

    fn visit_continue_stmt(&mut self, n: &ContinueStmt) {
        if let Some(label) = &n.label {
            self.label_reference(label);
        }
    }

    // ----- expressions -------------------------------------------------------

    fn visit_expr(&mut self, n: &Expr) {
        if let Expr::Invalid(inv) = n {
            self.raise(inv.span, "invalid expression");
            return;
        }
        n.visit_children_with(self);
    }

    fn visit_pat(&mut self, n: &Pat) {
        if let Pat::Invalid(inv) = n {
            self.raise(inv.span, "invalid pattern");
            return;
        }
        n.visit_children_with(self);
    }

    fn visit_call_expr(&mut self, n: &CallExpr) {
        if let Callee::Expr(callee) = &n.callee {
            if let Expr::Ident(ident) = &**callee {
                if &*ident.sym == "eval" {
                    self.tree.mark_dynamic_eval(self.scope);
                }
            }
        }
        n.visit_children_with(self);
    }

    fn visit_jsx_element_name(&mut self, n: &JSXElementName) {
        match n {
            // Lowercase tags are intrinsic elements, not references.
            JSXElementName::Ident(ident) if ident.sym.starts_with(|c: char| c.is_ascii_lowercase()) => {}
            _ => n.visit_children_with(self),
        }
    }

    fn visit_private_name(&mut self, _: &PrivateName) {}

    fn visit_ident(&mut self, n: &Ident) {
        self.reference(n);
    }
}

impl Analyzer<'_> {
    fn label_reference(&mut self, label: &Ident) {
        let found = self
            .labels
            .iter()
            .rev()
            .copied()
            .find(|&id| self.tree.labels[id].name == *label.sym);
        match found {
            Some(id) => {
                self.tree.labels[id].references.push(label.span);
                self.tree
                    .occurrences
                    .insert(span_key(label.span), Target::Label(id));
            }
            None => self.raise(label.span, format!("undefined label `{}`", label.sym)),
        }
    }
}
