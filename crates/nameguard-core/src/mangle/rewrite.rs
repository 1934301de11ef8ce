//! Occurrence rewrite: replaces identifiers in the syntax tree by the names
//! the assignment walk committed.
//!
//! Identifiers recorded by the analyzer are looked up by span. Property-name
//! positions the analyzer does not record (`obj.name`, destructuring keys,
//! `super.name`, qualified type names) go through the project-wide property
//! path, so they match the member declarations of every file.

use super::Mangler;
use crate::error::{Error, Result};
use crate::scope::{PropertyOrigin, Target};
use swc_common::Span;
use swc_ecma_ast::*;
use swc_ecma_visit::{VisitMut, VisitMutWith};

pub(super) fn rewrite(mangler: &mut Mangler<'_, '_>, module: &mut Module) -> Result<()> {
    let mut rewriter = Rewriter {
        mangler,
        error: None,
    };
    module.visit_mut_with(&mut rewriter);
    match rewriter.error {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

struct Rewriter<'r, 'c, 'a> {
    mangler: &'r mut Mangler<'c, 'a>,
    /// First hard failure; the rest of the traversal becomes a no-op.
    error: Option<Error>,
}

impl Rewriter<'_, '_, '_> {
    fn skip(&self, span: Span) -> bool {
        self.error.is_some() || span.is_dummy() || self.mangler.tree.is_poisoned(span)
    }

    fn property_with(
        &mut self,
        name: &str,
        key: Option<&str>,
        origin: PropertyOrigin,
    ) -> Option<String> {
        if self.error.is_some() || name.is_empty() {
            return None;
        }
        match self.mangler.property_name(name, key, origin, None) {
            Ok(mangled) => mangled,
            Err(error) => {
                self.error = Some(error);
                None
            }
        }
    }

    /// New text for a property-name position.
    fn property(&mut self, name: &str) -> Option<String> {
        if !self.mangler.config().property {
            return None;
        }
        self.property_with(name, None, PropertyOrigin::Member)
    }

    /// New text for an import/export name with no local declaration.
    fn no_binding(&mut self, name: &str) -> Option<String> {
        if !self.mangler.config().renames_no_binding_names() {
            return None;
        }
        let key = format!("#{name}");
        self.property_with(name, Some(&key), PropertyOrigin::Export)
    }

    /// New text for a recorded occurrence, if it changes.
    fn resolve(&mut self, span: Span, current: &str) -> Option<String> {
        if self.skip(span) {
            return None;
        }
        let target = self.mangler.tree.target(span)?.clone();
        let name = match target {
            Target::Binding(id) => self.mangler.tree.bindings[id].mangled.clone(),
            Target::Label(id) => self.mangler.tree.labels[id].mangled.clone(),
            Target::NoBinding(name) => self.no_binding(&name),
            Target::Free(name) => self.mangler.free_name(&name).map(str::to_string),
            Target::Property(name) => self.property(&name),
        };
        name.filter(|n| n != current)
    }

    fn has_occurrence(&self, span: Span) -> bool {
        self.mangler.tree.target(span).is_some()
    }

    fn string_key(&mut self, s: &mut Str) {
        if !self.mangler.config().string_property || self.skip(s.span) {
            return;
        }
        if let Some(name) = self.property(&s.value) {
            if name.as_str() != &*s.value {
                s.value = name.into();
                s.raw = None;
            }
        }
    }
}

impl VisitMut for Rewriter<'_, '_, '_> {
    fn visit_mut_ident(&mut self, n: &mut Ident) {
        if let Some(name) = self.resolve(n.span, &n.sym) {
            n.sym = name.into();
        }
    }

    fn visit_mut_ident_name(&mut self, n: &mut IdentName) {
        if self.skip(n.span) {
            return;
        }
        let name = if self.has_occurrence(n.span) {
            self.resolve(n.span, &n.sym)
        } else {
            self.property(&n.sym)
                .filter(|name| name.as_str() != &*n.sym)
        };
        if let Some(name) = name {
            n.sym = name.into();
        }
    }

    // ----- shorthands --------------------------------------------------------

    fn visit_mut_prop(&mut self, n: &mut Prop) {
        let Prop::Shorthand(ident) = n else {
            n.visit_mut_children_with(self);
            return;
        };
        let span = ident.span;
        if self.skip(span) {
            return;
        }
        let original = ident.sym.to_string();
        let value = self
            .resolve(span, &original)
            .unwrap_or_else(|| original.clone());
        let key = self.property(&original).unwrap_or(original);
        if key == value {
            ident.sym = value.into();
            return;
        }
        let mut value_ident = ident.clone();
        value_ident.sym = value.into();
        *n = Prop::KeyValue(KeyValueProp {
            key: PropName::Ident(IdentName::new(key.into(), span)),
            value: Box::new(Expr::Ident(value_ident)),
        });
    }

    fn visit_mut_object_pat_prop(&mut self, n: &mut ObjectPatProp) {
        let ObjectPatProp::Assign(assign) = n else {
            n.visit_mut_children_with(self);
            return;
        };
        let span = assign.key.id.span;
        if self.skip(span) {
            return;
        }
        let original = assign.key.id.sym.to_string();
        let local = self
            .resolve(span, &original)
            .unwrap_or_else(|| original.clone());
        let key = self.property(&original).unwrap_or(original);
        if key == local {
            assign.key.id.sym = local.into();
            assign.value.visit_mut_with(self);
            return;
        }

        let mut binding = assign.key.clone();
        binding.id.sym = local.into();
        let mut default = assign.value.take();
        default.visit_mut_with(self);
        let value = match default {
            Some(right) => Pat::Assign(AssignPat {
                span: assign.span,
                left: Box::new(Pat::Ident(binding)),
                right,
            }),
            None => Pat::Ident(binding),
        };
        *n = ObjectPatProp::KeyValue(KeyValuePatProp {
            key: PropName::Ident(IdentName::new(key.into(), span)),
            value: Box::new(value),
        });
    }

    // ----- modules -----------------------------------------------------------

    fn visit_mut_import_named_specifier(&mut self, n: &mut ImportNamedSpecifier) {
        let original = n.local.sym.to_string();
        let span = n.local.span;
        n.local.visit_mut_with(self);

        let surface = match &mut n.imported {
            Some(ModuleExportName::Ident(imported)) => {
                imported.visit_mut_with(self);
                imported.sym.to_string()
            }
            Some(ModuleExportName::Str(_)) => return,
            None if self.skip(span) => original,
            None => self.no_binding(&original).unwrap_or(original),
        };
        if surface.as_str() == &*n.local.sym {
            n.imported = None;
        } else if n.imported.is_none() {
            n.imported = Some(ModuleExportName::Ident(Ident::new_no_ctxt(
                surface.into(),
                span,
            )));
        }
    }

    fn visit_mut_export_named_specifier(&mut self, n: &mut ExportNamedSpecifier) {
        n.visit_mut_children_with(self);
        if let (ModuleExportName::Ident(orig), Some(ModuleExportName::Ident(exported))) =
            (&n.orig, &n.exported)
        {
            if orig.sym == exported.sym {
                n.exported = None;
            }
        }
    }

    // ----- string keys -------------------------------------------------------

    fn visit_mut_prop_name(&mut self, n: &mut PropName) {
        match n {
            PropName::Str(s) => self.string_key(s),
            _ => n.visit_mut_children_with(self),
        }
    }

    fn visit_mut_member_prop(&mut self, n: &mut MemberProp) {
        if let MemberProp::Computed(computed) = n {
            if let Expr::Lit(Lit::Str(s)) = &mut *computed.expr {
                self.string_key(s);
                return;
            }
        }
        n.visit_mut_children_with(self);
    }

    // ----- never renamed -----------------------------------------------------

    fn visit_mut_jsx_attr_name(&mut self, _: &mut JSXAttrName) {}

    fn visit_mut_jsx_namespaced_name(&mut self, _: &mut JSXNamespacedName) {}

    fn visit_mut_private_name(&mut self, _: &mut PrivateName) {}
}
