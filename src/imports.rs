//! Import rewrite pass.
//!
//! Static `import` declarations become awaited calls of the import primitive
//! passed to the cell, destructured so the bindings land where the original
//! declaration would have put them:
//!
//! ```js
//! import d, {a as b, c} from "m";
//! import * as ns from "n";
//! import "side-effect";
//! ```
//!
//! becomes
//!
//! ```js
//! var {_:{default:d}, _:{a:b}, _:{c}} = {_: await __import("m")};
//! var {_:ns} = {_: await __import("n")};
//! await __import("side-effect");
//! ```
//!
//! The resulting `var` declarations are promoted to the global object by the
//! scope pass like any other.

use swc_core::common::{Span, Spanned};
use swc_core::ecma::ast::{
    ImportDecl, ImportSpecifier, MetaPropExpr, MetaPropKind, Module, ModuleDecl, ModuleExportName,
    ModuleItem,
};
use swc_core::ecma::visit::{Visit, VisitWith};

use crate::parse::SpanMap;
use crate::source::{EditIndex, Source};
use crate::summary::{CellSummary, ImportRow};
use crate::walk::{walk_with_ancestors, Ancestor, AncestorVisitor, Descend, NodeRef};
use crate::TranspileError;

/// Rewrites every import declaration of `module` into `edit`. `map` places
/// the module's text inside the index. Returns the number of declarations
/// rewritten.
pub(crate) fn rewrite_imports(
    module: &Module,
    edit: &mut EditIndex,
    map: SpanMap,
    import_param: &str,
    summary: &mut CellSummary,
) -> Result<usize, TranspileError> {
    reject_exports(module)?;
    reject_import_meta(module)?;

    let mut rewriter = ImportRewriter {
        edit,
        map,
        import_param,
        summary,
        rewritten: 0,
    };
    walk_with_ancestors(module, &mut rewriter);

    tracing::debug!(rewritten = rewriter.rewritten, "import pass done");
    Ok(rewriter.rewritten)
}

/// A cell is not a module: nothing can import what it exports.
fn reject_exports(module: &Module) -> Result<(), TranspileError> {
    let cell = SpanMap::new(0);
    for item in &module.body {
        if let ModuleItem::ModuleDecl(decl) = item {
            if !matches!(decl, ModuleDecl::Import(_)) {
                return Err(TranspileError::Unsupported {
                    construct: "export declaration",
                    offset: cell.offset(decl.span().lo),
                });
            }
        }
    }
    Ok(())
}

/// The wrapped cell is parsed as a script, where `import.meta` does not exist.
fn reject_import_meta(module: &Module) -> Result<(), TranspileError> {
    let mut finder = ImportMetaFinder { found: None };
    module.visit_with(&mut finder);
    match finder.found {
        Some(span) => Err(TranspileError::Unsupported {
            construct: "import.meta",
            offset: SpanMap::new(0).offset(span.lo),
        }),
        None => Ok(()),
    }
}

struct ImportMetaFinder {
    found: Option<Span>,
}

impl Visit for ImportMetaFinder {
    fn visit_meta_prop_expr(&mut self, n: &MetaPropExpr) {
        if matches!(n.kind, MetaPropKind::ImportMeta) && self.found.is_none() {
            self.found = Some(n.span);
        }
    }
}

struct ImportRewriter<'a> {
    edit: &'a mut EditIndex,
    map: SpanMap,
    import_param: &'a str,
    summary: &'a mut CellSummary,
    rewritten: usize,
}

impl ImportRewriter<'_> {
    fn original(&self, span: Span) -> Source {
        self.edit.slice(self.map.range(span))
    }

    fn rewrite_import(&mut self, decl: &ImportDecl) {
        let range = self.map.range(decl.span);
        let specifier = self.original(decl.src.span);
        let source_text = specifier.text();

        let mut call = Source::synthetic("await ") + self.import_param + "(" + specifier;
        if let Some(with) = &decl.with {
            call = call + ", { with: " + self.original(with.span) + " }";
        }
        call = call + ")";

        let mut replacement = if decl.specifiers.is_empty() {
            self.summary.effects.push(source_text.clone());
            call
        } else {
            let mut pattern = Source::synthetic("var {");
            for (i, spec) in decl.specifiers.iter().enumerate() {
                if i > 0 {
                    pattern.push(", ");
                }
                pattern.push(self.specifier_binding(spec, &source_text));
            }
            pattern + "} = {_: " + call + "}"
        };

        // Keep exactly one terminator whether or not the span covers it.
        let covered = self.edit.slice(range.clone()).text().ends_with(';');
        let follows = range.end < self.edit.len() && self.edit.node(range.end).current().text() == ";";
        if covered || !follows {
            replacement.push(";");
        }

        tracing::trace!(source = %source_text, code = %replacement, "rewrote import");
        self.edit.replace(range, replacement);
        self.rewritten += 1;
    }

    /// Destructuring entry for one specifier, nested under the `_` field of
    /// the wrapper object.
    fn specifier_binding(&mut self, spec: &ImportSpecifier, source: &str) -> Source {
        let (row, binding) = match spec {
            ImportSpecifier::Named(named) => {
                let local = self.original(named.local.span);
                match &named.imported {
                    Some(imported) => {
                        let name = match imported {
                            ModuleExportName::Ident(i) => i.sym.to_string(),
                            ModuleExportName::Str(s) => self.original(s.span).text(),
                        };
                        let binding = Source::synthetic("_:{") + self.original(imported.span()) + ":" + local + "}";
                        (name, binding)
                    }
                    None => (
                        named.local.sym.to_string(),
                        Source::synthetic("_:{") + local + "}",
                    ),
                }
            }
            ImportSpecifier::Default(def) => (
                "default".to_string(),
                Source::synthetic("_:{default:") + self.original(def.local.span) + "}",
            ),
            ImportSpecifier::Namespace(ns) => (
                "*".to_string(),
                Source::synthetic("_:") + self.original(ns.local.span),
            ),
        };

        let local = match spec {
            ImportSpecifier::Named(s) => &s.local,
            ImportSpecifier::Default(s) => &s.local,
            ImportSpecifier::Namespace(s) => &s.local,
        };
        self.summary.imports.push(ImportRow {
            local: local.sym.to_string(),
            imported: row,
            source: source.to_string(),
        });
        binding
    }
}

impl AncestorVisitor for ImportRewriter<'_> {
    fn enter(&mut self, node: &NodeRef<'_>, _ancestors: &[Ancestor]) -> Descend {
        match node {
            NodeRef::ImportDecl(decl) => {
                self.rewrite_import(decl);
                Descend::Skip
            }
            // Imports only exist at the top level of a cell.
            node if node.kind().is_scope_boundary() => Descend::Skip,
            _ => Descend::Children,
        }
    }
}
