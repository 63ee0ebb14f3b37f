//! Scope rewrite pass.
//!
//! Publishes the cell's top-level bindings on the global object so later
//! cells can see them:
//!
//! - `function f() {}` becomes `void (G.f = function f() {});`
//! - a class declaration directly in the cell body becomes `G.C = (class C {});`
//! - `let`/`const` directly in the cell body and every `var` outside nested
//!   functions become `void ((G.x = (init)), ...)`, with destructuring targets
//!   rewritten in place (`{a}` → `{a: G.a}`).
//!
//! Nothing inside a function, arrow, accessor or class body is touched.

use swc_core::common::{Span, Spanned};
use swc_core::ecma::ast::{
    ArrayPat, BindingIdent, BlockStmt, ClassDecl, FnDecl, ForHead, ObjectPat, ObjectPatProp, Pat,
    VarDecl, VarDeclKind, VarDeclarator,
};

use crate::parse::SpanMap;
use crate::source::EditIndex;
use crate::summary::{CellSummary, DefRow};
use crate::walk::{walk_with_ancestors, Ancestor, AncestorVisitor, Descend, NodeKind, NodeRef};

/// Rewrites the declarations of the cell `body` into `edit`. Returns the
/// number of declarations rewritten.
pub(crate) fn rewrite_scope(
    body: &BlockStmt,
    edit: &mut EditIndex,
    map: SpanMap,
    global: &str,
    summary: &mut CellSummary,
) -> usize {
    let mut rewriter = ScopeRewriter {
        edit,
        map,
        global,
        summary,
        translating: None,
        loop_heads: Vec::new(),
        rewritten: 0,
    };
    walk_with_ancestors(body, &mut rewriter);

    tracing::debug!(rewritten = rewriter.rewritten, "scope pass done");
    rewriter.rewritten
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Form {
    /// `void ((G.a = (1)), (G.b = undefined))`
    Statement,
    /// `for (G.a of xs)`: a loop head needs a bare assignment target.
    LoopHead,
}

/// The variable declaration currently being translated.
#[derive(Debug, Clone, Copy)]
struct Translation {
    kind: &'static str,
    form: Form,
}

struct ScopeRewriter<'a> {
    edit: &'a mut EditIndex,
    map: SpanMap,
    global: &'a str,
    summary: &'a mut CellSummary,
    translating: Option<Translation>,
    /// `var` declarations heading a for-in/for-of loop.
    loop_heads: Vec<Span>,
    rewritten: usize,
}

fn keyword(kind: VarDeclKind) -> &'static str {
    match kind {
        VarDeclKind::Var => "var",
        VarDeclKind::Let => "let",
        VarDeclKind::Const => "const",
    }
}

impl ScopeRewriter<'_> {
    fn record(&mut self, local: String, kind: &'static str) {
        tracing::trace!(%local, kind, "promoted binding");
        self.summary.defs.push(DefRow { local, kind });
    }

    fn promote_function(&mut self, decl: &FnDecl) {
        let range = self.map.range(decl.function.span);
        let name = decl.ident.sym.to_string();
        self.edit
            .prepend(range.clone(), format!("void ({}.{} = ", self.global, name));
        self.edit.append(range, ");");
        self.record(name, "function");
        self.rewritten += 1;
    }

    fn promote_class(&mut self, decl: &ClassDecl) {
        let range = self.map.range(decl.class.span);
        let name = decl.ident.sym.to_string();
        self.edit
            .prepend(range.clone(), format!("{}.{} = (", self.global, name));
        self.edit.append(range, ");");
        self.record(name, "class");
        self.rewritten += 1;
    }

    fn note_loop_head(&mut self, head: &ForHead) {
        if let ForHead::VarDecl(decl) = head {
            if decl.kind == VarDeclKind::Var {
                self.loop_heads.push(decl.span);
            }
        }
    }

    fn begin_declaration(&mut self, decl: &VarDecl, ancestors: &[Ancestor]) {
        // `var` is function scoped, so it is published wherever it sits;
        // `let`/`const` only directly in the cell body.
        let translate = match decl.kind {
            VarDeclKind::Var => true,
            VarDeclKind::Let | VarDeclKind::Const => ancestors.len() == 1,
        };
        if !translate || self.translating.is_some() {
            return;
        }

        let kind = keyword(decl.kind);
        let start = self.map.offset(decl.span.lo);
        let form = if self.loop_heads.contains(&decl.span) {
            self.edit.replace(start..start + kind.len(), "");
            Form::LoopHead
        } else {
            self.edit.replace(start..start + kind.len(), "void (");
            Form::Statement
        };
        self.translating = Some(Translation { kind, form });
    }

    fn close_declarator(&mut self, declarator: &VarDeclarator, translation: Translation) {
        if translation.form != Form::Statement {
            return;
        }
        let range = self.map.range(declarator.span);
        self.edit.prepend(range.clone(), "(");
        match &declarator.init {
            Some(init) => {
                let init = self.map.range(init.span());
                self.edit.prepend(init.clone(), "(");
                self.edit.append(init, ")");
                self.edit.append(range, ")");
            }
            None => self.edit.append(range, " = undefined)"),
        }
    }

    fn end_declaration(&mut self, decl: &VarDecl) {
        let Some(translation) = self.translating.take() else {
            return;
        };
        if translation.form == Form::Statement {
            if let Some(last) = decl.decls.last() {
                self.edit.append(self.map.range(last.span), ")");
            }
        }
        self.rewritten += 1;
    }

    /// Patterns are binding targets of the translated declaration only when
    /// nothing but patterns separates them from the declarator; patterns in
    /// default values are assignment expressions of their own.
    fn is_binding_target(&self, ancestors: &[Ancestor]) -> bool {
        self.translating.is_some()
            && ancestors
                .iter()
                .rev()
                .find(|a| !a.kind.is_pattern())
                .map(|a| a.kind)
                == Some(NodeKind::VariableDeclarator)
    }

    fn promote_binding(&mut self, binding: &BindingIdent) {
        let Some(translation) = self.translating else {
            return;
        };
        let range = self.map.range(binding.id.span);
        self.edit.prepend(range, format!("{}.", self.global));
        self.record(binding.id.sym.to_string(), translation.kind);
    }

    /// Identifier targets directly inside a pattern. Nested patterns are
    /// promoted when the walker reaches them.
    fn promote_target(&mut self, pat: &Pat) {
        match pat {
            Pat::Ident(binding) => self.promote_binding(binding),
            Pat::Assign(assign) => self.promote_target(&assign.left),
            Pat::Rest(rest) => self.promote_target(&rest.arg),
            _ => {}
        }
    }

    fn promote_object_pattern(&mut self, pat: &ObjectPat) {
        let Some(translation) = self.translating else {
            return;
        };
        for prop in &pat.props {
            match prop {
                ObjectPatProp::KeyValue(kv) => self.promote_target(&kv.value),
                // `{x}` and `{x = 1}` expand to `{x: G.x}` and `{x: G.x = 1}`
                ObjectPatProp::Assign(shorthand) => {
                    let key = &shorthand.key.id;
                    self.edit.append(
                        self.map.range(key.span),
                        format!(": {}.{}", self.global, key.sym),
                    );
                    self.record(key.sym.to_string(), translation.kind);
                }
                ObjectPatProp::Rest(rest) => self.promote_target(&rest.arg),
            }
        }
    }

    fn promote_array_pattern(&mut self, pat: &ArrayPat) {
        for elem in pat.elems.iter().flatten() {
            self.promote_target(elem);
        }
    }
}

impl AncestorVisitor for ScopeRewriter<'_> {
    fn enter(&mut self, node: &NodeRef<'_>, ancestors: &[Ancestor]) -> Descend {
        match node {
            NodeRef::FnDecl(decl) => {
                self.promote_function(decl);
                Descend::Skip
            }
            node if node.kind().is_scope_boundary() => Descend::Skip,
            NodeRef::ForIn(stmt) => {
                self.note_loop_head(&stmt.left);
                Descend::Children
            }
            NodeRef::ForOf(stmt) => {
                self.note_loop_head(&stmt.left);
                Descend::Children
            }
            NodeRef::VarDecl(decl) => {
                self.begin_declaration(decl, ancestors);
                Descend::Children
            }
            NodeRef::VarDeclarator(declarator) => {
                if let Pat::Ident(binding) = &declarator.name {
                    self.promote_binding(binding);
                }
                Descend::Children
            }
            NodeRef::ObjectPat(pat) => {
                if self.is_binding_target(ancestors) {
                    self.promote_object_pattern(pat);
                }
                Descend::Children
            }
            NodeRef::ArrayPat(pat) => {
                if self.is_binding_target(ancestors) {
                    self.promote_array_pattern(pat);
                }
                Descend::Children
            }
            _ => Descend::Children,
        }
    }

    fn leave(&mut self, node: &NodeRef<'_>, ancestors: &[Ancestor]) {
        match node {
            // Block-scoped classes stay where they are.
            NodeRef::ClassDecl(decl) if ancestors.len() == 1 => self.promote_class(decl),
            NodeRef::VarDeclarator(declarator) => {
                if let Some(translation) = self.translating {
                    self.close_declarator(declarator, translation);
                }
            }
            NodeRef::VarDecl(decl) => self.end_declaration(decl),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::{parse_script, wrapper_body};
    use crate::source::Source;

    const PREFIX: &str = "(async (G, I, console) => {\n";
    const SUFFIX: &str = "\n})";

    fn rewrite_with_summary(src: &str) -> (String, CellSummary) {
        let wrapped = format!("{PREFIX}{src}{SUFFIX}");
        let script = parse_script(&wrapped).unwrap();
        let body = wrapper_body(&script).unwrap();
        let mut edit = EditIndex::new(Source::tagged(&wrapped, None));
        let mut summary = CellSummary::default();
        rewrite_scope(body, &mut edit, SpanMap::new(0), "G", &mut summary);
        let out = edit.text();
        let inner = out
            .strip_prefix(PREFIX)
            .and_then(|s| s.strip_suffix(SUFFIX))
            .unwrap()
            .to_string();
        (inner, summary)
    }

    fn rewrite(src: &str) -> String {
        rewrite_with_summary(src).0
    }

    #[test]
    fn top_level_let_becomes_an_assignment() {
        assert_eq!(rewrite("let x = 1;"), "void ( (G.x = (1)));");
    }

    #[test]
    fn declarators_without_initializer_assign_undefined() {
        assert_eq!(
            rewrite("var a, b = 2;"),
            "void ( (G.a = undefined), (G.b = (2)));"
        );
    }

    #[test]
    fn block_scoped_declarations_stay_but_var_escapes() {
        assert_eq!(
            rewrite("{ let x = 1; const k = 0; var y = 2; class B {} }"),
            "{ let x = 1; const k = 0; void ( (G.y = (2))); class B {} }"
        );
    }

    #[test]
    fn functions_are_assigned_and_their_bodies_left_alone() {
        assert_eq!(
            rewrite("function f(a) { var inner = a; return inner; }"),
            "void (G.f = function f(a) { var inner = a; return inner; });"
        );
    }

    #[test]
    fn top_level_classes_are_assigned() {
        assert_eq!(
            rewrite("class A { m() { let z; } static { var s; } }"),
            "G.A = (class A { m() { let z; } static { var s; } });"
        );
    }

    #[test]
    fn destructuring_targets_are_prefixed() {
        assert_eq!(
            rewrite("const {a, b: [c, ...d], e = 1, ...f} = o;"),
            "void ( ({a: G.a, b: [G.c, ...G.d], e: G.e = 1, ...G.f} = (o)));"
        );
    }

    #[test]
    fn nested_patterns_with_defaults() {
        assert_eq!(
            rewrite("let [x = 1, {y}, , [z]] = arr;"),
            "void ( ([G.x = 1, {y: G.y}, , [G.z]] = (arr)));"
        );
    }

    #[test]
    fn patterns_inside_initializers_are_not_targets() {
        assert_eq!(
            rewrite("var q = ({p} = o);"),
            "void ( (G.q = (({p} = o))));"
        );
    }

    #[test]
    fn loop_heads() {
        assert_eq!(
            rewrite("for (var i = 0; i < 3; i++) {}"),
            "for (void ( (G.i = (0))); i < 3; i++) {}"
        );
        assert_eq!(rewrite("for (var k of ks) {}"), "for ( G.k of ks) {}");
        assert_eq!(rewrite("for (var {a} in o) {}"), "for ( {a: G.a} in o) {}");
        assert_eq!(rewrite("for (const k of ks) {}"), "for (const k of ks) {}");
        assert_eq!(rewrite("for (let j = 0; j < 1; j++) {}"), "for (let j = 0; j < 1; j++) {}");
    }

    #[test]
    fn nested_function_scopes_are_untouched() {
        let src = "let f = () => { var z; };\nconst o = { get v() { var hidden = 1; return hidden; }, m() { let w; } };";
        assert_eq!(
            rewrite(src),
            "void ( (G.f = (() => { var z; })));\nvoid ( (G.o = ({ get v() { var hidden = 1; return hidden; }, m() { let w; } })));"
        );
    }

    #[test]
    fn switch_cases_and_catch_blocks() {
        assert_eq!(
            rewrite("switch (k) { case 1: let s = 1; var t = 2; }"),
            "switch (k) { case 1: let s = 1; void ( (G.t = (2))); }"
        );
        assert_eq!(
            rewrite("try { var r = 1; } catch ({message}) { var m = message; }"),
            "try { void ( (G.r = (1))); } catch ({message}) { void ( (G.m = (message))); }"
        );
    }

    #[test]
    fn expressions_pass_through() {
        let src = "x = 1;\nif (x) { x++; }\nconsole.log(x)";
        assert_eq!(rewrite(src), src);
    }

    #[test]
    fn summary_lists_promoted_names() {
        let (_, summary) =
            rewrite_with_summary("var {a, b: [c]} = o; let d; function e() {} class F {} { let hidden; }");
        let defs: Vec<_> = summary.defs.iter().map(|d| (d.local.as_str(), d.kind)).collect();
        assert_eq!(
            defs,
            vec![
                ("a", "var"),
                ("c", "var"),
                ("d", "let"),
                ("e", "function"),
                ("F", "class"),
            ]
        );
    }
}
