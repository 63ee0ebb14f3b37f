//! Orchestrator: wrap the cell, run both passes, return the last value.

use std::collections::HashSet;

use swc_core::common::Spanned;
use swc_core::ecma::ast::{BlockStmt, Ident, Stmt};
use swc_core::ecma::visit::{Visit, VisitWith};

use crate::parse::{self, SpanMap};
use crate::source::{EditIndex, Source};
use crate::summary::CellSummary;
use crate::{imports, scope, TranspileError, TranspileOptions};

const WRAPPER_SUFFIX: &str = "\n})";

/// Result of transpiling one cell.
#[derive(Debug, Clone)]
pub struct Transpiled {
    /// A single async arrow function expression.
    pub code: String,
    /// `code` with the provenance of every character.
    pub source: Source,
    pub summary: CellSummary,
    /// Parameter names actually used, after collision avoidance.
    pub global_param: String,
    pub import_param: String,
}

#[derive(Debug, Clone, Default)]
pub struct Transpiler {
    options: TranspileOptions,
}

impl Transpiler {
    pub fn new(options: TranspileOptions) -> Result<Self, TranspileError> {
        options.validate()?;
        Ok(Transpiler { options })
    }

    /// Rewrites `src` into
    /// `(async (<global>, <import>, console) => {\n<body>\n})`.
    #[tracing::instrument(level = "debug", skip_all, fields(bytes = src.len()))]
    pub fn transpile(&self, src: &str) -> Result<Transpiled, TranspileError> {
        // Stage 1: the cell on its own, where `import` is legal.
        let module = parse::parse_module(src)?;

        let mut taken = HashSet::new();
        module.visit_with(&mut IdentCollector { out: &mut taken });
        let global_param = unused_name(&self.options.global_param, &taken);
        taken.insert(global_param.clone());
        let import_param = unused_name(&self.options.import_param, &taken);

        let prefix = format!("(async ({global_param}, {import_param}, console) => {{\n");
        let wrapped = Source::synthetic(&prefix)
            + Source::tagged(src, self.options.file.as_deref())
            + WRAPPER_SUFFIX;
        let mut edit = EditIndex::new(wrapped);
        let mut summary = CellSummary::default();
        imports::rewrite_imports(
            &module,
            &mut edit,
            SpanMap::new(prefix.len()),
            &import_param,
            &mut summary,
        )?;

        // Stage 2: the import rewrites moved everything; parse again.
        edit.stratify();
        let text = edit.text();
        let script = parse::parse_script(&text).map_err(|err| relocate(err, &edit))?;
        let body = parse::wrapper_body(&script)?;
        let map = SpanMap::new(0);
        scope::rewrite_scope(body, &mut edit, map, &global_param, &mut summary);
        let returns = return_last_expression(body, &mut edit, map);
        tracing::debug!(returns, globals = summary.defs.len(), "cell transpiled");

        let source = edit.source();
        Ok(Transpiled {
            code: source.text(),
            source,
            summary,
            global_param,
            import_param,
        })
    }
}

/// Transpiles `src` with default options.
pub fn transpile(src: &str) -> Result<String, TranspileError> {
    Transpiler::default().transpile(src).map(|t| t.code)
}

/// Makes the trailing expression statement the value of the cell.
fn return_last_expression(body: &BlockStmt, edit: &mut EditIndex, map: SpanMap) -> bool {
    let Some(Stmt::Expr(last)) = body.stmts.last() else {
        return false;
    };
    let range = map.range(last.expr.span());
    edit.prepend(range.clone(), "return (");
    edit.append(range, ")");
    true
}

/// Points a syntax error in the wrapped text back into the cell.
fn relocate(err: TranspileError, edit: &EditIndex) -> TranspileError {
    match err {
        TranspileError::Syntax {
            offset: Some(at),
            message,
        } => TranspileError::Syntax {
            offset: edit.origin_near(at),
            message,
        },
        other => other,
    }
}

/// `base`, or `base$1`, `base$2`, ... whichever the cell does not mention.
fn unused_name(base: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(base) {
        return base.to_string();
    }
    (1..)
        .map(|n| format!("{base}${n}"))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| base.to_string())
}

struct IdentCollector<'a> {
    out: &'a mut HashSet<String>,
}

impl Visit for IdentCollector<'_> {
    fn visit_ident(&mut self, n: &Ident) {
        self.out.insert(n.sym.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_expression_is_returned() {
        assert_eq!(
            transpile("1 + 2;").unwrap(),
            "(async (__global, __import, console) => {\nreturn (1 + 2);\n})"
        );
    }

    #[test]
    fn trailing_statement_returns_nothing() {
        assert_eq!(
            transpile("if (a) { b }").unwrap(),
            "(async (__global, __import, console) => {\nif (a) { b }\n})"
        );
    }

    #[test]
    fn trailing_line_comment_cannot_swallow_the_wrapper() {
        assert_eq!(
            transpile("x // done").unwrap(),
            "(async (__global, __import, console) => {\nreturn (x) // done\n})"
        );
    }

    #[test]
    fn empty_cell() {
        assert_eq!(
            transpile("").unwrap(),
            "(async (__global, __import, console) => {\n\n})"
        );
    }

    #[test]
    fn colliding_parameter_names_get_a_suffix() {
        let out = Transpiler::default()
            .transpile("let __global = 1; __import$1; __import")
            .unwrap();
        assert_eq!(out.global_param, "__global$1");
        assert_eq!(out.import_param, "__import$2");
        assert!(out
            .code
            .starts_with("(async (__global$1, __import$2, console) => {\nvoid ( (__global$1.__global = (1)));"));
    }

    #[test]
    fn unused_name_skips_taken_candidates() {
        let taken: HashSet<String> = ["g", "g$1"].iter().map(|s| s.to_string()).collect();
        assert_eq!(unused_name("g", &taken), "g$2");
        assert_eq!(unused_name("h", &taken), "h");
    }

    #[test]
    fn syntax_errors_point_into_the_cell() {
        match transpile("let x = ;") {
            Err(TranspileError::Syntax { offset, .. }) => assert_eq!(offset, Some(8)),
            other => panic!("expected a syntax error, got {other:?}"),
        }
    }

    #[test]
    fn synthetic_and_original_text_are_told_apart() {
        let options = TranspileOptions {
            file: Some("cell-1.js".into()),
            ..Default::default()
        };
        let out = Transpiler::new(options).unwrap().transpile("x").unwrap();
        let tagged: Vec<_> = out
            .source
            .cells()
            .iter()
            .filter(|c| !c.is_synthetic())
            .collect();
        assert_eq!(tagged.len(), 1);
        assert_eq!(tagged[0].ch, 'x');
        assert_eq!(tagged[0].file.as_deref(), Some("cell-1.js"));
    }
}
