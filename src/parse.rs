//! Parser front: the swc ECMAScript parser, configured for cells.
//!
//! Positions handed to the parser start at [`ORIGIN`] instead of zero, since
//! swc treats `BytePos(0)` spans as dummies. [`SpanMap`] undoes that and
//! shifts spans into the coordinate space of an [`EditIndex`].
//!
//! [`EditIndex`]: crate::source::EditIndex

use std::ops::Range;

use swc_core::common::{BytePos, Span, Spanned};
use swc_core::ecma::ast::{BlockStmt, BlockStmtOrExpr, Expr, ExprStmt, Module, ParenExpr, Script, Stmt};
use swc_core::ecma::parser::{error::Error as ParseError, EsSyntax, Parser, StringInput, Syntax};

use crate::TranspileError;

pub(crate) const ORIGIN: BytePos = BytePos(1);

fn syntax() -> Syntax {
    Syntax::Es(EsSyntax {
        import_attributes: true,
        ..Default::default()
    })
}

fn input(text: &str) -> Result<StringInput<'_>, TranspileError> {
    let end = u32::try_from(text.len())
        .ok()
        .and_then(|len| ORIGIN.0.checked_add(len))
        .ok_or(TranspileError::Unsupported {
            construct: "cell larger than 4 GiB",
            offset: 0,
        })?;
    Ok(StringInput::new(text, ORIGIN, BytePos(end)))
}

fn syntax_error(err: ParseError) -> TranspileError {
    let span = err.span();
    TranspileError::Syntax {
        offset: Some(span.lo.0.saturating_sub(ORIGIN.0) as usize),
        message: err.kind().msg().to_string(),
    }
}

/// Parses a cell on its own. Module grammar makes `import` declarations and
/// top-level `await` legal.
pub(crate) fn parse_module(text: &str) -> Result<Module, TranspileError> {
    let mut parser = Parser::new(syntax(), input(text)?, None);
    let module = parser.parse_module().map_err(syntax_error)?;
    // Recoverable errors are still errors for a cell.
    if let Some(err) = parser.take_errors().into_iter().next() {
        return Err(syntax_error(err));
    }
    Ok(module)
}

/// Parses the wrapped cell, a script holding one function expression.
pub(crate) fn parse_script(text: &str) -> Result<Script, TranspileError> {
    let mut parser = Parser::new(syntax(), input(text)?, None);
    let script = parser.parse_script().map_err(syntax_error)?;
    if let Some(err) = parser.take_errors().into_iter().next() {
        return Err(syntax_error(err));
    }
    Ok(script)
}

/// Body of the async arrow function a wrapped cell consists of.
pub(crate) fn wrapper_body(script: &Script) -> Result<&BlockStmt, TranspileError> {
    let [Stmt::Expr(ExprStmt { expr, .. })] = script.body.as_slice() else {
        return Err(TranspileError::Structure("expected a single expression statement"));
    };
    let Expr::Paren(ParenExpr { expr, .. }) = &**expr else {
        return Err(TranspileError::Structure("expected a parenthesized wrapper"));
    };
    let Expr::Arrow(arrow) = &**expr else {
        return Err(TranspileError::Structure("expected an arrow function"));
    };
    match &*arrow.body {
        BlockStmtOrExpr::BlockStmt(body) if arrow.is_async => Ok(body),
        _ => Err(TranspileError::Structure("expected an async arrow function with a block body")),
    }
}

/// Converts parser spans into byte ranges of an edit index whose text holds
/// the parsed text at `base`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SpanMap {
    base: usize,
}

impl SpanMap {
    pub(crate) fn new(base: usize) -> Self {
        SpanMap { base }
    }

    pub(crate) fn offset(&self, pos: BytePos) -> usize {
        (pos.0 - ORIGIN.0) as usize + self.base
    }

    pub(crate) fn range(&self, span: Span) -> Range<usize> {
        self.offset(span.lo)..self.offset(span.hi)
    }
}
