//! Rewrites a notebook cell into an async function expression.
//!
//! The cell's static imports become awaited calls of an injected import
//! primitive, its top-level declarations become properties of an injected
//! global object, and its trailing expression becomes the function's result.
//! Every character of the output remembers where it came from.

mod error;
mod imports;
mod options;
mod parse;
mod scope;
pub mod source;
pub mod summary;
pub mod tracing_config;
mod transpile;
pub mod walk;

pub use error::TranspileError;
pub use options::TranspileOptions;
pub use source::{Cell, EditIndex, EditNode, Source};
pub use summary::{CellSummary, DefRow, ImportRow};
pub use transpile::{transpile, Transpiled, Transpiler};
