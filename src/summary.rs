//! What a cell imports and which names it publishes on the global object.

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ImportRow {
    pub local: String,    // binding published on the global object
    pub imported: String, // 'default' | named export | '*' (namespace)
    pub source: String,   // module specifier as written, quotes included
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct DefRow {
    pub local: String,
    pub kind: &'static str, // var|let|const|function|class
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct CellSummary {
    pub imports: Vec<ImportRow>,
    /// Side-effect-only imports.
    pub effects: Vec<String>,
    pub defs: Vec<DefRow>,
}

impl CellSummary {
    /// Names the cell assigns on the global object, in source order.
    pub fn globals(&self) -> impl Iterator<Item = &str> {
        self.defs.iter().map(|d| d.local.as_str())
    }
}
