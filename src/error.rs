/// Errors that abort a transpilation. Nothing is retried and no partial output
/// is produced.
#[derive(Debug, thiserror::Error)]
pub enum TranspileError {
    /// The parser rejected the cell. `offset` is a byte offset into the cell
    /// text when the failure can be traced back to it.
    #[error("syntax error{}: {message}", at_offset(.offset))]
    Syntax {
        offset: Option<usize>,
        message: String,
    },

    /// The cell parses but uses a construct cells cannot contain.
    #[error("unsupported syntax at offset {offset}: {construct}")]
    Unsupported {
        construct: &'static str,
        offset: usize,
    },

    #[error("invalid option `{name}`: {reason}")]
    InvalidOption { name: &'static str, reason: String },

    #[error("malformed transpiler options: {0}")]
    Options(#[from] serde_json::Error),

    /// The wrapped text did not parse into the shape the wrapper guarantees.
    #[error("wrapped cell does not have the expected shape: {0}")]
    Structure(&'static str),
}

fn at_offset(offset: &Option<usize>) -> String {
    match offset {
        Some(at) => format!(" at offset {at}"),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syntax_error_mentions_offset_only_when_known() {
        let known = TranspileError::Syntax {
            offset: Some(4),
            message: "Expected ';'".into(),
        };
        assert_eq!(known.to_string(), "syntax error at offset 4: Expected ';'");

        let unknown = TranspileError::Syntax {
            offset: None,
            message: "Unexpected eof".into(),
        };
        assert_eq!(unknown.to_string(), "syntax error: Unexpected eof");
    }
}
