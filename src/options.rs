use once_cell::sync::Lazy;
use regex::Regex;

use crate::TranspileError;

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").expect("identifier pattern compiles"));

/// Words that cannot name a parameter of the wrapper function.
const RESERVED: &[&str] = &[
    "arguments", "await", "break", "case", "catch", "class", "const", "continue", "debugger",
    "default", "delete", "do", "else", "enum", "eval", "export", "extends", "false", "finally",
    "for", "function", "if", "implements", "import", "in", "instanceof", "interface", "let", "new",
    "null", "package", "private", "protected", "public", "return", "static", "super", "switch",
    "this", "throw", "true", "try", "typeof", "var", "void", "while", "with", "yield",
];

/// How cells are wrapped.
///
/// Read from JSON the same way plugin configs are, e.g.
/// `{"global_param": "notebook", "file": "cell-3.js"}`; missing fields keep
/// their defaults.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct TranspileOptions {
    /// Parameter receiving the object shared by all cells of a session.
    pub global_param: String,
    /// Parameter receiving the host's async module loader.
    pub import_param: String,
    /// File name tagged onto every character of the cell.
    pub file: Option<String>,
}

impl Default for TranspileOptions {
    fn default() -> Self {
        TranspileOptions {
            global_param: "__global".to_string(),
            import_param: "__import".to_string(),
            file: None,
        }
    }
}

impl TranspileOptions {
    pub fn from_json(json: &str) -> Result<Self, TranspileError> {
        let options: TranspileOptions = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<(), TranspileError> {
        check_param("global_param", &self.global_param)?;
        check_param("import_param", &self.import_param)?;
        if self.global_param == self.import_param {
            return Err(TranspileError::InvalidOption {
                name: "import_param",
                reason: format!("`{}` is already the global parameter", self.import_param),
            });
        }
        Ok(())
    }
}

fn check_param(name: &'static str, value: &str) -> Result<(), TranspileError> {
    if !IDENTIFIER.is_match(value) {
        return Err(TranspileError::InvalidOption {
            name,
            reason: format!("`{value}` is not a plain identifier"),
        });
    }
    if RESERVED.contains(&value) || value == "console" {
        return Err(TranspileError::InvalidOption {
            name,
            reason: format!("`{value}` is reserved"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_fills_in_defaults() {
        let options = TranspileOptions::from_json(r#"{"global_param": "nb"}"#).unwrap();
        assert_eq!(options.global_param, "nb");
        assert_eq!(options.import_param, "__import");
        assert_eq!(options.file, None);
    }

    #[test]
    fn malformed_json_is_reported() {
        assert!(matches!(
            TranspileOptions::from_json("{"),
            Err(TranspileError::Options(_))
        ));
    }

    #[test]
    fn parameter_names_must_be_identifiers() {
        for bad in ["", "1x", "a-b", "a.b", "await", "console"] {
            let options = TranspileOptions {
                global_param: bad.to_string(),
                ..Default::default()
            };
            assert!(
                matches!(options.validate(), Err(TranspileError::InvalidOption { name: "global_param", .. })),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn parameter_names_must_differ() {
        let options = TranspileOptions {
            global_param: "same".into(),
            import_param: "same".into(),
            file: None,
        };
        assert!(options.validate().is_err());
    }
}
