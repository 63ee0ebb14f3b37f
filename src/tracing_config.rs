//! Opt-in tracing for the command-line front end.
//!
//! `CELL_LOG` (or `RUST_LOG`) turns the subscriber on and selects levels with
//! the usual `EnvFilter` syntax. `CELL_LOG_FORMAT=json` switches from plain
//! text to one JSON object per event.
//!
//! ```bash
//! CELL_LOG=cell_transpiler=trace transpile-cell cell.js
//! CELL_LOG=debug CELL_LOG_FORMAT=json transpile-cell < cell.js
//! ```

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter, Registry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }

    fn from_env() -> Self {
        Self::parse(&std::env::var("CELL_LOG_FORMAT").unwrap_or_default())
    }
}

fn build_filter() -> EnvFilter {
    match std::env::var("CELL_LOG") {
        Ok(val) => EnvFilter::builder().parse_lossy(val),
        Err(_) => EnvFilter::from_default_env(),
    }
}

/// Installs the global subscriber, writing to stderr so stdout stays the
/// transpiled code. Does nothing unless `CELL_LOG` or `RUST_LOG` is set.
pub fn init_tracing() {
    if std::env::var_os("CELL_LOG").is_none() && std::env::var_os("RUST_LOG").is_none() {
        return;
    }

    let filter = build_filter();
    match LogFormat::from_env() {
        LogFormat::Json => {
            let json_layer = fmt::layer().json().with_writer(std::io::stderr);
            // A subscriber installed earlier (e.g. by an embedding host) wins.
            let _ = Registry::default().with(filter).with(json_layer).try_init();
        }
        LogFormat::Text => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .try_init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_names() {
        assert_eq!(LogFormat::parse("json"), LogFormat::Json);
        assert_eq!(LogFormat::parse("JSON"), LogFormat::Json);
        assert_eq!(LogFormat::parse("text"), LogFormat::Text);
        assert_eq!(LogFormat::parse(""), LogFormat::Text);
    }
}
