//! Transpiles one notebook cell.
//!
//! Usage:
//!   transpile-cell cell.js --global nb
//!   echo 'import {a} from "m"; a' | transpile-cell --summary

use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use cell_transpiler::{tracing_config, CellSummary, TranspileOptions, Transpiler};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "transpile-cell")]
#[command(about = "Rewrite a notebook cell into an async function expression", long_about = None)]
struct Args {
    /// Cell source file; stdin when omitted
    input: Option<PathBuf>,

    /// JSON options file, overridden by the flags below
    #[arg(long)]
    options: Option<PathBuf>,

    /// Name of the global object parameter
    #[arg(long = "global")]
    global_param: Option<String>,

    /// Name of the import primitive parameter
    #[arg(long = "import")]
    import_param: Option<String>,

    /// File name recorded for every character of the cell
    #[arg(long)]
    file: Option<String>,

    /// Print a JSON document with the code and the cell's imports and globals
    #[arg(long)]
    summary: bool,
}

#[derive(serde::Serialize)]
struct Report<'a> {
    code: &'a str,
    global_param: &'a str,
    import_param: &'a str,
    summary: &'a CellSummary,
}

fn main() -> Result<()> {
    tracing_config::init_tracing();
    let args = Args::parse();

    let mut options = match &args.options {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading options from {}", path.display()))?;
            TranspileOptions::from_json(&json)?
        }
        None => TranspileOptions::default(),
    };
    if let Some(name) = args.global_param {
        options.global_param = name;
    }
    if let Some(name) = args.import_param {
        options.import_param = name;
    }
    if args.file.is_some() {
        options.file = args.file;
    } else if options.file.is_none() {
        options.file = args.input.as_ref().map(|p| p.display().to_string());
    }

    let src = match &args.input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading cell from stdin")?;
            buf
        }
    };

    let out = Transpiler::new(options)?.transpile(&src)?;
    if args.summary {
        let report = Report {
            code: &out.code,
            global_param: &out.global_param,
            import_param: &out.import_param,
            summary: &out.summary,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", out.code);
    }
    Ok(())
}
