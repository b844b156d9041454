//! Thin development CLI gated behind the `cli` feature (SPEC_FULL.md
//! §10.8): parse one `.java` file and print its AST, or a line/column
//! diagnostic on failure.

use std::env;
use std::fs;
use std::process::ExitCode;

use nova_core::{FileId, LineIndex, Severity};

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let Some(path) = env::args().nth(1) else {
        eprintln!("usage: nova-syntax <file.java>");
        return ExitCode::FAILURE;
    };

    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) => {
            eprintln!("{path}: {err}");
            return ExitCode::FAILURE;
        }
    };

    let source = nova_syntax::SourceFile::new(FileId::new(0), path.clone(), text.clone());
    match nova_syntax::parse(source) {
        Ok(unit) => {
            println!("{unit:#?}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            let diagnostic = err.to_diagnostic(Severity::Error);
            let index = LineIndex::new(&text);
            let line_col = index.line_col(diagnostic.range.start());
            eprintln!(
                "{path}:{}:{}: {}",
                line_col.line + 1,
                line_col.col + 1,
                diagnostic.message
            );
            ExitCode::FAILURE
        }
    }
}
