//! Print the OpenAPI document as JSON, or write it to `--output`.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use emoji_backend::ApiDoc;
use utoipa::OpenApi;

/// Export the emoji API's OpenAPI document.
#[derive(Debug, Parser)]
#[command(name = "openapi-dump")]
struct Args {
    /// File to write instead of standard output.
    #[arg(long, short)]
    output: Option<PathBuf>,
}

fn run(args: Args) -> Result<(), String> {
    let json = ApiDoc::openapi()
        .to_pretty_json()
        .map_err(|e| format!("failed to serialise OpenAPI document: {e}"))?;
    match args.output {
        Some(path) => std::fs::write(&path, format!("{json}\n"))
            .map_err(|e| format!("failed to write {}: {e}", path.display())),
        None => {
            println!("{json}");
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}
