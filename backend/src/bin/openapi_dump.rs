//! Print the OpenAPI document as JSON, or write it to a file.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use clap::Parser;
use marketplace::doc::ApiDoc;
use utoipa::OpenApi;

/// Dump the marketplace OpenAPI document.
#[derive(Debug, Parser)]
#[command(name = "openapi-dump")]
struct Args {
    /// Write to this path instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> std::io::Result<()> {
    let args = Args::parse();
    let document = ApiDoc::openapi()
        .to_pretty_json()
        .map_err(std::io::Error::other)?;
    match args.output {
        Some(path) => fs::write(path, format!("{document}\n")),
        None => writeln!(std::io::stdout().lock(), "{document}"),
    }
}
