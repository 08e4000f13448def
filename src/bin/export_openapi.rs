//! Write the MedCare Transfer API document as pretty JSON
//!
//! Usage:
//!   cargo run --bin export_openapi                        # stdout
//!   cargo run --bin export_openapi -- --output docs/openapi.json
//!   cargo run --bin export_openapi -- -o docs/openapi.json

use anyhow::{Context, bail};
use medcare::gateway::openapi::ApiDoc;
use utoipa::OpenApi;

/// Output path from `--output <path>` / `-o <path>`; `None` means stdout
fn output_path(args: &[String]) -> anyhow::Result<Option<&str>> {
    let mut iter = args.iter().skip(1);
    let mut path = None;
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--output" | "-o" => match iter.next() {
                Some(value) => path = Some(value.as_str()),
                None => bail!("{arg} needs a file path"),
            },
            other => bail!("Unknown argument: {other}"),
        }
    }
    Ok(path)
}

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let output = output_path(&args)?;

    let doc = ApiDoc::openapi();
    let json = doc
        .to_pretty_json()
        .context("Failed to serialize the MedCare OpenAPI document")?;

    match output {
        Some(path) => {
            std::fs::write(path, &json).with_context(|| format!("Failed to write {path}"))?;
            eprintln!(
                "{} {} ({} paths) exported to: {}",
                doc.info.title,
                doc.info.version,
                doc.paths.paths.len(),
                path
            );
        }
        None => println!("{json}"),
    }
    Ok(())
}
