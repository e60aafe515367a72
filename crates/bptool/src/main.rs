//! Command-line blueprint inspector and converter.
//!
//! `bptool unpack` decodes a blueprint file pair into readable JSON;
//! `bptool pack` turns that JSON back into a binary pair. Unpacking then
//! packing an unmodified document reproduces the original files
//! byte-for-byte.

use std::env;
use std::fs;
use std::path::Path;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use blueprint::{migrate_document, read_pair, write_pair, Document};
use tracing::info;

fn usage(program: &str) {
    eprintln!("Usage:");
    eprintln!("  {program} unpack <main.fbp> <config.fbpc> [out.json]");
    eprintln!("  {program} pack <in.json> <out.fbp> <out.fbpc>");
    eprintln!();
    eprintln!("unpack decodes a blueprint file pair to JSON (stdout if no output");
    eprintln!("path is given); pack encodes JSON back into a binary pair.");
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("bptool");

    let result = match args.get(1).map(String::as_str) {
        Some("unpack") if args.len() == 4 || args.len() == 5 => {
            unpack(&args[2], &args[3], args.get(4).map(String::as_str))
        }
        Some("pack") if args.len() == 5 => pack(&args[2], &args[3], &args[4]),
        _ => {
            usage(program);
            return ExitCode::from(2);
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Decode a file pair and emit the Document as pretty JSON.
fn unpack(main_path: &str, config_path: &str, out_path: Option<&str>) -> Result<()> {
    let main_path = Path::new(main_path);
    let config_path = Path::new(config_path);

    // The display name is not stored in the binary files; derive it from
    // the main file's name, as the game does.
    let name = main_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("blueprint");

    let doc = read_pair(main_path, config_path, name)
        .with_context(|| format!("failed to read blueprint pair {}", main_path.display()))?;

    let json = serde_json::to_string_pretty(&doc).context("failed to serialize blueprint")?;

    match out_path {
        Some(path) => {
            fs::write(path, json.as_bytes()).with_context(|| format!("failed to write {path}"))?;
            info!("Unpacked '{}' ({} objects) to {path}", doc.name, doc.objects.len());
        }
        None => println!("{json}"),
    }
    Ok(())
}

/// Parse a Document from JSON and write it as a binary file pair.
fn pack(json_path: &str, main_path: &str, config_path: &str) -> Result<()> {
    let json = fs::read_to_string(json_path)
        .with_context(|| format!("failed to read {json_path}"))?;
    let mut doc: Document =
        serde_json::from_str(&json).with_context(|| format!("{json_path} is not a blueprint"))?;

    if doc.header.object_count as usize != doc.objects.len() {
        bail!(
            "{json_path}: header declares {} objects but the list holds {}",
            doc.header.object_count,
            doc.objects.len()
        );
    }

    // JSON exported from an older pair carries the old version; bring it up
    // to date so the encoder accepts it.
    migrate_document(&mut doc)?;

    write_pair(&doc, Path::new(main_path), Path::new(config_path))
        .with_context(|| format!("failed to write blueprint pair {main_path}"))?;
    Ok(())
}
