// ---------------------------------------------------------------------------
// File pair coordinator: the two files on disk as one logical blueprint
// ---------------------------------------------------------------------------
//
// The only component that knows a blueprint is physically two files. Reading
// decodes both buffers into a Document and migrates it to the current
// format; writing encodes the Document and streams the main-file body chunks
// through an atomic write-rename. Everything downstream of here operates on
// the unified Document.

use std::fs;
use std::path::Path;

use tracing::{info, warn};

use crate::atomic_write::{atomic_write, atomic_write_chunks};
use crate::decode::decode_blueprint;
use crate::document::Document;
use crate::encode::encode_blueprint;
use crate::error::BlueprintError;
use crate::migrate::migrate_document_with_report;

/// Read a blueprint file pair and return the migrated Document.
///
/// `name` is the display name to attach to the Document; it is not stored
/// in either file. Callers typically derive it from the main file's name.
///
/// # Errors
///
/// Propagates `Io` for unreadable files and every decode/migration error
/// from the codec core.
pub fn read_pair(
    main_path: &Path,
    config_path: &Path,
    name: &str,
) -> Result<Document, BlueprintError> {
    let main = fs::read(main_path)?;
    let config = fs::read(config_path)?;

    let mut doc = decode_blueprint(&main, &config, name)?;
    info!(
        "Blueprint header: format v{}, id {:#018X}, {} objects, footprint {:?}{}",
        doc.header.format_version,
        doc.header.blueprint_id,
        doc.header.object_count,
        doc.header.footprint,
        if doc.header.compressed {
            ", compressed body"
        } else {
            ""
        },
    );

    let report = migrate_document_with_report(&mut doc)?;
    if report.steps_applied > 0 {
        warn!(
            "Migrated blueprint from v{} to v{} ({} steps applied)",
            report.original_version, report.final_version, report.steps_applied,
        );
        for desc in &report.step_descriptions {
            info!("  - {desc}");
        }
    }

    info!("Read blueprint pair from {}", main_path.display());
    Ok(doc)
}

/// Encode a Document and write both files atomically.
///
/// Main-file body chunks are streamed straight to the temp file, so large
/// blueprints are never materialized as one buffer. The config file is
/// written after the main file succeeds.
///
/// # Errors
///
/// Propagates `Encoding` for invalid Documents and `Io` for write failures.
pub fn write_pair(
    doc: &Document,
    main_path: &Path,
    config_path: &Path,
) -> Result<(), BlueprintError> {
    let encoded = encode_blueprint(doc)?;

    atomic_write_chunks(main_path, &encoded.header, encoded.body)?;
    atomic_write(config_path, &encoded.config)?;

    info!(
        "Wrote blueprint pair: {} + {} ({} objects)",
        main_path.display(),
        config_path.display(),
        doc.header.object_count,
    );
    Ok(())
}
