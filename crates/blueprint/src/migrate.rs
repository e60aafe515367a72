// ---------------------------------------------------------------------------
// Format migration: bring decoded Documents up to the current version
// ---------------------------------------------------------------------------
//
// Each migration step is a function `fn(&mut Document)` that transforms a
// Document from version N to version N+1. The registry validates at
// construction time that the chain is contiguous from MIN_FORMAT_VERSION to
// CURRENT_FORMAT_VERSION (no gaps, no duplicates). The decoder already fills
// version-appropriate defaults for absent fields, so steps mostly bump the
// version and occasionally fix up data.

use crate::document::{Document, CURRENT_FORMAT_VERSION, MIN_FORMAT_VERSION};
use crate::error::BlueprintError;

/// A single migration step: transforms a Document from `from_version` to
/// `from_version + 1`.
struct MigrationStep {
    from_version: u32,
    description: &'static str,
    migrate_fn: fn(&mut Document),
}

/// Result of running the migration chain on a decoded Document.
#[derive(Debug, Clone)]
pub struct MigrationReport {
    /// The version the file pair was originally at.
    pub original_version: u32,
    /// The version the Document is now at (equals `CURRENT_FORMAT_VERSION`).
    pub final_version: u32,
    /// Number of migration steps that were applied.
    pub steps_applied: u32,
    /// Descriptions of each applied step, in order.
    pub step_descriptions: Vec<&'static str>,
}

/// Registry holding an ordered, validated chain of migration steps.
struct MigrationRegistry {
    steps: Vec<MigrationStep>,
    current_version: u32,
}

impl MigrationRegistry {
    /// Build a registry from a list of migration steps.
    ///
    /// # Panics
    ///
    /// Panics if the chain has duplicate source versions or gaps between
    /// `MIN_FORMAT_VERSION` and `current_version`. This is a build defect,
    /// not an input error, so it fails loudly at construction.
    fn new(steps: Vec<MigrationStep>, current_version: u32) -> Self {
        let mut seen = std::collections::HashSet::new();
        for step in &steps {
            assert!(
                seen.insert(step.from_version),
                "Duplicate migration step for version {}",
                step.from_version
            );
        }
        for v in MIN_FORMAT_VERSION..current_version {
            assert!(
                seen.contains(&v),
                "Missing migration step from v{} to v{}",
                v,
                v + 1
            );
        }

        let mut steps = steps;
        steps.sort_by_key(|s| s.from_version);

        Self {
            steps,
            current_version,
        }
    }

    /// Apply all steps needed to bring a Document up to `current_version`.
    fn migrate(&self, doc: &mut Document) -> Result<MigrationReport, BlueprintError> {
        let original_version = doc.header.format_version;

        // Decoded Documents are always in range, but one supplied externally
        // (e.g. hand-edited JSON) can claim any version; no chain starts
        // below MIN_FORMAT_VERSION, so reject both ends here.
        if !(MIN_FORMAT_VERSION..=self.current_version).contains(&original_version) {
            return Err(BlueprintError::UnsupportedVersion {
                expected_max: self.current_version,
                found: original_version,
            });
        }

        let mut steps_applied = 0u32;
        let mut step_descriptions = Vec::new();

        for step in &self.steps {
            if doc.header.format_version >= self.current_version {
                break;
            }
            if step.from_version == doc.header.format_version {
                (step.migrate_fn)(doc);
                doc.header.format_version = step.from_version + 1;
                steps_applied += 1;
                step_descriptions.push(step.description);
            }
        }

        debug_assert_eq!(doc.header.format_version, self.current_version);

        Ok(MigrationReport {
            original_version,
            final_version: doc.header.format_version,
            steps_applied,
            step_descriptions,
        })
    }
}

/// Build the full migration registry with all version transition steps.
fn build_registry() -> MigrationRegistry {
    let steps = vec![
        // v1 -> v2: footprint in the main header, description in the config
        // file. The decoder fills zeros / empty string for v1 input, which
        // are the correct v2 values for a blueprint that never had them.
        MigrationStep {
            from_version: 1,
            description: "Add footprint (main header) and description (config file)",
            migrate_fn: |_doc| {},
        },
    ];

    MigrationRegistry::new(steps, CURRENT_FORMAT_VERSION)
}

/// Migrate a decoded Document from any supported version up to
/// `CURRENT_FORMAT_VERSION`. Returns the original version so callers can log
/// the migration.
///
/// # Errors
///
/// Returns `BlueprintError::UnsupportedVersion` if the Document claims a
/// version newer than this build supports.
pub fn migrate_document(doc: &mut Document) -> Result<u32, BlueprintError> {
    let report = build_registry().migrate(doc)?;
    Ok(report.original_version)
}

/// Migrate a Document and return the step-by-step [`MigrationReport`].
///
/// # Errors
///
/// Returns `BlueprintError::UnsupportedVersion` if the Document claims a
/// version newer than this build supports.
pub fn migrate_document_with_report(
    doc: &mut Document,
) -> Result<MigrationReport, BlueprintError> {
    build_registry().migrate(doc)
}
