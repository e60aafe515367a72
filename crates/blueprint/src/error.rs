// ---------------------------------------------------------------------------
// BlueprintError: typed errors for blueprint decode/encode operations
// ---------------------------------------------------------------------------

use std::fmt;

/// Errors that can occur while decoding or encoding a blueprint file pair.
///
/// Every variant is a recoverable value: malformed input never panics, and a
/// caller processing many blueprints can catch and report per file.
#[derive(Debug)]
pub enum BlueprintError {
    /// A cursor read would run past the end of the buffer.
    OutOfBounds {
        offset: usize,
        need: usize,
        have: usize,
    },
    /// The file's magic/version marker is not one this build can read.
    UnsupportedVersion { expected_max: u32, found: u32 },
    /// A length field, checksum, or structural invariant disagrees with the
    /// actual bytes (corrupt or hand-edited file).
    CorruptData(String),
    /// The in-memory Document violates an invariant required to serialize it.
    Encoding(String),
    /// I/O error (file not found, permission denied, disk full, etc.)
    Io(std::io::Error),
}

impl fmt::Display for BlueprintError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlueprintError::OutOfBounds { offset, need, have } => write!(
                f,
                "Read out of bounds at offset {offset}: need {need} bytes, have {have}"
            ),
            BlueprintError::UnsupportedVersion {
                expected_max,
                found,
            } => write!(
                f,
                "Unsupported format version: file is v{found}, but this build only supports up to v{expected_max}"
            ),
            BlueprintError::CorruptData(msg) => write!(f, "Corrupt blueprint data: {msg}"),
            BlueprintError::Encoding(msg) => write!(f, "Encoding error: {msg}"),
            BlueprintError::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for BlueprintError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BlueprintError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for BlueprintError {
    fn from(e: std::io::Error) -> Self {
        BlueprintError::Io(e)
    }
}
