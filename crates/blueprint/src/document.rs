// ---------------------------------------------------------------------------
// Document model and format constants
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::error::BlueprintError;

// ---------------------------------------------------------------------------
// Format constants
// ---------------------------------------------------------------------------

/// Magic bytes identifying a blueprint main file.
pub const MAGIC: [u8; 4] = *b"FBPR";

/// Magic bytes identifying a blueprint config file.
pub const CONFIG_MAGIC: [u8; 4] = *b"FBPC";

/// Current blueprint format version.
/// v1 = original fields (identity, flags, object records; config with icon + category)
/// v2 = footprint in the main header, description in the config file
pub const CURRENT_FORMAT_VERSION: u32 = 2;

/// Oldest format version this build can still read.
pub const MIN_FORMAT_VERSION: u32 = 1;

/// Header flag bit 0: the body section is stored LZ4 block-compressed.
pub const FLAG_COMPRESSED: u32 = 1;

/// Seed for the xxHash32 body and config checksums.
pub(crate) const XXHASH_SEED: u32 = 0;

/// Record type ids with a known payload layout. Anything else decodes to
/// `Payload::Unknown` and is preserved verbatim.
pub const TYPE_BEAM: u32 = 1;
pub const TYPE_FOUNDATION: u32 = 2;
pub const TYPE_WALL: u32 = 3;
pub const TYPE_SIGN: u32 = 4;

// ---------------------------------------------------------------------------
// Document structs
// ---------------------------------------------------------------------------

/// Fixed metadata at the front of the main file. Immutable after decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlueprintHeader {
    /// Format version the pair was written with (after migration, always
    /// `CURRENT_FORMAT_VERSION`).
    pub format_version: u32,
    /// Identity shared between the main file and its config file.
    pub blueprint_id: u64,
    /// Whether the body section is stored LZ4-compressed. Kept on the
    /// header so a decoded pair re-encodes byte-identically.
    pub compressed: bool,
    /// Number of records in the body. Must equal the object list length.
    pub object_count: u32,
    /// Occupied grid cells as (width, depth, height). Zeros in v1 files.
    pub footprint: [u32; 3],
}

impl BlueprintHeader {
    /// Flags field as stored on disk.
    pub fn flags(&self) -> u32 {
        if self.compressed {
            FLAG_COMPRESSED
        } else {
            0
        }
    }
}

/// Pose of a placed object in blueprint-local space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Position (x, y, z).
    pub position: [f32; 3],
    /// Orientation quaternion (x, y, z, w).
    pub rotation: [f32; 4],
}

/// Type-specific payload of a placed-object record.
///
/// `Unknown` is the forward-compatibility case: a record written by a newer
/// game build decodes with its raw payload intact and re-encodes unchanged,
/// so foreign records survive a decode/encode cycle byte-for-byte.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Payload {
    Beam { length: f32 },
    Foundation { size_x: f32, size_y: f32 },
    Wall { width: f32, height: f32 },
    Sign { text: String },
    Unknown { type_id: u32, bytes: Vec<u8> },
}

impl Payload {
    /// Record type id as stored on disk.
    pub fn type_id(&self) -> u32 {
        match self {
            Payload::Beam { .. } => TYPE_BEAM,
            Payload::Foundation { .. } => TYPE_FOUNDATION,
            Payload::Wall { .. } => TYPE_WALL,
            Payload::Sign { .. } => TYPE_SIGN,
            Payload::Unknown { type_id, .. } => *type_id,
        }
    }
}

/// One placed-object record in the body section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedObject {
    pub transform: Transform,
    pub payload: Payload,
}

/// Blueprint library category stored in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Production,
    Logistics,
    Power,
    Architecture,
    Decoration,
    Other,
}

impl Category {
    pub fn to_u8(self) -> u8 {
        match self {
            Category::Production => 0,
            Category::Logistics => 1,
            Category::Power => 2,
            Category::Architecture => 3,
            Category::Decoration => 4,
            Category::Other => 5,
        }
    }

    /// `None` for out-of-range bytes; the decoder turns that into
    /// `CorruptData` rather than silently repairing the file.
    pub fn from_u8(v: u8) -> Option<Category> {
        match v {
            0 => Some(Category::Production),
            1 => Some(Category::Logistics),
            2 => Some(Category::Power),
            3 => Some(Category::Architecture),
            4 => Some(Category::Decoration),
            5 => Some(Category::Other),
            _ => None,
        }
    }
}

/// Companion metadata from the config file.
///
/// The display name is deliberately absent: it is not stored in either
/// binary file. Callers supply it (the CLI derives it from the filename)
/// and it rides on [`Document::name`] for labeling and JSON output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlueprintConfig {
    /// Free-text description shown in the blueprint library. Empty in v1
    /// files, which predate the field.
    pub description: String,
    /// Icon reference into the game's icon atlas.
    pub icon_id: u32,
    pub category: Category,
}

impl Default for BlueprintConfig {
    fn default() -> Self {
        Self {
            description: String::new(),
            icon_id: 0,
            category: Category::Other,
        }
    }
}

/// The decoded, structured representation of a blueprint file pair. The unit
/// exchanged with callers; constructed fresh on decode or supplied (e.g.
/// loaded from JSON) before an encode call. Single-owner, never mutated
/// concurrently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Caller-supplied display name, used only for labeling.
    pub name: String,
    pub header: BlueprintHeader,
    pub objects: Vec<PlacedObject>,
    pub config: BlueprintConfig,
}

impl Document {
    /// Build a current-version Document from parts, deriving the header's
    /// object count from the object list.
    pub fn new(
        name: impl Into<String>,
        blueprint_id: u64,
        footprint: [u32; 3],
        objects: Vec<PlacedObject>,
        config: BlueprintConfig,
    ) -> Self {
        Self {
            name: name.into(),
            header: BlueprintHeader {
                format_version: CURRENT_FORMAT_VERSION,
                blueprint_id,
                compressed: false,
                object_count: objects.len() as u32,
                footprint,
            },
            objects,
            config,
        }
    }

    /// Check the invariants required to serialize this Document.
    ///
    /// # Errors
    ///
    /// Returns `BlueprintError::Encoding` if the header's object count does
    /// not match the object list, an `Unknown` record claims a type id that
    /// has a known layout (it would decode as that type, not round-trip),
    /// or a variable-length field is too large for its u32 length prefix.
    pub fn validate(&self) -> Result<(), BlueprintError> {
        if self.header.object_count as usize != self.objects.len() {
            return Err(BlueprintError::Encoding(format!(
                "header declares {} objects but the body holds {}",
                self.header.object_count,
                self.objects.len()
            )));
        }
        if u32::try_from(self.config.description.len()).is_err() {
            return Err(BlueprintError::Encoding(format!(
                "config description is {} bytes, too large for a u32 length prefix",
                self.config.description.len()
            )));
        }
        for (index, object) in self.objects.iter().enumerate() {
            match &object.payload {
                Payload::Unknown { type_id, bytes } => {
                    if matches!(
                        *type_id,
                        TYPE_BEAM | TYPE_FOUNDATION | TYPE_WALL | TYPE_SIGN
                    ) {
                        return Err(BlueprintError::Encoding(format!(
                            "record {index}: Unknown payload claims reserved type id {type_id}"
                        )));
                    }
                    if u32::try_from(bytes.len()).is_err() {
                        return Err(BlueprintError::Encoding(format!(
                            "record {index}: payload is {} bytes, too large for a u32 length prefix",
                            bytes.len()
                        )));
                    }
                }
                // Sign payloads carry the string's own u32 length prefix
                // inside the record payload, hence the 4-byte headroom.
                Payload::Sign { text } => {
                    if text.len() > u32::MAX as usize - 4 {
                        return Err(BlueprintError::Encoding(format!(
                            "record {index}: sign text is {} bytes, too large for a u32 length prefix",
                            text.len()
                        )));
                    }
                }
                Payload::Beam { .. } | Payload::Foundation { .. } | Payload::Wall { .. } => {}
            }
        }
        Ok(())
    }
}
