// ---------------------------------------------------------------------------
// Binary schema decoder: blueprint file pair -> Document
// ---------------------------------------------------------------------------
//
// Main file layout (little-endian):
//   [0..4]    magic "FBPR"
//   [4..8]    format version (u32)
//   [8..16]   blueprint id (u64, shared with the config file)
//   [16..20]  flags (u32: bit 0 = body LZ4-compressed)
//   [20..24]  object count (u32)
//   [24..36]  footprint, 3 x u32 (v2+ only; v1 headers stop at offset 24)
//   [..N-4]   stored body: object records, LZ4 block if the flag is set
//   [N-4..N]  xxHash32 checksum of the *raw* (uncompressed) body bytes
//
// Each body record:
//   type id (u32), position (3 x f32), rotation quaternion (4 x f32),
//   payload length (u32), payload bytes.
//
// Config file layout:
//   magic "FBPC", version (u32), blueprint id (u64),
//   description string (v2+), icon id (u32), category (u8),
//   trailing xxHash32 checksum of everything before it.

use xxhash_rust::xxh32::xxh32;

use crate::cursor::Cursor;
use crate::document::{
    BlueprintConfig, BlueprintHeader, Category, Document, PlacedObject, Payload, Transform,
    CONFIG_MAGIC, CURRENT_FORMAT_VERSION, FLAG_COMPRESSED, MAGIC, MIN_FORMAT_VERSION, TYPE_BEAM,
    TYPE_FOUNDATION, TYPE_SIGN, TYPE_WALL, XXHASH_SEED,
};
use crate::error::BlueprintError;

/// Decode a blueprint file pair into a [`Document`].
///
/// `name` is the caller-supplied display name; it is not stored in the
/// binary data and is used only to label the resulting Document.
///
/// The two buffers are decoded independently (each has its own marker),
/// then cross-checked: the config file must carry the same blueprint id as
/// the main file.
///
/// # Errors
///
/// - `UnsupportedVersion` if either version field is outside
///   `MIN_FORMAT_VERSION..=CURRENT_FORMAT_VERSION`.
/// - `CorruptData` if a magic tag, checksum, length field, or the shared
///   identity disagrees with the actual bytes.
/// - `OutOfBounds` if a read runs past a buffer end.
pub fn decode_blueprint(
    main: &[u8],
    config: &[u8],
    name: &str,
) -> Result<Document, BlueprintError> {
    let mut cursor = Cursor::new(main);
    let header = decode_header(&mut cursor)?;

    // Everything between the header and the 4-byte checksum trailer is the
    // stored body.
    let remaining = cursor.remaining();
    if remaining < 4 {
        return Err(BlueprintError::CorruptData(
            "main file ends before the checksum trailer".to_string(),
        ));
    }
    let stored_body = cursor.read_bytes(remaining - 4)?;
    let checksum = cursor.read_u32()?;

    let raw_body = if header.compressed {
        lz4_flex::decompress_size_prepended(stored_body).map_err(|e| {
            BlueprintError::CorruptData(format!("body decompression failed: {e}"))
        })?
    } else {
        stored_body.to_vec()
    };

    let computed = xxh32(&raw_body, XXHASH_SEED);
    if computed != checksum {
        return Err(BlueprintError::CorruptData(format!(
            "body checksum mismatch (expected {checksum:#010X}, got {computed:#010X})"
        )));
    }

    let objects = decode_body(&raw_body, header.object_count)?;

    let (config_id, config) = decode_config(config)?;
    if config_id != header.blueprint_id {
        return Err(BlueprintError::CorruptData(format!(
            "config file belongs to blueprint {config_id:#018X}, main file is {:#018X}",
            header.blueprint_id
        )));
    }

    Ok(Document {
        name: name.to_string(),
        header,
        objects,
        config,
    })
}

/// Decode the fixed main-file header.
fn decode_header(cursor: &mut Cursor<'_>) -> Result<BlueprintHeader, BlueprintError> {
    let magic = cursor.read_magic()?;
    if magic != MAGIC {
        return Err(BlueprintError::CorruptData(format!(
            "not a blueprint main file: magic {magic:?}, expected {MAGIC:?}"
        )));
    }

    let format_version = cursor.read_u32()?;
    check_version(format_version)?;

    let blueprint_id = cursor.read_u64()?;

    let flags = cursor.read_u32()?;
    if flags & !FLAG_COMPRESSED != 0 {
        return Err(BlueprintError::CorruptData(format!(
            "unknown header flags {flags:#010X}"
        )));
    }

    let object_count = cursor.read_u32()?;

    // v1 headers stop here; the footprint field arrived in v2.
    let footprint = if format_version >= 2 {
        [cursor.read_u32()?, cursor.read_u32()?, cursor.read_u32()?]
    } else {
        [0, 0, 0]
    };

    Ok(BlueprintHeader {
        format_version,
        blueprint_id,
        compressed: flags & FLAG_COMPRESSED != 0,
        object_count,
        footprint,
    })
}

/// Decode `count` records from the raw (decompressed) body bytes.
fn decode_body(raw_body: &[u8], count: u32) -> Result<Vec<PlacedObject>, BlueprintError> {
    let mut cursor = Cursor::new(raw_body);
    let mut objects = Vec::with_capacity(count as usize);
    for index in 0..count {
        objects.push(decode_record(&mut cursor).map_err(|e| annotate_record(index, e))?);
    }
    if !cursor.is_empty() {
        return Err(BlueprintError::CorruptData(format!(
            "{} trailing bytes after the last record",
            cursor.remaining()
        )));
    }
    Ok(objects)
}

/// Wrap record-level errors with the record index; bounds errors keep their
/// own offsets.
fn annotate_record(index: u32, e: BlueprintError) -> BlueprintError {
    match e {
        BlueprintError::CorruptData(msg) => {
            BlueprintError::CorruptData(format!("record {index}: {msg}"))
        }
        other => other,
    }
}

fn decode_record(cursor: &mut Cursor<'_>) -> Result<PlacedObject, BlueprintError> {
    let type_id = cursor.read_u32()?;
    let transform = Transform {
        position: [cursor.read_f32()?, cursor.read_f32()?, cursor.read_f32()?],
        rotation: [
            cursor.read_f32()?,
            cursor.read_f32()?,
            cursor.read_f32()?,
            cursor.read_f32()?,
        ],
    };

    let payload_len = cursor.read_u32()? as usize;
    if payload_len > cursor.remaining() {
        return Err(BlueprintError::CorruptData(format!(
            "payload declares {payload_len} bytes but only {} remain",
            cursor.remaining()
        )));
    }
    let mut payload_cursor = cursor.take(payload_len)?;

    let payload = match type_id {
        TYPE_BEAM => Payload::Beam {
            length: payload_cursor.read_f32()?,
        },
        TYPE_FOUNDATION => Payload::Foundation {
            size_x: payload_cursor.read_f32()?,
            size_y: payload_cursor.read_f32()?,
        },
        TYPE_WALL => Payload::Wall {
            width: payload_cursor.read_f32()?,
            height: payload_cursor.read_f32()?,
        },
        TYPE_SIGN => Payload::Sign {
            text: payload_cursor.read_string()?,
        },
        // Forward compatibility: an unrecognized type with a valid declared
        // length is kept raw, not dropped, so it re-encodes unchanged.
        other => {
            let bytes = payload_cursor.read_bytes(payload_len)?.to_vec();
            Payload::Unknown {
                type_id: other,
                bytes,
            }
        }
    };

    // A known type must consume exactly its declared payload length.
    if !payload_cursor.is_empty() {
        return Err(BlueprintError::CorruptData(format!(
            "type {type_id} payload declared {payload_len} bytes but its fields use {}",
            payload_len - payload_cursor.remaining()
        )));
    }

    Ok(PlacedObject { transform, payload })
}

/// Decode the config file to its blueprint id and metadata.
pub(crate) fn decode_config(bytes: &[u8]) -> Result<(u64, BlueprintConfig), BlueprintError> {
    if bytes.len() < 4 {
        return Err(BlueprintError::CorruptData(
            "config file ends before the checksum trailer".to_string(),
        ));
    }
    let (prefix, trailer) = bytes.split_at(bytes.len() - 4);
    let checksum = u32::from_le_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
    let computed = xxh32(prefix, XXHASH_SEED);
    if computed != checksum {
        return Err(BlueprintError::CorruptData(format!(
            "config checksum mismatch (expected {checksum:#010X}, got {computed:#010X})"
        )));
    }

    let mut cursor = Cursor::new(prefix);
    let magic = cursor.read_magic()?;
    if magic != CONFIG_MAGIC {
        return Err(BlueprintError::CorruptData(format!(
            "not a blueprint config file: magic {magic:?}, expected {CONFIG_MAGIC:?}"
        )));
    }

    let version = cursor.read_u32()?;
    check_version(version)?;

    let blueprint_id = cursor.read_u64()?;

    // The description field arrived in v2.
    let description = if version >= 2 {
        cursor.read_string()?
    } else {
        String::new()
    };

    let icon_id = cursor.read_u32()?;
    let category_byte = cursor.read_u8()?;
    let category = Category::from_u8(category_byte).ok_or_else(|| {
        BlueprintError::CorruptData(format!("unknown category byte {category_byte}"))
    })?;

    if !cursor.is_empty() {
        return Err(BlueprintError::CorruptData(format!(
            "{} trailing bytes in config file",
            cursor.remaining()
        )));
    }

    Ok((
        blueprint_id,
        BlueprintConfig {
            description,
            icon_id,
            category,
        },
    ))
}

fn check_version(version: u32) -> Result<(), BlueprintError> {
    if !(MIN_FORMAT_VERSION..=CURRENT_FORMAT_VERSION).contains(&version) {
        return Err(BlueprintError::UnsupportedVersion {
            expected_max: CURRENT_FORMAT_VERSION,
            found: version,
        });
    }
    Ok(())
}
