// ---------------------------------------------------------------------------
// Binary schema encoder: Document -> blueprint file pair
// ---------------------------------------------------------------------------
//
// The encoder is the exact inverse of decode.rs: same layout, same constants.
// Invariants are validated eagerly so that chunk iteration never fails.
//
// The body is produced as a lazy, finite, single-pass sequence of byte
// chunks (`BodyChunks`): a caller can stream each chunk to disk or network
// without the whole body ever being materialized. The final chunk is the
// 4-byte xxHash32 trailer, hashed incrementally while the records are
// emitted. LZ4 compression is the one exception: compressing requires the
// raw body up front, so a compressed Document buffers internally and yields
// the compressed block as a single chunk.

use xxhash_rust::xxh32::Xxh32;

use crate::cursor::Writer;
use crate::document::{
    Document, PlacedObject, Payload, CONFIG_MAGIC, CURRENT_FORMAT_VERSION, MAGIC, XXHASH_SEED,
};
use crate::error::BlueprintError;

/// Target size for body chunks in streaming mode. Records are batched until
/// a chunk crosses this size, so actual chunks may run slightly over.
const CHUNK_TARGET: usize = 64 * 1024;

/// Encoder output: header bytes, a lazy body chunk producer for the main
/// file, and the fully assembled config file bytes.
pub struct EncodedBlueprint<'a> {
    /// Main-file header, emitted once before the body chunks.
    pub header: Vec<u8>,
    /// Body chunk producer. Finite, single-pass, not restartable.
    pub body: BodyChunks<'a>,
    /// Complete config file bytes (checksum trailer included).
    pub config: Vec<u8>,
}

impl EncodedBlueprint<'_> {
    /// Assemble the complete main-file bytes by draining the chunk producer.
    /// Convenience for callers that do not stream.
    pub fn into_main_bytes(self) -> Vec<u8> {
        let mut out = self.header;
        for chunk in self.body {
            out.extend_from_slice(&chunk);
        }
        out
    }
}

/// Encode a Document into its binary file pair.
///
/// Encoding is deterministic: the same Document always produces identical
/// bytes (nothing ambient, no timestamps). Only current-version Documents
/// encode; migrate older ones first.
///
/// # Errors
///
/// Returns `BlueprintError::Encoding` if the Document is not at
/// `CURRENT_FORMAT_VERSION` or violates a structural invariant
/// (see [`Document::validate`]).
pub fn encode_blueprint(doc: &Document) -> Result<EncodedBlueprint<'_>, BlueprintError> {
    if doc.header.format_version != CURRENT_FORMAT_VERSION {
        return Err(BlueprintError::Encoding(format!(
            "document is at format v{}, expected v{CURRENT_FORMAT_VERSION}; migrate before encoding",
            doc.header.format_version
        )));
    }
    doc.validate()?;

    let mut header = Writer::with_capacity(36);
    header.write_magic(&MAGIC);
    header.write_u32(doc.header.format_version);
    header.write_u64(doc.header.blueprint_id);
    header.write_u32(doc.header.flags());
    header.write_u32(doc.header.object_count);
    header.write_u32(doc.header.footprint[0]);
    header.write_u32(doc.header.footprint[1]);
    header.write_u32(doc.header.footprint[2]);

    let body = if doc.header.compressed {
        BodyChunks::buffered(&doc.objects)
    } else {
        BodyChunks::streaming(&doc.objects)
    };

    Ok(EncodedBlueprint {
        header: header.into_bytes(),
        body,
        config: encode_config(doc),
    })
}

/// Encode one body record: type id, transform, payload length, payload.
fn encode_record(out: &mut Writer, object: &PlacedObject) {
    out.write_u32(object.payload.type_id());
    for component in object.transform.position {
        out.write_f32(component);
    }
    for component in object.transform.rotation {
        out.write_f32(component);
    }

    let mut payload = Writer::new();
    match &object.payload {
        Payload::Beam { length } => payload.write_f32(*length),
        Payload::Foundation { size_x, size_y } => {
            payload.write_f32(*size_x);
            payload.write_f32(*size_y);
        }
        Payload::Wall { width, height } => {
            payload.write_f32(*width);
            payload.write_f32(*height);
        }
        Payload::Sign { text } => payload.write_string(text),
        Payload::Unknown { bytes, .. } => payload.write_bytes(bytes),
    }
    let payload = payload.into_bytes();
    // Validated to fit a u32 before encoding starts.
    out.write_u32(payload.len() as u32);
    out.write_bytes(&payload);
}

/// Encode the config file, checksum trailer included.
fn encode_config(doc: &Document) -> Vec<u8> {
    let mut out = Writer::new();
    out.write_magic(&CONFIG_MAGIC);
    out.write_u32(doc.header.format_version);
    out.write_u64(doc.header.blueprint_id);
    out.write_string(&doc.config.description);
    out.write_u32(doc.config.icon_id);
    out.write_u8(doc.config.category.to_u8());

    let mut bytes = out.into_bytes();
    let checksum = xxhash_rust::xxh32::xxh32(&bytes, XXHASH_SEED);
    bytes.extend_from_slice(&checksum.to_le_bytes());
    bytes
}

/// Lazy producer of main-file body chunks, ending with the checksum trailer.
pub struct BodyChunks<'a> {
    inner: ChunksInner<'a>,
}

enum ChunksInner<'a> {
    /// Uncompressed: batch records up to `CHUNK_TARGET`, hash as we go.
    Streaming {
        objects: &'a [PlacedObject],
        next: usize,
        hasher: Xxh32,
        trailer_sent: bool,
    },
    /// Compressed: body and trailer were materialized up front.
    Buffered { queue: std::vec::IntoIter<Vec<u8>> },
}

impl<'a> BodyChunks<'a> {
    fn streaming(objects: &'a [PlacedObject]) -> Self {
        Self {
            inner: ChunksInner::Streaming {
                objects,
                next: 0,
                hasher: Xxh32::new(XXHASH_SEED),
                trailer_sent: false,
            },
        }
    }

    fn buffered(objects: &'a [PlacedObject]) -> Self {
        let mut raw = Writer::new();
        for object in objects {
            encode_record(&mut raw, object);
        }
        let raw = raw.into_bytes();
        let checksum = xxhash_rust::xxh32::xxh32(&raw, XXHASH_SEED);
        let compressed = lz4_flex::compress_prepend_size(&raw);
        Self {
            inner: ChunksInner::Buffered {
                queue: vec![compressed, checksum.to_le_bytes().to_vec()].into_iter(),
            },
        }
    }
}

impl Iterator for BodyChunks<'_> {
    type Item = Vec<u8>;

    fn next(&mut self) -> Option<Vec<u8>> {
        match &mut self.inner {
            ChunksInner::Streaming {
                objects,
                next,
                hasher,
                trailer_sent,
            } => {
                if *next < objects.len() {
                    let mut chunk = Writer::with_capacity(CHUNK_TARGET);
                    while *next < objects.len() && chunk.len() < CHUNK_TARGET {
                        encode_record(&mut chunk, &objects[*next]);
                        *next += 1;
                    }
                    let chunk = chunk.into_bytes();
                    hasher.update(&chunk);
                    Some(chunk)
                } else if !*trailer_sent {
                    *trailer_sent = true;
                    Some(hasher.digest().to_le_bytes().to_vec())
                } else {
                    None
                }
            }
            ChunksInner::Buffered { queue } => queue.next(),
        }
    }
}
