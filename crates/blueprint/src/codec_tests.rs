// ---------------------------------------------------------------------------
// codec_tests – cross-module properties of the blueprint codec
// ---------------------------------------------------------------------------
//
// Round-trips (Document -> bytes -> Document and bytes -> Document -> bytes),
// forward compatibility for unknown record types, truncation behavior,
// determinism, and JSON interchange. Malformed-input tests hand-craft files
// with the cursor Writer so every rejected byte pattern is explicit.

use crate::cursor::Writer;
use crate::decode::decode_blueprint;
use crate::document::{
    BlueprintConfig, Category, Document, Payload, PlacedObject, Transform, CURRENT_FORMAT_VERSION,
    TYPE_BEAM,
};
use crate::encode::encode_blueprint;
use crate::error::BlueprintError;
use crate::migrate::migrate_document;
use xxhash_rust::xxh32::xxh32;

// -----------------------------------------------------------------------
// Helpers
// -----------------------------------------------------------------------

fn object(payload: Payload) -> PlacedObject {
    PlacedObject {
        transform: Transform {
            position: [1.0, 2.0, 3.0],
            rotation: [0.0, 0.0, 0.0, 1.0],
        },
        payload,
    }
}

fn mixed_doc() -> Document {
    let objects = vec![
        object(Payload::Beam { length: 12.5 }),
        object(Payload::Foundation {
            size_x: 8.0,
            size_y: 8.0,
        }),
        object(Payload::Wall {
            width: 8.0,
            height: 4.0,
        }),
        object(Payload::Sign {
            text: "smelting column 3".to_string(),
        }),
        object(Payload::Unknown {
            type_id: 777,
            bytes: vec![0xDE, 0xAD, 0xBE, 0xEF, 0x01],
        }),
    ];
    let config = BlueprintConfig {
        description: "test layout".to_string(),
        icon_id: 42,
        category: Category::Logistics,
    };
    Document::new("mixed", 0x1122_3344_5566_7788, [10, 6, 4], objects, config)
}

fn encode_pair(doc: &Document) -> (Vec<u8>, Vec<u8>) {
    let encoded = encode_blueprint(doc).expect("encode should succeed");
    let config = encoded.config.clone();
    (encoded.into_main_bytes(), config)
}

/// Hand-build a minimal valid v2 pair with one beam record.
fn handmade_v2_pair(blueprint_id: u64) -> (Vec<u8>, Vec<u8>) {
    let mut body = Writer::new();
    body.write_u32(TYPE_BEAM);
    for v in [1.0f32, 2.0, 3.0, 0.0, 0.0, 0.0, 1.0] {
        body.write_f32(v);
    }
    body.write_u32(4);
    body.write_f32(9.5);
    let body = body.into_bytes();

    let mut main = Writer::new();
    main.write_magic(b"FBPR");
    main.write_u32(2);
    main.write_u64(blueprint_id);
    main.write_u32(0); // flags
    main.write_u32(1); // object count
    main.write_u32(3); // footprint
    main.write_u32(1);
    main.write_u32(1);
    main.write_bytes(&body);
    main.write_u32(xxh32(&body, 0));

    let mut config = Writer::new();
    config.write_magic(b"FBPC");
    config.write_u32(2);
    config.write_u64(blueprint_id);
    config.write_string("a beam");
    config.write_u32(7); // icon
    config.write_u8(2); // Power
    let mut config = config.into_bytes();
    let checksum = xxh32(&config, 0);
    config.extend_from_slice(&checksum.to_le_bytes());

    (main.into_bytes(), config)
}

/// Hand-build a v1 pair (no footprint in the header, no description in the
/// config file).
fn handmade_v1_pair(blueprint_id: u64) -> (Vec<u8>, Vec<u8>) {
    let mut main = Writer::new();
    main.write_magic(b"FBPR");
    main.write_u32(1);
    main.write_u64(blueprint_id);
    main.write_u32(0); // flags
    main.write_u32(0); // object count
    main.write_u32(xxh32(&[], 0)); // checksum of the empty body

    let mut config = Writer::new();
    config.write_magic(b"FBPC");
    config.write_u32(1);
    config.write_u64(blueprint_id);
    config.write_u32(3); // icon
    config.write_u8(0); // Production
    let mut config = config.into_bytes();
    let checksum = xxh32(&config, 0);
    config.extend_from_slice(&checksum.to_le_bytes());

    (main.into_bytes(), config)
}

// -----------------------------------------------------------------------
// Round-trips
// -----------------------------------------------------------------------

#[test]
fn test_document_roundtrip_mixed_payloads() {
    let doc = mixed_doc();
    let (main, config) = encode_pair(&doc);
    let decoded = decode_blueprint(&main, &config, "mixed").unwrap();
    assert_eq!(decoded, doc);
}

#[test]
fn test_document_roundtrip_compressed() {
    let mut doc = mixed_doc();
    doc.header.compressed = true;
    let (main, config) = encode_pair(&doc);
    let decoded = decode_blueprint(&main, &config, "mixed").unwrap();
    assert_eq!(decoded, doc);
}

#[test]
fn test_byte_roundtrip_uncompressed() {
    let doc = mixed_doc();
    let (main, config) = encode_pair(&doc);

    let decoded = decode_blueprint(&main, &config, "mixed").unwrap();
    let (main2, config2) = encode_pair(&decoded);

    assert_eq!(main, main2, "main file must round-trip byte-for-byte");
    assert_eq!(config, config2, "config file must round-trip byte-for-byte");
}

#[test]
fn test_byte_roundtrip_compressed() {
    let mut doc = mixed_doc();
    doc.header.compressed = true;
    let (main, config) = encode_pair(&doc);

    let decoded = decode_blueprint(&main, &config, "mixed").unwrap();
    assert!(decoded.header.compressed);
    let (main2, config2) = encode_pair(&decoded);

    assert_eq!(main, main2);
    assert_eq!(config, config2);
}

#[test]
fn test_handmade_bytes_roundtrip() {
    // Bytes written field-by-field, independent of the encoder, must decode
    // and re-encode to the exact same bytes.
    let (main, config) = handmade_v2_pair(99);
    let decoded = decode_blueprint(&main, &config, "beam").unwrap();
    let (main2, config2) = encode_pair(&decoded);
    assert_eq!(main, main2);
    assert_eq!(config, config2);
}

#[test]
fn test_encoding_is_deterministic() {
    let doc = mixed_doc();
    let (main_a, config_a) = encode_pair(&doc);
    let (main_b, config_b) = encode_pair(&doc);
    assert_eq!(main_a, main_b);
    assert_eq!(config_a, config_b);
}

#[test]
fn test_zero_object_roundtrip() {
    let doc = Document::new("empty", 5, [0; 3], vec![], BlueprintConfig::default());
    let (main, config) = encode_pair(&doc);

    // Header (36 bytes) + empty body + checksum trailer (4 bytes).
    assert_eq!(main.len(), 40);

    let decoded = decode_blueprint(&main, &config, "empty").unwrap();
    assert_eq!(decoded.header.object_count, 0);
    assert!(decoded.objects.is_empty());
    assert_eq!(decoded, doc);
}

#[test]
fn test_transform_precision_is_preserved() {
    let mut doc = mixed_doc();
    doc.objects = vec![PlacedObject {
        transform: Transform {
            position: [std::f32::consts::PI, -1.5e-20, 16_777_215.0],
            rotation: [0.382_683_43, 0.0, -0.923_879_5, 1.192_092_9e-7],
        },
        payload: Payload::Beam { length: 0.1 },
    }];
    doc.header.object_count = 1;

    let (main, config) = encode_pair(&doc);
    let decoded = decode_blueprint(&main, &config, "mixed").unwrap();
    let transform = &decoded.objects[0].transform;
    assert_eq!(transform.position, doc.objects[0].transform.position);
    assert_eq!(transform.rotation, doc.objects[0].transform.rotation);
}

#[test]
fn test_json_roundtrip_is_lossless() {
    let doc = mixed_doc();
    let json = serde_json::to_string(&doc).unwrap();
    let restored: Document = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, doc);

    // And the restored Document still encodes to identical bytes.
    assert_eq!(encode_pair(&restored), encode_pair(&doc));
}

// -----------------------------------------------------------------------
// Forward compatibility
// -----------------------------------------------------------------------

#[test]
fn test_unknown_record_is_skipped_not_fatal() {
    // Unknown type between two known records: both neighbors must decode.
    let objects = vec![
        object(Payload::Beam { length: 1.0 }),
        object(Payload::Unknown {
            type_id: 40_000,
            bytes: vec![9; 33],
        }),
        object(Payload::Wall {
            width: 2.0,
            height: 3.0,
        }),
    ];
    let doc = Document::new("fwd", 1, [0; 3], objects, BlueprintConfig::default());
    let (main, config) = encode_pair(&doc);

    let decoded = decode_blueprint(&main, &config, "fwd").unwrap();
    assert_eq!(decoded.objects.len(), 3);
    assert!(matches!(decoded.objects[0].payload, Payload::Beam { .. }));
    assert!(matches!(decoded.objects[2].payload, Payload::Wall { .. }));
    match &decoded.objects[1].payload {
        Payload::Unknown { type_id, bytes } => {
            assert_eq!(*type_id, 40_000);
            assert_eq!(bytes, &vec![9; 33]);
        }
        other => panic!("expected Unknown, got {other:?}"),
    }

    // Unknown payload bytes survive re-encode verbatim.
    let (main2, _) = encode_pair(&decoded);
    assert_eq!(main, main2);
}

// -----------------------------------------------------------------------
// Corruption and truncation
// -----------------------------------------------------------------------

#[test]
fn test_truncation_is_never_a_silent_wrong_read() {
    let doc = mixed_doc();
    let (main, config) = encode_pair(&doc);

    for cut in 0..main.len() {
        let result = decode_blueprint(&main[..cut], &config, "cut");
        let err = match result {
            Err(e) => e,
            Ok(_) => panic!("truncation to {cut} bytes decoded successfully"),
        };
        assert!(
            matches!(
                err,
                BlueprintError::OutOfBounds { .. } | BlueprintError::CorruptData(_)
            ),
            "truncation to {cut} bytes gave unexpected error: {err:?}"
        );
    }
}

#[test]
fn test_config_truncation_is_rejected() {
    let doc = mixed_doc();
    let (main, config) = encode_pair(&doc);

    for cut in 0..config.len() {
        assert!(
            decode_blueprint(&main, &config[..cut], "cut").is_err(),
            "config truncated to {cut} bytes decoded successfully"
        );
    }
}

#[test]
fn test_flipped_body_byte_is_detected() {
    let doc = mixed_doc();
    let (mut main, config) = encode_pair(&doc);

    // Flip one byte in the middle of the body.
    let mid = 36 + (main.len() - 40) / 2;
    main[mid] ^= 0xFF;

    let err = decode_blueprint(&main, &config, "corrupt").unwrap_err();
    assert!(matches!(err, BlueprintError::CorruptData(_)), "got {err:?}");
    let msg = format!("{err}");
    assert!(msg.contains("checksum"), "got: {msg}");
}

#[test]
fn test_flipped_config_byte_is_detected() {
    let doc = mixed_doc();
    let (main, mut config) = encode_pair(&doc);

    config[10] ^= 0xFF;

    let err = decode_blueprint(&main, &config, "corrupt").unwrap_err();
    assert!(matches!(err, BlueprintError::CorruptData(_)), "got {err:?}");
}

#[test]
fn test_bad_main_magic_is_rejected() {
    let (mut main, config) = handmade_v2_pair(1);
    main[..4].copy_from_slice(b"NOPE");
    let err = decode_blueprint(&main, &config, "x").unwrap_err();
    assert!(matches!(err, BlueprintError::CorruptData(_)), "got {err:?}");
}

#[test]
fn test_bad_config_magic_is_rejected() {
    let (main, config) = handmade_v2_pair(1);
    let mut config = config;
    config[..4].copy_from_slice(b"NOPE");
    // Magic is covered by the config checksum, so re-seal after editing.
    let len = config.len();
    let checksum = xxh32(&config[..len - 4], 0);
    config[len - 4..].copy_from_slice(&checksum.to_le_bytes());

    let err = decode_blueprint(&main, &config, "x").unwrap_err();
    assert!(matches!(err, BlueprintError::CorruptData(_)), "got {err:?}");
}

#[test]
fn test_future_version_is_rejected() {
    let (mut main, config) = handmade_v2_pair(1);
    main[4..8].copy_from_slice(&99u32.to_le_bytes());
    let err = decode_blueprint(&main, &config, "x").unwrap_err();
    match err {
        BlueprintError::UnsupportedVersion {
            expected_max,
            found,
        } => {
            assert_eq!(expected_max, CURRENT_FORMAT_VERSION);
            assert_eq!(found, 99);
        }
        other => panic!("expected UnsupportedVersion, got {other:?}"),
    }
}

#[test]
fn test_version_zero_is_rejected() {
    let (mut main, config) = handmade_v2_pair(1);
    main[4..8].copy_from_slice(&0u32.to_le_bytes());
    let err = decode_blueprint(&main, &config, "x").unwrap_err();
    assert!(
        matches!(err, BlueprintError::UnsupportedVersion { found: 0, .. }),
        "got {err:?}"
    );
}

#[test]
fn test_unknown_flag_bits_are_rejected() {
    let (mut main, config) = handmade_v2_pair(1);
    main[16..20].copy_from_slice(&0b100u32.to_le_bytes());
    let err = decode_blueprint(&main, &config, "x").unwrap_err();
    assert!(matches!(err, BlueprintError::CorruptData(_)), "got {err:?}");
}

#[test]
fn test_unknown_category_byte_is_rejected() {
    let (main, mut config) = handmade_v2_pair(1);
    // Category is the last byte before the checksum; overwrite and re-seal.
    let len = config.len();
    config[len - 5] = 9;
    let checksum = xxh32(&config[..len - 4], 0);
    config[len - 4..].copy_from_slice(&checksum.to_le_bytes());

    let err = decode_blueprint(&main, &config, "x").unwrap_err();
    let msg = format!("{err}");
    assert!(msg.contains("category"), "got: {msg}");
}

#[test]
fn test_identity_mismatch_is_rejected() {
    let (main, _) = handmade_v2_pair(1);
    let (_, config) = handmade_v2_pair(2);
    let err = decode_blueprint(&main, &config, "x").unwrap_err();
    let msg = format!("{err}");
    assert!(msg.contains("belongs to blueprint"), "got: {msg}");
}

#[test]
fn test_known_type_with_oversized_payload_is_rejected() {
    // A beam record declaring 8 payload bytes: the field reads 4, the other
    // 4 must not be silently skipped.
    let mut body = Writer::new();
    body.write_u32(TYPE_BEAM);
    for v in [0.0f32; 7] {
        body.write_f32(v);
    }
    body.write_u32(8);
    body.write_f32(9.5);
    body.write_f32(1.0);
    let body = body.into_bytes();

    let mut main = Writer::new();
    main.write_magic(b"FBPR");
    main.write_u32(2);
    main.write_u64(1);
    main.write_u32(0);
    main.write_u32(1);
    main.write_u32(0);
    main.write_u32(0);
    main.write_u32(0);
    main.write_bytes(&body);
    main.write_u32(xxh32(&body, 0));

    let (_, config) = handmade_v2_pair(1);
    let err = decode_blueprint(&main.into_bytes(), &config, "x").unwrap_err();
    let msg = format!("{err}");
    assert!(msg.contains("record 0"), "got: {msg}");
}

#[test]
fn test_record_length_beyond_body_is_rejected() {
    // One record whose declared payload length runs past the body end.
    let mut body = Writer::new();
    body.write_u32(TYPE_BEAM);
    for v in [0.0f32; 7] {
        body.write_f32(v);
    }
    body.write_u32(1000);
    body.write_f32(9.5);
    let body = body.into_bytes();

    let mut main = Writer::new();
    main.write_magic(b"FBPR");
    main.write_u32(2);
    main.write_u64(1);
    main.write_u32(0);
    main.write_u32(1);
    main.write_u32(0);
    main.write_u32(0);
    main.write_u32(0);
    main.write_bytes(&body);
    main.write_u32(xxh32(&body, 0));

    let (_, config) = handmade_v2_pair(1);
    let err = decode_blueprint(&main.into_bytes(), &config, "x").unwrap_err();
    let msg = format!("{err}");
    assert!(msg.contains("declares 1000 bytes"), "got: {msg}");
}

// -----------------------------------------------------------------------
// Older versions
// -----------------------------------------------------------------------

#[test]
fn test_v1_pair_decodes_with_defaults_and_migrates() {
    let (main, config) = handmade_v1_pair(77);
    let mut doc = decode_blueprint(&main, &config, "legacy").unwrap();

    assert_eq!(doc.header.format_version, 1);
    assert_eq!(doc.header.footprint, [0, 0, 0]);
    assert_eq!(doc.config.description, "");
    assert_eq!(doc.config.icon_id, 3);
    assert_eq!(doc.config.category, Category::Production);

    let original = migrate_document(&mut doc).unwrap();
    assert_eq!(original, 1);
    assert_eq!(doc.header.format_version, CURRENT_FORMAT_VERSION);

    // A migrated Document encodes as a current-version pair.
    let (main2, config2) = encode_pair(&doc);
    let reloaded = decode_blueprint(&main2, &config2, "legacy").unwrap();
    assert_eq!(reloaded, doc);
}
