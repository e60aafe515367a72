//! Codec for factory-builder blueprint file pairs.
//!
//! A blueprint lives on disk as two files: the main file (header plus
//! placed-object records plus checksum) and a companion config file
//! (description, icon, category). This crate decodes the pair into a
//! [`Document`], re-encodes Documents byte-exactly, and migrates older
//! format versions forward. See `pair` for the file-level entry points and
//! `decode`/`encode` for the buffer-level codec.

mod atomic_write;
pub mod cursor;
pub mod decode;
pub mod document;
pub mod encode;
pub mod error;
pub mod migrate;
pub mod pair;

#[cfg(test)]
mod codec_tests;

pub use decode::decode_blueprint;
pub use document::{
    BlueprintConfig, BlueprintHeader, Category, Document, Payload, PlacedObject, Transform,
    CURRENT_FORMAT_VERSION, MIN_FORMAT_VERSION,
};
pub use encode::{encode_blueprint, BodyChunks, EncodedBlueprint};
pub use error::BlueprintError;
pub use migrate::{migrate_document, migrate_document_with_report, MigrationReport};
pub use pair::{read_pair, write_pair};
