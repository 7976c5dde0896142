use std::fs;
use std::io::Cursor;
use std::path::Path;

use bincode::ErrorKind;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::catalog::catalog::BodyCatalog;
use crate::CoordinateSet;

/// Compression level for bundles. They are written once by the offline
/// builder and read many times, so the slow, small end of zstd is used.
const BUNDLE_COMPRESSION_LEVEL: i32 = 19;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialize(#[from] Box<ErrorKind>),
    #[error("Compression error: {0}")]
    Compression(#[source] std::io::Error),
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, DataError> {
    let encoded = bincode::serialize(value)?;
    let mut cursor = Cursor::new(encoded);
    zstd::stream::encode_all(&mut cursor, BUNDLE_COMPRESSION_LEVEL).map_err(DataError::Compression)
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, DataError> {
    let mut cursor = Cursor::new(bytes);
    let decoded = zstd::stream::decode_all(&mut cursor).map_err(DataError::Compression)?;
    Ok(bincode::deserialize(&decoded)?)
}

pub fn serialize_coordinate_set(set: &CoordinateSet) -> Result<Vec<u8>, DataError> {
    encode(set)
}

pub fn deserialize_coordinate_set(bytes: &[u8]) -> Result<CoordinateSet, DataError> {
    decode(bytes)
}

pub fn serialize_catalog(catalog: &BodyCatalog) -> Result<Vec<u8>, DataError> {
    encode(catalog)
}

pub fn deserialize_catalog(bytes: &[u8]) -> Result<BodyCatalog, DataError> {
    let mut catalog: BodyCatalog = decode(bytes)?;
    catalog.rebuild_indices();
    Ok(catalog)
}

pub fn write_coordinate_set_to_file<P: AsRef<Path>>(set: &CoordinateSet, path: P) -> Result<(), DataError> {
    let bytes = serialize_coordinate_set(set)?;
    fs::write(path, bytes)?;
    Ok(())
}

pub fn read_coordinate_set_from_file<P: AsRef<Path>>(path: P) -> Result<CoordinateSet, DataError> {
    let bytes = fs::read(path)?;
    deserialize_coordinate_set(&bytes)
}
