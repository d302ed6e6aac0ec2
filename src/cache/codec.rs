//! Byte representation of cached products.
//!
//! Payloads are JSON wrapped in a versioned envelope, `{"v":1,"data":...}`.
//! Anything that does not decode under the current version is reported as
//! [`CacheError::Decode`] and callers fall back to the store.

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::backend::CacheError;
use crate::domain::entities::ProductRecord;

pub const CODEC_VERSION: u32 = 1;

#[derive(Serialize)]
struct EnvelopeRef<'a, T> {
    v: u32,
    data: &'a T,
}

#[derive(Deserialize)]
struct Envelope<T> {
    v: u32,
    data: T,
}

pub fn encode_record(record: &ProductRecord) -> Result<Bytes, CacheError> {
    encode(record)
}

pub fn decode_record(payload: &[u8]) -> Result<ProductRecord, CacheError> {
    decode(payload)
}

pub fn encode_collection(records: &[ProductRecord]) -> Result<Bytes, CacheError> {
    encode(&records)
}

pub fn decode_collection(payload: &[u8]) -> Result<Vec<ProductRecord>, CacheError> {
    decode(payload)
}

fn encode<T: Serialize>(data: &T) -> Result<Bytes, CacheError> {
    let envelope = EnvelopeRef {
        v: CODEC_VERSION,
        data,
    };
    serde_json::to_vec(&envelope)
        .map(Bytes::from)
        .map_err(|err| CacheError::Encode(err.to_string()))
}

fn decode<T: DeserializeOwned>(payload: &[u8]) -> Result<T, CacheError> {
    let envelope: Envelope<T> =
        serde_json::from_slice(payload).map_err(|err| CacheError::Decode(err.to_string()))?;
    if envelope.v != CODEC_VERSION {
        return Err(CacheError::Decode(format!(
            "unsupported payload version {} (expected {CODEC_VERSION})",
            envelope.v
        )));
    }
    Ok(envelope.data)
}
