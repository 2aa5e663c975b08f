// arc2zen mozLz4 codec
// Reads and writes the `mozLz40\0` container used by the destination browser's
// session files: 8-byte magic, little-endian u32 decompressed length, raw LZ4 block.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::types::errors::CodecError;

pub const MAGIC: &[u8; 8] = b"mozLz40\0";
const HEADER_LEN: usize = MAGIC.len() + 4;

/// Upper bound on the LZ4 block expansion ratio.
const MAX_RATIO: usize = 255;

/// Wraps `payload` in a `mozLz40` container.
///
/// Deterministic: equal payloads always produce equal bytes.
pub fn encode(payload: &[u8]) -> Result<Vec<u8>, CodecError> {
    let declared =
        u32::try_from(payload.len()).map_err(|_| CodecError::PayloadTooLarge(payload.len()))?;
    let block = lz4_flex::block::compress(payload);

    let mut out = Vec::with_capacity(HEADER_LEN + block.len());
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&declared.to_le_bytes());
    out.extend_from_slice(&block);
    Ok(out)
}

/// Unwraps a `mozLz40` container and returns the original payload.
///
/// Fails closed: any header or length disagreement is an error, never a
/// partial payload.
pub fn decode(bytes: &[u8]) -> Result<Vec<u8>, CodecError> {
    if bytes.len() < MAGIC.len() || &bytes[..MAGIC.len()] != MAGIC {
        return Err(CodecError::BadMagic);
    }
    if bytes.len() < HEADER_LEN {
        return Err(CodecError::Truncated(bytes.len()));
    }

    let mut length = [0u8; 4];
    length.copy_from_slice(&bytes[MAGIC.len()..HEADER_LEN]);
    let declared = u32::from_le_bytes(length) as usize;
    let block = &bytes[HEADER_LEN..];

    // A block cannot expand past the LZ4 ratio; refuse before allocating.
    if declared > block.len().saturating_mul(MAX_RATIO).saturating_add(16) {
        return Err(CodecError::LengthMismatch {
            declared,
            actual: 0,
        });
    }

    let payload = lz4_flex::block::decompress(block, declared).map_err(|e| match e {
        lz4_flex::block::DecompressError::OutputTooSmall { expected, .. } => {
            CodecError::LengthMismatch {
                declared,
                actual: expected,
            }
        }
        other => CodecError::Decompress(other.to_string()),
    })?;

    if payload.len() != declared {
        return Err(CodecError::LengthMismatch {
            declared,
            actual: payload.len(),
        });
    }
    Ok(payload)
}

/// Serializes `value` as compact JSON and encodes it.
pub fn encode_json<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
    let json = serde_json::to_vec(value)?;
    encode(&json)
}

pub fn decode_json<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    let payload = decode(bytes)?;
    Ok(serde_json::from_slice(&payload)?)
}

pub fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<T, CodecError> {
    let bytes = fs::read(path)?;
    decode_json(&bytes)
}

/// Encodes `value` and replaces `path` through a temporary sibling file.
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<(), CodecError> {
    let bytes = encode_json(value)?;
    let tmp = path.with_extension("jsonlz4.tmp");
    fs::write(&tmp, &bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
