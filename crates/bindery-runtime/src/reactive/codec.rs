#![forbid(unsafe_code)]

//! Wire encodings.
//!
//! - `serBody`: base64(zlib(JSON of [`PortableBody`])).
//! - Opaque literal: base64(JSON of the tagged [`Value`]).
//!
//! # Failure Modes
//!
//! - Corrupt base64 or zlib input: [`CodecError::Base64`] / [`CodecError::Io`].
//! - Well-formed bytes of the wrong shape: [`CodecError::Json`].
//! - NaN or infinite floats have no JSON form and are refused on encode with
//!   [`CodecError::NonFinite`] rather than written as `null`.
//! - A compression level above 9: [`CodecError::Level`].

use std::fmt;
use std::io::{Read, Write};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bindery_core::Value;
use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;

use super::portability::PortableBody;

#[derive(Debug)]
pub enum CodecError {
    Base64(base64::DecodeError),
    Io(std::io::Error),
    Json(serde_json::Error),
    NonFinite(f64),
    Level(u32),
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Base64(e) => write!(f, "base64: {e}"),
            Self::Io(e) => write!(f, "zlib: {e}"),
            Self::Json(e) => write!(f, "json: {e}"),
            Self::NonFinite(x) => write!(f, "float {x} has no portable encoding"),
            Self::Level(level) => write!(f, "compression level {level} is outside 0..=9"),
        }
    }
}

impl std::error::Error for CodecError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Base64(e) => Some(e),
            Self::Io(e) => Some(e),
            Self::Json(e) => Some(e),
            Self::NonFinite(_) | Self::Level(_) => None,
        }
    }
}

impl From<base64::DecodeError> for CodecError {
    fn from(e: base64::DecodeError) -> Self {
        Self::Base64(e)
    }
}

impl From<std::io::Error> for CodecError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for CodecError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

pub fn encode_body(body: &PortableBody, level: u32) -> Result<String, CodecError> {
    if level > 9 {
        return Err(CodecError::Level(level));
    }
    let json = serde_json::to_vec(body)?;
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::new(level));
    encoder.write_all(&json)?;
    let compressed = encoder.finish()?;
    Ok(STANDARD.encode(compressed))
}

pub fn decode_body(encoded: &str) -> Result<PortableBody, CodecError> {
    let compressed = STANDARD.decode(encoded)?;
    let mut json = Vec::new();
    ZlibDecoder::new(compressed.as_slice()).read_to_end(&mut json)?;
    Ok(serde_json::from_slice(&json)?)
}

pub fn encode_literal(value: &Value) -> Result<String, CodecError> {
    ensure_finite(value)?;
    Ok(STANDARD.encode(serde_json::to_vec(value)?))
}

/// Fail on the first NaN or infinite float anywhere inside `value`.
pub fn ensure_finite(value: &Value) -> Result<(), CodecError> {
    match value {
        Value::Float(x) if !x.is_finite() => Err(CodecError::NonFinite(*x)),
        Value::List(items) => items.iter().try_for_each(ensure_finite),
        Value::Map(entries) => entries.values().try_for_each(ensure_finite),
        Value::Table(table) => table.rows().iter().flatten().try_for_each(ensure_finite),
        _ => Ok(()),
    }
}

pub fn decode_literal(encoded: &str) -> Result<Value, CodecError> {
    let bytes = STANDARD.decode(encoded)?;
    Ok(serde_json::from_slice(&bytes)?)
}
