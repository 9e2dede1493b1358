//! Canonical CBOR encoding for deterministic serialization.
//!
//! This module implements RFC 8949 Core Deterministic Encoding:
//! - Map keys sorted by encoded byte comparison
//! - Integers use smallest valid encoding
//! - Definite lengths only
//! - No floats
//!
//! The canonical encoding is critical: it guarantees that byte-identical
//! content always produces identical bytes (and thus an identical
//! fingerprint) across platforms and process restarts. The encoding covers
//! exactly the three fingerprinted fields of a version: content blocks,
//! source log, and risk flags. No timestamps, no identifiers.

use ciborium::value::Value;

use crate::content::{ContentBlock, RiskFlag, SourceEntry};

/// Field keys of the top-level content map (integer keys for compact
/// encoding; keys 0-23 encode as single bytes in CBOR).
mod keys {
    pub const CONTENT_BLOCKS: u64 = 0;
    pub const SOURCE_LOG: u64 = 1;
    pub const RISK_FLAGS: u64 = 2;
}

mod block_keys {
    pub const KIND: u64 = 0;
    pub const CONTENT: u64 = 1;
    pub const METADATA: u64 = 2;
}

mod source_keys {
    pub const SOURCE: u64 = 0;
    pub const VERIFIED: u64 = 1;
    pub const NOTES: u64 = 2;
}

mod flag_keys {
    pub const TYPE: u64 = 0;
    pub const DESCRIPTION: u64 = 1;
    pub const SEVERITY: u64 = 2;
}

/// Encode the fingerprinted content of a version to canonical bytes.
pub fn canonical_content_bytes(
    content_blocks: &[ContentBlock],
    source_log: &[SourceEntry],
    risk_flags: &[RiskFlag],
) -> Vec<u8> {
    let value = content_to_cbor_value(content_blocks, source_log, risk_flags);
    let mut buf = Vec::new();
    encode_value_to(&mut buf, &value);
    buf
}

fn content_to_cbor_value(
    content_blocks: &[ContentBlock],
    source_log: &[SourceEntry],
    risk_flags: &[RiskFlag],
) -> Value {
    let blocks: Vec<Value> = content_blocks.iter().map(block_to_cbor_value).collect();
    let sources: Vec<Value> = source_log.iter().map(source_to_cbor_value).collect();
    let flags: Vec<Value> = risk_flags.iter().map(flag_to_cbor_value).collect();

    Value::Map(vec![
        (Value::Integer(keys::CONTENT_BLOCKS.into()), Value::Array(blocks)),
        (Value::Integer(keys::SOURCE_LOG.into()), Value::Array(sources)),
        (Value::Integer(keys::RISK_FLAGS.into()), Value::Array(flags)),
    ])
}

fn block_to_cbor_value(block: &ContentBlock) -> Value {
    // Metadata is a text-keyed map; canonical sorting happens at encode time.
    let metadata: Vec<(Value, Value)> = block
        .metadata
        .iter()
        .map(|(k, v)| (Value::Text(k.clone()), Value::Text(v.clone())))
        .collect();

    Value::Map(vec![
        (
            Value::Integer(block_keys::KIND.into()),
            Value::Integer(u64::from(block.kind.to_u8()).into()),
        ),
        (
            Value::Integer(block_keys::CONTENT.into()),
            Value::Text(block.content.clone()),
        ),
        (Value::Integer(block_keys::METADATA.into()), Value::Map(metadata)),
    ])
}

fn source_to_cbor_value(entry: &SourceEntry) -> Value {
    Value::Map(vec![
        (
            Value::Integer(source_keys::SOURCE.into()),
            Value::Text(entry.source.clone()),
        ),
        (
            Value::Integer(source_keys::VERIFIED.into()),
            Value::Bool(entry.verified),
        ),
        (
            Value::Integer(source_keys::NOTES.into()),
            Value::Text(entry.notes.clone()),
        ),
    ])
}

fn flag_to_cbor_value(flag: &RiskFlag) -> Value {
    Value::Map(vec![
        (
            Value::Integer(flag_keys::TYPE.into()),
            Value::Text(flag.flag_type.as_str().to_string()),
        ),
        (
            Value::Integer(flag_keys::DESCRIPTION.into()),
            Value::Text(flag.description.clone()),
        ),
        (
            Value::Integer(flag_keys::SEVERITY.into()),
            Value::Integer(u64::from(flag.severity.to_u8()).into()),
        ),
    ])
}

/// Recursively encode a CBOR value.
fn encode_value_to(buf: &mut Vec<u8>, value: &Value) {
    match value {
        Value::Integer(i) => {
            encode_integer(buf, *i);
        }
        Value::Bytes(b) => {
            encode_uint(buf, 2, b.len() as u64);
            buf.extend_from_slice(b);
        }
        Value::Text(s) => {
            encode_uint(buf, 3, s.len() as u64);
            buf.extend_from_slice(s.as_bytes());
        }
        Value::Array(arr) => {
            encode_uint(buf, 4, arr.len() as u64);
            for item in arr {
                encode_value_to(buf, item);
            }
        }
        Value::Map(entries) => {
            encode_map_canonical(buf, entries);
        }
        Value::Bool(b) => {
            buf.push(if *b { 0xf5 } else { 0xf4 });
        }
        Value::Null => {
            buf.push(0xf6);
        }
        Value::Float(_) => {
            unreachable!("floats never appear in fingerprinted content");
        }
        _ => {
            unreachable!("unsupported CBOR value type");
        }
    }
}

/// Encode a CBOR integer (major types 0 and 1).
fn encode_integer(buf: &mut Vec<u8>, i: ciborium::value::Integer) {
    let n: i128 = i.into();

    if n >= 0 {
        encode_uint(buf, 0, n as u64);
    } else {
        // CBOR encodes -1 as 0, -2 as 1, etc.
        let abs = (-1 - n) as u64;
        encode_uint(buf, 1, abs);
    }
}

/// Encode an unsigned integer with the given major type, smallest width.
fn encode_uint(buf: &mut Vec<u8>, major: u8, n: u64) {
    let mt = major << 5;
    if n < 24 {
        buf.push(mt | (n as u8));
    } else if n <= 0xff {
        buf.push(mt | 24);
        buf.push(n as u8);
    } else if n <= 0xffff {
        buf.push(mt | 25);
        buf.extend_from_slice(&(n as u16).to_be_bytes());
    } else if n <= 0xffffffff {
        buf.push(mt | 26);
        buf.extend_from_slice(&(n as u32).to_be_bytes());
    } else {
        buf.push(mt | 27);
        buf.extend_from_slice(&n.to_be_bytes());
    }
}

/// Encode a map canonically (major type 5).
///
/// Keys are sorted by their encoded byte comparison.
fn encode_map_canonical(buf: &mut Vec<u8>, entries: &[(Value, Value)]) {
    let mut key_value_pairs: Vec<(Vec<u8>, &Value)> = entries
        .iter()
        .map(|(k, v)| {
            let mut key_buf = Vec::new();
            encode_value_to(&mut key_buf, k);
            (key_buf, v)
        })
        .collect();

    key_value_pairs.sort_by(|a, b| a.0.cmp(&b.0));

    encode_uint(buf, 5, key_value_pairs.len() as u64);

    for (key_bytes, value) in key_value_pairs {
        buf.extend_from_slice(&key_bytes);
        encode_value_to(buf, value);
    }
}
