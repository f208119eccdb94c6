//! Canonical digest computation.
//!
//! The digest covers exactly `{id, descriptor, initiator, params,
//! created_at, completed_at, verifications: [{verifier, timestamp,
//! approved}]}` in that order. Field inclusion and order are part of the
//! external contract; do not reorder. Variable-length fields are length-
//! prefixed (u32 big-endian) so adjacent fields can never alias, and params
//! are visited in key order (the bag is a `BTreeMap`, so iteration order is
//! already the canonical one).

use acta_types::{ActionRecord, ContentDigest, ParamValue};
use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};

type Blake2b256 = Blake2b<U32>;

fn put_bytes(hasher: &mut Blake2b256, bytes: &[u8]) {
    hasher.update((bytes.len() as u32).to_be_bytes());
    hasher.update(bytes);
}

fn put_str(hasher: &mut Blake2b256, s: &str) {
    put_bytes(hasher, s.as_bytes());
}

fn put_param(hasher: &mut Blake2b256, value: &ParamValue) {
    match value {
        ParamValue::Int(v) => {
            hasher.update([0u8]);
            hasher.update(v.to_be_bytes());
        }
        ParamValue::Decimal(v) => {
            hasher.update([1u8]);
            hasher.update(v.to_be_bytes());
        }
        ParamValue::Text(s) => {
            hasher.update([2u8]);
            put_str(hasher, s);
        }
        ParamValue::Flag(b) => {
            hasher.update([3u8, u8::from(*b)]);
        }
    }
}

/// Compute the canonical 256-bit digest of a finalized action record.
pub fn canonical_digest(record: &ActionRecord) -> ContentDigest {
    let mut hasher = Blake2b256::new();

    hasher.update(record.request.id.as_bytes());
    put_str(&mut hasher, record.request.descriptor.as_str());
    put_str(&mut hasher, record.request.initiator.as_str());

    hasher.update((record.request.params.len() as u32).to_be_bytes());
    for (key, value) in &record.request.params {
        put_str(&mut hasher, key);
        put_param(&mut hasher, value);
    }

    hasher.update(record.request.metadata.created_at.as_secs().to_be_bytes());
    match record.completed_at {
        Some(ts) => {
            hasher.update([1u8]);
            hasher.update(ts.as_secs().to_be_bytes());
        }
        None => hasher.update([0u8]),
    }

    hasher.update((record.verifications.len() as u32).to_be_bytes());
    for verification in &record.verifications {
        put_str(&mut hasher, verification.verifier.as_str());
        hasher.update(verification.timestamp.as_secs().to_be_bytes());
        hasher.update([u8::from(verification.approved)]);
    }

    let mut out = [0u8; 32];
    out.copy_from_slice(&hasher.finalize());
    ContentDigest::new(out)
}
