//! §3.2 IdempotencyFingerprint.

use super::request::{Coordinate, SearchRequest};
use sha2::{Digest, Sha256};
use std::fmt;

/// Deterministic fingerprint of the semantically-significant request fields:
/// normalized query text, rounded user coordinate, region, session id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdempotencyFingerprint(String);

impl IdempotencyFingerprint {
    pub fn compute(req: &SearchRequest) -> Self {
        let normalized_query = normalize_query(&req.query);
        let rounded_coord = req.user_location.map(round_coord);
        let mut hasher = Sha256::new();
        hasher.update(normalized_query.as_bytes());
        hasher.update(b"|");
        match rounded_coord {
            Some((lat, lng)) => hasher.update(format!("{lat:.4},{lng:.4}").as_bytes()),
            None => hasher.update(b"none"),
        }
        hasher.update(b"|");
        hasher.update(req.region_code.to_ascii_uppercase().as_bytes());
        hasher.update(b"|");
        hasher.update(req.session_id.as_bytes());
        let digest = hasher.finalize();
        Self(hex::encode(digest))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdempotencyFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lowercase, collapse internal whitespace, trim. Stable regardless of
/// stray whitespace or casing differences between otherwise-equal queries.
fn normalize_query(q: &str) -> String {
    q.trim().to_lowercase().split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Round to 4 decimal places (~11m precision) so GPS jitter between two
/// submits from the same physical spot still maps to the same fingerprint.
fn round_coord(c: Coordinate) -> (f64, f64) {
    let scale = 10_000.0;
    ((c.lat * scale).round() / scale, (c.lng * scale).round() / scale)
}

/// Tiny hex encoder kept local to avoid pulling in a dedicated crate for
/// one call site; sha2's digest output is always a fixed-size byte slice.
mod hex {
    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        bytes.as_ref().iter().map(|b| format!("{b:02x}")).collect()
    }
}
