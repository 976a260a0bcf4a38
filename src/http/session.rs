//! Session identification. Full authentication (verifying the bearer/cookie
//! that produces a session) is an external collaborator (spec.md §1); this
//! crate only derives the stable `sessionHash` used for ownership binding
//! once a session id is established upstream.

use axum::http::HeaderMap;
use sha2::{Digest, Sha256};

const SESSION_HEADER: &str = "x-session-id";

pub fn session_id_from_headers(headers: &HeaderMap) -> Option<String> {
    headers.get(SESSION_HEADER)?.to_str().ok().map(str::to_string)
}

/// Stable, non-reversible binding for `ownerSessionHash`/`sessionHash`
/// (spec.md §3.3, §3.9) — never the raw session id.
pub fn hash_session_id(session_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(session_id.as_bytes());
    format!("{:x}", hasher.finalize())
}
