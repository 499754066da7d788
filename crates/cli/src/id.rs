// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

/// Generate a record ID from scope, payload, and timestamp.
/// Format: {scope}-{hash} where hash is first 8 hex chars of SHA256(payload + timestamp)
pub fn generate_id(scope: &str, payload: &serde_json::Value, created_at: &DateTime<Utc>) -> String {
    let input = format!("{}{}", payload, created_at.to_rfc3339());
    let hash = Sha256::digest(input.as_bytes());
    let short_hash = hex::encode(&hash[..4]);
    format!("{}-{}", scope, short_hash)
}

/// Generate a unique ID, handling collisions by appending incrementing suffix.
pub fn generate_unique_id<F>(
    scope: &str,
    payload: &serde_json::Value,
    created_at: &DateTime<Utc>,
    exists: F,
) -> String
where
    F: Fn(&str) -> bool,
{
    let base_id = generate_id(scope, payload, created_at);

    if !exists(&base_id) {
        return base_id;
    }

    let mut suffix = 2;
    loop {
        let id = format!("{}-{}", base_id, suffix);
        if !exists(&id) {
            return id;
        }
        suffix += 1;
    }
}

/// Validate that a scope is usable as an ID prefix
/// (lowercase alphanumeric, `-` or `_`, starting with a letter).
pub fn validate_scope(scope: &str) -> bool {
    scope.chars().next().is_some_and(|c| c.is_ascii_lowercase())
        && scope
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
