// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::*;
use chrono::TimeZone;
use serde_json::json;
use yare::parameterized;

#[test]
fn test_generate_id() {
    let created_at = Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap();
    let id = generate_id("notes", &json!({"title": "groceries"}), &created_at);
    assert!(id.starts_with("notes-"));
    assert_eq!(id.len(), "notes-".len() + 8);
}

#[test]
fn test_generate_id_is_deterministic() {
    let created_at = Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap();
    let payload = json!({"title": "groceries"});
    assert_eq!(
        generate_id("notes", &payload, &created_at),
        generate_id("notes", &payload, &created_at)
    );
}

#[test]
fn test_generate_id_varies_with_payload() {
    let created_at = Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap();
    assert_ne!(
        generate_id("notes", &json!({"n": 1}), &created_at),
        generate_id("notes", &json!({"n": 2}), &created_at)
    );
}

#[test]
fn test_generate_unique_id_no_collision() {
    let created_at = Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap();
    let payload = json!({"n": 1});
    let base_id = generate_id("notes", &payload, &created_at);
    assert_eq!(
        generate_unique_id("notes", &payload, &created_at, |_| false),
        base_id
    );
}

#[test]
fn test_generate_unique_id_with_collision() {
    let created_at = Utc::now();
    let payload = json!({"n": 1});
    let base_id = generate_id("notes", &payload, &created_at);
    let taken = [base_id.clone(), format!("{base_id}-2")];

    let id = generate_unique_id("notes", &payload, &created_at, |id| {
        taken.iter().any(|t| t == id)
    });
    assert_eq!(id, format!("{base_id}-3"));
}

#[parameterized(
    simple = { "notes", true },
    with_digits = { "notes2", true },
    with_dash = { "shopping-list", true },
    with_underscore = { "my_tasks", true },
    empty = { "", false },
    leading_digit = { "2notes", false },
    uppercase = { "Notes", false },
    space = { "my notes", false },
)]
fn test_validate_scope(scope: &str, valid: bool) {
    assert_eq!(validate_scope(scope), valid);
}
