//! Property-based tests for Rollbook
//!
//! Uses proptest for testing invariants and edge cases
//!
//! These tests verify:
//! - Student file save/load round-trips
//! - Roll uniqueness under arbitrary add/delete sequences
//! - Attendance counters never decrease and never cross
//! - Sort orders
//! - Password policy and role token parsing

use proptest::prelude::*;
use rollbook::password::{check_strength, MIN_PASSWORD_LEN};
use rollbook::record::{parse_records, render_records};
use rollbook::{AuditLog, RecordStore, Role, Session, SortKey, StudentRecord};
use std::collections::HashSet;
use strum::IntoEnumIterator;
use tempfile::TempDir;

fn name_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z0-9_]{0,48}"
}

/// Marks with at most two decimals survive the `{:.2}` file format exactly
fn marks_strategy() -> impl Strategy<Value = f64> {
    (-100_000i64..1_000_000).prop_map(|cents| cents as f64 / 100.0)
}

fn record_strategy() -> impl Strategy<Value = StudentRecord> {
    (any::<i32>(), name_strategy(), marks_strategy(), 0u32..500, 0u32..500).prop_map(
        |(roll, name, marks, a, b)| StudentRecord {
            roll,
            name,
            marks,
            present: a.min(b),
            total: a.max(b),
        },
    )
}

fn unique_records() -> impl Strategy<Value = Vec<StudentRecord>> {
    prop::collection::vec(record_strategy(), 0..20).prop_map(|records| {
        let mut seen = HashSet::new();
        records
            .into_iter()
            .filter(|r| seen.insert(r.roll))
            .collect()
    })
}

fn fresh_store(dir: &TempDir) -> RecordStore {
    RecordStore::new(
        dir.path().join("students.txt"),
        AuditLog::new(dir.path().join("admin_log.txt")),
    )
}

fn staff() -> Session {
    Session::new("sam", Role::Staff)
}

// =============================================================================
// Persistence Properties
// =============================================================================

proptest! {
    /// Rendering then parsing the student file is lossless
    #[test]
    fn records_file_roundtrip(records in unique_records()) {
        let parsed = parse_records(&render_records(&records));
        prop_assert_eq!(parsed.truncated_at, None);
        prop_assert_eq!(parsed.records, records);
    }

    /// A store saved to disk loads back identically
    #[test]
    fn store_save_load_roundtrip(records in unique_records()) {
        let dir = TempDir::new().unwrap();
        let mut store = fresh_store(&dir);
        for r in &records {
            store.add(&staff(), r.roll, &r.name, r.marks).unwrap();
        }
        store.save().unwrap();

        let mut reloaded = fresh_store(&dir);
        let report = reloaded.load().unwrap();
        prop_assert_eq!(report.loaded, records.len());
        prop_assert_eq!(reloaded.records(), store.records());
    }
}

// =============================================================================
// Store Invariants
// =============================================================================

#[derive(Debug, Clone)]
enum Op {
    Add(i32),
    Delete(i32),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![(0i32..10).prop_map(Op::Add), (0i32..10).prop_map(Op::Delete)]
}

proptest! {
    /// No sequence of adds and deletes produces two records with one roll
    #[test]
    fn rolls_stay_unique(ops in prop::collection::vec(op_strategy(), 0..40)) {
        let dir = TempDir::new().unwrap();
        let mut store = fresh_store(&dir);
        for op in ops {
            match op {
                Op::Add(roll) => { let _ = store.add(&staff(), roll, "Kid", 50.0); }
                Op::Delete(roll) => { let _ = store.delete(&staff(), roll, true); }
            }
            let mut seen = HashSet::new();
            prop_assert!(store.records().iter().all(|r| seen.insert(r.roll)));
        }
    }

    /// Each class raises every total by one; present never exceeds total
    #[test]
    fn attendance_is_monotonic(
        classes in prop::collection::vec(prop::collection::vec(0i32..8, 0..10), 1..10)
    ) {
        let dir = TempDir::new().unwrap();
        let mut store = fresh_store(&dir);
        for roll in 0..5 {
            store.add(&staff(), roll, "Kid", 50.0).unwrap();
        }

        for present in classes {
            let before: Vec<(u32, u32)> =
                store.records().iter().map(|r| (r.present, r.total)).collect();
            store.mark_attendance(&staff(), &present);
            for (r, (p0, t0)) in store.records().iter().zip(before) {
                prop_assert_eq!(r.total, t0 + 1);
                prop_assert!(r.present == p0 || r.present == p0 + 1);
                prop_assert!(r.present <= r.total);
            }
        }
    }

    /// Every sort key yields the documented order
    #[test]
    fn sort_orders_hold(records in unique_records()) {
        let dir = TempDir::new().unwrap();
        let mut store = fresh_store(&dir);
        for r in &records {
            store.add(&staff(), r.roll, &r.name, r.marks).unwrap();
        }

        for key in SortKey::iter() {
            store.sort(key);
            let ordered = store.records().windows(2).all(|w| match key {
                SortKey::RollAscending => w[0].roll <= w[1].roll,
                SortKey::NameAlphabetical => {
                    w[0].name.to_lowercase() <= w[1].name.to_lowercase()
                }
                SortKey::MarksDescending => w[0].marks >= w[1].marks,
            });
            prop_assert!(ordered, "not ordered by {}", key);
            prop_assert_eq!(store.len(), records.len());
        }
    }
}

// =============================================================================
// Password and Role Properties
// =============================================================================

proptest! {
    /// Anything shorter than the minimum is weak
    #[test]
    fn short_passwords_rejected(pw in "[ -~]{0,5}") {
        prop_assert!(pw.chars().count() < MIN_PASSWORD_LEN);
        prop_assert!(!check_strength(&pw).is_empty());
    }

    /// Passwords built from all four classes at sufficient length pass
    #[test]
    fn complete_passwords_accepted(
        upper in "[A-Z]", lower in "[a-z]", digit in "[0-9]", special in "[!@#$%^&*]",
        filler in "[a-z]{2,20}"
    ) {
        let pw = format!("{}{}{}{}{}", upper, lower, digit, special, filler);
        prop_assert!(check_strength(&pw).is_empty());
    }

    /// Unknown role tokens always resolve to Guest
    #[test]
    fn unknown_role_tokens_are_guest(token in "[a-z]{1,10}") {
        prop_assert_eq!(Role::from_token(&token), Role::Guest);
    }
}

#[test]
fn role_tokens_roundtrip() {
    for role in Role::iter() {
        assert_eq!(Role::from_token(&role.to_string()), role);
    }
}
