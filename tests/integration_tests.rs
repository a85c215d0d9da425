//! Integration tests for the record store, credentials and audit log
//!
//! These tests verify:
//! - Persistence across store instances (save, reload)
//! - Login against a credentials file, including lockout
//! - Password changes rewriting the credentials file
//! - Admin-only audit trail

use std::fs;

use rollbook::{
    AuditLog, AuthState, CredentialStore, Durability, RecordStore, Role, RollbookError, Session,
    SessionAuthenticator,
};
use tempfile::TempDir;

fn store_in(dir: &TempDir) -> RecordStore {
    RecordStore::new(
        dir.path().join("students.txt"),
        AuditLog::new(dir.path().join("admin_log.txt")),
    )
}

fn audit_actions(dir: &TempDir) -> Vec<String> {
    AuditLog::new(dir.path().join("admin_log.txt"))
        .entries()
        .unwrap()
        .into_iter()
        .map(|e| e.action)
        .collect()
}

// =============================================================================
// Record Persistence
// =============================================================================

#[test]
fn test_admin_adds_student_and_file_matches() {
    let dir = TempDir::new().unwrap();
    let admin = Session::new("root", Role::Admin);
    let mut store = store_in(&dir);
    store.load().unwrap();

    assert_eq!(store.add(&admin, 1, "Alice", 85.5).unwrap(), Durability::Saved);

    let content = fs::read_to_string(dir.path().join("students.txt")).unwrap();
    assert_eq!(content, "1 Alice 85.50 0 0\n");

    let log = AuditLog::new(dir.path().join("admin_log.txt"))
        .entries()
        .unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].user, "root");
    assert_eq!(log[0].action, "Added student roll 1 name Alice");
}

#[test]
fn test_student_lifecycle() {
    let dir = TempDir::new().unwrap();
    let admin = Session::new("root", Role::Admin);
    let mut store = store_in(&dir);

    store.add(&admin, 1, "Alice", 90.0).unwrap();
    let alice = store.search_by_roll(1).unwrap();
    assert_eq!((alice.present, alice.total), (0, 0));

    store.mark_attendance(&admin, &[1]);
    let alice = store.search_by_roll(1).unwrap();
    assert_eq!((alice.present, alice.total), (1, 1));
    assert_eq!(alice.attendance_percent(), 100.0);

    assert_eq!(
        store.delete(&admin, 1, false).unwrap(),
        rollbook::DeleteOutcome::Cancelled
    );
    assert!(store.search_by_roll(1).is_ok());

    store.delete(&admin, 1, true).unwrap();
    assert!(matches!(
        store.search_by_roll(1),
        Err(RollbookError::NotFound(_))
    ));
    assert_eq!(
        fs::read_to_string(dir.path().join("students.txt")).unwrap(),
        ""
    );
}

#[test]
fn test_reload_sees_attendance() {
    let dir = TempDir::new().unwrap();
    let staff = Session::new("sam", Role::Staff);
    let mut store = store_in(&dir);
    store.add(&staff, 1, "Alice", 90.0).unwrap();
    store.add(&staff, 2, "Bob", 60.0).unwrap();
    store.mark_attendance(&staff, &[2]);

    let mut reloaded = store_in(&dir);
    let report = reloaded.load().unwrap();
    assert_eq!(report.loaded, 2);
    assert_eq!(report.truncated_at, None);
    assert_eq!(reloaded.records(), store.records());

    let bob = reloaded.find_by_roll(2).unwrap();
    assert_eq!((bob.present, bob.total), (1, 1));
    assert_eq!(bob.attendance_percent(), 100.0);

    // Staff mutations are never audited
    assert!(!dir.path().join("admin_log.txt").exists());
}

#[test]
fn test_duplicate_roll_in_file_stops_load() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("students.txt"),
        "1 Alice 90.00 0 0\n2 Bob 80.00 0 0\n1 Again 10.00 0 0\n3 Cy 70.00 0 0\n",
    )
    .unwrap();

    let mut store = store_in(&dir);
    let report = store.load().unwrap();
    assert_eq!(report.loaded, 2);
    assert_eq!(report.truncated_at, Some(3));
    assert!(store.find_by_roll(3).is_err());
}

#[test]
fn test_export_csv_rows_in_roster_order() {
    let dir = TempDir::new().unwrap();
    let admin = Session::new("root", Role::Admin);
    let mut store = store_in(&dir);
    store.add(&admin, 5, "Eve", 70.0).unwrap();
    store.add(&admin, 2, "Dan", 88.0).unwrap();

    let out = dir.path().join("export.csv");
    assert_eq!(store.export_csv(&admin, &out).unwrap(), 2);
    let csv = fs::read_to_string(&out).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "Roll,Name,Marks,Present,Total,AttendancePercent");
    assert_eq!(lines[1], "5,Eve,70.00,0,0,0");
    assert_eq!(lines[2], "2,Dan,88.00,0,0,0");

    assert_eq!(
        audit_actions(&dir).last().map(String::as_str),
        Some(format!("Exported data to {}", out.display()).as_str())
    );
}

// =============================================================================
// Authentication
// =============================================================================

fn authenticator(dir: &TempDir, creds: &str) -> SessionAuthenticator {
    let path = dir.path().join("credentials.txt");
    fs::write(&path, creds).unwrap();
    SessionAuthenticator::new(
        CredentialStore::new(path),
        AuditLog::new(dir.path().join("admin_log.txt")),
    )
}

#[test]
fn test_three_wrong_passwords_deny_without_side_effects() {
    let dir = TempDir::new().unwrap();
    let mut auth = authenticator(&dir, "root Root#1 ADMIN\nbob Secret#1 USER\n");

    for _ in 0..2 {
        assert_eq!(
            auth.attempt("bob", "wrongpw").unwrap(),
            AuthState::AwaitingCredentials
        );
    }
    assert_eq!(auth.attempt("bob", "wrongpw").unwrap(), AuthState::Denied);
    assert!(auth.session().is_none());
    assert!(!dir.path().join("students.txt").exists());
    assert!(!dir.path().join("admin_log.txt").exists());
}

#[test]
fn test_unknown_role_token_logs_in_as_guest() {
    let dir = TempDir::new().unwrap();
    let mut auth = authenticator(&dir, "visitor Pass#99 superuser\n");
    assert_eq!(
        auth.attempt("visitor", "Pass#99").unwrap(),
        AuthState::Authenticated
    );
    let session = auth.session().unwrap();
    assert_eq!(session.role(), Role::Guest);
    assert!(!session.role().has_menu());
}

#[test]
fn test_first_matching_credential_line_wins() {
    let dir = TempDir::new().unwrap();
    let store_path = dir.path().join("credentials.txt");
    fs::write(&store_path, "amy Pw#12345 STAFF\namy Pw#12345 ADMIN\n").unwrap();
    let creds = CredentialStore::new(&store_path);
    assert_eq!(creds.verify("amy", "Pw#12345").unwrap(), Role::Staff);
    assert!(matches!(
        creds.verify("amy", "pw#12345"),
        Err(RollbookError::AuthenticationFailed(_))
    ));
}

#[test]
fn test_change_password_then_login_with_new_password() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("credentials.txt");
    fs::write(&path, "root Root#1 ADMIN\nbob Secret#1 USER\n").unwrap();
    let creds = CredentialStore::new(&path);

    creds.change_password("bob", "Fresh#22").unwrap();
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "root Root#1 ADMIN\nbob Fresh#22 USER\n"
    );
    assert!(!dir.path().join("credentials.txt.tmp").exists());

    assert_eq!(creds.verify("bob", "Fresh#22").unwrap(), Role::User);
    assert!(creds.verify("bob", "Secret#1").is_err());
    assert!(matches!(
        creds.change_password("nobody", "Fresh#22"),
        Err(RollbookError::NotFound(_))
    ));
}
