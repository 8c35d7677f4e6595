//! Unit tests for user persistence and the age classifier.

use rusqlite::Connection;

use crate::{age_group, create_user, list_users, AgeGroupError, CreateUserError};
use roster_types::{AgeGroup, NewUser};

/// Creates an in-memory SQLite database with the schema generated.
fn test_db() -> Connection {
    let conn = Connection::open_in_memory().expect("should open in-memory db");
    roster_db::generate_schemas(&conn).expect("schema generation should succeed");
    conn
}

fn new_user(name: &str, email: &str) -> NewUser {
    NewUser {
        name: name.to_string(),
        email: email.to_string(),
    }
}

// ── age_group ────────────────────────────────────────────────────────

#[test]
fn age_group_underage_range() {
    for age in 1..=17 {
        assert_eq!(age_group(age), Ok(AgeGroup::Underage), "age {age}");
    }
}

#[test]
fn age_group_adult_range() {
    for age in 18..=63 {
        assert_eq!(age_group(age), Ok(AgeGroup::Adult), "age {age}");
    }
}

#[test]
fn age_group_senior_range() {
    for age in [64, 65, 70, 120, i64::MAX] {
        assert_eq!(age_group(age), Ok(AgeGroup::Senior), "age {age}");
    }
}

#[test]
fn age_group_boundaries() {
    assert_eq!(age_group(17), Ok(AgeGroup::Underage));
    assert_eq!(age_group(18), Ok(AgeGroup::Adult));
    assert_eq!(age_group(63), Ok(AgeGroup::Adult));
    assert_eq!(age_group(64), Ok(AgeGroup::Senior));
}

#[test]
fn age_group_rejects_non_positive_ages() {
    for age in [0, -1, -35, i64::MIN] {
        let err = age_group(age).expect_err("non-positive age must fail");
        assert_eq!(err, AgeGroupError::InvalidAge(age));
        assert_eq!(err.to_string(), "Edad invalida");
    }
}

// ── create_user ──────────────────────────────────────────────────────

#[test]
fn create_user_assigns_id_and_returns_record() {
    let conn = test_db();

    let first = create_user(&conn, &new_user("Ana", "ana@example.com")).unwrap();
    let second = create_user(&conn, &new_user("Bruno", "bruno@example.com")).unwrap();

    assert!(first.id > 0);
    assert!(second.id > first.id);
    assert_eq!(first.name, "Ana");
    assert_eq!(first.email, "ana@example.com");
}

#[test]
fn create_user_reports_duplicate_email() {
    let conn = test_db();
    create_user(&conn, &new_user("Ana", "ana@example.com")).unwrap();

    let err = create_user(&conn, &new_user("Ana Maria", "ana@example.com"))
        .expect_err("duplicate email must fail");
    match err {
        CreateUserError::DuplicateEmail(email) => assert_eq!(email, "ana@example.com"),
        other => panic!("unexpected error: {other:?}"),
    }

    assert_eq!(list_users(&conn).unwrap().len(), 1);
}

#[test]
fn create_user_allows_duplicate_names() {
    let conn = test_db();
    create_user(&conn, &new_user("Ana", "ana1@example.com")).unwrap();
    create_user(&conn, &new_user("Ana", "ana2@example.com")).unwrap();
    assert_eq!(list_users(&conn).unwrap().len(), 2);
}

#[test]
fn create_user_other_failures_are_not_duplicates() {
    let conn = test_db();
    let err = create_user(&conn, &new_user(&"x".repeat(51), "long@example.com"))
        .expect_err("over-long name violates the check constraint");
    assert!(matches!(err, CreateUserError::Database(_)), "got {err:?}");
}

#[test]
fn create_user_without_schema_is_a_database_error() {
    let conn = Connection::open_in_memory().unwrap();
    let err = create_user(&conn, &new_user("Ana", "ana@example.com")).unwrap_err();
    assert!(matches!(err, CreateUserError::Database(_)), "got {err:?}");
}

// ── list_users ───────────────────────────────────────────────────────

#[test]
fn list_users_empty() {
    let conn = test_db();
    assert!(list_users(&conn).unwrap().is_empty());
}

#[test]
fn list_users_orders_by_name() {
    let conn = test_db();
    create_user(&conn, &new_user("Carla", "carla@example.com")).unwrap();
    create_user(&conn, &new_user("Ana", "ana@example.com")).unwrap();
    create_user(&conn, &new_user("Bruno", "bruno@example.com")).unwrap();
    create_user(&conn, &new_user("Ana", "ana.b@example.com")).unwrap();

    let emails: Vec<String> = list_users(&conn)
        .unwrap()
        .into_iter()
        .map(|u| u.email)
        .collect();
    assert_eq!(
        emails,
        vec![
            "ana@example.com",
            "ana.b@example.com",
            "bruno@example.com",
            "carla@example.com"
        ]
    );
}

#[test]
fn list_users_without_schema_fails() {
    let conn = Connection::open_in_memory().unwrap();
    assert!(list_users(&conn).is_err());
}
