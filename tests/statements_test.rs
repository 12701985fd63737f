// ABOUTME: Integration tests for entity naming and the statement builders
// ABOUTME: Clause assembly, placeholder correspondence, and filter compilation
//
// SPDX-License-Identifier: MIT OR Apache-2.0

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use custodia::entity::{qualified_table, snake_case, Entity};
use custodia::errors::ErrorCode;
use custodia::statements::{
    build_bulk_insert, build_delete, build_insert, build_select, build_select_entity,
    build_soft_delete, build_update, Filter, Op,
};
use custodia::value::{Params, Value};
use serde::Serialize;

#[derive(Serialize)]
struct Customer {
    id: Option<i64>,
    username: String,
    password: String,
    profile: Option<serde_json::Value>,
}

impl Entity for Customer {
    const SCHEMA: &'static str = "users";
    const TABLE: Option<&'static str> = Some("customer");
    const NAME: &'static str = "Customer";
}

#[derive(Serialize)]
struct AuditTrailEntry {
    action: String,
}

impl Entity for AuditTrailEntry {
    const NAME: &'static str = "AuditTrailEntry";
}

fn customer(username: &str) -> Customer {
    Customer {
        id: None,
        username: username.into(),
        password: "hashed".into(),
        profile: None,
    }
}

#[test]
fn test_table_fullname_contract() {
    // explicit schema and table
    assert_eq!(Customer::table_fullname(), "users.customer");
    // snake-case fallback, no schema
    assert_eq!(AuditTrailEntry::table_fullname(), "audit_trail_entry");
}

#[test]
fn test_snake_case_derivation_is_deterministic_and_literal() {
    assert_eq!(snake_case("AuditTrailEntry"), "audit_trail_entry");
    assert_eq!(snake_case("ABCWidget"), "a_b_c_widget");
    // idempotent on its own output
    assert_eq!(snake_case("audit_trail_entry"), "audit_trail_entry");
    // deterministic across calls
    assert_eq!(snake_case("ABCWidget"), snake_case("ABCWidget"));
}

#[test]
fn test_qualified_table_helper() {
    assert_eq!(qualified_table("users", "customer"), "users.customer");
    assert_eq!(qualified_table("", "customer"), "customer");
}

#[test]
fn test_insert_columns_and_placeholders_correspond() {
    let stmt = build_insert(&customer("alice"), &[]).unwrap();

    let open_paren = stmt.text.find('(').unwrap();
    let close_paren = stmt.text.find(')').unwrap();
    let columns: Vec<&str> = stmt.text[open_paren + 1..close_paren]
        .split(", ")
        .collect();

    let values_start = stmt.text.find("VALUES (").unwrap() + "VALUES (".len();
    let values_end = stmt.text.rfind(')').unwrap();
    let placeholders: Vec<&str> = stmt.text[values_start..values_end].split(", ").collect();

    assert_eq!(columns.len(), placeholders.len());
    for (column, placeholder) in columns.iter().zip(&placeholders) {
        assert_eq!(*placeholder, format!("%({column})s"));
    }

    let Params::Row(payload) = stmt.params else {
        panic!("expected row params");
    };
    // absent fields never become columns
    assert!(payload.get("id").is_none());
    assert!(payload.get("profile").is_none());
    assert_eq!(payload.len(), columns.len());
}

#[test]
fn test_empty_bulk_insert_is_a_validation_error() {
    let err = build_bulk_insert::<Customer>(&[], &[]).unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidInput);
}

#[test]
fn test_bulk_insert_takes_columns_from_first_payload() {
    let batch = vec![customer("alice"), customer("bob")];
    let stmt = build_bulk_insert(&batch, &["id"]).unwrap();

    assert!(stmt.text.starts_with("INSERT INTO users.customer (password, username)"));
    assert!(stmt.text.ends_with("RETURNING id"));

    let Params::Batch(payloads) = stmt.params else {
        panic!("expected batch params");
    };
    assert_eq!(payloads.len(), 2);
    assert_eq!(
        payloads[1].get("username"),
        Some(&Value::Text("bob".into()))
    );
}

#[test]
fn test_select_clause_assembly() {
    let stmt = build_select("users.customer", &["id", "username"], &Filter::none(), "", 0, 0);
    assert_eq!(stmt.text, "SELECT id, username FROM users.customer");

    let stmt = build_select(
        "users.customer",
        &[],
        &Filter::field("exist", Op::Eq, true),
        "id DESC",
        25,
        50,
    );
    assert_eq!(
        stmt.text,
        "SELECT * FROM users.customer WHERE exist = %(filter_0)s \
         ORDER BY id DESC LIMIT 25 OFFSET 50"
    );
}

#[test]
fn test_raw_filter_passes_through_unescaped() {
    // compatibility escape hatch: the text is the caller's responsibility
    let stmt = build_select_entity::<Customer>(
        &[],
        &Filter::raw("username = 'alice' OR 1=1"),
        "",
        0,
        0,
    );
    assert_eq!(
        stmt.text,
        "SELECT * FROM users.customer WHERE username = 'alice' OR 1=1"
    );
    assert_eq!(stmt.params, Params::None);
}

#[test]
fn test_structured_filter_parameterizes_values() {
    let stmt = build_select_entity::<Customer>(
        &[],
        &Filter::field("username", Op::Eq, "alice'; DROP TABLE users.customer; --"),
        "",
        0,
        0,
    );

    // the hostile value never reaches the statement text
    assert_eq!(
        stmt.text,
        "SELECT * FROM users.customer WHERE username = %(filter_0)s"
    );
    let Params::Row(payload) = stmt.params else {
        panic!("expected row params");
    };
    assert!(matches!(payload.get("filter_0"), Some(Value::Text(_))));
}

#[test]
fn test_update_builds_set_from_payload() {
    let stmt = build_update(
        &customer("alice"),
        &Filter::field("id", Op::Eq, 9_i64),
        &["*"],
    )
    .unwrap();

    assert_eq!(
        stmt.text,
        "UPDATE users.customer SET password = %(password)s, username = %(username)s \
         WHERE id = %(filter_0)s RETURNING *"
    );
}

#[test]
fn test_soft_delete_uses_exist_convention() {
    let stmt = build_soft_delete::<Customer>(&Filter::field("id", Op::Eq, 3_i64), &["id"]);
    assert_eq!(
        stmt.text,
        "UPDATE users.customer SET exist = FALSE WHERE id = %(filter_0)s RETURNING id"
    );
}

#[test]
fn test_hard_delete() {
    let stmt = build_delete::<Customer>(&Filter::raw("id = 3"), &[]);
    assert_eq!(stmt.text, "DELETE FROM users.customer WHERE id = 3");
}

#[test]
fn test_chained_filters_join_with_and() {
    let filter = Filter::field("username", Op::Like, "a%")
        .and_field("id", Op::Gt, 10_i64)
        .and_field("external_id", Op::IsNull, Value::Null);
    let stmt = build_select("t", &[], &filter, "", 0, 0);

    assert_eq!(
        stmt.text,
        "SELECT * FROM t WHERE username LIKE %(filter_0)s \
         AND id > %(filter_1)s AND external_id IS NULL"
    );
}
