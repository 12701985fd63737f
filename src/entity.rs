// ABOUTME: Entity descriptor trait mapping record types to their storage location
// ABOUTME: Schema/table resolution with a deterministic snake-case fallback
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! # Entity Descriptors
//!
//! Every persisted record type carries a passive descriptor: a schema name
//! and a table name. Both are compile-time constants resolved through
//! static dispatch; when no table name is configured, it is derived from
//! the type name by a fixed snake-case rule.

use serde::Serialize;

/// Descriptor attached to every persisted record type.
///
/// `SCHEMA` and `TABLE` are metadata, never columns. The `Serialize` bound
/// is what feeds payload derivation: serializing the entity yields the
/// column map, and descriptor constants cannot leak into it.
pub trait Entity: Serialize {
    /// Schema the table lives in; empty means unqualified
    const SCHEMA: &'static str = "";

    /// Explicit table name; `None` falls back to `snake_case(NAME)`
    const TABLE: Option<&'static str> = None;

    /// The declared type name, used for the snake-case fallback
    const NAME: &'static str;

    /// Resolved table name
    #[must_use]
    fn table_name() -> String {
        Self::TABLE.map_or_else(|| snake_case(Self::NAME), str::to_owned)
    }

    /// Fully-qualified `schema.table` name, or bare table when the schema
    /// is empty
    #[must_use]
    fn table_fullname() -> String {
        qualified_table(Self::SCHEMA, &Self::table_name())
    }
}

/// Qualify a table name with a schema; an empty schema leaves it bare
#[must_use]
pub fn qualified_table(schema: &str, table: &str) -> String {
    if schema.is_empty() {
        table.to_owned()
    } else {
        format!("{schema}.{table}")
    }
}

/// Snake-case a type name: `_` before every uppercase letter not at
/// position 0, then lowercase.
///
/// Consecutive uppercase letters each get their own separator
/// (`ABCWidget` becomes `a_b_c_widget`). The literal rule is a
/// compatibility contract with the deployed table names; do not replace it
/// with an acronym-aware variant.
#[must_use]
pub fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, ch) in name.chars().enumerate() {
        if ch.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct OrderLine {
        qty: i64,
    }

    impl Entity for OrderLine {
        const NAME: &'static str = "OrderLine";
    }

    #[derive(Serialize)]
    struct Invoice {
        total: i64,
    }

    impl Entity for Invoice {
        const SCHEMA: &'static str = "billing";
        const TABLE: Option<&'static str> = Some("invoices");
        const NAME: &'static str = "Invoice";
    }

    #[test]
    fn test_snake_case_rule() {
        assert_eq!(snake_case("Customer"), "customer");
        assert_eq!(snake_case("OrderLine"), "order_line");
        assert_eq!(snake_case("ABCWidget"), "a_b_c_widget");
        assert_eq!(snake_case("already_snake"), "already_snake");
        assert_eq!(snake_case(""), "");
    }

    #[test]
    fn test_snake_case_idempotent() {
        let once = snake_case("PermissionCustomer");
        assert_eq!(once, "permission_customer");
        assert_eq!(snake_case(&once), once);
    }

    #[test]
    fn test_fallback_table_name() {
        assert_eq!(OrderLine::table_name(), "order_line");
        assert_eq!(OrderLine::table_fullname(), "order_line");
    }

    #[test]
    fn test_explicit_schema_and_table() {
        assert_eq!(Invoice::table_name(), "invoices");
        assert_eq!(Invoice::table_fullname(), "billing.invoices");
    }

    #[test]
    fn test_qualified_table() {
        assert_eq!(qualified_table("users", "customer"), "users.customer");
        assert_eq!(qualified_table("", "customer"), "customer");
    }
}
