// ABOUTME: Pure SQL statement builders over entity descriptors
// ABOUTME: Select/insert/bulk-insert/update/soft-delete/delete with named placeholders
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! # Statement Builders
//!
//! Pure functions turning an entity descriptor plus an intent into a
//! parameterized statement: text in the `%(name)s` named-placeholder
//! dialect, parameters as a [`Params`] payload. Statements are built per
//! call and immediately consumed by the executor; nothing here performs
//! I/O or caches.
//!
//! ## Predicates and the injection trust boundary
//!
//! The default way to constrain a statement is a structured [`Filter`]:
//! column/operator/value triples compiled to named placeholders and bound
//! as parameters. [`Filter::raw`] remains available for compatibility: its
//! text is spliced **verbatim** after `WHERE` with no escaping whatsoever,
//! so the caller owns sanitization. Never feed untrusted input through the
//! raw path.

use crate::constants::sql::SOFT_DELETE_COLUMN;
use crate::entity::Entity;
use crate::errors::{AppError, AppResult};
use crate::value::{Params, Payload, Value};

/// Reserved placeholder prefix used by compiled filter predicates
const FILTER_PARAM_PREFIX: &str = "filter_";

/// A parameterized statement plus its bound parameters, not yet executed
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// Statement text in the `%(name)s` named-placeholder dialect
    pub text: String,
    /// Bound parameters
    pub params: Params,
}

impl Statement {
    /// Statement with no bound parameters
    #[must_use]
    pub fn bare(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            params: Params::None,
        }
    }
}

/// Comparison operators available to structured predicates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    /// `=`
    Eq,
    /// `<>`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `LIKE`
    Like,
    /// `IS NULL` (value ignored)
    IsNull,
    /// `IS NOT NULL` (value ignored)
    IsNotNull,
}

impl Op {
    const fn sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Like => "LIKE",
            Self::IsNull => "IS NULL",
            Self::IsNotNull => "IS NOT NULL",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Clause {
    Compare {
        column: String,
        op: Op,
        value: Value,
    },
    Raw(String),
}

/// Boolean predicate attached to a statement, AND-joined
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    clauses: Vec<Clause>,
}

impl Filter {
    /// No predicate; the statement applies to every row
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Single structured comparison
    #[must_use]
    pub fn field(column: impl Into<String>, op: Op, value: impl Into<Value>) -> Self {
        Self::none().and_field(column, op, value)
    }

    /// Raw predicate text, spliced verbatim after `WHERE`.
    ///
    /// Compatibility escape hatch: no escaping or parameterization is
    /// applied. The caller is the trust boundary.
    #[must_use]
    pub fn raw(text: impl Into<String>) -> Self {
        Self::none().and_raw(text)
    }

    /// AND another structured comparison
    #[must_use]
    pub fn and_field(mut self, column: impl Into<String>, op: Op, value: impl Into<Value>) -> Self {
        self.clauses.push(Clause::Compare {
            column: column.into(),
            op,
            value: value.into(),
        });
        self
    }

    /// AND another raw predicate fragment (verbatim, unescaped)
    #[must_use]
    pub fn and_raw(mut self, text: impl Into<String>) -> Self {
        self.clauses.push(Clause::Raw(text.into()));
        self
    }

    /// True when no clauses are present
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Compile to predicate text, binding compare values into `params`
    /// under the reserved `filter_N` placeholder names.
    fn compile(&self, params: &mut Payload) -> String {
        let mut parts = Vec::with_capacity(self.clauses.len());
        let mut index = 0usize;
        for clause in &self.clauses {
            match clause {
                Clause::Compare { column, op, value } => match op {
                    Op::IsNull | Op::IsNotNull => {
                        parts.push(format!("{column} {}", op.sql()));
                    }
                    _ => {
                        let name = format!("{FILTER_PARAM_PREFIX}{index}");
                        parts.push(format!("{column} {} %({name})s", op.sql()));
                        params.insert(name, value.clone());
                        index += 1;
                    }
                },
                Clause::Raw(text) => parts.push(text.clone()),
            }
        }
        parts.join(" AND ")
    }
}

fn returning_clause(returning: &[&str]) -> String {
    if returning.is_empty() {
        String::new()
    } else {
        format!(" RETURNING {}", returning.join(", "))
    }
}

/// Build a SELECT against an explicit table name.
///
/// Empty `fields` selects `*`; zero `limit`/`offset` omit their clauses.
#[must_use]
pub fn build_select(
    table: &str,
    fields: &[&str],
    filter: &Filter,
    order_by: &str,
    limit: u64,
    offset: u64,
) -> Statement {
    let cols = if fields.is_empty() {
        "*".to_owned()
    } else {
        fields.join(", ")
    };

    let mut params = Payload::new();
    let mut text = format!("SELECT {cols} FROM {table}");
    if !filter.is_empty() {
        let predicate = filter.compile(&mut params);
        text.push_str(&format!(" WHERE {predicate}"));
    }
    if !order_by.is_empty() {
        text.push_str(&format!(" ORDER BY {order_by}"));
    }
    if limit > 0 {
        text.push_str(&format!(" LIMIT {limit}"));
    }
    if offset > 0 {
        text.push_str(&format!(" OFFSET {offset}"));
    }

    Statement {
        text,
        params: if params.is_empty() {
            Params::None
        } else {
            Params::Row(params)
        },
    }
}

/// Build a SELECT with the table resolved from an entity descriptor
#[must_use]
pub fn build_select_entity<E: Entity>(
    fields: &[&str],
    filter: &Filter,
    order_by: &str,
    limit: u64,
    offset: u64,
) -> Statement {
    build_select(
        &E::table_fullname(),
        fields,
        filter,
        order_by,
        limit,
        offset,
    )
}

/// Build a single-row INSERT from an entity instance.
///
/// Column list and placeholder list derive from the payload keys in one
/// iteration order.
///
/// # Errors
/// Returns a validation error if the entity fails payload derivation or
/// has no populated fields.
pub fn build_insert<E: Entity>(entity: &E, returning: &[&str]) -> AppResult<Statement> {
    let payload = Payload::from_entity(entity)?;
    if payload.is_empty() {
        return Err(AppError::validation(format!(
            "entity {} has no populated fields to insert",
            E::NAME
        )));
    }

    let cols = payload.keys().collect::<Vec<_>>().join(", ");
    let placeholders = payload
        .keys()
        .map(|k| format!("%({k})s"))
        .collect::<Vec<_>>()
        .join(", ");

    let text = format!(
        "INSERT INTO {} ({cols}) VALUES ({placeholders}){}",
        E::table_fullname(),
        returning_clause(returning)
    );

    Ok(Statement {
        text,
        params: Params::Row(payload),
    })
}

/// Build a batch INSERT from a sequence of entity instances.
///
/// The column list is taken from the **first** payload only; callers must
/// keep the batch uniform in shape — divergence is undefined behavior, not
/// validated here. The statement carries the whole payload sequence and is
/// applied per payload by [`crate::database::Database::execute_batch_insert`]
/// inside one transaction.
///
/// # Errors
/// Returns a validation error if the batch is empty.
pub fn build_bulk_insert<E: Entity>(entities: &[E], returning: &[&str]) -> AppResult<Statement> {
    let Some(first) = entities.first() else {
        return Err(AppError::validation("bulk insert batch must not be empty"));
    };

    let first_payload = Payload::from_entity(first)?;
    if first_payload.is_empty() {
        return Err(AppError::validation(format!(
            "entity {} has no populated fields to insert",
            E::NAME
        )));
    }

    let cols = first_payload.keys().collect::<Vec<_>>().join(", ");
    let placeholders = first_payload
        .keys()
        .map(|k| format!("%({k})s"))
        .collect::<Vec<_>>()
        .join(", ");

    let text = format!(
        "INSERT INTO {} ({cols}) VALUES ({placeholders}){}",
        E::table_fullname(),
        returning_clause(returning)
    );

    let batch = entities
        .iter()
        .map(Payload::from_entity)
        .collect::<AppResult<Vec<_>>>()?;

    Ok(Statement {
        text,
        params: Params::Batch(batch),
    })
}

/// Build an UPDATE whose SET clause derives from the entity's payload keys.
///
/// # Errors
/// Returns a validation error if the entity fails payload derivation or
/// has no populated fields.
pub fn build_update<E: Entity>(
    entity: &E,
    filter: &Filter,
    returning: &[&str],
) -> AppResult<Statement> {
    let mut payload = Payload::from_entity(entity)?;
    if payload.is_empty() {
        return Err(AppError::validation(format!(
            "entity {} has no populated fields to update",
            E::NAME
        )));
    }

    let set_clause = payload
        .keys()
        .map(|k| format!("{k} = %({k})s"))
        .collect::<Vec<_>>()
        .join(", ");

    let mut text = format!("UPDATE {} SET {set_clause}", E::table_fullname());
    if !filter.is_empty() {
        let predicate = filter.compile(&mut payload);
        text.push_str(&format!(" WHERE {predicate}"));
    }
    text.push_str(&returning_clause(returning));

    Ok(Statement {
        text,
        params: Params::Row(payload),
    })
}

/// Build a soft delete: an UPDATE flipping the fixed `exist` flag column.
///
/// Assumes every soft-deletable entity's table carries the column.
#[must_use]
pub fn build_soft_delete<E: Entity>(filter: &Filter, returning: &[&str]) -> Statement {
    let mut params = Payload::new();
    let mut text = format!(
        "UPDATE {} SET {SOFT_DELETE_COLUMN} = FALSE",
        E::table_fullname()
    );
    if !filter.is_empty() {
        let predicate = filter.compile(&mut params);
        text.push_str(&format!(" WHERE {predicate}"));
    }
    text.push_str(&returning_clause(returning));

    Statement {
        text,
        params: if params.is_empty() {
            Params::None
        } else {
            Params::Row(params)
        },
    }
}

/// Build a hard DELETE
#[must_use]
pub fn build_delete<E: Entity>(filter: &Filter, returning: &[&str]) -> Statement {
    let mut params = Payload::new();
    let mut text = format!("DELETE FROM {}", E::table_fullname());
    if !filter.is_empty() {
        let predicate = filter.compile(&mut params);
        text.push_str(&format!(" WHERE {predicate}"));
    }
    text.push_str(&returning_clause(returning));

    Statement {
        text,
        params: if params.is_empty() {
            Params::None
        } else {
            Params::Row(params)
        },
    }
}
