//! Portability helpers for running one set of queries through `sqlx::Any`.
//!
//! The Any driver passes SQL through untouched, so bind markers still have to
//! match the backend: MySQL and SQLite take `?`, PostgreSQL takes `$1, $2, …`.
//! Repositories write `?` everywhere and run the text through [`sql`].
//!
//! Values the Any driver cannot encode natively (ids, dates, timestamps, JSON)
//! are written as text with the `encode_*` helpers; `him_common::any_row`
//! parses them back.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::Serialize;
use sqlx::AnyConnection;
use std::borrow::Cow;
use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    MySql,
    Postgres,
    Sqlite,
}

impl Backend {
    pub fn of(conn: &AnyConnection) -> Self {
        match conn.backend_name() {
            "PostgreSQL" => Self::Postgres,
            "MySQL" => Self::MySql,
            _ => Self::Sqlite,
        }
    }
}

/// Adapt a `?`-style query to the connection's backend.
pub fn sql<'q>(conn: &AnyConnection, query: &'q str) -> Cow<'q, str> {
    bind_markers(Backend::of(conn), query)
}

/// Rewrite `?` markers to `$n` for PostgreSQL, leaving string literals alone.
pub fn bind_markers(backend: Backend, query: &str) -> Cow<'_, str> {
    if backend != Backend::Postgres || !query.contains('?') {
        return Cow::Borrowed(query);
    }

    let mut out = String::with_capacity(query.len() + 16);
    let mut in_literal = false;
    let mut n = 0;
    for c in query.chars() {
        match c {
            '\'' => {
                in_literal = !in_literal;
                out.push(c);
            }
            '?' if !in_literal => {
                n += 1;
                let _ = write!(out, "${n}");
            }
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}

pub fn encode_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn encode_date(date: Option<NaiveDate>) -> Option<String> {
    date.map(|d| d.format("%Y-%m-%d").to_string())
}

pub fn encode_json<T: Serialize>(value: &T) -> Result<String, sqlx::Error> {
    serde_json::to_string(value).map_err(|e| sqlx::Error::Encode(Box::new(e)))
}

pub fn encode_opt_json(value: Option<&serde_json::Value>) -> Result<Option<String>, sqlx::Error> {
    value.map(encode_json).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_postgres_markers_numbered() {
        assert_eq!(
            bind_markers(Backend::Postgres, "UPDATE rooms SET name = ? WHERE id = ?"),
            "UPDATE rooms SET name = $1 WHERE id = $2"
        );
    }

    #[test]
    fn test_literals_left_alone() {
        assert_eq!(
            bind_markers(Backend::Postgres, "SELECT '?' AS q, id FROM rooms WHERE id = ?"),
            "SELECT '?' AS q, id FROM rooms WHERE id = $1"
        );
    }

    #[test]
    fn test_other_backends_untouched() {
        let q = "SELECT * FROM rooms WHERE id = ?";
        assert!(matches!(bind_markers(Backend::MySql, q), Cow::Borrowed(_)));
        assert!(matches!(bind_markers(Backend::Sqlite, q), Cow::Borrowed(_)));
    }

    #[test]
    fn test_encode_date_and_timestamp() {
        assert_eq!(
            encode_date(NaiveDate::from_ymd_opt(2025, 3, 9)).as_deref(),
            Some("2025-03-09")
        );
        let ts = "2024-01-15T10:30:00Z".parse::<DateTime<Utc>>().unwrap();
        assert_eq!(encode_timestamp(ts), "2024-01-15T10:30:00.000000Z");
    }
}
