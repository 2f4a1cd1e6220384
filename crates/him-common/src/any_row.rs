//! Manual `sqlx::FromRow<'_, sqlx::any::AnyRow>` implementations for every
//! entity model.
//!
//! `sqlx::AnyPool` only decodes primitive types natively (i64, f64, bool,
//! String, bytes). Ids, dates, timestamps and JSON columns are therefore stored
//! as text and parsed here, which keeps one schema working on MySQL,
//! PostgreSQL and SQLite alike.

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use sqlx::{any::AnyRow, Row};
use uuid::Uuid;

use crate::models::{
    auth_identity::{AuthIdentity, Provider},
    class::Class,
    department::Department,
    department_member::DepartmentMember,
    member::{Member, Role},
    member_class::MemberClass,
    room::Room,
    user::User,
};

// ── Internal helpers ──────────────────────────────────────────────────────────

fn decode_err(e: impl std::error::Error + Send + Sync + 'static) -> sqlx::Error {
    sqlx::Error::Decode(Box::new(e))
}

fn uuid(row: &AnyRow, col: &str) -> Result<Uuid, sqlx::Error> {
    let s: String = row.try_get(col)?;
    Uuid::parse_str(&s).map_err(decode_err)
}

fn opt_uuid(row: &AnyRow, col: &str) -> Result<Option<Uuid>, sqlx::Error> {
    let s: Option<String> = row.try_get(col)?;
    s.map(|v| Uuid::parse_str(&v).map_err(decode_err)).transpose()
}

fn dt(row: &AnyRow, col: &str) -> Result<DateTime<Utc>, sqlx::Error> {
    let s: String = row.try_get(col)?;
    parse_dt(&s).map_err(sqlx::Error::Decode)
}

/// Timestamps are written as RFC 3339; the other two shapes cover values
/// written by hand or by database defaults.
fn parse_dt(
    s: &str,
) -> Result<DateTime<Utc>, Box<dyn std::error::Error + Send + Sync + 'static>> {
    if let Ok(d) = DateTime::parse_from_rfc3339(s) {
        return Ok(d.with_timezone(&Utc));
    }
    if let Ok(d) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Ok(d.and_utc());
    }
    if let Ok(d) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return Ok(d.and_utc());
    }
    Err(format!("cannot parse timestamp '{s}'").into())
}

fn opt_date(row: &AnyRow, col: &str) -> Result<Option<NaiveDate>, sqlx::Error> {
    let s: Option<String> = row.try_get(col)?;
    s.map(|v| NaiveDate::parse_from_str(&v, "%Y-%m-%d").map_err(decode_err))
        .transpose()
}

fn opt_json(row: &AnyRow, col: &str) -> Result<Option<serde_json::Value>, sqlx::Error> {
    let s: Option<String> = row.try_get(col)?;
    s.map(|v| serde_json::from_str(&v).map_err(decode_err))
        .transpose()
}

/// Typed JSON column where NULL or an empty string means `T::default()`.
fn json_or_default<T: DeserializeOwned + Default>(
    row: &AnyRow,
    col: &str,
) -> Result<T, sqlx::Error> {
    let s: Option<String> = row.try_get(col)?;
    match s.as_deref().map(str::trim) {
        None | Some("") | Some("null") => Ok(T::default()),
        Some(v) => serde_json::from_str(v).map_err(decode_err),
    }
}

fn parse_enum<T>(
    row: &AnyRow,
    col: &str,
    f: impl Fn(&str) -> Option<T>,
) -> Result<T, sqlx::Error> {
    let s: String = row.try_get(col)?;
    f(&s).ok_or_else(|| sqlx::Error::Decode(format!("unknown enum variant: {s}").into()))
}

// ── User ──────────────────────────────────────────────────────────────────────

impl<'r> sqlx::FromRow<'r, AnyRow> for User {
    fn from_row(row: &'r AnyRow) -> Result<Self, sqlx::Error> {
        Ok(User {
            id: uuid(row, "id")?,
            email: row.try_get("email")?,
            full_name: row.try_get("full_name")?,
        })
    }
}

// ── Member ────────────────────────────────────────────────────────────────────

impl<'r> sqlx::FromRow<'r, AnyRow> for Member {
    fn from_row(row: &'r AnyRow) -> Result<Self, sqlx::Error> {
        Ok(Member {
            id: uuid(row, "id")?,
            full_name: row.try_get("full_name")?,
            birthday: opt_date(row, "birthday")?,
            personal_phone: row.try_get("personal_phone")?,
            work_phone: row.try_get("work_phone")?,
            mobile_phone: row.try_get("mobile_phone")?,
            address: row.try_get("address")?,
            email: row.try_get("email")?,
            ssn: row.try_get("ssn")?,
            role: parse_enum(row, "role", Role::parse)?,
            line_id: row.try_get("line_id")?,
            photo: row.try_get("photo")?,
            parents: json_or_default(row, "parents")?,
            family_members: json_or_default(row, "family_members")?,
            additional_fields: opt_json(row, "additional_fields")?,
            created_at: dt(row, "created_at")?,
            updated_at: dt(row, "updated_at")?,
        })
    }
}

// ── AuthIdentity ──────────────────────────────────────────────────────────────

impl<'r> sqlx::FromRow<'r, AnyRow> for AuthIdentity {
    fn from_row(row: &'r AnyRow) -> Result<Self, sqlx::Error> {
        Ok(AuthIdentity {
            id: uuid(row, "id")?,
            user_id: uuid(row, "user_id")?,
            provider: parse_enum(row, "provider", Provider::parse)?,
            provider_id: row.try_get("provider_id")?,
        })
    }
}

// ── Department ────────────────────────────────────────────────────────────────

impl<'r> sqlx::FromRow<'r, AnyRow> for Department {
    fn from_row(row: &'r AnyRow) -> Result<Self, sqlx::Error> {
        Ok(Department {
            id: uuid(row, "id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            created_at: dt(row, "created_at")?,
            custom_fields: opt_json(row, "custom_fields")?,
        })
    }
}

impl<'r> sqlx::FromRow<'r, AnyRow> for DepartmentMember {
    fn from_row(row: &'r AnyRow) -> Result<Self, sqlx::Error> {
        Ok(DepartmentMember {
            id: uuid(row, "id")?,
            member_id: uuid(row, "member_id")?,
            department_id: uuid(row, "department_id")?,
            additional_fields: opt_json(row, "additional_fields")?,
        })
    }
}

// ── Class / enrollment ────────────────────────────────────────────────────────

impl<'r> sqlx::FromRow<'r, AnyRow> for Class {
    fn from_row(row: &'r AnyRow) -> Result<Self, sqlx::Error> {
        Ok(Class {
            id: uuid(row, "id")?,
            department_id: uuid(row, "department_id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            room_id: opt_uuid(row, "room_id")?,
            teacher_id: opt_uuid(row, "teacher_id")?,
            start_date: opt_date(row, "start_date")?,
            end_date: opt_date(row, "end_date")?,
            cost: row.try_get("cost")?,
            max_capacity: row.try_get("max_capacity")?,
        })
    }
}

impl<'r> sqlx::FromRow<'r, AnyRow> for MemberClass {
    fn from_row(row: &'r AnyRow) -> Result<Self, sqlx::Error> {
        Ok(MemberClass {
            id: uuid(row, "id")?,
            member_id: uuid(row, "member_id")?,
            class_id: uuid(row, "class_id")?,
            enrolled_at: dt(row, "enrolled_at")?,
            attendance: json_or_default(row, "attendance")?,
        })
    }
}

// ── Room ──────────────────────────────────────────────────────────────────────

impl<'r> sqlx::FromRow<'r, AnyRow> for Room {
    fn from_row(row: &'r AnyRow) -> Result<Self, sqlx::Error> {
        Ok(Room {
            id: uuid(row, "id")?,
            name: row.try_get("name")?,
            capacity: row.try_get("capacity")?,
            location: row.try_get("location")?,
            description: row.try_get("description")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dt_formats() {
        let expected = "2024-01-15T10:30:00Z".parse::<DateTime<Utc>>().unwrap();
        assert_eq!(parse_dt("2024-01-15T10:30:00+00:00").unwrap(), expected);
        assert_eq!(parse_dt("2024-01-15 10:30:00").unwrap(), expected);
        assert_eq!(parse_dt("2024-01-15 10:30:00.000").unwrap(), expected);
        assert!(parse_dt("yesterday").is_err());
    }
}
