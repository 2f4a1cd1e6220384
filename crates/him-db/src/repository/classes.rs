//! Class repository.

use him_common::{
    error::HimResult,
    ids,
    models::class::{Class, CreateClassRequest},
};
use sqlx::AnyConnection;
use uuid::Uuid;

use crate::any_compat::{encode_date, sql, Backend};

pub async fn create_class(conn: &mut AnyConnection, req: CreateClassRequest) -> HimResult<Class> {
    let class = Class {
        id: ids::new_id(),
        department_id: req.department_id,
        name: req.name,
        description: req.description,
        room_id: req.room_id,
        teacher_id: req.teacher_id,
        start_date: req.start_date,
        end_date: req.end_date,
        cost: req.cost.unwrap_or(0),
        max_capacity: req.max_capacity,
    };
    class.check_invariants()?;

    sqlx::query(&sql(
        conn,
        r#"
        INSERT INTO classes (
            id, department_id, name, description, room_id, teacher_id,
            start_date, end_date, cost, max_capacity
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    ))
    .bind(class.id.to_string())
    .bind(class.department_id.to_string())
    .bind(&class.name)
    .bind(&class.description)
    .bind(class.room_id.map(|id| id.to_string()))
    .bind(class.teacher_id.map(|id| id.to_string()))
    .bind(encode_date(class.start_date))
    .bind(encode_date(class.end_date))
    .bind(class.cost)
    .bind(class.max_capacity)
    .execute(&mut *conn)
    .await?;

    Ok(class)
}

pub async fn find_by_id(conn: &mut AnyConnection, id: Uuid) -> Result<Option<Class>, sqlx::Error> {
    sqlx::query_as::<_, Class>(&sql(conn, "SELECT * FROM classes WHERE id = ?"))
        .bind(id.to_string())
        .fetch_optional(&mut *conn)
        .await
}

/// Like [`find_by_id`], but holds a row lock on MySQL and PostgreSQL until
/// the session ends. SQLite serializes writers already.
pub async fn find_for_update(
    conn: &mut AnyConnection,
    id: Uuid,
) -> Result<Option<Class>, sqlx::Error> {
    let query = match Backend::of(conn) {
        Backend::Sqlite => "SELECT * FROM classes WHERE id = ?",
        Backend::MySql | Backend::Postgres => "SELECT * FROM classes WHERE id = ? FOR UPDATE",
    };
    sqlx::query_as::<_, Class>(&sql(conn, query))
        .bind(id.to_string())
        .fetch_optional(&mut *conn)
        .await
}

pub async fn list_classes(
    conn: &mut AnyConnection,
    limit: i64,
    offset: i64,
) -> Result<Vec<Class>, sqlx::Error> {
    sqlx::query_as::<_, Class>(&sql(
        conn,
        "SELECT * FROM classes ORDER BY name, id LIMIT ? OFFSET ?",
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(&mut *conn)
    .await
}

/// Persist every mutable column. Invariants are re-checked on the merged row.
pub async fn update_class(conn: &mut AnyConnection, class: &Class) -> HimResult<()> {
    class.check_invariants()?;

    sqlx::query(&sql(
        conn,
        r#"
        UPDATE classes SET
            name = ?, description = ?, room_id = ?, teacher_id = ?,
            start_date = ?, end_date = ?, cost = ?, max_capacity = ?
        WHERE id = ?
        "#,
    ))
    .bind(&class.name)
    .bind(&class.description)
    .bind(class.room_id.map(|id| id.to_string()))
    .bind(class.teacher_id.map(|id| id.to_string()))
    .bind(encode_date(class.start_date))
    .bind(encode_date(class.end_date))
    .bind(class.cost)
    .bind(class.max_capacity)
    .bind(class.id.to_string())
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Hard-delete a class and its enrollments.
pub async fn delete_class(conn: &mut AnyConnection, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(&sql(conn, "DELETE FROM classes WHERE id = ?"))
        .bind(id.to_string())
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected() > 0)
}
