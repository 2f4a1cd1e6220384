//! Department repository.
//!
//! A department's `custom_fields` must compile as a JSON schema; that check
//! runs on every create and update here, not in the routes.

use him_common::{
    custom_fields,
    error::{HimError, HimResult},
    ids,
    models::{
        class::Class,
        department::{CreateDepartmentRequest, Department},
    },
};
use sqlx::AnyConnection;
use uuid::Uuid;

use crate::any_compat::{encode_opt_json, encode_timestamp, sql};

pub async fn create_department(
    conn: &mut AnyConnection,
    req: CreateDepartmentRequest,
) -> HimResult<Department> {
    custom_fields::check_schema(req.custom_fields.as_ref())?;

    let department = Department {
        id: ids::new_id(),
        name: req.name,
        description: req.description,
        created_at: ids::now(),
        custom_fields: req.custom_fields,
    };

    sqlx::query(&sql(
        conn,
        "INSERT INTO departments (id, name, description, created_at, custom_fields) VALUES (?, ?, ?, ?, ?)",
    ))
    .bind(department.id.to_string())
    .bind(&department.name)
    .bind(&department.description)
    .bind(encode_timestamp(department.created_at))
    .bind(encode_opt_json(department.custom_fields.as_ref())?)
    .execute(&mut *conn)
    .await?;

    Ok(department)
}

pub async fn find_by_id(
    conn: &mut AnyConnection,
    id: Uuid,
) -> Result<Option<Department>, sqlx::Error> {
    sqlx::query_as::<_, Department>(&sql(conn, "SELECT * FROM departments WHERE id = ?"))
        .bind(id.to_string())
        .fetch_optional(&mut *conn)
        .await
}

pub async fn list_departments(
    conn: &mut AnyConnection,
    limit: i64,
    offset: i64,
) -> Result<Vec<Department>, sqlx::Error> {
    sqlx::query_as::<_, Department>(&sql(
        conn,
        "SELECT * FROM departments ORDER BY name, id LIMIT ? OFFSET ?",
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(&mut *conn)
    .await
}

/// Persist name, description and schema. Existing memberships are not
/// re-validated against a changed schema.
pub async fn update_department(conn: &mut AnyConnection, department: &Department) -> HimResult<()> {
    custom_fields::check_schema(department.custom_fields.as_ref())?;

    sqlx::query(&sql(
        conn,
        "UPDATE departments SET name = ?, description = ?, custom_fields = ? WHERE id = ?",
    ))
    .bind(&department.name)
    .bind(&department.description)
    .bind(encode_opt_json(department.custom_fields.as_ref())?)
    .bind(department.id.to_string())
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Hard-delete a department and its memberships.
///
/// Fails with a referential error while any class still belongs to it.
pub async fn delete_department(conn: &mut AnyConnection, id: Uuid) -> HimResult<bool> {
    let (classes,): (i64,) = sqlx::query_as(&sql(
        conn,
        "SELECT COUNT(*) FROM classes WHERE department_id = ?",
    ))
    .bind(id.to_string())
    .fetch_one(&mut *conn)
    .await?;
    if classes > 0 {
        return Err(HimError::Referential {
            message: format!("Department still has {classes} class(es)"),
        });
    }

    let result = sqlx::query(&sql(conn, "DELETE FROM departments WHERE id = ?"))
        .bind(id.to_string())
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn list_classes(
    conn: &mut AnyConnection,
    department_id: Uuid,
) -> Result<Vec<Class>, sqlx::Error> {
    sqlx::query_as::<_, Class>(&sql(
        conn,
        "SELECT * FROM classes WHERE department_id = ? ORDER BY start_date, name",
    ))
    .bind(department_id.to_string())
    .fetch_all(&mut *conn)
    .await
}
