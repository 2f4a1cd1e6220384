//! Department membership repository.
//!
//! All writes go through [`write_membership`], which loads the department in
//! the same session and validates `additional_fields` against its
//! `custom_fields` schema before touching the table. There is no way to
//! persist a membership that skips the check.

use him_common::{
    custom_fields,
    error::{HimError, HimResult},
    ids,
    models::department_member::DepartmentMember,
};
use sqlx::AnyConnection;
use uuid::Uuid;

use super::departments;
use crate::any_compat::{encode_opt_json, sql};

enum Write {
    Insert,
    Update,
}

async fn write_membership(
    conn: &mut AnyConnection,
    membership: &DepartmentMember,
    mode: Write,
) -> HimResult<()> {
    let department = departments::find_by_id(conn, membership.department_id)
        .await?
        .ok_or_else(|| HimError::not_found("Department"))?;

    custom_fields::validate_additional_fields(
        department.custom_fields.as_ref(),
        membership.additional_fields.as_ref(),
    )?;

    let fields = encode_opt_json(membership.additional_fields.as_ref())?;
    match mode {
        Write::Insert => {
            sqlx::query(&sql(
                conn,
                "INSERT INTO department_members (id, member_id, department_id, additional_fields) VALUES (?, ?, ?, ?)",
            ))
            .bind(membership.id.to_string())
            .bind(membership.member_id.to_string())
            .bind(membership.department_id.to_string())
            .bind(fields)
            .execute(&mut *conn)
            .await?;
        }
        Write::Update => {
            sqlx::query(&sql(
                conn,
                "UPDATE department_members SET additional_fields = ? WHERE id = ?",
            ))
            .bind(fields)
            .bind(membership.id.to_string())
            .execute(&mut *conn)
            .await?;
        }
    }

    Ok(())
}

/// Add a member to a department.
pub async fn add_member(
    conn: &mut AnyConnection,
    department_id: Uuid,
    member_id: Uuid,
    additional_fields: Option<serde_json::Value>,
) -> HimResult<DepartmentMember> {
    let membership = DepartmentMember {
        id: ids::new_id(),
        member_id,
        department_id,
        additional_fields,
    };
    write_membership(conn, &membership, Write::Insert).await?;

    tracing::debug!(
        membership_id = %membership.id,
        %member_id,
        %department_id,
        "Member added to department"
    );
    Ok(membership)
}

/// Replace a membership's additional fields.
pub async fn update_additional_fields(
    conn: &mut AnyConnection,
    id: Uuid,
    additional_fields: Option<serde_json::Value>,
) -> HimResult<DepartmentMember> {
    let mut membership = find_by_id(conn, id)
        .await?
        .ok_or_else(|| HimError::not_found("Department membership"))?;
    membership.additional_fields = additional_fields;
    write_membership(conn, &membership, Write::Update).await?;
    Ok(membership)
}

pub async fn find_by_id(
    conn: &mut AnyConnection,
    id: Uuid,
) -> Result<Option<DepartmentMember>, sqlx::Error> {
    sqlx::query_as::<_, DepartmentMember>(&sql(conn, "SELECT * FROM department_members WHERE id = ?"))
        .bind(id.to_string())
        .fetch_optional(&mut *conn)
        .await
}

pub async fn list_for_department(
    conn: &mut AnyConnection,
    department_id: Uuid,
    limit: i64,
    offset: i64,
) -> Result<Vec<DepartmentMember>, sqlx::Error> {
    sqlx::query_as::<_, DepartmentMember>(&sql(
        conn,
        "SELECT * FROM department_members WHERE department_id = ? ORDER BY id LIMIT ? OFFSET ?",
    ))
    .bind(department_id.to_string())
    .bind(limit)
    .bind(offset)
    .fetch_all(&mut *conn)
    .await
}

pub async fn remove_member(conn: &mut AnyConnection, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(&sql(conn, "DELETE FROM department_members WHERE id = ?"))
        .bind(id.to_string())
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected() > 0)
}
