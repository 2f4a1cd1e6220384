//! Member repository: the people the church tracks, and the departments
//! they belong to.

use him_common::{
    ids,
    models::{
        department::Department,
        member::{CreateMemberRequest, Member},
    },
};
use sqlx::AnyConnection;
use uuid::Uuid;

use crate::any_compat::{encode_date, encode_json, encode_opt_json, encode_timestamp, sql};

/// Create a member. `created_at` and `updated_at` are both stamped now.
pub async fn create_member(
    conn: &mut AnyConnection,
    req: CreateMemberRequest,
) -> Result<Member, sqlx::Error> {
    let now = ids::now();
    let member = Member {
        id: ids::new_id(),
        full_name: req.full_name,
        birthday: req.birthday,
        personal_phone: req.personal_phone,
        work_phone: req.work_phone,
        mobile_phone: req.mobile_phone,
        address: req.address,
        email: req.email,
        ssn: req.ssn,
        role: req.role,
        line_id: req.line_id,
        photo: None,
        parents: req.parents,
        family_members: req.family_members,
        additional_fields: req.additional_fields,
        created_at: now,
        updated_at: now,
    };

    sqlx::query(&sql(
        conn,
        r#"
        INSERT INTO members (
            id, full_name, birthday, personal_phone, work_phone, mobile_phone,
            address, email, ssn, role, line_id, photo, parents, family_members,
            additional_fields, created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    ))
    .bind(member.id.to_string())
    .bind(&member.full_name)
    .bind(encode_date(member.birthday))
    .bind(&member.personal_phone)
    .bind(&member.work_phone)
    .bind(&member.mobile_phone)
    .bind(&member.address)
    .bind(&member.email)
    .bind(&member.ssn)
    .bind(member.role.as_str())
    .bind(&member.line_id)
    .bind(&member.photo)
    .bind(encode_json(&member.parents)?)
    .bind(encode_json(&member.family_members)?)
    .bind(encode_opt_json(member.additional_fields.as_ref())?)
    .bind(encode_timestamp(member.created_at))
    .bind(encode_timestamp(member.updated_at))
    .execute(&mut *conn)
    .await?;

    Ok(member)
}

pub async fn find_by_id(conn: &mut AnyConnection, id: Uuid) -> Result<Option<Member>, sqlx::Error> {
    sqlx::query_as::<_, Member>(&sql(conn, "SELECT * FROM members WHERE id = ?"))
        .bind(id.to_string())
        .fetch_optional(&mut *conn)
        .await
}

/// List members ordered by name.
pub async fn list_members(
    conn: &mut AnyConnection,
    limit: i64,
    offset: i64,
) -> Result<Vec<Member>, sqlx::Error> {
    sqlx::query_as::<_, Member>(&sql(
        conn,
        "SELECT * FROM members ORDER BY full_name, id LIMIT ? OFFSET ?",
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(&mut *conn)
    .await
}

/// Persist every mutable column of `member` and refresh `updated_at`.
///
/// `created_at` is never written after insert.
pub async fn update_member(conn: &mut AnyConnection, member: &mut Member) -> Result<(), sqlx::Error> {
    member.updated_at = ids::now();

    sqlx::query(&sql(
        conn,
        r#"
        UPDATE members SET
            full_name = ?, birthday = ?, personal_phone = ?, work_phone = ?,
            mobile_phone = ?, address = ?, email = ?, ssn = ?, role = ?,
            line_id = ?, photo = ?, parents = ?, family_members = ?,
            additional_fields = ?, updated_at = ?
        WHERE id = ?
        "#,
    ))
    .bind(&member.full_name)
    .bind(encode_date(member.birthday))
    .bind(&member.personal_phone)
    .bind(&member.work_phone)
    .bind(&member.mobile_phone)
    .bind(&member.address)
    .bind(&member.email)
    .bind(&member.ssn)
    .bind(member.role.as_str())
    .bind(&member.line_id)
    .bind(&member.photo)
    .bind(encode_json(&member.parents)?)
    .bind(encode_json(&member.family_members)?)
    .bind(encode_opt_json(member.additional_fields.as_ref())?)
    .bind(encode_timestamp(member.updated_at))
    .bind(member.id.to_string())
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Hard-delete a member. Memberships, enrollments and linked identities go
/// with it; classes they taught keep running without a teacher.
pub async fn delete_member(conn: &mut AnyConnection, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(&sql(conn, "DELETE FROM members WHERE id = ?"))
        .bind(id.to_string())
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Departments the member belongs to, by department name.
pub async fn list_departments(
    conn: &mut AnyConnection,
    member_id: Uuid,
) -> Result<Vec<Department>, sqlx::Error> {
    sqlx::query_as::<_, Department>(&sql(
        conn,
        r#"
        SELECT d.* FROM departments d
        INNER JOIN department_members dm ON dm.department_id = d.id
        WHERE dm.member_id = ?
        ORDER BY d.name
        "#,
    ))
    .bind(member_id.to_string())
    .fetch_all(&mut *conn)
    .await
}
