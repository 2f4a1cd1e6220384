//! Enrollment repository: members in classes, and their attendance.
//!
//! Re-enrolling a member in the same class is allowed; each enrollment keeps
//! its own attendance record.

use chrono::NaiveDate;
use him_common::{
    error::{HimError, HimResult},
    ids,
    models::member_class::{Attendance, AttendanceStatus, MemberClass},
};
use sqlx::AnyConnection;
use uuid::Uuid;

use super::classes;
use crate::any_compat::{encode_json, encode_timestamp, sql};

/// Enroll a member, refusing once the class holds `max_capacity` enrollments.
///
/// The class row stays locked until the session ends, so concurrent
/// enrollments into one class count one after another.
pub async fn enroll(
    conn: &mut AnyConnection,
    class_id: Uuid,
    member_id: Uuid,
) -> HimResult<MemberClass> {
    let class = classes::find_for_update(conn, class_id)
        .await?
        .ok_or_else(|| HimError::not_found("Class"))?;

    if let Some(max) = class.max_capacity {
        let enrolled = count_for_class(conn, class_id).await?;
        if enrolled >= max {
            return Err(HimError::LimitReached {
                message: format!("Class '{}' is full ({max} enrolled)", class.name),
            });
        }
    }

    let enrollment = MemberClass {
        id: ids::new_id(),
        member_id,
        class_id,
        enrolled_at: ids::now(),
        attendance: Attendance::new(),
    };

    sqlx::query(&sql(
        conn,
        "INSERT INTO member_classes (id, member_id, class_id, enrolled_at, attendance) VALUES (?, ?, ?, ?, ?)",
    ))
    .bind(enrollment.id.to_string())
    .bind(enrollment.member_id.to_string())
    .bind(enrollment.class_id.to_string())
    .bind(encode_timestamp(enrollment.enrolled_at))
    .bind(encode_json(&enrollment.attendance)?)
    .execute(&mut *conn)
    .await?;

    tracing::debug!(enrollment_id = %enrollment.id, %member_id, %class_id, "Member enrolled");
    Ok(enrollment)
}

pub async fn find_by_id(
    conn: &mut AnyConnection,
    id: Uuid,
) -> Result<Option<MemberClass>, sqlx::Error> {
    sqlx::query_as::<_, MemberClass>(&sql(conn, "SELECT * FROM member_classes WHERE id = ?"))
        .bind(id.to_string())
        .fetch_optional(&mut *conn)
        .await
}

pub async fn count_for_class(conn: &mut AnyConnection, class_id: Uuid) -> Result<i64, sqlx::Error> {
    let row: (i64,) = sqlx::query_as(&sql(
        conn,
        "SELECT COUNT(*) FROM member_classes WHERE class_id = ?",
    ))
    .bind(class_id.to_string())
    .fetch_one(&mut *conn)
    .await?;
    Ok(row.0)
}

pub async fn list_for_class(
    conn: &mut AnyConnection,
    class_id: Uuid,
) -> Result<Vec<MemberClass>, sqlx::Error> {
    sqlx::query_as::<_, MemberClass>(&sql(
        conn,
        "SELECT * FROM member_classes WHERE class_id = ? ORDER BY enrolled_at, id",
    ))
    .bind(class_id.to_string())
    .fetch_all(&mut *conn)
    .await
}

pub async fn list_for_member(
    conn: &mut AnyConnection,
    member_id: Uuid,
) -> Result<Vec<MemberClass>, sqlx::Error> {
    sqlx::query_as::<_, MemberClass>(&sql(
        conn,
        "SELECT * FROM member_classes WHERE member_id = ? ORDER BY enrolled_at, id",
    ))
    .bind(member_id.to_string())
    .fetch_all(&mut *conn)
    .await
}

/// Record (or overwrite) the status for one date.
pub async fn mark_attendance(
    conn: &mut AnyConnection,
    id: Uuid,
    date: NaiveDate,
    status: AttendanceStatus,
) -> HimResult<MemberClass> {
    let mut enrollment = find_by_id(conn, id)
        .await?
        .ok_or_else(|| HimError::not_found("Enrollment"))?;
    enrollment.attendance.insert(date, status);

    sqlx::query(&sql(conn, "UPDATE member_classes SET attendance = ? WHERE id = ?"))
        .bind(encode_json(&enrollment.attendance)?)
        .bind(enrollment.id.to_string())
        .execute(&mut *conn)
        .await?;

    Ok(enrollment)
}

pub async fn unenroll(conn: &mut AnyConnection, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(&sql(conn, "DELETE FROM member_classes WHERE id = ?"))
        .bind(id.to_string())
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected() > 0)
}
