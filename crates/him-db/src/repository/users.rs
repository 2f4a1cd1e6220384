//! User repository: CRUD operations for login accounts.

use him_common::{ids, models::user::User};
use sqlx::AnyConnection;
use uuid::Uuid;

use crate::any_compat::sql;

/// Create a new user.
pub async fn create_user(
    conn: &mut AnyConnection,
    email: &str,
    full_name: &str,
) -> Result<User, sqlx::Error> {
    let user = User {
        id: ids::new_id(),
        email: email.to_string(),
        full_name: full_name.to_string(),
    };

    sqlx::query(&sql(conn, "INSERT INTO users (id, email, full_name) VALUES (?, ?, ?)"))
        .bind(user.id.to_string())
        .bind(&user.email)
        .bind(&user.full_name)
        .execute(&mut *conn)
        .await?;

    Ok(user)
}

/// Find a user by their unique ID.
pub async fn find_by_id(conn: &mut AnyConnection, id: Uuid) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&sql(conn, "SELECT * FROM users WHERE id = ?"))
        .bind(id.to_string())
        .fetch_optional(&mut *conn)
        .await
}

pub async fn list_users(
    conn: &mut AnyConnection,
    limit: i64,
    offset: i64,
) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&sql(
        conn,
        "SELECT * FROM users ORDER BY id LIMIT ? OFFSET ?",
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(&mut *conn)
    .await
}

/// Persist every mutable column of `user`.
pub async fn update_user(conn: &mut AnyConnection, user: &User) -> Result<(), sqlx::Error> {
    sqlx::query(&sql(conn, "UPDATE users SET email = ?, full_name = ? WHERE id = ?"))
        .bind(&user.email)
        .bind(&user.full_name)
        .bind(user.id.to_string())
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Hard-delete a user. Returns whether a row was removed.
pub async fn delete_user(conn: &mut AnyConnection, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(&sql(conn, "DELETE FROM users WHERE id = ?"))
        .bind(id.to_string())
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected() > 0)
}
