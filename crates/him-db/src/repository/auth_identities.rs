//! Third-party identity repository.

use him_common::{
    ids,
    models::auth_identity::{AuthIdentity, Provider},
};
use sqlx::AnyConnection;
use uuid::Uuid;

use crate::any_compat::sql;

/// Link a provider account to a member.
///
/// A (provider, provider_id) pair already linked to anyone fails with a
/// unique violation.
pub async fn link_identity(
    conn: &mut AnyConnection,
    member_id: Uuid,
    provider: Provider,
    provider_id: &str,
) -> Result<AuthIdentity, sqlx::Error> {
    let identity = AuthIdentity {
        id: ids::new_id(),
        user_id: member_id,
        provider,
        provider_id: provider_id.to_string(),
    };

    sqlx::query(&sql(
        conn,
        "INSERT INTO auth_identities (id, user_id, provider, provider_id) VALUES (?, ?, ?, ?)",
    ))
    .bind(identity.id.to_string())
    .bind(identity.user_id.to_string())
    .bind(identity.provider.as_str())
    .bind(&identity.provider_id)
    .execute(&mut *conn)
    .await?;

    Ok(identity)
}

pub async fn find_by_id(
    conn: &mut AnyConnection,
    id: Uuid,
) -> Result<Option<AuthIdentity>, sqlx::Error> {
    sqlx::query_as::<_, AuthIdentity>(&sql(conn, "SELECT * FROM auth_identities WHERE id = ?"))
        .bind(id.to_string())
        .fetch_optional(&mut *conn)
        .await
}

pub async fn find_by_provider(
    conn: &mut AnyConnection,
    provider: Provider,
    provider_id: &str,
) -> Result<Option<AuthIdentity>, sqlx::Error> {
    sqlx::query_as::<_, AuthIdentity>(&sql(
        conn,
        "SELECT * FROM auth_identities WHERE provider = ? AND provider_id = ?",
    ))
    .bind(provider.as_str())
    .bind(provider_id)
    .fetch_optional(&mut *conn)
    .await
}

pub async fn list_for_member(
    conn: &mut AnyConnection,
    member_id: Uuid,
) -> Result<Vec<AuthIdentity>, sqlx::Error> {
    sqlx::query_as::<_, AuthIdentity>(&sql(
        conn,
        "SELECT * FROM auth_identities WHERE user_id = ? ORDER BY provider, id",
    ))
    .bind(member_id.to_string())
    .fetch_all(&mut *conn)
    .await
}

pub async fn unlink_identity(conn: &mut AnyConnection, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(&sql(conn, "DELETE FROM auth_identities WHERE id = ?"))
        .bind(id.to_string())
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected() > 0)
}
