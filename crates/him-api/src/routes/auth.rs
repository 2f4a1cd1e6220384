//! Auth routes: linking provider identities and exchanging them for tokens.
//!
//! The provider handshake happens outside this service; callers present the
//! provider account id they were issued. Linking and unlinking need a bearer
//! token, so a provider account can only be attached by its member or by a
//! leader. The first token for a fresh deployment comes from
//! `him --issue-token <MEMBER_ID>`.

use axum::{
    extract::{Extension, State},
    http::StatusCode,
    middleware,
    routing::{delete, get, post},
    Router,
};
use him_common::{
    error::{HimError, HimResult},
    models::{
        auth_identity::{AuthIdentity, LinkIdentityRequest, LoginRequest},
        member::{Member, Role},
    },
    validation::validate_request,
};
use him_db::repository::{auth_identities, members};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    auth::{self, TokenResponse},
    extract::{Json, Path},
    middleware::AuthContext,
    AppState,
};

pub fn router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let protected = Router::new()
        .route("/auth/me", get(me))
        .route("/auth/identities", post(link_identity))
        .route("/auth/identities/{identity_id}", delete(unlink_identity))
        .route_layer(middleware::from_fn_with_state(
            state,
            crate::middleware::auth_middleware,
        ));

    Router::new()
        .route("/auth/login", post(login))
        .merge(protected)
}

/// A caller manages their own identities; leaders manage anyone's.
async fn require_identity_owner(
    conn: &mut sqlx::AnyConnection,
    caller_id: Uuid,
    owner_id: Uuid,
) -> HimResult<()> {
    if caller_id == owner_id {
        return Ok(());
    }
    let caller = members::find_by_id(conn, caller_id)
        .await?
        .ok_or(HimError::InvalidToken)?;
    if caller.role == Role::Leader {
        return Ok(());
    }
    Err(HimError::Forbidden {
        message: "Identities can only be managed by their member or a leader".into(),
    })
}

/// POST /api/v1/auth/identities
async fn link_identity(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<LinkIdentityRequest>,
) -> HimResult<(StatusCode, Json<AuthIdentity>)> {
    validate_request(&body)?;
    let caller_id = auth.member_id;

    let identity = state
        .db
        .unit_of_work(move |s| {
            Box::pin(async move {
                require_identity_owner(s, caller_id, body.member_id).await?;
                members::find_by_id(s, body.member_id)
                    .await?
                    .ok_or_else(|| HimError::not_found("Member"))?;
                Ok(auth_identities::link_identity(
                    s,
                    body.member_id,
                    body.provider,
                    &body.provider_id,
                )
                .await?)
            })
        })
        .await?;

    tracing::info!(
        member_id = %identity.user_id,
        linked_by = %caller_id,
        provider = identity.provider.as_str(),
        "Identity linked"
    );
    Ok((StatusCode::CREATED, Json(identity)))
}

/// DELETE /api/v1/auth/identities/{identity_id}
async fn unlink_identity(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path(identity_id): Path<Uuid>,
) -> HimResult<StatusCode> {
    let caller_id = auth.member_id;
    state
        .db
        .unit_of_work(move |s| {
            Box::pin(async move {
                let identity = auth_identities::find_by_id(s, identity_id)
                    .await?
                    .ok_or_else(|| HimError::not_found("Identity"))?;
                require_identity_owner(s, caller_id, identity.user_id).await?;
                auth_identities::unlink_identity(s, identity_id).await?;
                Ok(())
            })
        })
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/auth/login: a linked identity yields an access token.
async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> HimResult<Json<TokenResponse>> {
    validate_request(&body)?;

    let identity = state
        .db
        .unit_of_work(move |s| {
            Box::pin(async move {
                Ok(auth_identities::find_by_provider(s, body.provider, &body.provider_id).await?)
            })
        })
        .await?
        .ok_or(HimError::Unauthorized)?;

    let ttl = state.settings.access_token_ttl_secs();
    let access_token = auth::generate_access_token(identity.user_id, &state.settings.secret_key, ttl)
        .map_err(|e| HimError::Internal(e.into()))?;

    tracing::info!(member_id = %identity.user_id, "Access token issued");
    Ok(Json(TokenResponse {
        access_token,
        token_type: "Bearer".into(),
        expires_in: ttl,
    }))
}

/// GET /api/v1/auth/me: the member behind the bearer token.
async fn me(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
) -> HimResult<Json<Member>> {
    let member = state
        .db
        .unit_of_work(move |s| {
            Box::pin(async move {
                members::find_by_id(s, auth.member_id)
                    .await?
                    .ok_or_else(|| HimError::not_found("Member"))
            })
        })
        .await?;
    Ok(Json(member))
}
