//! User routes: login accounts.

use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Router,
};
use him_common::{
    error::{HimError, HimResult},
    models::{
        user::{CreateUserRequest, UpdateUserRequest, User},
        Pagination,
    },
    validation::validate_request,
};
use him_db::repository::users;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    extract::{Json, Path, Query},
    AppState,
};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/{user_id}",
            get(get_user).patch(update_user).delete(delete_user),
        )
}

/// POST /api/v1/users
async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateUserRequest>,
) -> HimResult<(StatusCode, Json<User>)> {
    validate_request(&body)?;

    let user = state
        .db
        .unit_of_work(move |s| {
            Box::pin(async move { Ok(users::create_user(s, &body.email, &body.full_name).await?) })
        })
        .await?;

    tracing::info!(user_id = %user.id, "User created");
    Ok((StatusCode::CREATED, Json(user)))
}

/// GET /api/v1/users
async fn list_users(
    State(state): State<Arc<AppState>>,
    Query(page): Query<Pagination>,
) -> HimResult<Json<Vec<User>>> {
    let list = state
        .db
        .unit_of_work(move |s| {
            Box::pin(async move { Ok(users::list_users(s, page.limit(), page.offset()).await?) })
        })
        .await?;
    Ok(Json(list))
}

/// GET /api/v1/users/{user_id}
async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> HimResult<Json<User>> {
    let user = state
        .db
        .unit_of_work(move |s| {
            Box::pin(async move {
                users::find_by_id(s, user_id)
                    .await?
                    .ok_or_else(|| HimError::not_found("User"))
            })
        })
        .await?;
    Ok(Json(user))
}

/// PATCH /api/v1/users/{user_id}
async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
    Json(body): Json<UpdateUserRequest>,
) -> HimResult<Json<User>> {
    validate_request(&body)?;

    let user = state
        .db
        .unit_of_work(move |s| {
            Box::pin(async move {
                let mut user = users::find_by_id(s, user_id)
                    .await?
                    .ok_or_else(|| HimError::not_found("User"))?;
                user.apply(body);
                users::update_user(s, &user).await?;
                Ok(user)
            })
        })
        .await?;
    Ok(Json(user))
}

/// DELETE /api/v1/users/{user_id}
async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> HimResult<StatusCode> {
    let deleted = state
        .db
        .unit_of_work(move |s| Box::pin(async move { Ok(users::delete_user(s, user_id).await?) }))
        .await?;

    if !deleted {
        return Err(HimError::not_found("User"));
    }
    Ok(StatusCode::NO_CONTENT)
}
