//! Room routes.

use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Router,
};
use him_common::{
    error::{HimError, HimResult},
    models::{
        room::{CreateRoomRequest, Room, UpdateRoomRequest},
        Pagination,
    },
    validation::validate_request,
};
use him_db::repository::rooms;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    extract::{Json, Path, Query},
    AppState,
};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/rooms", get(list_rooms).post(create_room))
        .route(
            "/rooms/{room_id}",
            get(get_room).patch(update_room).delete(delete_room),
        )
}

async fn create_room(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateRoomRequest>,
) -> HimResult<(StatusCode, Json<Room>)> {
    validate_request(&body)?;

    let room = state
        .db
        .unit_of_work(move |s| Box::pin(async move { rooms::create_room(s, body).await }))
        .await?;
    Ok((StatusCode::CREATED, Json(room)))
}

async fn list_rooms(
    State(state): State<Arc<AppState>>,
    Query(page): Query<Pagination>,
) -> HimResult<Json<Vec<Room>>> {
    let list = state
        .db
        .unit_of_work(move |s| {
            Box::pin(async move { Ok(rooms::list_rooms(s, page.limit(), page.offset()).await?) })
        })
        .await?;
    Ok(Json(list))
}

async fn get_room(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<Uuid>,
) -> HimResult<Json<Room>> {
    let room = state
        .db
        .unit_of_work(move |s| {
            Box::pin(async move {
                rooms::find_by_id(s, room_id)
                    .await?
                    .ok_or_else(|| HimError::not_found("Room"))
            })
        })
        .await?;
    Ok(Json(room))
}

async fn update_room(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<Uuid>,
    Json(body): Json<UpdateRoomRequest>,
) -> HimResult<Json<Room>> {
    validate_request(&body)?;

    let room = state
        .db
        .unit_of_work(move |s| {
            Box::pin(async move {
                let mut room = rooms::find_by_id(s, room_id)
                    .await?
                    .ok_or_else(|| HimError::not_found("Room"))?;
                room.apply(body);
                rooms::update_room(s, &room).await?;
                Ok(room)
            })
        })
        .await?;
    Ok(Json(room))
}

/// Classes held in the room stay, without a room.
async fn delete_room(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<Uuid>,
) -> HimResult<StatusCode> {
    let deleted = state
        .db
        .unit_of_work(move |s| Box::pin(async move { Ok(rooms::delete_room(s, room_id).await?) }))
        .await?;

    if !deleted {
        return Err(HimError::not_found("Room"));
    }
    Ok(StatusCode::NO_CONTENT)
}
