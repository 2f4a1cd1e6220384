//! Room repository.

use him_common::{
    error::HimResult,
    ids,
    models::room::{CreateRoomRequest, Room},
};
use sqlx::AnyConnection;
use uuid::Uuid;

use crate::any_compat::sql;

pub async fn create_room(conn: &mut AnyConnection, req: CreateRoomRequest) -> HimResult<Room> {
    let room = Room {
        id: ids::new_id(),
        name: req.name,
        capacity: req.capacity,
        location: req.location,
        description: req.description,
    };
    room.check_invariants()?;

    sqlx::query(&sql(
        conn,
        "INSERT INTO rooms (id, name, capacity, location, description) VALUES (?, ?, ?, ?, ?)",
    ))
    .bind(room.id.to_string())
    .bind(&room.name)
    .bind(room.capacity)
    .bind(&room.location)
    .bind(&room.description)
    .execute(&mut *conn)
    .await?;

    Ok(room)
}

pub async fn find_by_id(conn: &mut AnyConnection, id: Uuid) -> Result<Option<Room>, sqlx::Error> {
    sqlx::query_as::<_, Room>(&sql(conn, "SELECT * FROM rooms WHERE id = ?"))
        .bind(id.to_string())
        .fetch_optional(&mut *conn)
        .await
}

pub async fn list_rooms(
    conn: &mut AnyConnection,
    limit: i64,
    offset: i64,
) -> Result<Vec<Room>, sqlx::Error> {
    sqlx::query_as::<_, Room>(&sql(conn, "SELECT * FROM rooms ORDER BY name, id LIMIT ? OFFSET ?"))
        .bind(limit)
        .bind(offset)
        .fetch_all(&mut *conn)
        .await
}

pub async fn update_room(conn: &mut AnyConnection, room: &Room) -> HimResult<()> {
    room.check_invariants()?;

    sqlx::query(&sql(
        conn,
        "UPDATE rooms SET name = ?, capacity = ?, location = ?, description = ? WHERE id = ?",
    ))
    .bind(&room.name)
    .bind(room.capacity)
    .bind(&room.location)
    .bind(&room.description)
    .bind(room.id.to_string())
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Hard-delete a room; classes held there lose their room assignment.
pub async fn delete_room(conn: &mut AnyConnection, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(&sql(conn, "DELETE FROM rooms WHERE id = ?"))
        .bind(id.to_string())
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected() > 0)
}
