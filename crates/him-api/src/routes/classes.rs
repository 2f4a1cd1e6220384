//! Class routes: classes, enrollments and attendance.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get, put},
    Router,
};
use him_common::{
    error::{HimError, HimResult},
    models::{
        class::{Class, CreateClassRequest, UpdateClassRequest},
        member_class::{EnrollRequest, MarkAttendanceRequest, MemberClass},
        Pagination,
    },
    validation::validate_request,
};
use him_db::repository::{classes, member_classes};
use sqlx::AnyConnection;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    extract::{Json, Path, Query},
    AppState,
};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/classes", get(list_classes).post(create_class))
        .route(
            "/classes/{class_id}",
            get(get_class).patch(update_class).delete(delete_class),
        )
        .route(
            "/classes/{class_id}/enrollments",
            get(list_enrollments).post(enroll),
        )
        .route(
            "/classes/{class_id}/enrollments/{enrollment_id}",
            delete(unenroll),
        )
        .route(
            "/classes/{class_id}/enrollments/{enrollment_id}/attendance",
            put(mark_attendance),
        )
}

/// POST /api/v1/classes
async fn create_class(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateClassRequest>,
) -> HimResult<(StatusCode, Json<Class>)> {
    validate_request(&body)?;

    let class = state
        .db
        .unit_of_work(move |s| Box::pin(async move { classes::create_class(s, body).await }))
        .await?;

    tracing::info!(class_id = %class.id, department_id = %class.department_id, "Class created");
    Ok((StatusCode::CREATED, Json(class)))
}

/// GET /api/v1/classes
async fn list_classes(
    State(state): State<Arc<AppState>>,
    Query(page): Query<Pagination>,
) -> HimResult<Json<Vec<Class>>> {
    let list = state
        .db
        .unit_of_work(move |s| {
            Box::pin(async move { Ok(classes::list_classes(s, page.limit(), page.offset()).await?) })
        })
        .await?;
    Ok(Json(list))
}

/// GET /api/v1/classes/{class_id}
async fn get_class(
    State(state): State<Arc<AppState>>,
    Path(class_id): Path<Uuid>,
) -> HimResult<Json<Class>> {
    let class = state
        .db
        .unit_of_work(move |s| Box::pin(async move { load_class(s, class_id).await }))
        .await?;
    Ok(Json(class))
}

/// PATCH /api/v1/classes/{class_id}: invariants are checked on the merged class.
async fn update_class(
    State(state): State<Arc<AppState>>,
    Path(class_id): Path<Uuid>,
    Json(body): Json<UpdateClassRequest>,
) -> HimResult<Json<Class>> {
    validate_request(&body)?;

    let class = state
        .db
        .unit_of_work(move |s| {
            Box::pin(async move {
                let mut class = load_class(s, class_id).await?;
                class.apply(body);
                classes::update_class(s, &class).await?;
                Ok(class)
            })
        })
        .await?;
    Ok(Json(class))
}

/// DELETE /api/v1/classes/{class_id}
async fn delete_class(
    State(state): State<Arc<AppState>>,
    Path(class_id): Path<Uuid>,
) -> HimResult<StatusCode> {
    let deleted = state
        .db
        .unit_of_work(move |s| Box::pin(async move { Ok(classes::delete_class(s, class_id).await?) }))
        .await?;

    if !deleted {
        return Err(HimError::not_found("Class"));
    }
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================
// Enrollments
// ============================================================

/// GET /api/v1/classes/{class_id}/enrollments
async fn list_enrollments(
    State(state): State<Arc<AppState>>,
    Path(class_id): Path<Uuid>,
) -> HimResult<Json<Vec<MemberClass>>> {
    let list = state
        .db
        .unit_of_work(move |s| {
            Box::pin(async move {
                load_class(s, class_id).await?;
                Ok(member_classes::list_for_class(s, class_id).await?)
            })
        })
        .await?;
    Ok(Json(list))
}

/// POST /api/v1/classes/{class_id}/enrollments: 409 once the class is full.
async fn enroll(
    State(state): State<Arc<AppState>>,
    Path(class_id): Path<Uuid>,
    Json(body): Json<EnrollRequest>,
) -> HimResult<(StatusCode, Json<MemberClass>)> {
    let enrollment = state
        .db
        .unit_of_work(move |s| {
            Box::pin(async move { member_classes::enroll(s, class_id, body.member_id).await })
        })
        .await?;
    Ok((StatusCode::CREATED, Json(enrollment)))
}

/// PUT /api/v1/classes/{class_id}/enrollments/{enrollment_id}/attendance
async fn mark_attendance(
    State(state): State<Arc<AppState>>,
    Path((class_id, enrollment_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<MarkAttendanceRequest>,
) -> HimResult<Json<MemberClass>> {
    let enrollment = state
        .db
        .unit_of_work(move |s| {
            Box::pin(async move {
                load_enrollment(s, class_id, enrollment_id).await?;
                member_classes::mark_attendance(s, enrollment_id, body.date, body.status).await
            })
        })
        .await?;
    Ok(Json(enrollment))
}

/// DELETE /api/v1/classes/{class_id}/enrollments/{enrollment_id}
async fn unenroll(
    State(state): State<Arc<AppState>>,
    Path((class_id, enrollment_id)): Path<(Uuid, Uuid)>,
) -> HimResult<StatusCode> {
    state
        .db
        .unit_of_work(move |s| {
            Box::pin(async move {
                load_enrollment(s, class_id, enrollment_id).await?;
                member_classes::unenroll(s, enrollment_id).await?;
                Ok(())
            })
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn load_class(conn: &mut AnyConnection, id: Uuid) -> HimResult<Class> {
    classes::find_by_id(conn, id)
        .await?
        .ok_or_else(|| HimError::not_found("Class"))
}

async fn load_enrollment(
    conn: &mut AnyConnection,
    class_id: Uuid,
    enrollment_id: Uuid,
) -> HimResult<MemberClass> {
    member_classes::find_by_id(conn, enrollment_id)
        .await?
        .filter(|e| e.class_id == class_id)
        .ok_or_else(|| HimError::not_found("Enrollment"))
}
