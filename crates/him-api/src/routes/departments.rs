//! Department routes: departments, their memberships and their classes.
//!
//! Membership writes are validated against the department's `custom_fields`
//! schema inside the repository; a mismatch comes back as 422 with the JSON
//! pointer of the offending value.

use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Router,
};
use him_common::{
    error::{HimError, HimResult},
    models::{
        class::Class,
        department::{CreateDepartmentRequest, Department, UpdateDepartmentRequest},
        department_member::{
            AddDepartmentMemberRequest, DepartmentMember, UpdateDepartmentMemberRequest,
        },
        Pagination,
    },
    validation::validate_request,
};
use him_db::repository::{department_members, departments};
use sqlx::AnyConnection;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    extract::{Json, Path, Query},
    AppState,
};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/departments", get(list_departments).post(create_department))
        .route(
            "/departments/{department_id}",
            get(get_department)
                .patch(update_department)
                .delete(delete_department),
        )
        .route(
            "/departments/{department_id}/members",
            get(list_members).post(add_member),
        )
        .route(
            "/departments/{department_id}/members/{membership_id}",
            axum::routing::patch(update_membership).delete(remove_member),
        )
        .route("/departments/{department_id}/classes", get(list_classes))
}

/// POST /api/v1/departments
async fn create_department(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateDepartmentRequest>,
) -> HimResult<(StatusCode, Json<Department>)> {
    validate_request(&body)?;

    let department = state
        .db
        .unit_of_work(move |s| {
            Box::pin(async move { departments::create_department(s, body).await })
        })
        .await?;

    tracing::info!(department_id = %department.id, name = %department.name, "Department created");
    Ok((StatusCode::CREATED, Json(department)))
}

/// GET /api/v1/departments
async fn list_departments(
    State(state): State<Arc<AppState>>,
    Query(page): Query<Pagination>,
) -> HimResult<Json<Vec<Department>>> {
    let list = state
        .db
        .unit_of_work(move |s| {
            Box::pin(async move {
                Ok(departments::list_departments(s, page.limit(), page.offset()).await?)
            })
        })
        .await?;
    Ok(Json(list))
}

/// GET /api/v1/departments/{department_id}
async fn get_department(
    State(state): State<Arc<AppState>>,
    Path(department_id): Path<Uuid>,
) -> HimResult<Json<Department>> {
    let department = state
        .db
        .unit_of_work(move |s| Box::pin(async move { load_department(s, department_id).await }))
        .await?;
    Ok(Json(department))
}

/// PATCH /api/v1/departments/{department_id}
///
/// Existing memberships are not re-validated when the schema changes.
async fn update_department(
    State(state): State<Arc<AppState>>,
    Path(department_id): Path<Uuid>,
    Json(body): Json<UpdateDepartmentRequest>,
) -> HimResult<Json<Department>> {
    validate_request(&body)?;

    let department = state
        .db
        .unit_of_work(move |s| {
            Box::pin(async move {
                let mut department = load_department(s, department_id).await?;
                department.apply(body);
                departments::update_department(s, &department).await?;
                Ok(department)
            })
        })
        .await?;
    Ok(Json(department))
}

/// DELETE /api/v1/departments/{department_id}: 409 while classes remain.
async fn delete_department(
    State(state): State<Arc<AppState>>,
    Path(department_id): Path<Uuid>,
) -> HimResult<StatusCode> {
    let deleted = state
        .db
        .unit_of_work(move |s| {
            Box::pin(async move { departments::delete_department(s, department_id).await })
        })
        .await?;

    if !deleted {
        return Err(HimError::not_found("Department"));
    }
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================
// Memberships
// ============================================================

/// GET /api/v1/departments/{department_id}/members
async fn list_members(
    State(state): State<Arc<AppState>>,
    Path(department_id): Path<Uuid>,
    Query(page): Query<Pagination>,
) -> HimResult<Json<Vec<DepartmentMember>>> {
    let list = state
        .db
        .unit_of_work(move |s| {
            Box::pin(async move {
                load_department(s, department_id).await?;
                Ok(department_members::list_for_department(
                    s,
                    department_id,
                    page.limit(),
                    page.offset(),
                )
                .await?)
            })
        })
        .await?;
    Ok(Json(list))
}

/// POST /api/v1/departments/{department_id}/members
async fn add_member(
    State(state): State<Arc<AppState>>,
    Path(department_id): Path<Uuid>,
    Json(body): Json<AddDepartmentMemberRequest>,
) -> HimResult<(StatusCode, Json<DepartmentMember>)> {
    validate_request(&body)?;

    let membership = state
        .db
        .unit_of_work(move |s| {
            Box::pin(async move {
                department_members::add_member(
                    s,
                    department_id,
                    body.member_id,
                    body.additional_fields,
                )
                .await
            })
        })
        .await?;
    Ok((StatusCode::CREATED, Json(membership)))
}

/// PATCH /api/v1/departments/{department_id}/members/{membership_id}
async fn update_membership(
    State(state): State<Arc<AppState>>,
    Path((department_id, membership_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<UpdateDepartmentMemberRequest>,
) -> HimResult<Json<DepartmentMember>> {
    validate_request(&body)?;

    let membership = state
        .db
        .unit_of_work(move |s| {
            Box::pin(async move {
                let membership = load_membership(s, department_id, membership_id).await?;
                match body.additional_fields {
                    Some(fields) => {
                        department_members::update_additional_fields(s, membership_id, fields)
                            .await
                    }
                    None => Ok(membership),
                }
            })
        })
        .await?;
    Ok(Json(membership))
}

/// DELETE /api/v1/departments/{department_id}/members/{membership_id}
async fn remove_member(
    State(state): State<Arc<AppState>>,
    Path((department_id, membership_id)): Path<(Uuid, Uuid)>,
) -> HimResult<StatusCode> {
    state
        .db
        .unit_of_work(move |s| {
            Box::pin(async move {
                load_membership(s, department_id, membership_id).await?;
                department_members::remove_member(s, membership_id).await?;
                Ok(())
            })
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/departments/{department_id}/classes
async fn list_classes(
    State(state): State<Arc<AppState>>,
    Path(department_id): Path<Uuid>,
) -> HimResult<Json<Vec<Class>>> {
    let list = state
        .db
        .unit_of_work(move |s| {
            Box::pin(async move {
                load_department(s, department_id).await?;
                Ok(departments::list_classes(s, department_id).await?)
            })
        })
        .await?;
    Ok(Json(list))
}

async fn load_department(conn: &mut AnyConnection, id: Uuid) -> HimResult<Department> {
    departments::find_by_id(conn, id)
        .await?
        .ok_or_else(|| HimError::not_found("Department"))
}

/// A membership addressed through the wrong department is treated as missing.
async fn load_membership(
    conn: &mut AnyConnection,
    department_id: Uuid,
    membership_id: Uuid,
) -> HimResult<DepartmentMember> {
    department_members::find_by_id(conn, membership_id)
        .await?
        .filter(|m| m.department_id == department_id)
        .ok_or_else(|| HimError::not_found("Department membership"))
}
