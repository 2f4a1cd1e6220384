//! Member routes: the people the church tracks, their memberships,
//! enrollments, linked identities and photo.

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use him_common::{
    error::{HimError, HimResult},
    models::{
        auth_identity::AuthIdentity,
        department::Department,
        member::{CreateMemberRequest, Member, UpdateMemberRequest},
        member_class::MemberClass,
        Pagination,
    },
    validation::validate_request,
};
use him_db::{
    repository::{auth_identities, member_classes, members},
    storage::LocalStorage,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    extract::{Json, Path, Query},
    AppState,
};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/members", get(list_members).post(create_member))
        .route(
            "/members/{member_id}",
            get(get_member).patch(update_member).delete(delete_member),
        )
        .route("/members/{member_id}/departments", get(list_departments))
        .route("/members/{member_id}/classes", get(list_enrollments))
        .route("/members/{member_id}/identities", get(list_identities))
        .route("/members/{member_id}/photo", post(upload_photo))
}

/// POST /api/v1/members
async fn create_member(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateMemberRequest>,
) -> HimResult<(StatusCode, Json<Member>)> {
    validate_request(&body)?;

    let member = state
        .db
        .unit_of_work(move |s| Box::pin(async move { Ok(members::create_member(s, body).await?) }))
        .await?;

    tracing::info!(member_id = %member.id, "Member created");
    Ok((StatusCode::CREATED, Json(member)))
}

/// GET /api/v1/members
async fn list_members(
    State(state): State<Arc<AppState>>,
    Query(page): Query<Pagination>,
) -> HimResult<Json<Vec<Member>>> {
    let list = state
        .db
        .unit_of_work(move |s| {
            Box::pin(async move { Ok(members::list_members(s, page.limit(), page.offset()).await?) })
        })
        .await?;
    Ok(Json(list))
}

/// GET /api/v1/members/{member_id}
async fn get_member(
    State(state): State<Arc<AppState>>,
    Path(member_id): Path<Uuid>,
) -> HimResult<Json<Member>> {
    let member = state
        .db
        .unit_of_work(move |s| {
            Box::pin(async move {
                members::find_by_id(s, member_id)
                    .await?
                    .ok_or_else(|| HimError::not_found("Member"))
            })
        })
        .await?;
    Ok(Json(member))
}

/// PATCH /api/v1/members/{member_id}: absent fields keep their values.
async fn update_member(
    State(state): State<Arc<AppState>>,
    Path(member_id): Path<Uuid>,
    Json(body): Json<UpdateMemberRequest>,
) -> HimResult<Json<Member>> {
    validate_request(&body)?;

    let member = state
        .db
        .unit_of_work(move |s| {
            Box::pin(async move {
                let mut member = members::find_by_id(s, member_id)
                    .await?
                    .ok_or_else(|| HimError::not_found("Member"))?;
                member.apply(body);
                members::update_member(s, &mut member).await?;
                Ok(member)
            })
        })
        .await?;
    Ok(Json(member))
}

/// DELETE /api/v1/members/{member_id}
async fn delete_member(
    State(state): State<Arc<AppState>>,
    Path(member_id): Path<Uuid>,
) -> HimResult<StatusCode> {
    let photo = state
        .db
        .unit_of_work(move |s| {
            Box::pin(async move {
                let member = members::find_by_id(s, member_id)
                    .await?
                    .ok_or_else(|| HimError::not_found("Member"))?;
                members::delete_member(s, member_id).await?;
                Ok(member.photo)
            })
        })
        .await?;

    if let Some(key) = photo {
        remove_photo_file(&state.storage, &key).await;
    }
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/members/{member_id}/departments
async fn list_departments(
    State(state): State<Arc<AppState>>,
    Path(member_id): Path<Uuid>,
) -> HimResult<Json<Vec<Department>>> {
    let list = state
        .db
        .unit_of_work(move |s| {
            Box::pin(async move {
                require_member(s, member_id).await?;
                Ok(members::list_departments(s, member_id).await?)
            })
        })
        .await?;
    Ok(Json(list))
}

/// GET /api/v1/members/{member_id}/classes
async fn list_enrollments(
    State(state): State<Arc<AppState>>,
    Path(member_id): Path<Uuid>,
) -> HimResult<Json<Vec<MemberClass>>> {
    let list = state
        .db
        .unit_of_work(move |s| {
            Box::pin(async move {
                require_member(s, member_id).await?;
                Ok(member_classes::list_for_member(s, member_id).await?)
            })
        })
        .await?;
    Ok(Json(list))
}

/// GET /api/v1/members/{member_id}/identities
async fn list_identities(
    State(state): State<Arc<AppState>>,
    Path(member_id): Path<Uuid>,
) -> HimResult<Json<Vec<AuthIdentity>>> {
    let list = state
        .db
        .unit_of_work(move |s| {
            Box::pin(async move {
                require_member(s, member_id).await?;
                Ok(auth_identities::list_for_member(s, member_id).await?)
            })
        })
        .await?;
    Ok(Json(list))
}

// ============================================================
// POST /members/{member_id}/photo
// ============================================================

/// Upload a member photo via multipart/form-data (`file` field, images only).
///
/// The file lands at `UPLOAD_DIR/members/<member_id>/<uuid>.<ext>` and the
/// relative key replaces `Member.photo`. The previous file is removed once the
/// new key is committed; the new file is removed if the commit does not happen.
async fn upload_photo(
    State(state): State<Arc<AppState>>,
    Path(member_id): Path<Uuid>,
    multipart: Result<Multipart, MultipartRejection>,
) -> HimResult<Json<Member>> {
    let mut multipart = multipart?;
    let mut upload: Option<(Vec<u8>, String)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| HimError::validation(format!("Multipart error: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let content_type = field
            .content_type()
            .map(str::to_string)
            .or_else(|| {
                file_name
                    .as_deref()
                    .and_then(|n| mime_guess::from_path(n).first())
                    .map(|m| m.essence_str().to_string())
            })
            .unwrap_or_default();

        if !content_type.starts_with("image/") {
            return Err(HimError::validation(format!(
                "File type '{content_type}' is not allowed; upload an image"
            )));
        }
        let ext = photo_extension(file_name.as_deref(), &content_type).ok_or_else(|| {
            HimError::validation(format!("Unrecognized image type '{content_type}'"))
        })?;

        let bytes = field
            .bytes()
            .await
            .map_err(|e| HimError::validation(format!("Failed to read file: {e}")))?;
        if bytes.len() > state.settings.max_upload_size {
            return Err(HimError::validation(format!(
                "File too large: {} bytes (max {} bytes)",
                bytes.len(),
                state.settings.max_upload_size
            )));
        }

        upload = Some((bytes.to_vec(), ext));
    }

    let (data, ext) = upload.ok_or_else(|| HimError::validation("No file field in request"))?;

    let key = LocalStorage::member_photo_key(member_id, &ext);
    state.storage.put_object(&key, &data).await?;

    let new_key = key.clone();
    let saved = state
        .db
        .unit_of_work(move |s| {
            Box::pin(async move {
                let mut member = members::find_by_id(s, member_id)
                    .await?
                    .ok_or_else(|| HimError::not_found("Member"))?;

                let previous = member.photo.replace(new_key);
                members::update_member(s, &mut member).await?;
                Ok((member, previous))
            })
        })
        .await;

    let (member, previous) = match saved {
        Ok(saved) => saved,
        Err(e) => {
            remove_photo_file(&state.storage, &key).await;
            return Err(e);
        }
    };

    if let Some(key) = previous {
        remove_photo_file(&state.storage, &key).await;
    }

    tracing::info!(%member_id, photo = ?member.photo, "Member photo updated");
    Ok(Json(member))
}

/// File extension for an upload: the client's own extension when it matches
/// the content type, otherwise the first one registered for that type.
fn photo_extension(file_name: Option<&str>, content_type: &str) -> Option<String> {
    let from_name = file_name
        .and_then(|n| std::path::Path::new(n).extension())
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .filter(|ext| {
            mime_guess::from_ext(ext)
                .iter()
                .any(|m| m.essence_str() == content_type)
        });

    from_name.or_else(|| {
        mime_guess::get_mime_extensions_str(content_type)
            .and_then(|exts| exts.first())
            .map(|e| e.to_string())
    })
}

async fn remove_photo_file(storage: &LocalStorage, key: &str) {
    if let Err(e) = storage.delete_object(key).await {
        tracing::warn!(key, error = %e, "Failed to remove photo file");
    }
}

async fn require_member(conn: &mut sqlx::AnyConnection, member_id: Uuid) -> HimResult<()> {
    members::find_by_id(conn, member_id)
        .await?
        .map(|_| ())
        .ok_or_else(|| HimError::not_found("Member"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_photo_extension_prefers_client_name() {
        assert_eq!(
            photo_extension(Some("portrait.JPG"), "image/jpeg").as_deref(),
            Some("jpg")
        );
        assert_eq!(photo_extension(Some("a.png"), "image/png").as_deref(), Some("png"));
    }

    #[test]
    fn test_photo_extension_falls_back_to_content_type() {
        // The name lies about the type, so it is ignored.
        assert_eq!(photo_extension(Some("a.txt"), "image/png").as_deref(), Some("png"));
        assert_eq!(photo_extension(None, "image/gif").as_deref(), Some("gif"));
        assert_eq!(photo_extension(None, "image/x-unheard-of"), None);
    }
}
