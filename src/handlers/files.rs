//! Multipart uploads of project photos and attachments.

use std::path::Path as FsPath;

use axum::extract::{Multipart, Path};
use axum::Extension;
use serde_json::{json, Value};

use super::resource::{fetch_one, parse_id};
use crate::database::in_transaction;
use crate::database::query_builder::{execute, fetch_json_optional};
use crate::database::{Operation, Record};
use crate::error::ApiError;
use crate::middleware::{Actor, ApiResponse, ApiResult, DbPool};
use crate::resources::registry::{PROJECTS, PROJECT_ATTACHMENTS, PROJECT_PHOTOS};
use crate::resources::{statements, ResourceDef};
use crate::uploads::{self, StoredFile};

/// Parts of an upload form the handlers care about
#[derive(Debug, Default)]
struct UploadForm {
    file_name: Option<String>,
    content_type: Option<String>,
    bytes: Option<Vec<u8>>,
    description: Option<String>,
    is_default: bool,
}

async fn read_form(mut multipart: Multipart) -> Result<UploadForm, ApiError> {
    let mut form = UploadForm::default();
    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some("file") => {
                form.file_name = field.file_name().map(str::to_string);
                form.content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await?;
                form.bytes = Some(bytes.to_vec());
            }
            Some("description") => {
                let text = field.text().await?;
                form.description = Some(text).filter(|t| !t.trim().is_empty());
            }
            Some("isDefault") => {
                let text = field.text().await?;
                form.is_default = matches!(text.trim(), "true" | "1" | "on");
            }
            _ => {}
        }
    }
    Ok(form)
}

/// Store the file, then insert its row; the file is removed again if the insert fails.
async fn save_upload(
    pool: &sqlx::PgPool,
    def: &'static ResourceDef,
    category: &str,
    project_id: Value,
    form: UploadForm,
    actor: Actor,
) -> Result<Value, ApiError> {
    let bytes = form
        .bytes
        .ok_or_else(|| ApiError::validation_error("Missing file in multipart form", None))?;
    if bytes.is_empty() {
        return Err(ApiError::validation_error("Uploaded file is empty", None));
    }
    let original_name = form.file_name.unwrap_or_else(|| "upload".to_string());

    let root = FsPath::new(&crate::config::CONFIG.uploads.dir);
    let stored = uploads::store(root, category, &original_name, form.content_type, &bytes)
        .await
        .map_err(|e| ApiError::internal_server_error("Failed to store upload", e.to_string()))?;

    let payload = upload_payload(def, &project_id, &stored, form.description, form.is_default);
    let inserted = insert_upload(pool, def, payload, actor).await;
    if inserted.is_err() {
        uploads::discard(root, &stored).await;
    }
    inserted
}

fn upload_payload(
    def: &ResourceDef,
    project_id: &Value,
    stored: &StoredFile,
    description: Option<String>,
    is_default: bool,
) -> Value {
    let mut payload = json!({
        "projectId": project_id,
        "fileName": stored.file_name,
        "filePath": stored.file_path,
        "mimeType": stored.mime_type,
        "fileSize": stored.file_size,
        "description": description,
    });
    if def.column("isDefault").is_some() {
        payload["isDefault"] = Value::Bool(is_default);
    }
    payload
}

async fn insert_upload(pool: &sqlx::PgPool, def: &'static ResourceDef, payload: Value, actor: Actor) -> Result<Value, ApiError> {
    let record = Record::from_payload(def, &payload, Operation::Create)?;
    let make_default = record.get("isDefault") == Some(&Value::Bool(true));
    let project_id = payload["projectId"].clone();

    in_transaction::<_, ApiError, _>(pool, move |tx| {
        Box::pin(async move {
            if make_default {
                execute(&mut **tx, &statements::clear_default_photo(&project_id)).await?;
            }
            super::resource::insert_in(tx, def, &record, &actor).await
        })
    })
    .await
}

/// POST /api/projects/:id/photos
pub async fn upload_photo(
    Extension(DbPool(pool)): Extension<DbPool>,
    actor: Actor,
    Path(id): Path<String>,
    multipart: Multipart,
) -> ApiResult<Value> {
    let project_id = parse_id(&PROJECTS, &id)?;
    fetch_one(&pool, &PROJECTS, &project_id).await?;
    let form = read_form(multipart).await?;
    let row = save_upload(&pool, &PROJECT_PHOTOS, "photos", project_id, form, actor).await?;
    Ok(ApiResponse::created(row))
}

/// POST /api/projects/:id/attachments
pub async fn upload_attachment(
    Extension(DbPool(pool)): Extension<DbPool>,
    actor: Actor,
    Path(id): Path<String>,
    multipart: Multipart,
) -> ApiResult<Value> {
    let project_id = parse_id(&PROJECTS, &id)?;
    fetch_one(&pool, &PROJECTS, &project_id).await?;
    let form = read_form(multipart).await?;
    let row = save_upload(&pool, &PROJECT_ATTACHMENTS, "attachments", project_id, form, actor).await?;
    Ok(ApiResponse::created(row))
}

/// PUT /api/projects/:id/photos/:photo_id/default
pub async fn set_default_photo(
    Extension(DbPool(pool)): Extension<DbPool>,
    Path((id, photo_id)): Path<(String, String)>,
) -> ApiResult<Value> {
    let project_id = parse_id(&PROJECTS, &id)?;
    let photo_id = parse_id(&PROJECT_PHOTOS, &photo_id)?;

    let row = in_transaction::<_, ApiError, _>(&pool, move |tx| {
        Box::pin(async move {
            execute(&mut **tx, &statements::clear_default_photo(&project_id)).await?;
            fetch_json_optional(&mut **tx, &statements::set_default_photo(&project_id, &photo_id))
                .await?
                .ok_or_else(|| {
                    ApiError::not_found(format!("Photo {} not found for project {}", photo_id, project_id))
                })
        })
    })
    .await?;
    Ok(ApiResponse::success(row))
}
