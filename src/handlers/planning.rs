//! CIDP spreadsheet import, the import template and PDF exports.

use axum::extract::{rejection::JsonRejection, Multipart, Path};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::resource::{fetch_one, parse_id, run_list};
use crate::database::in_transaction;
use crate::error::ApiError;
use crate::filter::FilterData;
use crate::import::{self, ImportError, ImportPreview};
use crate::middleware::{ApiResponse, ApiResult, DbPool};
use crate::reports::{self, ProgramSection};
use crate::resources::registry::{PROGRAMS, STRATEGIC_PLANS, SUBPROGRAMS};
use crate::resources::statements;
use crate::uploads::sanitize_file_name;

const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmImport {
    pub data_to_import: Vec<Map<String, Value>>,
}

/// POST /api/planning/import-cidp
pub async fn import_preview(mut multipart: Multipart) -> ApiResult<ImportPreview> {
    let mut bytes = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("file") {
            let data = field.bytes().await?;
            bytes = Some(data.to_vec());
        }
    }
    let bytes = bytes.ok_or_else(|| ApiError::validation_error("Missing file in multipart form", None))?;

    let preview = tokio::task::spawn_blocking(move || import::preview(bytes))
        .await
        .map_err(|e| ApiError::internal_server_error("Workbook parsing task failed", e.to_string()))??;
    Ok(ApiResponse::success(preview))
}

/// POST /api/planning/confirm-import-cidp
pub async fn confirm_import(
    Extension(DbPool(pool)): Extension<DbPool>,
    payload: Result<Json<ConfirmImport>, JsonRejection>,
) -> ApiResult<Value> {
    let Json(ConfirmImport { data_to_import }) = payload?;
    let summary = in_transaction::<_, ImportError, _>(&pool, move |tx| {
        Box::pin(async move { import::import_rows(tx, data_to_import).await })
    })
    .await?;

    tracing::info!(
        "Imported {} rows: {} plans, {} programs, {} subprograms",
        summary.rows,
        summary.strategic_plans,
        summary.programs,
        summary.subprograms
    );
    Ok(ApiResponse::success(json!({
        "message": "Import completed",
        "summary": summary,
    })))
}

/// GET /api/planning/template
pub async fn template() -> Result<Response, ApiError> {
    let path = &crate::config::CONFIG.uploads.template_path;
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ApiError::not_found("Import template not found"));
        }
        Err(e) => return Err(ApiError::internal_server_error("Failed to read import template", e.to_string())),
    };
    Ok(file_response(bytes, XLSX_MIME, "cidp_import_template.xlsx"))
}

fn file_response(bytes: Vec<u8>, content_type: &'static str, file_name: &str) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", sanitize_file_name(file_name));
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, content_type.to_string()), (header::CONTENT_DISPOSITION, disposition)],
        bytes,
    )
        .into_response()
}

fn pdf_response(bytes: Vec<u8>, file_name: &str) -> Response {
    file_response(bytes, "application/pdf", file_name)
}

async fn subprograms_of(pool: &sqlx::PgPool, program_ids: Vec<Value>) -> Result<Vec<Value>, ApiError> {
    if program_ids.is_empty() {
        return Ok(Vec::new());
    }
    let data = FilterData {
        where_clause: Some(json!({"programId": {"$in": program_ids}})),
        ..Default::default()
    };
    run_list(pool, &statements::list(&SUBPROGRAMS, data)?).await
}

/// GET /api/strategic-plans/:id/export/pdf
pub async fn strategic_plan_pdf(
    Extension(DbPool(pool)): Extension<DbPool>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_id(&STRATEGIC_PLANS, &id)?;
    let plan = fetch_one(&pool, &STRATEGIC_PLANS, &id).await?;

    let programs_filter = statements::list(
        &PROGRAMS,
        FilterData {
            where_clause: Some(json!({"strategicPlanId": id})),
            ..Default::default()
        },
    )?;
    let programs = run_list(&pool, &programs_filter).await?;
    let program_ids: Vec<Value> = programs.iter().filter_map(|p| p.get("id").cloned()).collect();
    let subprograms = subprograms_of(&pool, program_ids).await?;

    let sections: Vec<ProgramSection> = programs
        .into_iter()
        .map(|program| {
            let own = subprograms
                .iter()
                .filter(|s| s.get("programId") == program.get("id"))
                .cloned()
                .collect();
            ProgramSection { program, subprograms: own }
        })
        .collect();

    let bytes = reports::strategic_plan_pdf(&plan, &sections)?;
    let name = plan.get("cidpId").and_then(Value::as_str).unwrap_or("plan");
    Ok(pdf_response(bytes, &format!("strategic-plan-{}.pdf", name)))
}

/// GET /api/programs/:id/export/pdf
pub async fn program_pdf(
    Extension(DbPool(pool)): Extension<DbPool>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_id(&PROGRAMS, &id)?;
    let program = fetch_one(&pool, &PROGRAMS, &id).await?;
    let subprograms = subprograms_of(&pool, vec![id.clone()]).await?;

    let bytes = reports::program_pdf(&program, &subprograms)?;
    Ok(pdf_response(bytes, &format!("program-{}.pdf", id)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confirm_body_uses_camel_case() {
        let body: ConfirmImport = serde_json::from_value(json!({
            "dataToImport": [{"cidpId": "C1", "programme": "Health"}]
        }))
        .unwrap();
        assert_eq!(body.data_to_import.len(), 1);
    }

    #[test]
    fn downloads_are_attachments() {
        let response = pdf_response(b"%PDF-1.5".to_vec(), "strategic plan/2023.pdf");
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"2023.pdf\""
        );
    }
}
