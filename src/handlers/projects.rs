//! Projects: scoped listing and the transactional create/update paths.

use std::collections::HashMap;

use axum::extract::{rejection::JsonRejection, Path, Query};
use axum::{Extension, Json};
use serde_json::{json, Value};

use super::junction::{id_list, link_all, replace_links};
use super::resource::{self, fetch_one, insert_in, parse_id, run_list, ListQuery};
use crate::database::query_builder::{execute, fetch_json_optional};
use crate::database::{in_transaction, Operation, Record, RecordError};
use crate::error::ApiError;
use crate::filter::Filter;
use crate::middleware::{Actor, ApiResponse, ApiResult, DbPool};
use crate::resources::junctions::{PROJECT_COUNTIES, PROJECT_SUBCOUNTIES, PROJECT_WARDS};
use crate::resources::registry::PROJECTS;
use crate::resources::{statements, JunctionDef, ResourceDef};

/// Area filters: query key, link-array key and the junction they go through
pub static AREA_SCOPES: [(&str, &str, &JunctionDef); 3] = [
    ("countyId", "countyIds", &PROJECT_COUNTIES),
    ("subcountyId", "subcountyIds", &PROJECT_SUBCOUNTIES),
    ("wardId", "wardIds", &PROJECT_WARDS),
];

/// Pull `countyId` / `subcountyId` / `wardId` out of the query string and
/// restrict `project_column` to projects linked to those areas.
pub fn apply_area_scope(
    filter: &mut Filter,
    params: &mut HashMap<String, String>,
    project_column: &str,
) -> Result<(), ApiError> {
    for (key, _, junction) in AREA_SCOPES.iter() {
        let Some(raw) = params.remove(*key) else { continue };
        if raw.trim().is_empty() {
            continue;
        }
        let area_id: i64 = raw.trim().parse().map_err(|_| {
            ApiError::bad_request(format!("'{}' must be an integer id", key))
        })?;
        filter.where_fragment(statements::scope_condition(junction, project_column), Value::from(area_id));
    }
    Ok(())
}

/// Area links requested in a create/update body
fn area_links(payload: &Value) -> Result<Vec<(&'static JunctionDef, Vec<i64>)>, ApiError> {
    let mut links = Vec::new();
    for (_, key, junction) in AREA_SCOPES.iter() {
        if let Some(ids) = id_list(payload, key)? {
            links.push((*junction, ids));
        }
    }
    Ok(links)
}

fn escape_like(text: &str) -> String {
    text.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

/// Filter for `GET /api/projects`
pub fn project_filter(mut params: HashMap<String, String>) -> Result<Filter, ApiError> {
    let def: &ResourceDef = &PROJECTS;
    let mut area_params: HashMap<String, String> = AREA_SCOPES
        .iter()
        .filter_map(|(key, _, _)| params.remove_entry(*key))
        .collect();
    let name = params.remove("projectName").filter(|s| !s.trim().is_empty());
    let start = params.remove("startDate").filter(|s| !s.trim().is_empty());
    let end = params.remove("endDate").filter(|s| !s.trim().is_empty());

    let mut query = ListQuery::parse(def, params)?;
    if let Some(name) = name {
        query.conditions.insert("projectName".into(), json!({"$ilike": format!("%{}%", escape_like(name.trim()))}));
    }
    if let Some(start) = start {
        query.conditions.insert("startDate".into(), json!({"$gte": start}));
    }
    if let Some(end) = end {
        query.conditions.insert("endDate".into(), json!({"$lte": end}));
    }

    let mut filter = query.into_filter(def)?;
    apply_area_scope(&mut filter, &mut area_params, "id")?;
    Ok(filter)
}

/// GET /api/projects
pub async fn list(
    Extension(DbPool(pool)): Extension<DbPool>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Vec<Value>> {
    let filter = project_filter(params)?;
    Ok(ApiResponse::success(run_list(&pool, &filter).await?))
}

/// POST /api/projects
///
/// Inserts the project, copies its category's milestone templates and links
/// any `countyIds` / `subcountyIds` / `wardIds`, all in one transaction.
pub async fn create(
    Extension(DbPool(pool)): Extension<DbPool>,
    actor: Actor,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Value> {
    let Json(payload) = payload?;
    let record = Record::from_payload(&PROJECTS, &payload, Operation::Create)?;
    let links = area_links(&payload)?;
    let category_id = record.get("categoryId").filter(|v| !v.is_null()).cloned();

    let row = in_transaction::<_, ApiError, _>(&pool, move |tx| {
        Box::pin(async move {
            let mut row = insert_in(tx, &PROJECTS, &record, &actor).await?;
            let project_id = row.get("id").cloned().unwrap_or(Value::Null);

            let mut milestones_created = 0;
            if let Some(category_id) = category_id {
                let sql = statements::instantiate_milestones(&project_id, &category_id, actor.id_value().as_ref());
                milestones_created = execute(&mut **tx, &sql).await?;
            }
            for (junction, ids) in &links {
                link_all(tx, junction, &project_id, ids, &actor).await?;
            }

            row["milestonesCreated"] = Value::from(milestones_created);
            Ok(row)
        })
    })
    .await?;

    tracing::info!("Created project {}", row.get("id").unwrap_or(&serde_json::Value::Null));
    Ok(ApiResponse::created(row))
}

/// PUT /api/projects/:id; area arrays, when present, replace existing links.
pub async fn update(
    Extension(DbPool(pool)): Extension<DbPool>,
    actor: Actor,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Value> {
    let id = parse_id(&PROJECTS, &id)?;
    let Json(payload) = payload?;
    let links = area_links(&payload)?;
    let record = partial_record(&PROJECTS, &payload, !links.is_empty())?;
    let row = update_linked(&pool, &PROJECTS, id, record, links, actor).await?;
    Ok(ApiResponse::success(row))
}

/// Parse an update body; a body carrying only link arrays is still valid.
pub fn partial_record(def: &ResourceDef, payload: &Value, has_links: bool) -> Result<Option<Record>, ApiError> {
    match Record::from_payload(def, payload, Operation::Update) {
        Ok(record) => Ok(Some(record)),
        Err(RecordError::NoUpdatableFields) if has_links => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Update columns (if any) and replace the owner's links in one transaction.
pub async fn update_linked(
    pool: &sqlx::PgPool,
    def: &'static ResourceDef,
    id: Value,
    record: Option<Record>,
    links: Vec<(&'static JunctionDef, Vec<i64>)>,
    actor: Actor,
) -> Result<Value, ApiError> {
    in_transaction::<_, ApiError, _>(pool, move |tx| {
        Box::pin(async move {
            let sql = match &record {
                Some(record) => statements::update(def, &id, record),
                None => statements::select_by_id(def, &id),
            };
            let row = fetch_json_optional(&mut **tx, &sql)
                .await?
                .ok_or_else(|| resource::not_found(def, &id))?;
            for (junction, ids) in &links {
                replace_links(tx, junction, &id, ids, &actor).await?;
            }
            Ok(row)
        })
    })
    .await
}

/// POST /api/projects/:id/apply-category-milestones
pub async fn apply_category_milestones(
    Extension(DbPool(pool)): Extension<DbPool>,
    actor: Actor,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let id = parse_id(&PROJECTS, &id)?;
    let project = fetch_one(&pool, &PROJECTS, &id).await?;
    let category_id = project
        .get("categoryId")
        .filter(|v| !v.is_null())
        .cloned()
        .ok_or_else(|| ApiError::bad_request(format!("Project {} has no category", id)))?;

    let sql = statements::instantiate_milestones(&id, &category_id, actor.id_value().as_ref());
    let created = execute(&pool, &sql).await?;
    tracing::info!("Applied {} template milestones to project {}", created, id);

    Ok(ApiResponse::success(json!({
        "projectId": id,
        "categoryId": category_id,
        "milestonesCreated": created,
    })))
}
