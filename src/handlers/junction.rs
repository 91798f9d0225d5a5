//! Many-to-many links such as project ↔ contractor.

use axum::extract::{rejection::JsonRejection, Path};
use axum::{Extension, Json};
use serde_json::Value;

use super::resource::{fetch_one, fetch_one_in};
use crate::database::query_builder::{execute, fetch_json_optional, fetch_json_rows};
use crate::database::Tx;
use crate::error::ApiError;
use crate::middleware::{Actor, ApiResponse, ApiResult, DbPool};
use crate::resources::{find, statements, JunctionDef, ResourceDef};

fn resource_def(name: &str) -> Result<&'static ResourceDef, ApiError> {
    find(name).ok_or_else(|| ApiError::internal_server_error("Unknown junction resource", name.to_string()))
}

fn target_def(junction: &JunctionDef) -> Result<&'static ResourceDef, ApiError> {
    resource_def(junction.target)
}

fn parse_link_id(raw: &str) -> Result<Value, ApiError> {
    raw.trim().parse::<i64>().map(Value::from).map_err(|_| ApiError::invalid_id(raw))
}

/// Read a list of ids such as `countyIds: [1, "2"]`; `None` when the key is absent.
pub fn id_list(payload: &Value, key: &str) -> Result<Option<Vec<i64>>, ApiError> {
    let items = match payload.get(key) {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Array(items)) => items,
        Some(_) => return Err(ApiError::bad_request(format!("'{}' must be an array of ids", key))),
    };
    let mut ids = Vec::with_capacity(items.len());
    for item in items {
        let id = match item {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        }
        .ok_or_else(|| ApiError::bad_request(format!("'{}' contains an invalid id: {}", key, item)))?;
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    Ok(Some(ids))
}

/// Link `owner_id` to each live target inside an open transaction
pub async fn link_all(
    tx: &mut Tx,
    junction: &JunctionDef,
    owner_id: &Value,
    target_ids: &[i64],
    actor: &Actor,
) -> Result<(), ApiError> {
    let target = target_def(junction)?;
    let user_id = actor.id_value();
    for target_id in target_ids {
        let target_id = Value::from(*target_id);
        fetch_one_in(tx, target, &target_id).await?;
        let sql = statements::link(junction, owner_id, &target_id, user_id.as_ref());
        fetch_json_optional(&mut **tx, &sql).await?;
    }
    Ok(())
}

/// Replace every link row on the `owner_column` side
pub async fn replace_links(
    tx: &mut Tx,
    junction: &JunctionDef,
    owner_id: &Value,
    target_ids: &[i64],
    actor: &Actor,
) -> Result<(), ApiError> {
    execute(&mut **tx, &statements::unlink_all(junction.table, junction.owner_column, owner_id)).await?;
    link_all(tx, junction, owner_id, target_ids, actor).await
}

/// GET /api/:owner/:id/:segment
pub async fn list(
    junction: &'static JunctionDef,
    Extension(DbPool(pool)): Extension<DbPool>,
    Path(owner_id): Path<String>,
) -> ApiResult<Vec<Value>> {
    let owner_id = parse_link_id(&owner_id)?;
    let target = target_def(junction)?;
    let rows = fetch_json_rows(&pool, &statements::linked_targets(junction, target, &owner_id)).await?;
    Ok(ApiResponse::success(rows))
}

/// POST /api/:owner/:id/:segment with `{"<targetColumn>": id}`
pub async fn link(
    junction: &'static JunctionDef,
    Extension(DbPool(pool)): Extension<DbPool>,
    actor: Actor,
    Path(owner_id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Value> {
    let owner_id = parse_link_id(&owner_id)?;
    let Json(payload) = payload?;
    let target_id = match payload.get(junction.target_column) {
        Some(Value::Number(n)) if n.is_i64() => Value::Number(n.clone()),
        Some(Value::String(s)) => parse_link_id(s)?,
        _ => {
            return Err(ApiError::validation_error(
                format!("{} is required", junction.target_column),
                None,
            ))
        }
    };

    // Voided rows still satisfy the foreign keys
    fetch_one(&pool, resource_def(junction.owner)?, &owner_id).await?;
    fetch_one(&pool, target_def(junction)?, &target_id).await?;

    let sql = statements::link(junction, &owner_id, &target_id, actor.id_value().as_ref());
    let row = fetch_json_optional(&pool, &sql)
        .await
        .map_err(|e| match ApiError::from(e) {
            ApiError::Conflict { error, .. } => ApiError::conflict(
                format!("{} {} is already linked to {} {}", junction.target_column, target_id, junction.owner_column, owner_id),
                error,
            ),
            other => other,
        })?
        .ok_or_else(|| ApiError::internal_server_error("Link insert returned no row", "empty RETURNING"))?;
    Ok(ApiResponse::created(row))
}

/// DELETE /api/:owner/:id/:segment/:target_id
pub async fn unlink(
    junction: &'static JunctionDef,
    Extension(DbPool(pool)): Extension<DbPool>,
    Path((owner_id, target_id)): Path<(String, String)>,
) -> ApiResult<()> {
    let owner_id = parse_link_id(&owner_id)?;
    let target_id = parse_link_id(&target_id)?;
    let removed = execute(&pool, &statements::unlink(junction, &owner_id, &target_id)).await?;
    if removed == 0 {
        return Err(ApiError::not_found(format!(
            "No link between {} {} and {} {}",
            junction.owner_column, owner_id, junction.target_column, target_id
        )));
    }
    Ok(ApiResponse::no_content())
}
