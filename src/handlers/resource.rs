//! Generic CRUD over any registered resource.

use std::collections::HashMap;

use axum::extract::{rejection::JsonRejection, Path, Query};
use axum::{Extension, Json};
use serde_json::{Map, Value};
use sqlx::PgPool;

use crate::database::query_builder::{execute, fetch_json_optional, fetch_json_rows};
use crate::database::{in_transaction, Operation, Record, Tx};
use crate::error::ApiError;
use crate::filter::{Filter, FilterData};
use crate::middleware::{Actor, ApiResponse, ApiResult, DbPool};
use crate::resources::{statements, ResourceDef};

/// Query-string listing: column equality conditions plus paging
#[derive(Debug, Default)]
pub struct ListQuery {
    pub conditions: Map<String, Value>,
    pub data: FilterData,
}

impl ListQuery {
    /// Keys naming a column become equality filters; unknown keys are ignored.
    pub fn parse(def: &ResourceDef, params: HashMap<String, String>) -> Result<Self, ApiError> {
        let mut query = ListQuery::default();
        for (key, value) in params {
            match key.as_str() {
                "limit" => query.data.limit = Some(parse_count(&key, &value)?),
                "offset" => query.data.offset = Some(parse_count(&key, &value)?),
                "order" => query.data.order = Some(Value::String(value)),
                _ if def.column_type(&key).is_some() => {
                    query.conditions.insert(key, Value::String(value));
                }
                _ => tracing::debug!("Ignoring unknown {} query parameter '{}'", def.name, key),
            }
        }
        Ok(query)
    }

    pub fn into_filter(mut self, def: &ResourceDef) -> Result<Filter, ApiError> {
        if !self.conditions.is_empty() {
            self.data.where_clause = Some(Value::Object(self.conditions));
        }
        Ok(statements::list(def, self.data)?)
    }
}

fn parse_count(key: &str, raw: &str) -> Result<i32, ApiError> {
    raw.trim()
        .parse::<i32>()
        .ok()
        .filter(|n| *n >= 0)
        .ok_or_else(|| ApiError::bad_request(format!("'{}' must be a non-negative integer", key)))
}

pub fn parse_id(def: &ResourceDef, raw: &str) -> Result<Value, ApiError> {
    def.parse_id(raw).ok_or_else(|| ApiError::invalid_id(raw))
}

pub fn not_found(def: &ResourceDef, id: &Value) -> ApiError {
    ApiError::not_found(format!("{} {} not found", def.label, id))
}

pub async fn run_list(pool: &PgPool, filter: &Filter) -> Result<Vec<Value>, ApiError> {
    let sql = statements::to_json_sql(filter)?;
    Ok(fetch_json_rows(pool, &sql).await?)
}

pub async fn fetch_one(pool: &PgPool, def: &ResourceDef, id: &Value) -> Result<Value, ApiError> {
    fetch_json_optional(pool, &statements::select_by_id(def, id))
        .await?
        .ok_or_else(|| not_found(def, id))
}

/// Same as `fetch_one`, inside an open transaction
pub async fn fetch_one_in(tx: &mut Tx, def: &ResourceDef, id: &Value) -> Result<Value, ApiError> {
    fetch_json_optional(&mut **tx, &statements::select_by_id(def, id))
        .await?
        .ok_or_else(|| not_found(def, id))
}

/// Insert inside an open transaction
pub async fn insert_in(tx: &mut Tx, def: &ResourceDef, record: &Record, actor: &Actor) -> Result<Value, ApiError> {
    let sql = statements::insert(def, record, actor.id_value().as_ref());
    fetch_json_optional(&mut **tx, &sql)
        .await?
        .ok_or_else(|| ApiError::internal_server_error(format!("{} insert returned no row", def.label), "empty RETURNING"))
}

/// Void the row and every declared cascade; the caller owns the transaction.
pub async fn soft_delete_in(tx: &mut Tx, def: &ResourceDef, id: &Value, actor: &Actor) -> Result<(), ApiError> {
    let voided_by = actor.id_value();
    let affected = execute(&mut **tx, &statements::soft_delete(def, id, voided_by.as_ref())).await?;
    if affected == 0 {
        return Err(not_found(def, id));
    }
    for cascade in def.cascades {
        let voided = execute(&mut **tx, &statements::cascade(cascade, id, voided_by.as_ref())).await?;
        if voided > 0 {
            tracing::debug!("Voided {} {} rows with {} {}", voided, cascade.table, def.label, id);
        }
    }
    Ok(())
}

/// GET /api/:resource
pub async fn list(
    def: &'static ResourceDef,
    Extension(DbPool(pool)): Extension<DbPool>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Vec<Value>> {
    let filter = ListQuery::parse(def, params)?.into_filter(def)?;
    Ok(ApiResponse::success(run_list(&pool, &filter).await?))
}

/// GET /api/:parent/:id/:resource
pub async fn children(
    def: &'static ResourceDef,
    column: &'static str,
    Extension(DbPool(pool)): Extension<DbPool>,
    Path(parent_id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Vec<Value>> {
    let parent_id: i64 = parent_id
        .trim()
        .parse()
        .map_err(|_| ApiError::invalid_id(&parent_id))?;
    let mut query = ListQuery::parse(def, params)?;
    query.conditions.insert(column.to_string(), Value::from(parent_id));
    let filter = query.into_filter(def)?;
    Ok(ApiResponse::success(run_list(&pool, &filter).await?))
}

/// GET /api/:resource/:id
pub async fn get(
    def: &'static ResourceDef,
    Extension(DbPool(pool)): Extension<DbPool>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let id = parse_id(def, &id)?;
    Ok(ApiResponse::success(fetch_one(&pool, def, &id).await?))
}

/// POST /api/:resource
pub async fn create(
    def: &'static ResourceDef,
    Extension(DbPool(pool)): Extension<DbPool>,
    actor: Actor,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Value> {
    let Json(payload) = payload?;
    let record = Record::from_payload(def, &payload, Operation::Create)?;
    let sql = statements::insert(def, &record, actor.id_value().as_ref());
    let row = fetch_json_optional(&pool, &sql)
        .await?
        .ok_or_else(|| ApiError::internal_server_error(format!("{} insert returned no row", def.label), "empty RETURNING"))?;
    tracing::info!("Created {} {}", def.label, row.get("id").unwrap_or(&serde_json::Value::Null));
    Ok(ApiResponse::created(row))
}

/// PUT /api/:resource/:id
pub async fn update(
    def: &'static ResourceDef,
    Extension(DbPool(pool)): Extension<DbPool>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Value> {
    let id = parse_id(def, &id)?;
    let Json(payload) = payload?;
    let record = Record::from_payload(def, &payload, Operation::Update)?;
    let row = fetch_json_optional(&pool, &statements::update(def, &id, &record))
        .await?
        .ok_or_else(|| not_found(def, &id))?;
    Ok(ApiResponse::success(row))
}

/// DELETE /api/:resource/:id
pub async fn delete(
    def: &'static ResourceDef,
    Extension(DbPool(pool)): Extension<DbPool>,
    actor: Actor,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let id = parse_id(def, &id)?;
    let voided_id = id.clone();
    in_transaction(&pool, move |tx| {
        Box::pin(async move { soft_delete_in(tx, def, &voided_id, &actor).await })
    })
    .await?;
    tracing::info!("Voided {} {}", def.label, id);
    Ok(ApiResponse::no_content())
}

/// POST /api/find/:resource
pub async fn find(
    def: &'static ResourceDef,
    Extension(DbPool(pool)): Extension<DbPool>,
    payload: Result<Json<FilterData>, JsonRejection>,
) -> ApiResult<Vec<Value>> {
    let Json(filter_data) = payload?;
    let filter = statements::list(def, filter_data)?;
    Ok(ApiResponse::success(run_list(&pool, &filter).await?))
}
