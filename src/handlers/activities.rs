use axum::extract::{rejection::JsonRejection, Path};
use axum::{Extension, Json};
use serde_json::Value;

use super::junction::{id_list, link_all};
use super::projects::{partial_record, update_linked};
use super::resource::{insert_in, parse_id};
use crate::database::{in_transaction, Operation, Record};
use crate::error::ApiError;
use crate::middleware::{Actor, ApiResponse, ApiResult, DbPool};
use crate::resources::junctions::ACTIVITY_MILESTONES;
use crate::resources::registry::ACTIVITIES;

const MILESTONE_IDS: &str = "milestoneIds";

/// POST /api/activities
///
/// The activity and its `milestoneIds` links commit together; a bad
/// milestone id rolls the activity back.
pub async fn create(
    Extension(DbPool(pool)): Extension<DbPool>,
    actor: Actor,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Value> {
    let Json(payload) = payload?;
    let record = Record::from_payload(&ACTIVITIES, &payload, Operation::Create)?;
    let milestone_ids = id_list(&payload, MILESTONE_IDS)?.unwrap_or_default();

    let row = in_transaction::<_, ApiError, _>(&pool, move |tx| {
        Box::pin(async move {
            let mut row = insert_in(tx, &ACTIVITIES, &record, &actor).await?;
            let activity_id = row.get("id").cloned().unwrap_or(Value::Null);
            link_all(tx, &ACTIVITY_MILESTONES, &activity_id, &milestone_ids, &actor).await?;
            row[MILESTONE_IDS] = Value::from(milestone_ids);
            Ok(row)
        })
    })
    .await?;

    tracing::info!("Created activity {}", row.get("id").unwrap_or(&serde_json::Value::Null));
    Ok(ApiResponse::created(row))
}

/// PUT /api/activities/:id; `milestoneIds`, when present, replaces the links.
pub async fn update(
    Extension(DbPool(pool)): Extension<DbPool>,
    actor: Actor,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Value> {
    let id = parse_id(&ACTIVITIES, &id)?;
    let Json(payload) = payload?;
    let milestone_ids = id_list(&payload, MILESTONE_IDS)?;
    let record = partial_record(&ACTIVITIES, &payload, milestone_ids.is_some())?;

    let links = milestone_ids
        .clone()
        .map(|ids| vec![(&ACTIVITY_MILESTONES, ids)])
        .unwrap_or_default();
    let mut row = update_linked(&pool, &ACTIVITIES, id, record, links, actor).await?;
    if let Some(ids) = milestone_ids {
        row[MILESTONE_IDS] = Value::from(ids);
    }
    Ok(ApiResponse::success(row))
}
