use std::collections::HashMap;

use axum::extract::{Path, Query};
use axum::Extension;
use serde_json::{json, Value};

use super::projects::apply_area_scope;
use super::resource::{parse_id, run_list};
use crate::error::ApiError;
use crate::filter::{Filter, FilterData};
use crate::geo::{self, MapAggregate};
use crate::middleware::{ApiResponse, ApiResult, DbPool};
use crate::resources::registry::{PROJECTS, PROJECT_MAPS};
use crate::resources::statements;

/// Live map rows, optionally narrowed to one county/subcounty/ward or project
pub fn map_filter(mut params: HashMap<String, String>, project_id: Option<Value>) -> Result<Filter, ApiError> {
    let data = FilterData {
        where_clause: project_id.map(|id| json!({"projectId": id})),
        ..Default::default()
    };
    let mut filter = statements::list(&PROJECT_MAPS, data)?;
    apply_area_scope(&mut filter, &mut params, "projectId")?;
    Ok(filter)
}

/// GET /api/project-maps/filter?countyId=&subcountyId=&wardId=
pub async fn filter(
    Extension(DbPool(pool)): Extension<DbPool>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<MapAggregate> {
    let filter = map_filter(params, None)?;
    let rows = run_list(&pool, &filter).await?;
    Ok(ApiResponse::success(geo::aggregate(rows)))
}

/// GET /api/projects/:id/maps
pub async fn for_project(
    Extension(DbPool(pool)): Extension<DbPool>,
    Path(id): Path<String>,
) -> ApiResult<MapAggregate> {
    let project_id = parse_id(&PROJECTS, &id)?;
    let filter = map_filter(HashMap::new(), Some(project_id))?;
    let rows = run_list(&pool, &filter).await?;
    Ok(ApiResponse::success(geo::aggregate(rows)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn county_filter_restricts_project_ids() {
        let params = HashMap::from([("countyId".to_string(), "47".to_string())]);
        let sql = map_filter(params, None).unwrap().to_sql().unwrap();
        assert_eq!(
            sql.query,
            "SELECT * FROM \"project_maps\" WHERE \"voided\" = false AND \"projectId\" IN \
             (SELECT \"projectId\" FROM \"project_counties\" WHERE \"countyId\" = CAST($1 AS bigint) AND \"voided\" = false) \
             ORDER BY \"id\" ASC"
        );
        assert_eq!(sql.params, vec![json!(47)]);
    }

    #[test]
    fn no_filters_lists_every_live_map() {
        let sql = map_filter(HashMap::new(), None).unwrap().to_sql().unwrap();
        assert!(sql.params.is_empty());
        assert!(sql.query.starts_with("SELECT * FROM \"project_maps\" WHERE \"voided\" = false ORDER BY"));
    }

    #[test]
    fn per_project_maps() {
        let sql = map_filter(HashMap::new(), Some(json!(9))).unwrap().to_sql().unwrap();
        assert!(sql.query.contains("\"projectId\" = CAST($1 AS bigint)"));
    }
}
