use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use serde_json::{json, Value};

use crate::database::DatabaseManager;
use crate::middleware::DbPool;

/// GET /
pub async fn root() -> Json<Value> {
    Json(json!({
        "name": "PMIS API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "County project monitoring and planning backend",
        "endpoints": {
            "health": "/health",
            "resources": "/api/:resource[/:id] (GET, POST, PUT, DELETE)",
            "children": "/api/:parent/:id/:child (GET)",
            "links": "/api/:owner/:id/:target[/:target_id] (GET, POST, DELETE)",
            "find": "/api/find/:resource (POST)",
            "projects": "/api/projects/:id/{photos,attachments,maps,apply-category-milestones}",
            "maps": "/api/project-maps/filter (GET)",
            "planning": "/api/planning/{import-cidp,confirm-import-cidp,template}",
            "exports": "/api/{strategic-plans,programs}/:id/export/pdf",
            "uploads": "/uploads/*",
        }
    }))
}

/// GET /health
pub async fn health(Extension(DbPool(pool)): Extension<DbPool>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match DatabaseManager::health_check(&pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "timestamp": now,
                    "database": "unavailable",
                    "error": e.to_string()
                })),
            )
        }
    }
}
