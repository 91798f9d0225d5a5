use std::collections::HashMap;

use axum::extract::{rejection::JsonRejection, DefaultBodyLimit, Path, Query};
use axum::http::HeaderValue;
use axum::routing::{delete, get, post, put, MethodRouter};
use axum::{Extension, Json, Router};
use serde_json::Value;
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::filter::FilterData;
use crate::handlers::{activities, files, junction, maps, planning, projects, resource, system};
use crate::middleware::{Actor, DbPool};
use crate::resources::{JunctionDef, ResourceDef, JUNCTIONS, RESOURCES};
use crate::uploads::PUBLIC_PREFIX;

type Payload = Result<Json<Value>, JsonRejection>;
type Params = Query<HashMap<String, String>>;

/// Build the full application router around a connection pool.
pub fn app(pool: PgPool, config: &AppConfig) -> Router {
    Router::new()
        // Public
        .route("/", get(system::root))
        .route("/health", get(system::health))
        // Resource API
        .merge(resource_routes())
        .merge(child_routes())
        .merge(junction_routes())
        .merge(find_routes())
        .merge(project_routes())
        .merge(planning_routes())
        .nest_service(PUBLIC_PREFIX, ServeDir::new(&config.uploads.dir))
        // Global middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(config))
                .layer(DefaultBodyLimit::max(config.uploads.max_upload_bytes))
                .layer(Extension(DbPool(pool))),
        )
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let security = &config.security;
    if !security.enable_cors {
        return CorsLayer::new();
    }
    if security.cors_origins.is_empty() || security.cors_origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();
    CorsLayer::new().allow_origin(origins).allow_methods(Any).allow_headers(Any)
}

/// `/api/:resource` and `/api/:resource/:id` for every registered resource.
/// Projects and activities swap in their composite handlers.
fn resource_routes() -> Router {
    RESOURCES.iter().fold(Router::new(), |router, &def| {
        router
            .route(&format!("/api/{}", def.name), collection(def))
            .route(&format!("/api/{}/:id", def.name), member(def))
    })
}

fn collection(def: &'static ResourceDef) -> MethodRouter {
    let list = match def.name {
        "projects" => get(projects::list),
        _ => get(move |pool: Extension<DbPool>, params: Params| resource::list(def, pool, params)),
    };
    match def.name {
        "projects" => list.post(projects::create),
        "activities" => list.post(activities::create),
        _ => list.post(move |pool: Extension<DbPool>, actor: Actor, payload: Payload| {
            resource::create(def, pool, actor, payload)
        }),
    }
}

fn member(def: &'static ResourceDef) -> MethodRouter {
    let router = get(move |pool: Extension<DbPool>, id: Path<String>| resource::get(def, pool, id)).delete(
        move |pool: Extension<DbPool>, actor: Actor, id: Path<String>| resource::delete(def, pool, actor, id),
    );
    match def.name {
        "projects" => router.put(projects::update),
        "activities" => router.put(activities::update),
        _ => router.put(move |pool: Extension<DbPool>, id: Path<String>, payload: Payload| {
            resource::update(def, pool, id, payload)
        }),
    }
}

/// `/api/:parent/:id/:child` for every declared parent link
fn child_routes() -> Router {
    let mut router = Router::new();
    for &def in RESOURCES {
        for link in def.parents {
            let column = link.column;
            router = router.route(
                &format!("/api/{}/:id/{}", link.parent, def.name),
                get(move |pool: Extension<DbPool>, id: Path<String>, params: Params| {
                    resource::children(def, column, pool, id, params)
                }),
            );
        }
    }
    router
}

fn junction_routes() -> Router {
    JUNCTIONS.iter().fold(Router::new(), |router, &link| {
        router
            .route(&format!("/api/{}/:id/{}", link.owner, link.segment), links(link))
            .route(
                &format!("/api/{}/:id/{}/:target_id", link.owner, link.segment),
                delete(move |pool: Extension<DbPool>, ids: Path<(String, String)>| {
                    junction::unlink(link, pool, ids)
                }),
            )
    })
}

fn links(def: &'static JunctionDef) -> MethodRouter {
    get(move |pool: Extension<DbPool>, id: Path<String>| junction::list(def, pool, id)).post(
        move |pool: Extension<DbPool>, actor: Actor, id: Path<String>, payload: Payload| {
            junction::link(def, pool, actor, id, payload)
        },
    )
}

fn find_routes() -> Router {
    RESOURCES.iter().fold(Router::new(), |router, &def| {
        router.route(
            &format!("/api/find/{}", def.name),
            post(move |pool: Extension<DbPool>, payload: Result<Json<FilterData>, JsonRejection>| {
                resource::find(def, pool, payload)
            }),
        )
    })
}

fn project_routes() -> Router {
    use crate::resources::registry::{PROJECT_ATTACHMENTS, PROJECT_PHOTOS};

    Router::new()
        // Uploads, listed like any child collection
        .route(
            "/api/projects/:id/photos",
            get(|pool: Extension<DbPool>, id: Path<String>, params: Params| {
                resource::children(&PROJECT_PHOTOS, "projectId", pool, id, params)
            })
            .post(files::upload_photo),
        )
        .route(
            "/api/projects/:id/attachments",
            get(|pool: Extension<DbPool>, id: Path<String>, params: Params| {
                resource::children(&PROJECT_ATTACHMENTS, "projectId", pool, id, params)
            })
            .post(files::upload_attachment),
        )
        .route("/api/projects/:id/photos/:photo_id/default", put(files::set_default_photo))
        .route(
            "/api/projects/:id/apply-category-milestones",
            post(projects::apply_category_milestones),
        )
        // Geospatial
        .route("/api/projects/:id/maps", get(maps::for_project))
        .route("/api/project-maps/filter", get(maps::filter))
}

fn planning_routes() -> Router {
    Router::new()
        .route("/api/planning/import-cidp", post(planning::import_preview))
        .route("/api/planning/confirm-import-cidp", post(planning::confirm_import))
        .route("/api/planning/template", get(planning::template))
        .route("/api/strategic-plans/:id/export/pdf", get(planning::strategic_plan_pdf))
        .route("/api/programs/:id/export/pdf", get(planning::program_pdf))
}
