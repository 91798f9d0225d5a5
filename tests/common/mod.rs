#![allow(dead_code)]

use anyhow::{Context, Result};
use serde_json::Value;
use sqlx::PgPool;

use pmis_api::config::config;
use pmis_api::database::DatabaseManager;

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub client: reqwest::Client,
}

impl TestServer {
    /// Serve the router on a free port inside the current test runtime.
    async fn spawn(pool: PgPool) -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .with_context(|| format!("failed to bind {}", base_url))?;
        let app = pmis_api::app(pool, config());
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self { port, base_url, client: reqwest::Client::new() })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> Result<reqwest::Response> {
        Ok(self.client.post(self.url(path)).json(body).send().await?)
    }

    pub async fn put_json(&self, path: &str, body: &Value) -> Result<reqwest::Response> {
        Ok(self.client.put(self.url(path)).json(body).send().await?)
    }

    pub async fn get(&self, path: &str) -> Result<reqwest::Response> {
        Ok(self.client.get(self.url(path)).send().await?)
    }

    pub async fn delete(&self, path: &str) -> Result<reqwest::Response> {
        Ok(self.client.delete(self.url(path)).send().await?)
    }

    /// POST a JSON body that must come back 201; returns the created row.
    pub async fn create(&self, path: &str, body: Value) -> Result<Value> {
        let res = self.post_json(path, &body).await?;
        let status = res.status();
        let row: Value = res.json().await?;
        anyhow::ensure!(status == reqwest::StatusCode::CREATED, "POST {} returned {}: {}", path, status, row);
        Ok(row)
    }
}

/// Server whose pool never connects; for requests rejected before any query.
pub async fn offline_server() -> Result<TestServer> {
    let pool = DatabaseManager::connect_lazy(&config().database)?;
    TestServer::spawn(pool).await
}

/// Server against `DATABASE_URL` with migrations applied, or `None` (the test
/// should return early) when no database is configured.
pub async fn database_server() -> Result<Option<TestServer>> {
    let _ = dotenvy::dotenv();
    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("DATABASE_URL not set; skipping database-backed test");
        return Ok(None);
    }
    let pool = DatabaseManager::connect(&config().database).await?;
    DatabaseManager::migrate(&pool).await?;
    Ok(Some(TestServer::spawn(pool).await?))
}

/// Suffix keeping names unique across test runs against one database
pub fn unique(prefix: &str) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    format!("{}-{}", prefix, nanos)
}

pub fn id_of(row: &Value) -> i64 {
    row["id"].as_i64().unwrap_or_else(|| panic!("row without numeric id: {}", row))
}
