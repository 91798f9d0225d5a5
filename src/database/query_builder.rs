use std::time::Instant;

use serde_json::Value;
use sqlx::{postgres::PgArguments, Executor, Postgres, Row};

use crate::database::manager::DatabaseError;
use crate::filter::types::SqlResult;

/// Wrap a SELECT so each row comes back as one JSON object column named `row`.
pub fn json_rows_sql(inner: &str) -> String {
    format!("SELECT row_to_json(t) AS row FROM ({}) t", inner)
}

/// Wrap an INSERT/UPDATE so its returned rows come back as JSON objects.
pub fn json_returning_sql(dml: &str) -> String {
    format!("WITH t AS ({} RETURNING *) SELECT row_to_json(t) AS row FROM t", dml)
}

/// Quote an identifier that has already been validated against a resource definition.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

pub async fn fetch_json_rows<'e, E>(executor: E, sql: &SqlResult) -> Result<Vec<Value>, DatabaseError>
where
    E: Executor<'e, Database = Postgres>,
{
    let started = Instant::now();
    let mut q = sqlx::query(&sql.query);
    for p in sql.params.iter() {
        q = bind_param(q, p);
    }
    let rows = q.fetch_all(executor).await?;
    warn_if_slow(&sql.query, started);

    rows.iter()
        .map(|row| row.try_get::<Value, _>("row").map_err(DatabaseError::from))
        .collect()
}

pub async fn fetch_json_optional<'e, E>(executor: E, sql: &SqlResult) -> Result<Option<Value>, DatabaseError>
where
    E: Executor<'e, Database = Postgres>,
{
    let started = Instant::now();
    let mut q = sqlx::query(&sql.query);
    for p in sql.params.iter() {
        q = bind_param(q, p);
    }
    let row = q.fetch_optional(executor).await?;
    warn_if_slow(&sql.query, started);

    match row {
        Some(row) => Ok(Some(row.try_get::<Value, _>("row")?)),
        None => Ok(None),
    }
}

/// Run a statement and return the number of affected rows
pub async fn execute<'e, E>(executor: E, sql: &SqlResult) -> Result<u64, DatabaseError>
where
    E: Executor<'e, Database = Postgres>,
{
    let started = Instant::now();
    let mut q = sqlx::query(&sql.query);
    for p in sql.params.iter() {
        q = bind_param(q, p);
    }
    let result = q.execute(executor).await?;
    warn_if_slow(&sql.query, started);
    Ok(result.rows_affected())
}

fn warn_if_slow(query: &str, started: Instant) {
    let database = &crate::config::CONFIG.database;
    if !database.enable_slow_query_warning {
        return;
    }
    let elapsed = started.elapsed().as_millis() as u64;
    if elapsed > database.slow_query_threshold_ms {
        tracing::warn!("Slow query ({} ms): {}", elapsed, query);
    }
}

/// Bind a JSON value with the closest Postgres type. Column types are
/// enforced by explicit casts in the generated SQL.
pub fn bind_param<'q>(
    q: sqlx::query::Query<'q, Postgres, PgArguments>,
    v: &'q Value,
) -> sqlx::query::Query<'q, Postgres, PgArguments> {
    match v {
        Value::Null => {
            let none: Option<String> = None;
            q.bind(none)
        }
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.bind(i)
            } else if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(n.to_string())
            }
        }
        Value::String(s) => q.bind(s),
        // Arrays and objects travel as JSONB
        Value::Array(_) | Value::Object(_) => q.bind(v.clone()),
    }
}
