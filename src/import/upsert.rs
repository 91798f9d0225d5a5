use std::collections::{BTreeMap, HashSet};

use serde::Serialize;
use serde_json::{Map, Value};
use sqlx::{Connection, PgConnection};

use super::headers::{PLAN_FIELDS, PROGRAM_FIELDS, SUBPROGRAM_FIELDS};
use super::ImportError;
use crate::database::query_builder::{fetch_json_optional, json_returning_sql, quote_ident};
use crate::database::{DatabaseError, Tx};
use crate::filter::SqlResult;
use crate::resources::registry::{PROGRAMS, STRATEGIC_PLANS, SUBPROGRAMS};
use crate::resources::ResourceDef;

/// What one confirmed import touched
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub rows: usize,
    pub strategic_plans: usize,
    pub programs: usize,
    pub subprograms: usize,
}

#[derive(Default)]
struct Touched {
    plans: HashSet<i64>,
    programs: HashSet<i64>,
    subprograms: HashSet<i64>,
}

/// Upsert plan → program → subprogram for every row inside the caller's
/// transaction. Each row runs under its own savepoint so a failing row does
/// not poison the rest; any failure is reported as `ImportError::Rows` and the
/// caller's transaction must then roll back.
pub async fn import_rows(tx: &mut Tx, rows: Vec<Map<String, Value>>) -> Result<ImportSummary, ImportError> {
    if rows.is_empty() {
        return Err(ImportError::NoRows);
    }

    let mut touched = Touched::default();
    let mut failures = BTreeMap::new();

    for (index, row) in rows.iter().enumerate() {
        let mut savepoint = Connection::begin(&mut **tx).await.map_err(DatabaseError::from)?;
        match import_row(&mut savepoint, row, &mut touched).await {
            Ok(()) => savepoint.commit().await.map_err(DatabaseError::from)?,
            Err(e) => {
                savepoint.rollback().await.map_err(DatabaseError::from)?;
                failures.insert(format!("row {}", index + 1), e.to_string());
            }
        }
    }

    if !failures.is_empty() {
        tracing::warn!("Import rejected: {} of {} rows failed", failures.len(), rows.len());
        return Err(ImportError::Rows(failures));
    }

    Ok(ImportSummary {
        rows: rows.len(),
        strategic_plans: touched.plans.len(),
        programs: touched.programs.len(),
        subprograms: touched.subprograms.len(),
    })
}

async fn import_row(conn: &mut PgConnection, row: &Map<String, Value>, touched: &mut Touched) -> Result<(), ImportError> {
    let cidp_id = required_text(row, "cidpId")?;
    let programme = required_text(row, "programme")?;

    let mut plan = pick(row, PLAN_FIELDS);
    if !has_value(&plan, "cidpName") {
        plan.insert("cidpName".to_string(), Value::String(cidp_id));
    }
    let plan_id = upsert(conn, &STRATEGIC_PLANS, plan, &["cidpId"]).await?;
    touched.plans.insert(plan_id);

    let mut program = pick(row, PROGRAM_FIELDS);
    program.insert("programme".to_string(), Value::String(programme));
    program.insert("strategicPlanId".to_string(), Value::from(plan_id));
    let program_id = upsert(conn, &PROGRAMS, program, &["strategicPlanId", "programme"]).await?;
    touched.programs.insert(program_id);

    let mut subprogram = pick(row, SUBPROGRAM_FIELDS);
    if has_value(&subprogram, "subProgramme") {
        subprogram.insert("programId".to_string(), Value::from(program_id));
        let subprogram_id = upsert(conn, &SUBPROGRAMS, subprogram, &["programId", "subProgramme"]).await?;
        touched.subprograms.insert(subprogram_id);
    }

    Ok(())
}

fn required_text(row: &Map<String, Value>, field: &'static str) -> Result<String, ImportError> {
    match row.get(field) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        _ => Err(ImportError::MissingField(field)),
    }
}

fn has_value(map: &Map<String, Value>, field: &str) -> bool {
    map.get(field).map_or(false, |v| !v.is_null())
}

fn pick(row: &Map<String, Value>, fields: &[&str]) -> Map<String, Value> {
    fields
        .iter()
        .filter_map(|f| row.get(*f).filter(|v| !v.is_null()).map(|v| (f.to_string(), v.clone())))
        .collect()
}

/// `INSERT ... ON CONFLICT (keys) DO UPDATE` keeping existing values for
/// columns the row leaves out; revives a voided match.
pub(crate) fn upsert_sql(def: &ResourceDef, values: &Map<String, Value>, keys: &[&str]) -> SqlResult {
    let mut columns = Vec::new();
    let mut placeholders = Vec::new();
    let mut params = Vec::new();
    let mut updates = Vec::new();

    for column in def.columns {
        let Some(value) = values.get(column.name) else { continue };
        params.push(value.clone());
        columns.push(quote_ident(column.name));
        placeholders.push(format!("CAST(${} AS {})", params.len(), column.kind.pg_cast()));
        if !keys.contains(&column.name) {
            updates.push(format!("{col} = EXCLUDED.{col}", col = quote_ident(column.name)));
        }
    }
    updates.push("\"voided\" = false".to_string());
    updates.push("\"voidedBy\" = NULL".to_string());
    updates.push("\"updatedAt\" = now()".to_string());

    let dml = format!(
        "INSERT INTO {table} ({columns}, \"createdAt\", \"updatedAt\") VALUES ({values}, now(), now()) \
         ON CONFLICT ({keys}) DO UPDATE SET {updates}",
        table = quote_ident(def.table),
        columns = columns.join(", "),
        values = placeholders.join(", "),
        keys = keys.iter().map(|k| quote_ident(k)).collect::<Vec<_>>().join(", "),
        updates = updates.join(", "),
    );
    SqlResult::new(json_returning_sql(&dml), params)
}

async fn upsert(
    conn: &mut PgConnection,
    def: &ResourceDef,
    values: Map<String, Value>,
    keys: &[&str],
) -> Result<i64, ImportError> {
    let sql = upsert_sql(def, &values, keys);
    let row = fetch_json_optional(&mut *conn, &sql)
        .await?
        .ok_or_else(|| DatabaseError::QueryError(format!("{} upsert returned no row", def.label)))?;
    row.get("id")
        .and_then(Value::as_i64)
        .ok_or_else(|| DatabaseError::QueryError(format!("{} upsert returned no id", def.label)).into())
}
