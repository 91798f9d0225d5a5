//! Parameterized SQL for the generic resource operations.

use serde_json::Value;

use super::{generate_id, Cascade, IdStrategy, JunctionDef, ResourceDef};
use crate::database::query_builder::{json_returning_sql, json_rows_sql, quote_ident};
use crate::database::record::Record;
use crate::filter::{Filter, FilterData, FilterError, SqlResult};

fn placeholder(index: usize, pg_type: &str) -> String {
    format!("CAST(${} AS {})", index, pg_type)
}

/// `INSERT ... RETURNING` the new row as JSON
pub fn insert(def: &ResourceDef, record: &Record, user_id: Option<&Value>) -> SqlResult {
    let mut columns = Vec::new();
    let mut values = Vec::new();
    let mut params = Vec::new();

    if def.id_strategy == IdStrategy::Generated {
        params.push(Value::String(generate_id()));
        columns.push(quote_ident("id"));
        values.push(placeholder(params.len(), "text"));
    }

    for (name, value) in &record.fields {
        let kind = def.column_type(name).map(|k| k.pg_cast()).unwrap_or("text");
        params.push(value.clone());
        columns.push(quote_ident(name));
        values.push(placeholder(params.len(), kind));
    }

    if let Some(user_id) = record.user_id.as_ref().or(user_id) {
        params.push(user_id.clone());
        columns.push(quote_ident("userId"));
        values.push(placeholder(params.len(), "bigint"));
    }

    columns.push(quote_ident("createdAt"));
    values.push("now()".to_string());
    columns.push(quote_ident("updatedAt"));
    values.push("now()".to_string());

    let dml = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_ident(def.table),
        columns.join(", "),
        values.join(", ")
    );
    SqlResult::new(json_returning_sql(&dml), params)
}

/// Partial `UPDATE` of the supplied columns on a live row
pub fn update(def: &ResourceDef, id: &Value, record: &Record) -> SqlResult {
    let mut assignments = Vec::new();
    let mut params = Vec::new();

    for (name, value) in &record.fields {
        let kind = def.column_type(name).map(|k| k.pg_cast()).unwrap_or("text");
        params.push(value.clone());
        assignments.push(format!("{} = {}", quote_ident(name), placeholder(params.len(), kind)));
    }
    if let Some(user_id) = &record.user_id {
        params.push(user_id.clone());
        assignments.push(format!("{} = {}", quote_ident("userId"), placeholder(params.len(), "bigint")));
    }
    assignments.push(format!("{} = now()", quote_ident("updatedAt")));

    params.push(id.clone());
    let dml = format!(
        "UPDATE {} SET {} WHERE \"id\" = {} AND \"voided\" = false",
        quote_ident(def.table),
        assignments.join(", "),
        placeholder(params.len(), def.id_type().pg_cast())
    );
    SqlResult::new(json_returning_sql(&dml), params)
}

pub fn select_by_id(def: &ResourceDef, id: &Value) -> SqlResult {
    let inner = format!(
        "SELECT * FROM {} WHERE \"id\" = {} AND \"voided\" = false",
        quote_ident(def.table),
        placeholder(1, def.id_type().pg_cast())
    );
    SqlResult::new(json_rows_sql(&inner), vec![id.clone()])
}

/// Flip `voided` on a live row; zero affected rows means not found.
pub fn soft_delete(def: &ResourceDef, id: &Value, voided_by: Option<&Value>) -> SqlResult {
    let query = format!(
        "UPDATE {} SET \"voided\" = true, \"voidedBy\" = CAST($2 AS bigint), \"updatedAt\" = now() \
         WHERE \"id\" = {} AND \"voided\" = false",
        quote_ident(def.table),
        placeholder(1, def.id_type().pg_cast())
    );
    SqlResult::new(query, vec![id.clone(), voided_by.cloned().unwrap_or(Value::Null)])
}

pub fn cascade(cascade: &Cascade, owner_id: &Value, voided_by: Option<&Value>) -> SqlResult {
    let query = format!(
        "UPDATE {} SET \"voided\" = true, \"voidedBy\" = CAST($2 AS bigint), \"updatedAt\" = now() \
         WHERE \"voided\" = false AND {}",
        quote_ident(cascade.table),
        cascade.condition.replacen("{}", "$1", 1)
    );
    SqlResult::new(query, vec![owner_id.clone(), voided_by.cloned().unwrap_or(Value::Null)])
}

/// List live rows, applying `FilterData` on top of the resource's default order.
pub fn list(def: &ResourceDef, mut filter_data: FilterData) -> Result<Filter, FilterError> {
    if filter_data.order.is_none() {
        filter_data.order = Some(Value::String(def.default_order.to_string()));
    }
    let mut filter = Filter::new(def.table)?.with_options(def.filter_options());
    filter.assign(filter_data)?;
    Ok(filter)
}

/// Render a filter as JSON rows
pub fn to_json_sql(filter: &Filter) -> Result<SqlResult, FilterError> {
    let sql = filter.to_sql()?;
    Ok(SqlResult::new(json_rows_sql(&sql.query), sql.params))
}

/// Rows of `target` linked to one owner through a junction table
pub fn linked_targets(junction: &JunctionDef, target: &ResourceDef, owner_id: &Value) -> SqlResult {
    let inner = format!(
        "SELECT t.* FROM {target} t JOIN {link} j ON j.{target_col} = t.\"id\" \
         WHERE j.{owner_col} = CAST($1 AS bigint) AND j.\"voided\" = false AND t.\"voided\" = false \
         ORDER BY t.\"id\" ASC",
        target = quote_ident(target.table),
        link = quote_ident(junction.table),
        target_col = quote_ident(junction.target_column),
        owner_col = quote_ident(junction.owner_column),
    );
    SqlResult::new(json_rows_sql(&inner), vec![owner_id.clone()])
}

/// Insert one link row; the pair is unique, so a repeat is a conflict.
pub fn link(junction: &JunctionDef, owner_id: &Value, target_id: &Value, user_id: Option<&Value>) -> SqlResult {
    let dml = format!(
        "INSERT INTO {} ({}, {}, \"userId\", \"createdAt\", \"updatedAt\") \
         VALUES (CAST($1 AS bigint), CAST($2 AS bigint), CAST($3 AS bigint), now(), now())",
        quote_ident(junction.table),
        quote_ident(junction.owner_column),
        quote_ident(junction.target_column),
    );
    SqlResult::new(
        json_returning_sql(&dml),
        vec![owner_id.clone(), target_id.clone(), user_id.cloned().unwrap_or(Value::Null)],
    )
}

/// Hard-delete one link row
pub fn unlink(junction: &JunctionDef, owner_id: &Value, target_id: &Value) -> SqlResult {
    let query = format!(
        "DELETE FROM {} WHERE {} = CAST($1 AS bigint) AND {} = CAST($2 AS bigint)",
        quote_ident(junction.table),
        quote_ident(junction.owner_column),
        quote_ident(junction.target_column),
    );
    SqlResult::new(query, vec![owner_id.clone(), target_id.clone()])
}

/// Hard-delete every link row whose `column` equals `id`
pub fn unlink_all(table: &str, column: &str, id: &Value) -> SqlResult {
    let query = format!(
        "DELETE FROM {} WHERE {} = CAST($1 AS bigint)",
        quote_ident(table),
        quote_ident(column)
    );
    SqlResult::new(query, vec![id.clone()])
}

/// Condition keeping rows whose `project_column` is linked to one county,
/// subcounty or ward; `{}` takes the area id.
pub fn scope_condition(junction: &JunctionDef, project_column: &str) -> String {
    format!(
        "{} IN (SELECT {} FROM {} WHERE {} = CAST({{}} AS bigint) AND \"voided\" = false)",
        quote_ident(project_column),
        quote_ident(junction.owner_column),
        quote_ident(junction.table),
        quote_ident(junction.target_column),
    )
}

/// Copy a category's template milestones onto a project, skipping names the
/// project already has.
pub fn instantiate_milestones(project_id: &Value, category_id: &Value, user_id: Option<&Value>) -> SqlResult {
    let query = "INSERT INTO \"milestones\" \
         (\"projectId\", \"milestoneName\", \"description\", \"sequenceOrder\", \"userId\", \"createdAt\", \"updatedAt\") \
         SELECT CAST($1 AS bigint), cm.\"milestoneName\", cm.\"description\", cm.\"sequenceOrder\", CAST($3 AS bigint), now(), now() \
         FROM \"category_milestones\" cm \
         WHERE cm.\"categoryId\" = CAST($2 AS bigint) AND cm.\"voided\" = false \
         AND NOT EXISTS (SELECT 1 FROM \"milestones\" m WHERE m.\"projectId\" = CAST($1 AS bigint) \
         AND m.\"milestoneName\" = cm.\"milestoneName\" AND m.\"voided\" = false) \
         ORDER BY cm.\"sequenceOrder\" ASC NULLS LAST, cm.\"id\" ASC";
    SqlResult::new(
        query,
        vec![project_id.clone(), category_id.clone(), user_id.cloned().unwrap_or(Value::Null)],
    )
}

pub fn clear_default_photo(project_id: &Value) -> SqlResult {
    SqlResult::new(
        "UPDATE \"project_photos\" SET \"isDefault\" = false, \"updatedAt\" = now() \
         WHERE \"projectId\" = CAST($1 AS bigint) AND \"isDefault\" = true",
        vec![project_id.clone()],
    )
}

/// Mark one of the project's live photos as its default
pub fn set_default_photo(project_id: &Value, photo_id: &Value) -> SqlResult {
    let dml = "UPDATE \"project_photos\" SET \"isDefault\" = true, \"updatedAt\" = now() \
         WHERE \"id\" = CAST($2 AS bigint) AND \"projectId\" = CAST($1 AS bigint) AND \"voided\" = false";
    SqlResult::new(json_returning_sql(dml), vec![project_id.clone(), photo_id.clone()])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::record::Operation;
    use crate::resources::find;
    use serde_json::json;

    #[test]
    fn insert_casts_every_value_and_stamps_times() {
        let def = find("subcounties").unwrap();
        let record = Record::from_payload(def, &json!({"countyId": 1, "name": "Westlands"}), Operation::Create).unwrap();
        let sql = insert(def, &record, Some(&json!(5)));
        assert!(sql.query.contains(
            "INSERT INTO \"subcounties\" (\"countyId\", \"name\", \"userId\", \"createdAt\", \"updatedAt\") \
             VALUES (CAST($1 AS bigint), CAST($2 AS text), CAST($3 AS bigint), now(), now())"
        ), "{}", sql.query);
        assert!(sql.query.ends_with("RETURNING *) SELECT row_to_json(t) AS row FROM t"));
        assert_eq!(sql.params, vec![json!(1), json!("Westlands"), json!(5)]);
    }

    #[test]
    fn insert_generates_text_ids_when_declared() {
        let def = find("appointment-schedules").unwrap();
        let record = Record::from_payload(def, &json!({"activityId": 2, "title": "Site visit"}), Operation::Create).unwrap();
        let sql = insert(def, &record, None);
        assert!(sql.query.contains("(\"id\", \"activityId\", \"title\", \"createdAt\""), "{}", sql.query);
        assert!(sql.params[0].as_str().unwrap().contains('-'));
    }

    #[test]
    fn update_targets_live_rows_only() {
        let def = find("milestones").unwrap();
        let record = Record::from_payload(def, &json!({"completed": true}), Operation::Update).unwrap();
        let sql = update(def, &json!(8), &record);
        assert!(sql.query.contains(
            "UPDATE \"milestones\" SET \"completed\" = CAST($1 AS boolean), \"updatedAt\" = now() \
             WHERE \"id\" = CAST($2 AS bigint) AND \"voided\" = false"
        ), "{}", sql.query);
        assert_eq!(sql.params, vec![json!(true), json!(8)]);
    }

    #[test]
    fn soft_delete_records_who_voided() {
        let def = find("counties").unwrap();
        let sql = soft_delete(def, &json!(3), Some(&json!(11)));
        assert!(sql.query.starts_with("UPDATE \"counties\" SET \"voided\" = true"));
        assert!(sql.query.ends_with("AND \"voided\" = false"));
        assert_eq!(sql.params, vec![json!(3), json!(11)]);
    }

    #[test]
    fn cascade_substitutes_owner_placeholder() {
        let def = find("strategic-plans").unwrap();
        let sql = cascade(&def.cascades[1], &json!(2), None);
        assert!(sql.query.contains("\"programId\" IN (SELECT \"id\" FROM \"programs\" WHERE \"strategicPlanId\" = $1)"));
        assert_eq!(sql.params, vec![json!(2), Value::Null]);
    }

    #[test]
    fn list_applies_default_order() {
        let def = find("counties").unwrap();
        let filter = list(def, FilterData::default()).unwrap();
        let sql = to_json_sql(&filter).unwrap();
        assert_eq!(
            sql.query,
            "SELECT row_to_json(t) AS row FROM (SELECT * FROM \"counties\" WHERE \"voided\" = false ORDER BY \"name\" ASC) t"
        );
    }

    #[test]
    fn linking_binds_owner_then_target() {
        let junction = &crate::resources::junctions::PROJECT_CONTRACTORS;
        let sql = link(junction, &json!(1), &json!(7), None);
        assert!(sql.query.contains(
            "INSERT INTO \"project_contractor_assignments\" (\"projectId\", \"contractorId\", \"userId\""
        ), "{}", sql.query);
        assert_eq!(sql.params, vec![json!(1), json!(7), Value::Null]);
    }

    #[test]
    fn linked_targets_join_through_the_junction() {
        let junction = &crate::resources::junctions::PROJECT_WARDS;
        let sql = linked_targets(junction, find("wards").unwrap(), &json!(3));
        assert!(sql.query.contains("FROM \"wards\" t JOIN \"project_wards\" j ON j.\"wardId\" = t.\"id\""), "{}", sql.query);
        assert!(sql.query.contains("j.\"projectId\" = CAST($1 AS bigint)"));
    }

    #[test]
    fn unlink_is_a_hard_delete() {
        let junction = &crate::resources::junctions::MILESTONE_ACTIVITIES;
        let sql = unlink(junction, &json!(2), &json!(9));
        assert_eq!(
            sql.query,
            "DELETE FROM \"milestone_activities\" WHERE \"milestoneId\" = CAST($1 AS bigint) AND \"activityId\" = CAST($2 AS bigint)"
        );
    }
    #[test]
    fn scope_condition_goes_through_the_area_junction() {
        let condition = scope_condition(&crate::resources::junctions::PROJECT_COUNTIES, "projectId");
        assert_eq!(
            condition,
            "\"projectId\" IN (SELECT \"projectId\" FROM \"project_counties\" WHERE \"countyId\" = CAST({} AS bigint) AND \"voided\" = false)"
        );
    }

    #[test]
    fn milestone_templates_skip_existing_names() {
        let sql = instantiate_milestones(&json!(5), &json!(2), Some(&json!(1)));
        assert!(sql.query.contains("FROM \"category_milestones\" cm"));
        assert!(sql.query.contains("NOT EXISTS"));
        assert_eq!(sql.params, vec![json!(5), json!(2), json!(1)]);
    }
}
