use serde_json::Value;

use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::filter_where::FilterWhere;
use super::types::{FilterData, FilterOrderInfo, FilterWhereOptions, SqlResult};

/// Builds a parameterized SELECT over one table from `FilterData`.
#[derive(Debug)]
pub struct Filter {
    table_name: String,
    select_columns: Vec<String>,
    where_data: Option<Value>,
    /// SQL fragments with a `{}` slot for their single parameter
    extra_conditions: Vec<(String, Value)>,
    order_data: Vec<FilterOrderInfo>,
    limit: Option<i32>,
    offset: Option<i32>,
    options: FilterWhereOptions,
}

impl Filter {
    pub fn new(table_name: impl Into<String>) -> Result<Self, FilterError> {
        let table_name = table_name.into();
        Self::validate_table_name(&table_name)?;
        Ok(Self {
            table_name,
            select_columns: vec![],
            where_data: None,
            extra_conditions: vec![],
            order_data: vec![],
            limit: None,
            offset: None,
            options: FilterWhereOptions::default(),
        })
    }

    pub fn with_options(mut self, options: FilterWhereOptions) -> Self {
        self.options = options;
        self
    }

    pub fn assign(&mut self, data: FilterData) -> Result<&mut Self, FilterError> {
        if let Some(select) = data.select { self.select(select)?; }
        if let Some(where_clause) = data.where_clause { self.where_clause(where_clause)?; }
        if let Some(order) = data.order { self.order(order)?; }
        match (data.limit, data.offset) {
            (Some(limit), offset) => { self.limit(limit, offset)?; }
            (None, Some(offset)) => { self.offset(offset)?; }
            (None, None) => {}
        }
        Ok(self)
    }

    pub fn select(&mut self, columns: Vec<String>) -> Result<&mut Self, FilterError> {
        Self::validate_select_columns(&columns)?;
        for column in &columns {
            if column != "*" && !self.options.check_column(column) {
                return Err(FilterError::InvalidColumn(column.clone()));
            }
        }
        self.select_columns = columns;
        Ok(self)
    }

    pub fn where_clause(&mut self, conditions: Value) -> Result<&mut Self, FilterError> {
        FilterWhere::validate(&conditions)?;
        self.where_data = Some(conditions);
        Ok(self)
    }

    /// Add a condition such as `"projectId" IN (SELECT ... WHERE "countyId" = {})`.
    pub fn where_fragment(&mut self, fragment: impl Into<String>, value: Value) -> &mut Self {
        self.extra_conditions.push((fragment.into(), value));
        self
    }

    pub fn order(&mut self, order_spec: Value) -> Result<&mut Self, FilterError> {
        let order_info = FilterOrder::validate_and_parse(&order_spec)?;
        for info in &order_info {
            if !self.options.check_column(&info.column) {
                return Err(FilterError::InvalidColumn(info.column.clone()));
            }
        }
        self.order_data = order_info;
        Ok(self)
    }

    pub fn limit(&mut self, limit: i32, offset: Option<i32>) -> Result<&mut Self, FilterError> {
        if limit < 0 { return Err(FilterError::InvalidLimit("Limit must be non-negative".to_string())); }
        if let Some(off) = offset { if off < 0 { return Err(FilterError::InvalidOffset("Offset must be non-negative".to_string())); } }

        // Apply max limit from config
        let max_limit = crate::config::CONFIG.filter.max_limit.unwrap_or(i32::MAX);
        let applied_limit = if limit > max_limit {
            if crate::config::CONFIG.filter.debug_logging {
                tracing::warn!("Limit {} exceeds max {}, capping to max", limit, max_limit);
            }
            max_limit
        } else {
            limit
        };

        self.limit = Some(applied_limit);
        self.offset = offset;
        Ok(self)
    }

    pub fn offset(&mut self, offset: i32) -> Result<&mut Self, FilterError> {
        if offset < 0 { return Err(FilterError::InvalidOffset("Offset must be non-negative".to_string())); }
        self.offset = Some(offset);
        Ok(self)
    }

    pub fn to_sql(&self) -> Result<SqlResult, FilterError> {
        let select_clause = self.build_select_clause();
        let where_result = self.to_where_sql()?;
        let order_clause = FilterOrder::generate(&self.order_data);
        let limit_clause = self.build_limit_clause();

        let query = [
            format!("SELECT {}", select_clause),
            format!("FROM \"{}\"", self.table_name),
            format!("WHERE {}", where_result.query),
            order_clause,
            limit_clause,
        ].into_iter().filter(|s| !s.is_empty()).collect::<Vec<_>>().join(" ");

        Ok(SqlResult { query, params: where_result.params })
    }

    pub fn to_where_sql(&self) -> Result<SqlResult, FilterError> {
        let (mut where_clause, mut params) = if let Some(ref where_data) = self.where_data {
            FilterWhere::generate(where_data, 0, &self.options)?
        } else {
            FilterWhere::generate_empty(&self.options)
        };
        for (fragment, value) in &self.extra_conditions {
            params.push(value.clone());
            let rendered = fragment.replacen("{}", &format!("${}", params.len()), 1);
            where_clause = format!("{} AND {}", where_clause, rendered);
        }
        Ok(SqlResult { query: where_clause, params })
    }

    fn validate_table_name(name: &str) -> Result<(), FilterError> {
        if !Self::is_identifier(name) {
            return Err(FilterError::InvalidTableName(format!("Invalid table name format: {}", name)));
        }
        Ok(())
    }

    fn validate_select_columns(columns: &[String]) -> Result<(), FilterError> {
        for column in columns {
            if column == "*" { continue; }
            if !Self::is_identifier(column) {
                return Err(FilterError::InvalidColumn(format!("Invalid column name format: {}", column)));
            }
        }
        Ok(())
    }

    fn is_identifier(name: &str) -> bool {
        let mut chars = name.chars();
        match chars.next() {
            Some(first) if first.is_ascii_alphabetic() || first == '_' => {
                chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
            }
            _ => false,
        }
    }

    fn build_select_clause(&self) -> String {
        if self.select_columns.is_empty() || self.select_columns.iter().any(|c| c == "*") {
            "*".to_string()
        } else {
            self.select_columns.iter().map(|c| format!("\"{}\"", c)).collect::<Vec<_>>().join(", ")
        }
    }

    fn build_limit_clause(&self) -> String {
        match (self.limit, self.offset) {
            (Some(l), Some(o)) => format!("LIMIT {} OFFSET {}", l, o),
            (Some(l), None) => format!("LIMIT {}", l),
            (None, Some(o)) => format!("OFFSET {}", o),
            (None, None) => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_select_hides_voided_rows() {
        let filter = Filter::new("projects").unwrap();
        let sql = filter.to_sql().unwrap();
        assert_eq!(sql.query, "SELECT * FROM \"projects\" WHERE \"voided\" = false");
        assert!(sql.params.is_empty());
    }

    #[test]
    fn rejects_bad_table_names() {
        assert!(Filter::new("projects; DROP TABLE x").is_err());
        assert!(Filter::new("").is_err());
        assert!(Filter::new("1projects").is_err());
    }

    #[test]
    fn fragments_number_after_where_params() {
        let mut filter = Filter::new("project_maps").unwrap();
        filter.where_clause(json!({"projectId": 4})).unwrap();
        filter.where_fragment(
            "\"projectId\" IN (SELECT \"projectId\" FROM \"project_wards\" WHERE \"wardId\" = CAST({} AS bigint))",
            json!("9"),
        );
        let sql = filter.to_sql().unwrap();
        assert_eq!(
            sql.query,
            "SELECT * FROM \"project_maps\" WHERE \"voided\" = false AND \"projectId\" = $1 AND \"projectId\" IN (SELECT \"projectId\" FROM \"project_wards\" WHERE \"wardId\" = CAST($2 AS bigint))"
        );
        assert_eq!(sql.params, vec![json!(4), json!("9")]);
    }

    #[test]
    fn assign_applies_order_and_pagination() {
        let mut filter = Filter::new("milestones").unwrap();
        filter
            .assign(FilterData {
                order: Some(json!("sequenceOrder asc")),
                limit: Some(10),
                offset: Some(20),
                ..Default::default()
            })
            .unwrap();
        let sql = filter.to_sql().unwrap();
        assert!(sql.query.ends_with("ORDER BY \"sequenceOrder\" ASC LIMIT 10 OFFSET 20"), "{}", sql.query);
    }

    #[test]
    fn order_respects_allow_list() {
        let options = FilterWhereOptions {
            allowed_columns: Some(vec!["name".to_string()]),
            ..Default::default()
        };
        let mut filter = Filter::new("counties").unwrap().with_options(options);
        assert!(filter.order(json!("secret desc")).is_err());
        assert!(filter.order(json!("name desc")).is_ok());
    }

    #[test]
    fn negative_limit_is_rejected() {
        let mut filter = Filter::new("wards").unwrap();
        assert!(matches!(filter.limit(-1, None), Err(FilterError::InvalidLimit(_))));
    }
}
