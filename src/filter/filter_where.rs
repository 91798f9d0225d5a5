use serde_json::Value;

use super::error::FilterError;
use super::types::{FilterOp, FilterWhereInfo, FilterWhereOptions};

pub struct FilterWhere<'a> {
    param_values: Vec<Value>,
    param_index: usize,
    conditions: Vec<FilterWhereInfo>,
    options: &'a FilterWhereOptions,
}

impl<'a> FilterWhere<'a> {
    pub fn new(starting_param_index: usize, options: &'a FilterWhereOptions) -> Self {
        Self {
            param_values: vec![],
            param_index: starting_param_index,
            conditions: vec![],
            options,
        }
    }

    /// Render `where_data` to SQL. Placeholders start at `$starting_param_index + 1`.
    pub fn generate(
        where_data: &Value,
        starting_param_index: usize,
        options: &FilterWhereOptions,
    ) -> Result<(String, Vec<Value>), FilterError> {
        let mut filter_where = FilterWhere::new(starting_param_index, options);
        filter_where.build(where_data, true)
    }

    pub fn generate_empty(options: &FilterWhereOptions) -> (String, Vec<Value>) {
        let where_clause = if options.include_voided {
            "1=1".to_string()
        } else {
            "\"voided\" = false".to_string()
        };
        (where_clause, vec![])
    }

    pub fn validate(where_data: &Value) -> Result<(), FilterError> {
        match where_data {
            Value::Null | Value::Object(_) => Ok(()),
            _ => Err(FilterError::InvalidWhereClause("WHERE must be an object".to_string())),
        }
    }

    fn build(&mut self, where_data: &Value, top_level: bool) -> Result<(String, Vec<Value>), FilterError> {
        self.parse_where_data(where_data)?;

        let mut sql_conditions = vec![];
        if top_level && !self.options.include_voided {
            sql_conditions.push("\"voided\" = false".to_string());
        }
        let conditions_snapshot = std::mem::take(&mut self.conditions);
        for condition in &conditions_snapshot {
            if let Some(sql) = self.build_sql_condition(condition)? {
                sql_conditions.push(sql);
            }
        }
        let where_clause = if sql_conditions.is_empty() { "1=1".to_string() } else { sql_conditions.join(" AND ") };
        Ok((where_clause, std::mem::take(&mut self.param_values)))
    }

    fn parse_where_data(&mut self, where_data: &Value) -> Result<(), FilterError> {
        match where_data {
            Value::Null => Ok(()),
            Value::Object(obj) => {
                for (key, value) in obj {
                    if key.starts_with('$') {
                        self.parse_logical_operator(key, value)?;
                    } else {
                        self.parse_field_condition(key, value)?;
                    }
                }
                Ok(())
            }
            _ => Err(FilterError::InvalidWhereClause("Unsupported WHERE format".to_string())),
        }
    }

    fn parse_logical_operator(&mut self, op: &str, value: &Value) -> Result<(), FilterError> {
        match op {
            "$and" | "$or" => {
                let arr = value
                    .as_array()
                    .ok_or_else(|| FilterError::InvalidOperatorData(format!("{} requires array", op)))?;
                if arr.is_empty() {
                    return Err(FilterError::InvalidOperatorData(format!("{} requires at least one clause", op)));
                }
                let mut sql_parts = Vec::new();
                for v in arr {
                    let (sql, params) = self.nested(v)?;
                    sql_parts.push(format!("({})", sql));
                    self.param_values.extend(params);
                }
                let joiner = if op == "$and" { " AND " } else { " OR " };
                self.conditions.push(FilterWhereInfo {
                    column: format!("({})", sql_parts.join(joiner)),
                    operator: FilterOp::Text,
                    data: Value::Null,
                });
                Ok(())
            }
            "$not" => {
                let (sql, params) = self.nested(value)?;
                self.param_values.extend(params);
                self.conditions.push(FilterWhereInfo {
                    column: format!("NOT ({})", sql),
                    operator: FilterOp::Text,
                    data: Value::Null,
                });
                Ok(())
            }
            _ => Err(FilterError::UnsupportedOperator(op.to_string())),
        }
    }

    /// Render a nested clause continuing this builder's placeholder numbering.
    fn nested(&mut self, value: &Value) -> Result<(String, Vec<Value>), FilterError> {
        let mut child = FilterWhere::new(self.param_index, self.options);
        let (sql, params) = child.build(value, false)?;
        self.param_index = child.param_index;
        Ok((sql, params))
    }

    fn parse_field_condition(&mut self, field: &str, value: &Value) -> Result<(), FilterError> {
        if !self.options.check_column(field) {
            return Err(FilterError::InvalidColumn(field.to_string()));
        }
        if let Value::Object(obj) = value {
            for (op_key, op_val) in obj {
                let operator = Self::map_operator(op_key)?;
                self.conditions.push(FilterWhereInfo { column: field.to_string(), operator, data: op_val.clone() });
            }
        } else {
            // Implicit equality: { field: value }
            self.conditions.push(FilterWhereInfo { column: field.to_string(), operator: FilterOp::Eq, data: value.clone() });
        }
        Ok(())
    }

    fn map_operator(op_key: &str) -> Result<FilterOp, FilterError> {
        Ok(match op_key {
            "$eq" => FilterOp::Eq,
            "$ne" | "$neq" => FilterOp::Ne,
            "$gt" => FilterOp::Gt,
            "$gte" => FilterOp::Gte,
            "$lt" => FilterOp::Lt,
            "$lte" => FilterOp::Lte,
            "$like" => FilterOp::Like,
            "$ilike" => FilterOp::ILike,
            "$in" => FilterOp::In,
            "$nin" => FilterOp::NIn,
            "$between" => FilterOp::Between,
            "$null" => FilterOp::Null,
            other => return Err(FilterError::UnsupportedOperator(other.to_string())),
        })
    }

    fn build_sql_condition(&mut self, condition: &FilterWhereInfo) -> Result<Option<String>, FilterError> {
        // Pseudo conditions whose column already holds SQL (logical operators)
        if condition.operator == FilterOp::Text {
            return Ok(Some(condition.column.clone()));
        }

        let column = condition.column.as_str();
        let quoted_column = format!("\"{}\"", column);
        let data = &condition.data;
        match condition.operator {
            FilterOp::Eq => {
                if data.is_null() { Ok(Some(format!("{} IS NULL", quoted_column))) }
                else { Ok(Some(format!("{} = {}", quoted_column, self.param(column, data.clone())))) }
            }
            FilterOp::Ne => {
                if data.is_null() { Ok(Some(format!("{} IS NOT NULL", quoted_column))) }
                else { Ok(Some(format!("{} <> {}", quoted_column, self.param(column, data.clone())))) }
            }
            FilterOp::Gt => Ok(Some(format!("{} > {}", quoted_column, self.param(column, data.clone())))),
            FilterOp::Gte => Ok(Some(format!("{} >= {}", quoted_column, self.param(column, data.clone())))),
            FilterOp::Lt => Ok(Some(format!("{} < {}", quoted_column, self.param(column, data.clone())))),
            FilterOp::Lte => Ok(Some(format!("{} <= {}", quoted_column, self.param(column, data.clone())))),
            FilterOp::Like => Ok(Some(format!("{}::text LIKE {}", quoted_column, self.text_param(data.clone())))),
            FilterOp::ILike => Ok(Some(format!("{}::text ILIKE {}", quoted_column, self.text_param(data.clone())))),
            FilterOp::In | FilterOp::NIn => {
                let negate = condition.operator == FilterOp::NIn;
                let values = match data {
                    Value::Array(values) => values.clone(),
                    other => vec![other.clone()],
                };
                if values.is_empty() {
                    return Ok(Some(if negate { "1=1" } else { "1=0" }.to_string()));
                }
                let params: Vec<String> = values.into_iter().map(|v| self.param(column, v)).collect();
                let keyword = if negate { "NOT IN" } else { "IN" };
                Ok(Some(format!("{} {} ({})", quoted_column, keyword, params.join(", "))))
            }
            FilterOp::Between => {
                if let Value::Array(values) = data {
                    if values.len() != 2 {
                        return Err(FilterError::InvalidOperatorData("$between requires exactly 2 values".to_string()));
                    }
                    let low = self.param(column, values[0].clone());
                    let high = self.param(column, values[1].clone());
                    Ok(Some(format!("{} BETWEEN {} AND {}", quoted_column, low, high)))
                } else {
                    Err(FilterError::InvalidOperatorData("$between requires array with 2 values".to_string()))
                }
            }
            FilterOp::Null => match data {
                Value::Bool(true) => Ok(Some(format!("{} IS NULL", quoted_column))),
                Value::Bool(false) => Ok(Some(format!("{} IS NOT NULL", quoted_column))),
                _ => Err(FilterError::InvalidOperatorData("$null requires a boolean".to_string())),
            },
            FilterOp::Text => Ok(None),
        }
    }

    fn param(&mut self, column: &str, value: Value) -> String {
        self.param_values.push(value);
        self.param_index += 1;
        match self.options.column_casts.get(column) {
            Some(pg_type) => format!("CAST(${} AS {})", self.param_index, pg_type),
            None => format!("${}", self.param_index),
        }
    }

    fn text_param(&mut self, value: Value) -> String {
        self.param_values.push(value);
        self.param_index += 1;
        format!("CAST(${} AS text)", self.param_index)
    }
}
