use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FilterOp {
    #[serde(rename = "$eq")] Eq,
    #[serde(rename = "$ne")] Ne,
    #[serde(rename = "$gt")] Gt,
    #[serde(rename = "$gte")] Gte,
    #[serde(rename = "$lt")] Lt,
    #[serde(rename = "$lte")] Lte,

    #[serde(rename = "$like")] Like,
    #[serde(rename = "$ilike")] ILike,

    #[serde(rename = "$in")] In,
    #[serde(rename = "$nin")] NIn,

    #[serde(rename = "$between")] Between,
    #[serde(rename = "$null")] Null,

    /// Pre-rendered SQL (logical groups)
    #[serde(rename = "$text")] Text,
}

/// Body of `POST /api/find/:resource` and the parsed form of list query strings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterData {
    pub select: Option<Vec<String>>,
    #[serde(rename = "where")]
    pub where_clause: Option<serde_json::Value>,
    pub order: Option<serde_json::Value>,
    pub limit: Option<i32>,
    pub offset: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct FilterWhereInfo {
    pub column: String,
    pub operator: FilterOp,
    pub data: serde_json::Value,
}

#[derive(Debug, Clone, Default)]
pub struct FilterWhereOptions {
    pub include_voided: bool,
    /// When set, every referenced column must appear here
    pub allowed_columns: Option<Vec<String>>,
    /// Postgres type each parameter is cast to, keyed by column
    pub column_casts: HashMap<String, &'static str>,
}

impl FilterWhereOptions {
    pub fn check_column(&self, column: &str) -> bool {
        match &self.allowed_columns {
            Some(allowed) => allowed.iter().any(|c| c == column),
            None => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone)]
pub struct FilterOrderInfo {
    pub column: String,
    pub sort: SortDirection,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<serde_json::Value>,
}

impl SqlResult {
    pub fn new(query: impl Into<String>, params: Vec<serde_json::Value>) -> Self {
        Self { query: query.into(), params }
    }
}
