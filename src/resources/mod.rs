//! Static descriptions of every table the API exposes.
//!
//! A `ResourceDef` is enough for the generic handlers to list, fetch,
//! create, update and soft-delete rows without per-entity code.

pub mod junctions;
pub mod registry;
pub mod statements;

use serde_json::Value;

use crate::filter::FilterWhereOptions;

pub use junctions::{JunctionDef, JUNCTIONS};
pub use registry::{find, RESOURCES};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    BigInt,
    Numeric,
    Bool,
    Date,
    Timestamp,
}

impl ColumnType {
    /// Postgres type used in explicit parameter casts
    pub fn pg_cast(&self) -> &'static str {
        match self {
            ColumnType::Text => "text",
            ColumnType::BigInt => "bigint",
            ColumnType::Numeric => "numeric",
            ColumnType::Bool => "boolean",
            ColumnType::Date => "date",
            ColumnType::Timestamp => "timestamptz",
        }
    }
}

#[derive(Debug)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnType,
    pub required: bool,
}

pub const fn col(name: &'static str, kind: ColumnType) -> Column {
    Column { name, kind, required: false }
}

pub const fn req(name: &'static str, kind: ColumnType) -> Column {
    Column { name, kind, required: true }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdStrategy {
    /// `BIGSERIAL` assigned by the database
    Serial,
    /// Text id `<unix-millis>-<6 hex>` assigned on insert
    Generated,
}

/// Child rows of this resource can be listed under `/api/<parent>/:id/<name>`
#[derive(Debug)]
pub struct ParentLink {
    pub parent: &'static str,
    pub column: &'static str,
}

/// Rows voided together with the owning row. `condition` holds one `{}`
/// slot for the owner id.
#[derive(Debug)]
pub struct Cascade {
    pub table: &'static str,
    pub condition: &'static str,
}

#[derive(Debug)]
pub struct ResourceDef {
    /// URL segment under `/api`
    pub name: &'static str,
    pub table: &'static str,
    /// Singular noun used in messages
    pub label: &'static str,
    pub id_strategy: IdStrategy,
    pub columns: &'static [Column],
    pub parents: &'static [ParentLink],
    pub cascades: &'static [Cascade],
    pub default_order: &'static str,
}

/// Columns every table carries; never writable through a payload except `userId`.
pub const AUDIT_COLUMNS: &[(&str, ColumnType)] = &[
    ("voided", ColumnType::Bool),
    ("voidedBy", ColumnType::BigInt),
    ("createdAt", ColumnType::Timestamp),
    ("updatedAt", ColumnType::Timestamp),
    ("userId", ColumnType::BigInt),
];

impl ResourceDef {
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn id_type(&self) -> ColumnType {
        match self.id_strategy {
            IdStrategy::Serial => ColumnType::BigInt,
            IdStrategy::Generated => ColumnType::Text,
        }
    }

    /// Type of any queryable column, including `id` and the audit columns
    pub fn column_type(&self, name: &str) -> Option<ColumnType> {
        if name == "id" {
            return Some(self.id_type());
        }
        if let Some(column) = self.column(name) {
            return Some(column.kind);
        }
        AUDIT_COLUMNS.iter().find(|(n, _)| *n == name).map(|(_, kind)| *kind)
    }

    pub fn parent_column(&self, parent: &str) -> Option<&'static str> {
        self.parents.iter().find(|p| p.parent == parent).map(|p| p.column)
    }

    /// Filter options restricting queries to this resource's columns
    pub fn filter_options(&self) -> FilterWhereOptions {
        let mut options = FilterWhereOptions::default();
        let mut allowed = vec!["id".to_string()];
        options.column_casts.insert("id".to_string(), self.id_type().pg_cast());
        for column in self.columns {
            allowed.push(column.name.to_string());
            options.column_casts.insert(column.name.to_string(), column.kind.pg_cast());
        }
        for (name, kind) in AUDIT_COLUMNS {
            allowed.push(name.to_string());
            options.column_casts.insert(name.to_string(), kind.pg_cast());
        }
        options.allowed_columns = Some(allowed);
        options
    }

    /// Parse a path id into the value bound for `"id"`; `None` when malformed.
    pub fn parse_id(&self, raw: &str) -> Option<Value> {
        match self.id_strategy {
            IdStrategy::Serial => raw.trim().parse::<i64>().ok().map(Value::from),
            IdStrategy::Generated => {
                let trimmed = raw.trim();
                if trimmed.is_empty() { None } else { Some(Value::String(trimmed.to_string())) }
            }
        }
    }
}

/// Synthetic text id: unix millis plus a random suffix
pub fn generate_id() -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("{}-{}", millis, &suffix[..6])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serial_ids_must_be_integers() {
        let def = find("counties").unwrap();
        assert_eq!(def.parse_id("42"), Some(Value::from(42)));
        assert_eq!(def.parse_id("abc"), None);
    }

    #[test]
    fn generated_ids_are_text() {
        let def = find("appointment-schedules").unwrap();
        assert_eq!(def.id_strategy, IdStrategy::Generated);
        assert_eq!(def.parse_id("1700000000000-abc123"), Some(Value::from("1700000000000-abc123")));
        let id = generate_id();
        let (millis, suffix) = id.split_once('-').unwrap();
        assert!(millis.parse::<i64>().is_ok());
        assert_eq!(suffix.len(), 6);
    }

    #[test]
    fn filter_options_cover_audit_columns() {
        let def = find("wards").unwrap();
        let options = def.filter_options();
        assert!(options.check_column("subcountyId"));
        assert!(options.check_column("createdAt"));
        assert!(!options.check_column("password"));
        assert_eq!(options.column_casts.get("subcountyId"), Some(&"bigint"));
    }

    #[test]
    fn column_types_resolve_for_system_columns() {
        let def = find("projects").unwrap();
        assert_eq!(def.column_type("id"), Some(ColumnType::BigInt));
        assert_eq!(def.column_type("voided"), Some(ColumnType::Bool));
        assert_eq!(def.column_type("startDate"), Some(ColumnType::Date));
        assert_eq!(def.column_type("nope"), None);
    }
}
