//! Strategic plan import from CIDP spreadsheets.
//!
//! `workbook::preview` reads and maps an upload without touching the
//! database; `upsert::import_rows` writes confirmed rows.

pub mod headers;
pub mod upsert;
pub mod workbook;

use std::collections::BTreeMap;

use crate::database::DatabaseError;

pub use upsert::{import_rows, ImportSummary};
pub use workbook::{preview, ImportPreview};

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("Could not read workbook: {0}")]
    Workbook(#[from] calamine::Error),
    #[error("Workbook has no sheets")]
    EmptyWorkbook,
    #[error("First row must contain column headers")]
    MissingHeaderRow,
    #[error("No data to import")]
    NoRows,
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("{} row(s) failed to import", .0.len())]
    Rows(BTreeMap<String, String>),
    #[error(transparent)]
    Database(#[from] DatabaseError),
}
