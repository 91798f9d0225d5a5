pub mod manager;
pub mod query_builder;
pub mod record;
pub mod transaction;

pub use manager::{DatabaseError, DatabaseManager};
pub use record::{Operation, Record, RecordError};
pub use transaction::{in_transaction, Tx};
