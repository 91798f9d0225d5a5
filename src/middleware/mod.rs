pub mod actor;
pub mod pool;
pub mod response;

pub use actor::Actor;
pub use pool::DbPool;
pub use response::{ApiResponse, ApiResult};
