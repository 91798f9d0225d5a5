use sqlx::PgPool;

/// Shared connection pool, injected into every handler as an `Extension`
#[derive(Clone)]
pub struct DbPool(pub PgPool);
