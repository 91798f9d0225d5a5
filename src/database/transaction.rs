use futures::future::BoxFuture;
use sqlx::{PgPool, Postgres, Transaction};

use crate::database::manager::DatabaseError;

pub type Tx = Transaction<'static, Postgres>;

/// Run `work` inside one transaction: commit on `Ok`, roll back on `Err`.
///
/// The connection goes back to the pool on every path, including when the
/// future is dropped mid-flight (sqlx rolls back an uncommitted transaction
/// on drop).
///
/// ```ignore
/// let id = in_transaction(&pool, |tx| Box::pin(async move {
///     let row = fetch_json_optional(&mut **tx, &insert).await?;
///     execute(&mut **tx, &link).await?;
///     Ok(row)
/// })).await?;
/// ```
pub async fn in_transaction<T, E, F>(pool: &PgPool, work: F) -> Result<T, E>
where
    F: for<'c> FnOnce(&'c mut Tx) -> BoxFuture<'c, Result<T, E>>,
    E: From<DatabaseError>,
{
    let mut tx = pool.begin().await.map_err(DatabaseError::from)?;

    match work(&mut tx).await {
        Ok(value) => {
            tx.commit().await.map_err(DatabaseError::from)?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::error!("Transaction rollback failed: {}", rollback_err);
            }
            Err(err)
        }
    }
}
