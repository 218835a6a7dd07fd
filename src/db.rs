use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool, PoolError};

use crate::domain::errors::DomainError;

pub type DbPool = Pool<ConnectionManager<PgConnection>>;

pub fn create_pool(database_url: &str) -> Result<DbPool, PoolError> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    Pool::builder().build(manager)
}

/// Runs `f` with a pooled connection on the blocking thread pool.
pub async fn run_blocking<T, F>(pool: &DbPool, f: F) -> Result<T, DomainError>
where
    T: Send + 'static,
    F: FnOnce(&mut PgConnection) -> Result<T, DomainError> + Send + 'static,
{
    let pool = pool.clone();
    tokio::task::spawn_blocking(move || {
        let mut conn = pool.get()?;
        f(&mut *conn)
    })
    .await
    .map_err(|e| DomainError::Internal(format!("database task failed: {e}")))?
}
