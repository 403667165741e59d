use choir_core::error::CoreError;
use sqlx::postgres::PgPoolOptions;

pub mod models;
pub mod repositories;
pub mod store;

pub use store::{PgCatalog, PgMembers, PgPracticeStore};

pub type DbPool = sqlx::PgPool;

/// SQLSTATE codes PostgreSQL uses when a transaction lost a race.
const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";
const FOREIGN_KEY_VIOLATION: &str = "23503";
const CHECK_VIOLATION: &str = "23514";

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

/// Round-trip a trivial query to confirm the database is reachable.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply pending migrations from `crates/db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// Translate a driver error into the domain error taxonomy.
pub fn map_db_error(err: sqlx::Error) -> CoreError {
    if let sqlx::Error::Database(db_err) = &err {
        match db_err.code().as_deref() {
            Some(SERIALIZATION_FAILURE) | Some(DEADLOCK_DETECTED) => {
                return CoreError::Concurrency(db_err.message().to_string());
            }
            Some(FOREIGN_KEY_VIOLATION) => {
                return CoreError::Validation(
                    "referenced member or lyric does not exist".to_string(),
                );
            }
            Some(CHECK_VIOLATION) => {
                return CoreError::Validation(db_err.message().to_string());
            }
            _ => {}
        }
    }

    tracing::error!(error = %err, "Database error");
    CoreError::Internal(err.to_string())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn pool_errors_are_internal() {
        assert_matches!(map_db_error(sqlx::Error::PoolTimedOut), CoreError::Internal(_));
    }

    #[test]
    fn missing_rows_are_internal() {
        assert_matches!(map_db_error(sqlx::Error::RowNotFound), CoreError::Internal(_));
    }
}
