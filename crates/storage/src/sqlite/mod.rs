use std::str::FromStr;
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use thiserror::Error;
use tracing::debug;

use crate::repository::Storage;

mod app_state_repo;
mod course_repo;
mod employee_repo;
mod feedback_repo;
mod mapping;
mod migrate;

/// Portal storage over one `SQLite` database.
#[derive(Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SqliteInitError {
    #[error("cannot open {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: sqlx::Error,
    },
    #[error("schema migration failed: {0}")]
    Migrate(#[from] sqlx::Error),
}

impl SqliteRepository {
    /// Open the database at `database_url`, creating the file if needed.
    /// Foreign keys are enforced on every connection so removing a course
    /// cascades to its modules, lessons and questions.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError::Connect` for a malformed URL or an
    /// unreachable database.
    pub async fn connect(database_url: &str) -> Result<Self, SqliteInitError> {
        let connect_err = |source| SqliteInitError::Connect {
            url: database_url.to_owned(),
            source,
        };
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(connect_err)?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(connect_err)?;
        debug!(database_url, "sqlite pool ready");
        Ok(Self { pool })
    }

    /// Bring the schema up to date.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError::Migrate` if a migration statement fails.
    pub async fn migrate(&self) -> Result<(), SqliteInitError> {
        migrate::run_migrations(&self.pool).await
    }
}

impl Storage {
    /// Open, migrate and wrap a `SQLite` database.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if the database cannot be opened or migrated.
    pub async fn sqlite(database_url: &str) -> Result<Self, SqliteInitError> {
        let repo = SqliteRepository::connect(database_url).await?;
        repo.migrate().await?;
        Ok(Self::from_repository(repo))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_open_mode_is_a_connect_error() {
        let err = SqliteRepository::connect("sqlite:portal.sqlite3?mode=bogus")
            .await
            .err()
            .unwrap();
        assert!(matches!(err, SqliteInitError::Connect { .. }));
    }
}
