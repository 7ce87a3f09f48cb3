use std::collections::BTreeMap;

use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, ser};
use crate::repository::{AppStateRepository, StorageError};

#[async_trait::async_trait]
impl AppStateRepository for SqliteRepository {
    async fn load_entries(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let rows = sqlx::query("SELECT key, value FROM app_state")
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;

        rows.iter()
            .map(|row| {
                Ok((
                    row.try_get::<String, _>("key").map_err(ser)?,
                    row.try_get::<String, _>("value").map_err(ser)?,
                ))
            })
            .collect()
    }

    async fn put_entry(&self, key: &str, value: &str) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO app_state (key, value) VALUES (?1, ?2)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            ",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(conn)?;
        Ok(())
    }

    async fn remove_entry(&self, key: &str) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM app_state WHERE key = ?1")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(conn)?;
        Ok(())
    }

    async fn apply_entries(&self, entries: &[(&str, Option<String>)]) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;
        for (key, value) in entries {
            match value {
                Some(value) => {
                    sqlx::query(
                        r"
                        INSERT INTO app_state (key, value) VALUES (?1, ?2)
                        ON CONFLICT(key) DO UPDATE SET value = excluded.value
                        ",
                    )
                    .bind(*key)
                    .bind(value.as_str())
                    .execute(&mut *tx)
                    .await
                    .map_err(conn)?;
                }
                None => {
                    sqlx::query("DELETE FROM app_state WHERE key = ?1")
                        .bind(*key)
                        .execute(&mut *tx)
                        .await
                        .map_err(conn)?;
                }
            }
        }
        tx.commit().await.map_err(conn)?;
        Ok(())
    }
}
