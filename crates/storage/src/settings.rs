//! Key/value settings persisted in the `settings` table.

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;

/// Row id holding the user-chosen root directory.
pub const DEFAULT_DIR_ID: &str = "defaultDir";

#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get(&self, id: &str) -> anyhow::Result<Option<String>>;
    async fn set(&self, id: &str, value: &str) -> anyhow::Result<()>;

    async fn default_dir(&self) -> anyhow::Result<Option<String>> {
        self.get(DEFAULT_DIR_ID).await
    }

    async fn set_default_dir(&self, value: &str) -> anyhow::Result<()> {
        self.set(DEFAULT_DIR_ID, value).await
    }
}

#[derive(Clone)]
pub struct SqliteSettings {
    pool: SqlitePool,
}

impl SqliteSettings {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl SettingsStore for SqliteSettings {
    async fn get(&self, id: &str) -> anyhow::Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM settings WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.and_then(|r| r.get::<Option<String>, _>(0)))
    }

    async fn set(&self, id: &str, value: &str) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO settings (id, value) VALUES (?1, ?2)
            ON CONFLICT(id) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(id)
        .bind(value)
        .execute(&self.pool)
        .await?;
        debug!(id, value, "setting stored");
        Ok(())
    }
}

/// Process-local store, used when no database is wanted (tests, dry runs).
#[derive(Default)]
pub struct MemorySettings {
    values: Mutex<HashMap<String, String>>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SettingsStore for MemorySettings {
    async fn get(&self, id: &str) -> anyhow::Result<Option<String>> {
        let values = self
            .values
            .lock()
            .map_err(|_| anyhow::anyhow!("settings lock poisoned"))?;
        Ok(values.get(id).cloned())
    }

    async fn set(&self, id: &str, value: &str) -> anyhow::Result<()> {
        let mut values = self
            .values
            .lock()
            .map_err(|_| anyhow::anyhow!("settings lock poisoned"))?;
        values.insert(id.to_string(), value.to_string());
        Ok(())
    }
}
