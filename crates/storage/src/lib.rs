//! Storage layer: SQLite schemas and helpers.
//!
//! Holds DB pool setup, the migration runner and the settings table.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

pub mod settings;

pub use settings::{SettingsStore, SqliteSettings, DEFAULT_DIR_ID};

pub async fn connect(database_url: &str) -> anyhow::Result<SqlitePool> {
    let mut url = database_url.to_string();
    if !database_url.starts_with("sqlite:") {
        let path = std::path::PathBuf::from(database_url);
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let norm = path.to_string_lossy().replace('\\', "/");
        if path.is_absolute() {
            url = format!("sqlite:///{}", norm.trim_start_matches('/'));
        } else {
            url = format!("sqlite://{}", norm);
        }
    }
    let options = SqliteConnectOptions::from_str(&url)?.create_if_missing(true);
    let mut opts = SqlitePoolOptions::new();
    if url.contains("memory") {
        opts = opts.max_connections(1);
    } else {
        opts = opts.max_connections(5);
    }
    let pool = opts.connect_with(options).await?;
    Ok(pool)
}

pub async fn migrate(pool: &SqlitePool) -> anyhow::Result<()> {
    // Applies SQLx migrations located in crates/storage/migrations.
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Connects and migrates in one step, returning a ready settings store.
pub async fn open_settings(database_url: &str) -> anyhow::Result<SqliteSettings> {
    let pool = connect(database_url).await?;
    migrate(&pool).await?;
    Ok(SqliteSettings::new(pool))
}
