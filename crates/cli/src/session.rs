use anyhow::{Context, Result};
use homespace_core::channel::HomeSpace;
use homespace_core::config::AppConfig;
use homespace_core::home;
use std::path::PathBuf;

/// Opens the settings DB, resolves today's layout and binds a host to it.
pub async fn open(cfg: &AppConfig, root: Option<PathBuf>, date: Option<&str>) -> Result<HomeSpace> {
    let settings = storage::open_settings(&cfg.database.path)
        .await
        .with_context(|| format!("open settings db {}", cfg.database.path))?;
    let layout = home::initialize(&settings, cfg, root, date).await?;
    Ok(HomeSpace::new(layout)
        .with_conflict_policy(cfg.notes.conflict)
        .with_excludes(cfg.scan.exclude.clone()))
}
