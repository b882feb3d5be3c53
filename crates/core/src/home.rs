//! Startup: resolve the root directory from settings and build today's layout.

use crate::config::AppConfig;
use crate::layout::{parse_date, HomeLayout};
use anyhow::Context;
use chrono::{NaiveDate, Utc};
use std::path::{Path, PathBuf};
use storage::SettingsStore;
use tracing::info;

const ROOT_DIR_NAME: &str = "homespace";

/// Returns the stored `defaultDir`, or persists and creates one on first
/// run: `<chosen>/homespace`, else the configured `home.root` as is, else
/// `~/homespace`.
pub async fn resolve_root(
    settings: &dyn SettingsStore,
    cfg: &AppConfig,
    chosen: Option<PathBuf>,
) -> anyhow::Result<PathBuf> {
    if let Some(dir) = settings.default_dir().await.context("read defaultDir")? {
        return Ok(PathBuf::from(dir));
    }

    let root = chosen
        .as_deref()
        .map(root_in)
        .or_else(|| cfg.home.root.as_ref().map(PathBuf::from))
        .unwrap_or_else(default_root);
    settings
        .set_default_dir(&root.to_string_lossy())
        .await
        .context("store defaultDir")?;
    tokio::fs::create_dir_all(&root)
        .await
        .with_context(|| format!("create home dir {}", root.display()))?;
    info!(root = %root.display(), "home directory initialised");
    Ok(root)
}

/// The `homespace` directory inside a picked parent directory.
pub fn root_in(parent: &Path) -> PathBuf {
    parent.join(ROOT_DIR_NAME)
}

pub fn default_root() -> PathBuf {
    root_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
}

pub fn today(cfg: &AppConfig, date: Option<&str>) -> anyhow::Result<NaiveDate> {
    match date.or(cfg.home.date.as_deref()) {
        Some(raw) => parse_date(raw).with_context(|| format!("invalid date {raw:?}")),
        None => Ok(Utc::now().date_naive()),
    }
}

/// Resolves the root, builds today's layout and makes sure its directory exists.
///
/// `root_override` bypasses the stored setting without changing it.
pub async fn initialize(
    settings: &dyn SettingsStore,
    cfg: &AppConfig,
    root_override: Option<PathBuf>,
    date: Option<&str>,
) -> anyhow::Result<HomeLayout> {
    let root = match root_override {
        Some(root) => root,
        None => resolve_root(settings, cfg, None).await?,
    };
    let layout = HomeLayout::from_config(root, today(cfg, date)?, &cfg.home);
    layout.ensure_dirs().await?;
    info!(today = %layout.today_dir().display(), "today directory ready");
    Ok(layout)
}
