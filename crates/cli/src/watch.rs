use anyhow::Result;
use homespace_core::channel::{Command, Event, HomeSpace};
use homespace_core::HomeLayout;
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Watches the today and tags directories and hands a fresh `loadHome` event
/// to `emit` after every burst of changes.
pub async fn watch_home<F>(space: HomeSpace, mut emit: F) -> Result<()>
where
    F: FnMut(&Event) -> Result<()>,
{
    let layout = space.layout().clone();
    let watch_list = watch_targets(&layout);

    let (tx, mut rx) = mpsc::channel(256);
    let mut watcher: RecommendedWatcher = Watcher::new(
        move |res: notify::Result<notify::Event>| {
            let _ = tx.blocking_send(res);
        },
        notify::Config::default().with_poll_interval(Duration::from_secs(2)),
    )?;
    for p in &watch_list {
        tokio::fs::create_dir_all(p).await?;
        watcher.watch(p, RecursiveMode::Recursive)?;
    }

    info!("watching {} path(s)", watch_list.len());
    emit(&space.handle(Command::LoadHome).await?)?;

    while let Some(first) = rx.recv().await {
        let mut relevant = is_relevant(&first, &layout);
        // Coalesce the rest of the burst into one refresh.
        tokio::time::sleep(Duration::from_millis(200)).await;
        while let Ok(next) = rx.try_recv() {
            relevant |= is_relevant(&next, &layout);
        }
        if !relevant {
            continue;
        }
        match space.handle(Command::LoadHome).await {
            Ok(event) => emit(&event)?,
            Err(e) => warn!(error = %e, "reload after change failed"),
        }
    }
    Ok(())
}

pub fn watch_targets(layout: &HomeLayout) -> Vec<PathBuf> {
    vec![layout.today_dir(), layout.tags_dir()]
}

fn is_relevant(event: &notify::Result<notify::Event>, layout: &HomeLayout) -> bool {
    match event {
        Ok(ev) => {
            debug!(kind = ?ev.kind, paths = ?ev.paths, "fs event");
            !ev.kind.is_access() && ev.paths.iter().any(|p| touches_home(p, layout))
        }
        Err(e) => {
            warn!(error = ?e, "watch error");
            false
        }
    }
}

/// True for paths inside the today or tags directory, ignoring hidden entries.
pub fn touches_home(path: &Path, layout: &HomeLayout) -> bool {
    let hidden = path
        .file_name()
        .and_then(|n| n.to_str())
        .map(|s| s.starts_with('.'))
        .unwrap_or(false);
    !hidden && watch_targets(layout).iter().any(|dir| path.starts_with(dir))
}
