//! Watch source: keeps the registry in sync with the files on disk.
//!
//! ```text
//! notify ──► Debouncer ──► read file ──► FileRegistry::put_file
//!                                            └──► WatchStatus
//! ```
//!
//! The parent directory of every tracked file is watched, not the file
//! itself: editors that save by writing a new file and renaming it over the
//! old one would otherwise detach the watch after the first save.

mod debouncer;

use debouncer::{ChangeKind, Debouncer};

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use crossbeam::channel::{self, Receiver, select};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::live::{FileRegistry, PutOutcome};
use crate::logger::{status_error, status_success, status_unchanged};

/// Running watcher. Dropping it stops the watch thread.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
}

/// Start watching `files` (absolute paths) and feed changes into `registry`.
///
/// The watch is established before this returns, so any write after it is
/// observed.
pub fn spawn_watcher(
    files: &[PathBuf],
    registry: Arc<FileRegistry>,
    debounce: Duration,
) -> Result<FileWatcher> {
    let (event_tx, event_rx) = channel::unbounded();
    let mut watcher = notify::recommended_watcher(move |res| {
        let _ = event_tx.send(res);
    })
    .context("Failed to create file watcher")?;

    for dir in watch_dirs(files) {
        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch {}", dir.display()))?;
        crate::debug!("watch"; "watching {}", dir.display());
    }

    let tracked: FxHashSet<PathBuf> = files.iter().cloned().collect();
    thread::Builder::new()
        .name("plantlink-watch".into())
        .spawn(move || run_watch_loop(&event_rx, &tracked, &registry, debounce))
        .context("Failed to spawn watch thread")?;

    Ok(FileWatcher { _watcher: watcher })
}

/// Unique parent directories, in first-seen order.
fn watch_dirs(files: &[PathBuf]) -> Vec<PathBuf> {
    let mut seen = FxHashSet::default();
    files
        .iter()
        .filter_map(|file| file.parent())
        .filter(|dir| seen.insert(dir.to_path_buf()))
        .map(Path::to_path_buf)
        .collect()
}

/// Runs until the watcher (and with it the event sender) is dropped.
fn run_watch_loop(
    events: &Receiver<notify::Result<notify::Event>>,
    tracked: &FxHashSet<PathBuf>,
    registry: &FileRegistry,
    debounce: Duration,
) {
    let mut debouncer = Debouncer::new(debounce);
    loop {
        select! {
            recv(events) -> msg => match msg {
                Ok(Ok(event)) => debouncer.add_event(&event),
                Ok(Err(e)) => crate::log!("watch"; "notify error: {}", e),
                Err(_) => break,
            },
            default(debouncer.sleep_duration()) => {
                if let Some(changes) = debouncer.take_if_ready() {
                    apply_changes(changes, tracked, registry);
                }
            }
        }
    }
    crate::debug!("watch"; "stopped");
}

/// Push debounced changes for tracked files into the registry.
///
/// Failures are reported and the previous entry stays in place.
fn apply_changes(
    changes: FxHashMap<PathBuf, ChangeKind>,
    tracked: &FxHashSet<PathBuf>,
    registry: &FileRegistry,
) {
    let mut changes: Vec<_> = changes
        .into_iter()
        .filter(|(path, _)| tracked.contains(path))
        .collect();
    changes.sort_by(|a, b| a.0.cmp(&b.0));

    for (path, kind) in changes {
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());

        match kind {
            ChangeKind::Removed => {
                status_error(&format!("removed: {name}"), "keeping the last version");
            }
            ChangeKind::Written => reload_file(&path, &name, registry),
        }
    }
}

fn reload_file(path: &Path, name: &str, registry: &FileRegistry) {
    let raw = match fs::read(path) {
        Ok(raw) => raw,
        Err(e) => {
            status_error(&format!("failed to read {name}"), &e.to_string());
            return;
        }
    };

    match registry.put_file(path, raw) {
        Ok(PutOutcome::Updated { notified }) => {
            crate::debug!("watch"; "{} waiting page(s) notified", notified);
            status_success(&format!("updated: {name}"));
        }
        Ok(PutOutcome::Unchanged) => status_unchanged(&format!("unchanged: {name}")),
        Err(e) => status_error(&format!("failed to encode {name}"), &format!("{e:#}")),
    }
}
