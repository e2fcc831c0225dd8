//! File registry: tracked diagram sources and their encoded tokens.
//!
//! Readers load an immutable snapshot through `ArcSwap` and never wait on
//! writers. Writers encode outside any lock, then publish a new snapshot
//! under `writer` and wake subscribers before returning.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwap;
use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::Mutex;

use super::broker::{Subscription, SubscriptionBroker};
use crate::encode::{self, EncodeError};

/// One tracked file's latest compiled state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub path: PathBuf,
    /// Base name, for display.
    pub display_name: String,
    pub raw: Vec<u8>,
    /// `encode(raw)`, always from the same update as `raw`.
    pub encoded: String,
    pub updated_at: DateTime<Utc>,
}

/// Result of [`FileRegistry::put_file`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    /// Content identical to the stored entry; nothing happened.
    Unchanged,
    /// Entry replaced; `notified` subscribers hold a pending wake-up.
    Updated { notified: usize },
}

type Snapshot = BTreeMap<PathBuf, Arc<FileEntry>>;

/// Registry of tracked files, shared by the watcher and HTTP handlers.
pub struct FileRegistry {
    entries: ArcSwap<Snapshot>,
    /// Serializes snapshot publication.
    writer: Mutex<()>,
    broker: Arc<SubscriptionBroker>,
}

impl FileRegistry {
    pub fn new(broker: Arc<SubscriptionBroker>) -> Self {
        Self {
            entries: ArcSwap::from_pointee(Snapshot::new()),
            writer: Mutex::new(()),
            broker,
        }
    }

    pub fn broker(&self) -> &Arc<SubscriptionBroker> {
        &self.broker
    }

    /// Insert or replace the entry for `path`.
    ///
    /// Identical content is a no-op. On encode failure the stored entry is
    /// left untouched.
    pub fn put_file(&self, path: &Path, raw: Vec<u8>) -> Result<PutOutcome, EncodeError> {
        if self.is_current(path, &raw) {
            return Ok(PutOutcome::Unchanged);
        }

        let encoded = encode::encode(&raw)?;

        let _writer = self.writer.lock();
        let current = self.entries.load_full();
        let previous = current.get(path);
        if previous.is_some_and(|entry| entry.raw == raw) {
            return Ok(PutOutcome::Unchanged);
        }

        let entry = FileEntry {
            path: path.to_path_buf(),
            display_name: display_name(path),
            raw,
            encoded,
            updated_at: next_timestamp(previous.map(|entry| entry.updated_at)),
        };

        let mut next = Snapshot::clone(&current);
        next.insert(entry.path.clone(), Arc::new(entry));
        self.entries.store(Arc::new(next));

        // Published before notifying: see `SubscriptionBroker::register_unless`.
        let notified = self.broker.notify_all();
        Ok(PutOutcome::Updated { notified })
    }

    /// Copies of all entries, sorted by path.
    pub fn get_files(&self) -> Vec<FileEntry> {
        self.entries
            .load()
            .values()
            .map(|entry| FileEntry::clone(entry))
            .collect()
    }

    /// Copy of the entry for `path`, if tracked.
    #[cfg(test)]
    pub fn get_file(&self, path: &Path) -> Option<FileEntry> {
        self.entries
            .load()
            .get(path)
            .map(|entry| FileEntry::clone(entry))
    }

    pub fn len(&self) -> usize {
        self.entries.load().len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.load().is_empty()
    }

    /// Newest `updated_at` across all entries.
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.entries
            .load()
            .values()
            .map(|entry| entry.updated_at)
            .max()
    }

    /// Whether any entry changed after `since`, at full precision.
    pub fn changed_since(&self, since: DateTime<Utc>) -> bool {
        self.last_updated().is_some_and(|updated| updated > since)
    }

    /// Subscribe to the next change, unless one already happened after
    /// `since`. Check and registration are a single step.
    pub fn subscribe_since(&self, since: DateTime<Utc>) -> Option<Subscription> {
        self.broker.register_unless(|| self.changed_since(since))
    }

    fn is_current(&self, path: &Path, raw: &[u8]) -> bool {
        self.entries
            .load()
            .get(path)
            .is_some_and(|entry| entry.raw == raw)
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// Current time, nudged past `previous` so an entry's timestamp strictly
/// increases even when the clock does not.
fn next_timestamp(previous: Option<DateTime<Utc>>) -> DateTime<Utc> {
    let now = Utc::now();
    match previous {
        Some(previous) if now <= previous => previous + TimeDelta::nanoseconds(1),
        _ => now,
    }
}
