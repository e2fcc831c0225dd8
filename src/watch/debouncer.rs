//! Event coalescing for the watcher.
//!
//! Editors rarely save with a single write: truncate + write, write to a
//! temp file + rename, or remove + create are all common. The debouncer
//! collapses everything that happens to one path within the quiet window
//! into a single [`ChangeKind`].

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use notify::EventKind;
use notify::event::ModifyKind;
use rustc_hash::FxHashMap;

use crate::utils::path::normalize_path;

/// Sleep used while nothing is pending.
const IDLE_SLEEP: Duration = Duration::from_secs(3600);

/// What happened to a path during one window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// Created, modified or renamed into place: re-read it.
    Written,
    /// Gone at the end of the window.
    Removed,
}

impl ChangeKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Written => "written",
            Self::Removed => "removed",
        }
    }
}

/// Timing and dedup only; knows nothing about which paths matter.
pub struct Debouncer {
    window: Duration,
    pub(super) changes: FxHashMap<PathBuf, ChangeKind>,
    pub(super) last_event: Option<Instant>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            changes: FxHashMap::default(),
            last_event: None,
        }
    }

    /// Record a notify event. The latest kind per path wins.
    pub fn add_event(&mut self, event: &notify::Event) {
        let kind = match event.kind {
            EventKind::Create(_) => ChangeKind::Written,
            EventKind::Remove(_) => ChangeKind::Removed,
            // Ignore metadata-only changes (mtime/atime/chmod noise)
            EventKind::Modify(ModifyKind::Metadata(_)) => return,
            EventKind::Modify(_) => ChangeKind::Written,
            _ => return,
        };

        crate::debug!("watch"; "raw notify: {:?} {:?}", event.kind, event.paths);

        for path in &event.paths {
            if is_temp_file(path) {
                continue;
            }
            self.record(normalize_path(path), kind);
        }
    }

    fn record(&mut self, path: PathBuf, kind: ChangeKind) {
        // Every accepted event restarts the quiet window.
        self.last_event = Some(Instant::now());

        if self.changes.get(&path) != Some(&kind) {
            crate::debug!("watch"; "{}: {}", kind.label(), path.display());
            self.changes.insert(path, kind);
        }
    }

    /// Take pending changes once the window has been quiet.
    pub fn take_if_ready(&mut self) -> Option<FxHashMap<PathBuf, ChangeKind>> {
        if !self.is_ready() {
            return None;
        }
        self.last_event = None;
        Some(std::mem::take(&mut self.changes))
    }

    pub fn is_ready(&self) -> bool {
        self.last_event
            .is_some_and(|last| last.elapsed() >= self.window && !self.changes.is_empty())
    }

    /// Precise sleep duration until the next possible ready time.
    pub fn sleep_duration(&self) -> Duration {
        let Some(last_event) = self.last_event else {
            return IDLE_SLEEP;
        };
        self.window
            .saturating_sub(last_event.elapsed())
            .max(Duration::from_millis(1))
    }
}

/// Check if path is a temp/backup file (editor artifacts).
pub fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "swx" | "tmp")
        || name.ends_with('~')
        || name.starts_with(".#")
        || name == "4913"
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(30);

    fn make_event(paths: &[&str], kind: EventKind) -> notify::Event {
        notify::Event {
            kind,
            paths: paths.iter().map(PathBuf::from).collect(),
            attrs: Default::default(),
        }
    }

    fn modify_kind() -> EventKind {
        EventKind::Modify(ModifyKind::Data(notify::event::DataChange::Any))
    }

    fn create_kind() -> EventKind {
        EventKind::Create(notify::event::CreateKind::File)
    }

    fn remove_kind() -> EventKind {
        EventKind::Remove(notify::event::RemoveKind::File)
    }

    #[test]
    fn test_debouncer_empty() {
        let mut debouncer = Debouncer::new(WINDOW);
        assert!(!debouncer.is_ready());
        assert!(debouncer.take_if_ready().is_none());
        assert_eq!(debouncer.sleep_duration(), IDLE_SLEEP);
    }

    #[test]
    fn test_event_kinds() {
        let mut debouncer = Debouncer::new(WINDOW);
        debouncer.add_event(&make_event(&["/tmp/plantlink/a.puml"], create_kind()));
        debouncer.add_event(&make_event(&["/tmp/plantlink/b.puml"], modify_kind()));
        debouncer.add_event(&make_event(&["/tmp/plantlink/c.puml"], remove_kind()));

        assert_eq!(debouncer.changes.len(), 3);
        assert_eq!(
            debouncer.changes[&PathBuf::from("/tmp/plantlink/a.puml")],
            ChangeKind::Written
        );
        assert_eq!(
            debouncer.changes[&PathBuf::from("/tmp/plantlink/c.puml")],
            ChangeKind::Removed
        );
    }

    #[test]
    fn test_metadata_only_ignored() {
        let mut debouncer = Debouncer::new(WINDOW);
        let chmod = EventKind::Modify(ModifyKind::Metadata(
            notify::event::MetadataKind::Permissions,
        ));
        debouncer.add_event(&make_event(&["/tmp/plantlink/a.puml"], chmod));
        assert!(debouncer.changes.is_empty());
        assert!(debouncer.last_event.is_none());
    }

    #[test]
    fn test_temp_files_ignored() {
        let mut debouncer = Debouncer::new(WINDOW);
        debouncer.add_event(&make_event(
            &["/tmp/plantlink/.a.puml.swp", "/tmp/plantlink/a.puml~", "/tmp/plantlink/4913"],
            modify_kind(),
        ));
        assert!(debouncer.changes.is_empty());
    }

    #[test]
    fn test_remove_then_create_is_written() {
        let mut debouncer = Debouncer::new(WINDOW);
        debouncer.add_event(&make_event(&["/tmp/plantlink/a.puml"], remove_kind()));
        debouncer.add_event(&make_event(&["/tmp/plantlink/a.puml"], create_kind()));

        assert_eq!(
            debouncer.changes[&PathBuf::from("/tmp/plantlink/a.puml")],
            ChangeKind::Written
        );
    }

    #[test]
    fn test_write_then_remove_is_removed() {
        let mut debouncer = Debouncer::new(WINDOW);
        debouncer.add_event(&make_event(&["/tmp/plantlink/gone.puml"], create_kind()));
        debouncer.add_event(&make_event(&["/tmp/plantlink/gone.puml"], remove_kind()));
        assert_eq!(
            debouncer.changes[&PathBuf::from("/tmp/plantlink/gone.puml")],
            ChangeKind::Removed
        );
    }

    #[test]
    fn test_repeated_writes_coalesce() {
        let mut debouncer = Debouncer::new(WINDOW);
        for _ in 0..5 {
            debouncer.add_event(&make_event(&["/tmp/plantlink/a.puml"], modify_kind()));
        }
        assert_eq!(debouncer.changes.len(), 1);
    }

    #[test]
    fn test_ready_after_quiet_window() {
        let mut debouncer = Debouncer::new(WINDOW);
        debouncer.add_event(&make_event(&["/tmp/plantlink/a.puml"], modify_kind()));
        assert!(!debouncer.is_ready());
        assert!(debouncer.sleep_duration() <= WINDOW);

        std::thread::sleep(WINDOW + Duration::from_millis(10));
        let changes = debouncer.take_if_ready().unwrap();
        assert_eq!(changes.len(), 1);

        assert!(debouncer.changes.is_empty());
        assert!(!debouncer.is_ready());
    }

    #[test]
    fn test_is_temp_file() {
        assert!(is_temp_file(Path::new("a.puml.bak")));
        assert!(is_temp_file(Path::new(".#a.puml")));
        assert!(!is_temp_file(Path::new("a.puml")));
        assert!(!is_temp_file(Path::new(".hidden.puml")));
    }
}
