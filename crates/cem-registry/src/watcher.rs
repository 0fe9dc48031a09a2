//! Filesystem watching abstraction for the Manifest Registry.
//!
//! The LSP client is the preferred watch source (dynamic registration of
//! `workspace/didChangeWatchedFiles`, handled in the server crate), but a
//! client that doesn't support dynamic registration still needs manifest
//! changes picked up, so the registry can fall back to watching the
//! filesystem itself. [`FileWatcher`] abstracts over that fallback so it can
//! be exercised in tests without touching real inotify/FSEvents state.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::Duration;

use notify_debouncer_mini::{new_debouncer, DebounceEventResult, Debouncer};

use cem_core::{CemError, Result};

/// Debounce window for the local filesystem fallback watcher. Short enough
/// that a reload feels immediate, long enough to coalesce an editor's
/// write-then-rename save sequence into one event.
pub const WATCH_DEBOUNCE: Duration = Duration::from_millis(50);

/// A single coalesced filesystem change relevant to manifest discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    Created(PathBuf),
    Changed(PathBuf),
    Removed(PathBuf),
}

/// Watches directories for changes and delivers debounced events.
pub trait FileWatcher: Send {
    /// Begins watching `path` recursively.
    fn watch(&mut self, path: &Path) -> Result<()>;

    /// Returns any events debounced since the last call. Never blocks.
    fn poll(&mut self) -> Vec<WatchEvent>;
}

/// A [`FileWatcher`] backed by `notify`, debounced via
/// `notify-debouncer-mini`.
pub struct NotifyFileWatcher {
    debouncer: Debouncer<notify::RecommendedWatcher>,
    events: Receiver<DebounceEventResult>,
}

impl NotifyFileWatcher {
    pub fn new() -> Result<Self> {
        let (tx, rx) = std::sync::mpsc::channel();
        let debouncer = new_debouncer(WATCH_DEBOUNCE, tx)
            .map_err(|err| CemError::Cache(format!("failed to start file watcher: {err}")))?;
        Ok(Self {
            debouncer,
            events: rx,
        })
    }
}

impl FileWatcher for NotifyFileWatcher {
    fn watch(&mut self, path: &Path) -> Result<()> {
        self.debouncer
            .watcher()
            .watch(path, notify::RecursiveMode::Recursive)
            .map_err(|err| CemError::Cache(format!("failed to watch {}: {err}", path.display())))
    }

    fn poll(&mut self) -> Vec<WatchEvent> {
        let mut events = Vec::new();
        loop {
            match self.events.try_recv() {
                Ok(Ok(batch)) => {
                    events.extend(batch.into_iter().map(|event| match event.kind {
                        notify_debouncer_mini::DebouncedEventKind::Any => {
                            if event.path.exists() {
                                WatchEvent::Changed(event.path)
                            } else {
                                WatchEvent::Removed(event.path)
                            }
                        }
                        notify_debouncer_mini::DebouncedEventKind::AnyContinuous => {
                            WatchEvent::Changed(event.path)
                        }
                        _ => WatchEvent::Changed(event.path),
                    }));
                }
                Ok(Err(error)) => {
                    tracing::warn!(%error, "file watcher error");
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => break,
            }
        }
        events
    }
}

/// An in-memory [`FileWatcher`] test double: records watched paths and
/// replays events pushed with [`InMemoryFileWatcher::push`].
#[derive(Debug, Default)]
pub struct InMemoryFileWatcher {
    watched: Vec<PathBuf>,
    pending: Vec<WatchEvent>,
}

impl InMemoryFileWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: WatchEvent) {
        self.pending.push(event);
    }

    pub fn watched_paths(&self) -> &[PathBuf] {
        &self.watched
    }
}

impl FileWatcher for InMemoryFileWatcher {
    fn watch(&mut self, path: &Path) -> Result<()> {
        self.watched.push(path.to_path_buf());
        Ok(())
    }

    fn poll(&mut self) -> Vec<WatchEvent> {
        std::mem::take(&mut self.pending)
    }
}
