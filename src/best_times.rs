//! Fastest completion time per level, persisted as JSON.
//!
//! File layout: `{"entries":[{"level":"Outskirts","millis":41250}]}`.
//! A bad entry is skipped on its own; it never costs the rest of the file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::GameError;
use crate::services::BestTimeStore;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
struct Entry {
    level: String,
    millis: u64,
}

#[derive(Serialize)]
struct FileBody<'a> {
    entries: &'a [Entry],
}

#[derive(Debug)]
struct Writer {
    tx: mpsc::Sender<Vec<Entry>>,
    worker: JoinHandle<()>,
}

#[derive(Debug, Default)]
pub struct BestTimes {
    times: HashMap<String, Duration>,
    writer: Option<Writer>,
}

impl BestTimes {
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Read records from `path`. Fails only when the file cannot be read or
    /// is not a JSON object with an `entries` array.
    pub fn load(path: &Path) -> Result<Self, GameError> {
        let text = std::fs::read_to_string(path)?;
        let root: serde_json::Value = serde_json::from_str(&text)
            .map_err(|e| GameError::Persistence(format!("{}: {e}", path.display())))?;
        let entries = root
            .get("entries")
            .and_then(|v| v.as_array())
            .ok_or_else(|| {
                GameError::Persistence(format!("{}: missing \"entries\" array", path.display()))
            })?;

        let mut store = Self::default();
        for (i, raw) in entries.iter().enumerate() {
            match serde_json::from_value::<Entry>(raw.clone()) {
                Ok(entry) if !entry.level.is_empty() => {
                    store.insert_if_better(&entry.level, Duration::from_millis(entry.millis));
                }
                Ok(_) => tracing::warn!(index = i, "skipping best-time entry with empty level name"),
                Err(e) => tracing::warn!(index = i, error = %e, "skipping malformed best-time entry"),
            }
        }
        tracing::info!(path = %path.display(), levels = store.times.len(), "loaded best times");
        Ok(store)
    }

    /// Load from `path` (empty if absent or unreadable) and write every
    /// improvement back to it from a background thread.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut store = match Self::load(&path) {
            Ok(store) => store,
            Err(GameError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "no best-time file yet");
                Self::default()
            }
            Err(e) => {
                tracing::warn!(error = %e, "could not load best times, starting empty");
                Self::default()
            }
        };
        store.writer = spawn_writer(path);
        store
    }

    pub fn save_to(&self, path: &Path) -> Result<(), GameError> {
        write_entries(path, &self.snapshot())
    }

    /// Records sorted by level name.
    pub fn entries(&self) -> Vec<(String, Duration)> {
        let mut out: Vec<_> = self.times.iter().map(|(k, v)| (k.clone(), *v)).collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }

    fn insert_if_better(&mut self, level: &str, time: Duration) -> bool {
        match self.times.get(level) {
            Some(best) if time >= *best => false,
            _ => {
                self.times.insert(level.to_string(), time);
                true
            }
        }
    }

    fn snapshot(&self) -> Vec<Entry> {
        self.entries()
            .into_iter()
            .map(|(level, d)| Entry {
                level,
                millis: u64::try_from(d.as_millis()).unwrap_or(u64::MAX),
            })
            .collect()
    }
}

impl BestTimeStore for BestTimes {
    fn best_time(&self, level: &str) -> Option<Duration> {
        self.times.get(level).copied()
    }

    fn record_time(&mut self, level: &str, time: Duration) -> bool {
        if !self.insert_if_better(level, time) {
            return false;
        }
        tracing::info!(level_name = level, millis = time.as_millis() as u64, "new best time");
        if let Some(writer) = &self.writer {
            if writer.tx.send(self.snapshot()).is_err() {
                tracing::warn!("best-time writer has gone away; record kept in memory only");
            }
        }
        true
    }
}

/// Pending snapshots are flushed before the store goes away.
impl Drop for BestTimes {
    fn drop(&mut self) {
        if let Some(Writer { tx, worker }) = self.writer.take() {
            drop(tx);
            if worker.join().is_err() {
                tracing::warn!("best-time writer panicked");
            }
        }
    }
}

fn spawn_writer(path: PathBuf) -> Option<Writer> {
    let (tx, rx) = mpsc::channel::<Vec<Entry>>();
    let spawned = thread::Builder::new()
        .name("best-times-writer".into())
        .spawn(move || {
            while let Ok(mut entries) = rx.recv() {
                // Only the newest snapshot matters.
                while let Ok(newer) = rx.try_recv() {
                    entries = newer;
                }
                if let Err(e) = write_entries(&path, &entries) {
                    tracing::warn!(error = %e, "failed to save best times");
                }
            }
        });
    match spawned {
        Ok(worker) => Some(Writer { tx, worker }),
        Err(e) => {
            tracing::warn!(error = %e, "failed to spawn best-time writer");
            None
        }
    }
}

fn write_entries(path: &Path, entries: &[Entry]) -> Result<(), GameError> {
    let body = serde_json::to_string_pretty(&FileBody { entries })
        .map_err(|e| GameError::Persistence(e.to_string()))?;
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, body)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}
