use crate::app::Event;
use crate::scanner::CacheEntry;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurgeFailure {
    pub name: String,
    pub reason: String,
}

/// Outcome of one purge pass.
///
/// `attempted` holds the on-disk name of every entry a removal was tried for,
/// whether or not it succeeded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PurgeReport {
    pub attempted: Vec<OsString>,
    pub failures: Vec<PurgeFailure>,
    pub freed_bytes: u64,
}

impl PurgeReport {
    pub fn removed_count(&self) -> usize {
        self.attempted.len() - self.failures.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Deletes each entry beneath `root`, continuing past failures.
pub fn purge(root: &Path, entries: &[CacheEntry]) -> PurgeReport {
    let mut report = PurgeReport::default();

    for entry in entries {
        let path = root.join(&entry.file_name);
        let result = if entry.is_dir {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };

        match result {
            Ok(()) => report.freed_bytes += entry.size_bytes,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to remove entry");
                report.failures.push(PurgeFailure {
                    name: entry.name.clone(),
                    reason: e.to_string(),
                });
            }
        }
        report.attempted.push(entry.file_name.clone());
    }

    info!(
        root = %root.display(),
        attempted = report.attempted.len(),
        failed = report.failures.len(),
        freed = report.freed_bytes,
        "purge finished"
    );
    report
}

/// Runs [`purge`] on its own thread and posts exactly one
/// `Event::PurgeFinished` to `sink`. The worker only sees the snapshot it
/// was handed.
pub fn spawn_purge(root: PathBuf, entries: Vec<CacheEntry>, sink: Sender<Event>) -> JoinHandle<()> {
    thread::spawn(move || {
        info!(root = %root.display(), entries = entries.len(), "purge started");
        let report = purge(&root, &entries);
        let _ = sink.send(Event::PurgeFinished(report));
    })
}
