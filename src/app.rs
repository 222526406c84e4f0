use crate::config::Config;
use crate::error::{Error, Result, Task};
use crate::purge::{PurgeReport, spawn_purge};
use crate::scanner::{Inventory, ScanOptions, spawn_scan};
use crate::selection::{SelectionStore, Toggle};
use crate::units::format_size;
use console::Key;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use tracing::{debug, error};

/// Everything the controller reacts to. Background jobs report back through
/// the same channel as keyboard input.
#[derive(Debug)]
pub enum Event {
    Key(Key),
    Tick,
    ScanFinished(Result<Inventory>),
    PurgeFinished(PurgeReport),
    /// The keyboard can no longer be read.
    InputClosed,
}

/// Controller state. Only this struct mutates the inventory; background jobs
/// work on copies and hand results back as events.
pub struct App {
    root: PathBuf,
    scan_options: ScanOptions,
    store: SelectionStore,
    scanning: bool,
    purging: bool,
    status: Option<String>,
    last_error: Option<String>,
    freed_bytes: u64,
    ticks: usize,
    quit_requested: bool,
}

impl App {
    pub fn new(config: &Config) -> Self {
        Self {
            root: config.root.clone(),
            scan_options: config.scan,
            store: SelectionStore::new(config.preselect),
            scanning: false,
            purging: false,
            status: None,
            last_error: None,
            freed_bytes: 0,
            ticks: 0,
            quit_requested: false,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn store(&self) -> &SelectionStore {
        &self.store
    }

    pub fn is_scanning(&self) -> bool {
        self.scanning
    }

    pub fn is_purging(&self) -> bool {
        self.purging
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Bytes released by every purge of this session.
    pub fn freed_bytes(&self) -> u64 {
        self.freed_bytes
    }

    pub fn ticks(&self) -> usize {
        self.ticks
    }

    /// A requested quit waits for an outstanding purge, which cannot be
    /// cancelled.
    pub fn should_quit(&self) -> bool {
        self.quit_requested && !self.purging
    }

    fn ensure_idle(&self) -> Result<()> {
        if self.scanning {
            Err(Error::Busy(Task::Scan))
        } else if self.purging {
            Err(Error::Busy(Task::Purge))
        } else {
            Ok(())
        }
    }

    pub fn request_scan(&mut self, sink: &Sender<Event>) -> Result<()> {
        self.ensure_idle()?;
        self.scanning = true;
        self.status = None;
        spawn_scan(self.root.clone(), self.scan_options, sink.clone());
        Ok(())
    }

    pub fn request_toggle(&mut self, toggle: Toggle) -> Result<()> {
        self.ensure_idle()?;
        self.store.toggle(toggle)
    }

    /// Hands the current selection to a purge worker. Nothing is launched
    /// when the selection is empty.
    pub fn request_purge(&mut self, sink: &Sender<Event>) -> Result<()> {
        self.ensure_idle()?;
        let selected = self.store.snapshot_selected();
        if selected.is_empty() {
            self.status = Some("Nothing selected.".to_string());
            return Ok(());
        }

        self.purging = true;
        self.status = None;
        spawn_purge(self.root.clone(), selected, sink.clone());
        Ok(())
    }

    pub fn handle_event(&mut self, event: Event, sink: &Sender<Event>) -> Result<()> {
        match event {
            Event::Key(key) => self.handle_key(key, sink),
            Event::Tick => {
                self.ticks = self.ticks.wrapping_add(1);
                Ok(())
            }
            Event::ScanFinished(result) => {
                self.finish_scan(result);
                Ok(())
            }
            Event::PurgeFinished(report) => {
                self.finish_purge(report);
                Ok(())
            }
            Event::InputClosed => {
                self.quit_requested = true;
                Ok(())
            }
        }
    }

    fn handle_key(&mut self, key: Key, sink: &Sender<Event>) -> Result<()> {
        let outcome = match key {
            Key::ArrowUp | Key::Char('k') => {
                self.store.move_up();
                Ok(())
            }
            Key::ArrowDown | Key::Char('j') => {
                self.store.move_down();
                Ok(())
            }
            Key::Char(' ') => self.ensure_idle().and_then(|()| self.store.toggle_at_cursor()),
            Key::Char('a') => self.request_toggle(Toggle::All),
            Key::Enter => self.request_purge(sink),
            Key::Char('r') => self.request_scan(sink),
            Key::Escape | Key::Char('q') | Key::CtrlC => {
                self.quit_requested = true;
                if self.purging {
                    self.status = Some("Quitting once the purge finishes.".to_string());
                }
                Ok(())
            }
            _ => Ok(()),
        };

        match outcome {
            Err(Error::Busy(task)) => {
                debug!(%task, ?key, "request rejected while busy");
                self.status = Some(format!("Wait for the {task} to finish."));
                Ok(())
            }
            other => other,
        }
    }

    fn finish_scan(&mut self, result: Result<Inventory>) {
        self.scanning = false;
        match result {
            Ok(inventory) => {
                self.store.replace_inventory(inventory);
                self.last_error = None;
            }
            Err(err) => {
                // the previous inventory stays on screen
                error!(error = %err, "scan failed");
                self.last_error = Some(err.to_string());
            }
        }
    }

    fn finish_purge(&mut self, report: PurgeReport) {
        self.purging = false;
        self.store.remove_entries(&report.attempted);
        self.freed_bytes += report.freed_bytes;

        let mut status = format!(
            "Freed {} from {} entries.",
            format_size(report.freed_bytes),
            report.removed_count()
        );
        if !report.is_clean() {
            let names: Vec<&str> = report.failures.iter().map(|f| f.name.as_str()).collect();
            status.push_str(&format!(
                " {} could not be removed: {}",
                report.failures.len(),
                names.join(", ")
            ));
        }
        self.status = Some(status);
    }
}
