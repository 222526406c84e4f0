use crate::error::{Error, Result};
use crate::scanner::{CacheEntry, Inventory, total_size};
use std::collections::HashSet;
use std::ffi::OsStr;

/// A selection request. Select-all is its own variant so it can never be
/// confused with a real entry index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Entry(usize),
    All,
}

/// Cursor rows: the select-all row comes first, then one row per entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cursor {
    #[default]
    SelectAll,
    Entry(usize),
}

/// The inventory of one scan together with its selection flags.
///
/// The selected total is maintained incrementally on every toggle and rebuilt
/// from scratch whenever the set of entries changes. Whether everything is
/// selected is always derived from the per-entry flags.
#[derive(Debug, Default)]
pub struct SelectionStore {
    entries: Inventory,
    cursor: Cursor,
    selected_total: u64,
    grand_total: u64,
    preselect: bool,
}

impl SelectionStore {
    /// `preselect` marks every entry of each newly installed inventory.
    pub fn new(preselect: bool) -> Self {
        Self {
            preselect,
            ..Self::default()
        }
    }

    pub fn entries(&self) -> &[CacheEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn selected_total(&self) -> u64 {
        self.selected_total
    }

    pub fn grand_total(&self) -> u64 {
        self.grand_total
    }

    pub fn selected_count(&self) -> usize {
        self.entries.iter().filter(|e| e.selected).count()
    }

    /// True when the inventory is non-empty and every entry is selected.
    pub fn all_selected(&self) -> bool {
        !self.entries.is_empty() && self.entries.iter().all(|e| e.selected)
    }

    /// Swaps in a fresh inventory. Selection never carries over from the
    /// previous one.
    pub fn replace_inventory(&mut self, inventory: Inventory) {
        self.entries = inventory;
        for entry in &mut self.entries {
            entry.selected = self.preselect;
        }
        self.clamp_cursor();
        self.recompute_totals();
    }

    pub fn toggle(&mut self, toggle: Toggle) -> Result<()> {
        match toggle {
            Toggle::Entry(index) => self.toggle_entry(index),
            Toggle::All => {
                self.toggle_all();
                Ok(())
            }
        }
    }

    pub fn toggle_entry(&mut self, index: usize) -> Result<()> {
        let len = self.entries.len();
        let entry = self
            .entries
            .get_mut(index)
            .ok_or(Error::IndexOutOfRange { index, len })?;

        entry.selected = !entry.selected;
        if entry.selected {
            self.selected_total += entry.size_bytes;
        } else {
            self.selected_total -= entry.size_bytes;
        }
        Ok(())
    }

    pub fn toggle_all(&mut self) {
        let new_state = !self.all_selected();
        for entry in &mut self.entries {
            entry.selected = new_state;
        }
        self.selected_total = if new_state { self.grand_total } else { 0 };
    }

    pub fn toggle_at_cursor(&mut self) -> Result<()> {
        match self.cursor {
            Cursor::SelectAll => self.toggle(Toggle::All),
            Cursor::Entry(index) => self.toggle(Toggle::Entry(index)),
        }
    }

    pub fn move_up(&mut self) {
        self.cursor = match self.cursor {
            Cursor::SelectAll if self.entries.is_empty() => Cursor::SelectAll,
            Cursor::SelectAll => Cursor::Entry(self.entries.len() - 1),
            Cursor::Entry(0) => Cursor::SelectAll,
            Cursor::Entry(i) => Cursor::Entry(i - 1),
        };
    }

    pub fn move_down(&mut self) {
        self.cursor = match self.cursor {
            Cursor::SelectAll if self.entries.is_empty() => Cursor::SelectAll,
            Cursor::SelectAll => Cursor::Entry(0),
            Cursor::Entry(i) if i + 1 < self.entries.len() => Cursor::Entry(i + 1),
            Cursor::Entry(_) => Cursor::SelectAll,
        };
    }

    /// Point-in-time copy of the selected entries.
    pub fn snapshot_selected(&self) -> Vec<CacheEntry> {
        self.entries.iter().filter(|e| e.selected).cloned().collect()
    }

    /// Drops the entries with these on-disk names after a purge attempt.
    /// Remaining entries keep their flags.
    pub fn remove_entries<S: AsRef<OsStr>>(&mut self, file_names: &[S]) {
        let file_names: HashSet<&OsStr> = file_names.iter().map(AsRef::as_ref).collect();
        self.entries
            .retain(|e| !file_names.contains(e.file_name.as_os_str()));
        self.clamp_cursor();
        self.recompute_totals();
    }

    fn clamp_cursor(&mut self) {
        if let Cursor::Entry(i) = self.cursor {
            self.cursor = match self.entries.len() {
                0 => Cursor::SelectAll,
                len => Cursor::Entry(i.min(len - 1)),
            };
        }
    }

    fn recompute_totals(&mut self) {
        self.grand_total = total_size(&self.entries);
        self.selected_total = self
            .entries
            .iter()
            .filter(|e| e.selected)
            .map(|e| e.size_bytes)
            .sum();
    }
}
