// 📋 Expense List - live snapshot of the store, sorted by date
//
// The list keeps a subscription to the store and re-reads its snapshot when
// a change arrives. Row deletes resolve indices against the snapshot first,
// so removing one row never shifts which identities the others point at.

use crate::error::Result;
use crate::expense::Expense;
use crate::format::{format_currency, format_row_date};
use crate::store::{Store, StoreEvent};
use chrono::Local;
use std::collections::BTreeSet;
use std::sync::mpsc::Receiver;

const PAGE_SIZE: usize = 20;

/// One rendered row of the list
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseRow {
    pub date: String,
    pub name: String,
    pub value: String,
}

impl ExpenseRow {
    pub fn from_expense(expense: &Expense, currency_symbol: &str) -> Self {
        Self {
            date: format_row_date(&expense.date.with_timezone(&Local)),
            name: expense.name.clone(),
            value: format_currency(expense.value, currency_symbol),
        }
    }
}

pub struct ExpenseList {
    expenses: Vec<Expense>,
    events: Receiver<StoreEvent>,
    cursor: Option<usize>,
    marked: BTreeSet<usize>,
}

impl ExpenseList {
    pub fn new(store: &mut Store) -> Result<Self> {
        let events = store.subscribe();
        let mut list = Self {
            expenses: Vec::new(),
            events,
            cursor: None,
            marked: BTreeSet::new(),
        };
        list.reload(store)?;
        Ok(list)
    }

    /// Drain pending change events; re-read the snapshot if any arrived.
    /// Returns true when the snapshot was refreshed.
    pub fn sync(&mut self, store: &Store) -> Result<bool> {
        let changed = self.events.try_iter().count() > 0;
        if changed {
            self.reload(store)?;
        }
        Ok(changed)
    }

    fn reload(&mut self, store: &Store) -> Result<()> {
        let selected_id = self.selected().map(|e| e.id.clone());
        self.expenses = store.list()?;
        self.marked.clear();

        // Follow the selected record if it still exists, else clamp
        self.cursor = match selected_id.and_then(|id| self.position(&id)) {
            Some(i) => Some(i),
            None if self.expenses.is_empty() => None,
            None => Some(self.cursor.unwrap_or(0).min(self.expenses.len() - 1)),
        };

        Ok(())
    }

    pub fn expenses(&self) -> &[Expense] {
        &self.expenses
    }

    pub fn len(&self) -> usize {
        self.expenses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expenses.is_empty()
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.expenses.iter().position(|e| e.id == id)
    }

    pub fn rows(&self, currency_symbol: &str) -> Vec<ExpenseRow> {
        self.expenses
            .iter()
            .map(|e| ExpenseRow::from_expense(e, currency_symbol))
            .collect()
    }

    // ========================================================================
    // CURSOR & SELECTION
    // ========================================================================

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn selected(&self) -> Option<&Expense> {
        self.cursor.and_then(|i| self.expenses.get(i))
    }

    pub fn select(&mut self, index: usize) {
        if index < self.expenses.len() {
            self.cursor = Some(index);
        }
    }

    pub fn next(&mut self) {
        let len = self.expenses.len();
        if len == 0 {
            return;
        }
        let i = match self.cursor {
            Some(i) if i >= len - 1 => 0,
            Some(i) => i + 1,
            None => 0,
        };
        self.cursor = Some(i);
    }

    pub fn previous(&mut self) {
        let len = self.expenses.len();
        if len == 0 {
            return;
        }
        let i = match self.cursor {
            Some(0) => len - 1,
            Some(i) => i - 1,
            None => 0,
        };
        self.cursor = Some(i);
    }

    pub fn page_down(&mut self) {
        let len = self.expenses.len();
        if len == 0 {
            return;
        }
        let i = self.cursor.map_or(0, |i| (i + PAGE_SIZE).min(len - 1));
        self.cursor = Some(i);
    }

    pub fn page_up(&mut self) {
        if self.expenses.is_empty() {
            return;
        }
        let i = self.cursor.map_or(0, |i| i.saturating_sub(PAGE_SIZE));
        self.cursor = Some(i);
    }

    pub fn first(&mut self) {
        if !self.expenses.is_empty() {
            self.cursor = Some(0);
        }
    }

    pub fn last(&mut self) {
        if !self.expenses.is_empty() {
            self.cursor = Some(self.expenses.len() - 1);
        }
    }

    /// Mark or unmark the row under the cursor for a multi-row delete
    pub fn toggle_mark(&mut self) {
        if let Some(i) = self.cursor {
            if !self.marked.remove(&i) {
                self.marked.insert(i);
            }
        }
    }

    pub fn is_marked(&self, index: usize) -> bool {
        self.marked.contains(&index)
    }

    pub fn marked_count(&self) -> usize {
        self.marked.len()
    }

    pub fn clear_marks(&mut self) {
        self.marked.clear();
    }

    // ========================================================================
    // DELETION
    // ========================================================================

    /// Delete the marked rows, or the row under the cursor when none are marked.
    pub fn delete_selected(&mut self, store: &mut Store) -> Result<usize> {
        let indices: Vec<usize> = if self.marked.is_empty() {
            self.cursor.into_iter().collect()
        } else {
            self.marked.iter().copied().collect()
        };
        self.delete_indices(store, &indices)
    }

    /// Delete the rows at `indices` of the current snapshot.
    pub fn delete_indices(&mut self, store: &mut Store, indices: &[usize]) -> Result<usize> {
        // Resolve every index before the first removal
        let ids: Vec<String> = indices
            .iter()
            .filter_map(|&i| self.expenses.get(i))
            .map(|e| e.id.clone())
            .collect();

        if ids.is_empty() {
            return Ok(0);
        }

        let removed = store.delete_many(&ids)?;
        self.sync(store)?;
        Ok(removed)
    }
}
