// 🗄️ Expense Store - SQLite persistence + change subscriptions
//
// Every mutation is written through immediately (no save call) and then
// published to every live subscriber, so views refresh without polling the DB.

use crate::db;
use crate::error::{Result, StoreError};
use crate::expense::{validate_fields, Expense};
use chrono::{DateTime, SubsecRound, Utc};
use rusqlite::Connection;
use std::path::Path;
use std::sync::mpsc::{channel, Receiver, Sender};

// ============================================================================
// CONFIGURATION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    /// Reject a name already used by another expense
    pub unique_names: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { unique_names: true }
    }
}

// ============================================================================
// CHANGE EVENTS
// ============================================================================

/// Published once per effective mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    Added(Expense),
    Updated(Expense),
    Deleted(String),
}

impl StoreEvent {
    pub fn expense_id(&self) -> &str {
        match self {
            StoreEvent::Added(expense) | StoreEvent::Updated(expense) => &expense.id,
            StoreEvent::Deleted(id) => id,
        }
    }
}

// ============================================================================
// STORE
// ============================================================================

pub struct Store {
    conn: Connection,
    config: StoreConfig,
    subscribers: Vec<Sender<StoreEvent>>,
}

impl Store {
    /// Open (or create) a store backed by a database file
    pub fn open(path: impl AsRef<Path>, config: StoreConfig) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        tracing::info!(path = %path.display(), "opened expense database");
        Self::with_connection(conn, config)
    }

    /// Store that lives only as long as the process
    pub fn open_in_memory(config: StoreConfig) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        tracing::info!("opened in-memory expense database");
        Self::with_connection(conn, config)
    }

    fn with_connection(conn: Connection, config: StoreConfig) -> Result<Self> {
        db::setup_database(&conn)?;
        Ok(Self {
            conn,
            config,
            subscribers: Vec::new(),
        })
    }

    pub fn config(&self) -> StoreConfig {
        self.config
    }

    /// Receive every change made through this store from now on.
    pub fn subscribe(&mut self) -> Receiver<StoreEvent> {
        let (tx, rx) = channel();
        self.subscribers.push(tx);
        rx
    }

    fn publish(&mut self, event: StoreEvent) {
        // Dropped receivers fail to send and are pruned here
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    fn check_name(&self, name: &str, except_id: Option<&str>) -> Result<()> {
        if self.config.unique_names && db::name_taken(&self.conn, name, except_id)? {
            tracing::warn!(name, "rejected duplicate expense name");
            return Err(StoreError::ConstraintViolation(name.to_string()));
        }
        Ok(())
    }

    /// Construct and persist a new expense.
    pub fn add(&mut self, name: &str, date: DateTime<Utc>, value: f64) -> Result<Expense> {
        let name = name.trim();
        validate_fields(name, value)?;
        self.check_name(name, None)?;

        // Stored at second precision; hand back exactly what list() will return
        let expense = Expense::new(name, date.trunc_subsecs(0), value);
        db::insert_expense(&self.conn, &expense)?;
        tracing::info!(id = %expense.id, name = %expense.name, "expense added");

        self.publish(StoreEvent::Added(expense.clone()));
        Ok(expense)
    }

    /// All expenses sorted by date ascending
    pub fn list(&self) -> Result<Vec<Expense>> {
        let expenses = db::get_all_expenses(&self.conn)?;
        tracing::debug!(count = expenses.len(), "listed expenses");
        Ok(expenses)
    }

    pub fn get(&self, id: &str) -> Result<Option<Expense>> {
        Ok(db::get_expense(&self.conn, id)?)
    }

    /// Overwrite the fields of a stored expense, keeping its identity.
    pub fn update(
        &mut self,
        id: &str,
        name: &str,
        date: DateTime<Utc>,
        value: f64,
    ) -> Result<Expense> {
        let name = name.trim();
        validate_fields(name, value)?;
        if db::get_expense(&self.conn, id)?.is_none() {
            return Err(StoreError::NotFound(id.to_string()));
        }
        self.check_name(name, Some(id))?;

        let expense = Expense {
            id: id.to_string(),
            name: name.to_string(),
            date: date.trunc_subsecs(0),
            value,
        };

        if db::update_expense(&self.conn, &expense)? == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        tracing::info!(id, name, "expense updated");

        self.publish(StoreEvent::Updated(expense.clone()));
        Ok(expense)
    }

    /// Remove one expense. Returns false when it was already gone.
    pub fn delete(&mut self, id: &str) -> Result<bool> {
        let removed = db::delete_expense(&self.conn, id)? > 0;

        if removed {
            tracing::info!(id, "expense deleted");
            self.publish(StoreEvent::Deleted(id.to_string()));
        } else {
            tracing::debug!(id, "delete ignored, expense not stored");
        }

        Ok(removed)
    }

    /// Remove several expenses at once. Absent ids are skipped.
    pub fn delete_many<S: AsRef<str>>(&mut self, ids: &[S]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        let mut removed = Vec::new();

        for id in ids {
            let id = id.as_ref();
            if db::delete_expense(&tx, id)? > 0 {
                removed.push(id.to_string());
            }
        }

        tx.commit()?;
        tracing::info!(requested = ids.len(), removed = removed.len(), "expenses deleted");

        let count = removed.len();
        for id in removed {
            self.publish(StoreEvent::Deleted(id));
        }

        Ok(count)
    }

    pub fn count(&self) -> Result<usize> {
        Ok(db::verify_count(&self.conn)? as usize)
    }
}
