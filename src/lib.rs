// Money Tracker - Core Library
// Store + list/form view models, shared by the terminal UI and tests

pub mod db;
pub mod error;
pub mod expense;
pub mod format;
pub mod form;
pub mod list;
pub mod store;

// Re-export commonly used types
pub use error::{Result, StoreError};
pub use expense::{Expense, ExpenseDraft};
pub use format::{format_currency, format_row_date, DEFAULT_CURRENCY_SYMBOL};
pub use form::{ExpenseForm, Field, FormMode};
pub use list::{ExpenseList, ExpenseRow};
pub use store::{Store, StoreConfig, StoreEvent};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
