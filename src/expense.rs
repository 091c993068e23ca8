// 💸 Expense Entity
// Stable identity (UUID) + three overwritable values: name, date, value

use crate::error::{Result, StoreError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// EXPENSE ENTITY
// ============================================================================

/// A single recorded expense.
///
/// `id` is the identity and never changes, even when every field is edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: String,
    pub name: String,
    pub date: DateTime<Utc>,
    pub value: f64,
}

impl Expense {
    /// Build a new expense with a fresh identity
    pub fn new(name: impl Into<String>, date: DateTime<Utc>, value: f64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            date,
            value,
        }
    }

    /// Copy the editable fields into a draft
    pub fn to_draft(&self) -> ExpenseDraft {
        ExpenseDraft {
            name: self.name.clone(),
            date: self.date,
            value: self.value,
        }
    }
}

// ============================================================================
// DRAFT
// ============================================================================

/// Uncommitted field values, edited by the form before they reach the store.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseDraft {
    pub name: String,
    pub date: DateTime<Utc>,
    pub value: f64,
}

impl ExpenseDraft {
    /// Blank draft: empty name, now, zero
    pub fn blank() -> Self {
        Self {
            name: String::new(),
            date: Utc::now(),
            value: 0.0,
        }
    }
}

/// Largest accepted magnitude; amounts stay exact to the cent below it
pub const MAX_ABS_VALUE: f64 = 1e13;

/// Check the fields every persisted expense must satisfy.
pub fn validate_fields(name: &str, value: f64) -> Result<()> {
    if name.trim().is_empty() {
        return Err(StoreError::validation("name", "Required field is empty"));
    }

    if !value.is_finite() {
        return Err(StoreError::validation("value", "Must be a finite number"));
    }

    if value.abs() >= MAX_ABS_VALUE {
        return Err(StoreError::validation("value", "Amount is too large"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_new_assigns_identity() {
        let date = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap();
        let a = Expense::new("Coffee", date, 4.5);
        let b = Expense::new("Coffee", date, 4.5);

        assert_eq!(a.id.len(), 36, "UUID should be 36 characters");
        assert_ne!(a.id, b.id, "Each expense gets its own identity");
    }

    #[test]
    fn test_validate_fields() {
        assert!(validate_fields("Coffee", 4.5).is_ok());
        assert!(validate_fields("Refund", -12.0).is_ok(), "Negative values are accepted");
        assert!(validate_fields("Free sample", 0.0).is_ok(), "Zero is accepted");

        assert_eq!(
            validate_fields("   ", 1.0),
            Err(StoreError::validation("name", "Required field is empty"))
        );
        assert!(matches!(
            validate_fields("Coffee", f64::NAN),
            Err(StoreError::Validation { field: "value", .. })
        ));
        assert!(validate_fields("Coffee", f64::INFINITY).is_err());
        assert_eq!(
            validate_fields("Yacht", 1e20),
            Err(StoreError::validation("value", "Amount is too large"))
        );
        assert!(validate_fields("Debt", -MAX_ABS_VALUE).is_err());
        assert!(validate_fields("House", 9_999_999_999_999.99).is_ok());
    }

    #[test]
    fn test_draft_round_trip_keeps_fields() {
        let date = Utc.with_ymd_and_hms(2024, 3, 10, 9, 30, 0).unwrap();
        let expense = Expense::new("Lunch", date, 12.75);
        let draft = expense.to_draft();

        assert_eq!(draft.name, "Lunch");
        assert_eq!(draft.date, date);
        assert_eq!(draft.value, 12.75);
    }
}
