// 📝 Expense Form - one shape for adding and editing
//
// Both modes edit a draft. Nothing reaches the store until `confirm`;
// `cancel` simply drops the draft.

use crate::error::{Result, StoreError};
use crate::expense::{Expense, ExpenseDraft};
use crate::store::Store;
use chrono::{DateTime, Duration, Local, Months, NaiveTime, TimeZone, Utc};

// ============================================================================
// MODE & FIELDS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Add,
    /// Editing the expense with this identity
    Edit(String),
}

impl FormMode {
    pub fn title(&self) -> &'static str {
        match self {
            FormMode::Add => "New Expense",
            FormMode::Edit(_) => "Update Expense",
        }
    }

    /// Label of the confirm control
    pub fn confirm_label(&self) -> &'static str {
        match self {
            FormMode::Add => "Save",
            FormMode::Edit(_) => "Done",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Date,
    Value,
}

impl Field {
    pub const ALL: [Field; 3] = [Field::Name, Field::Date, Field::Value];

    pub fn next(&self) -> Self {
        match self {
            Field::Name => Field::Date,
            Field::Date => Field::Value,
            Field::Value => Field::Name,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Field::Name => Field::Value,
            Field::Date => Field::Name,
            Field::Value => Field::Date,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Field::Name => "Expense Name",
            Field::Date => "Date",
            Field::Value => "Value",
        }
    }
}

// ============================================================================
// FORM
// ============================================================================

pub struct ExpenseForm {
    mode: FormMode,
    draft: ExpenseDraft,
    /// Raw text of the value field, parsed on confirm
    value_input: String,
    focus: Field,
}

impl ExpenseForm {
    /// Blank form: empty name, today, zero
    pub fn add() -> Self {
        Self::from_draft(FormMode::Add, ExpenseDraft::blank())
    }

    /// Form over a copy of an existing expense's fields
    pub fn edit(expense: &Expense) -> Self {
        Self::from_draft(FormMode::Edit(expense.id.clone()), expense.to_draft())
    }

    fn from_draft(mode: FormMode, draft: ExpenseDraft) -> Self {
        let value_input = if draft.value == 0.0 {
            String::new()
        } else {
            draft.value.to_string()
        };

        Self {
            mode,
            draft,
            value_input,
            focus: Field::Name,
        }
    }

    pub fn mode(&self) -> &FormMode {
        &self.mode
    }

    pub fn draft(&self) -> &ExpenseDraft {
        &self.draft
    }

    pub fn value_input(&self) -> &str {
        &self.value_input
    }

    pub fn focus(&self) -> Field {
        self.focus
    }

    pub fn focus_next(&mut self) {
        self.focus = self.focus.next();
    }

    pub fn focus_previous(&mut self) {
        self.focus = self.focus.previous();
    }

    // ========================================================================
    // TEXT INPUT
    // ========================================================================

    /// Type a character into the focused field.
    /// Returns false when the field rejected it.
    pub fn input_char(&mut self, c: char) -> bool {
        match self.focus {
            Field::Name => {
                if c.is_control() {
                    return false;
                }
                self.draft.name.push(c);
                true
            }
            Field::Value => {
                let accepted = c.is_ascii_digit() || (c == '.' && !self.value_input.contains('.'));
                if accepted {
                    self.value_input.push(c);
                }
                accepted
            }
            Field::Date => false,
        }
    }

    pub fn backspace(&mut self) {
        match self.focus {
            Field::Name => {
                self.draft.name.pop();
            }
            Field::Value => {
                self.value_input.pop();
            }
            Field::Date => {}
        }
    }

    // ========================================================================
    // DATE PICKER
    // ========================================================================

    pub fn shift_days(&mut self, days: i64) {
        self.draft.date = self.draft.date + Duration::days(days);
    }

    pub fn shift_months(&mut self, months: i32) {
        let shifted = if months >= 0 {
            self.draft.date.checked_add_months(Months::new(months.unsigned_abs()))
        } else {
            self.draft.date.checked_sub_months(Months::new(months.unsigned_abs()))
        };
        if let Some(date) = shifted {
            self.draft.date = date;
        }
    }

    /// Move the date to today, keeping the time of day
    pub fn set_today(&mut self) {
        let time = self.draft.date.with_timezone(&Local).time();
        self.draft.date = local_on_today(time).unwrap_or_else(Utc::now);
    }

    // ========================================================================
    // COMMIT
    // ========================================================================

    fn parsed_value(&self) -> Result<f64> {
        if self.value_input.is_empty() {
            return Ok(0.0);
        }
        self.value_input
            .parse::<f64>()
            .map_err(|_| StoreError::validation("value", format!("\"{}\" is not a number", self.value_input)))
    }

    /// Write the draft through to the store. On error the form stays usable.
    pub fn confirm(&self, store: &mut Store) -> Result<Expense> {
        let value = self.parsed_value()?;
        let name = self.draft.name.trim();

        match &self.mode {
            FormMode::Add => store.add(name, self.draft.date, value),
            FormMode::Edit(id) => store.update(id, name, self.draft.date, value),
        }
    }

    /// Drop the draft. The store is never touched.
    pub fn cancel(self) {
        tracing::debug!(mode = ?self.mode, "form cancelled");
    }
}

fn local_on_today(time: NaiveTime) -> Option<DateTime<Utc>> {
    let today = Local::now().date_naive();
    Local
        .from_local_datetime(&today.and_time(time))
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreConfig;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, d, 12, 0, 0).unwrap()
    }

    fn store() -> Store {
        Store::open_in_memory(StoreConfig::default()).unwrap()
    }

    fn type_text(form: &mut ExpenseForm, text: &str) {
        for c in text.chars() {
            form.input_char(c);
        }
    }

    #[test]
    fn test_add_form_defaults() {
        let before = Utc::now();
        let form = ExpenseForm::add();

        assert_eq!(form.mode(), &FormMode::Add);
        assert_eq!(form.mode().title(), "New Expense");
        assert_eq!(form.draft().name, "");
        assert_eq!(form.draft().value, 0.0);
        assert_eq!(form.value_input(), "");
        assert!(form.draft().date >= before);
    }

    #[test]
    fn test_add_confirm_persists() {
        let mut store = store();
        let mut form = ExpenseForm::add();

        type_text(&mut form, "Coffee");
        form.focus_next();
        form.focus_next();
        type_text(&mut form, "4.50");

        let saved = form.confirm(&mut store).unwrap();

        assert_eq!(saved.name, "Coffee");
        assert_eq!(saved.value, 4.5);
        assert_eq!(store.list().unwrap(), vec![saved]);
    }

    #[test]
    fn test_add_cancel_persists_nothing() {
        let store = store();
        let mut form = ExpenseForm::add();
        type_text(&mut form, "Coffee");

        form.cancel();

        assert!(store.list().unwrap().is_empty());
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_value_field_accepts_decimal_only() {
        let mut form = ExpenseForm::add();
        form.focus_previous();
        assert_eq!(form.focus(), Field::Value);

        assert!(form.input_char('1'));
        assert!(form.input_char('2'));
        assert!(form.input_char('.'));
        assert!(!form.input_char('.'), "Only one decimal point");
        assert!(!form.input_char('a'));
        assert!(!form.input_char('-'));
        assert!(form.input_char('5'));

        assert_eq!(form.value_input(), "12.5");
        form.backspace();
        assert_eq!(form.value_input(), "12.");
    }

    #[test]
    fn test_lone_point_is_validation_error() {
        let mut store = store();
        let mut form = ExpenseForm::add();
        type_text(&mut form, "Coffee");
        form.focus_previous();
        form.input_char('.');

        let err = form.confirm(&mut store).unwrap_err();
        assert!(matches!(err, StoreError::Validation { field: "value", .. }));
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_empty_name_rejected_form_stays_open() {
        let mut store = store();
        let mut form = ExpenseForm::add();

        assert!(form.confirm(&mut store).is_err());

        type_text(&mut form, "Lunch");
        assert!(form.confirm(&mut store).is_ok(), "Same form can be fixed and confirmed");
    }

    #[test]
    fn test_edit_commits_only_on_confirm() {
        let mut store = store();
        let coffee = store.add("Coffee", day(10), 4.5).unwrap();

        let mut form = ExpenseForm::edit(&coffee);
        assert_eq!(form.mode().confirm_label(), "Done");
        assert_eq!(form.value_input(), "4.5");

        form.focus_previous();
        for _ in 0..3 {
            form.backspace();
        }
        form.input_char('9');
        assert_eq!(store.get(&coffee.id).unwrap().unwrap().value, 4.5, "Draft is not live");

        form.confirm(&mut store).unwrap();

        let all = store.list().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, coffee.id);
        assert_eq!(all[0].value, 9.0);
    }

    #[test]
    fn test_edit_cancel_discards_draft() {
        let mut store = store();
        let coffee = store.add("Coffee", day(10), 4.5).unwrap();

        let mut form = ExpenseForm::edit(&coffee);
        type_text(&mut form, " beans");
        form.shift_days(3);
        form.cancel();

        assert_eq!(store.get(&coffee.id).unwrap().unwrap(), coffee);
    }

    #[test]
    fn test_edit_of_deleted_expense_is_not_found() {
        let mut store = store();
        let coffee = store.add("Coffee", day(10), 4.5).unwrap();
        let form = ExpenseForm::edit(&coffee);

        store.delete(&coffee.id).unwrap();

        assert_eq!(
            form.confirm(&mut store),
            Err(StoreError::NotFound(coffee.id.clone()))
        );
    }

    #[test]
    fn test_date_picker_moves_by_day_and_month() {
        let mut store = store();
        let coffee = store.add("Coffee", day(10), 4.5).unwrap();
        let mut form = ExpenseForm::edit(&coffee);

        form.shift_days(-9);
        assert_eq!(form.draft().date, day(1));
        form.shift_months(1);
        assert_eq!(form.draft().date, Utc.with_ymd_and_hms(2024, 4, 1, 12, 0, 0).unwrap());
        form.shift_months(-2);
        assert_eq!(form.draft().date, Utc.with_ymd_and_hms(2024, 2, 1, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_set_today_lands_on_today() {
        let mut store = store();
        let coffee = store.add("Coffee", day(10), 4.5).unwrap();
        let mut form = ExpenseForm::edit(&coffee);

        form.set_today();

        let local = form.draft().date.with_timezone(&Local);
        assert_eq!(local.date_naive(), Local::now().date_naive());
    }

    #[test]
    fn test_date_field_ignores_typing() {
        let mut form = ExpenseForm::add();
        form.focus_next();
        assert_eq!(form.focus(), Field::Date);

        assert!(!form.input_char('x'));
        assert_eq!(form.draft().name, "");
    }
}
