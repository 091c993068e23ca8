use crate::expense::Expense;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

pub fn setup_database(conn: &Connection) -> rusqlite::Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    // ==========================================================================
    // Expenses Table
    // seq keeps insertion order for records sharing the same timestamp
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS expenses (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            expense_uuid TEXT UNIQUE NOT NULL,
            name TEXT NOT NULL,
            date INTEGER NOT NULL,
            value REAL NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    // ==========================================================================
    // Indexes
    // ==========================================================================
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_expenses_date ON expenses(date)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_expenses_name ON expenses(name)",
        [],
    )?;

    Ok(())
}

/// Dates are stored as Unix seconds, so column order is chronological for any year.
pub fn encode_date(date: &DateTime<Utc>) -> i64 {
    date.timestamp()
}

fn decode_date(idx: usize, secs: i64) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0).ok_or(rusqlite::Error::IntegralValueOutOfRange(idx, secs))
}

fn expense_from_row(row: &Row<'_>) -> rusqlite::Result<Expense> {
    let secs: i64 = row.get(2)?;

    Ok(Expense {
        id: row.get(0)?,
        name: row.get(1)?,
        date: decode_date(2, secs)?,
        value: row.get(3)?,
    })
}

pub fn insert_expense(conn: &Connection, expense: &Expense) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO expenses (expense_uuid, name, date, value) VALUES (?1, ?2, ?3, ?4)",
        params![
            expense.id,
            expense.name,
            encode_date(&expense.date),
            expense.value,
        ],
    )?;

    Ok(())
}

/// All expenses, oldest first
pub fn get_all_expenses(conn: &Connection) -> rusqlite::Result<Vec<Expense>> {
    let mut stmt = conn.prepare(
        "SELECT expense_uuid, name, date, value
         FROM expenses
         ORDER BY date ASC, seq ASC",
    )?;

    let expenses = stmt
        .query_map([], expense_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(expenses)
}

pub fn get_expense(conn: &Connection, id: &str) -> rusqlite::Result<Option<Expense>> {
    conn.query_row(
        "SELECT expense_uuid, name, date, value FROM expenses WHERE expense_uuid = ?1",
        [id],
        expense_from_row,
    )
    .optional()
}

/// Overwrite the fields of an existing identity. Returns the number of rows touched.
pub fn update_expense(conn: &Connection, expense: &Expense) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE expenses
         SET name = ?1, date = ?2, value = ?3
         WHERE expense_uuid = ?4",
        params![
            expense.name,
            encode_date(&expense.date),
            expense.value,
            expense.id,
        ],
    )
}

pub fn delete_expense(conn: &Connection, id: &str) -> rusqlite::Result<usize> {
    conn.execute("DELETE FROM expenses WHERE expense_uuid = ?1", [id])
}

/// Is `name` used by any expense other than `except_id`?
pub fn name_taken(conn: &Connection, name: &str, except_id: Option<&str>) -> rusqlite::Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM expenses WHERE name = ?1 AND expense_uuid IS NOT ?2",
        params![name, except_id],
        |row| row.get(0),
    )?;

    Ok(count > 0)
}

pub fn verify_count(conn: &Connection) -> rusqlite::Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM expenses", [], |row| row.get(0))?;

    Ok(count)
}
