use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior};
use tracing::debug;

use crate::db::{decimal_column, frequency_column};
use crate::error::{BudgieError, Result};
use crate::models::{NewTransaction, RecurringDefinition, Transaction};

/// One stored definition. A row whose columns cannot be decoded comes back
/// as `BudgieError::Validation` carrying that row's id.
pub type StoredDefinition = Result<RecurringDefinition>;

/// What the recurrence engine needs from persistence.
pub trait RecurrenceStore {
    /// Definitions with `auto_process` set and `next_date <= today`, oldest first.
    fn due_definitions(&self, today: NaiveDate, scope: Option<i64>) -> Result<Vec<StoredDefinition>>;

    /// Every definition in scope, whether or not it is enabled.
    fn definitions(&self, scope: Option<i64>) -> Result<Vec<StoredDefinition>>;

    /// Insert `txn` and move the definition from `expected_next` to `new_next`
    /// as one unit. Nothing is written if either step fails.
    fn commit_occurrence(
        &self,
        txn: NewTransaction,
        definition_id: i64,
        expected_next: NaiveDate,
        new_next: NaiveDate,
    ) -> Result<Transaction>;
}

const DEFINITION_COLUMNS: &str = "id, user_id, amount, description, frequency, start_date, \
     next_date, auto_process, account_id, category_id";

pub(crate) const TRANSACTION_COLUMNS: &str =
    "id, user_id, account_id, category_id, date, description, amount, recurring_id";

fn definition_from_row(row: &Row<'_>) -> rusqlite::Result<RecurringDefinition> {
    Ok(RecurringDefinition {
        id: row.get(0)?,
        user_id: row.get(1)?,
        amount: decimal_column(row, 2)?,
        description: row.get(3)?,
        frequency: frequency_column(row, 4)?,
        start_date: row.get(5)?,
        next_date: row.get(6)?,
        auto_process: row.get(7)?,
        account_id: row.get(8)?,
        category_id: row.get(9)?,
    })
}

fn read_definition(row: &Row<'_>) -> rusqlite::Result<StoredDefinition> {
    let id: i64 = row.get(0)?;
    Ok(definition_from_row(row).map_err(|e| match e {
        rusqlite::Error::FromSqlConversionFailure(..)
        | rusqlite::Error::InvalidColumnType(..)
        | rusqlite::Error::IntegralValueOutOfRange(..) => BudgieError::Validation {
            id,
            reason: format!("stored row cannot be read ({e})"),
        },
        other => BudgieError::Db(other),
    }))
}

pub(crate) fn transaction_from_row(row: &Row<'_>) -> rusqlite::Result<Transaction> {
    let amount = decimal_column(row, 6)?.ok_or(rusqlite::Error::InvalidColumnType(
        6,
        "amount".into(),
        rusqlite::types::Type::Null,
    ))?;
    Ok(Transaction {
        id: row.get(0)?,
        user_id: row.get(1)?,
        account_id: row.get(2)?,
        category_id: row.get(3)?,
        date: row.get(4)?,
        description: row.get(5)?,
        amount,
        recurring_id: row.get(7)?,
    })
}

pub struct SqliteStore<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn definition(&self, id: i64) -> Result<RecurringDefinition> {
        self.conn
            .query_row(
                &format!("SELECT {DEFINITION_COLUMNS} FROM recurring_transactions WHERE id = ?1"),
                [id],
                read_definition,
            )
            .optional()?
            .unwrap_or(Err(BudgieError::UnknownRecurring(id)))
    }
}

impl RecurrenceStore for SqliteStore<'_> {
    fn due_definitions(&self, today: NaiveDate, scope: Option<i64>) -> Result<Vec<StoredDefinition>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {DEFINITION_COLUMNS} FROM recurring_transactions \
             WHERE auto_process = 1 AND next_date <= ?1 AND (?2 IS NULL OR user_id = ?2) \
             ORDER BY next_date, id"
        ))?;
        let rows = stmt
            .query_map(rusqlite::params![today, scope], read_definition)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        debug!(count = rows.len(), %today, ?scope, "loaded due recurring transactions");
        Ok(rows)
    }

    fn definitions(&self, scope: Option<i64>) -> Result<Vec<StoredDefinition>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {DEFINITION_COLUMNS} FROM recurring_transactions \
             WHERE (?1 IS NULL OR user_id = ?1) ORDER BY next_date, id"
        ))?;
        let rows = stmt
            .query_map([scope], read_definition)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn commit_occurrence(
        &self,
        txn: NewTransaction,
        definition_id: i64,
        expected_next: NaiveDate,
        new_next: NaiveDate,
    ) -> Result<Transaction> {
        // Concurrent runs serialize on the write lock taken here.
        let tx = rusqlite::Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO transactions (user_id, account_id, category_id, date, description, amount, recurring_id) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            rusqlite::params![
                txn.user_id,
                txn.account_id,
                txn.category_id,
                txn.date,
                txn.description,
                txn.amount.to_string(),
                txn.recurring_id,
            ],
        )?;
        let id = tx.last_insert_rowid();

        let updated = tx.execute(
            "UPDATE recurring_transactions SET next_date = ?1, updated_at = datetime('now') \
             WHERE id = ?2 AND next_date = ?3",
            rusqlite::params![new_next, definition_id, expected_next],
        )?;
        if updated != 1 {
            // Dropping `tx` rolls the insert back.
            return Err(BudgieError::Conflict(definition_id));
        }
        tx.commit()?;
        Ok(Transaction::from_new(id, txn))
    }
}
