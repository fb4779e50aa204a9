use chrono::NaiveDate;
use colored::Colorize;
use comfy_table::{Cell, Table};
use rusqlite::Connection;
use rust_decimal::Decimal;

use crate::cli::accounts::find_account_id;
use crate::cli::categories::find_category_id;
use crate::db::get_connection;
use crate::error::{BudgieError, Result};
use crate::fmt::money;
use crate::models::{parse_amount, parse_date, Frequency};
use crate::recurrence::calculate_next_date;
use crate::settings::{get_db_path, resolve_user};
use crate::store::{RecurrenceStore, SqliteStore};

pub struct NewRecurring<'a> {
    pub user_id: i64,
    pub description: &'a str,
    pub amount: Decimal,
    pub frequency: Frequency,
    pub start_date: NaiveDate,
    pub account_id: i64,
    pub category_id: Option<i64>,
    pub auto_process: bool,
}

#[allow(clippy::too_many_arguments)]
pub fn add(
    description: &str,
    amount: &str,
    frequency: &str,
    start: &str,
    account: &str,
    category: Option<&str>,
    user: Option<i64>,
    manual: bool,
) -> Result<()> {
    let conn = get_connection(&get_db_path())?;
    let user_id = resolve_user(user);
    let account_id = find_account_id(&conn, user_id, account)?;
    let category_id = category
        .map(|name| find_category_id(&conn, user_id, name))
        .transpose()?;

    let frequency: Frequency = frequency.parse()?;
    let id = add_recurring(
        &conn,
        &NewRecurring {
            user_id,
            description,
            amount: parse_amount(amount)?,
            frequency,
            start_date: parse_date(start)?,
            account_id,
            category_id,
            auto_process: !manual,
        },
    )?;
    println!("Added recurring transaction {id}: {description} ({frequency}, first on {start})");
    Ok(())
}

pub fn list(user: Option<i64>) -> Result<()> {
    let conn = get_connection(&get_db_path())?;
    let definitions = SqliteStore::new(&conn).definitions(Some(resolve_user(user)))?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "Description", "Amount", "Frequency", "Started", "Next", "Auto"]);
    let mut unreadable = Vec::new();
    for stored in definitions {
        let def = match stored {
            Ok(def) => def,
            Err(e) => {
                unreadable.push(e);
                continue;
            }
        };
        table.add_row(vec![
            Cell::new(def.id),
            Cell::new(def.description),
            Cell::new(def.amount.map(money).unwrap_or_else(|| "(missing)".into())),
            Cell::new(def.frequency),
            Cell::new(def.start_date),
            Cell::new(def.next_date),
            Cell::new(if def.auto_process { "yes".green() } else { "no".yellow() }),
        ]);
    }
    println!("Recurring transactions\n{table}");
    for e in unreadable {
        println!("  {} {e}", "warning:".yellow());
    }
    Ok(())
}

pub fn enable(id: i64) -> Result<()> {
    let conn = get_connection(&get_db_path())?;
    set_auto_process(&conn, id, true)?;
    println!("Recurring transaction {id} will be processed automatically");
    Ok(())
}

pub fn disable(id: i64) -> Result<()> {
    let conn = get_connection(&get_db_path())?;
    set_auto_process(&conn, id, false)?;
    println!("Recurring transaction {id} will no longer be processed automatically");
    Ok(())
}

pub fn delete(id: i64) -> Result<()> {
    let conn = get_connection(&get_db_path())?;
    delete_recurring(&conn, id)?;
    println!("Deleted recurring transaction {id}");
    Ok(())
}

pub fn next(id: i64) -> Result<()> {
    let conn = get_connection(&get_db_path())?;
    let def = SqliteStore::new(&conn).definition(id)?;
    let following = calculate_next_date(&def)?;
    println!("{}: next on {}, then {}", def.description, def.next_date, following);
    Ok(())
}

// ---------------------------------------------------------------------------
// Data-layer functions
// ---------------------------------------------------------------------------

pub fn add_recurring(conn: &Connection, new: &NewRecurring<'_>) -> Result<i64> {
    if new.description.trim().is_empty() {
        return Err(BudgieError::Other("Description is required".into()));
    }
    if new.amount.is_zero() {
        return Err(BudgieError::InvalidAmount("amount must not be zero".into()));
    }
    conn.execute(
        "INSERT INTO recurring_transactions \
         (user_id, amount, description, frequency, start_date, next_date, auto_process, account_id, category_id) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?5, ?6, ?7, ?8)",
        rusqlite::params![
            new.user_id,
            new.amount.to_string(),
            new.description.trim(),
            new.frequency.as_str(),
            new.start_date,
            new.auto_process,
            new.account_id,
            new.category_id,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn set_auto_process(conn: &Connection, id: i64, enabled: bool) -> Result<()> {
    let updated = conn.execute(
        "UPDATE recurring_transactions SET auto_process = ?1, updated_at = datetime('now') WHERE id = ?2",
        rusqlite::params![enabled, id],
    )?;
    if updated == 0 {
        return Err(BudgieError::UnknownRecurring(id));
    }
    Ok(())
}

pub fn delete_recurring(conn: &Connection, id: i64) -> Result<()> {
    let deleted = conn.execute("DELETE FROM recurring_transactions WHERE id = ?1", [id])?;
    if deleted == 0 {
        return Err(BudgieError::UnknownRecurring(id));
    }
    Ok(())
}
