use colored::Colorize;
use comfy_table::{Cell, Table};
use rusqlite::Connection;

use crate::cli::accounts::find_account_id;
use crate::db::get_connection;
use crate::error::Result;
use crate::fmt::money;
use crate::models::Transaction;
use crate::settings::{get_db_path, resolve_user};
use crate::store::{transaction_from_row, TRANSACTION_COLUMNS};

#[derive(Debug, Default, Clone, Copy)]
pub struct TransactionFilter {
    pub user_id: i64,
    pub account_id: Option<i64>,
    pub recurring_id: Option<i64>,
}

pub fn list(user: Option<i64>, account: Option<&str>, recurring: Option<i64>) -> Result<()> {
    let conn = get_connection(&get_db_path())?;
    let user_id = resolve_user(user);
    let account_id = account
        .map(|name| find_account_id(&conn, user_id, name))
        .transpose()?;
    let txns = list_transactions(
        &conn,
        &TransactionFilter {
            user_id,
            account_id,
            recurring_id: recurring,
        },
    )?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "Date", "Description", "Amount", "Recurring"]);
    for txn in txns {
        let amount = if txn.amount.is_sign_negative() {
            money(txn.amount).red().to_string()
        } else {
            money(txn.amount).green().to_string()
        };
        table.add_row(vec![
            Cell::new(txn.id),
            Cell::new(txn.date),
            Cell::new(txn.description),
            Cell::new(amount),
            Cell::new(txn.recurring_id.map(|id| id.to_string()).unwrap_or_default()),
        ]);
    }
    println!("Transactions\n{table}");
    Ok(())
}

pub fn list_transactions(conn: &Connection, filter: &TransactionFilter) -> Result<Vec<Transaction>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TRANSACTION_COLUMNS} FROM transactions \
         WHERE user_id = ?1 AND (?2 IS NULL OR account_id = ?2) AND (?3 IS NULL OR recurring_id = ?3) \
         ORDER BY date DESC, id DESC"
    ))?;
    let rows = stmt
        .query_map(
            rusqlite::params![filter.user_id, filter.account_id, filter.recurring_id],
            transaction_from_row,
        )?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}
