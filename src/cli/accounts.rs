use comfy_table::{Cell, Table};
use rusqlite::{Connection, OptionalExtension};

use crate::db::get_connection;
use crate::error::{BudgieError, Result};
use crate::models::Account;
use crate::settings::{get_db_path, resolve_user};

pub fn add(name: &str, account_type: &str, user: Option<i64>) -> Result<()> {
    let conn = get_connection(&get_db_path())?;
    add_account(&conn, resolve_user(user), name, account_type)?;
    println!("Added account: {name}");
    Ok(())
}

pub fn list(user: Option<i64>) -> Result<()> {
    let conn = get_connection(&get_db_path())?;
    let accounts = list_accounts(&conn, resolve_user(user))?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Type"]);
    for acct in accounts {
        table.add_row(vec![
            Cell::new(acct.id),
            Cell::new(acct.name),
            Cell::new(acct.account_type),
        ]);
    }
    println!("Accounts\n{table}");
    Ok(())
}

pub fn add_account(conn: &Connection, user_id: i64, name: &str, account_type: &str) -> Result<i64> {
    if name.trim().is_empty() {
        return Err(BudgieError::Other("Name is required".into()));
    }
    if find_account_id(conn, user_id, name).is_ok() {
        return Err(BudgieError::Other(format!("Account '{name}' already exists")));
    }
    conn.execute(
        "INSERT INTO accounts (user_id, name, account_type) VALUES (?1, ?2, ?3)",
        rusqlite::params![user_id, name.trim(), account_type],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn list_accounts(conn: &Connection, user_id: i64) -> Result<Vec<Account>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, name, account_type FROM accounts WHERE user_id = ?1 ORDER BY name",
    )?;
    let accounts = stmt
        .query_map([user_id], |row| {
            Ok(Account {
                id: row.get(0)?,
                user_id: row.get(1)?,
                name: row.get(2)?,
                account_type: row.get(3)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(accounts)
}

pub fn find_account_id(conn: &Connection, user_id: i64, name: &str) -> Result<i64> {
    conn.query_row(
        "SELECT id FROM accounts WHERE user_id = ?1 AND name = ?2",
        rusqlite::params![user_id, name.trim()],
        |row| row.get(0),
    )
    .optional()?
    .ok_or_else(|| BudgieError::UnknownAccount(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_db;

    fn test_conn() -> (tempfile::TempDir, Connection) {
        let dir = tempfile::tempdir().unwrap();
        let conn = get_connection(&dir.path().join("test.db")).unwrap();
        init_db(&conn).unwrap();
        (dir, conn)
    }

    #[test]
    fn test_add_and_find_account() {
        let (_dir, conn) = test_conn();
        let id = add_account(&conn, 1, "Main Checking", "checking").unwrap();
        assert_eq!(find_account_id(&conn, 1, "Main Checking").unwrap(), id);
        let accounts = list_accounts(&conn, 1).unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].account_type, "checking");
    }

    #[test]
    fn test_accounts_are_per_user() {
        let (_dir, conn) = test_conn();
        add_account(&conn, 1, "Savings", "savings").unwrap();
        add_account(&conn, 2, "Savings", "savings").unwrap();
        assert!(list_accounts(&conn, 3).unwrap().is_empty());
        let err = find_account_id(&conn, 3, "Savings").unwrap_err();
        assert!(matches!(err, BudgieError::UnknownAccount(_)));
    }

    #[test]
    fn test_duplicate_account_rejected() {
        let (_dir, conn) = test_conn();
        add_account(&conn, 1, "Cash", "cash").unwrap();
        let err = add_account(&conn, 1, "Cash", "cash").unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn test_empty_name_rejected() {
        let (_dir, conn) = test_conn();
        let err = add_account(&conn, 1, "   ", "cash").unwrap_err();
        assert!(err.to_string().contains("Name is required"));
    }
}
