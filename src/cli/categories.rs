use comfy_table::{Cell, Table};
use rusqlite::{Connection, OptionalExtension};

use crate::db::get_connection;
use crate::error::{BudgieError, Result};
use crate::models::Category;
use crate::settings::{get_db_path, resolve_user};

pub fn add(name: &str, category_type: &str, user: Option<i64>) -> Result<()> {
    let conn = get_connection(&get_db_path())?;
    add_category(&conn, resolve_user(user), name, category_type)?;
    println!("Added category: {name}");
    Ok(())
}

pub fn list(user: Option<i64>) -> Result<()> {
    let conn = get_connection(&get_db_path())?;
    let categories = list_categories(&conn, resolve_user(user))?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Type"]);
    for cat in categories {
        table.add_row(vec![
            Cell::new(cat.id),
            Cell::new(cat.name),
            Cell::new(cat.category_type),
        ]);
    }
    println!("Categories\n{table}");
    Ok(())
}

pub fn list_categories(conn: &Connection, user_id: i64) -> Result<Vec<Category>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, name, category_type FROM categories WHERE user_id = ?1 \
         ORDER BY CASE category_type WHEN 'income' THEN 0 ELSE 1 END, name ASC",
    )?;
    let categories = stmt
        .query_map([user_id], |row| {
            Ok(Category {
                id: row.get(0)?,
                user_id: row.get(1)?,
                name: row.get(2)?,
                category_type: row.get(3)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(categories)
}

pub fn add_category(conn: &Connection, user_id: i64, name: &str, category_type: &str) -> Result<i64> {
    if name.trim().is_empty() {
        return Err(BudgieError::Other("Name is required".into()));
    }
    if category_type != "income" && category_type != "expense" {
        return Err(BudgieError::Other(format!(
            "Invalid category type: {category_type} (must be 'income' or 'expense')"
        )));
    }
    if find_category_id(conn, user_id, name).is_ok() {
        return Err(BudgieError::Other(format!("Category '{name}' already exists")));
    }
    conn.execute(
        "INSERT INTO categories (user_id, name, category_type) VALUES (?1, ?2, ?3)",
        rusqlite::params![user_id, name.trim(), category_type],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn find_category_id(conn: &Connection, user_id: i64, name: &str) -> Result<i64> {
    conn.query_row(
        "SELECT id FROM categories WHERE user_id = ?1 AND name = ?2",
        rusqlite::params![user_id, name.trim()],
        |row| row.get(0),
    )
    .optional()?
    .ok_or_else(|| BudgieError::UnknownCategory(name.to_string()))
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
    fn test_seeded_categories_income_first() {
        let (_dir, conn) = test_conn();
        let categories = list_categories(&conn, 1).unwrap();
        assert!(categories.iter().any(|c| c.name == "Salary" && c.category_type == "income"));
        let first_expense = categories.iter().position(|c| c.category_type == "expense").unwrap();
        let last_income = categories.iter().rposition(|c| c.category_type == "income").unwrap();
        assert!(last_income < first_expense, "income categories should come first");
    }

    #[test]
    fn test_add_category_and_find() {
        let (_dir, conn) = test_conn();
        let id = add_category(&conn, 2, "Pets", "expense").unwrap();
        assert_eq!(find_category_id(&conn, 2, "Pets").unwrap(), id);
        assert!(find_category_id(&conn, 1, "Pets").is_err());
    }

    #[test]
    fn test_add_invalid_type_rejected() {
        let (_dir, conn) = test_conn();
        let err = add_category(&conn, 1, "Bonus", "revenue").unwrap_err();
        assert!(err.to_string().contains("Invalid category type"));
    }

    #[test]
    fn test_add_duplicate_rejected() {
        let (_dir, conn) = test_conn();
        let err = add_category(&conn, 1, "Groceries", "expense").unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }
}
