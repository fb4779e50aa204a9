use crate::db::get_connection;
use crate::error::Result;
use crate::settings::load_settings;

pub fn run() -> Result<()> {
    let settings = load_settings();
    let db_path = settings.db_path();

    println!("Data dir:      {}", settings.data_dir);
    println!("Database:      {}", db_path.display());
    println!("Default user:  {}", settings.default_user);
    match settings.max_catch_up {
        Some(cap) => println!("Catch-up cap:  {cap} per run"),
        None => println!("Catch-up cap:  none"),
    }

    if !db_path.exists() {
        println!();
        println!("Database not found. Run `budgie init` to set up.");
        return Ok(());
    }

    let conn = get_connection(&db_path)?;
    let count = |sql: &str| -> Result<i64> { Ok(conn.query_row(sql, [], |r| r.get(0))?) };

    println!();
    println!("Accounts:      {}", count("SELECT count(*) FROM accounts")?);
    println!("Transactions:  {}", count("SELECT count(*) FROM transactions")?);
    println!("Recurring:     {}", count("SELECT count(*) FROM recurring_transactions")?);
    println!(
        "  automatic:   {}",
        count("SELECT count(*) FROM recurring_transactions WHERE auto_process = 1")?
    );
    Ok(())
}
