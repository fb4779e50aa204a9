use chrono::{Local, NaiveDate};
use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::db::get_connection;
use crate::error::{BudgieError, Result};
use crate::fmt::money;
use crate::models::parse_date;
use crate::recurrence::{preview_due, process_due, Preview, ProcessFailure, ProcessSummary};
use crate::settings::load_settings;
use crate::store::SqliteStore;

/// Entry point for the scheduler. Errors (exit status 1) when any recurring
/// transaction failed, after printing the summary.
pub fn run(today: Option<&str>, user: Option<i64>, dry_run: bool, max_catch_up: Option<usize>) -> Result<()> {
    let today = resolve_today(today)?;
    let settings = load_settings();
    let conn = get_connection(&settings.db_path())?;
    let store = SqliteStore::new(&conn);
    let mut options = settings.process_options();
    options.max_catch_up = max_catch_up.or(options.max_catch_up);

    if dry_run {
        let preview = preview_due(&store, today, user, &options)?;
        print_preview(&preview, today);
        return Ok(());
    }

    let summary = process_due(&store, today, user, &options);
    print_summary(&summary, today);
    if summary.is_healthy() {
        Ok(())
    } else {
        Err(BudgieError::Other(format!(
            "{} recurring transaction(s) failed",
            summary.failed
        )))
    }
}

fn resolve_today(today: Option<&str>) -> Result<NaiveDate> {
    match today {
        Some(s) => parse_date(s),
        None => Ok(Local::now().date_naive()),
    }
}

fn print_summary(summary: &ProcessSummary, today: NaiveDate) {
    println!("Recurring run for {today}");
    if !summary.created.is_empty() {
        let mut table = Table::new();
        table.set_header(vec!["Txn", "Recurring", "Date", "Description", "Amount"]);
        for txn in &summary.created {
            table.add_row(vec![
                Cell::new(txn.id),
                Cell::new(txn.recurring_id.map(|id| id.to_string()).unwrap_or_default()),
                Cell::new(txn.date),
                Cell::new(&txn.description),
                Cell::new(money(txn.amount)),
            ]);
        }
        println!("{table}");
    }

    println!(
        "{} processed, {} failed, {} transaction(s) created",
        summary.processed.to_string().green(),
        if summary.failed > 0 {
            summary.failed.to_string().red()
        } else {
            summary.failed.to_string().normal()
        },
        summary.created.len()
    );
    for id in &summary.capped {
        println!("  {} recurring transaction {id} is still behind; run again to continue", "note:".yellow());
    }
    print_failures(&summary.failures);
}

fn print_failures(failures: &[ProcessFailure]) {
    for failure in failures {
        let who = match failure.definition_id {
            Some(id) => format!("#{id} {}", failure.description),
            None => failure.description.clone(),
        };
        println!("  {} {who} ({}): {}", "FAILED".red().bold(), failure.kind, failure.message);
    }
}

fn print_preview(preview: &Preview, today: NaiveDate) {
    let entries = &preview.entries;
    println!("Dry run for {today} (nothing written)");
    let mut table = Table::new();
    table.set_header(vec!["ID", "Description", "Frequency", "Next", "Due", "Would create", "Next after run"]);
    for entry in entries {
        let def = &entry.definition;
        let due = match (entry.due, def.auto_process) {
            (true, _) => "yes".green().to_string(),
            (false, false) => "manual".yellow().to_string(),
            (false, true) => "no".to_string(),
        };
        let would_create = match &entry.problem {
            Some(problem) => problem.red().to_string(),
            None if entry.capped => format!("{} (limit reached)", entry.occurrences.len()),
            None => entry.occurrences.len().to_string(),
        };
        table.add_row(vec![
            Cell::new(def.id),
            Cell::new(&def.description),
            Cell::new(def.frequency),
            Cell::new(def.next_date),
            Cell::new(due),
            Cell::new(would_create),
            Cell::new(entry.next_date_after),
        ]);
    }
    println!("{table}");
    let total: usize = entries.iter().map(|e| e.occurrences.len()).sum();
    println!("{total} transaction(s) would be created");
    print_failures(&preview.unreadable);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_today_parses_override() {
        assert_eq!(
            resolve_today(Some("2025-01-20")).unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 20).unwrap()
        );
        assert!(resolve_today(Some("20/01/2025")).is_err());
    }
}
