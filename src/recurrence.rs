//! Advancing recurring transactions.
//!
//! Every operation takes `today` from the caller; nothing in here reads the
//! clock. A definition is either due (`auto_process` and `next_date <= today`)
//! or scheduled. Materializing an occurrence moves it from due to scheduled by
//! pushing `next_date` forward one period.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::error::{BudgieError, FailureKind, Result};
use crate::models::{NewTransaction, RecurringDefinition, Transaction};
use crate::store::RecurrenceStore;

pub fn is_due(def: &RecurringDefinition, today: NaiveDate) -> bool {
    def.auto_process && def.next_date <= today
}

/// The occurrence after `def.next_date`. Does not touch `def`.
pub fn calculate_next_date(def: &RecurringDefinition) -> Result<NaiveDate> {
    def.frequency
        .advance(def.next_date)
        .ok_or_else(|| BudgieError::Validation {
            id: def.id,
            reason: format!("no {} date after {}", def.frequency, def.next_date),
        })
}

fn validate(def: &RecurringDefinition) -> Result<(i64, Decimal)> {
    let invalid = |reason: &str| BudgieError::Validation {
        id: def.id,
        reason: reason.to_string(),
    };
    let amount = def.amount.ok_or_else(|| invalid("amount is missing"))?;
    if amount.is_zero() {
        return Err(invalid("amount is zero"));
    }
    let account_id = def.account_id.ok_or_else(|| invalid("account is missing"))?;
    if def.description.trim().is_empty() {
        return Err(invalid("description is empty"));
    }
    Ok((account_id, amount))
}

/// Materialize the occurrence at `def.next_date` if it is due.
///
/// Returns `Ok(None)` without side effects when the definition is not due.
/// Otherwise the new transaction and the advanced `next_date` are committed
/// together through `store`, and `def.next_date` is updated only after the
/// commit succeeds.
pub fn generate_transaction<S: RecurrenceStore + ?Sized>(
    store: &S,
    def: &mut RecurringDefinition,
    today: NaiveDate,
) -> Result<Option<Transaction>> {
    if !is_due(def, today) {
        debug!(definition = def.id, next_date = %def.next_date, "not due, skipping");
        return Ok(None);
    }

    let (account_id, amount) = validate(def)?;
    let new_next = calculate_next_date(def)?;
    let txn = NewTransaction {
        user_id: def.user_id,
        account_id,
        category_id: def.category_id,
        date: def.next_date,
        description: def.description.clone(),
        amount,
        recurring_id: Some(def.id),
    };

    let created = store.commit_occurrence(txn, def.id, def.next_date, new_next)?;
    info!(
        definition = def.id,
        date = %created.date,
        amount = %created.amount,
        next_date = %new_next,
        "materialized recurring transaction"
    );
    def.next_date = new_next;
    Ok(Some(created))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessOptions {
    /// Upper bound on occurrences materialized for one definition per run.
    /// A definition that hits it stays due, so the next run continues where
    /// this one stopped. `None` catches up completely.
    pub max_catch_up: Option<usize>,
}

impl ProcessOptions {
    fn cap(&self) -> Option<usize> {
        self.max_catch_up.map(|n| n.max(1))
    }
}

#[derive(Debug, Clone)]
pub struct ProcessFailure {
    /// `None` when the due list itself could not be loaded.
    pub definition_id: Option<i64>,
    pub description: String,
    pub kind: FailureKind,
    pub message: String,
}

impl ProcessFailure {
    fn new(definition_id: Option<i64>, description: &str, err: &BudgieError) -> Self {
        Self {
            definition_id,
            description: description.to_string(),
            kind: err.failure_kind(),
            message: err.to_string(),
        }
    }
}

const UNREADABLE: &str = "unreadable recurring transaction";

#[derive(Debug, Clone, Default)]
pub struct ProcessSummary {
    /// Definitions that materialized at least one occurrence without error.
    pub processed: usize,
    pub failed: usize,
    pub created: Vec<Transaction>,
    pub failures: Vec<ProcessFailure>,
    /// Definitions left due because they hit `max_catch_up`.
    pub capped: Vec<i64>,
}

impl ProcessSummary {
    pub fn is_healthy(&self) -> bool {
        self.failed == 0
    }

    fn record_failure(&mut self, definition_id: Option<i64>, description: &str, err: &BudgieError) {
        let failure = ProcessFailure::new(definition_id, description, err);
        warn!(definition = ?definition_id, kind = %failure.kind, error = %err, "recurring transaction failed");
        self.failed += 1;
        self.failures.push(failure);
    }
}

/// One scheduler tick: bring every due definition in `scope` up to date.
///
/// A definition that fell behind gets one occurrence per missed period, each
/// committed on its own. Failures are recorded per definition and never stop
/// the batch; this function always returns a summary.
pub fn process_due<S: RecurrenceStore + ?Sized>(
    store: &S,
    today: NaiveDate,
    scope: Option<i64>,
    options: &ProcessOptions,
) -> ProcessSummary {
    let mut summary = ProcessSummary::default();
    let cap = options.cap();

    let due = match store.due_definitions(today, scope) {
        Ok(due) => due,
        Err(e) => {
            summary.record_failure(None, "loading due recurring transactions", &e);
            return summary;
        }
    };

    for stored in due {
        let mut def = match stored {
            Ok(def) => def,
            Err(e) => {
                summary.record_failure(e.definition_id(), UNREADABLE, &e);
                continue;
            }
        };
        let mut materialized = 0usize;
        let outcome = loop {
            if let Some(cap) = cap.filter(|&cap| materialized >= cap) {
                warn!(definition = def.id, cap, next_date = %def.next_date, "catch-up limit reached");
                summary.capped.push(def.id);
                break Ok(());
            }
            match generate_transaction(store, &mut def, today) {
                Ok(Some(txn)) => {
                    summary.created.push(txn);
                    materialized += 1;
                }
                Ok(None) => break Ok(()),
                Err(e) => break Err(e),
            }
        };

        match outcome {
            Ok(()) if materialized > 0 => summary.processed += 1,
            Ok(()) => {}
            Err(e) => summary.record_failure(Some(def.id), &def.description, &e),
        }
    }

    info!(
        processed = summary.processed,
        failed = summary.failed,
        created = summary.created.len(),
        %today,
        "recurring run finished"
    );
    summary
}

#[derive(Debug, Clone)]
pub struct PreviewEntry {
    pub definition: RecurringDefinition,
    pub due: bool,
    /// Dates a real run would materialize, oldest first.
    pub occurrences: Vec<NaiveDate>,
    /// `next_date` once a real run has finished with this definition.
    pub next_date_after: NaiveDate,
    pub capped: bool,
    /// Why a real run would fail for this definition, if it would.
    pub problem: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Preview {
    pub entries: Vec<PreviewEntry>,
    /// Rows a real run would report as failed without looking further.
    pub unreadable: Vec<ProcessFailure>,
}

/// Dry run of [`process_due`]. Reads only.
pub fn preview_due<S: RecurrenceStore + ?Sized>(
    store: &S,
    today: NaiveDate,
    scope: Option<i64>,
    options: &ProcessOptions,
) -> Result<Preview> {
    let cap = options.cap();
    let mut preview = Preview::default();

    for stored in store.definitions(scope)? {
        let def = match stored {
            Ok(def) => def,
            Err(e) => {
                preview.unreadable.push(ProcessFailure::new(e.definition_id(), UNREADABLE, &e));
                continue;
            }
        };
        let due = is_due(&def, today);
        let mut cursor = def.clone();
        let mut occurrences = Vec::new();
        let mut problem = None;

        if due {
            if let Err(e) = validate(&def) {
                problem = Some(e.to_string());
            }
        }
        while problem.is_none() && is_due(&cursor, today) && cap.map_or(true, |cap| occurrences.len() < cap) {
            match calculate_next_date(&cursor) {
                Ok(next) => {
                    occurrences.push(cursor.next_date);
                    cursor.next_date = next;
                }
                Err(e) => problem = Some(e.to_string()),
            }
        }

        preview.entries.push(PreviewEntry {
            due,
            capped: problem.is_none() && is_due(&cursor, today),
            next_date_after: cursor.next_date,
            occurrences,
            problem,
            definition: def,
        });
    }
    Ok(preview)
}
