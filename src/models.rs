use std::fmt;
use std::str::FromStr;

use chrono::{Days, Months, NaiveDate};
use rust_decimal::Decimal;

use crate::error::{BudgieError, Result};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    Weekly,
    Monthly,
    Annually,
}

impl Frequency {
    #[cfg(test)]
    pub const ALL: [Frequency; 3] = [Frequency::Weekly, Frequency::Monthly, Frequency::Annually];

    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::Annually => "annually",
        }
    }

    /// Step `date` forward by one period. Month and year steps land on the
    /// last day of the target month when the source day does not exist there.
    pub fn advance(&self, date: NaiveDate) -> Option<NaiveDate> {
        match self {
            Frequency::Weekly => date.checked_add_days(Days::new(7)),
            Frequency::Monthly => date.checked_add_months(Months::new(1)),
            Frequency::Annually => date.checked_add_months(Months::new(12)),
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = BudgieError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "weekly" => Ok(Frequency::Weekly),
            "monthly" => Ok(Frequency::Monthly),
            "annually" | "yearly" => Ok(Frequency::Annually),
            other => Err(BudgieError::InvalidFrequency(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecurringDefinition {
    pub id: i64,
    pub user_id: i64,
    /// `None` when the stored amount is missing; rejected at generation time.
    pub amount: Option<Decimal>,
    pub description: String,
    pub frequency: Frequency,
    pub start_date: NaiveDate,
    pub next_date: NaiveDate,
    pub auto_process: bool,
    pub account_id: Option<i64>,
    pub category_id: Option<i64>,
}

/// A transaction row ready for insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub user_id: i64,
    pub account_id: i64,
    pub category_id: Option<i64>,
    pub date: NaiveDate,
    pub description: String,
    pub amount: Decimal,
    pub recurring_id: Option<i64>,
}

#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub id: i64,
    pub user_id: i64,
    pub account_id: i64,
    pub category_id: Option<i64>,
    pub date: NaiveDate,
    pub description: String,
    pub amount: Decimal,
    pub recurring_id: Option<i64>,
}

impl Transaction {
    pub fn from_new(id: i64, txn: NewTransaction) -> Self {
        Self {
            id,
            user_id: txn.user_id,
            account_id: txn.account_id,
            category_id: txn.category_id,
            date: txn.date,
            description: txn.description,
            amount: txn.amount,
            recurring_id: txn.recurring_id,
        }
    }
}

#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct Account {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub account_type: String,
}

#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct Category {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub category_type: String,
}

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).map_err(|_| BudgieError::InvalidDate(s.to_string()))
}

pub fn parse_amount(s: &str) -> Result<Decimal> {
    Decimal::from_str(s.trim()).map_err(|_| BudgieError::InvalidAmount(s.to_string()))
}
