pub mod accounts;
pub mod categories;
pub mod init;
pub mod process;
pub mod recurring;
pub mod status;
pub mod transactions;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "budgie", about = "Personal finance with recurring transactions kept on schedule.")]
pub struct Cli {
    /// Log engine activity to stderr (overridden by BUDGIE_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Choose a data directory and initialize the database.
    Init {
        /// Path for budgie data (default: ~/Documents/budgie)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Show current database and summary statistics.
    Status,
    /// Manage accounts.
    Accounts {
        #[command(subcommand)]
        command: AccountsCommands,
    },
    /// Manage categories.
    Categories {
        #[command(subcommand)]
        command: CategoriesCommands,
    },
    /// Manage recurring transactions.
    Recurring {
        #[command(subcommand)]
        command: RecurringCommands,
    },
    /// Browse transactions.
    Transactions {
        #[command(subcommand)]
        command: TransactionsCommands,
    },
    /// Materialize every recurring transaction that is due. Meant for a daily cron job.
    Process {
        /// Treat this date as today: YYYY-MM-DD
        #[arg(long)]
        today: Option<String>,
        /// Only process recurring transactions owned by this user
        #[arg(long)]
        user: Option<i64>,
        /// Show what would be created without writing anything
        #[arg(long = "dry-run")]
        dry_run: bool,
        /// Create at most N missed occurrences per recurring transaction.
        /// One that hits the limit stays due, so a second run the same day
        /// continues it. Overrides `max_catch_up` in settings.
        #[arg(long = "max-catch-up", value_name = "N")]
        max_catch_up: Option<usize>,
    },
}

#[derive(Subcommand)]
pub enum AccountsCommands {
    /// Add a new account.
    Add {
        /// Account name, e.g. 'Main Checking'
        name: String,
        /// Account type: checking, savings, credit_card, cash
        #[arg(long = "type")]
        account_type: String,
        /// Owning user (default from settings)
        #[arg(long)]
        user: Option<i64>,
    },
    /// List accounts.
    List {
        #[arg(long)]
        user: Option<i64>,
    },
}

#[derive(Subcommand)]
pub enum CategoriesCommands {
    /// Add a category.
    Add {
        name: String,
        /// Category type: income or expense
        #[arg(long = "type")]
        category_type: String,
        #[arg(long)]
        user: Option<i64>,
    },
    /// List categories.
    List {
        #[arg(long)]
        user: Option<i64>,
    },
}

#[derive(Subcommand)]
pub enum RecurringCommands {
    /// Add a recurring transaction. Its first occurrence is the start date.
    Add {
        /// Description copied onto every generated transaction
        description: String,
        /// Signed amount, e.g. -1200.00 for rent
        #[arg(long, allow_hyphen_values = true)]
        amount: String,
        /// weekly, monthly or annually
        #[arg(long)]
        frequency: String,
        /// First occurrence: YYYY-MM-DD
        #[arg(long)]
        start: String,
        /// Account name
        #[arg(long)]
        account: String,
        /// Category name
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        user: Option<i64>,
        /// Do not process automatically
        #[arg(long)]
        manual: bool,
    },
    /// List recurring transactions.
    List {
        #[arg(long)]
        user: Option<i64>,
    },
    /// Turn on automatic processing.
    Enable { id: i64 },
    /// Turn off automatic processing.
    Disable { id: i64 },
    /// Delete a recurring transaction. Transactions it created are kept.
    Delete { id: i64 },
    /// Show the occurrence that follows the next scheduled one.
    Next { id: i64 },
}

#[derive(Subcommand)]
pub enum TransactionsCommands {
    /// List transactions, newest first.
    List {
        #[arg(long)]
        user: Option<i64>,
        /// Filter by account name
        #[arg(long)]
        account: Option<String>,
        /// Only transactions generated by this recurring transaction
        #[arg(long)]
        recurring: Option<i64>,
    },
}
