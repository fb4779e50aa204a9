mod cli;
mod db;
mod error;
mod fmt;
mod models;
mod recurrence;
mod settings;
mod store;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{AccountsCommands, CategoriesCommands, Cli, Commands, RecurringCommands, TransactionsCommands};

fn init_tracing(verbose: bool) {
    let default = if verbose { "budgie=info" } else { "budgie=warn" };
    let filter = EnvFilter::try_from_env("BUDGIE_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Init { data_dir } => cli::init::run(data_dir),
        Commands::Status => cli::status::run(),
        Commands::Accounts { command } => match command {
            AccountsCommands::Add {
                name,
                account_type,
                user,
            } => cli::accounts::add(&name, &account_type, user),
            AccountsCommands::List { user } => cli::accounts::list(user),
        },
        Commands::Categories { command } => match command {
            CategoriesCommands::Add {
                name,
                category_type,
                user,
            } => cli::categories::add(&name, &category_type, user),
            CategoriesCommands::List { user } => cli::categories::list(user),
        },
        Commands::Recurring { command } => match command {
            RecurringCommands::Add {
                description,
                amount,
                frequency,
                start,
                account,
                category,
                user,
                manual,
            } => cli::recurring::add(
                &description,
                &amount,
                &frequency,
                &start,
                &account,
                category.as_deref(),
                user,
                manual,
            ),
            RecurringCommands::List { user } => cli::recurring::list(user),
            RecurringCommands::Enable { id } => cli::recurring::enable(id),
            RecurringCommands::Disable { id } => cli::recurring::disable(id),
            RecurringCommands::Delete { id } => cli::recurring::delete(id),
            RecurringCommands::Next { id } => cli::recurring::next(id),
        },
        Commands::Transactions { command } => match command {
            TransactionsCommands::List {
                user,
                account,
                recurring,
            } => cli::transactions::list(user, account.as_deref(), recurring),
        },
        Commands::Process {
            today,
            user,
            dry_run,
            max_catch_up,
        } => cli::process::run(today.as_deref(), user, dry_run, max_catch_up),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
