//! Tally CLI - ledger dedup and transfer matching
//!
//! Usage:
//!   tally init                          Initialize database
//!   tally import -f stmt.csv -a Name    Import a statement CSV
//!   tally duplicates find <account>     Scan for duplicate groups
//!   tally serve --port 3000             Start web server

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Init => commands::cmd_init(&cli.db, cli.no_encrypt),
        Commands::Import {
            file,
            account,
            kind,
        } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_import(&db, &file, &account, &kind)
        }
        Commands::Serve {
            port,
            host,
            static_dir,
        } => commands::cmd_serve(&cli.db, &host, port, cli.no_encrypt, static_dir.as_deref()).await,
        Commands::Status => commands::cmd_status(&cli.db, cli.no_encrypt),
        Commands::Accounts { action } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            match action {
                None | Some(AccountsAction::List) => commands::cmd_accounts_list(&db),
                Some(AccountsAction::Add { name, kind }) => {
                    commands::cmd_accounts_add(&db, &name, &kind)
                }
                Some(AccountsAction::Delete { id }) => commands::cmd_accounts_delete(&db, id),
            }
        }
        Commands::Transactions { action } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            match action {
                None => commands::cmd_transactions_list(&db, None, 20),
                Some(TransactionsAction::List { account, limit }) => {
                    commands::cmd_transactions_list(&db, account, limit)
                }
                Some(TransactionsAction::Add {
                    account,
                    date,
                    amount,
                    description,
                    memo,
                }) => commands::cmd_transactions_add(
                    &db,
                    account,
                    &date,
                    amount,
                    description.as_deref(),
                    memo.as_deref(),
                ),
                Some(TransactionsAction::Delete { id }) => {
                    commands::cmd_transactions_delete(&db, id)
                }
            }
        }
        Commands::Duplicates { action } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            match action {
                DuplicatesAction::Find { account, year } => {
                    commands::cmd_duplicates_find(&db, account, year)
                }
                DuplicatesAction::Merge {
                    account,
                    keep,
                    delete,
                } => commands::cmd_duplicates_merge(&db, account, keep, &delete),
            }
        }
        Commands::Linkable { transaction_id } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_linkable(&db, transaction_id)
        }
        Commands::Link {
            parent_t_id,
            child_t_id,
        } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_link(&db, parent_t_id, child_t_id)
        }
        Commands::Unlink {
            transaction_id,
            linked_t_id,
        } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_unlink(&db, transaction_id, linked_t_id)
        }
        Commands::Tags { action } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            match action {
                None | Some(TagsAction::List) => commands::cmd_tags_list(&db),
                Some(TagsAction::Add { label, color }) => {
                    commands::cmd_tags_add(&db, &label, color.as_deref())
                }
                Some(TagsAction::Delete { id }) => commands::cmd_tags_delete(&db, id),
            }
        }
        Commands::Tag {
            transaction_id,
            label,
        } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_tag(&db, transaction_id, &label)
        }
        Commands::Untag {
            transaction_id,
            label,
        } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_untag(&db, transaction_id, &label)
        }
    }
}
