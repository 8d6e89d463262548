//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Tally - Deduplicate ledger imports and match cross-account transfers
#[derive(Parser)]
#[command(name = "tally")]
#[command(about = "Ledger transaction matching: duplicate merge and transfer links", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "tally.db", global = true)]
    pub db: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable database encryption (not recommended for production)
    ///
    /// By default, the database is encrypted using SQLCipher.
    /// Set TALLY_DB_KEY environment variable with your passphrase.
    /// Use --no-encrypt only for development or testing.
    #[arg(long, global = true)]
    pub no_encrypt: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// Import line items from a statement CSV
    Import {
        /// CSV file to import (columns: date,amount,quantity,symbol,balance,description,memo)
        #[arg(short, long)]
        file: PathBuf,

        /// Account name to import into (created if missing)
        #[arg(short, long)]
        account: String,

        /// Account kind when creating: checking, savings, credit, brokerage
        #[arg(short, long, default_value = "checking")]
        kind: String,
    },

    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Directory containing static files to serve (e.g., ui/dist)
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },

    /// Show database status (encryption, counts)
    Status,

    /// Manage accounts (list, add, delete)
    Accounts {
        #[command(subcommand)]
        action: Option<AccountsAction>,
    },

    /// Manage transactions (list, add, delete)
    Transactions {
        #[command(subcommand)]
        action: Option<TransactionsAction>,
    },

    /// Find and merge duplicate transactions
    Duplicates {
        #[command(subcommand)]
        action: DuplicatesAction,
    },

    /// Show transfer candidates for a transaction
    Linkable {
        /// Transaction ID
        transaction_id: i64,
    },

    /// Link two transactions as a transfer pair
    Link {
        /// Source side of the transfer
        parent_t_id: i64,
        /// Other side of the transfer
        child_t_id: i64,
    },

    /// Remove the transfer link between two transactions
    Unlink {
        /// Transaction ID
        transaction_id: i64,
        /// The transaction it is linked to
        linked_t_id: i64,
    },

    /// Manage tags (list, add, delete)
    Tags {
        #[command(subcommand)]
        action: Option<TagsAction>,
    },

    /// Add a tag to a transaction
    Tag {
        /// Transaction ID
        transaction_id: i64,
        /// Tag label (created if missing)
        label: String,
    },

    /// Remove a tag from a transaction
    Untag {
        /// Transaction ID
        transaction_id: i64,
        /// Tag label
        label: String,
    },
}

#[derive(Subcommand)]
pub enum AccountsAction {
    /// List accounts
    List,
    /// Add an account
    Add {
        /// Account name
        name: String,
        /// Account kind: checking, savings, credit, brokerage
        #[arg(short, long, default_value = "checking")]
        kind: String,
    },
    /// Delete an account and all its transactions
    Delete {
        /// Account ID
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum TransactionsAction {
    /// List transactions
    List {
        /// Restrict to one account
        #[arg(short, long)]
        account: Option<i64>,
        /// Number of transactions to show
        #[arg(short, long, default_value = "20")]
        limit: i64,
    },
    /// Add a transaction manually
    Add {
        /// Account ID
        #[arg(short, long)]
        account: i64,
        /// Date (YYYY-MM-DD)
        #[arg(short, long)]
        date: String,
        /// Signed amount (negative = outflow)
        #[arg(long, allow_hyphen_values = true)]
        amount: f64,
        /// Description text
        #[arg(long)]
        description: Option<String>,
        /// Memo text
        #[arg(long)]
        memo: Option<String>,
    },
    /// Delete a transaction
    Delete {
        /// Transaction ID
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum DuplicatesAction {
    /// Scan an account for duplicate groups
    Find {
        /// Account ID
        account: i64,
        /// Restrict the scan to one calendar year
        #[arg(short, long)]
        year: Option<i32>,
    },
    /// Merge one duplicate group
    Merge {
        /// Account ID
        #[arg(short, long)]
        account: i64,
        /// Transaction ID to keep
        #[arg(short, long)]
        keep: i64,
        /// Transaction IDs to fold into it
        #[arg(short, long, num_args = 1.., required = true)]
        delete: Vec<i64>,
    },
}

#[derive(Subcommand)]
pub enum TagsAction {
    /// List tags
    List,
    /// Add a tag
    Add {
        /// Tag label
        label: String,
        /// Display color (e.g., "#10b981")
        #[arg(short, long)]
        color: Option<String>,
    },
    /// Delete a tag
    Delete {
        /// Tag ID
        id: i64,
    },
}
