//! Error types for Tally

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Encryption error: {0}")]
    Encryption(String),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Import error: {0}")]
    Import(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Transactions are already linked")]
    AlreadyLinked,

    #[error("Transaction is already the child of another transfer")]
    ChildAlreadyLinked,

    #[error("Linked amount would meet or exceed the source transaction amount")]
    LinkCapacityExceeded,
}

impl Error {
    /// Stable machine-readable kind for API error bodies
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Database(_) | Self::Pool(_) => "store",
            Self::Encryption(_) => "encryption",
            Self::Csv(_) | Self::Import(_) => "import",
            Self::Io(_) => "io",
            Self::InvalidData(_) => "validation",
            Self::NotFound(_) => "not_found",
            Self::AlreadyLinked => "already_linked",
            Self::ChildAlreadyLinked => "child_already_linked",
            Self::LinkCapacityExceeded => "link_capacity_exceeded",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
