//! Domain models for Tally

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A ledger account (bank or brokerage)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub name: String,
    pub kind: AccountKind,
    pub created_at: DateTime<Utc>,
}

/// Account kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    Checking,
    Savings,
    Credit,
    Brokerage,
}

impl AccountKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Checking => "checking",
            Self::Savings => "savings",
            Self::Credit => "credit",
            Self::Brokerage => "brokerage",
        }
    }
}

impl std::str::FromStr for AccountKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "checking" => Ok(Self::Checking),
            "savings" => Ok(Self::Savings),
            "credit" => Ok(Self::Credit),
            "brokerage" => Ok(Self::Brokerage),
            _ => Err(format!("Unknown account kind: {}", s)),
        }
    }
}

impl std::fmt::Display for AccountKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single ledger transaction record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    pub id: i64,
    pub account_id: i64,
    /// Calendar date, no time component
    pub date: NaiveDate,
    /// Share/unit quantity for brokerage rows
    pub quantity: Option<f64>,
    /// Negative = outflow, positive = inflow
    pub amount: f64,
    /// Ticker or instrument symbol for brokerage rows
    pub symbol: Option<String>,
    /// Running balance reported after this transaction
    pub balance_after: Option<f64>,
    pub description: Option<String>,
    pub memo: Option<String>,
    /// Set by a completed duplicate scan that cleared this row, so later
    /// scans skip it. Reset never happens automatically.
    pub verified_not_duplicate: bool,
    pub created_at: DateTime<Utc>,
}

/// A new line item before DB insertion (from import or manual entry)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLineItem {
    pub date: NaiveDate,
    pub quantity: Option<f64>,
    pub amount: f64,
    pub symbol: Option<String>,
    pub balance_after: Option<f64>,
    pub description: Option<String>,
    pub memo: Option<String>,
}

/// A label that can be attached to line items
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub label: String,
    /// Optional color for UI display (e.g., "#10b981")
    pub color: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A transfer relationship: `child_t_id` is the other side of a transfer
/// whose source is `parent_t_id`. Soft-deleted rows are kept for audit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferLink {
    pub id: i64,
    pub parent_t_id: i64,
    pub child_t_id: i64,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// A set of line items judged to be the same real-world transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// The normalized bucket key the group was found under
    pub key: String,
    pub transactions: Vec<LineItem>,
    /// The designated survivor (highest id = freshest import)
    pub keep_id: i64,
    pub delete_ids: Vec<i64>,
}

/// Result of a duplicate scan over one account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateScan {
    pub groups: Vec<DuplicateGroup>,
    /// Total groups found (equals `groups.len()` unless capped)
    pub total: usize,
    /// Rows newly marked `verified_not_duplicate` by this scan
    pub marked_as_non_duplicate: usize,
    /// Rows that were already marked before this scan ran
    pub previously_marked_count: usize,
}

/// One user-confirmed merge: keep `keep_id`, fold `delete_ids` into it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeInstruction {
    pub keep_id: i64,
    pub delete_ids: Vec<i64>,
}

/// Accumulated result of applying a batch of merge instructions
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MergeOutcome {
    /// Superseded line items deleted
    pub merged_count: usize,
    /// Tags newly attached to surviving line items
    pub tags_added: usize,
}

/// Transfer candidates for a source transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkCandidates {
    pub source_transaction: LineItem,
    /// Other-account matches inside the date/amount window, best first
    pub potential_matches: Vec<LineItem>,
    /// Sum of `abs(amount)` over the source's existing active children
    pub linked_amount: f64,
    /// False once the children already consume the source's capacity
    pub linking_allowed: bool,
}

/// Audit log entry
#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    pub id: i64,
    pub timestamp: String,
    pub actor: String,
    pub action: String,
    pub entity_type: Option<String>,
    pub entity_id: Option<i64>,
    pub details: Option<String>,
}
