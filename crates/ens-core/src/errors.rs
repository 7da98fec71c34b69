//! Error types for the ENS bootstrapper

use thiserror::Error;

use crate::types::{Address, TxHash};

/// Failures reported by a ledger client
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("Ledger RPC failed: {message}")]
    Rpc { message: String },

    #[error("Transaction {tx} reverted: {reason}")]
    Reverted { tx: TxHash, reason: String },

    #[error("Transaction {tx} was dropped before confirmation")]
    Dropped { tx: TxHash },

    #[error("Timed out after {secs}s waiting for confirmation")]
    Timeout { secs: u64 },

    #[error("Unknown transaction: {tx}")]
    UnknownTransaction { tx: TxHash },

    #[error("No receipt for confirmed transaction {tx}")]
    MissingReceipt { tx: TxHash },

    #[error("Receipt for {tx} carries no contract address")]
    MissingContractAddress { tx: TxHash },

    #[error("No contract deployed at {address}")]
    UnknownContract { address: Address },

    #[error("Invalid contract artifact {name}: {message}")]
    InvalidArtifact { name: String, message: String },
}

/// Orchestration errors
#[derive(Debug, Error)]
pub enum EnsError {
    #[error("Step '{step}' failed after {attempts} attempts: {source}")]
    RetriesExhausted {
        step: String,
        attempts: usize,
        #[source]
        source: LedgerError,
    },

    #[error("{operation} requires a completed bootstrap")]
    NotBootstrapped { operation: &'static str },

    #[error("Domain not claimed: {domain}")]
    DomainNotClaimed { domain: String },

    #[error("Cannot record {domain}: parent {parent} has no registrar")]
    ParentNotClaimed { domain: String, parent: String },

    #[error("Invalid domain '{name}': {reason}")]
    InvalidDomain { name: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for ledger client operations
pub type LedgerResult<T> = std::result::Result<T, LedgerError>;

/// Result type alias for orchestration operations
pub type Result<T> = std::result::Result<T, EnsError>;

impl EnsError {
    /// Stable machine-readable error code
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::RetriesExhausted { .. } => "retries_exhausted",
            Self::NotBootstrapped { .. } => "not_bootstrapped",
            Self::DomainNotClaimed { .. } => "domain_not_claimed",
            Self::ParentNotClaimed { .. } => "parent_not_claimed",
            Self::InvalidDomain { .. } => "invalid_domain",
            Self::Config(_) => "config",
        }
    }

    /// Whether the failure came from the ledger rather than from caller misuse
    pub fn is_ledger_failure(&self) -> bool {
        matches!(self, Self::RetriesExhausted { .. })
    }
}
