//! ledger-client: Ledger access for the ENS bootstrapper
//!
//! This crate defines the interface the orchestrator uses to reach a ledger:
//! - `LedgerClient`, the submit / confirm / receipt trait a concrete client implements
//! - typed transaction requests for the registry, registrar and resolver contracts
//! - `deploy_contract`, the deploy-and-wait helper
//! - `MemoryLedger`, an in-memory ledger for dry runs and tests
//!
//! # Example
//!
//! ```ignore
//! use ledger_client::{deploy_contract, ArtifactSet, ConstructorArgs, ContractKind, MemoryLedger};
//!
//! let ledger = MemoryLedger::new();
//! let artifacts = ArtifactSet::default();
//! let registry = deploy_contract(
//!     &ledger,
//!     &deployer,
//!     artifacts.get(ContractKind::EnsRegistry)?,
//!     ConstructorArgs::EnsRegistry,
//!     config.deploy_gas,
//! )
//! .await?;
//! ```

pub mod client;
pub mod deploy;
pub mod memory;
pub mod pending;
pub mod request;

pub use client::{LedgerClient, LocalLedgerClient};
pub use deploy::deploy_contract;
pub use memory::{CallRecord, MemoryLedger, Record};
pub use pending::PendingTransaction;
pub use request::{
    ArtifactSet, ConstructorArgs, ContractArtifact, ContractCall, ContractHandle, ContractKind,
    DeployPayload, Payload, Receipt, ReceiptStatus, TransactionRequest,
};
