//! ens-builder: Bootstraps an ENS deployment on a ledger
//!
//! - `retry`: the two-attempt policy every ledger-affecting step runs under
//! - `domain_tree`: which registrar owns each claimed domain
//! - `builder`: `EnsBuilder`, the orchestrator sequencing deployments and
//!   ownership transfers
//!
//! # Example
//!
//! ```ignore
//! use ens_builder::EnsBuilder;
//! use ens_core::Identity;
//! use ledger_client::MemoryLedger;
//!
//! let mut builder = EnsBuilder::new(MemoryLedger::new(), Identity::derived("deployer"));
//! let registry = builder.bootstrap_with("alice", "mytld").await?;
//! builder
//!     .register_address_with_reverse("bob", "mytld", &wallet)
//!     .await?;
//! ```

pub mod builder;
pub mod domain_tree;
pub mod retry;

pub use builder::{CoreContracts, DeploymentContext, DeploymentSummary, EnsBuilder};
pub use domain_tree::{DomainTree, Registrar, RegistrarKind};
pub use retry::{RetryExecutor, MAX_ATTEMPTS};
