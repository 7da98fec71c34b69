//! ens-core: Shared types, errors, configuration and name hashing
//!
//! This crate provides the foundational types used across the ENS bootstrap workspace.

pub mod config;
pub mod domain;
pub mod errors;
pub mod namehash;
pub mod types;

pub use config::*;
pub use domain::DomainName;
pub use errors::*;
pub use namehash::{keccak256, labelhash, namehash, reverse_node, zero_node};
pub use types::*;
