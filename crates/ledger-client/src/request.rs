//! Transaction requests, receipts and contract shapes
//!
//! The four contract shapes the bootstrapper touches are modelled as typed
//! constructor arguments and calls rather than raw ABI-encoded data. A
//! concrete client is responsible for encoding them.

use std::collections::HashMap;
use std::fmt;

use ens_core::{Address, GasOptions, LabelHash, LedgerError, LedgerResult, Node, TxHash};
use serde::{Deserialize, Serialize};

/// Contract shapes deployed by the bootstrapper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContractKind {
    EnsRegistry,
    FifsRegistrar,
    PublicResolver,
    ReverseRegistrar,
}

impl ContractKind {
    pub const ALL: [ContractKind; 4] = [
        Self::EnsRegistry,
        Self::FifsRegistrar,
        Self::PublicResolver,
        Self::ReverseRegistrar,
    ];

    /// Name of the compiled artifact for this contract
    pub fn artifact_name(&self) -> &'static str {
        match self {
            Self::EnsRegistry => "ENSRegistry",
            Self::FifsRegistrar => "FIFSRegistrar",
            Self::PublicResolver => "PublicResolver",
            Self::ReverseRegistrar => "ReverseRegistrar",
        }
    }
}

impl fmt::Display for ContractKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.artifact_name())
    }
}

/// Compiled contract code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractArtifact {
    pub kind: ContractKind,
    pub bytecode: Vec<u8>,
}

#[derive(Deserialize)]
struct RawArtifact {
    bytecode: String,
}

/// The artifact for every contract kind.
///
/// `ArtifactSet::default()` carries empty bytecode, which is only meaningful
/// for ledgers that instantiate contracts by kind (such as
/// [`crate::MemoryLedger`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSet {
    artifacts: HashMap<ContractKind, ContractArtifact>,
}

impl Default for ArtifactSet {
    fn default() -> Self {
        let artifacts = ContractKind::ALL
            .into_iter()
            .map(|kind| {
                (
                    kind,
                    ContractArtifact {
                        kind,
                        bytecode: Vec::new(),
                    },
                )
            })
            .collect();
        Self { artifacts }
    }
}

impl ArtifactSet {
    /// Parse `{"ENSRegistry": {"bytecode": "..."}, ...}`.
    ///
    /// Bytecode may carry a `0x` prefix. Every contract kind must be present.
    pub fn from_json_str(json: &str) -> LedgerResult<Self> {
        let raw: HashMap<String, RawArtifact> =
            serde_json::from_str(json).map_err(|e| LedgerError::InvalidArtifact {
                name: "<set>".to_string(),
                message: e.to_string(),
            })?;

        let mut artifacts = HashMap::new();
        for kind in ContractKind::ALL {
            let name = kind.artifact_name();
            let entry = raw.get(name).ok_or_else(|| LedgerError::InvalidArtifact {
                name: name.to_string(),
                message: "missing from artifact set".to_string(),
            })?;
            let hex_code = entry.bytecode.strip_prefix("0x").unwrap_or(&entry.bytecode);
            let bytecode = hex::decode(hex_code).map_err(|e| LedgerError::InvalidArtifact {
                name: name.to_string(),
                message: e.to_string(),
            })?;
            artifacts.insert(kind, ContractArtifact { kind, bytecode });
        }

        Ok(Self { artifacts })
    }

    pub fn get(&self, kind: ContractKind) -> LedgerResult<&ContractArtifact> {
        self.artifacts
            .get(&kind)
            .ok_or_else(|| LedgerError::InvalidArtifact {
                name: kind.artifact_name().to_string(),
                message: "missing from artifact set".to_string(),
            })
    }
}

/// Typed constructor arguments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstructorArgs {
    EnsRegistry,
    /// Registrar claiming labels under `node`
    FifsRegistrar { registry: Address, node: Node },
    PublicResolver { registry: Address },
    ReverseRegistrar { registry: Address, resolver: Address },
}

impl ConstructorArgs {
    pub fn kind(&self) -> ContractKind {
        match self {
            Self::EnsRegistry => ContractKind::EnsRegistry,
            Self::FifsRegistrar { .. } => ContractKind::FifsRegistrar,
            Self::PublicResolver { .. } => ContractKind::PublicResolver,
            Self::ReverseRegistrar { .. } => ContractKind::ReverseRegistrar,
        }
    }
}

/// Calls made against deployed contracts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContractCall {
    /// Registry: transfer ownership of `node`
    SetOwner { node: Node, owner: Address },
    /// Registry: point `node` at a resolver
    SetResolver { node: Node, resolver: Address },
    /// Registrar: claim `label` under the registrar's node
    Register { label: LabelHash, owner: Address },
    /// Resolver: set the address record of `node`
    SetAddr { node: Node, addr: Address },
    /// Reverse registrar: set the caller's reverse name
    SetName { name: String },
}

impl ContractCall {
    pub fn method(&self) -> &'static str {
        match self {
            Self::SetOwner { .. } => "setOwner",
            Self::SetResolver { .. } => "setResolver",
            Self::Register { .. } => "register",
            Self::SetAddr { .. } => "setAddr",
            Self::SetName { .. } => "setName",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployPayload {
    pub artifact: ContractArtifact,
    pub args: ConstructorArgs,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Deploy(DeployPayload),
    Call(ContractCall),
}

/// A transaction ready to be signed and submitted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRequest {
    /// Target contract; `None` for deployments
    pub to: Option<Address>,
    pub payload: Payload,
    pub gas: GasOptions,
}

impl TransactionRequest {
    pub fn deploy(artifact: ContractArtifact, args: ConstructorArgs, gas: GasOptions) -> Self {
        Self {
            to: None,
            payload: Payload::Deploy(DeployPayload { artifact, args }),
            gas,
        }
    }

    pub fn call(to: Address, call: ContractCall, gas: GasOptions) -> Self {
        Self {
            to: Some(to),
            payload: Payload::Call(call),
            gas,
        }
    }

    /// Short description for logs
    pub fn describe(&self) -> String {
        match (&self.payload, &self.to) {
            (Payload::Deploy(d), _) => format!("deploy {}", d.artifact.kind),
            (Payload::Call(c), Some(to)) => format!("{} on {}", c.method(), to),
            (Payload::Call(c), None) => c.method().to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReceiptStatus {
    Success,
    Reverted,
}

/// Confirmation record of a mined transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub tx_hash: TxHash,
    pub status: ReceiptStatus,
    /// Set for successful deployments
    pub contract_address: Option<Address>,
}

impl Receipt {
    pub fn is_success(&self) -> bool {
        self.status == ReceiptStatus::Success
    }
}

/// A confirmed contract deployment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContractHandle {
    pub address: Address,
    pub kind: ContractKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_set_from_json() {
        let json = r#"{
            "ENSRegistry": {"bytecode": "0x6080"},
            "FIFSRegistrar": {"bytecode": "6081"},
            "PublicResolver": {"bytecode": "6082"},
            "ReverseRegistrar": {"bytecode": "0x6083"}
        }"#;
        let set = ArtifactSet::from_json_str(json).unwrap();
        assert_eq!(
            set.get(ContractKind::EnsRegistry).unwrap().bytecode,
            vec![0x60, 0x80]
        );
        assert_eq!(
            set.get(ContractKind::ReverseRegistrar).unwrap().bytecode,
            vec![0x60, 0x83]
        );
    }

    #[test]
    fn test_artifact_set_requires_every_kind() {
        let err = ArtifactSet::from_json_str(r#"{"ENSRegistry": {"bytecode": "00"}}"#)
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidArtifact { ref name, .. } if name == "FIFSRegistrar"));
    }

    #[test]
    fn test_artifact_set_rejects_bad_hex() {
        let json = r#"{
            "ENSRegistry": {"bytecode": "zz"},
            "FIFSRegistrar": {"bytecode": ""},
            "PublicResolver": {"bytecode": ""},
            "ReverseRegistrar": {"bytecode": ""}
        }"#;
        assert!(ArtifactSet::from_json_str(json).is_err());
    }

    #[test]
    fn test_constructor_kind() {
        let args = ConstructorArgs::FifsRegistrar {
            registry: Address::ZERO,
            node: Node::ROOT,
        };
        assert_eq!(args.kind(), ContractKind::FifsRegistrar);
        assert_eq!(ConstructorArgs::EnsRegistry.kind().artifact_name(), "ENSRegistry");
    }

    #[test]
    fn test_describe_request() {
        let gas = GasOptions::new(1, 1);
        let call = TransactionRequest::call(
            Address::ZERO,
            ContractCall::SetName {
                name: "bob.mytld".into(),
            },
            gas,
        );
        assert_eq!(
            call.describe(),
            "setName on 0x0000000000000000000000000000000000000000"
        );

        let deploy = TransactionRequest::deploy(
            ArtifactSet::default()
                .get(ContractKind::PublicResolver)
                .unwrap()
                .clone(),
            ConstructorArgs::PublicResolver {
                registry: Address::ZERO,
            },
            gas,
        );
        assert_eq!(deploy.describe(), "deploy PublicResolver");
        assert!(deploy.to.is_none());
    }
}
