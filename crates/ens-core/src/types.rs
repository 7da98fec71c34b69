//! Core type definitions for the ENS bootstrapper

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::namehash::keccak256;

/// Error returned when parsing a hex-encoded fixed-size value fails
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HexParseError {
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

fn decode_fixed<const N: usize>(s: &str) -> Result<[u8; N], HexParseError> {
    let stripped = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(stripped).map_err(|e| HexParseError::InvalidHex(e.to_string()))?;
    <[u8; N]>::try_from(bytes.as_slice()).map_err(|_| HexParseError::InvalidLength {
        expected: N,
        actual: bytes.len(),
    })
}

/// Declares a fixed-size byte newtype that displays and serializes as `0x`-prefixed hex.
macro_rules! fixed_bytes {
    ($(#[$meta:meta])* $name:ident, $len:expr) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub [u8; $len]);

        impl $name {
            pub const LEN: usize = $len;

            pub const fn new(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }

            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            /// Lowercase hex without the `0x` prefix
            pub fn to_hex(&self) -> String {
                hex::encode(self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "0x{}", self.to_hex())
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self)
            }
        }

        impl FromStr for $name {
            type Err = HexParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                decode_fixed::<$len>(s).map(Self)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

fixed_bytes!(
    /// Ledger account or contract address (20 bytes)
    Address,
    20
);

fixed_bytes!(
    /// Node fingerprint of a fully-qualified name (32 bytes)
    Node,
    32
);

fixed_bytes!(
    /// Transaction hash (32 bytes)
    TxHash,
    32
);

/// Label fingerprints share the node representation
pub type LabelHash = Node;

impl Address {
    pub const ZERO: Address = Address([0u8; 20]);

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// Derive an address from the last 20 bytes of a 32-byte digest
    pub fn from_digest(digest: &[u8; 32]) -> Self {
        let mut out = [0u8; 20];
        out.copy_from_slice(&digest[12..]);
        Self(out)
    }
}

impl Node {
    /// The root node (all zero bytes)
    pub const ROOT: Node = Node([0u8; 32]);

    pub fn is_root(&self) -> bool {
        *self == Self::ROOT
    }
}

/// The identity a transaction is sent as.
///
/// The deployer and any wallet that must authorize a call for itself are
/// both identities. Signing is the ledger client's concern.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    pub address: Address,
}

impl Identity {
    pub fn new(name: impl Into<String>, address: Address) -> Self {
        Self {
            name: name.into(),
            address,
        }
    }

    /// Deterministic development identity derived from a name
    pub fn derived(name: impl Into<String>) -> Self {
        let name = name.into();
        let address = Address::from_digest(&keccak256(name.as_bytes()));
        Self { name, address }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.address)
    }
}

/// Gas settings attached to every deployment or call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GasOptions {
    pub gas_limit: u64,
    /// Gas price in wei
    pub gas_price: u64,
}

impl GasOptions {
    pub const fn new(gas_limit: u64, gas_price: u64) -> Self {
        Self {
            gas_limit,
            gas_price,
        }
    }
}

/// Target environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Devnet,
    Testnet,
    Staging,
    Mainnet,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Devnet => "devnet",
            Self::Testnet => "testnet",
            Self::Staging => "staging",
            Self::Mainnet => "mainnet",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Gas price unit helpers
pub mod constants {
    /// 1 gwei in wei
    pub const WEI_PER_GWEI: u64 = 1_000_000_000;

    /// Gas limit used for both deployments and calls
    pub const DEFAULT_GAS_LIMIT: u64 = 4_000_000;

    /// Default gas price for contract deployments (9 gwei)
    pub const DEFAULT_DEPLOY_GAS_PRICE: u64 = 9 * WEI_PER_GWEI;

    /// Default gas price for ordinary calls (1 gwei)
    pub const DEFAULT_CALL_GAS_PRICE: u64 = WEI_PER_GWEI;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_hex_roundtrip() {
        let addr: Address = "0x00000000000c2e074ec69a0dfb2997ba6c7d2e1e".parse().unwrap();
        assert_eq!(addr.to_string(), "0x00000000000c2e074ec69a0dfb2997ba6c7d2e1e");

        let no_prefix: Address = "00000000000c2e074ec69a0dfb2997ba6c7d2e1e".parse().unwrap();
        assert_eq!(addr, no_prefix);
    }

    #[test]
    fn test_address_rejects_wrong_length() {
        let err = "0x1234".parse::<Address>().unwrap_err();
        assert_eq!(
            err,
            HexParseError::InvalidLength {
                expected: 20,
                actual: 2
            }
        );
        assert!(matches!(
            "0xzz".parse::<Address>(),
            Err(HexParseError::InvalidHex(_))
        ));
    }

    #[test]
    fn test_root_node() {
        assert!(Node::ROOT.is_root());
        assert_eq!(
            Node::ROOT.to_string(),
            "0x0000000000000000000000000000000000000000000000000000000000000000"
        );
    }

    #[test]
    fn test_default_is_zero() {
        assert_eq!(Address::default(), Address::ZERO);
        assert!(Node::default().is_root());
        assert_eq!(TxHash::default().as_bytes(), &[0u8; 32]);
    }

    #[test]
    fn test_derived_identity_is_deterministic() {
        let a = Identity::derived("deployer");
        let b = Identity::derived("deployer");
        let c = Identity::derived("wallet");
        assert_eq!(a, b);
        assert_ne!(a.address, c.address);
        assert!(!a.address.is_zero());
    }

    #[test]
    fn test_address_serde_as_string() {
        let addr = Identity::derived("x").address;
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{}\"", addr));
        let parsed: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, addr);
    }

    #[test]
    fn test_environment_display() {
        assert_eq!(Environment::Testnet.as_str(), "testnet");
        assert_eq!(Environment::Mainnet.to_string(), "mainnet");
    }
}
