//! Name hashing (EIP-137)
//!
//! Pure functions producing label and node fingerprints. Names are hashed
//! exactly as given; normalization happens in [`crate::DomainName`].

use sha3::{Digest, Keccak256};

use crate::types::{Address, LabelHash, Node};

/// Reverse-lookup parent domain
pub const ADDR_REVERSE: &str = "addr.reverse";

/// Keccak-256 digest of `data`
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Fingerprint of a single label
pub fn labelhash(label: &str) -> LabelHash {
    Node(keccak256(label.as_bytes()))
}

/// Fingerprint of a dot-separated name. The empty name is the root node.
pub fn namehash(name: &str) -> Node {
    if name.is_empty() {
        return Node::ROOT;
    }
    name.rsplit('.')
        .fold(Node::ROOT, |parent, label| subnode(&parent, &labelhash(label)))
}

/// Node of `label` directly under `parent`
pub fn subnode(parent: &Node, label: &LabelHash) -> Node {
    let mut buf = [0u8; 64];
    buf[..32].copy_from_slice(parent.as_bytes());
    buf[32..].copy_from_slice(label.as_bytes());
    Node(keccak256(&buf))
}

/// The root node
pub fn zero_node() -> Node {
    Node::ROOT
}

/// Node of `<hex address>.addr.reverse`
pub fn reverse_node(address: &Address) -> Node {
    subnode(&namehash(ADDR_REVERSE), &labelhash(&address.to_hex()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(hex: &str) -> Node {
        hex.parse().unwrap()
    }

    #[test]
    fn test_empty_name_is_root() {
        assert_eq!(namehash(""), Node::ROOT);
        assert_eq!(zero_node(), Node::ROOT);
    }

    #[test]
    fn test_known_vectors() {
        assert_eq!(
            labelhash("eth"),
            node("0x4f5b812789fc606be1b3b16908db13fc7a9adf7ca72641f84d75b47069d3d7f0")
        );
        assert_eq!(
            namehash("eth"),
            node("0x93cdeb708b7545dc668eb9280176169d1c33cfd8ed6f04690a0bcc88a93fc4ae")
        );
        assert_eq!(
            namehash("foo.eth"),
            node("0xde9b09fd7c5f901e23a3f19fecc54828e9c848539801e86591bd9801b019f84f")
        );
        assert_eq!(
            namehash("addr.reverse"),
            node("0x91d1777781884d03a6757a803996e38de2a42967fb37eeaca72729271025a9e2")
        );
    }

    #[test]
    fn test_subnode_matches_namehash() {
        let parent = namehash("mytld");
        assert_eq!(subnode(&parent, &labelhash("alice")), namehash("alice.mytld"));
    }

    #[test]
    fn test_reverse_node_uses_lowercase_hex() {
        let addr: Address = "0x00000000000C2E074eC69A0dFb2997BA6C7d2e1e".parse().unwrap();
        assert_eq!(
            reverse_node(&addr),
            namehash("00000000000c2e074ec69a0dfb2997ba6c7d2e1e.addr.reverse")
        );
    }
}
