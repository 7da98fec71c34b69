//! Registrar ownership per claimed domain

use std::collections::BTreeMap;

use ens_core::{Address, DomainName, EnsError, Node, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrarKind {
    /// First-in-first-served registrar claiming labels under its node
    Fifs,
    /// Reverse-lookup registrar owning `addr.reverse`
    Reverse,
}

/// A deployed registrar and the node it is bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registrar {
    pub address: Address,
    pub node: Node,
    pub kind: RegistrarKind,
}

/// Map from claimed domain to its registrar.
///
/// The tree is built top-down: a domain can only be recorded once its parent
/// has a registrar. Top-level domains hang off the root, whose registrar
/// lives outside the tree.
#[derive(Debug, Clone, Default)]
pub struct DomainTree {
    entries: BTreeMap<DomainName, Registrar>,
}

impl DomainTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `registrar` for `domain`, replacing any previous entry.
    ///
    /// Returns the replaced registrar.
    pub fn insert(&mut self, domain: DomainName, registrar: Registrar) -> Result<Option<Registrar>> {
        if let Some(parent) = domain.parent() {
            if !self.entries.contains_key(&parent) {
                return Err(EnsError::ParentNotClaimed {
                    domain: domain.to_string(),
                    parent: parent.to_string(),
                });
            }
        }

        let previous = self.entries.insert(domain.clone(), registrar);
        if let Some(old) = &previous {
            tracing::warn!(
                domain = %domain,
                old = %old.address,
                new = %registrar.address,
                "Replacing registrar for already claimed domain"
            );
        }
        Ok(previous)
    }

    pub fn get(&self, domain: &DomainName) -> Result<&Registrar> {
        self.entries
            .get(domain)
            .ok_or_else(|| EnsError::DomainNotClaimed {
                domain: domain.to_string(),
            })
    }

    pub fn contains(&self, domain: &DomainName) -> bool {
        self.entries.contains_key(domain)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in domain order
    pub fn iter(&self) -> impl Iterator<Item = (&DomainName, &Registrar)> {
        self.entries.iter()
    }

    pub fn domains(&self) -> impl Iterator<Item = &DomainName> {
        self.entries.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ens_core::{namehash, Identity};

    fn name(s: &str) -> DomainName {
        DomainName::parse(s).unwrap()
    }

    fn registrar(seed: &str, domain: &str) -> Registrar {
        Registrar {
            address: Identity::derived(seed).address,
            node: namehash(domain),
            kind: RegistrarKind::Fifs,
        }
    }

    #[test]
    fn test_top_level_needs_no_parent() {
        let mut tree = DomainTree::new();
        assert!(tree.is_empty());
        let previous = tree.insert(name("mytld"), registrar("a", "mytld")).unwrap();
        assert!(previous.is_none());
        assert_eq!(tree.get(&name("mytld")).unwrap().node, namehash("mytld"));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_child_requires_parent() {
        let mut tree = DomainTree::new();
        let err = tree
            .insert(name("alice.mytld"), registrar("a", "alice.mytld"))
            .unwrap_err();
        assert!(matches!(
            err,
            EnsError::ParentNotClaimed { ref domain, ref parent }
                if domain == "alice.mytld" && parent == "mytld"
        ));
        assert!(tree.is_empty());

        tree.insert(name("mytld"), registrar("a", "mytld")).unwrap();
        tree.insert(name("alice.mytld"), registrar("b", "alice.mytld"))
            .unwrap();
        assert!(tree.contains(&name("alice.mytld")));
    }

    #[test]
    fn test_reinsert_overwrites() {
        let mut tree = DomainTree::new();
        let first = registrar("first", "mytld");
        let second = registrar("second", "mytld");
        tree.insert(name("mytld"), first).unwrap();
        let previous = tree.insert(name("MyTLD"), second).unwrap();
        assert_eq!(previous, Some(first));
        assert_eq!(*tree.get(&name("mytld")).unwrap(), second);
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_missing_domain_not_claimed() {
        let tree = DomainTree::new();
        let err = tree.get(&name("nowhere")).unwrap_err();
        assert_eq!(err.error_code(), "domain_not_claimed");
    }

    #[test]
    fn test_domains_sorted() {
        let mut tree = DomainTree::new();
        tree.insert(name("reverse"), registrar("r", "reverse")).unwrap();
        tree.insert(name("mytld"), registrar("m", "mytld")).unwrap();
        tree.insert(name("addr.reverse"), registrar("ar", "addr.reverse"))
            .unwrap();
        let domains: Vec<_> = tree.domains().map(DomainName::as_str).collect();
        assert_eq!(domains, vec!["addr.reverse", "mytld", "reverse"]);
    }
}
