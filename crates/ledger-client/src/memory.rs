//! In-memory ledger
//!
//! Executes the registry, registrar and resolver rules the bootstrapper
//! depends on, confirms transactions instantly, and records every call with
//! its sender. Used for dry runs and as the test double for orchestration.
//!
//! Transactions take effect when they are confirmed, not when they are sent.
//! Failures can be injected at either point.

use std::collections::{BTreeSet, HashMap};

use ens_core::namehash::{keccak256, namehash, reverse_node, subnode, ADDR_REVERSE};
use ens_core::{Address, Identity, LedgerError, LedgerResult, Node, TxHash};
use tokio::sync::Mutex;

use crate::client::LedgerClient;
use crate::request::{
    ConstructorArgs, ContractCall, ContractHandle, ContractKind, Payload, Receipt, ReceiptStatus,
    TransactionRequest,
};

/// Registry entry for a node
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Record {
    pub owner: Address,
    pub resolver: Address,
    pub ttl: u64,
}

/// A contract call as it was submitted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRecord {
    pub from: Address,
    pub to: Address,
    pub call: ContractCall,
}

// ─── Contract state ──────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct ResolverRecords {
    addrs: HashMap<Node, Address>,
    names: HashMap<Node, String>,
}

#[derive(Debug)]
enum Contract {
    Registry { records: HashMap<Node, Record> },
    FifsRegistrar { registry: Address, node: Node },
    PublicResolver { registry: Address, records: ResolverRecords },
    ReverseRegistrar { registry: Address, resolver: Address },
}

/// Immutable view of a contract used to dispatch a call
#[derive(Debug, Clone, Copy)]
enum Target {
    Registry,
    FifsRegistrar { registry: Address, node: Node },
    PublicResolver { registry: Address },
    ReverseRegistrar { registry: Address, resolver: Address },
}

impl Contract {
    fn kind(&self) -> ContractKind {
        match self {
            Self::Registry { .. } => ContractKind::EnsRegistry,
            Self::FifsRegistrar { .. } => ContractKind::FifsRegistrar,
            Self::PublicResolver { .. } => ContractKind::PublicResolver,
            Self::ReverseRegistrar { .. } => ContractKind::ReverseRegistrar,
        }
    }

    fn target(&self) -> Target {
        match self {
            Self::Registry { .. } => Target::Registry,
            Self::FifsRegistrar { registry, node } => Target::FifsRegistrar {
                registry: *registry,
                node: *node,
            },
            Self::PublicResolver { registry, .. } => Target::PublicResolver {
                registry: *registry,
            },
            Self::ReverseRegistrar { registry, resolver } => Target::ReverseRegistrar {
                registry: *registry,
                resolver: *resolver,
            },
        }
    }
}

struct Submitted {
    from: Address,
    request: TransactionRequest,
}

#[derive(Default)]
struct LedgerState {
    nonce: u64,
    contracts: HashMap<Address, Contract>,
    mempool: HashMap<TxHash, Submitted>,
    receipts: HashMap<TxHash, Receipt>,
    calls: Vec<CallRecord>,
    deployments: Vec<ContractHandle>,
    sends: usize,
    confirmations: usize,
    /// Indices of sends and confirmations that fail
    failing_sends: BTreeSet<usize>,
    failing_confirmations: BTreeSet<usize>,
}

impl LedgerState {
    fn execute(&mut self, tx: TxHash, submitted: Submitted) -> Result<Option<Address>, String> {
        let Submitted { from, request } = submitted;
        match request.payload {
            Payload::Deploy(deploy) => self.create(tx, from, deploy.args).map(Some),
            Payload::Call(call) => {
                let to = request
                    .to
                    .ok_or_else(|| "call without a target".to_string())?;
                self.call(from, to, call).map(|_| None)
            }
        }
    }

    fn create(&mut self, tx: TxHash, from: Address, args: ConstructorArgs) -> Result<Address, String> {
        let kind = args.kind();
        let contract = match args {
            ConstructorArgs::EnsRegistry => {
                let mut records = HashMap::new();
                records.insert(
                    Node::ROOT,
                    Record {
                        owner: from,
                        ..Record::default()
                    },
                );
                Contract::Registry { records }
            }
            ConstructorArgs::FifsRegistrar { registry, node } => {
                self.expect_kind(&registry, ContractKind::EnsRegistry)?;
                Contract::FifsRegistrar { registry, node }
            }
            ConstructorArgs::PublicResolver { registry } => {
                self.expect_kind(&registry, ContractKind::EnsRegistry)?;
                Contract::PublicResolver {
                    registry,
                    records: ResolverRecords::default(),
                }
            }
            ConstructorArgs::ReverseRegistrar { registry, resolver } => {
                self.expect_kind(&registry, ContractKind::EnsRegistry)?;
                self.expect_kind(&resolver, ContractKind::PublicResolver)?;
                Contract::ReverseRegistrar { registry, resolver }
            }
        };

        let mut seed = b"create".to_vec();
        seed.extend_from_slice(tx.as_bytes());
        let address = Address::from_digest(&keccak256(&seed));

        self.contracts.insert(address, contract);
        self.deployments.push(ContractHandle { address, kind });
        Ok(address)
    }

    fn call(&mut self, from: Address, to: Address, call: ContractCall) -> Result<(), String> {
        let contract = self
            .contracts
            .get(&to)
            .ok_or_else(|| format!("no contract at {}", to))?;
        let kind = contract.kind();

        match (contract.target(), call) {
            (Target::Registry, ContractCall::SetOwner { node, owner }) => {
                self.authorize(&to, &node, &from)?;
                self.record_mut(&to, node)?.owner = owner;
                Ok(())
            }
            (Target::Registry, ContractCall::SetResolver { node, resolver }) => {
                self.authorize(&to, &node, &from)?;
                self.record_mut(&to, node)?.resolver = resolver;
                Ok(())
            }
            (Target::FifsRegistrar { registry, node }, ContractCall::Register { label, owner }) => {
                let child = subnode(&node, &label);
                let current = self.owner_of(&registry, &child);
                if !current.is_zero() && current != from {
                    return Err(format!("{} is already owned by {}", child, current));
                }
                // the registrar assigns the subnode, so it must own its own node
                self.authorize(&registry, &node, &to)?;
                self.record_mut(&registry, child)?.owner = owner;
                Ok(())
            }
            (Target::PublicResolver { registry }, ContractCall::SetAddr { node, addr }) => {
                self.authorize(&registry, &node, &from)?;
                self.resolver_mut(&to)?.addrs.insert(node, addr);
                Ok(())
            }
            (Target::ReverseRegistrar { registry, resolver }, ContractCall::SetName { name }) => {
                self.authorize(&registry, &namehash(ADDR_REVERSE), &to)?;
                self.expect_kind(&resolver, ContractKind::PublicResolver)?;
                let node = reverse_node(&from);
                let record = self.record_mut(&registry, node)?;
                record.owner = from;
                record.resolver = resolver;
                self.resolver_mut(&resolver)?.names.insert(node, name);
                Ok(())
            }
            (_, call) => Err(format!("{} is not supported by {}", call.method(), kind)),
        }
    }

    fn expect_kind(&self, address: &Address, kind: ContractKind) -> Result<(), String> {
        match self.contracts.get(address) {
            Some(contract) if contract.kind() == kind => Ok(()),
            Some(contract) => Err(format!("{} is a {}, not a {}", address, contract.kind(), kind)),
            None => Err(format!("no {} at {}", kind, address)),
        }
    }

    fn owner_of(&self, registry: &Address, node: &Node) -> Address {
        match self.contracts.get(registry) {
            Some(Contract::Registry { records }) => {
                records.get(node).map(|r| r.owner).unwrap_or(Address::ZERO)
            }
            _ => Address::ZERO,
        }
    }

    fn authorize(&self, registry: &Address, node: &Node, caller: &Address) -> Result<(), String> {
        if self.owner_of(registry, node) == *caller {
            Ok(())
        } else {
            Err(format!("{} does not own node {}", caller, node))
        }
    }

    fn record_mut(&mut self, registry: &Address, node: Node) -> Result<&mut Record, String> {
        match self.contracts.get_mut(registry) {
            Some(Contract::Registry { records }) => Ok(records.entry(node).or_default()),
            _ => Err(format!("{} is not a registry", registry)),
        }
    }

    fn resolver_mut(&mut self, resolver: &Address) -> Result<&mut ResolverRecords, String> {
        match self.contracts.get_mut(resolver) {
            Some(Contract::PublicResolver { records, .. }) => Ok(records),
            _ => Err(format!("{} is not a resolver", resolver)),
        }
    }

    fn resolver_records(&self, resolver: &Address) -> Option<&ResolverRecords> {
        match self.contracts.get(resolver) {
            Some(Contract::PublicResolver { records, .. }) => Some(records),
            _ => None,
        }
    }
}

// ─── MemoryLedger ────────────────────────────────────────────────────────────

/// In-memory [`LedgerClient`]
#[derive(Default)]
pub struct MemoryLedger {
    state: Mutex<LedgerState>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject the next `count` submissions before they reach the ledger
    pub async fn fail_next_sends(&self, count: usize) {
        let mut state = self.state.lock().await;
        let next = state.sends;
        state.failing_sends.extend(next..next + count);
    }

    /// Reject the submission `offset` sends from now (0 is the next one)
    pub async fn fail_send_at(&self, offset: usize) {
        let mut state = self.state.lock().await;
        let index = state.sends + offset;
        state.failing_sends.insert(index);
    }

    /// Drop the next `count` submitted transactions at confirmation time
    pub async fn fail_next_confirmations(&self, count: usize) {
        let mut state = self.state.lock().await;
        let next = state.confirmations;
        state.failing_confirmations.extend(next..next + count);
    }

    /// Drop the transaction confirmed `offset` confirmations from now
    /// (0 is the next one)
    pub async fn fail_confirmation_at(&self, offset: usize) {
        let mut state = self.state.lock().await;
        let index = state.confirmations + offset;
        state.failing_confirmations.insert(index);
    }

    /// Number of submissions attempted, including rejected ones
    pub async fn send_count(&self) -> usize {
        self.state.lock().await.sends
    }

    /// Every accepted contract call, in submission order
    pub async fn calls(&self) -> Vec<CallRecord> {
        self.state.lock().await.calls.clone()
    }

    /// Every confirmed deployment, in confirmation order
    pub async fn deployments(&self) -> Vec<ContractHandle> {
        self.state.lock().await.deployments.clone()
    }

    pub async fn contract_kind(&self, address: &Address) -> Option<ContractKind> {
        self.state
            .lock()
            .await
            .contracts
            .get(address)
            .map(Contract::kind)
    }

    /// Node a FIFS registrar claims labels under
    pub async fn registrar_node(&self, registrar: &Address) -> Option<Node> {
        match self.state.lock().await.contracts.get(registrar) {
            Some(Contract::FifsRegistrar { node, .. }) => Some(*node),
            _ => None,
        }
    }

    pub async fn record(&self, registry: &Address, node: &Node) -> Option<Record> {
        match self.state.lock().await.contracts.get(registry) {
            Some(Contract::Registry { records }) => records.get(node).copied(),
            _ => None,
        }
    }

    /// Owner of `node` in `registry`; zero when unowned
    pub async fn owner(&self, registry: &Address, node: &Node) -> Address {
        self.state.lock().await.owner_of(registry, node)
    }

    /// Resolver of `node` in `registry`; zero when unset
    pub async fn resolver(&self, registry: &Address, node: &Node) -> Address {
        self.record(registry, node)
            .await
            .map(|r| r.resolver)
            .unwrap_or(Address::ZERO)
    }

    pub async fn addr(&self, resolver: &Address, node: &Node) -> Option<Address> {
        let state = self.state.lock().await;
        state
            .resolver_records(resolver)
            .and_then(|r| r.addrs.get(node).copied())
    }

    pub async fn name(&self, resolver: &Address, node: &Node) -> Option<String> {
        let state = self.state.lock().await;
        state
            .resolver_records(resolver)
            .and_then(|r| r.names.get(node).cloned())
    }
}

impl LedgerClient for MemoryLedger {
    async fn send_transaction(
        &self,
        from: &Identity,
        request: TransactionRequest,
    ) -> LedgerResult<TxHash> {
        let mut state = self.state.lock().await;
        let index = state.sends;
        state.sends += 1;
        if state.failing_sends.remove(&index) {
            return Err(LedgerError::Rpc {
                message: format!("injected send failure for {}", request.describe()),
            });
        }

        state.nonce += 1;
        let mut seed = from.address.as_bytes().to_vec();
        seed.extend_from_slice(&state.nonce.to_be_bytes());
        let tx = TxHash(keccak256(&seed));

        if let (Some(to), Payload::Call(call)) = (request.to, &request.payload) {
            state.calls.push(CallRecord {
                from: from.address,
                to,
                call: call.clone(),
            });
        }
        state.mempool.insert(
            tx,
            Submitted {
                from: from.address,
                request,
            },
        );
        Ok(tx)
    }

    async fn wait_for_confirmation(&self, tx: &TxHash) -> LedgerResult<Receipt> {
        let mut state = self.state.lock().await;
        let Some(submitted) = state.mempool.remove(tx) else {
            return match state.receipts.get(tx) {
                Some(receipt) if receipt.is_success() => Ok(receipt.clone()),
                Some(_) => Err(LedgerError::Reverted {
                    tx: *tx,
                    reason: "transaction previously reverted".to_string(),
                }),
                None => Err(LedgerError::UnknownTransaction { tx: *tx }),
            };
        };

        let index = state.confirmations;
        state.confirmations += 1;
        if state.failing_confirmations.remove(&index) {
            return Err(LedgerError::Dropped { tx: *tx });
        }

        match state.execute(*tx, submitted) {
            Ok(contract_address) => {
                let receipt = Receipt {
                    tx_hash: *tx,
                    status: ReceiptStatus::Success,
                    contract_address,
                };
                state.receipts.insert(*tx, receipt.clone());
                Ok(receipt)
            }
            Err(reason) => {
                tracing::debug!(tx = %tx, reason = %reason, "Transaction reverted");
                state.receipts.insert(
                    *tx,
                    Receipt {
                        tx_hash: *tx,
                        status: ReceiptStatus::Reverted,
                        contract_address: None,
                    },
                );
                Err(LedgerError::Reverted { tx: *tx, reason })
            }
        }
    }

    async fn transaction_receipt(&self, tx: &TxHash) -> LedgerResult<Option<Receipt>> {
        Ok(self.state.lock().await.receipts.get(tx).cloned())
    }
}
