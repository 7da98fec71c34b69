//! ENS bootstrap orchestrator
//!
//! Sequences the deployments and ownership transfers that stand up a naming
//! tree from scratch:
//! 1. Bootstrap: registry, admin (root) registrar, resolver, root handover
//! 2. TLD: claim under the root, point at the resolver, hand to a new registrar
//! 3. Reverse: the `reverse` TLD plus an `addr.reverse` reverse registrar
//! 4. Domain: same as a TLD, one level down under a claimed domain
//!
//! Steps run strictly in order. Every ledger-affecting step goes through the
//! retry executor; a step failing twice aborts the operation and leaves the
//! ledger and the domain tree as far as they got.

use std::collections::BTreeMap;

use ens_core::namehash::ADDR_REVERSE;
use ens_core::{
    labelhash, Address, BuilderConfig, DomainName, EnsError, Environment, Identity, Node, Result,
};
use ledger_client::{
    deploy_contract, ArtifactSet, ConstructorArgs, ContractCall, ContractHandle, LedgerClient,
    Receipt, TransactionRequest,
};
use serde::Serialize;

use crate::domain_tree::{DomainTree, Registrar, RegistrarKind};
use crate::retry::RetryExecutor;

/// Contracts wired by a completed bootstrap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CoreContracts {
    pub registry: ContractHandle,
    pub resolver: ContractHandle,
    pub admin_registrar: Registrar,
}

/// Mutable state of one bootstrap run
#[derive(Debug, Clone, Default)]
pub struct DeploymentContext {
    core: Option<CoreContracts>,
    domains: DomainTree,
}

impl DeploymentContext {
    pub fn core(&self) -> Option<&CoreContracts> {
        self.core.as_ref()
    }

    pub fn domains(&self) -> &DomainTree {
        &self.domains
    }
}

/// Snapshot of what a run has deployed, for reporting
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentSummary {
    pub environment: Environment,
    pub deployer: Address,
    pub registry: Option<Address>,
    pub resolver: Option<Address>,
    pub admin_registrar: Option<Address>,
    pub registrars: BTreeMap<String, Registrar>,
}

/// Stands up registry, resolver and registrar tree on a ledger
pub struct EnsBuilder<C> {
    client: C,
    deployer: Identity,
    config: BuilderConfig,
    artifacts: ArtifactSet,
    executor: RetryExecutor,
    context: DeploymentContext,
}

impl<C: LedgerClient> EnsBuilder<C> {
    pub fn new(client: C, deployer: Identity) -> Self {
        let config = BuilderConfig::default();
        Self {
            executor: RetryExecutor::new(config.attempt_timeout()),
            client,
            deployer,
            config,
            artifacts: ArtifactSet::default(),
            context: DeploymentContext::default(),
        }
    }

    pub fn with_config(client: C, deployer: Identity, config: BuilderConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            executor: RetryExecutor::new(config.attempt_timeout()),
            config,
            ..Self::new(client, deployer)
        })
    }

    /// Use compiled contract code instead of the kind-only default set
    pub fn with_artifacts(mut self, artifacts: ArtifactSet) -> Self {
        self.artifacts = artifacts;
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn deployer(&self) -> &Identity {
        &self.deployer
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    pub fn context(&self) -> &DeploymentContext {
        &self.context
    }

    pub fn domains(&self) -> &DomainTree {
        &self.context.domains
    }

    pub fn registry(&self) -> Option<ContractHandle> {
        self.context.core.map(|c| c.registry)
    }

    pub fn resolver(&self) -> Option<ContractHandle> {
        self.context.core.map(|c| c.resolver)
    }

    pub fn admin_registrar(&self) -> Option<Registrar> {
        self.context.core.map(|c| c.admin_registrar)
    }

    /// Registrar recorded for `domain`
    pub fn registrar(&self, domain: &str) -> Result<Registrar> {
        let domain = DomainName::parse(domain)?;
        self.context.domains.get(&domain).copied()
    }

    pub fn summary(&self) -> DeploymentSummary {
        DeploymentSummary {
            environment: self.config.environment,
            deployer: self.deployer.address,
            registry: self.registry().map(|h| h.address),
            resolver: self.resolver().map(|h| h.address),
            admin_registrar: self.admin_registrar().map(|r| r.address),
            registrars: self
                .context
                .domains
                .iter()
                .map(|(domain, registrar)| (domain.to_string(), *registrar))
                .collect(),
        }
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Deploy registry, admin registrar and resolver, then hand the root node
    /// to the admin registrar.
    ///
    /// Always starts a fresh run: any previous context is discarded first.
    pub async fn bootstrap(&mut self) -> Result<()> {
        self.context = DeploymentContext::default();
        tracing::info!(
            environment = %self.config.environment,
            deployer = %self.deployer,
            "Bootstrapping ENS"
        );

        tracing::info!("Deploying ENS registry");
        let registry = self
            .deploy("deploy ENS registry", ConstructorArgs::EnsRegistry)
            .await?;

        tracing::info!(registry = %registry.address, "Deploying admin registrar");
        let admin = self
            .deploy(
                "deploy admin registrar",
                ConstructorArgs::FifsRegistrar {
                    registry: registry.address,
                    node: Node::ROOT,
                },
            )
            .await?;

        tracing::info!(registry = %registry.address, "Deploying public resolver");
        let resolver = self
            .deploy(
                "deploy public resolver",
                ConstructorArgs::PublicResolver {
                    registry: registry.address,
                },
            )
            .await?;

        tracing::info!(admin_registrar = %admin.address, "Handing root node to admin registrar");
        self.submit(
            "set root owner",
            &self.deployer,
            registry.address,
            ContractCall::SetOwner {
                node: Node::ROOT,
                owner: admin.address,
            },
        )
        .await?;

        self.context.core = Some(CoreContracts {
            registry,
            resolver,
            admin_registrar: Registrar {
                address: admin.address,
                node: Node::ROOT,
                kind: RegistrarKind::Fifs,
            },
        });
        tracing::info!(
            registry = %registry.address,
            resolver = %resolver.address,
            "Bootstrap complete"
        );
        Ok(())
    }

    /// Claim a top-level domain and give it its own registrar
    pub async fn register_tld(&mut self, domain: &str) -> Result<Registrar> {
        let core = self.core("register_tld")?;
        let tld = DomainName::parse(domain)?;
        if !tld.is_top_level() {
            return Err(EnsError::InvalidDomain {
                name: domain.to_string(),
                reason: "expected a top-level domain".to_string(),
            });
        }

        tracing::info!(tld = %tld, node = %tld.node(), "Registering TLD");
        self.delegate(tld, core.admin_registrar, &core).await
    }

    /// Set up `reverse` and `addr.reverse` for address-to-name lookups
    pub async fn register_reverse_registrar(&mut self) -> Result<Registrar> {
        let core = self.core("register_reverse_registrar")?;
        let reverse_tld = self.register_tld("reverse").await?;
        let addr_reverse = DomainName::parse(ADDR_REVERSE)?;

        let handle = self
            .deploy(
                "deploy reverse registrar",
                ConstructorArgs::ReverseRegistrar {
                    registry: core.registry.address,
                    resolver: core.resolver.address,
                },
            )
            .await?;
        let registrar = Registrar {
            address: handle.address,
            node: addr_reverse.node(),
            kind: RegistrarKind::Reverse,
        };
        self.context.domains.insert(addr_reverse, registrar)?;

        tracing::info!(reverse_registrar = %registrar.address, "Registering reverse registrar");
        self.submit(
            "assign addr.reverse to reverse registrar",
            &self.deployer,
            reverse_tld.address,
            ContractCall::Register {
                label: labelhash("addr"),
                owner: registrar.address,
            },
        )
        .await?;

        Ok(registrar)
    }

    /// Claim `label.domain` and give it its own registrar. `domain` must
    /// already be claimed.
    pub async fn register_domain(&mut self, label: &str, domain: &str) -> Result<Registrar> {
        let parent = DomainName::parse(domain)?;
        let parent_registrar = *self.context.domains.get(&parent)?;
        let core = self.core("register_domain")?;
        let name = parent.child(label)?;

        tracing::info!(domain = %name, node = %name.node(), "Registering domain");
        self.delegate(name, parent_registrar, &core).await
    }

    /// Claim `label.domain` for the deployer and point it at `address`
    pub async fn register_address(&self, label: &str, domain: &str, address: Address) -> Result<()> {
        let parent = DomainName::parse(domain)?;
        let parent_registrar = *self.context.domains.get(&parent)?;
        let core = self.core("register_address")?;
        let name = parent.child(label)?;
        let node = name.node();

        tracing::info!(domain = %name, address = %address, "Registering address");
        self.submit(
            &format!("register {}", name),
            &self.deployer,
            parent_registrar.address,
            ContractCall::Register {
                label: name.label_hash(),
                owner: self.deployer.address,
            },
        )
        .await?;
        self.submit(
            &format!("set resolver for {}", name),
            &self.deployer,
            core.registry.address,
            ContractCall::SetResolver {
                node,
                resolver: core.resolver.address,
            },
        )
        .await?;
        self.submit(
            &format!("set address for {}", name),
            &self.deployer,
            core.resolver.address,
            ContractCall::SetAddr {
                node,
                addr: address,
            },
        )
        .await?;
        Ok(())
    }

    /// [`register_address`](Self::register_address) for `wallet`, then set
    /// the wallet's reverse name. The reverse name is claimed as `wallet`,
    /// not as the deployer.
    pub async fn register_address_with_reverse(
        &self,
        label: &str,
        domain: &str,
        wallet: &Identity,
    ) -> Result<()> {
        let reverse = *self
            .context
            .domains
            .get(&DomainName::parse(ADDR_REVERSE)?)?;
        let name = DomainName::parse(domain)?.child(label)?;

        self.register_address(label, domain, wallet.address).await?;

        tracing::info!(domain = %name, wallet = %wallet, "Setting reverse name");
        self.submit(
            &format!("set reverse name {}", name),
            wallet,
            reverse.address,
            ContractCall::SetName {
                name: name.to_string(),
            },
        )
        .await?;
        Ok(())
    }

    /// Full bootstrap: core contracts, `domain` as a TLD, reverse lookup, and
    /// `label.domain`. Returns the registry address.
    pub async fn bootstrap_with(&mut self, label: &str, domain: &str) -> Result<Address> {
        self.bootstrap().await?;
        self.register_tld(domain).await?;
        self.register_reverse_registrar().await?;
        self.register_domain(label, domain).await?;

        let registry = self.core("bootstrap_with")?.registry.address;
        tracing::info!(registry = %registry, domains = self.context.domains.len(), "ENS ready");
        Ok(registry)
    }

    // =========================================================================
    // Internal helpers
    // =========================================================================

    fn core(&self, operation: &'static str) -> Result<CoreContracts> {
        self.context
            .core
            .ok_or(EnsError::NotBootstrapped { operation })
    }

    /// Claim `name` through `parent`, point it at the shared resolver, then
    /// hand it to a freshly deployed registrar recorded in the tree.
    async fn delegate(
        &mut self,
        name: DomainName,
        parent: Registrar,
        core: &CoreContracts,
    ) -> Result<Registrar> {
        let node = name.node();

        self.submit(
            &format!("register {}", name),
            &self.deployer,
            parent.address,
            ContractCall::Register {
                label: name.label_hash(),
                owner: self.deployer.address,
            },
        )
        .await?;

        self.submit(
            &format!("set resolver for {}", name),
            &self.deployer,
            core.registry.address,
            ContractCall::SetResolver {
                node,
                resolver: core.resolver.address,
            },
        )
        .await?;

        let handle = self
            .deploy(
                &format!("deploy registrar for {}", name),
                ConstructorArgs::FifsRegistrar {
                    registry: core.registry.address,
                    node,
                },
            )
            .await?;
        let registrar = Registrar {
            address: handle.address,
            node,
            kind: RegistrarKind::Fifs,
        };
        self.context.domains.insert(name.clone(), registrar)?;

        self.submit(
            &format!("transfer {} to its registrar", name),
            &self.deployer,
            core.registry.address,
            ContractCall::SetOwner {
                node,
                owner: registrar.address,
            },
        )
        .await?;

        tracing::info!(domain = %name, registrar = %registrar.address, "Domain delegated");
        Ok(registrar)
    }

    async fn deploy(&self, step: &str, args: ConstructorArgs) -> Result<ContractHandle> {
        let artifact = self
            .artifacts
            .get(args.kind())
            .map_err(|e| EnsError::Config(e.to_string()))?;
        let client = &self.client;
        let from = &self.deployer;
        let gas = self.config.deploy_gas;

        self.executor
            .deploy_confirm(step, move || {
                deploy_contract(client, from, artifact, args.clone(), gas)
            })
            .await
    }

    async fn submit(
        &self,
        step: &str,
        from: &Identity,
        to: Address,
        call: ContractCall,
    ) -> Result<Receipt> {
        let request = TransactionRequest::call(to, call, self.config.call_gas);
        self.executor
            .submit_confirm(step, &self.client, from, request)
            .await
    }
}
