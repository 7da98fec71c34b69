//! Contract deployment helper

use ens_core::{GasOptions, Identity, LedgerError, LedgerResult};

use crate::client::LedgerClient;
use crate::pending::PendingTransaction;
use crate::request::{ConstructorArgs, ContractArtifact, ContractHandle, TransactionRequest};

/// Deploy `artifact` as `from` and wait for the deployment to be confirmed.
///
/// The contract address is read back from the transaction receipt.
pub async fn deploy_contract<C: LedgerClient>(
    client: &C,
    from: &Identity,
    artifact: &ContractArtifact,
    args: ConstructorArgs,
    gas: GasOptions,
) -> LedgerResult<ContractHandle> {
    if args.kind() != artifact.kind {
        return Err(LedgerError::InvalidArtifact {
            name: artifact.kind.artifact_name().to_string(),
            message: format!("constructor arguments are for {}", args.kind()),
        });
    }

    let kind = artifact.kind;
    let request = TransactionRequest::deploy(artifact.clone(), args, gas);
    let pending = PendingTransaction::send(client, from, request).await?;
    let tx = pending.hash();
    pending.wait().await?;

    let receipt = client
        .transaction_receipt(&tx)
        .await?
        .ok_or(LedgerError::MissingReceipt { tx })?;
    let address = receipt
        .contract_address
        .ok_or(LedgerError::MissingContractAddress { tx })?;

    tracing::debug!(contract = %kind, address = %address, tx = %tx, "Contract deployed");
    Ok(ContractHandle { address, kind })
}
