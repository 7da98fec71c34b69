//! Pending transaction handle

use ens_core::{Identity, LedgerResult, TxHash};

use crate::client::LedgerClient;
use crate::request::{Receipt, TransactionRequest};

/// A submitted, not yet confirmed transaction
#[derive(Debug)]
pub struct PendingTransaction<'a, C> {
    client: &'a C,
    hash: TxHash,
}

impl<'a, C: LedgerClient> PendingTransaction<'a, C> {
    /// Submit `request` as `from`
    pub async fn send(
        client: &'a C,
        from: &Identity,
        request: TransactionRequest,
    ) -> LedgerResult<Self> {
        let description = request.describe();
        let hash = client.send_transaction(from, request).await?;
        tracing::debug!(tx = %hash, from = %from.address, "Submitted {}", description);
        Ok(Self { client, hash })
    }

    pub fn hash(&self) -> TxHash {
        self.hash
    }

    /// Wait for the transaction to be confirmed
    pub async fn wait(self) -> LedgerResult<Receipt> {
        let receipt = self.client.wait_for_confirmation(&self.hash).await?;
        tracing::debug!(tx = %self.hash, "Transaction confirmed");
        Ok(receipt)
    }
}
