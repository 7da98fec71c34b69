//! Ledger client interface
//!
//! Signing, gas estimation and transport live behind this trait.

use ens_core::{Identity, LedgerResult, TxHash};

use crate::request::{Receipt, TransactionRequest};

/// A client able to submit transactions to a ledger and follow them to confirmation
#[trait_variant::make(LedgerClient: Send)]
pub trait LocalLedgerClient {
    /// Sign `request` as `from` and submit it. Resolves once the ledger has
    /// accepted the transaction, not once it is confirmed.
    async fn send_transaction(
        &self,
        from: &Identity,
        request: TransactionRequest,
    ) -> LedgerResult<TxHash>;

    /// Block until `tx` is confirmed. A reverted or dropped transaction is an error.
    async fn wait_for_confirmation(&self, tx: &TxHash) -> LedgerResult<Receipt>;

    /// Look up the receipt of a mined transaction
    async fn transaction_receipt(&self, tx: &TxHash) -> LedgerResult<Option<Receipt>>;
}
