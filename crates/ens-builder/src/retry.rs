//! Two-attempt retry policy for ledger-affecting steps
//!
//! Every step gets exactly one retry. There is no backoff: a step that
//! fails twice aborts the enclosing operation. Only a rejection from the
//! ledger client counts as a failure unless an attempt timeout is set.

use std::future::Future;
use std::time::Duration;

use ens_core::{EnsError, Identity, LedgerError, LedgerResult, Result};
use ledger_client::{LedgerClient, PendingTransaction, Receipt, TransactionRequest};

/// Attempts per step, first try included
pub const MAX_ATTEMPTS: usize = 2;

/// Runs ledger-affecting steps under the retry policy
#[derive(Debug, Clone, Copy, Default)]
pub struct RetryExecutor {
    attempt_timeout: Option<Duration>,
}

impl RetryExecutor {
    /// `attempt_timeout` bounds each attempt; an attempt that exceeds it
    /// counts as failed. The abandoned attempt is not cancelled on the
    /// ledger, so its transaction may still be mined alongside the retry.
    pub fn new(attempt_timeout: Option<Duration>) -> Self {
        Self { attempt_timeout }
    }

    pub fn attempt_timeout(&self) -> Option<Duration> {
        self.attempt_timeout
    }

    /// Run `operation` until it succeeds, at most [`MAX_ATTEMPTS`] times.
    ///
    /// `operation` must perform the whole step, confirmation included, so that
    /// a retry repeats the step as a unit.
    pub async fn run<T, F, Fut>(&self, step: &str, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = LedgerResult<T>>,
    {
        let mut attempt = 1;
        loop {
            match self.bounded(operation()).await {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::info!(step, attempt, "Step succeeded on retry");
                    }
                    return Ok(value);
                }
                Err(e) if attempt < MAX_ATTEMPTS => {
                    tracing::warn!(step, attempt, error = %e, "Step failed, sending again");
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!(step, attempt, error = %e, "Step failed, giving up");
                    return Err(EnsError::RetriesExhausted {
                        step: step.to_string(),
                        attempts: attempt,
                        source: e,
                    });
                }
            }
        }
    }

    /// Deploy-confirm: succeeds when `deploy` resolves. The deployment's own
    /// confirmation wait happens inside `deploy`.
    pub async fn deploy_confirm<T, F, Fut>(&self, step: &str, deploy: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = LedgerResult<T>>,
    {
        self.run(step, deploy).await
    }

    /// Submit-confirm: submits `request` as `from` and waits for confirmation.
    /// A failed submission and a failed confirmation are retried alike.
    pub async fn submit_confirm<C: LedgerClient>(
        &self,
        step: &str,
        client: &C,
        from: &Identity,
        request: TransactionRequest,
    ) -> Result<Receipt> {
        let request = &request;
        self.run(step, move || async move {
            PendingTransaction::send(client, from, request.clone())
                .await?
                .wait()
                .await
        })
        .await
    }

    async fn bounded<T>(&self, attempt: impl Future<Output = LedgerResult<T>>) -> LedgerResult<T> {
        let Some(limit) = self.attempt_timeout else {
            return attempt.await;
        };
        tokio::time::timeout(limit, attempt)
            .await
            .map_err(|_| LedgerError::Timeout {
                secs: limit.as_secs(),
            })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use ens_core::{Address, GasOptions, Node};
    use ledger_client::{
        deploy_contract, ArtifactSet, ConstructorArgs, ContractCall, ContractKind, MemoryLedger,
    };

    fn executor() -> RetryExecutor {
        RetryExecutor::default()
    }

    fn rpc_error() -> LedgerError {
        LedgerError::Rpc {
            message: "connection reset".to_string(),
        }
    }

    #[tokio::test]
    async fn test_succeeds_first_time() {
        let calls = AtomicUsize::new(0);
        let counter = &calls;
        let value = executor()
            .run("step", move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(7)
            })
            .await
            .unwrap();
        assert_eq!(value, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fails_once_then_succeeds() {
        let calls = AtomicUsize::new(0);
        let counter = &calls;
        let value = executor()
            .deploy_confirm("deploy", move || async move {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(rpc_error())
                } else {
                    Ok("deployed")
                }
            })
            .await
            .unwrap();
        assert_eq!(value, "deployed");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_always_failing_gives_up_after_two_attempts() {
        let calls = AtomicUsize::new(0);
        let counter = &calls;
        let err = executor()
            .run("set owner", move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(rpc_error())
            })
            .await
            .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        match err {
            EnsError::RetriesExhausted {
                step,
                attempts,
                source,
            } => {
                assert_eq!(step, "set owner");
                assert_eq!(attempts, MAX_ATTEMPTS);
                assert_eq!(source, rpc_error());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_slow_attempt_times_out_and_is_retried() {
        let calls = AtomicUsize::new(0);
        let counter = &calls;
        let executor = RetryExecutor::new(Some(Duration::from_millis(20)));
        let value = executor
            .run("slow", move || async move {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                }
                Ok(1)
            })
            .await
            .unwrap();
        assert_eq!(value, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_slow_attempt_is_awaited_without_timeout() {
        let calls = AtomicUsize::new(0);
        let counter = &calls;
        let value = executor()
            .run("slow", move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok(3)
            })
            .await
            .unwrap();
        assert_eq!(value, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    const GAS: GasOptions = GasOptions::new(100_000, 1);

    fn set_name_request() -> TransactionRequest {
        TransactionRequest::call(
            Address::ZERO,
            ContractCall::SetName {
                name: "x".to_string(),
            },
            GAS,
        )
    }

    #[tokio::test]
    async fn test_submit_confirm_retries_failed_confirmation() {
        let ledger = MemoryLedger::new();
        let from = Identity::derived("deployer");
        let new_owner = Identity::derived("new owner").address;
        let registry = deploy_contract(
            &ledger,
            &from,
            ArtifactSet::default()
                .get(ContractKind::EnsRegistry)
                .unwrap(),
            ConstructorArgs::EnsRegistry,
            GAS,
        )
        .await
        .unwrap();

        ledger.fail_next_confirmations(1).await;
        let request = TransactionRequest::call(
            registry.address,
            ContractCall::SetOwner {
                node: Node::ROOT,
                owner: new_owner,
            },
            GAS,
        );
        let receipt = executor()
            .submit_confirm("set root owner", &ledger, &from, request)
            .await
            .unwrap();

        assert!(receipt.is_success());
        // one deployment plus two submissions of the same call
        assert_eq!(ledger.send_count().await, 3);
        assert_eq!(ledger.owner(&registry.address, &Node::ROOT).await, new_owner);
    }

    #[tokio::test]
    async fn test_submit_confirm_exhausts_on_repeated_send_failure() {
        let ledger = MemoryLedger::new();
        let from = Identity::derived("deployer");
        ledger.fail_next_sends(2).await;

        let err = executor()
            .submit_confirm("set name", &ledger, &from, set_name_request())
            .await
            .unwrap_err();
        assert_eq!(ledger.send_count().await, 2);
        assert!(matches!(
            err,
            EnsError::RetriesExhausted {
                source: LedgerError::Rpc { .. },
                ..
            }
        ));
        assert!(ledger.calls().await.is_empty());
    }
}
