//! # Submitter Module
//!
//! The transaction submission pipeline. `TxSubmitter` turns
//! build → sign → persist → submit into one atomic unit per call on a
//! strictly serialized queue, so no two transactions race the signer for the
//! same account sequence number, and hands each submission to the finality
//! tracker for resolution.
//!
//! One submitter exists per signing address; `SubmitterRegistry` enforces the
//! get-or-create identity.

use dashmap::DashMap;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::ledger::LedgerClient;
use crate::models::{
    PreparedTransaction, SubmitterError, TransactionOutcome, TransactionRequest,
};
use crate::store::Store;
use crate::transaction::{Transaction, TransactionFactory};

mod pending;
mod tracker;

use pending::{CompletionHandle, FinalityResult, PendingEntry, PendingTransactions};
use tracker::FinalityTracker;

/// Identity and signing material for one submitter.
#[derive(Clone)]
pub struct SubmitterConfig {
    /// The signing address whose account sequence this submitter serializes.
    pub address: String,
    /// Secret passed through to the ledger client's signer. Never stored
    /// beyond this configuration.
    pub secret: String,
}

impl fmt::Debug for SubmitterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubmitterConfig")
            .field("address", &self.address)
            .field("secret", &"<redacted>")
            .finish()
    }
}

struct SubmitJob {
    request: TransactionRequest,
    respond: oneshot::Sender<Result<oneshot::Receiver<FinalityResult>, SubmitterError>>,
}

/// Serialized submission pipeline for one signing address.
///
/// Submissions are processed strictly in enqueue order; a transaction's
/// signing and submission never begin before the previous transaction's
/// submission step completed, even though finality may resolve out of order.
///
/// Known liveness gap: if the ledger client stays disconnected across many
/// ledger-closed cycles, pending transactions are not resolved until
/// connectivity (and with it the event stream) returns. No retry or backoff
/// is applied here; retrying a failed submission is the caller's decision.
pub struct TxSubmitter<C: LedgerClient> {
    address: String,
    client: Arc<C>,
    jobs: mpsc::UnboundedSender<SubmitJob>,
    connect_lock: tokio::sync::Mutex<()>,
    pending: Arc<Mutex<PendingTransactions>>,
    worker_handle: JoinHandle<()>,
    tracker_handle: JoinHandle<()>,
}

impl<C: LedgerClient + 'static> TxSubmitter<C> {
    /// Creates a submitter and spawns its pipeline worker and finality
    /// tracker. `fallback_client` must point at a full-history node; it is
    /// only connected while a fallback query runs.
    pub fn new(
        config: SubmitterConfig,
        client: Arc<C>,
        fallback_client: Arc<C>,
        store: Arc<dyn Store>,
    ) -> Arc<Self> {
        let factory = TransactionFactory::new(store);
        let pending = Arc::new(Mutex::new(PendingTransactions::default()));

        let events = client.events();
        let tracker_handle =
            FinalityTracker::spawn(client.clone(), fallback_client, pending.clone(), events);

        let (jobs, job_queue) = mpsc::unbounded_channel();
        let worker = SubmissionWorker {
            address: config.address.clone(),
            secret: config.secret,
            client: client.clone(),
            factory,
            pending: pending.clone(),
        };
        let worker_handle = tokio::spawn(worker.run(job_queue));

        Arc::new(Self {
            address: config.address,
            client,
            jobs,
            connect_lock: tokio::sync::Mutex::new(()),
            pending,
            worker_handle,
            tracker_handle,
        })
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Number of transactions currently awaiting finality.
    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    /// Submits one transaction and awaits its finality.
    ///
    /// The call resolves once the ledger reports the transaction validated,
    /// or rejects once it is known never to validate (malformed submission,
    /// validated with a non-success code, or validity window passed with no
    /// trace on the ledger).
    pub async fn submit(
        &self,
        request: TransactionRequest,
    ) -> Result<TransactionOutcome, SubmitterError> {
        self.ensure_connected().await;

        let (respond, response) = oneshot::channel();
        self.jobs
            .send(SubmitJob { request, respond })
            .map_err(|_| SubmitterError::PipelineClosed)?;

        let finality = response
            .await
            .map_err(|_| SubmitterError::PipelineClosed)??;
        finality.await.map_err(|_| SubmitterError::PipelineClosed)?
    }

    /// Connects and subscribes the ledger client if necessary. Concurrent
    /// callers are deduplicated behind one lock so a burst of submissions
    /// cannot trigger a reconnect storm.
    ///
    /// A failed attempt is logged, not fatal: a later event-driven or
    /// ledger-closed check may still resolve things once connectivity
    /// returns.
    async fn ensure_connected(&self) {
        if self.client.is_connected() {
            return;
        }
        let _connecting = self.connect_lock.lock().await;
        if self.client.is_connected() {
            return;
        }
        if let Err(err) = self.client.connect().await {
            warn!(error = %err, "failed to connect ledger client");
            return;
        }
        if let Err(err) = self.client.subscribe_to_account(&self.address).await {
            warn!(
                address = %self.address,
                error = %err,
                "failed to subscribe to account event stream"
            );
        }
    }
}

impl<C: LedgerClient> Drop for TxSubmitter<C> {
    fn drop(&mut self) {
        self.worker_handle.abort();
        self.tracker_handle.abort();
    }
}

/// The single consumer of the submission queue.
struct SubmissionWorker<C: LedgerClient> {
    address: String,
    secret: String,
    client: Arc<C>,
    factory: TransactionFactory,
    pending: Arc<Mutex<PendingTransactions>>,
}

impl<C: LedgerClient + 'static> SubmissionWorker<C> {
    async fn run(self, mut jobs: mpsc::UnboundedReceiver<SubmitJob>) {
        while let Some(job) = jobs.recv().await {
            let kind = job.request.kind();
            let result = self.process(job.request).await;
            if let Err(err) = &result {
                debug!(kind = %kind, error = %err, "submission job failed");
            }
            if job.respond.send(result).is_err() {
                warn!(kind = %kind, "submission result dropped: caller gone");
            }
        }
        debug!("submission queue closed, worker stopping");
    }

    /// One atomic build → sign → persist → submit unit. Runs to completion
    /// before the next job starts, which keeps signing order equal to
    /// enqueue order.
    async fn process(
        &self,
        request: TransactionRequest,
    ) -> Result<oneshot::Receiver<FinalityResult>, SubmitterError> {
        // Lower validity bound: the transaction cannot appear in any ledger
        // closed before this point.
        let min_ledger_version = self.client.ledger_version();

        let prepared = self.prepare(&request).await?;
        let signed = self
            .client
            .sign(&prepared.tx_json, &self.secret)
            .map_err(SubmitterError::from)?;
        debug!(tx_id = %signed.id, kind = %request.kind(), "signed transaction");

        let transaction = self
            .factory
            .create(signed.id.as_str(), &signed.signed_transaction, true)
            .await?;
        if let Err(err) = transaction.save().await {
            self.discard(&transaction).await;
            return Err(err.into());
        }

        let submit_result = match self.client.submit(&signed.signed_transaction).await {
            Ok(result) => result,
            Err(err) => {
                self.discard(&transaction).await;
                return Err(err.into());
            }
        };

        if submit_result.result_code.is_malformed() {
            // A malformed transaction can never achieve finality; waiting
            // would hang the caller forever.
            self.discard(&transaction).await;
            return Err(SubmitterError::MalformedTransaction {
                code: submit_result.result_code,
                message: submit_result.result_message,
            });
        }

        info!(
            tx_id = %signed.id,
            result = %submit_result.result_code,
            max_ledger_version = prepared.instructions.max_ledger_version,
            "transaction submitted, awaiting finality"
        );

        let (completion, finality) = CompletionHandle::channel();
        self.pending.lock().insert(PendingEntry {
            transaction,
            min_ledger_version,
            max_ledger_version: prepared.instructions.max_ledger_version,
            completion,
        });
        Ok(finality)
    }

    async fn prepare(
        &self,
        request: &TransactionRequest,
    ) -> Result<PreparedTransaction, SubmitterError> {
        let prepared = match request {
            TransactionRequest::Payment(params) => {
                self.client.prepare_payment(&self.address, params).await
            }
            TransactionRequest::PaymentChannelCreate(params) => {
                self.client
                    .prepare_channel_create(&self.address, params)
                    .await
            }
            TransactionRequest::PaymentChannelFund(params) => {
                self.client
                    .prepare_channel_fund(&self.address, params)
                    .await
            }
            TransactionRequest::PaymentChannelClaim(params) => {
                self.client
                    .prepare_channel_claim(&self.address, params)
                    .await
            }
        };
        prepared.map_err(SubmitterError::from)
    }

    /// Best-effort removal of a persisted record whose submission failed.
    async fn discard(&self, transaction: &Transaction) {
        if let Err(err) = transaction.delete().await {
            warn!(
                tx_id = %transaction.id(),
                error = %err,
                "failed to delete discarded transaction from store"
            );
        }
    }
}

/// Address-keyed registry of submitters.
///
/// Exactly one pipeline exists per signing address within a process;
/// repeated `get_or_create` calls for the same address return the existing
/// instance, so independently constructed components cannot race on one
/// account's sequence numbers.
pub struct SubmitterRegistry<C: LedgerClient> {
    submitters: DashMap<String, Arc<TxSubmitter<C>>>,
}

impl<C: LedgerClient + 'static> SubmitterRegistry<C> {
    pub fn new() -> Self {
        Self {
            submitters: DashMap::new(),
        }
    }

    /// Returns the submitter for `config.address`, constructing it with the
    /// dependencies produced by `init` on first use.
    pub fn get_or_create<F>(&self, config: SubmitterConfig, init: F) -> Arc<TxSubmitter<C>>
    where
        F: FnOnce() -> (Arc<C>, Arc<C>, Arc<dyn Store>),
    {
        let entry = self
            .submitters
            .entry(config.address.clone())
            .or_insert_with(|| {
                let (client, fallback_client, store) = init();
                TxSubmitter::new(config, client, fallback_client, store)
            });
        entry.value().clone()
    }

    pub fn get(&self, address: &str) -> Option<Arc<TxSubmitter<C>>> {
        self.submitters
            .get(address)
            .map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.submitters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.submitters.is_empty()
    }
}

impl<C: LedgerClient + 'static> Default for SubmitterRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}
