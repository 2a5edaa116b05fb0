//! Shared helpers: a scripted ledger client with deterministic signing and
//! configurable validation behavior.

use async_trait::async_trait;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

use xrpl_paychan_submitter::{
    ChannelClaimParams, ChannelCreateParams, ChannelFundParams, ChannelId, InMemoryStore,
    LedgerClient, LedgerError, LedgerEvent, LedgerVersionRange, PaymentChannel, PaymentParams,
    PreparedTransaction, ResultCode, SignedTransaction, SubmitResult, SubmitterConfig,
    TransactionId, TransactionInstructions, TransactionOutcome, TxSubmitter,
};

pub const ADDRESS: &str = "rp7DvVASpusXHMsrTmDSkaCqc2Nqerbc6Z";
pub const SECRET: &str = "sh3gWYq1qEkZrJBFfbEZ468aca1ub";
pub const LEDGER_VERSION: u32 = 8440;
pub const MAX_LEDGER_VERSION: u32 = 8453;

/// A deterministic in-process ledger client.
///
/// Signing derives the transaction hash from the blob contents, submission
/// optionally emits a validated-transaction event (the scripted equivalent of
/// the ledger validating the transaction a moment later), and the recorded
/// state can be inspected by tests.
pub struct FakeLedgerClient {
    connected: AtomicBool,
    ledger_version: AtomicU32,
    events_tx: mpsc::UnboundedSender<LedgerEvent>,
    events_rx: Mutex<Option<mpsc::UnboundedReceiver<LedgerEvent>>>,
    signed_ids: Mutex<HashMap<String, TransactionId>>,
    /// Blobs received by `submit`, in order.
    pub submitted: Mutex<Vec<String>>,
    /// Addresses subscribed to, in order.
    pub subscriptions: Mutex<Vec<String>>,
    /// Engine result emitted with the auto-validation event; `None` leaves
    /// submissions pending (no event fires).
    pub validation_result: Mutex<Option<ResultCode>>,
    /// Outcome served by `get_transaction`; `None` means not found.
    pub lookup_outcome: Mutex<Option<TransactionOutcome>>,
}

impl FakeLedgerClient {
    pub fn new() -> Arc<Self> {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Arc::new(Self {
            connected: AtomicBool::new(false),
            ledger_version: AtomicU32::new(LEDGER_VERSION),
            events_tx,
            events_rx: Mutex::new(Some(events_rx)),
            signed_ids: Mutex::new(HashMap::new()),
            submitted: Mutex::new(Vec::new()),
            subscriptions: Mutex::new(Vec::new()),
            validation_result: Mutex::new(Some(ResultCode::from("tesSUCCESS"))),
            lookup_outcome: Mutex::new(None),
        })
    }

    pub fn emit_ledger_closed(&self, ledger_version: u32) {
        self.ledger_version.store(ledger_version, Ordering::SeqCst);
        self.events_tx
            .send(LedgerEvent::LedgerClosed { ledger_version })
            .ok();
    }

    fn prepared(&self, tx_json: String) -> PreparedTransaction {
        PreparedTransaction {
            tx_json,
            instructions: TransactionInstructions {
                max_ledger_version: MAX_LEDGER_VERSION,
                sequence: Some(70),
                fee: Some("0.000012".to_string()),
            },
        }
    }
}

#[async_trait]
impl LedgerClient for FakeLedgerClient {
    async fn connect(&self) -> Result<(), LedgerError> {
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), LedgerError> {
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn subscribe_to_account(&self, address: &str) -> Result<(), LedgerError> {
        self.subscriptions.lock().push(address.to_string());
        Ok(())
    }

    fn events(&self) -> mpsc::UnboundedReceiver<LedgerEvent> {
        self.events_rx.lock().take().unwrap_or_else(|| {
            let (_closed_tx, closed_rx) = mpsc::unbounded_channel();
            closed_rx
        })
    }

    fn ledger_version(&self) -> u32 {
        self.ledger_version.load(Ordering::SeqCst)
    }

    async fn prepare_payment(
        &self,
        address: &str,
        params: &PaymentParams,
    ) -> Result<PreparedTransaction, LedgerError> {
        Ok(self.prepared(format!(
            "payment:{address}:{}:{}",
            params.destination, params.amount
        )))
    }

    async fn prepare_channel_create(
        &self,
        address: &str,
        params: &ChannelCreateParams,
    ) -> Result<PreparedTransaction, LedgerError> {
        Ok(self.prepared(format!(
            "channel-create:{address}:{}:{}",
            params.destination, params.amount
        )))
    }

    async fn prepare_channel_fund(
        &self,
        address: &str,
        params: &ChannelFundParams,
    ) -> Result<PreparedTransaction, LedgerError> {
        Ok(self.prepared(format!(
            "channel-fund:{address}:{}:{}",
            params.channel, params.amount
        )))
    }

    async fn prepare_channel_claim(
        &self,
        address: &str,
        params: &ChannelClaimParams,
    ) -> Result<PreparedTransaction, LedgerError> {
        Ok(self.prepared(format!("channel-claim:{address}:{}", params.channel)))
    }

    fn sign(&self, tx_json: &str, _secret: &str) -> Result<SignedTransaction, LedgerError> {
        let signed_transaction = format!("signed:{tx_json}");
        let digest = Sha256::digest(signed_transaction.as_bytes());
        let id = TransactionId::new(hex::encode_upper(digest))
            .map_err(|err| LedgerError::Signing(err.to_string()))?;
        self.signed_ids
            .lock()
            .insert(signed_transaction.clone(), id.clone());
        Ok(SignedTransaction {
            id,
            signed_transaction,
        })
    }

    async fn submit(&self, signed_transaction: &str) -> Result<SubmitResult, LedgerError> {
        self.submitted.lock().push(signed_transaction.to_string());
        let id = self
            .signed_ids
            .lock()
            .get(signed_transaction)
            .cloned()
            .ok_or_else(|| LedgerError::Rpc("unknown blob submitted".to_string()))?;

        if let Some(result) = self.validation_result.lock().clone() {
            self.events_tx
                .send(LedgerEvent::TransactionValidated {
                    hash: id,
                    result,
                    ledger_version: self.ledger_version() + 2,
                })
                .ok();
        }
        Ok(SubmitResult {
            result_code: ResultCode::from("tesSUCCESS"),
            result_message: "The transaction was applied.".to_string(),
        })
    }

    async fn get_transaction(
        &self,
        id: &TransactionId,
        _range: LedgerVersionRange,
    ) -> Result<TransactionOutcome, LedgerError> {
        self.lookup_outcome
            .lock()
            .clone()
            .ok_or_else(|| LedgerError::NotFound(format!("transaction {id} not found")))
    }

    async fn get_payment_channel(
        &self,
        channel_id: &ChannelId,
    ) -> Result<PaymentChannel, LedgerError> {
        Err(LedgerError::NotFound(format!(
            "channel {channel_id} not found"
        )))
    }
}

pub fn new_submitter(
    store: Arc<InMemoryStore>,
    client: Arc<FakeLedgerClient>,
    fallback: Arc<FakeLedgerClient>,
) -> Arc<TxSubmitter<FakeLedgerClient>> {
    TxSubmitter::new(
        SubmitterConfig {
            address: ADDRESS.to_string(),
            secret: SECRET.to_string(),
        },
        client,
        fallback,
        store,
    )
}

pub fn payment(amount: u64) -> PaymentParams {
    PaymentParams {
        destination: "rNtnt7i1LXjyHLrmFQMA4F6CxvY57Est5T".to_string(),
        amount,
        destination_tag: None,
    }
}
