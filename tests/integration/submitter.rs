//! End-to-end submission scenarios against the scripted ledger client.

use std::sync::Arc;
use std::time::Duration;

use xrpl_paychan_submitter::constants::PENDING_TRANSACTIONS_KEY;
use xrpl_paychan_submitter::{
    InMemoryStore, LedgerClient, ResultCode, Store, SubmitterError, TransactionOutcome,
    TransactionRequest,
};

use super::common::{
    new_submitter, payment, FakeLedgerClient, ADDRESS, LEDGER_VERSION, MAX_LEDGER_VERSION,
};

async fn store_is_clean(store: &InMemoryStore) -> bool {
    let index = store
        .get(PENDING_TRANSACTIONS_KEY)
        .await
        .unwrap()
        .unwrap_or_default();
    index.is_empty()
}

#[tokio::test]
async fn submits_payment_to_finality() {
    let client = FakeLedgerClient::new();
    let fallback = FakeLedgerClient::new();
    let store = Arc::new(InMemoryStore::new());
    let submitter = new_submitter(store.clone(), client.clone(), fallback);

    let outcome = submitter
        .submit(TransactionRequest::Payment(payment(1_000_000)))
        .await
        .unwrap();

    assert!(outcome.result.is_success());
    assert_eq!(outcome.ledger_version, Some(LEDGER_VERSION + 2));
    assert_eq!(submitter.pending_count(), 0);
    assert!(store_is_clean(&store).await);

    // The pipeline connected and subscribed to the signing address before
    // submitting.
    assert!(client.is_connected());
    assert_eq!(client.subscriptions.lock().clone(), vec![ADDRESS.to_string()]);
    let submitted = client.submitted.lock().clone();
    assert_eq!(submitted.len(), 1);
    assert!(submitted[0].starts_with("signed:payment:"));
}

#[tokio::test]
async fn failed_validation_rejects_and_cleans_up() {
    let client = FakeLedgerClient::new();
    *client.validation_result.lock() = Some(ResultCode::from("tecUNFUNDED_PAYMENT"));
    let fallback = FakeLedgerClient::new();
    let store = Arc::new(InMemoryStore::new());
    let submitter = new_submitter(store.clone(), client, fallback);

    let err = submitter
        .submit(TransactionRequest::Payment(payment(1_000_000)))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        SubmitterError::TransactionFailed { code } if code.as_str() == "tecUNFUNDED_PAYMENT"
    ));
    assert!(store_is_clean(&store).await);
}

#[tokio::test]
async fn expiry_resolves_through_direct_lookup() {
    let client = FakeLedgerClient::new();
    // The ledger never reports validation...
    *client.validation_result.lock() = None;
    // ...but a direct lookup finds the transaction once the window passed.
    *client.lookup_outcome.lock() = Some(TransactionOutcome {
        result: ResultCode::from("tesSUCCESS"),
        ledger_version: Some(MAX_LEDGER_VERSION - 1),
    });
    let fallback = FakeLedgerClient::new();
    let store = Arc::new(InMemoryStore::new());
    let submitter = new_submitter(store.clone(), client.clone(), fallback);

    let pending_submit = tokio::spawn({
        let submitter = submitter.clone();
        async move {
            submitter
                .submit(TransactionRequest::Payment(payment(1_000_000)))
                .await
        }
    });

    // Wait for the submission to go out, then close ledgers past the window.
    wait_for(|| !client.submitted.lock().is_empty()).await;
    client.emit_ledger_closed(MAX_LEDGER_VERSION);

    let outcome = pending_submit.await.unwrap().unwrap();
    assert!(outcome.result.is_success());
    assert!(store_is_clean(&store).await);
}

#[tokio::test]
async fn duplicate_submission_is_rejected_while_first_is_pending() {
    let client = FakeLedgerClient::new();
    // Leave the first submission pending so its record stays in the store.
    *client.validation_result.lock() = None;
    let fallback = FakeLedgerClient::new();
    let store = Arc::new(InMemoryStore::new());
    let submitter = new_submitter(store.clone(), client.clone(), fallback);

    let first = tokio::spawn({
        let submitter = submitter.clone();
        async move {
            submitter
                .submit(TransactionRequest::Payment(payment(1_000_000)))
                .await
        }
    });
    wait_for(|| !client.submitted.lock().is_empty()).await;
    assert_eq!(submitter.pending_count(), 1);

    // Identical instructions sign to the identical hash.
    let err = submitter
        .submit(TransactionRequest::Payment(payment(1_000_000)))
        .await
        .unwrap_err();
    assert!(matches!(err, SubmitterError::DuplicateTransaction(_)));

    // The first submission is still tracked and its record still persisted.
    assert_eq!(submitter.pending_count(), 1);
    assert!(!store_is_clean(&store).await);
    first.abort();
}

async fn wait_for(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}
