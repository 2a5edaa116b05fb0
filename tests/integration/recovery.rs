//! Crash-recovery scenarios: pending transactions survive a process restart
//! through the store and are rehydrated by the factory.

use std::sync::Arc;
use std::time::Duration;

use xrpl_paychan_submitter::constants::PENDING_TRANSACTIONS_KEY;
use xrpl_paychan_submitter::{
    InMemoryStore, LedgerVersionRange, Store, SubmitterError, Transaction, TransactionFactory,
    TransactionRequest,
};

use xrpl_paychan_submitter::LedgerClient;

use super::common::{new_submitter, payment, FakeLedgerClient, LEDGER_VERSION, MAX_LEDGER_VERSION};

#[tokio::test]
async fn in_flight_submission_survives_restart() {
    let client = FakeLedgerClient::new();
    // The process will "crash" before the ledger reports validation.
    *client.validation_result.lock() = None;
    let fallback = FakeLedgerClient::new();
    let store = Arc::new(InMemoryStore::new());
    let submitter = new_submitter(store.clone(), client.clone(), fallback);

    let in_flight = tokio::spawn({
        let submitter = submitter.clone();
        async move {
            submitter
                .submit(TransactionRequest::Payment(payment(1_000_000)))
                .await
        }
    });
    tokio::time::timeout(Duration::from_secs(5), async {
        while client.submitted.lock().is_empty() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("submission did not go out");

    // Crash: the submitter and its in-memory state disappear; the store
    // survives.
    in_flight.abort();
    drop(submitter);

    let factory = TransactionFactory::new(store.clone());
    let recovered = factory.load_all_pending().await.unwrap();
    assert_eq!(recovered.len(), 1);
    let transaction = &recovered[0];
    assert!(transaction.is_pending());
    assert!(
        transaction.details().starts_with("signed:payment:"),
        "recovered details must be the signed blob, got {:?}",
        transaction.details()
    );

    // The restarted host re-verifies the outcome directly and settles the
    // record.
    let verifying_client = FakeLedgerClient::new();
    *verifying_client.lookup_outcome.lock() = Some(xrpl_paychan_submitter::TransactionOutcome {
        result: xrpl_paychan_submitter::ResultCode::from("tesSUCCESS"),
        ledger_version: Some(MAX_LEDGER_VERSION - 1),
    });
    let outcome = verifying_client
        .get_transaction(
            transaction.id(),
            LedgerVersionRange {
                min_ledger_version: LEDGER_VERSION,
                max_ledger_version: MAX_LEDGER_VERSION,
            },
        )
        .await
        .unwrap();
    assert!(outcome.result.is_success());
    transaction.delete().await.unwrap();

    let empty = TransactionFactory::new(store.clone())
        .load_all_pending()
        .await
        .unwrap();
    assert!(empty.is_empty());
    assert_eq!(
        store
            .get(PENDING_TRANSACTIONS_KEY)
            .await
            .unwrap()
            .unwrap_or_default(),
        ""
    );
}

#[tokio::test]
async fn factory_roundtrip_preserves_index_order() {
    let store = Arc::new(InMemoryStore::new());
    let factory = TransactionFactory::new(store.clone());

    let first = factory
        .create(
            "5DA04B886E113B54189B86372FC653FA2A28ED550C48B2C4D630FC0512688623",
            "blob-one",
            true,
        )
        .await
        .unwrap();
    let second = factory
        .create(
            "8F4F76F739D61BF602C97EFC8502A63F1CF49AC80E45A1CF5D10C8A4DF711D95",
            "blob-two",
            true,
        )
        .await
        .unwrap();
    first.save().await.unwrap();
    second.save().await.unwrap();

    let recovered = TransactionFactory::new(store.clone())
        .load_all_pending()
        .await
        .unwrap();
    let ids: Vec<&str> = recovered.iter().map(|tx| tx.id().as_str()).collect();
    assert_eq!(
        ids,
        vec![
            "5DA04B886E113B54189B86372FC653FA2A28ED550C48B2C4D630FC0512688623",
            "8F4F76F739D61BF602C97EFC8502A63F1CF49AC80E45A1CF5D10C8A4DF711D95",
        ]
    );
    assert!(recovered.iter().all(Transaction::is_pending));

    // Recreating an id that survived in the store is still a duplicate.
    let duplicate = factory
        .create(
            "5DA04B886E113B54189B86372FC653FA2A28ED550C48B2C4D630FC0512688623",
            "blob-three",
            true,
        )
        .await;
    assert!(matches!(
        duplicate,
        Err(SubmitterError::DuplicateTransaction(_))
    ));
}
