use hats_onboarding::ledger::{LedgerWrite, RegistrationLedger, SqliteLedger};

mod common;
use common::*;

#[tokio::test]
async fn test_record_and_lookup() {
    let db = setup_test_db().await;
    let ledger = SqliteLedger::new(db.pool().clone());

    let address = "0x00000000000000000000000000000000000000ab";
    assert_eq!(ledger.record(ALICE, address).await.unwrap(), LedgerWrite::Recorded);

    let entry = ledger.lookup(ALICE).await.unwrap().unwrap();
    assert_eq!(entry.email, ALICE);
    assert_eq!(entry.address, address);

    assert!(ledger.lookup("bob@org.example").await.unwrap().is_none());
}

#[tokio::test]
async fn test_second_record_for_email_is_refused() {
    let db = setup_test_db().await;
    let ledger = SqliteLedger::new(db.pool().clone());

    let first = "0x00000000000000000000000000000000000000ab";
    let second = "0x00000000000000000000000000000000000000cd";

    assert_eq!(ledger.record(ALICE, first).await.unwrap(), LedgerWrite::Recorded);
    assert_eq!(
        ledger.record(ALICE, second).await.unwrap(),
        LedgerWrite::AlreadyRegistered
    );

    // The original binding is untouched.
    let entry = ledger.lookup(ALICE).await.unwrap().unwrap();
    assert_eq!(entry.address, first);
}

#[tokio::test]
async fn test_list_respects_limit() {
    let db = setup_test_db().await;
    let ledger = SqliteLedger::new(db.pool().clone());

    for i in 0..5 {
        let email = format!("user{}@org.example", i);
        let address = format!("0x{:040x}", i + 1);
        ledger.record(&email, &address).await.unwrap();
    }

    assert_eq!(ledger.list(50).await.unwrap().len(), 5);
    assert_eq!(ledger.list(2).await.unwrap().len(), 2);
}
