use crate::*;
use algo_escrow::{
    config::ContractConfig,
    error::{ErrorKind, EscrowError},
    escrow::EscrowClient,
    node::{AlgodClient, RawStateEntry, RawTealValue},
    storage::{EscrowStorage, StorageApi},
    types::{AppId, EscrowRecord, EscrowStatus, STATUS_KEY, StateEntry},
};
use std::{sync::Arc, time::Duration};
use url::Url;

#[tokio::test(flavor = "multi_thread")]
async fn fetch_funded_escrow() -> eyre::Result<()> {
    let env = Environment::setup().await?;
    let app_id = env.deploy_funded(ESCROW_APP_ID).await?;

    let snapshot = env.client.fetch_snapshot(app_id).await?;
    assert_eq!(snapshot.application_id, app_id);
    assert_eq!(snapshot.client_address, Some(CLIENT));
    assert_eq!(snapshot.freelancer_address, Some(FREELANCER));
    assert_eq!(snapshot.escrow_amount_micro_units, ESCROW_AMOUNT);
    assert_eq!(snapshot.status(), EscrowStatus::Funded);
    assert!(snapshot.is_native_asset());
    assert!(snapshot.is_client(&CLIENT));
    assert!(!snapshot.is_client(&FREELANCER));

    env.cleanup().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn every_fetch_reads_fresh_state() -> eyre::Result<()> {
    let env = Environment::setup().await?;
    let app_id = env.deploy_funded(ESCROW_APP_ID).await?;
    assert_eq!(env.client.fetch_snapshot(app_id).await?.status(), EscrowStatus::Funded);

    env.ledger.deploy(ESCROW_APP_ID, Some(&escrow_state(2)));
    assert_eq!(env.client.fetch_snapshot(app_id).await?.status(), EscrowStatus::Completed);
    assert_eq!(env.ledger.count(LedgerCall::Application), 2);

    env.cleanup().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_application() -> eyre::Result<()> {
    let env = Environment::setup().await?;

    let err = env.client.fetch_snapshot(AppId::new(42)?).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(err.to_string().contains("42"));

    env.cleanup().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn application_without_state() -> eyre::Result<()> {
    let env = Environment::setup().await?;

    env.ledger.deploy(7, None);
    let err = env.client.fetch_snapshot(AppId::new(7)?).await.unwrap_err();
    assert!(matches!(err, EscrowError::EmptyState(id) if id.get() == 7));

    env.ledger.deploy(8, Some(&[]));
    let err = env.client.fetch_snapshot(AppId::new(8)?).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::EmptyState);

    env.cleanup().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn malformed_entries_are_skipped() -> eyre::Result<()> {
    let env = Environment::setup().await?;
    let app_id = env.deploy_funded(ESCROW_APP_ID).await?;

    env.ledger.push_raw_entry(
        ESCROW_APP_ID,
        RawStateEntry {
            key: "not base64!".to_string(),
            value: RawTealValue { ty: 2, bytes: String::new(), uint: 3 },
        },
    );
    env.ledger.push_raw_entry(ESCROW_APP_ID, raw_entry(&StateEntry::uint("milestones", 4)));

    let snapshot = env.client.fetch_snapshot(app_id).await?;
    assert_eq!(snapshot.status(), EscrowStatus::Funded);
    assert_eq!(snapshot.client_address, Some(CLIENT));

    env.cleanup().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn unrecognized_status_is_unknown() -> eyre::Result<()> {
    let env = Environment::setup().await?;
    let mut state = escrow_state(1);
    state.retain(|entry| entry.key != STATUS_KEY);
    state.push(StateEntry::uint(STATUS_KEY, 9));
    let app_id = env.deploy_escrow(ESCROW_APP_ID, &state).await?;

    let snapshot = env.client.fetch_snapshot(app_id).await?;
    assert_eq!(snapshot.status_code, Some(9));
    assert_eq!(snapshot.status(), EscrowStatus::Unknown);

    env.cleanup().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn unreachable_node_is_retryable() -> eyre::Result<()> {
    let ledger = AlgodClient::with_timeout(
        Url::parse("http://127.0.0.1:1")?,
        None,
        Duration::from_secs(2),
    )?;
    let client =
        EscrowClient::new(Arc::new(ledger), EscrowStorage::in_memory(), ContractConfig::default());

    let err = client.fetch_snapshot(AppId::new(ESCROW_APP_ID)?).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TransientFetch);
    assert!(err.is_retryable());
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn client_escrows_omit_failures() -> eyre::Result<()> {
    let env = Environment::setup().await?;
    let funded = env.deploy_funded(ESCROW_APP_ID).await?;
    let completed = env.deploy_escrow(ESCROW_APP_ID + 1, &escrow_state(2)).await?;

    // registered but never deployed
    env.storage.write_escrow(&EscrowRecord::new(AppId::new(ESCROW_APP_ID + 2)?, CLIENT)).await?;

    let snapshots = env.client.client_snapshots(&CLIENT).await?;
    let ids: Vec<_> = snapshots.iter().map(|s| s.application_id).collect();
    assert_eq!(ids, [funded, completed]);

    assert!(env.client.client_snapshots(&STRANGER).await?.is_empty());

    env.cleanup().await;
    Ok(())
}
