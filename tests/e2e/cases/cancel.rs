use crate::*;
use algo_escrow::{
    error::{EscrowError, TransitionError},
    storage::StorageApi,
    types::{AppId, EscrowAction, EscrowStatus, RecordStatus, TransactionKind},
};

#[tokio::test(flavor = "multi_thread")]
async fn cancel_funded_escrow() -> eyre::Result<()> {
    let env = Environment::setup().await?;
    let app_id = env.deploy_funded(ESCROW_APP_ID).await?;

    let submitted = env.client.execute(EscrowAction::Cancel, app_id, &env.connection).await?;
    assert_eq!(submitted.record_status, Some(RecordStatus::Cancelled));
    assert_eq!(env.record(app_id).await?.status, RecordStatus::Cancelled);

    let signed = env.wallet.signed();
    let [(_, group)] = signed.as_slice() else { panic!("expected one signing request") };
    let [call] = group.transactions() else { panic!("expected a single call") };
    assert_eq!(group.group_id(), None);
    assert_eq!(call.group, None);
    assert_eq!(call.sender, CLIENT);
    // one inner refund
    assert_eq!(call.fee, 2 * MIN_FEE);
    assert_eq!(
        call.kind,
        TransactionKind::ApplicationCall {
            app_id,
            on_complete: Default::default(),
            args: vec![vec![0xa3, 0xbb, 0xe9, 0xfb]],
            accounts: vec![CLIENT],
        }
    );

    env.cleanup().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn cancel_requires_funded_escrow() -> eyre::Result<()> {
    let env = Environment::setup().await?;

    for (offset, status) in [(0, 0), (1, 2), (2, 3)] {
        let app_id = env.deploy_escrow(ESCROW_APP_ID + offset, &escrow_state(status)).await?;
        let err =
            env.client.execute(EscrowAction::Cancel, app_id, &env.connection).await.unwrap_err();
        assert!(
            matches!(
                err,
                EscrowError::InvalidStateTransition(TransitionError::WrongStatus {
                    required: EscrowStatus::Funded,
                    ..
                })
            ),
            "status {status}: {err}"
        );
    }
    assert_eq!(env.ledger.count(LedgerCall::TransactionParams), 0);

    env.cleanup().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn stale_snapshot_is_not_reused() -> eyre::Result<()> {
    let env = Environment::setup().await?;
    let app_id = env.deploy_funded(ESCROW_APP_ID).await?;
    assert_eq!(env.client.fetch_snapshot(app_id).await?.status(), EscrowStatus::Funded);

    // approved elsewhere in the meantime
    env.ledger.deploy(ESCROW_APP_ID, Some(&escrow_state(2)));

    let err = env.client.execute(EscrowAction::Cancel, app_id, &env.connection).await.unwrap_err();
    assert!(matches!(
        err,
        EscrowError::InvalidStateTransition(TransitionError::WrongStatus {
            current: EscrowStatus::Completed,
            ..
        })
    ));
    assert_eq!(env.ledger.count(LedgerCall::Send), 0);

    env.cleanup().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn unregistered_escrow_still_cancels() -> eyre::Result<()> {
    let env = Environment::setup().await?;
    let app_id = AppId::new(ESCROW_APP_ID)?;
    env.ledger.deploy(ESCROW_APP_ID, Some(&escrow_state(1)));

    // confirmed on-chain, but the store has nothing to update
    let submitted = env.client.execute(EscrowAction::Cancel, app_id, &env.connection).await?;
    assert_eq!(submitted.confirmed_round, START_ROUND + 1);
    assert_eq!(submitted.record_status, None);
    assert!(env.storage.read_escrow(app_id).await?.is_none());

    env.cleanup().await;
    Ok(())
}
