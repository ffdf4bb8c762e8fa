use crate::*;
use algo_escrow::{
    rpc::EscrowApiClient,
    types::{
        AppId, EscrowAction, EscrowStatus, RecordStatus,
        rpc::{PrepareActionParameters, SubmitActionParameters},
    },
};
use jsonrpsee::{core::client::Error as ClientError, types::error::INVALID_PARAMS_CODE};

/// Asserts that `err` is a call error whose data names `kind`.
fn assert_error_kind(err: ClientError, code: i32, kind: &str) {
    let ClientError::Call(err) = err else { panic!("expected call error, got {err:?}") };
    assert_eq!(err.code(), code);
    let data = err.data().expect("error data").get();
    assert!(data.contains(kind), "{data}");
}

#[tokio::test(flavor = "multi_thread")]
async fn health() -> eyre::Result<()> {
    let env = Environment::setup().await?;
    assert_eq!(env.rpc.health().await?, env!("CARGO_PKG_VERSION"));
    env.cleanup().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn get_escrow() -> eyre::Result<()> {
    let env = Environment::setup().await?;
    let app_id = env.deploy_funded(ESCROW_APP_ID).await?;

    let details = env.rpc.get_escrow(app_id).await?;
    assert_eq!(details.status, EscrowStatus::Funded);
    assert_eq!(details.amount, "5.000000");
    assert_eq!(details.snapshot.client_address, Some(CLIENT));

    let err = env.rpc.get_escrow(AppId::new(1)?).await.unwrap_err();
    assert_error_kind(err, INVALID_PARAMS_CODE, "not_found");

    env.cleanup().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn get_client_escrows() -> eyre::Result<()> {
    let env = Environment::setup().await?;
    env.deploy_funded(ESCROW_APP_ID).await?;
    env.deploy_escrow(ESCROW_APP_ID + 1, &escrow_state(3)).await?;

    let escrows = env.rpc.get_client_escrows(CLIENT).await?;
    let statuses: Vec<_> = escrows.iter().map(|details| details.status).collect();
    assert_eq!(statuses, [EscrowStatus::Funded, EscrowStatus::Cancelled]);

    assert!(env.rpc.get_client_escrows(STRANGER).await?.is_empty());

    env.cleanup().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn prepare_and_submit() -> eyre::Result<()> {
    let env = Environment::setup().await?;
    let app_id = env.deploy_funded(ESCROW_APP_ID).await?;

    let prepared = env
        .rpc
        .prepare_action(PrepareActionParameters {
            app_id,
            action: EscrowAction::Approve,
            sender: CLIENT,
        })
        .await?;
    assert_eq!(prepared.transactions.len(), 2);
    assert_eq!(prepared.tx_ids.len(), 2);
    assert!(prepared.group_id.is_some());
    assert_eq!(prepared.snapshot.status(), EscrowStatus::Funded);

    // signed by an external wallet
    let signed_transactions: Vec<Vec<u8>> = prepared
        .transactions
        .iter()
        .map(|tx| [b"EXTERNAL:".as_slice(), tx].concat())
        .collect();

    let submitted = env
        .rpc
        .submit_action(SubmitActionParameters {
            app_id,
            action: EscrowAction::Approve,
            signed_transactions: signed_transactions.clone(),
        })
        .await?;
    assert_eq!(submitted.tx_id, SUBMITTED_TX_ID);
    assert_eq!(submitted.record_status, Some(RecordStatus::Completed));
    assert_eq!(env.ledger.submitted(), [signed_transactions.concat()]);
    assert!(env.wallet.signed().is_empty());

    env.cleanup().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn prepare_rejects_invalid_transition() -> eyre::Result<()> {
    let env = Environment::setup().await?;
    let app_id = env.deploy_escrow(ESCROW_APP_ID, &escrow_state(0)).await?;

    let err = env
        .rpc
        .prepare_action(PrepareActionParameters {
            app_id,
            action: EscrowAction::Cancel,
            sender: CLIENT,
        })
        .await
        .unwrap_err();
    assert_error_kind(err, INVALID_PARAMS_CODE, "invalid_state_transition");

    env.cleanup().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn submit_requires_transactions() -> eyre::Result<()> {
    let env = Environment::setup().await?;
    let app_id = env.deploy_funded(ESCROW_APP_ID).await?;

    let err = env
        .rpc
        .submit_action(SubmitActionParameters {
            app_id,
            action: EscrowAction::Cancel,
            signed_transactions: vec![],
        })
        .await
        .unwrap_err();
    assert_error_kind(err, INVALID_PARAMS_CODE, "invalid_input");
    assert_eq!(env.ledger.count(LedgerCall::Send), 0);

    env.cleanup().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn execute_with_service_wallet() -> eyre::Result<()> {
    let env = Environment::setup().await?;
    let app_id = env.deploy_funded(ESCROW_APP_ID).await?;

    let submitted = env
        .rpc
        .execute_action(PrepareActionParameters {
            app_id,
            action: EscrowAction::Cancel,
            sender: CLIENT,
        })
        .await?;
    assert_eq!(submitted.record_status, Some(RecordStatus::Cancelled));
    assert_eq!(env.wallet.signed().len(), 1);

    env.wallet.decline();
    env.ledger.deploy(ESCROW_APP_ID, Some(&escrow_state(1)));
    let err = env
        .rpc
        .execute_action(PrepareActionParameters {
            app_id,
            action: EscrowAction::Cancel,
            sender: CLIENT,
        })
        .await
        .unwrap_err();
    assert_error_kind(err, 3, "user_cancelled");

    env.cleanup().await;
    Ok(())
}
