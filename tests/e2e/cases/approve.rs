use crate::*;
use algo_escrow::{
    config::ContractConfig,
    constants::{DEFAULT_APPROVE_PAYMENT, DEFAULT_CONFIRMATION_ROUNDS, DEFAULT_VALIDITY_WINDOW},
    error::{ErrorKind, EscrowError, TransitionError},
    types::{
        EscrowAction, EscrowStatus, FREELANCER_ADDR_KEY, RecordStatus, TransactionKind,
    },
};

#[tokio::test(flavor = "multi_thread")]
async fn approve_funded_escrow() -> eyre::Result<()> {
    let env = Environment::setup().await?;
    let app_id = env.deploy_funded(ESCROW_APP_ID).await?;

    let submitted = env.client.execute(EscrowAction::Approve, app_id, &env.connection).await?;
    assert_eq!(submitted.tx_id, SUBMITTED_TX_ID);
    assert_eq!(submitted.confirmed_round, START_ROUND + 1);
    assert_eq!(submitted.record_status, Some(RecordStatus::Completed));
    assert_eq!(env.record(app_id).await?.status, RecordStatus::Completed);

    let signed = env.wallet.signed();
    let [(signer, group)] = signed.as_slice() else { panic!("expected one signing request") };
    assert_eq!(*signer, CLIENT);

    let [payment, call] = group.transactions() else { panic!("expected payment and call") };
    let group_id = group.group_id().expect("grouped");
    for tx in [payment, call] {
        assert_eq!(tx.sender, CLIENT);
        assert_eq!(tx.group, Some(group_id));
        assert_eq!(tx.first_valid, START_ROUND);
        assert_eq!(tx.last_valid, START_ROUND + DEFAULT_VALIDITY_WINDOW);
        assert_eq!(tx.genesis_id, GENESIS_ID);
    }

    assert_eq!(
        payment.kind,
        TransactionKind::Payment { receiver: app_id.address(), amount: DEFAULT_APPROVE_PAYMENT }
    );
    assert_eq!(payment.fee, MIN_FEE);

    let TransactionKind::ApplicationCall { app_id: called, args, accounts, .. } = &call.kind else {
        panic!("expected application call");
    };
    assert_eq!(*called, app_id);
    assert_eq!(args, &[vec![0x12_u8, 0x85, 0xf0, 0x67]]);
    assert_eq!(accounts, &[FREELANCER]);
    // one inner payout
    assert_eq!(call.fee, 2 * MIN_FEE);

    // the node received both signed members, in group order
    let expected: Vec<u8> = group
        .encoded()?
        .into_iter()
        .flat_map(|tx| [b"SIGNED:".to_vec(), tx].concat())
        .collect();
    assert_eq!(env.ledger.submitted(), [expected]);

    env.cleanup().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn approve_requires_funded_escrow() -> eyre::Result<()> {
    let env = Environment::setup().await?;
    let app_id = env.deploy_escrow(ESCROW_APP_ID, &escrow_state(0)).await?;

    let err = env.client.execute(EscrowAction::Approve, app_id, &env.connection).await.unwrap_err();
    assert!(matches!(
        err,
        EscrowError::InvalidStateTransition(TransitionError::WrongStatus {
            current: EscrowStatus::Initialized,
            required: EscrowStatus::Funded,
            ..
        })
    ));
    assert!(err.to_string().contains("Funded"));

    // rejected before building the group
    assert_eq!(env.ledger.count(LedgerCall::TransactionParams), 0);
    assert_eq!(env.ledger.count(LedgerCall::Send), 0);
    assert!(env.wallet.signed().is_empty());
    assert_eq!(env.record(app_id).await?.status, RecordStatus::Open);

    env.cleanup().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn only_client_can_approve() -> eyre::Result<()> {
    let env = Environment::setup().await?;
    let app_id = env.deploy_funded(ESCROW_APP_ID).await?;

    let err = env
        .client
        .execute_as(EscrowAction::Approve, app_id, FREELANCER, &env.connection)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EscrowError::InvalidStateTransition(TransitionError::NotClient { actor: FREELANCER, .. })
    ));
    assert_eq!(env.ledger.calls(), [LedgerCall::Application]);
    assert!(env.wallet.signed().is_empty());

    env.cleanup().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn approve_without_freelancer() -> eyre::Result<()> {
    let env = Environment::setup().await?;
    let mut state = escrow_state(1);
    state.retain(|entry| entry.key != FREELANCER_ADDR_KEY);
    let app_id = env.deploy_escrow(ESCROW_APP_ID, &state).await?;

    let submitted = env.client.execute(EscrowAction::Approve, app_id, &env.connection).await?;
    assert_eq!(submitted.record_status, Some(RecordStatus::Completed));

    let signed = env.wallet.signed();
    let [(_, group)] = signed.as_slice() else { panic!("expected one signing request") };
    let [payment, call] = group.transactions() else { panic!("expected payment and call") };
    assert_eq!(payment.kind.type_name(), "pay");
    let TransactionKind::ApplicationCall { accounts, .. } = &call.kind else {
        panic!("expected an application call")
    };
    assert!(accounts.is_empty());

    env.cleanup().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn declined_signing_submits_nothing() -> eyre::Result<()> {
    let env = Environment::setup().await?;
    let app_id = env.deploy_funded(ESCROW_APP_ID).await?;
    env.wallet.decline();

    let err = env.client.execute(EscrowAction::Approve, app_id, &env.connection).await.unwrap_err();
    assert!(matches!(err, EscrowError::UserCancelled));
    assert_eq!(err.kind(), ErrorKind::UserCancelled);
    assert_eq!(env.ledger.count(LedgerCall::Send), 0);
    assert_eq!(env.record(app_id).await?.status, RecordStatus::Open);

    env.cleanup().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn unconfirmed_approval_times_out() -> eyre::Result<()> {
    let env = Environment::setup().await?;
    let app_id = env.deploy_funded(ESCROW_APP_ID).await?;
    env.ledger.set_confirmation(Confirmation::Never);

    let err = env.client.execute(EscrowAction::Approve, app_id, &env.connection).await.unwrap_err();
    assert!(matches!(
        err,
        EscrowError::ConfirmationTimeout { tx_id: SUBMITTED_TX_ID, rounds: DEFAULT_CONFIRMATION_ROUNDS }
    ));
    assert!(err.is_retryable());
    assert_eq!(
        env.ledger.count(LedgerCall::StatusAfterRound) as u64,
        DEFAULT_CONFIRMATION_ROUNDS
    );

    // the store only follows confirmed outcomes
    assert_eq!(env.record(app_id).await?.status, RecordStatus::Open);

    env.cleanup().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn rejected_submission() -> eyre::Result<()> {
    let env = Environment::setup().await?;
    let app_id = env.deploy_funded(ESCROW_APP_ID).await?;
    env.ledger.reject_submissions(LOGIC_ERROR);

    let err = env.client.execute(EscrowAction::Approve, app_id, &env.connection).await.unwrap_err();
    assert!(matches!(&err, EscrowError::ContractRejected(reason) if reason == LOGIC_ERROR));
    assert!(!err.is_retryable());
    assert_eq!(env.ledger.count(LedgerCall::PendingTransaction), 0);
    assert_eq!(env.record(app_id).await?.status, RecordStatus::Open);

    env.cleanup().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn dropped_from_pool() -> eyre::Result<()> {
    let env = Environment::setup().await?;
    let app_id = env.deploy_funded(ESCROW_APP_ID).await?;
    env.ledger.set_confirmation(Confirmation::PoolError);

    let err = env.client.execute(EscrowAction::Approve, app_id, &env.connection).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ContractRejected);
    assert!(err.to_string().contains("logic eval error"));
    assert_eq!(env.record(app_id).await?.status, RecordStatus::Open);

    env.cleanup().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn approve_without_payment_argument() -> eyre::Result<()> {
    let contract =
        ContractConfig { approve_method: "approve_work()void".parse()?, ..Default::default() };
    let env = Environment::setup_with(contract).await?;
    let app_id = env.deploy_funded(ESCROW_APP_ID).await?;

    env.client.execute(EscrowAction::Approve, app_id, &env.connection).await?;

    let signed = env.wallet.signed();
    let group = &signed[0].1;
    assert_eq!(group.len(), 1);
    assert_eq!(group.group_id(), None);
    assert!(matches!(
        &group.transactions()[0].kind,
        TransactionKind::ApplicationCall { accounts, .. } if accounts == &[FREELANCER]
    ));

    env.cleanup().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn execute_acts_as_active_account() -> eyre::Result<()> {
    let env = Environment::setup().await?;
    let app_id = env.deploy_funded(ESCROW_APP_ID).await?;

    env.connection.disconnect().await?;
    assert!(!env.connection.is_connected().await);

    // reconnects and acts as the first wallet account
    env.client.execute(EscrowAction::Approve, app_id, &env.connection).await?;
    assert_eq!(env.connection.active_account().await, Some(CLIENT));
    assert_eq!(env.wallet.signed()[0].0, CLIENT);

    env.cleanup().await;
    Ok(())
}
