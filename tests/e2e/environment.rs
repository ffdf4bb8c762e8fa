//! Escrow end-to-end test environment
//!
//! The node and the wallet are replaced by in-process mocks so every case runs the full
//! fetch, compose, sign, submit and record flow without network access.

use super::*;
use algo_escrow::{
    config::ContractConfig,
    error::SignerError,
    escrow::EscrowClient,
    node::{
        Application, ApplicationParams, LedgerApi, NodeError, NodeStatus, PendingTransactionInfo,
        RawStateEntry, RawTealValue, TransactionParams, api::Result as NodeResult,
    },
    rpc::{EscrowApiServer, EscrowRpc},
    signers::{WalletConnection, WalletSigner},
    storage::{EscrowStorage, StorageApi},
    transactions::TransactionGroup,
    types::{
        Address, AppId, CLIENT_ADDR_KEY, ESCROW_AMOUNT_KEY, EscrowRecord, FREELANCER_ADDR_KEY,
        STATUS_KEY, StateEntry, TealValue, TxId,
    },
};
use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use jsonrpsee::{
    http_client::{HttpClient, HttpClientBuilder},
    server::{Server, ServerHandle},
};
use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
};

/// Id the mock node assigns to every submission.
pub const SUBMITTED_TX_ID: TxId = TxId([0x7a; 32]);

/// Node calls recorded by [`MockLedger`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerCall {
    Application,
    TransactionParams,
    Status,
    StatusAfterRound,
    PendingTransaction,
    Send,
}

/// How the mock node treats submitted transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    /// Confirmed in the round after submission.
    Confirm,
    /// Stays pending forever.
    Never,
    /// Dropped from the pool with [`LOGIC_ERROR`].
    PoolError,
}

/// In-process ledger node.
#[derive(Debug)]
pub struct MockLedger {
    round: AtomicU64,
    applications: Mutex<HashMap<u64, Option<Vec<RawStateEntry>>>>,
    calls: Mutex<Vec<LedgerCall>>,
    submitted: Mutex<Vec<Vec<u8>>>,
    confirmation: Mutex<Confirmation>,
    send_rejection: Mutex<Option<String>>,
}

impl MockLedger {
    pub fn new(round: u64) -> Self {
        Self {
            round: AtomicU64::new(round),
            applications: Default::default(),
            calls: Default::default(),
            submitted: Default::default(),
            confirmation: Mutex::new(Confirmation::Confirm),
            send_rejection: Default::default(),
        }
    }

    /// Creates or replaces an application. `None` state mimics an application without global
    /// state.
    pub fn deploy(&self, app_id: u64, state: Option<&[StateEntry]>) {
        let raw = state.map(|entries| entries.iter().map(raw_entry).collect());
        self.applications.lock().unwrap().insert(app_id, raw);
    }

    /// Stores an already encoded entry, bypassing [`raw_entry`].
    pub fn push_raw_entry(&self, app_id: u64, entry: RawStateEntry) {
        self.applications
            .lock()
            .unwrap()
            .entry(app_id)
            .or_default()
            .get_or_insert_with(Vec::new)
            .push(entry);
    }

    pub fn set_confirmation(&self, confirmation: Confirmation) {
        *self.confirmation.lock().unwrap() = confirmation;
    }

    pub fn reject_submissions(&self, reason: &str) {
        *self.send_rejection.lock().unwrap() = Some(reason.to_string());
    }

    pub fn calls(&self) -> Vec<LedgerCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, call: LedgerCall) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| **c == call).count()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// Concatenated signed bytes of every submission.
    pub fn submitted(&self) -> Vec<Vec<u8>> {
        self.submitted.lock().unwrap().clone()
    }

    pub fn round(&self) -> u64 {
        self.round.load(Ordering::SeqCst)
    }

    fn record(&self, call: LedgerCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl LedgerApi for MockLedger {
    async fn application(&self, app_id: AppId) -> NodeResult<Application> {
        self.record(LedgerCall::Application);
        let applications = self.applications.lock().unwrap();
        let global_state = applications
            .get(&app_id.get())
            .ok_or_else(|| NodeError::NotFound(format!("application {app_id}")))?
            .clone();

        Ok(Application {
            id: app_id.get(),
            params: ApplicationParams { creator: Some(CLIENT.to_string()), global_state },
        })
    }

    async fn transaction_params(&self) -> NodeResult<TransactionParams> {
        self.record(LedgerCall::TransactionParams);
        Ok(TransactionParams {
            consensus_version: "future".to_string(),
            fee: 0,
            genesis_hash: STANDARD.encode([0x48; 32]),
            genesis_id: GENESIS_ID.to_string(),
            last_round: self.round(),
            min_fee: MIN_FEE,
        })
    }

    async fn status(&self) -> NodeResult<NodeStatus> {
        self.record(LedgerCall::Status);
        Ok(NodeStatus { last_round: self.round() })
    }

    async fn status_after_round(&self, round: u64) -> NodeResult<NodeStatus> {
        self.record(LedgerCall::StatusAfterRound);
        let last_round = self.round.fetch_max(round + 1, Ordering::SeqCst).max(round + 1);
        Ok(NodeStatus { last_round })
    }

    async fn pending_transaction(&self, tx_id: &TxId) -> NodeResult<PendingTransactionInfo> {
        self.record(LedgerCall::PendingTransaction);
        if *tx_id != SUBMITTED_TX_ID {
            return Err(NodeError::NotFound(format!("transaction {tx_id}")));
        }

        Ok(match *self.confirmation.lock().unwrap() {
            Confirmation::Confirm => PendingTransactionInfo {
                confirmed_round: Some(self.round() + 1),
                ..Default::default()
            },
            Confirmation::Never => PendingTransactionInfo::default(),
            Confirmation::PoolError => PendingTransactionInfo {
                pool_error: LOGIC_ERROR.to_string(),
                ..Default::default()
            },
        })
    }

    async fn send_raw_transactions(&self, signed: Vec<u8>) -> NodeResult<TxId> {
        self.record(LedgerCall::Send);
        if let Some(reason) = self.send_rejection.lock().unwrap().clone() {
            return Err(NodeError::Rejected { reason });
        }
        self.submitted.lock().unwrap().push(signed);
        Ok(SUBMITTED_TX_ID)
    }
}

/// In-process wallet exposing a fixed set of accounts.
#[derive(Debug)]
pub struct MockWallet {
    accounts: Vec<Address>,
    declines: AtomicBool,
    signed: Mutex<Vec<(Address, TransactionGroup)>>,
}

impl MockWallet {
    pub fn new(accounts: Vec<Address>) -> Self {
        Self { accounts, declines: AtomicBool::new(false), signed: Default::default() }
    }

    /// Makes the user decline every following signing request.
    pub fn decline(&self) {
        self.declines.store(true, Ordering::SeqCst);
    }

    /// Groups signed so far, with the account that signed them.
    pub fn signed(&self) -> Vec<(Address, TransactionGroup)> {
        self.signed.lock().unwrap().clone()
    }
}

#[async_trait]
impl WalletSigner for MockWallet {
    async fn connect(&self) -> Result<Vec<Address>, SignerError> {
        Ok(self.accounts.clone())
    }

    async fn reconnect(&self) -> Result<Vec<Address>, SignerError> {
        self.connect().await
    }

    async fn disconnect(&self) -> Result<(), SignerError> {
        Ok(())
    }

    async fn sign_group(
        &self,
        group: &TransactionGroup,
        signer: Address,
    ) -> Result<Vec<Vec<u8>>, SignerError> {
        if self.declines.load(Ordering::SeqCst) {
            return Err(SignerError::UserCancelled);
        }
        self.signed.lock().unwrap().push((signer, group.clone()));

        let encoded = group.encoded().map_err(|err| SignerError::Protocol(err.to_string()))?;
        Ok(encoded.into_iter().map(|tx| [b"SIGNED:".as_slice(), &tx].concat()).collect())
    }
}

/// A running escrow service backed by mocks.
pub struct Environment {
    pub ledger: Arc<MockLedger>,
    pub wallet: Arc<MockWallet>,
    pub connection: WalletConnection,
    pub storage: EscrowStorage,
    pub client: EscrowClient,
    pub rpc: HttpClient,
    server: ServerHandle,
}

impl Environment {
    /// Sets up the environment with the default contract interface.
    pub async fn setup() -> eyre::Result<Self> {
        Self::setup_with(ContractConfig::default()).await
    }

    /// Sets up the environment with `contract`.
    pub async fn setup_with(contract: ContractConfig) -> eyre::Result<Self> {
        let ledger = Arc::new(MockLedger::new(START_ROUND));
        let wallet = Arc::new(MockWallet::new(vec![CLIENT, FREELANCER]));

        let connection = WalletConnection::new(wallet.clone());
        connection.connect().await?;

        let storage = EscrowStorage::in_memory();
        let client = EscrowClient::new(ledger.clone(), storage.clone(), contract);

        let server = Server::builder().build("127.0.0.1:0").await?;
        let addr = server.local_addr()?;
        let server =
            server.start(EscrowRpc::new(client.clone(), Some(connection.clone())).into_rpc());
        let rpc = HttpClientBuilder::default().build(format!("http://{addr}"))?;

        Ok(Self { ledger, wallet, connection, storage, client, rpc, server })
    }

    /// Deploys a funded escrow between [`CLIENT`] and [`FREELANCER`] and registers it in the
    /// document store.
    pub async fn deploy_funded(&self, app_id: u64) -> eyre::Result<AppId> {
        self.deploy_escrow(app_id, &escrow_state(1)).await
    }

    /// Deploys an escrow with `state` and registers it for [`CLIENT`].
    pub async fn deploy_escrow(&self, app_id: u64, state: &[StateEntry]) -> eyre::Result<AppId> {
        let app_id = AppId::new(app_id)?;
        self.ledger.deploy(app_id.get(), Some(state));
        self.storage
            .write_escrow(&EscrowRecord::new(app_id, CLIENT).with_freelancer(FREELANCER))
            .await?;
        Ok(app_id)
    }

    /// Reads the document store record of `app_id`.
    pub async fn record(&self, app_id: AppId) -> eyre::Result<EscrowRecord> {
        self.storage
            .read_escrow(app_id)
            .await?
            .ok_or_else(|| eyre::eyre!("no record for {app_id}"))
    }

    /// Stops the RPC server.
    pub async fn cleanup(self) {
        let _ = self.server.stop();
        self.server.stopped().await;
    }
}

/// Global state of an escrow between [`CLIENT`] and [`FREELANCER`] in `status`.
pub fn escrow_state(status: u64) -> Vec<StateEntry> {
    vec![
        StateEntry::bytes(CLIENT_ADDR_KEY, CLIENT.as_bytes().to_vec()),
        StateEntry::bytes(FREELANCER_ADDR_KEY, FREELANCER.as_bytes().to_vec()),
        StateEntry::uint(STATUS_KEY, status),
        StateEntry::uint(ESCROW_AMOUNT_KEY, ESCROW_AMOUNT),
    ]
}

/// Encodes `entry` the way the node transmits it.
pub fn raw_entry(entry: &StateEntry) -> RawStateEntry {
    let value = match &entry.value {
        TealValue::Bytes(bytes) => RawTealValue { ty: 1, bytes: STANDARD.encode(bytes), uint: 0 },
        TealValue::Uint(uint) => RawTealValue { ty: 2, bytes: String::new(), uint: *uint },
    };
    RawStateEntry { key: STANDARD.encode(&entry.key), value }
}
