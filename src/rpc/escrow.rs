//! # Escrow RPC
//!
//! Implementations of a custom `escrow_` namespace.
//!
//! - `escrow_getEscrow` and `escrow_getClientEscrows` for reading decoded escrow state.
//! - `escrow_prepareAction` for composing unsigned transaction groups an external wallet signs.
//! - `escrow_submitAction` for submitting groups signed elsewhere.
//! - `escrow_executeAction` for signing with the configured wallet and submitting in one call.

use crate::{
    error::{EscrowError, SignerError},
    escrow::EscrowClient,
    signers::WalletConnection,
    types::{
        Address, AppId,
        rpc::{
            EscrowDetails, ExecuteActionParameters, PrepareActionParameters, PreparedAction,
            SubmitActionParameters, SubmittedAction,
        },
    },
};
use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use jsonrpsee::{core::RpcResult, proc_macros::rpc};

/// Escrow `escrow_` RPC namespace.
#[rpc(server, client, namespace = "escrow")]
pub trait EscrowApi {
    /// Checks the health of the service and returns its version.
    #[method(name = "health")]
    async fn health(&self) -> RpcResult<String>;

    /// Reads and decodes the current state of an escrow application.
    #[method(name = "getEscrow")]
    async fn get_escrow(&self, app_id: AppId) -> RpcResult<EscrowDetails>;

    /// Reads the state of every escrow created by `client`.
    ///
    /// Escrows whose state cannot be fetched are omitted.
    #[method(name = "getClientEscrows")]
    async fn get_client_escrows(&self, client: Address) -> RpcResult<Vec<EscrowDetails>>;

    /// Composes the unsigned transaction group performing an action.
    ///
    /// The returned transactions must be signed by the sender and passed to
    /// [`submit_action`](EscrowApiServer::submit_action) in the same order.
    #[method(name = "prepareAction")]
    async fn prepare_action(&self, params: PrepareActionParameters) -> RpcResult<PreparedAction>;

    /// Submits a signed transaction group and waits for its confirmation.
    #[method(name = "submitAction")]
    async fn submit_action(&self, params: SubmitActionParameters) -> RpcResult<SubmittedAction>;

    /// Composes, signs with the configured wallet, and submits an action.
    #[method(name = "executeAction")]
    async fn execute_action(&self, params: ExecuteActionParameters)
    -> RpcResult<SubmittedAction>;
}

/// Escrow `escrow_` RPC module.
#[derive(Debug, Clone)]
pub struct EscrowRpc {
    client: EscrowClient,
    wallet: Option<WalletConnection>,
}

impl EscrowRpc {
    /// Create a new escrow RPC module.
    pub fn new(client: EscrowClient, wallet: Option<WalletConnection>) -> Self {
        Self { client, wallet }
    }
}

#[async_trait]
impl EscrowApiServer for EscrowRpc {
    async fn health(&self) -> RpcResult<String> {
        Ok(env!("CARGO_PKG_VERSION").to_string())
    }

    async fn get_escrow(&self, app_id: AppId) -> RpcResult<EscrowDetails> {
        Ok(self.client.fetch_snapshot(app_id).await?.into())
    }

    async fn get_client_escrows(&self, client: Address) -> RpcResult<Vec<EscrowDetails>> {
        Ok(self.client.client_snapshots(&client).await?.into_iter().map(Into::into).collect())
    }

    async fn prepare_action(
        &self,
        PrepareActionParameters { app_id, action, sender }: PrepareActionParameters,
    ) -> RpcResult<PreparedAction> {
        let snapshot = self.client.fetch_snapshot(app_id).await?;
        let group = self.client.prepare(action, &snapshot, sender).await?;

        Ok(PreparedAction {
            app_id,
            action,
            transactions: group.encoded()?,
            tx_ids: group.tx_ids()?,
            group_id: group.group_id().map(|id| STANDARD.encode(id)),
            snapshot,
        })
    }

    async fn submit_action(
        &self,
        SubmitActionParameters { app_id, action, signed_transactions }: SubmitActionParameters,
    ) -> RpcResult<SubmittedAction> {
        Ok(self.client.submit(action, app_id, signed_transactions).await?)
    }

    async fn execute_action(
        &self,
        ExecuteActionParameters { app_id, action, sender }: ExecuteActionParameters,
    ) -> RpcResult<SubmittedAction> {
        let wallet = self
            .wallet
            .as_ref()
            .ok_or(EscrowError::Signer(SignerError::NotConnected))?;

        if !wallet.is_connected().await {
            wallet.reconnect().await.map_err(EscrowError::from)?;
        }

        Ok(self.client.execute_as(action, app_id, sender, wallet).await?)
    }
}
