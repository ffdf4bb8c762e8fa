//! Node REST client implementation.

use super::{
    LedgerApi, NodeError,
    api::Result,
    error::NodeErrorResponse,
    types::{Application, NodeStatus, PendingTransactionInfo, SubmitResponse, TransactionParams},
};
use crate::{
    constants::DEFAULT_REQUEST_TIMEOUT,
    types::{AppId, TxId},
};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, trace};
use url::Url;

/// Header carrying the node api token.
const API_TOKEN_HEADER: &str = "X-Algo-API-Token";

/// Client for the node REST api.
#[derive(Debug, Clone)]
pub struct AlgodClient {
    client: Client,
    base_url: Url,
    api_token: Option<String>,
}

impl AlgodClient {
    /// Creates a new client for the node at `base_url`.
    pub fn new(base_url: Url, api_token: Option<String>) -> reqwest::Result<Self> {
        Self::with_timeout(base_url, api_token, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Creates a new client with a custom request timeout.
    ///
    /// Fails if the HTTP client cannot be built, e.g. when no TLS backend is available.
    pub fn with_timeout(
        base_url: Url,
        api_token: Option<String>,
        timeout: Duration,
    ) -> reqwest::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url, api_token })
    }

    /// Returns the node url.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|err| NodeError::Protocol(format!("invalid node url for {path}: {err}")))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_token {
            Some(token) => request.header(API_TOKEN_HEADER, token),
            None => request,
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, resource: impl FnOnce() -> String) -> Result<T> {
        let url = self.url(path)?;
        trace!(%url, "GET");
        let response =
            self.authorize(self.client.get(url)).send().await.map_err(NodeError::Transient)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(NodeError::NotFound(resource()));
        }

        decode(response).await
    }
}

/// Decodes a successful response body, classifying error statuses as transient.
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let response = response.error_for_status().map_err(NodeError::Transient)?;
    let body = response.bytes().await.map_err(NodeError::Transient)?;
    serde_json::from_slice(&body).map_err(|err| NodeError::Protocol(err.to_string()))
}

#[async_trait]
impl LedgerApi for AlgodClient {
    async fn application(&self, app_id: AppId) -> Result<Application> {
        self.get(&format!("v2/applications/{app_id}"), || format!("application {app_id}")).await
    }

    async fn transaction_params(&self) -> Result<TransactionParams> {
        self.get("v2/transactions/params", || "transaction params".to_string()).await
    }

    async fn status(&self) -> Result<NodeStatus> {
        self.get("v2/status", || "node status".to_string()).await
    }

    async fn status_after_round(&self, round: u64) -> Result<NodeStatus> {
        self.get(&format!("v2/status/wait-for-block-after/{round}"), || format!("round {round}"))
            .await
    }

    async fn pending_transaction(&self, tx_id: &TxId) -> Result<PendingTransactionInfo> {
        self.get(&format!("v2/transactions/pending/{tx_id}"), || format!("transaction {tx_id}"))
            .await
    }

    async fn send_raw_transactions(&self, signed: Vec<u8>) -> Result<TxId> {
        let url = self.url("v2/transactions")?;
        debug!(%url, bytes = signed.len(), "Submitting transactions");

        let response = self
            .authorize(self.client.post(url))
            .header(reqwest::header::CONTENT_TYPE, "application/x-binary")
            .body(signed)
            .send()
            .await
            .map_err(NodeError::Transient)?;

        if response.status() == StatusCode::BAD_REQUEST {
            let body = response.text().await.map_err(NodeError::Transient)?;
            let reason = serde_json::from_str::<NodeErrorResponse>(&body)
                .map(|err| err.message)
                .unwrap_or(body);
            return Err(NodeError::Rejected { reason });
        }

        let submitted: SubmitResponse = decode(response).await?;
        serde_json::from_value(serde_json::Value::String(submitted.tx_id))
            .map_err(|err| NodeError::Protocol(format!("invalid transaction id: {err}")))
    }
}
