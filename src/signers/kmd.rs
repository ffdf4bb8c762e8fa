//! Key-management daemon signer.

use super::WalletSigner;
use crate::{
    error::SignerError,
    transactions::TransactionGroup,
    types::Address,
};
use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::fmt;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use url::Url;

/// Header carrying the daemon api token.
const API_TOKEN_HEADER: &str = "X-KMD-API-Token";

/// Signs transactions with keys held by a key-management daemon wallet.
///
/// Keys never leave the daemon. A session is a wallet handle token obtained with the wallet
/// password.
pub struct KmdSigner {
    client: Client,
    endpoint: Url,
    api_token: Option<String>,
    wallet_name: String,
    wallet_password: String,
    handle: RwLock<Option<String>>,
}

impl fmt::Debug for KmdSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KmdSigner")
            .field("endpoint", &self.endpoint.as_str())
            .field("wallet_name", &self.wallet_name)
            .finish_non_exhaustive()
    }
}

impl KmdSigner {
    /// Create a new signer for the wallet named `wallet_name`.
    pub fn new(
        endpoint: Url,
        api_token: Option<String>,
        wallet_name: String,
        wallet_password: String,
    ) -> Self {
        Self {
            client: Client::new(),
            endpoint,
            api_token,
            wallet_name,
            wallet_password,
            handle: RwLock::new(None),
        }
    }

    fn request(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_token {
            Some(token) => request.header(API_TOKEN_HEADER, token),
            None => request,
        }
    }

    fn url(&self, path: &str) -> Result<Url, SignerError> {
        self.endpoint
            .join(path)
            .map_err(|err| SignerError::Protocol(format!("invalid daemon url for {path}: {err}")))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, SignerError> {
        let response = self.request(self.client.get(self.url(path)?)).send().await?;
        parse(response).await
    }

    async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T, SignerError> {
        let response = self.request(self.client.post(self.url(path)?)).json(body).send().await?;
        parse(response).await
    }

    async fn handle(&self) -> Result<String, SignerError> {
        self.handle.read().await.clone().ok_or(SignerError::NotConnected)
    }

    async fn open_session(&self) -> Result<String, SignerError> {
        let wallets: ListWalletsResponse = self.get("v1/wallets").await?;
        let wallet = wallets
            .wallets
            .into_iter()
            .find(|wallet| wallet.name == self.wallet_name)
            .ok_or_else(|| SignerError::Rejected(format!("no wallet named {}", self.wallet_name)))?;

        let init: InitWalletResponse = self
            .post(
                "v1/wallet/init",
                &InitWalletRequest { wallet_id: &wallet.id, wallet_password: &self.wallet_password },
            )
            .await?;

        debug!(wallet = %self.wallet_name, "Opened wallet session");
        *self.handle.write().await = Some(init.wallet_handle_token.clone());
        Ok(init.wallet_handle_token)
    }

    async fn list_keys(&self, handle: &str) -> Result<Vec<Address>, SignerError> {
        let keys: ListKeysResponse =
            self.post("v1/key/list", &HandleRequest { wallet_handle_token: handle }).await?;
        keys.addresses
            .iter()
            .map(|address| {
                address
                    .parse()
                    .map_err(|_| SignerError::Protocol(format!("invalid address {address}")))
            })
            .collect()
    }
}

#[async_trait]
impl WalletSigner for KmdSigner {
    async fn connect(&self) -> Result<Vec<Address>, SignerError> {
        let handle = self.open_session().await?;
        self.list_keys(&handle).await
    }

    async fn reconnect(&self) -> Result<Vec<Address>, SignerError> {
        let Ok(handle) = self.handle().await else { return self.connect().await };

        match self
            .post::<serde_json::Value>(
                "v1/wallet/renew",
                &HandleRequest { wallet_handle_token: &handle },
            )
            .await
        {
            Ok(_) => self.list_keys(&handle).await,
            Err(err) => {
                warn!(%err, "Wallet session expired, reconnecting");
                self.connect().await
            }
        }
    }

    async fn disconnect(&self) -> Result<(), SignerError> {
        let Some(handle) = self.handle.write().await.take() else { return Ok(()) };
        self.post::<serde_json::Value>(
            "v1/wallet/release",
            &HandleRequest { wallet_handle_token: &handle },
        )
        .await?;
        Ok(())
    }

    async fn sign_group(
        &self,
        group: &TransactionGroup,
        signer: Address,
    ) -> Result<Vec<Vec<u8>>, SignerError> {
        let handle = self.handle().await?;

        let mut signed = Vec::with_capacity(group.len());
        for tx in group.transactions() {
            if tx.sender != signer {
                return Err(SignerError::UnknownAccount(tx.sender.to_string()));
            }
            let encoded = tx.encode().map_err(|err| SignerError::Protocol(err.to_string()))?;

            let response: SignTransactionResponse = self
                .post(
                    "v1/transaction/sign",
                    &SignTransactionRequest {
                        wallet_handle_token: &handle,
                        wallet_password: &self.wallet_password,
                        transaction: STANDARD.encode(encoded),
                    },
                )
                .await?;

            signed.push(STANDARD.decode(&response.signed_transaction).map_err(|err| {
                SignerError::Protocol(format!("invalid signed transaction: {err}"))
            })?);
        }

        Ok(signed)
    }
}

/// Parses a daemon response, turning error statuses into [`SignerError::Rejected`].
async fn parse<T: DeserializeOwned>(response: Response) -> Result<T, SignerError> {
    let status = response.status();
    let body = response.bytes().await?;

    if !status.is_success() {
        let message = serde_json::from_slice::<ErrorResponse>(&body)
            .map(|err| err.message)
            .unwrap_or_else(|_| String::from_utf8_lossy(&body).into_owned());
        return Err(SignerError::Rejected(message));
    }

    serde_json::from_slice(&body).map_err(|err| SignerError::Protocol(err.to_string()))
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct ListWalletsResponse {
    #[serde(default)]
    wallets: Vec<Wallet>,
}

#[derive(Debug, Deserialize)]
struct Wallet {
    id: String,
    name: String,
}

#[derive(Debug, Serialize)]
struct InitWalletRequest<'a> {
    wallet_id: &'a str,
    wallet_password: &'a str,
}

#[derive(Debug, Deserialize)]
struct InitWalletResponse {
    wallet_handle_token: String,
}

#[derive(Debug, Serialize)]
struct HandleRequest<'a> {
    wallet_handle_token: &'a str,
}

#[derive(Debug, Deserialize)]
struct ListKeysResponse {
    #[serde(default)]
    addresses: Vec<String>,
}

#[derive(Debug, Serialize)]
struct SignTransactionRequest<'a> {
    wallet_handle_token: &'a str,
    wallet_password: &'a str,
    transaction: String,
}

#[derive(Debug, Deserialize)]
struct SignTransactionResponse {
    signed_transaction: String,
}
