//! Escrow service configuration.
use crate::{
    constants::{
        DEFAULT_APPROVE_METHOD, DEFAULT_APPROVE_PAYMENT, DEFAULT_CANCEL_METHOD,
        DEFAULT_CONFIRMATION_ROUNDS, DEFAULT_ESCROW_COLLECTION, DEFAULT_KMD_URL,
        DEFAULT_REQUEST_TIMEOUT, DEFAULT_RPC_DEFAULT_MAX_CONNECTIONS, DEFAULT_VALIDITY_WINDOW,
        FIRESTORE_BASE_URL, TESTNET_NODE_URL,
    },
    types::Method,
};
use eyre::Context;
use serde::{Deserialize, Serialize};
use std::{
    net::{IpAddr, Ipv4Addr},
    path::Path,
    time::Duration,
};
use url::Url;

/// Escrow service configuration.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Ledger node configuration.
    #[serde(default)]
    pub node: NodeConfig,
    /// Deployed contract ABI and transaction shaping.
    #[serde(default)]
    pub contract: ContractConfig,
    /// Document store configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Wallet signer configuration. Without it, only unsigned groups are prepared.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet: Option<WalletConfig>,
    /// Secrets.
    #[serde(skip_serializing, default)]
    pub secrets: SecretsConfig,
}

impl EscrowConfig {
    /// Sets the IP address to serve the RPC on.
    pub fn with_address(mut self, address: IpAddr) -> Self {
        self.server.address = address;
        self
    }

    /// Sets the port to serve the RPC on.
    pub fn with_port(mut self, port: u16) -> Self {
        self.server.port = port;
        self
    }

    /// Sets the port to serve the metrics on.
    pub fn with_metrics_port(mut self, port: u16) -> Self {
        self.server.metrics_port = port;
        self
    }

    /// Sets the maximum number of concurrent connections the service can handle.
    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.server.max_connections = max_connections;
        self
    }

    /// Sets the node endpoint.
    pub fn with_node_endpoint(mut self, endpoint: Option<Url>) -> Self {
        if let Some(endpoint) = endpoint {
            self.node.endpoint = endpoint;
        }
        self
    }

    /// Sets the node API token.
    pub fn with_node_token(mut self, token: Option<String>) -> Self {
        self.secrets.node_token = token.or(self.secrets.node_token);
        self
    }

    /// Sets the number of rounds to wait for a confirmation.
    pub fn with_confirmation_rounds(mut self, rounds: Option<u64>) -> Self {
        if let Some(rounds) = rounds {
            self.contract.confirmation_rounds = rounds;
        }
        self
    }

    /// Sets the payment sent alongside the approval call.
    pub fn with_approve_payment(mut self, amount: Option<u64>) -> Self {
        if let Some(amount) = amount {
            self.contract.approve_payment = amount;
        }
        self
    }

    /// Uses a Firestore project as document store.
    pub fn with_firestore_project(mut self, project_id: Option<String>) -> Self {
        if let Some(project_id) = project_id {
            self.storage = StorageConfig::Firestore {
                project_id,
                collection: DEFAULT_ESCROW_COLLECTION.to_string(),
                endpoint: None,
            };
        }
        self
    }

    /// Sets the Firestore API key.
    pub fn with_firestore_api_key(mut self, api_key: Option<String>) -> Self {
        self.secrets.firestore_api_key = api_key.or(self.secrets.firestore_api_key);
        self
    }

    /// Sets the wallet signer.
    pub fn with_wallet(mut self, wallet: Option<WalletConfig>) -> Self {
        self.wallet = wallet.or(self.wallet);
        self
    }

    /// Sets the key-management daemon API token.
    pub fn with_kmd_token(mut self, token: Option<String>) -> Self {
        self.secrets.kmd_token = token.or(self.secrets.kmd_token);
        self
    }

    /// Sets the wallet password.
    pub fn with_wallet_password(mut self, password: Option<String>) -> Self {
        self.secrets.wallet_password = password.or(self.secrets.wallet_password);
        self
    }

    /// Load from a YAML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> eyre::Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .wrap_err_with(|| format!("failed to read config file: {}", path.display()))?;
        let config = serde_yaml::from_reader(&file)
            .wrap_err_with(|| format!("failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Save to a YAML file.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> eyre::Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The address to serve the RPC on.
    pub address: IpAddr,
    /// The port to serve the RPC on.
    pub port: u16,
    /// The port to serve the metrics on.
    pub metrics_port: u16,
    /// The maximum number of concurrent connections the service can handle.
    pub max_connections: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 9120,
            metrics_port: 9001,
            max_connections: DEFAULT_RPC_DEFAULT_MAX_CONNECTIONS,
        }
    }
}

/// Ledger node configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// REST endpoint of the node.
    pub endpoint: Url,
    /// Timeout applied to each request, in seconds.
    #[serde(with = "crate::serde::duration")]
    pub request_timeout: Duration,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            endpoint: Url::parse(TESTNET_NODE_URL).expect("valid url"),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// Fixed ABI of the deployed escrow contract and transaction shaping parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractConfig {
    /// Method releasing the funds to the freelancer.
    pub approve_method: Method,
    /// Method refunding the funds to the client.
    pub cancel_method: Method,
    /// Payment to the application account accompanying the approval call, in micro-units.
    pub approve_payment: u64,
    /// Number of rounds composed transactions stay valid for.
    pub validity_window: u64,
    /// Number of rounds to wait for a confirmation.
    pub confirmation_rounds: u64,
}

impl Default for ContractConfig {
    fn default() -> Self {
        Self {
            approve_method: DEFAULT_APPROVE_METHOD.parse().expect("valid method"),
            cancel_method: DEFAULT_CANCEL_METHOD.parse().expect("valid method"),
            approve_payment: DEFAULT_APPROVE_PAYMENT,
            validity_window: DEFAULT_VALIDITY_WINDOW,
            confirmation_rounds: DEFAULT_CONFIRMATION_ROUNDS,
        }
    }
}

/// Document store backend.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StorageConfig {
    /// Process-local store, lost on restart.
    #[default]
    Memory,
    /// Firestore over its REST api.
    Firestore {
        /// The Google Cloud project.
        project_id: String,
        /// The collection holding escrow records.
        #[serde(default = "default_collection")]
        collection: String,
        /// Endpoint override, e.g. an emulator.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        endpoint: Option<Url>,
    },
}

impl StorageConfig {
    /// Returns the Firestore endpoint to use, if Firestore is configured.
    pub fn firestore_endpoint(&self) -> Option<Url> {
        match self {
            Self::Memory => None,
            Self::Firestore { endpoint, .. } => endpoint
                .clone()
                .or_else(|| Url::parse(FIRESTORE_BASE_URL).ok()),
        }
    }
}

fn default_collection() -> String {
    DEFAULT_ESCROW_COLLECTION.to_string()
}

/// Key-management daemon wallet configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletConfig {
    /// REST endpoint of the daemon.
    pub endpoint: Url,
    /// Name of the wallet holding the client keys.
    pub wallet_name: String,
}

impl WalletConfig {
    /// Creates a wallet config for the daemon on its default local endpoint.
    pub fn local(wallet_name: impl Into<String>) -> Self {
        Self {
            endpoint: Url::parse(DEFAULT_KMD_URL).expect("valid url"),
            wallet_name: wallet_name.into(),
        }
    }
}

/// Secrets, never written back to the config file.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretsConfig {
    /// Node API token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_token: Option<String>,
    /// Key-management daemon API token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kmd_token: Option<String>,
    /// Wallet password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet_password: Option<String>,
    /// Firestore API key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firestore_api_key: Option<String>,
}
