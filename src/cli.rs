//! # Escrow CLI
use crate::{
    config::{EscrowConfig, WalletConfig},
    constants::DEFAULT_RPC_DEFAULT_MAX_CONNECTIONS,
    spawn::try_spawn_with_args,
};
use clap::Parser;
use std::{
    net::{IpAddr, Ipv4Addr},
    path::PathBuf,
};
use url::Url;

/// The escrow service reads escrow contract state and composes escrow lifecycle transactions.
#[derive(Debug, Parser)]
#[command(author, about = "Escrow", long_about = None)]
pub struct Args {
    /// The configuration file.
    ///
    /// If missing, a default one will be used and stored in the working directory under
    /// `escrow.yaml`.
    #[arg(long, value_name = "CONFIG", env = "ESCROW_CONFIG", default_value = "escrow.yaml")]
    pub config: PathBuf,
    /// The address to serve the RPC on.
    #[arg(long = "http.addr", value_name = "ADDR", default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    pub address: IpAddr,
    /// The port to serve the RPC on.
    #[arg(long = "http.port", value_name = "PORT", default_value_t = 9120)]
    pub port: u16,
    /// The port to serve the metrics on.
    #[arg(long = "http.metrics-port", value_name = "PORT", default_value_t = 9001)]
    pub metrics_port: u16,
    /// The maximum number of concurrent connections the service can handle.
    #[arg(long = "max-connections", value_name = "NUM", default_value_t = DEFAULT_RPC_DEFAULT_MAX_CONNECTIONS)]
    pub max_connections: u32,
    /// The REST endpoint of the ledger node.
    ///
    /// Defaults to the public TestNet node.
    #[arg(long = "node-endpoint", value_name = "URL")]
    pub node_endpoint: Option<Url>,
    /// The API token of the ledger node.
    #[arg(long = "node-token", value_name = "TOKEN", env = "ESCROW_NODE_TOKEN")]
    pub node_token: Option<String>,
    /// The number of rounds to wait for a transaction confirmation.
    ///
    /// Defaults to 10 rounds.
    #[arg(long = "confirmation-rounds", value_name = "ROUNDS")]
    pub confirmation_rounds: Option<u64>,
    /// The Firestore project holding escrow records.
    ///
    /// Records are kept in memory if neither this nor the config file selects a store.
    #[arg(long = "firestore-project", value_name = "PROJECT")]
    pub firestore_project: Option<String>,
    /// The Firestore API key.
    #[arg(long = "firestore-api-key", value_name = "KEY", env = "ESCROW_FIRESTORE_API_KEY")]
    pub firestore_api_key: Option<String>,
    /// The key-management daemon wallet used by `escrow_executeAction`.
    #[arg(long = "kmd-wallet", value_name = "NAME")]
    pub kmd_wallet: Option<String>,
    /// The REST endpoint of the key-management daemon.
    #[arg(long = "kmd-endpoint", value_name = "URL", requires = "kmd_wallet")]
    pub kmd_endpoint: Option<Url>,
    /// The API token of the key-management daemon.
    #[arg(long = "kmd-token", value_name = "TOKEN", env = "ESCROW_KMD_TOKEN")]
    pub kmd_token: Option<String>,
    /// The password of the key-management daemon wallet.
    #[arg(long = "wallet-password", value_name = "PASSWORD", env = "ESCROW_WALLET_PASSWORD")]
    pub wallet_password: Option<String>,
}

impl Args {
    /// Run the escrow service.
    pub async fn run(self) -> eyre::Result<()> {
        let config_path = self.config.clone();
        try_spawn_with_args(self, &config_path).await?.server.stopped().await;

        Ok(())
    }

    /// Merges [`Args`] values into an existing [`EscrowConfig`] instance.
    pub fn merge_escrow_config(self, config: EscrowConfig) -> EscrowConfig {
        let wallet = self.kmd_wallet.map(|wallet_name| match self.kmd_endpoint {
            Some(endpoint) => WalletConfig { endpoint, wallet_name },
            None => WalletConfig::local(wallet_name),
        });

        config
            .with_address(self.address)
            .with_port(self.port)
            .with_metrics_port(self.metrics_port)
            .with_max_connections(self.max_connections)
            .with_node_endpoint(self.node_endpoint)
            .with_node_token(self.node_token)
            .with_confirmation_rounds(self.confirmation_rounds)
            .with_firestore_project(self.firestore_project)
            .with_firestore_api_key(self.firestore_api_key)
            .with_wallet(wallet)
            .with_kmd_token(self.kmd_token)
            .with_wallet_password(self.wallet_password)
    }
}
