//! Escrow service spawn utilities.
use crate::{
    cli::Args,
    config::{EscrowConfig, StorageConfig},
    escrow::EscrowClient,
    metrics::{self, RpcMetricsService},
    node::AlgodClient,
    rpc::{EscrowApiServer, EscrowRpc},
    signers::{KmdSigner, WalletConnection},
    storage::{EscrowStorage, FirestoreStorage},
};
use eyre::OptionExt;
use http::header;
use jsonrpsee::server::{
    RpcServiceBuilder, Server, ServerHandle, middleware::http::ProxyGetRequestLayer,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::{net::SocketAddr, path::Path, sync::Arc};
use tower::ServiceBuilder;
use tower_http::cors::{AllowMethods, AllowOrigin, CorsLayer};
use tracing::{info, warn};

/// Context returned once the escrow service is launched.
#[derive(Debug, Clone)]
pub struct EscrowHandle {
    /// The socket address to which the server is bound.
    pub local_addr: SocketAddr,
    /// Handle to RPC server.
    pub server: ServerHandle,
    /// The escrow client serving requests.
    pub client: EscrowClient,
    /// Storage of the service.
    pub storage: EscrowStorage,
    /// Metrics collector handle.
    pub metrics: PrometheusHandle,
}

impl EscrowHandle {
    /// Returns the url to the http server
    pub fn http_url(&self) -> String {
        format!("http://{}", self.local_addr)
    }
}

/// Attempts to spawn the escrow service using CLI arguments and a configuration file.
pub async fn try_spawn_with_args<P: AsRef<Path>>(
    args: Args,
    config_path: P,
) -> eyre::Result<EscrowHandle> {
    let config = if !config_path.as_ref().exists() {
        let config = args.merge_escrow_config(EscrowConfig::default());
        config.save_to_file(&config_path)?;
        config
    } else {
        // File exists: load and override with CLI values.
        args.merge_escrow_config(EscrowConfig::load_from_file(&config_path)?)
    };

    try_spawn(config).await
}

/// Spawns the escrow service using the provided [`EscrowConfig`].
pub async fn try_spawn(config: EscrowConfig) -> eyre::Result<EscrowHandle> {
    // construct document store
    let storage = match &config.storage {
        StorageConfig::Memory => {
            info!("Using in-memory storage.");
            EscrowStorage::in_memory()
        }
        StorageConfig::Firestore { project_id, collection, .. } => {
            info!(%project_id, %collection, "Using Firestore storage.");
            let endpoint =
                config.storage.firestore_endpoint().ok_or_eyre("missing Firestore endpoint")?;
            EscrowStorage::firestore(FirestoreStorage::new(
                &endpoint,
                project_id,
                collection.clone(),
                config.secrets.firestore_api_key.clone(),
            )?)
        }
    };

    // construct ledger client
    let ledger = Arc::new(AlgodClient::with_timeout(
        config.node.endpoint.clone(),
        config.secrets.node_token.clone(),
        config.node.request_timeout,
    )?);
    let client = EscrowClient::new(ledger, storage.clone(), config.contract.clone());

    // construct wallet
    let wallet = match &config.wallet {
        Some(wallet) => {
            let connection = WalletConnection::new(Arc::new(KmdSigner::new(
                wallet.endpoint.clone(),
                config.secrets.kmd_token.clone(),
                wallet.wallet_name.clone(),
                config.secrets.wallet_password.clone().unwrap_or_default(),
            )));
            match connection.connect().await {
                Ok(account) => info!(%account, wallet = %wallet.wallet_name, "Connected wallet"),
                Err(err) => warn!(%err, "Wallet unavailable, connecting on first use"),
            }
            Some(connection)
        }
        None => None,
    };

    // setup metrics exporter
    let metrics =
        metrics::setup_exporter((config.server.address, config.server.metrics_port)).await?;

    // construct rpc module
    let rpc = EscrowRpc::new(client.clone(), wallet).into_rpc();

    // http layers
    let cors = CorsLayer::new()
        .allow_methods(AllowMethods::any())
        .allow_origin(AllowOrigin::any())
        .allow_headers([header::CONTENT_TYPE]);

    // start server
    let server = Server::builder()
        .http_only()
        .max_connections(config.server.max_connections)
        .set_http_middleware(
            ServiceBuilder::new()
                .layer(cors)
                .layer(ProxyGetRequestLayer::new("/health", "escrow_health")?),
        )
        .set_rpc_middleware(RpcServiceBuilder::new().layer_fn(RpcMetricsService::new))
        .build((config.server.address, config.server.port))
        .await?;
    let addr = server.local_addr()?;
    info!(%addr, node = %config.node.endpoint, "Started escrow service");

    Ok(EscrowHandle { local_addr: addr, server: server.start(rpc), client, storage, metrics })
}
