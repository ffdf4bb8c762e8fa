//! RPC call metrics and the Prometheus exporter.

use eyre::eyre;
use futures_util::future::BoxFuture;
use jsonrpsee::{
    MethodResponse,
    server::middleware::rpc::RpcServiceT,
    types::{Request, error::METHOD_NOT_FOUND_CODE},
};
use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use serde::Deserialize;
use std::{
    net::SocketAddr,
    sync::Mutex,
    time::{Duration, Instant},
};

/// Outcome label of a successful call.
const OK_OUTCOME: &str = "ok";

/// Outcome label of a failed call that carries no escrow error kind.
const UNTAGGED_OUTCOME: &str = "rpc_error";

/// [`jsonrpsee`] middleware counting `escrow_` calls by method and outcome.
///
/// The outcome is the escrow error kind from the error `data`, or `ok`.
#[derive(Debug, Clone)]
pub struct RpcMetricsService<S> {
    inner: S,
}

impl<S> RpcMetricsService<S> {
    /// Wraps `inner`.
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

impl<'a, S> RpcServiceT<'a> for RpcMetricsService<S>
where
    S: RpcServiceT<'a> + Send + Sync + Clone + 'static,
{
    type Future = BoxFuture<'a, MethodResponse>;

    fn call(&self, req: Request<'a>) -> Self::Future {
        let inner = self.inner.clone();

        Box::pin(async move {
            let method = req.method_name().to_string();
            let started = Instant::now();
            let response = inner.call(req).await;

            if response.as_error_code() != Some(METHOD_NOT_FOUND_CODE) {
                let outcome = call_outcome(&response);
                counter!("escrow.rpc.calls", "method" => method.clone(), "outcome" => outcome)
                    .increment(1);
                histogram!("escrow.rpc.latency", "method" => method)
                    .record(started.elapsed().as_secs_f64() * 1000.0);
            }

            response
        })
    }
}

fn call_outcome(response: &MethodResponse) -> String {
    if response.is_success() {
        return OK_OUTCOME.to_string();
    }
    error_kind(response.as_result()).unwrap_or_else(|| UNTAGGED_OUTCOME.to_string())
}

/// Extracts `error.data.kind` from a serialized JSON-RPC response.
fn error_kind(response: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct Response {
        error: Failure,
    }

    #[derive(Deserialize)]
    struct Failure {
        data: Option<Tagged>,
    }

    #[derive(Deserialize)]
    struct Tagged {
        kind: String,
    }

    serde_json::from_str::<Response>(response).ok()?.error.data.map(|data| data.kind)
}

/// Installs the global Prometheus recorder and serves it on `addr`.
///
/// Only the first call installs a recorder; later calls return its handle.
pub async fn setup_exporter(addr: impl Into<SocketAddr>) -> eyre::Result<PrometheusHandle> {
    static INSTALLED: Mutex<Option<PrometheusHandle>> = Mutex::new(None);

    let mut installed = INSTALLED.lock().map_err(|_| eyre!("metrics handle lock poisoned"))?;
    if let Some(handle) = installed.as_ref() {
        return Ok(handle.clone());
    }

    let addr = addr.into();
    let (recorder, exporter) = PrometheusBuilder::new()
        .with_http_listener(addr)
        .upkeep_timeout(Duration::from_secs(5))
        .build()?;
    let handle = recorder.handle();
    metrics::set_global_recorder(recorder)
        .map_err(|err| eyre!("could not install metrics recorder: {err}"))?;
    tokio::spawn(exporter);
    tracing::info!(target: "escrow::spawn", %addr, "Serving metrics");

    Ok(installed.insert(handle).clone())
}
