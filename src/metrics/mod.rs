use std::sync::Once;

use autometrics::prometheus_exporter::{self, PrometheusResponse};
use lazy_static::lazy_static;
use prometheus::IntCounterVec;
use prometheus::IntGauge;
use prometheus::Opts;
use prometheus::Registry;
use tokio::sync::watch;
use tracing::error;
use tracing::info;
use warp::Filter;
use warp::Rejection;
use warp::Reply;

lazy_static! {
    /// Publish results by outcome: enqueued, deferred, dropped, and the
    /// eventual fate of deferred events (delivered_late, dropped_timeout,
    /// dropped_shutdown, dropped_unclaimed)
    pub static ref NOTIFICATION_PUBLISH_METRIC: IntCounterVec = IntCounterVec::new(
        Opts::new("notification_publish_total", "Notification publish outcomes"),
        &["outcome"]
    )
    .expect("metric can not be created");

    pub static ref ACTIVE_SUBSCRIBERS_METRIC: IntGauge = IntGauge::new(
        "notification_active_subscribers",
        "Currently attached NotifyUserChanges streams"
    )
    .expect("metric can not be created");

    pub static ref USER_OPERATION_METRIC: IntCounterVec = IntCounterVec::new(
        Opts::new("user_operations_total", "User RPCs by operation and result"),
        &["operation", "result"]
    )
    .expect("metric can not be created");

    pub static ref REGISTRY: Registry = Registry::new();
}

static REGISTER: Once = Once::new();

fn register_custom_metrics() {
    REGISTER.call_once(|| {
        let collectors: [Box<dyn prometheus::core::Collector>; 3] = [
            Box::new(NOTIFICATION_PUBLISH_METRIC.clone()),
            Box::new(ACTIVE_SUBSCRIBERS_METRIC.clone()),
            Box::new(USER_OPERATION_METRIC.clone()),
        ];
        for collector in collectors {
            if let Err(e) = REGISTRY.register(collector) {
                error!("collector can not be registered: {:?}", e);
            }
        }
    });
}

/// Counts one finished user RPC.
pub(crate) fn record_operation(
    operation: &str,
    ok: bool,
) {
    let result = if ok { "ok" } else { "error" };
    USER_OPERATION_METRIC
        .with_label_values(&[operation, result])
        .inc();
}

/// Serves `/metrics` until the shutdown signal fires.
pub async fn start_server(
    port: u16,
    mut shutdown_signal: watch::Receiver<()>,
) {
    register_custom_metrics();

    let metrics_route = warp::path!("metrics").and_then(metrics_handler);

    info!(port, "Metrics server listening");
    let (_, server) =
        warp::serve(metrics_route).bind_with_graceful_shutdown(([0, 0, 0, 0], port), async move {
            let _ = shutdown_signal.changed().await;
        });
    server.await;
}

async fn metrics_handler() -> Result<impl Reply, Rejection> {
    let mut body = encode_registry();
    body.push_str(&get_metrics_body());
    Ok(body)
}

fn encode_registry() -> String {
    use prometheus::Encoder;
    let encoder = prometheus::TextEncoder::new();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&REGISTRY.gather(), &mut buffer) {
        error!("could not encode custom metrics: {}", e);
    };
    String::from_utf8(buffer).unwrap_or_else(|e| {
        error!("custom metrics could not be from_utf8'd: {}", e);
        String::default()
    })
}

/// Export autometrics-collected function metrics for Prometheus to scrape
pub fn get_metrics_body() -> String {
    get_metrics().into_body()
}

pub fn get_metrics() -> PrometheusResponse {
    prometheus_exporter::encode_http_response()
}
