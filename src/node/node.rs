//! A running user management service instance.
//!
//! Owns the notification channel, the RPC service and the shutdown signal.
//! [`Node::run`] binds the configured address and serves until shutdown.

use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::error;
use tracing::info;

use crate::grpc;
use crate::metrics;
use crate::NotificationChannel;
use crate::Result;
use crate::SystemError;
use crate::UserManagementService;
use crate::UserServiceConfig;
use crate::UserStore;

pub struct Node<S: UserStore> {
    service: Arc<UserManagementService<S>>,
    channel: NotificationChannel,
    config: UserServiceConfig,
    shutdown_signal: watch::Receiver<()>,
    ready: AtomicBool,
}

impl<S: UserStore> Node<S> {
    pub(super) fn new(
        service: Arc<UserManagementService<S>>,
        channel: NotificationChannel,
        config: UserServiceConfig,
        shutdown_signal: watch::Receiver<()>,
    ) -> Self {
        Self {
            service,
            channel,
            config,
            shutdown_signal,
            ready: AtomicBool::new(false),
        }
    }

    /// Launches the Prometheus endpoint when monitoring is enabled.
    pub fn start_metrics_server(self) -> Self {
        if self.config.monitoring.prometheus_enabled {
            let port = self.config.monitoring.prometheus_port;
            let shutdown_signal = self.shutdown_signal.clone();
            tokio::spawn(async move {
                metrics::start_server(port, shutdown_signal).await;
            });
        }
        self
    }

    /// Binds `server.listen_address` and serves until shutdown.
    pub async fn run(&self) -> Result<()> {
        let listen_address = self.config.server.listen_address;
        let listener = TcpListener::bind(listen_address).await.map_err(|e| {
            error!(%listen_address, "bind failed: {:?}", e);
            SystemError::NodeStartFailed(format!("failed to bind {listen_address}: {e}"))
        })?;
        self.serve(listener).await
    }

    /// Serves on an already bound listener until shutdown.
    ///
    /// The notification channel is closed on return, whatever the outcome.
    pub async fn serve(
        &self,
        listener: TcpListener,
    ) -> Result<()> {
        self.set_ready(true);
        info!("User management service ready");

        let result = grpc::start_rpc_server(
            self.service.clone(),
            listener,
            self.config.clone(),
            self.shutdown_signal.clone(),
        )
        .await;

        self.set_ready(false);
        self.channel.close();
        result
    }

    pub fn notification_channel(&self) -> &NotificationChannel {
        &self.channel
    }

    pub fn service(&self) -> Arc<UserManagementService<S>> {
        self.service.clone()
    }

    pub fn config(&self) -> &UserServiceConfig {
        &self.config
    }

    pub fn set_ready(
        &self,
        is_ready: bool,
    ) {
        self.ready.store(is_ready, Ordering::SeqCst);
    }

    pub fn server_is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }
}
