//! Assembles a [`Node`] from configuration.
//!
//! ## Example
//! ```ignore
//! let (shutdown_tx, shutdown_rx) = watch::channel(());
//! let node = NodeBuilder::new(None, shutdown_rx)?
//!     .build()?
//!     .start_metrics_server();
//! node.run().await?;
//! ```
//!
//! `build()` opens the sled-backed store below `server.db_root_dir`;
//! `build_with_store()` accepts any [`UserStore`].

use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;
use tracing::info;

use crate::Node;
use crate::NotificationChannel;
use crate::Result;
use crate::SledUserStore;
use crate::UserManagementService;
use crate::UserServiceConfig;
use crate::UserStore;

pub struct NodeBuilder {
    pub(super) config: UserServiceConfig,
    pub(super) shutdown_signal: watch::Receiver<()>,
}

impl NodeBuilder {
    /// Loads and validates configuration, applying `config_path` on top of
    /// defaults, `CONFIG_PATH` and environment variables.
    pub fn new(
        config_path: Option<&str>,
        shutdown_signal: watch::Receiver<()>,
    ) -> Result<Self> {
        let mut config = UserServiceConfig::new()?;
        if let Some(p) = config_path {
            info!("with_override_config from: {}", &p);
            config = config.with_override_config(p)?;
        }
        Ok(Self::from_config(config.validate()?, shutdown_signal))
    }

    /// Uses an already validated configuration.
    pub fn from_config(
        config: UserServiceConfig,
        shutdown_signal: watch::Receiver<()>,
    ) -> Self {
        Self {
            config,
            shutdown_signal,
        }
    }

    pub fn config(&self) -> &UserServiceConfig {
        &self.config
    }

    /// Opens the sled store and assembles the node.
    pub fn build(self) -> Result<Node<SledUserStore>> {
        let store = SledUserStore::open(&self.config.server.db_root_dir)?;
        Ok(self.build_with_store(Arc::new(store)))
    }

    /// Assembles the node around a caller-supplied store.
    ///
    /// Spawns a task that closes the notification channel once the shutdown
    /// signal fires, so must be called inside a tokio runtime.
    pub fn build_with_store<S: UserStore>(
        self,
        store: Arc<S>,
    ) -> Node<S> {
        let channel = NotificationChannel::new(&self.config.notification);
        let service = Arc::new(UserManagementService::new(
            store,
            channel.clone(),
            self.config.notification.clone(),
        ));

        let mut shutdown = self.shutdown_signal.clone();
        let watched = channel.clone();
        tokio::spawn(async move {
            let _ = shutdown.changed().await;
            debug!("Shutdown signal received, closing notification channel");
            watched.close();
        });

        Node::new(service, channel, self.config, self.shutdown_signal)
    }
}
