use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tonic::transport::Channel;
use user_management::proto::user_management_client::UserManagementClient;
use user_management::proto::CreateUserReq;
use user_management::proto::User;
use user_management::proto::UserActionResponse;
use user_management::connect_user_client;
use user_management::ConnectionParams;
use user_management::Node;
use user_management::NodeBuilder;
use user_management::NotificationSubscriber;
use user_management::SledUserStore;
use user_management::UserServiceConfig;

pub const EVENT_WAIT: Duration = Duration::from_secs(3);

static LOGGER_INIT: once_cell::sync::Lazy<()> = once_cell::sync::Lazy::new(|| {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
});

pub fn enable_logger() {
    *LOGGER_INIT;
    println!("setup logger for integration test.");
}

/// A service instance listening on an ephemeral local port.
pub struct TestService {
    pub address: String,
    pub node: Arc<Node<SledUserStore>>,
    shutdown_tx: watch::Sender<()>,
    handle: JoinHandle<user_management::Result<()>>,
    _db_dir: TempDir,
}

impl TestService {
    pub async fn start(config: UserServiceConfig) -> Self {
        enable_logger();
        let db_dir = tempfile::tempdir().unwrap();
        let store = SledUserStore::open(db_dir.path()).unwrap();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();

        let (shutdown_tx, shutdown_rx) = watch::channel(());
        let node = Arc::new(NodeBuilder::from_config(config, shutdown_rx).build_with_store(Arc::new(store)));
        let handle = {
            let node = node.clone();
            tokio::spawn(async move { node.serve(listener).await })
        };

        Self {
            address,
            node,
            shutdown_tx,
            handle,
            _db_dir: db_dir,
        }
    }

    pub async fn client(&self) -> UserManagementClient<Channel> {
        connect_user_client(&self.address, &ConnectionParams::default())
            .await
            .unwrap()
    }

    pub async fn subscriber(&self) -> NotificationSubscriber {
        let mut client = self.client().await;
        NotificationSubscriber::subscribe(&mut client).await.unwrap()
    }

    pub async fn shutdown(self) -> user_management::Result<()> {
        self.shutdown_tx.send(()).unwrap();
        timeout(Duration::from_secs(5), self.handle)
            .await
            .expect("server should stop")
            .expect("server task should not panic")
    }
}

pub fn user(email: &str) -> User {
    User {
        first_name: "Ada".into(),
        last_name: "Lovelace".into(),
        email: email.into(),
        nickname: "ada".into(),
        password: "hunter2".into(),
        country: "UK".into(),
    }
}

pub async fn create(
    client: &mut UserManagementClient<Channel>,
    email: &str,
) -> UserActionResponse {
    client
        .create_user(CreateUserReq {
            user: Some(user(email)),
        })
        .await
        .unwrap()
        .into_inner()
}

pub async fn next_action(subscriber: &mut NotificationSubscriber) -> String {
    timeout(EVENT_WAIT, subscriber.next_action())
        .await
        .expect("notification should arrive")
        .expect("stream should stay healthy")
        .expect("stream should stay open")
}

/// Asserts nothing arrives within `window`.
pub async fn assert_quiet(
    subscriber: &mut NotificationSubscriber,
    window: Duration,
) {
    if let Ok(next) = timeout(window, subscriber.next_action()).await {
        panic!("unexpected notification: {next:?}");
    }
}
