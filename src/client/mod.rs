//! Client-side helpers for talking to a running service.
//!
//! Used by the `user-notify` consumer CLI and by integration tests.

use std::time::Duration;

use tonic::codec::CompressionEncoding;
use tonic::transport::Channel;
use tonic::transport::Endpoint;
use tonic::Streaming;
use tracing::debug;

use crate::proto::user_management_client::UserManagementClient;
use crate::proto::EmptyMsg;
use crate::proto::UserActionStream;
use crate::utils::net::address_str;
use crate::ConnectionParams;
use crate::NetworkError;
use crate::Result;

/// Connects to the service at `address` (`host:port`, scheme optional).
pub async fn connect_user_client(
    address: &str,
    params: &ConnectionParams,
) -> Result<UserManagementClient<Channel>> {
    let uri = address_str(address, false);
    debug!(%uri, "Connecting to user management service");

    let channel = Endpoint::try_from(uri.clone())
        .map_err(|e| NetworkError::InvalidURI(format!("{uri}: {e}")))?
        .connect_timeout(Duration::from_millis(params.connect_timeout_in_ms))
        .tcp_keepalive(Some(Duration::from_secs(params.tcp_keepalive_in_secs)))
        .http2_keep_alive_interval(Duration::from_secs(params.http2_keep_alive_interval_in_secs))
        .keep_alive_timeout(Duration::from_secs(params.http2_keep_alive_timeout_in_secs))
        .connect()
        .await?;

    Ok(UserManagementClient::new(channel).accept_compressed(CompressionEncoding::Gzip))
}

/// An attached `NotifyUserChanges` stream.
pub struct NotificationSubscriber {
    stream: Streaming<UserActionStream>,
}

impl NotificationSubscriber {
    pub async fn subscribe(client: &mut UserManagementClient<Channel>) -> Result<Self> {
        let stream = client
            .notify_user_changes(EmptyMsg {})
            .await
            .map_err(|status| NetworkError::RequestRejected(status.to_string()))?
            .into_inner();
        Ok(Self { stream })
    }

    /// Next notification text, or `None` once the service ends the stream.
    pub async fn next_action(&mut self) -> std::result::Result<Option<String>, tonic::Status> {
        Ok(self.stream.message().await?.map(|m| m.action))
    }
}
