//! gRPC listener hosting the `UserManagement` service.
//!
//! Health checks and gzip are served alongside the user service; TLS and
//! mutual TLS are configured from [`crate::TlsConfig`].

mod user_service;
pub use user_service::*;


use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use rcgen::generate_simple_self_signed;
use rcgen::CertifiedKey;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tonic::codec::CompressionEncoding;
use tonic::transport::server::TcpIncoming;
use tonic::transport::Certificate;
use tonic::transport::Identity;
use tonic::transport::ServerTlsConfig;
use tonic_health::server::health_reporter;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::proto::user_management_server::UserManagementServer;
use crate::NetworkError;
use crate::Result;
use crate::SystemError;
use crate::TlsConfig;
use crate::UserServiceConfig;
use crate::UserStore;

/// Serves the user management RPCs on `listener` until `shutdown_signal` fires.
pub(crate) async fn start_rpc_server<S>(
    service: Arc<UserManagementService<S>>,
    listener: TcpListener,
    config: UserServiceConfig,
    mut shutdown_signal: watch::Receiver<()>,
) -> Result<()>
where
    S: UserStore,
{
    let listen_address = listener
        .local_addr()
        .map_err(|e| NetworkError::BindFailed(e.to_string()))?;

    // Create a HealthReporter to manage the health status
    let (mut health_reporter, health_service) = health_reporter();
    health_reporter
        .set_serving::<UserManagementServer<UserManagementService<S>>>()
        .await;

    let rpc_config = &config.network.rpc;
    let mut server_builder = tonic::transport::Server::builder()
        .timeout(Duration::from_millis(rpc_config.request_timeout_in_ms))
        .concurrency_limit_per_connection(rpc_config.concurrency_limit)
        .max_concurrent_streams(Some(rpc_config.max_concurrent_streams))
        .http2_keepalive_interval(Some(Duration::from_secs(
            rpc_config.http2_keep_alive_interval_in_secs,
        )))
        .http2_keepalive_timeout(Some(Duration::from_secs(
            rpc_config.http2_keep_alive_timeout_in_secs,
        )));

    if config.tls.enable_tls {
        server_builder = server_builder
            .tls_config(load_server_tls(&config.tls)?)
            .map_err(|e| NetworkError::Tls(e.to_string()))?;
        if config.tls.enable_mtls {
            info!("gRPC mTLS enabled");
        } else {
            info!("gRPC TLS enabled");
        }
    }

    let mut user_service = UserManagementServer::from_arc(service)
        .accept_compressed(CompressionEncoding::Gzip);
    if config.network.send_compressed {
        user_service = user_service.send_compressed(CompressionEncoding::Gzip);
    }

    let incoming = TcpIncoming::from_listener(
        listener,
        config.network.tcp_nodelay,
        Some(Duration::from_secs(rpc_config.tcp_keepalive_in_secs)),
    )
    .map_err(|e| NetworkError::BindFailed(e.to_string()))?;

    info!(%listen_address, "RPC server listening");
    if let Err(e) = server_builder
        .add_service(health_service)
        .add_service(user_service)
        .serve_with_incoming_shutdown(
            incoming,
            shutdown_signal.changed().map(move |_| {
                warn!("Stopping RPC server. {}", listen_address);
            }),
        )
        .await
    {
        error!("error to start rpc server :{:?}.", e);
        return Err(SystemError::ServerUnavailable.into());
    }
    debug!("rpc service finished!");
    Ok(())
}

fn load_server_tls(config: &TlsConfig) -> Result<ServerTlsConfig> {
    if config.generate_self_signed_certificates {
        if Path::new(&config.server_certificate_path).exists() {
            warn!("Server certificate already exists, remove the file if you want to generate new certificates. Skipping self signed certificates generation.");
        } else {
            info!("Generating self signed certificates");
            generate_self_signed_certificates(config)?;
        }
    }

    let cert = read_pem(&config.server_certificate_path)?;
    let key = read_pem(&config.server_private_key_path)?;
    let tls = ServerTlsConfig::new().identity(Identity::from_pem(cert, key));

    if config.enable_mtls {
        let client_ca_cert = read_pem(&config.client_certificate_authority_root_path)?;
        return Ok(tls.client_ca_root(Certificate::from_pem(client_ca_cert)));
    }
    Ok(tls)
}

fn read_pem(path: &str) -> Result<String> {
    std::fs::read_to_string(path)
        .map_err(|e| NetworkError::Tls(format!("failed to read {path}: {e}")).into())
}

fn generate_self_signed_certificates(config: &TlsConfig) -> Result<()> {
    let subject_alt_names = vec!["localhost".to_string()];
    let CertifiedKey { cert, key_pair } = generate_simple_self_signed(subject_alt_names)
        .map_err(|e| NetworkError::Tls(format!("certificate generation failed: {e}")))?;

    std::fs::write(&config.server_certificate_path, cert.pem())
        .map_err(|e| NetworkError::Tls(format!("failed to write server certificate: {e}")))?;
    std::fs::write(&config.server_private_key_path, key_pair.serialize_pem())
        .map_err(|e| NetworkError::Tls(format!("failed to write server private key: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_self_signed_certificates_are_loadable() {
        let dir = tempfile::tempdir().unwrap();
        let config = TlsConfig {
            enable_tls: true,
            generate_self_signed_certificates: true,
            server_certificate_path: dir.path().join("server.pem").to_string_lossy().into(),
            server_private_key_path: dir.path().join("server.key").to_string_lossy().into(),
            ..Default::default()
        };

        assert!(load_server_tls(&config).is_ok());
        assert!(Path::new(&config.server_certificate_path).exists());
        assert!(Path::new(&config.server_private_key_path).exists());
    }

    #[test]
    fn test_missing_certificates_are_reported() {
        let config = TlsConfig {
            enable_tls: true,
            server_certificate_path: "/nonexistent/server.pem".into(),
            ..Default::default()
        };

        let err = load_server_tls(&config).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/server.pem"));
    }
}
