use crate::config::network::ConnectionParams;
use crate::config::network::NetworkConfig;
use crate::Error;

fn valid_base_params() -> ConnectionParams {
    ConnectionParams {
        connect_timeout_in_ms: 100,
        request_timeout_in_ms: 200,
        concurrency_limit: 10,
        max_concurrent_streams: 100,
        tcp_keepalive_in_secs: 300,
        http2_keep_alive_interval_in_secs: 60,
        http2_keep_alive_timeout_in_secs: 30,
    }
}

#[test]
fn test_network_config_default_values() {
    let config = NetworkConfig::default();

    assert!(config.tcp_nodelay);
    assert!(!config.send_compressed);
    assert_eq!(config.rpc.connect_timeout_in_ms, 1000);
    assert_eq!(config.rpc.request_timeout_in_ms, 5000);
    assert_eq!(config.rpc.concurrency_limit, 8192);
    assert_eq!(config.rpc.max_concurrent_streams, 500);
    assert_eq!(config.rpc.http2_keep_alive_interval_in_secs, 300);
    assert_eq!(config.rpc.http2_keep_alive_timeout_in_secs, 20);
    assert!(config.validate().is_ok());
}

#[test]
fn test_valid_params_pass_validation() {
    assert!(valid_base_params().validate("rpc").is_ok());
}

#[test]
fn test_zero_connect_timeout_is_rejected() {
    let params = ConnectionParams {
        connect_timeout_in_ms: 0,
        ..valid_base_params()
    };

    let result = params.validate("rpc");
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
fn test_request_timeout_must_exceed_connect_timeout() {
    let params = ConnectionParams {
        request_timeout_in_ms: 100,
        ..valid_base_params()
    };

    let err = params.validate("rpc").unwrap_err();
    assert!(err.to_string().contains("must exceed connect timeout"));
}

#[test]
fn test_keepalive_timeout_must_be_below_interval() {
    let params = ConnectionParams {
        http2_keep_alive_interval_in_secs: 30,
        http2_keep_alive_timeout_in_secs: 30,
        ..valid_base_params()
    };

    let err = params.validate("rpc").unwrap_err();
    assert!(err.to_string().contains("keepalive timeout"));
}

#[test]
fn test_zero_concurrency_is_rejected() {
    let params = ConnectionParams {
        concurrency_limit: 0,
        ..valid_base_params()
    };

    assert!(params.validate("rpc").is_err());
}
