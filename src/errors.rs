//! User Management Service Error Hierarchy
//!
//! Caller-visible failures live in [`UserError`] and map one-to-one onto gRPC
//! status codes. Infrastructure failures (storage, network, configuration) are
//! classified separately and reach callers as `Unavailable`.

use std::path::PathBuf;

use config::ConfigError;
use tokio::task::JoinError;
use tonic::Status;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Request-level failures surfaced to RPC callers
    #[error(transparent)]
    User(#[from] UserError),

    /// Infrastructure-level failures (network, storage, serialization)
    #[error(transparent)]
    System(#[from] SystemError),

    /// Service configuration loading and validation failures
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Failure categories visible to CRUD callers and subscribers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserError {
    /// Malformed email address
    #[error("Invalid email address: {0}")]
    InvalidInput(String),

    /// Email already registered by another record
    #[error("Email already registered: {0}")]
    Conflict(String),

    /// Lookup key matches no record
    #[error("User not found: {0}")]
    NotFound(String),

    /// Storage or collaborator failure
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// Subscriber went away mid-stream
    #[error("Cancelled: {0}")]
    Cancelled(String),
}

#[derive(Debug, thiserror::Error)]
pub enum SystemError {
    // Network layer
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    // Storage layer
    #[error("Storage operation failed: {0}")]
    Storage(#[from] StorageError),

    // Basic node operations
    #[error("Node failed to start: {0}")]
    NodeStartFailed(String),

    #[error("Internal server error")]
    ServerUnavailable,
}

#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    /// gRPC transport layer errors
    #[error(transparent)]
    TonicError(#[from] Box<tonic::transport::Error>),

    /// Malformed service addresses
    #[error("Invalid URI format: {0}")]
    InvalidURI(String),

    /// TLS material could not be loaded or generated
    #[error("TLS setup failed: {0}")]
    Tls(String),

    /// Listener could not be bound or configured
    #[error("Listener setup failed: {0}")]
    BindFailed(String),

    /// The service answered an RPC with a non-OK status
    #[error("Request rejected: {0}")]
    RequestRejected(String),

    #[error("Background task failed: {0}")]
    TaskFailed(#[from] JoinError),

    #[error("{0}")]
    SignalSendFailed(String),
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Disk I/O failures
    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error("Error occurred at path: {path}")]
    PathError {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Serialization failures for persisted documents
    #[error(transparent)]
    BincodeError(#[from] bincode::Error),

    /// Embedded database errors
    #[error("Embedded database error: {0}")]
    DbError(String),

    /// Document or index entry that cannot be decoded
    #[error("Data corruption detected at {location}")]
    DataCorruption { location: String },
}

// ============== Conversion Implementations ============== //
impl From<NetworkError> for Error {
    fn from(e: NetworkError) -> Self {
        Error::System(SystemError::Network(e))
    }
}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Error::System(SystemError::Storage(e))
    }
}

impl From<tonic::transport::Error> for Error {
    fn from(err: tonic::transport::Error) -> Self {
        NetworkError::TonicError(Box::new(err)).into()
    }
}

impl From<sled::Error> for Error {
    fn from(err: sled::Error) -> Self {
        StorageError::DbError(err.to_string()).into()
    }
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        StorageError::BincodeError(err).into()
    }
}

impl From<JoinError> for Error {
    fn from(err: JoinError) -> Self {
        NetworkError::TaskFailed(err).into()
    }
}

// ============== RPC boundary ============== //
impl From<UserError> for Status {
    fn from(e: UserError) -> Self {
        let message = e.to_string();
        match e {
            UserError::InvalidInput(_) => Status::invalid_argument(message),
            UserError::Conflict(_) => Status::already_exists(message),
            UserError::NotFound(_) => Status::not_found(message),
            UserError::Unavailable(_) => Status::unavailable(message),
            UserError::Cancelled(_) => Status::cancelled(message),
        }
    }
}

impl From<Error> for Status {
    fn from(e: Error) -> Self {
        match e {
            Error::User(user_error) => user_error.into(),
            other => Status::unavailable(other.to_string()),
        }
    }
}

impl Error {
    /// Returns the caller-visible category, if this error carries one.
    pub fn user_error(&self) -> Option<&UserError> {
        match self {
            Error::User(e) => Some(e),
            _ => None,
        }
    }
}
