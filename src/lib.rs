//! gRPC user-record service with a best-effort change-notification stream.
//!
//! Users are created, read, updated, deleted and listed over the
//! `UserManagement` gRPC service and persisted in an embedded sled store.
//! Every successful mutation (and, by default, every successful read)
//! publishes a one-line notification that connected `NotifyUserChanges`
//! subscribers compete to receive.
mod client;
mod config;
mod constants;
mod errors;
mod identifier;
mod metrics;
mod network;
mod node;
mod notification;
mod storage;
pub mod proto;
pub mod utils;

pub use client::*;
pub use config::*;
pub use errors::*;
pub use identifier::*;
pub use metrics::*;
pub use network::*;
pub use node::*;
pub use notification::*;
pub use storage::*;

//-----------------------------------------------------------
// Test utils

#[cfg(test)]
pub mod test_utils;
//-----------------------------------------------------------
// Autometrics
/// autometrics: https://docs.autometrics.dev/rust/adding-alerts-and-slos
use autometrics::objectives::Objective;
use autometrics::objectives::ObjectiveLatency;
use autometrics::objectives::ObjectivePercentile;
const API_SLO: Objective = Objective::new("api")
    .success_rate(ObjectivePercentile::P99_9)
    .latency(ObjectiveLatency::Ms10, ObjectivePercentile::P99);
