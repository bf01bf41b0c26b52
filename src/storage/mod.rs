//! Persistence of user records.
//!
//! [`UserStore`] is the seam between the RPC handlers and the document store.
//! The production implementation is [`SledUserStore`], which keeps every
//! document in an embedded sled database alongside a unique email index.
mod model;
mod sled_adapter;

pub use model::*;
pub use sled_adapter::*;

#[cfg(test)]
use mockall::automock;
use tonic::async_trait;

use crate::LookupPredicate;
use crate::RecordKey;
use crate::Result;

/// Document-store operations needed by the user management handlers.
///
/// Failures carry a [`crate::UserError`] when the caller is at fault
/// (invalid email, duplicate email, no matching record); everything else is
/// an infrastructure error.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait UserStore: Send + Sync + 'static {
    /// Inserts a new record and returns its assigned key.
    ///
    /// Rejects malformed emails with `InvalidInput` and duplicate emails with
    /// `Conflict`.
    async fn create_user(
        &self,
        profile: UserProfile,
    ) -> Result<RecordKey>;

    /// Fetches the record selected by the predicate.
    async fn get_user(
        &self,
        predicate: &LookupPredicate,
    ) -> Result<UserRecord>;

    /// Applies the non-empty fields of `patch` (email excluded) and returns
    /// the record as stored after the update.
    async fn update_user(
        &self,
        predicate: &LookupPredicate,
        patch: UserProfile,
    ) -> Result<UserRecord>;

    /// Removes the record selected by the predicate. `NotFound` if nothing matched.
    async fn delete_user(
        &self,
        predicate: &LookupPredicate,
    ) -> Result<()>;

    /// Returns every record matching the filter.
    async fn list_users(
        &self,
        filter: &UserFilter,
    ) -> Result<Vec<UserRecord>>;
}
