//! Document store for user records on top of sled.
//!
//! Two trees are kept in step:
//! - `users`: record key -> bincode-encoded [`UserRecord`]
//! - `users_by_email`: email -> record key, enforcing email uniqueness
//!
//! Inserts and deletes touch both trees inside one sled transaction.

use std::path::Path;

use sled::transaction::ConflictableTransactionError;
use sled::transaction::TransactionError;
use sled::transaction::TransactionResult;
use sled::Transactional;
use tonic::async_trait;
use tracing::debug;
use tracing::info;
use tracing::warn;

use super::init_sled_user_db;
use crate::constants::USERS_BY_EMAIL_TREE;
use crate::constants::USERS_TREE;
use crate::is_valid_email;
use crate::utils::time::get_now_as_u64_millis;
use crate::Error;
use crate::LookupPredicate;
use crate::RecordKey;
use crate::Result;
use crate::StorageError;
use crate::UserError;
use crate::UserFilter;
use crate::UserProfile;
use crate::UserRecord;
use crate::UserStore;

pub struct SledUserStore {
    db: sled::Db,
    users: sled::Tree,
    users_by_email: sled::Tree,
}

impl std::fmt::Debug for SledUserStore {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("SledUserStore")
            .field("users", &self.users.len())
            .finish()
    }
}

impl SledUserStore {
    /// Opens the store below the configured database root.
    pub fn open(db_root_dir: impl AsRef<Path> + std::fmt::Debug) -> Result<Self> {
        let db = init_sled_user_db(db_root_dir).map_err(StorageError::IoError)?;
        Self::with_db(db)
    }

    pub fn with_db(db: sled::Db) -> Result<Self> {
        let users = db.open_tree(USERS_TREE)?;
        let users_by_email = db.open_tree(USERS_BY_EMAIL_TREE)?;
        info!(records = users.len(), "User store opened");

        Ok(Self {
            db,
            users,
            users_by_email,
        })
    }

    /// In-memory store discarded on drop.
    pub fn temporary() -> Result<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::with_db(db)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub async fn flush(&self) -> Result<()> {
        self.db.flush_async().await?;
        Ok(())
    }

    /// Finds the key of the record selected by `predicate`, if any.
    fn locate(
        &self,
        predicate: &LookupPredicate,
    ) -> Result<Option<RecordKey>> {
        match predicate {
            LookupPredicate::ByEmail(email) => match self.users_by_email.get(email.as_bytes())? {
                Some(raw_key) => {
                    decode_key(&raw_key, || format!("{USERS_BY_EMAIL_TREE}/{email}")).map(Some)
                }
                None => Ok(None),
            },
            LookupPredicate::ByRecordKey(key) => {
                if !key.is_well_formed() {
                    debug!(%key, "Malformed record key matches nothing");
                    return Ok(None);
                }
                if self.users.contains_key(key.as_str().as_bytes())? {
                    Ok(Some(key.clone()))
                } else {
                    Ok(None)
                }
            }
        }
    }

    fn locate_or_not_found(
        &self,
        predicate: &LookupPredicate,
    ) -> Result<RecordKey> {
        self.locate(predicate)?
            .ok_or_else(|| UserError::NotFound(predicate.subject().to_string()).into())
    }
}

#[async_trait]
impl UserStore for SledUserStore {
    async fn create_user(
        &self,
        profile: UserProfile,
    ) -> Result<RecordKey> {
        if !is_valid_email(&profile.email) {
            return Err(UserError::InvalidInput(profile.email).into());
        }

        let now = get_now_as_u64_millis();
        let record = UserRecord {
            key: RecordKey::generate(),
            profile,
            created_at_ms: now,
            updated_at_ms: now,
        };
        let encoded = encode_record(&record)?;
        let key = record.key.as_str().as_bytes();
        let email = record.profile.email.as_str();

        let result: TransactionResult<(), Error> = (&self.users, &self.users_by_email)
            .transaction(|(users, users_by_email)| {
                if users_by_email.get(email.as_bytes())?.is_some() {
                    return Err(ConflictableTransactionError::Abort(
                        UserError::Conflict(email.to_string()).into(),
                    ));
                }
                users.insert(key, encoded.as_slice())?;
                users_by_email.insert(email.as_bytes(), key)?;
                Ok(())
            });
        flatten_transaction_result(result)?;

        debug!(key = %record.key, "User record inserted");
        Ok(record.key)
    }

    async fn get_user(
        &self,
        predicate: &LookupPredicate,
    ) -> Result<UserRecord> {
        let key = self.locate_or_not_found(predicate)?;
        match self.users.get(key.as_str().as_bytes())? {
            Some(bytes) => decode_record(&key, &bytes),
            // Removed between index lookup and read
            None => Err(UserError::NotFound(predicate.subject().to_string()).into()),
        }
    }

    async fn update_user(
        &self,
        predicate: &LookupPredicate,
        patch: UserProfile,
    ) -> Result<UserRecord> {
        let key = self.locate_or_not_found(predicate)?;
        let subject = predicate.subject();
        let now = get_now_as_u64_millis();

        let result: TransactionResult<UserRecord, Error> = self.users.transaction(|users| {
            let Some(bytes) = users.get(key.as_str().as_bytes())? else {
                return Err(ConflictableTransactionError::Abort(
                    UserError::NotFound(subject.to_string()).into(),
                ));
            };
            let mut record =
                decode_record(&key, &bytes).map_err(ConflictableTransactionError::Abort)?;
            record.profile.apply_patch(&patch);
            record.updated_at_ms = now;

            let encoded = encode_record(&record).map_err(ConflictableTransactionError::Abort)?;
            users.insert(key.as_str().as_bytes(), encoded)?;
            Ok(record)
        });

        let updated = flatten_transaction_result(result)?;
        debug!(%key, "User record updated");
        Ok(updated)
    }

    async fn delete_user(
        &self,
        predicate: &LookupPredicate,
    ) -> Result<()> {
        let key = self.locate_or_not_found(predicate)?;
        let subject = predicate.subject();

        let result: TransactionResult<(), Error> = (&self.users, &self.users_by_email)
            .transaction(|(users, users_by_email)| {
                let Some(bytes) = users.remove(key.as_str().as_bytes())? else {
                    return Err(ConflictableTransactionError::Abort(
                        UserError::NotFound(subject.to_string()).into(),
                    ));
                };
                let record =
                    decode_record(&key, &bytes).map_err(ConflictableTransactionError::Abort)?;
                users_by_email.remove(record.profile.email.as_bytes())?;
                Ok(())
            });
        flatten_transaction_result(result)?;

        debug!(%key, "User record deleted");
        Ok(())
    }

    async fn list_users(
        &self,
        filter: &UserFilter,
    ) -> Result<Vec<UserRecord>> {
        let mut matched = Vec::new();
        for entry in self.users.iter() {
            let (raw_key, bytes) = entry?;
            let key = decode_key(&raw_key, || USERS_TREE.to_string())?;
            let record = decode_record(&key, &bytes)?;
            if filter.matches(&record.profile) {
                matched.push(record);
            }
        }

        matched.sort_by(|a, b| {
            a.created_at_ms
                .cmp(&b.created_at_ms)
                .then_with(|| a.key.cmp(&b.key))
        });
        Ok(matched)
    }
}

fn encode_record(record: &UserRecord) -> Result<Vec<u8>> {
    Ok(bincode::serialize(record)?)
}

fn decode_record(
    key: &RecordKey,
    bytes: &[u8],
) -> Result<UserRecord> {
    bincode::deserialize(bytes).map_err(|e| {
        warn!(%key, ?e, "Failed to decode user document");
        StorageError::DataCorruption {
            location: format!("{USERS_TREE}/{key}"),
        }
        .into()
    })
}

fn decode_key(
    raw: &[u8],
    location: impl FnOnce() -> String,
) -> Result<RecordKey> {
    std::str::from_utf8(raw)
        .map(RecordKey::from)
        .map_err(|_| StorageError::DataCorruption { location: location() }.into())
}

fn flatten_transaction_result<T>(result: TransactionResult<T, Error>) -> Result<T> {
    match result {
        Ok(value) => Ok(value),
        Err(TransactionError::Abort(e)) => Err(e),
        Err(TransactionError::Storage(e)) => Err(e.into()),
    }
}
