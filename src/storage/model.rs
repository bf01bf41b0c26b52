use serde::Deserialize;
use serde::Serialize;

use crate::RecordKey;

/// The caller-supplied fields of a user record.
///
/// The password is stored exactly as supplied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub nickname: String,
    pub password: String,
    pub country: String,
}

impl UserProfile {
    /// Overwrites every field the patch sets to a non-empty value.
    ///
    /// Email is the natural identity of a record and is never changed here.
    pub fn apply_patch(
        &mut self,
        patch: &UserProfile,
    ) {
        overwrite_if_set(&mut self.first_name, &patch.first_name);
        overwrite_if_set(&mut self.last_name, &patch.last_name);
        overwrite_if_set(&mut self.nickname, &patch.nickname);
        overwrite_if_set(&mut self.password, &patch.password);
        overwrite_if_set(&mut self.country, &patch.country);
    }
}

fn overwrite_if_set(
    target: &mut String,
    value: &str,
) {
    if !value.is_empty() {
        *target = value.to_string();
    }
}

/// A persisted user document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub key: RecordKey,
    pub profile: UserProfile,
    /// Milliseconds since the Unix epoch
    pub created_at_ms: u64,
    /// Milliseconds since the Unix epoch
    pub updated_at_ms: u64,
}

/// Equality filter for List. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilter {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub nickname: Option<String>,
    pub country: Option<String>,
}

impl UserFilter {
    /// Builds a filter from a profile template, ignoring empty fields and the password.
    pub fn from_template(template: &UserProfile) -> Self {
        Self {
            first_name: non_empty(&template.first_name),
            last_name: non_empty(&template.last_name),
            email: non_empty(&template.email),
            nickname: non_empty(&template.nickname),
            country: non_empty(&template.country),
        }
    }

    pub fn matches(
        &self,
        profile: &UserProfile,
    ) -> bool {
        field_matches(&self.first_name, &profile.first_name)
            && field_matches(&self.last_name, &profile.last_name)
            && field_matches(&self.email, &profile.email)
            && field_matches(&self.nickname, &profile.nickname)
            && field_matches(&self.country, &profile.country)
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

fn field_matches(
    expected: &Option<String>,
    actual: &str,
) -> bool {
    expected.as_deref().map_or(true, |e| e == actual)
}
