//! Protocol Buffer definitions and generated code for the user management service.
//!
//! Generated by [`tonic-build`] from `proto/user_management.proto` at build
//! time. Conversions between wire messages and the store's domain types live
//! here as well.

#[allow(clippy::all)]
mod generated {
    tonic::include_proto!("usermanagement");
}

pub use generated::*;

use crate::UserFilter;
use crate::UserProfile;
use crate::UserRecord;

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            nickname: user.nickname,
            password: user.password,
            country: user.country,
        }
    }
}

impl From<UserProfile> for User {
    fn from(profile: UserProfile) -> Self {
        Self {
            first_name: profile.first_name,
            last_name: profile.last_name,
            email: profile.email,
            nickname: profile.nickname,
            password: profile.password,
            country: profile.country,
        }
    }
}

impl From<UserRecord> for UserActionResponse {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.key.to_string(),
            user: Some(record.profile.into()),
            created_at: record.created_at_ms,
            updated_at: record.updated_at_ms,
        }
    }
}

impl ListUsersReq {
    /// An absent filter lists every record.
    pub fn to_filter(&self) -> UserFilter {
        match &self.filter {
            Some(template) => UserFilter::from_template(&UserProfile::from(template.clone())),
            None => UserFilter::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RecordKey;

    #[test]
    fn test_record_to_response() {
        let key = RecordKey::generate();
        let record = UserRecord {
            key: key.clone(),
            profile: UserProfile {
                email: "a@a.com".into(),
                nickname: "a".into(),
                ..Default::default()
            },
            created_at_ms: 10,
            updated_at_ms: 20,
        };

        let response = UserActionResponse::from(record);

        assert_eq!(response.id, key.as_str());
        assert_eq!(response.created_at, 10);
        assert_eq!(response.updated_at, 20);
        let user = response.user.unwrap();
        assert_eq!(user.email, "a@a.com");
        assert_eq!(user.nickname, "a");
    }

    #[test]
    fn test_list_request_without_filter_matches_all() {
        assert_eq!(ListUsersReq { filter: None }.to_filter(), UserFilter::default());

        let req = ListUsersReq {
            filter: Some(User {
                country: "UK".into(),
                ..Default::default()
            }),
        };
        assert_eq!(req.to_filter().country.as_deref(), Some("UK"));
        assert!(req.to_filter().email.is_none());
    }
}
