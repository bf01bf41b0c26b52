use std::fmt::Display;

use serde::Deserialize;
use serde::Serialize;

use crate::constants::RECORD_KEY_ALPHABET;
use crate::constants::RECORD_KEY_LEN;

/// Characters allowed in an unquoted local part besides ASCII alphanumerics
const ATEXT_SPECIALS: &str = "!#$%&'*+-/=?^_`{|}~";
const MAX_LOCAL_PART_LEN: usize = 64;
const MAX_DOMAIN_LEN: usize = 253;
const MAX_LABEL_LEN: usize = 63;

/// Store-assigned identifier of a user record: 24 lowercase hex characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordKey(String);

impl RecordKey {
    /// Generates a fresh random key.
    pub fn generate() -> Self {
        Self(nanoid::nanoid!(RECORD_KEY_LEN, &RECORD_KEY_ALPHABET))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// A key that is not in native encoding can never match a stored record.
    pub fn is_well_formed(&self) -> bool {
        self.0.len() == RECORD_KEY_LEN && self.0.chars().all(|c| RECORD_KEY_ALPHABET.contains(&c))
    }
}

impl From<&str> for RecordKey {
    fn from(raw: &str) -> Self {
        Self(raw.to_ascii_lowercase())
    }
}

impl Display for RecordKey {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which record a Get, Update or Delete request addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupPredicate {
    ByEmail(String),
    ByRecordKey(RecordKey),
}

impl LookupPredicate {
    /// The identifier exactly as it selects the record.
    pub fn subject(&self) -> &str {
        match self {
            LookupPredicate::ByEmail(email) => email,
            LookupPredicate::ByRecordKey(key) => key.as_str(),
        }
    }
}

impl Display for LookupPredicate {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            LookupPredicate::ByEmail(email) => write!(f, "email={email}"),
            LookupPredicate::ByRecordKey(key) => write!(f, "key={key}"),
        }
    }
}

/// Turns a caller-supplied identifier into a lookup predicate.
///
/// Never fails: a string that is neither a valid email nor a well-formed key
/// still becomes a `ByRecordKey` predicate, which then matches nothing.
pub fn resolve(identifier: &str) -> LookupPredicate {
    if is_valid_email(identifier) {
        LookupPredicate::ByEmail(identifier.to_string())
    } else {
        LookupPredicate::ByRecordKey(RecordKey::from(identifier))
    }
}

/// Bare `local@domain` address check.
///
/// The local part is a dot-separated sequence of atoms; the domain is a
/// dot-separated sequence of hostname labels. Display names, quoted local
/// parts and address literals are rejected.
pub fn is_valid_email(candidate: &str) -> bool {
    let Some((local, domain)) = candidate.rsplit_once('@') else {
        return false;
    };

    is_valid_local_part(local) && is_valid_domain(domain)
}

fn is_valid_local_part(local: &str) -> bool {
    !local.is_empty()
        && local.len() <= MAX_LOCAL_PART_LEN
        && local
            .split('.')
            .all(|atom| !atom.is_empty() && atom.chars().all(is_atext))
}

fn is_atext(c: char) -> bool {
    c.is_ascii_alphanumeric() || ATEXT_SPECIALS.contains(c)
}

fn is_valid_domain(domain: &str) -> bool {
    !domain.is_empty() && domain.len() <= MAX_DOMAIN_LEN && domain.split('.').all(is_valid_label)
}

fn is_valid_label(label: &str) -> bool {
    !label.is_empty()
        && label.len() <= MAX_LABEL_LEN
        && !label.starts_with('-')
        && !label.ends_with('-')
        && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}
