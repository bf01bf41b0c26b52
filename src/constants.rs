/// Sled tree holding encoded user documents keyed by record key
pub(crate) const USERS_TREE: &str = "users";

/// Sled tree mapping email addresses to record keys
pub(crate) const USERS_BY_EMAIL_TREE: &str = "users_by_email";

/// Length of a native record key
pub(crate) const RECORD_KEY_LEN: usize = 24;

pub(crate) const RECORD_KEY_ALPHABET: [char; 16] = [
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'a', 'b', 'c', 'd', 'e', 'f',
];
