//! Interpretation of caller-supplied user identifiers.
//!
//! Get, Update and Delete accept a single opaque `user_id`. A string that is
//! a well-formed email address selects by email; anything else is treated as
//! a native record key.
mod resolver;
pub use resolver::*;
