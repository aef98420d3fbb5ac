//! Failure-message classification.
//!
//! The server signals collisions through English diagnostic strings, not
//! stable error codes. The matching rules live here — and only here — so the
//! rest of the engine works with an enumerated kind and the fragile prefix
//! list stays unit-testable in one place.

use crate::error::ApiFailure;

/// What a failed creation attempt actually means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Another object with the same name exists. Recoverable by renaming.
    NameCollision,
    /// Another object with the same IP/subnet identity exists. Recoverable
    /// by reusing the existing server object.
    IdentityCollision,
    /// Anything else. Terminal for that object; the current prefix list is
    /// not assumed exhaustive, so unknown messages land here and are
    /// reported rather than retried.
    Other,
}

const IDENTITY_PREFIXES: &[&str] = &[
    "Multiple objects have the same IP address",
    "More than one network have the same IP",
    "More than one network has the same IP",
    "More than one object have the same IPv6",
    "More than one object has the same IPv6",
];

fn is_name_collision_message(message: &str) -> bool {
    message.starts_with("More than one object named") && message.ends_with("exists.")
}

fn is_identity_collision_message(message: &str) -> bool {
    IDENTITY_PREFIXES
        .iter()
        .any(|prefix| message.starts_with(prefix))
}

/// Classify a structured failure body.
///
/// Name collisions are reported in the `errors` list, identity collisions
/// in the `warnings` list. Identity collisions are checked first: an
/// identity match resolves to an existing server object without any
/// creation, so the name only matters when no identity match exists.
#[must_use]
pub fn classify_failure(failure: &ApiFailure) -> FailureKind {
    if failure
        .warnings
        .iter()
        .any(|m| is_identity_collision_message(&m.message))
    {
        return FailureKind::IdentityCollision;
    }
    if failure
        .errors
        .iter()
        .any(|m| is_name_collision_message(&m.message))
    {
        return FailureKind::NameCollision;
    }
    FailureKind::Other
}
