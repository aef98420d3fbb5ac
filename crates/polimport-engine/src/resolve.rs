//! Collision resolution for object creation.
//!
//! A creation that fails can mean three different things: the name is taken
//! (retry under a derived name), the identity already exists (reuse the
//! server's object), or the object is simply unacceptable (skip it). The
//! helpers here drive those loops against [`MgmtClient`], leaving the
//! payloads and reporting to the callers.

use polimport_api::{classify_failure, ApiError, FailureKind, MgmtClient, ServerObject};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{EngineError, EngineResult};

/// How name collisions are retried.
#[derive(Debug, Clone)]
pub struct RenamePolicy {
    /// Upper bound on rename attempts before the object is given up on.
    pub max_attempts: u32,
    /// Hard cap on the candidate name length, truncating the stem to fit.
    pub name_limit: Option<usize>,
    /// First numeric postfix to try.
    pub initial_postfix: u32,
}

impl Default for RenamePolicy {
    fn default() -> Self {
        Self {
            max_attempts: 100,
            name_limit: None,
            initial_postfix: 1,
        }
    }
}

impl RenamePolicy {
    #[must_use]
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_name_limit(mut self, limit: usize) -> Self {
        self.name_limit = Some(limit);
        self
    }
}

/// Derive the candidate name for a rename attempt. Postfix 0 means the
/// original name; the stem is truncated so the postfixed form fits within
/// the policy's name limit. The limit counts characters, matching the
/// server's name-length constraint.
#[must_use]
pub fn candidate_name(original: &str, postfix: u32, limit: Option<usize>) -> String {
    let suffix = if postfix == 0 {
        String::new()
    } else {
        format!("_{postfix}")
    };
    let name = format!("{original}{suffix}");
    match limit {
        Some(limit) if name.chars().count() > limit => {
            let keep = limit.saturating_sub(suffix.chars().count());
            let stem: String = original.chars().take(keep).collect();
            format!("{stem}{suffix}")
        }
        _ => name,
    }
}

/// What became of one source object.
#[derive(Debug)]
pub enum Outcome {
    /// A new object was created, possibly under a derived name.
    Created {
        name: String,
        uid: Option<String>,
        body: Value,
    },
    /// An existing server object was reused instead of creating one.
    Merged { name: String, uid: Option<String> },
    /// The server rejected the object; the run continues without it.
    Skipped,
}

/// Create an object, retrying name collisions under derived names.
///
/// The payload's `name` field is rewritten per attempt; the caller's value
/// is never touched. Failures other than a name collision skip the object.
pub async fn create_with_rename(
    client: &MgmtClient,
    command: &str,
    payload: &Value,
    policy: &RenamePolicy,
) -> EngineResult<Outcome> {
    let original = payload
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let mut postfix = 0;
    let mut attempts = 0;
    loop {
        let name = candidate_name(&original, postfix, policy.name_limit);
        let mut attempt = payload.clone();
        attempt["name"] = Value::String(name.clone());

        match client.call(command, &attempt).await {
            Ok(body) => {
                if name != original {
                    debug!(original = %original, renamed = %name, "created under derived name");
                }
                let uid = body.get("uid").and_then(Value::as_str).map(str::to_string);
                return Ok(Outcome::Created { name, uid, body });
            }
            Err(ApiError::Call(failure)) => match classify_failure(&failure) {
                FailureKind::NameCollision => {
                    attempts += 1;
                    if attempts >= policy.max_attempts {
                        return Err(EngineError::RenameExhausted {
                            name: original,
                            attempts,
                        });
                    }
                    postfix = if postfix == 0 {
                        policy.initial_postfix
                    } else {
                        postfix + 1
                    };
                }
                _ => {
                    for line in failure.lines() {
                        warn!(object = %original, detail = %line, "object rejected");
                    }
                    return Ok(Outcome::Skipped);
                }
            },
            Err(e) => return Err(EngineError::Api(e)),
        }
    }
}

/// Create an object whose identity the server may already hold, reusing
/// the existing object on an identity collision.
///
/// On an identity warning the server is queried for the colliding objects;
/// if one matches, it is reused. If the warning turns out spurious (the
/// query finds nothing) the creation is retried once with warnings
/// suppressed. Name collisions still go through the rename loop.
#[allow(clippy::too_many_arguments)]
pub async fn create_with_identity_merge(
    client: &MgmtClient,
    command: &str,
    object_type: &str,
    identity_filter: &str,
    expect_subnet: Option<(&str, &str)>,
    payload: &Value,
    policy: &RenamePolicy,
    global_first: bool,
) -> EngineResult<Outcome> {
    let original = payload
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let mut ignore_warnings = false;
    let mut postfix = 0;
    let mut attempts = 0;
    loop {
        let name = candidate_name(&original, postfix, policy.name_limit);
        let mut attempt = payload.clone();
        attempt["name"] = Value::String(name.clone());
        if ignore_warnings {
            attempt["ignore-warnings"] = Value::Bool(true);
        }

        match client.call(command, &attempt).await {
            Ok(body) => {
                if name != original {
                    debug!(original = %original, renamed = %name, "created under derived name");
                }
                let uid = body.get("uid").and_then(Value::as_str).map(str::to_string);
                return Ok(Outcome::Created { name, uid, body });
            }
            Err(ApiError::Call(failure)) => match classify_failure(&failure) {
                FailureKind::IdentityCollision if !ignore_warnings => {
                    let matches = match client.query_objects(identity_filter, object_type).await {
                        Ok(matches) => matches,
                        // A rejected lookup is terminal for this object
                        // only; the pass continues.
                        Err(ApiError::Call(failure)) => {
                            for line in failure.lines() {
                                warn!(object = %original, detail = %line, "identity lookup rejected");
                            }
                            return Ok(Outcome::Skipped);
                        }
                        Err(e) => return Err(EngineError::Api(e)),
                    };
                    match select_identity_match(&matches, expect_subnet, global_first) {
                        Some(existing) => {
                            debug!(
                                object = %original,
                                existing = %existing.name,
                                "identity already present, reusing server object"
                            );
                            return Ok(Outcome::Merged {
                                name: existing.name.clone(),
                                uid: existing.uid.clone(),
                            });
                        }
                        None => {
                            // Spurious warning: nothing actually matched.
                            ignore_warnings = true;
                        }
                    }
                }
                FailureKind::NameCollision => {
                    attempts += 1;
                    if attempts >= policy.max_attempts {
                        return Err(EngineError::RenameExhausted {
                            name: original,
                            attempts,
                        });
                    }
                    postfix = if postfix == 0 {
                        policy.initial_postfix
                    } else {
                        postfix + 1
                    };
                }
                _ => {
                    for line in failure.lines() {
                        warn!(object = %original, detail = %line, "object rejected");
                    }
                    return Ok(Outcome::Skipped);
                }
            },
            Err(e) => return Err(EngineError::Api(e)),
        }
    }
}

/// Pick the server object to reuse among identity-collision candidates:
/// the exact-subnet matches when a subnet is expected, then the preferred
/// scope, then whatever came first.
fn select_identity_match<'a>(
    candidates: &'a [ServerObject],
    expect_subnet: Option<(&str, &str)>,
    global_first: bool,
) -> Option<&'a ServerObject> {
    let eligible: Vec<&ServerObject> = match expect_subnet {
        Some((subnet, mask)) => candidates
            .iter()
            .filter(|c| {
                c.field_str("subnet4").as_deref() == Some(subnet)
                    && c.field_str("subnet-mask").as_deref() == Some(mask)
            })
            .collect(),
        None => candidates.iter().collect(),
    };

    let preferred = if global_first {
        eligible.iter().find(|c| c.is_global())
    } else {
        eligible.iter().find(|c| c.is_local())
    };
    preferred.copied().or_else(|| eligible.first().copied())
}
