//! HTTP client for the policy-management server's web API.
//!
//! Wraps the server's command-style API (`POST /web_api/<command>`) with
//! session authentication, structured failure parsing, and the failure-message
//! classifier the reconciliation engine relies on to tell a name collision
//! from an identity collision.

pub mod classify;
pub mod client;
pub mod error;

pub use classify::{classify_failure, FailureKind};
pub use client::{MgmtClient, ServerObject};
pub use error::{ApiError, ApiFailure, ApiMessage, ApiResult};
