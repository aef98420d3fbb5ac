//! Command-style HTTP client for the management server.
//!
//! Every operation is a `POST {base}/web_api/{command}` with a JSON body;
//! authentication is a session id obtained from `login` and replayed in the
//! `X-chkp-sid` header on every subsequent call.

use crate::error::{ApiError, ApiFailure, ApiResult};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::time::Duration;
use tracing::{debug, warn};

/// Page size for paginated `show-*` enumerations (the server's listing cap).
const SHOW_PAGE_SIZE: u64 = 500;

/// An object as stored on the server: name, stable uid, scope, and the raw
/// kind-specific identity fields.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerObject {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(default)]
    pub domain: Option<DomainInfo>,
    /// Kind-specific fields (`port`, `icmp-type`, `subnet4`, ...) kept raw.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// Scope attribute of a server object.
#[derive(Debug, Clone, Deserialize)]
pub struct DomainInfo {
    #[serde(rename = "domain-type", default)]
    pub domain_type: String,
}

impl ServerObject {
    /// Whether the object lives in the shared global domain.
    #[must_use]
    pub fn is_global(&self) -> bool {
        self.domain
            .as_ref()
            .is_some_and(|d| d.domain_type == "global domain")
    }

    /// Whether the object lives in the local administrative domain.
    #[must_use]
    pub fn is_local(&self) -> bool {
        self.domain
            .as_ref()
            .is_some_and(|d| d.domain_type == "domain")
    }

    /// A kind-specific field by its wire name.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// A kind-specific field rendered as a plain string (numbers included).
    #[must_use]
    pub fn field_str(&self, key: &str) -> Option<String> {
        match self.fields.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// HTTP client for the management server's web API.
#[derive(Debug)]
pub struct MgmtClient {
    base_url: String,
    http_client: Client,
    sid: Option<String>,
}

impl MgmtClient {
    /// Build a client for the given server.
    ///
    /// `tls_verify: false` accepts the self-signed certificates management
    /// servers commonly ship with.
    pub fn new(base_url: &str, timeout: Duration, tls_verify: bool) -> ApiResult<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(!tls_verify)
            .user_agent("polimport/0.1")
            .build()
            .map_err(|e| ApiError::InvalidConfig(format!("failed to build HTTP client: {e}")))?;

        Ok(Self::with_http_client(base_url, http_client))
    }

    /// Build a client around a pre-built `reqwest::Client` (for tests).
    #[must_use]
    pub fn with_http_client(base_url: &str, http_client: Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http_client,
            sid: None,
        }
    }

    /// The server base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ── Session ───────────────────────────────────────────────────────

    /// Open an authenticated session.
    pub async fn login(
        &mut self,
        user: &str,
        password: &str,
        domain: Option<&str>,
    ) -> ApiResult<()> {
        let mut payload = json!({ "user": user, "password": password });
        if let Some(domain) = domain {
            payload["domain"] = Value::String(domain.to_string());
        }

        let body = self
            .post("login", &payload)
            .await
            .map_err(|e| ApiError::AuthFailed(e.to_string()))?;

        let sid = body
            .get("sid")
            .and_then(Value::as_str)
            .ok_or_else(|| ApiError::AuthFailed("login response carried no session id".into()))?;
        self.sid = Some(sid.to_string());
        debug!(base_url = %self.base_url, "session established");
        Ok(())
    }

    /// Close the session. Failures are logged, not propagated — the run is
    /// already over when this is called.
    pub async fn logout(&mut self) {
        if self.sid.is_some() {
            if let Err(e) = self.post("logout", &json!({})).await {
                warn!(error = %e, "logout failed");
            }
            self.sid = None;
        }
    }

    // ── Commands ──────────────────────────────────────────────────────

    /// Issue one API command with the given payload.
    pub async fn call(&self, command: &str, payload: &Value) -> ApiResult<Value> {
        self.post(command, payload).await
    }

    /// Query existing objects by their IP identity value (`show-objects`
    /// with `ip-only` matching).
    pub async fn query_objects(
        &self,
        filter: &str,
        object_type: &str,
    ) -> ApiResult<Vec<ServerObject>> {
        let body = self
            .post(
                "show-objects",
                &json!({
                    "filter": filter,
                    "ip-only": true,
                    "type": object_type,
                    "details-level": "full",
                }),
            )
            .await?;
        parse_objects(&body)
    }

    /// Enumerate every object a `show-*` listing command exposes, following
    /// the server's offset pagination until `total` is reached.
    pub async fn show_all(&self, command: &str) -> ApiResult<Vec<ServerObject>> {
        let mut all = Vec::new();
        let mut offset: u64 = 0;

        loop {
            let body = self
                .post(
                    command,
                    &json!({
                        "offset": offset,
                        "limit": SHOW_PAGE_SIZE,
                        "details-level": "full",
                    }),
                )
                .await?;

            let page = parse_objects(&body)?;
            let fetched = page.len() as u64;
            all.extend(page);

            let total = body.get("total").and_then(Value::as_u64).unwrap_or(0);
            offset += fetched;
            if fetched < SHOW_PAGE_SIZE || offset >= total {
                break;
            }
        }

        Ok(all)
    }

    /// Commit all pending changes on the server.
    pub async fn publish(&self) -> ApiResult<()> {
        self.post("publish", &json!({})).await?;
        Ok(())
    }

    // ── Internal HTTP ─────────────────────────────────────────────────

    async fn post(&self, command: &str, payload: &Value) -> ApiResult<Value> {
        let url = format!("{}/web_api/{}", self.base_url, command);
        debug!(%command, "API POST");

        let mut builder = self.http_client.post(&url).json(payload);
        if let Some(sid) = &self.sid {
            builder = builder.header("X-chkp-sid", sid);
        }
        let response = builder.send().await?;

        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            serde_json::from_str(&body)
                .map_err(|e| ApiError::Parse(format!("invalid response body: {e}")))
        } else {
            // Failure bodies are structured; anything unparseable is folded
            // into a failure carrying the raw text.
            let failure: ApiFailure =
                serde_json::from_str(&body).unwrap_or_else(|_| ApiFailure {
                    message: if body.is_empty() {
                        format!("HTTP {status}")
                    } else {
                        body
                    },
                    ..ApiFailure::default()
                });
            Err(ApiError::Call(failure))
        }
    }
}

fn parse_objects(body: &Value) -> ApiResult<Vec<ServerObject>> {
    let Some(objects) = body.get("objects") else {
        return Ok(Vec::new());
    };
    serde_json::from_value(objects.clone())
        .map_err(|e| ApiError::Parse(format!("invalid object list: {e}")))
}
