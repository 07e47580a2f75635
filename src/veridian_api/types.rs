use serde::{Deserialize, Serialize};
use std::fmt;

/// Status message the API uses for a completed session or SAML request.
pub(crate) const STATUS_MESSAGE_SUCCESS: &str = "Success";
/// Status message the API uses when a second factor is still outstanding.
pub(crate) const STATUS_MESSAGE_MFA_REQUIRED: &str = "MFA is required for this user";

/// Veridian API error type
///
/// Every failed request is classified into exactly one of these variants:
/// a transport-level fault, a non-success HTTP status, a response body that
/// does not match the documented envelope, or a request that could not be
/// issued at all.
#[derive(Debug)]
pub enum ApiError {
    /// Network error (connection, timeout, TLS)
    Network(String),
    /// Non-success HTTP status returned by the API
    Http { status: u16, message: String },
    /// A 200 response whose body does not match the expected envelope
    Shape(String),
    /// The request could not be built or issued
    Request(String),
}

impl ApiError {
    /// Legacy two-field error view: the status code as a string.
    ///
    /// Transport and shape faults carry no HTTP status and are reported
    /// as "500", matching the wire-level normalization of the API.
    pub fn code(&self) -> String {
        match self {
            ApiError::Http { status, .. } => status.to_string(),
            _ => "500".to_string(),
        }
    }

    /// Legacy two-field error view: the human-readable description.
    pub fn description(&self) -> String {
        match self {
            ApiError::Network(msg) => msg.clone(),
            ApiError::Http { message, .. } => message.clone(),
            ApiError::Shape(msg) => msg.clone(),
            ApiError::Request(msg) => msg.clone(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Network(msg) => write!(f, "Network error: {}", msg),
            ApiError::Http { status, message } => {
                write!(f, "HTTP {} error: {}", status, message)
            }
            ApiError::Shape(msg) => write!(f, "Unexpected response shape: {}", msg),
            ApiError::Request(msg) => write!(f, "Request error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Network("Request timeout".to_string())
        } else if err.is_connect() {
            ApiError::Network(format!("Connection failed: {}", err))
        } else if err.is_builder() {
            ApiError::Request(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

/// Status block present on every JSON envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseStatus {
    #[serde(default)]
    pub error: Option<bool>,
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(rename = "type", default)]
    pub status_type: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ResponseStatus {
    pub fn is_success(&self) -> bool {
        self.status_type.as_deref() == Some("success")
    }
}

/// Pagination block of a list envelope; `after_cursor` is the opaque
/// continuation token, absent on the final page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageInfo {
    #[serde(default)]
    pub before_cursor: Option<String>,
    #[serde(default)]
    pub after_cursor: Option<String>,
    #[serde(default)]
    pub previous_link: Option<String>,
    #[serde(default)]
    pub next_link: Option<String>,
}

/// Envelope shape used by boolean operations, where only the status block
/// matters to the caller.
#[derive(Debug, Deserialize)]
pub(crate) struct StatusEnvelope {
    #[serde(default)]
    pub status: Option<ResponseStatus>,
}

/// Best-effort extraction of `status.message` (or `status.type`) from a
/// response body, used to describe HTTP-status faults. Returns an empty
/// string for absent or unparsable bodies.
pub(crate) fn extract_status_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            let status = value.get("status")?;
            status
                .get("message")
                .and_then(|m| m.as_str())
                .or_else(|| status.get("type").and_then(|t| t.as_str()))
                .map(|s| s.to_string())
        })
        .unwrap_or_default()
}

/// User summary carried inside session and MFA responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: i64,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub firstname: Option<String>,
    #[serde(default)]
    pub lastname: Option<String>,
}

/// A registered second-factor device offered during an MFA challenge
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MfaDevice {
    pub device_id: i64,
    pub device_type: String,
}

/// Plain session issued when no second factor is required
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionToken {
    pub session_token: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub expires_at: Option<String>,
    #[serde(default)]
    pub return_to_url: Option<String>,
    #[serde(default)]
    pub user: Option<SessionUser>,
}

/// MFA challenge carrying the state and device tokens needed for the
/// follow-up verification call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MfaChallenge {
    pub state_token: String,
    #[serde(default)]
    pub devices: Vec<MfaDevice>,
    #[serde(default)]
    pub callback_url: Option<String>,
    #[serde(default)]
    pub user: Option<SessionUser>,
}

/// Outcome of a session login call, discriminated on `status.message`
#[derive(Debug, Clone)]
pub enum SessionResponse {
    /// Login completed; a session token was issued
    Session(SessionToken),
    /// A second factor must be verified before a session is issued
    MfaRequired(MfaChallenge),
}

#[derive(Debug, Deserialize)]
struct DiscriminatedEnvelope {
    status: ResponseStatus,
    #[serde(default)]
    data: serde_json::Value,
}

impl SessionResponse {
    /// Parses the session-token envelope. Any `status.message` other than
    /// the two documented values indicates API contract drift and is
    /// escalated as a shape fault rather than silently swallowed.
    pub(crate) fn parse(body: &str) -> Result<Self, ApiError> {
        let envelope: DiscriminatedEnvelope = serde_json::from_str(body)
            .map_err(|e| ApiError::Shape(format!("malformed session envelope: {}", e)))?;
        match envelope.status.message.as_deref() {
            Some(STATUS_MESSAGE_SUCCESS) => {
                let session: SessionToken = first_data_record(envelope.data)?;
                Ok(SessionResponse::Session(session))
            }
            Some(STATUS_MESSAGE_MFA_REQUIRED) => {
                let challenge: MfaChallenge = first_data_record(envelope.data)?;
                Ok(SessionResponse::MfaRequired(challenge))
            }
            other => Err(ApiError::Shape(format!(
                "unrecognized session status message: {:?}",
                other.unwrap_or("<absent>")
            ))),
        }
    }
}

/// Outcome of a SAML assertion call, discriminated the same way as
/// session logins
#[derive(Debug, Clone)]
pub enum SamlResponse {
    /// Base64-encoded SAML assertion
    Assertion(String),
    /// A second factor must be verified before the assertion is issued
    MfaRequired(MfaChallenge),
}

impl SamlResponse {
    pub(crate) fn parse(body: &str) -> Result<Self, ApiError> {
        let envelope: DiscriminatedEnvelope = serde_json::from_str(body)
            .map_err(|e| ApiError::Shape(format!("malformed assertion envelope: {}", e)))?;
        match envelope.status.message.as_deref() {
            Some(STATUS_MESSAGE_SUCCESS) => match envelope.data {
                serde_json::Value::String(assertion) => Ok(SamlResponse::Assertion(assertion)),
                serde_json::Value::Array(items) => match items.into_iter().next() {
                    Some(serde_json::Value::String(assertion)) => {
                        Ok(SamlResponse::Assertion(assertion))
                    }
                    _ => Err(ApiError::Shape(
                        "assertion envelope carried no assertion string".to_string(),
                    )),
                },
                _ => Err(ApiError::Shape(
                    "assertion envelope carried no assertion string".to_string(),
                )),
            },
            Some(STATUS_MESSAGE_MFA_REQUIRED) => {
                let challenge: MfaChallenge = first_data_record(envelope.data)?;
                Ok(SamlResponse::MfaRequired(challenge))
            }
            other => Err(ApiError::Shape(format!(
                "unrecognized assertion status message: {:?}",
                other.unwrap_or("<absent>")
            ))),
        }
    }
}

fn first_data_record<T: serde::de::DeserializeOwned>(
    data: serde_json::Value,
) -> Result<T, ApiError> {
    let record = match data {
        serde_json::Value::Array(items) => items
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::Shape("envelope data array was empty".to_string()))?,
        serde_json::Value::Null => {
            return Err(ApiError::Shape("envelope carried no data".to_string()))
        }
        single => single,
    };
    serde_json::from_value(record)
        .map_err(|e| ApiError::Shape(format!("malformed data record: {}", e)))
}

/// Request payload for session login
#[derive(Debug, Clone, Serialize)]
pub struct SessionLoginRequest {
    pub username_or_email: String,
    pub password: String,
    pub subdomain: String,
    /// Comma-separated list of user fields to return with the session
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<String>,
}

/// Request payload for generating a SAML assertion
#[derive(Debug, Clone, Serialize)]
pub struct SamlAssertionRequest {
    pub username_or_email: String,
    pub password: String,
    pub app_id: String,
    pub subdomain: String,
}

/// Request payload for verifying a second factor against a pending
/// SAML assertion
#[derive(Debug, Clone, Serialize)]
pub struct VerifyFactorRequest {
    pub app_id: String,
    pub device_id: String,
    pub state_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub otp_token: Option<String>,
}
