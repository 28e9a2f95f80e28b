use std::collections::HashMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::extract::cookies::{FBC_COOKIE, FBP_COOKIE};

/// Event name used when the client did not supply one.
pub const DEFAULT_EVENT_NAME: &str = "PageView";

/// Value of `action_source` for every event this relay emits: the tracked
/// actions always happen on a website.
pub const ACTION_SOURCE_WEBSITE: &str = "website";

/// Inbound tracking payload as posted by the web client.
///
/// Every field is optional; anything the client omits is derived from the
/// request (headers, cookies) or defaulted. Unknown fields are ignored so
/// pixel snippets can evolve ahead of the relay.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrackPayload {
    /// Upstream event name (e.g. "PageView", "Purchase")
    pub event_name: Option<String>,
    /// Seconds since epoch at which the event occurred
    pub event_time: Option<i64>,
    /// Client-chosen identifier, used upstream for deduplication
    pub event_id: Option<String>,
    /// Page the event happened on
    pub event_source_url: Option<String>,
    /// Legacy alias for the page URL, used as a last-resort fallback
    pub url: Option<String>,
    /// Browser user agent as seen by the client script
    pub user_agent: Option<String>,
    /// Explicit client IP override
    pub client_ip_address: Option<String>,
    /// First-party browser identifier
    pub fbp: Option<String>,
    /// Click identifier
    pub fbc: Option<String>,
}

/// Client signals extracted from the inbound HTTP request, used to fill
/// gaps in the payload.
#[derive(Debug, Clone, Default)]
pub struct ClientSignals {
    /// `Referer` header value
    pub referer: Option<String>,
    /// `User-Agent` header value
    pub user_agent: Option<String>,
    /// IP resolved from proxy/CDN headers
    pub client_ip: Option<String>,
    /// Decoded cookie jar
    pub cookies: HashMap<String, String>,
}

/// Identity sub-object of the outbound event.
///
/// Absent signals must be omitted entirely (never serialized as null):
/// the upstream API treats present-but-null keys as malformed match data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_ip_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_user_agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fbp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fbc: Option<String>,
}

/// A normalized server event, ready to relay upstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerEvent {
    pub event_name: String,
    pub event_time: i64,
    pub event_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_source_url: Option<String>,
    pub action_source: String,
    pub user_data: UserData,
}

impl ServerEvent {
    /// Build a normalized event from the client payload and request signals.
    ///
    /// # Defaulting Rules
    ///
    /// - `event_name`: payload, else `"PageView"`
    /// - `event_time`: payload, else current Unix time in seconds
    /// - `event_id`: payload, else a fresh UUIDv4 (cryptographic RNG;
    ///   the upstream API deduplicates on it)
    /// - `event_source_url`: payload `event_source_url` -> `Referer`
    ///   header -> payload `url`
    /// - `user_data.client_user_agent`: `User-Agent` header -> payload
    /// - `user_data.client_ip_address`: resolved request IP -> payload
    /// - `user_data.fbp`/`fbc`: payload -> `_fbp`/`_fbc` cookies
    ///
    /// Empty strings are treated as absent at every fallback point.
    pub fn derive(payload: TrackPayload, signals: ClientSignals) -> Self {
        let event_name = non_empty(payload.event_name)
            .unwrap_or_else(|| DEFAULT_EVENT_NAME.to_string());
        let event_time = payload.event_time.unwrap_or_else(|| Utc::now().timestamp());
        let event_id = non_empty(payload.event_id)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let event_source_url = non_empty(payload.event_source_url)
            .or_else(|| non_empty(signals.referer))
            .or_else(|| non_empty(payload.url));

        let client_user_agent =
            non_empty(signals.user_agent).or_else(|| non_empty(payload.user_agent));
        let client_ip_address =
            non_empty(signals.client_ip).or_else(|| non_empty(payload.client_ip_address));

        let fbp = non_empty(payload.fbp).or_else(|| cookie(&signals.cookies, FBP_COOKIE));
        let fbc = non_empty(payload.fbc).or_else(|| cookie(&signals.cookies, FBC_COOKIE));

        Self {
            event_name,
            event_time,
            event_id,
            event_source_url,
            action_source: ACTION_SOURCE_WEBSITE.to_string(),
            user_data: UserData {
                client_ip_address,
                client_user_agent,
                fbp,
                fbc,
            },
        }
    }
}

/// Single-element batch envelope the Conversions API ingests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsEnvelope {
    pub data: Vec<ServerEvent>,
}

impl EventsEnvelope {
    /// Wrap one event in the batch envelope.
    pub fn single(event: ServerEvent) -> Self {
        Self { data: vec![event] }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn cookie(jar: &HashMap<String, String>, name: &str) -> Option<String> {
    jar.get(name).filter(|v| !v.is_empty()).cloned()
}
