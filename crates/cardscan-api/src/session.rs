//! Request-scoped session context
//!
//! Each browser gets an opaque id in the `cardscan_session` cookie. Handlers
//! receive the stored `SessionData` by value through the `Session` extractor
//! and write it back explicitly with `Session::save`.

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{
        header::{COOKIE, SET_COOKIE},
        request::Parts,
        HeaderMap, HeaderName, HeaderValue,
    },
};
use cardscan_core::{AppError, ContactRecord};
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::HttpAppError;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "cardscan_session";

const SESSION_ID_BYTES: usize = 32;

/// Everything the web flow keeps between requests for one browser.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    /// Results of the last upload, shown once on the next `GET /`.
    pub processed_cards: Option<Vec<ContactRecord>>,
    /// One-shot status line, shown once on the next `GET /`.
    pub status_message: Option<String>,
    /// Contacts waiting for the OAuth round trip to finish.
    pub contacts_to_sync: Vec<ContactRecord>,
    /// Anti-forgery token for the pending OAuth round trip.
    pub oauth_state: Option<String>,
}

/// Key-value store for session data, keyed by session id.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, id: &str) -> Option<SessionData>;
    async fn save(&self, id: &str, data: SessionData);
}

struct StoredSession {
    data: SessionData,
    expires_at: DateTime<Utc>,
}

/// Process-local session store with a sliding expiry.
pub struct InMemorySessionStore {
    ttl: Duration,
    entries: RwLock<HashMap<String, StoredSession>>,
}

impl InMemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self, id: &str) -> Option<SessionData> {
        let entries = self.entries.read().await;
        entries
            .get(id)
            .filter(|stored| stored.expires_at > Utc::now())
            .map(|stored| stored.data.clone())
    }

    async fn save(&self, id: &str, data: SessionData) {
        let now = Utc::now();
        let mut entries = self.entries.write().await;
        entries.retain(|_, stored| stored.expires_at > now);
        entries.insert(
            id.to_string(),
            StoredSession {
                data,
                expires_at: now + self.ttl,
            },
        );
    }
}

/// Session id and data for the current request.
#[derive(Debug)]
pub struct Session {
    id: String,
    pub data: SessionData,
}

impl Session {
    /// Persist the data and produce the `Set-Cookie` header that refreshes the cookie.
    pub async fn save(self, state: &AppState) -> Result<[(HeaderName, HeaderValue); 1], HttpAppError> {
        let cookie = session_cookie(
            &self.id,
            state.config.session_ttl_minutes() * 60,
            state.config.is_production(),
        )?;
        state.sessions.save(&self.id, self.data).await;
        Ok([(SET_COOKIE, cookie)])
    }
}

impl FromRequestParts<Arc<AppState>> for Session {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        if let Some(id) = session_id_from_headers(&parts.headers) {
            if let Some(data) = state.sessions.load(&id).await {
                return Ok(Session { id, data });
            }
        }

        Ok(Session {
            id: generate_session_id(),
            data: SessionData::default(),
        })
    }
}

pub fn generate_session_id() -> String {
    let bytes: [u8; SESSION_ID_BYTES] = rand::rng().random();
    hex::encode(bytes)
}

/// Read a well-formed session id from the `Cookie` headers.
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim().to_string())
        .filter(|id| is_valid_session_id(id))
}

fn is_valid_session_id(id: &str) -> bool {
    id.len() == SESSION_ID_BYTES * 2 && id.chars().all(|c| c.is_ascii_hexdigit())
}

fn session_cookie(id: &str, max_age_secs: i64, secure: bool) -> Result<HeaderValue, AppError> {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE, id, max_age_secs
    );
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
        .map_err(|e| AppError::Internal(format!("Invalid session cookie: {}", e)))
}
