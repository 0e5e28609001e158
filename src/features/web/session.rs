//! In-memory cookie sessions for the interactive client.
//!
//! Two maps live here: signed-in sessions keyed by the cookie value, and
//! logins in flight keyed by the OAuth `state` parameter.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, Utc};
use cookie::time;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::features::auth::AuthenticatedUser;

pub const SESSION_COOKIE: &str = "demo.session";

/// How long a login may sit at the identity provider before its state expires.
const PENDING_LOGIN_TTL_MINUTES: i64 = 10;

/// Upper bound on logins in flight; the oldest is evicted past it.
const MAX_PENDING_LOGINS: usize = 1024;

#[derive(Debug, Clone)]
pub struct Session {
    pub user: AuthenticatedUser,
    pub access_token: Option<String>,
    pub id_token: Option<String>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct PendingLogin {
    pub code_verifier: String,
    pub nonce: String,
    pub return_url: String,
    pub created_at: DateTime<Utc>,
}

pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
    pending: RwLock<HashMap<String, PendingLogin>>,
    ttl: chrono::Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            pending: RwLock::new(HashMap::new()),
            ttl: chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::days(1)),
        }
    }

    pub fn ttl(&self) -> chrono::Duration {
        self.ttl
    }

    /// Store a new session and return its id.
    pub async fn create(
        &self,
        user: AuthenticatedUser,
        access_token: Option<String>,
        id_token: Option<String>,
    ) -> String {
        let id = Uuid::new_v4().simple().to_string();
        let session = Session {
            user,
            access_token,
            id_token,
            expires_at: Utc::now() + self.ttl,
        };

        self.sessions.write().await.insert(id.clone(), session);
        id
    }

    /// Look up a live session. Expired entries are dropped on access.
    pub async fn get(&self, id: &str) -> Option<Session> {
        {
            let sessions = self.sessions.read().await;
            match sessions.get(id) {
                Some(session) if session.expires_at > Utc::now() => {
                    return Some(session.clone());
                }
                Some(_) => {}
                None => return None,
            }
        }

        self.sessions.write().await.remove(id);
        None
    }

    pub async fn remove(&self, id: &str) -> Option<Session> {
        self.sessions.write().await.remove(id)
    }

    /// Record a login in flight. Stale entries are dropped first, and the
    /// oldest one goes when the map is full.
    pub async fn begin_login(&self, state: String, pending: PendingLogin) {
        let cutoff = Utc::now() - chrono::Duration::minutes(PENDING_LOGIN_TTL_MINUTES);
        let mut logins = self.pending.write().await;

        logins.retain(|_, p| p.created_at > cutoff);

        if logins.len() >= MAX_PENDING_LOGINS {
            let oldest = logins
                .iter()
                .min_by_key(|(_, p)| p.created_at)
                .map(|(state, _)| state.clone());
            if let Some(oldest) = oldest {
                tracing::warn!("Too many logins in flight; evicting the oldest");
                logins.remove(&oldest);
            }
        }

        logins.insert(state, pending);
    }

    /// Consume the pending login for `state`. Each state is usable once.
    pub async fn take_login(&self, state: &str) -> Option<PendingLogin> {
        let pending = self.pending.write().await.remove(state)?;
        let deadline = pending.created_at + chrono::Duration::minutes(PENDING_LOGIN_TTL_MINUTES);
        (deadline > Utc::now()).then_some(pending)
    }

    /// Drop expired sessions and abandoned logins; returns how many went.
    pub async fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let login_cutoff = now - chrono::Duration::minutes(PENDING_LOGIN_TTL_MINUTES);

        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| s.expires_at > now);
        let mut removed = before - sessions.len();
        drop(sessions);

        let mut pending = self.pending.write().await;
        let before = pending.len();
        pending.retain(|_, p| p.created_at > login_cutoff);
        removed += before - pending.len();

        removed
    }
}

/// Session id carried by the request's cookies, if any.
pub fn session_id(jar: &CookieJar) -> Option<String> {
    jar.get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
}

pub fn session_cookie(id: String, ttl: chrono::Duration, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, id))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(time::Duration::seconds(ttl.num_seconds()))
        .build()
}

/// Cookie that clears the session cookie in the browser.
pub fn expired_session_cookie(secure: bool) -> Cookie<'static> {
    let mut cookie = session_cookie(String::new(), chrono::Duration::zero(), secure);
    cookie.make_removal();
    cookie
}
