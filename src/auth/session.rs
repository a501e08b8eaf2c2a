use std::convert::Infallible;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
    response::{IntoResponseParts, ResponseParts},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{debug, error, warn};

use crate::{config::SessionConfig, state::AppState};

pub const SESSION_COOKIE: &str = "session";
pub const DEFAULT_FLASH_CATEGORY: &str = "message";

pub const CSRF_MISSING: &str = "The CSRF token is missing.";
pub const CSRF_MISMATCH: &str = "The CSRF tokens do not match.";

/// One-time notice shown on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub category: String,
    pub message: String,
}

/// Everything the browser carries between requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flashes: Vec<Flash>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csrf: Option<String>,
}

impl SessionData {
    fn is_empty(&self) -> bool {
        self.uid.is_none() && self.flashes.is_empty() && self.csrf.is_none()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    #[serde(flatten)]
    data: SessionData,
    iat: usize,
    exp: usize,
    iss: String,
    aud: String,
}

/// Signing material for the session cookie.
#[derive(Clone)]
pub struct SessionKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
    pub ttl: TimeDuration,
    pub secure: bool,
}

impl From<&SessionConfig> for SessionKeys {
    fn from(cfg: &SessionConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            ttl: TimeDuration::minutes(cfg.ttl_minutes),
            secure: cfg.cookie_secure,
        }
    }
}

impl FromRef<AppState> for SessionKeys {
    fn from_ref(state: &AppState) -> Self {
        SessionKeys::from(&state.config.session)
    }
}

impl SessionKeys {
    pub fn sign(&self, data: &SessionData) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = now + self.ttl;
        let claims = SessionClaims {
            data: data.clone(),
            iat: now.unix_timestamp().max(0) as usize,
            exp: exp.unix_timestamp().max(0) as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(uid = ?data.uid, "session signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> anyhow::Result<SessionData> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<SessionClaims>(token, &self.decoding, &validation)?;
        Ok(data.claims.data)
    }

    fn cookie(&self, token: String) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, token))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .max_age(self.ttl)
            .build()
    }
}

/// Request-scoped session. Extract it, mutate it, and return it as a
/// response part; the cookie is only rewritten when something changed.
pub struct Session {
    jar: CookieJar,
    keys: SessionKeys,
    data: SessionData,
    dirty: bool,
}

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
    SessionKeys: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = SessionKeys::from_ref(state);
        let jar = CookieJar::from_headers(&parts.headers);

        let (data, dirty) = match jar.get(SESSION_COOKIE) {
            None => (SessionData::default(), false),
            Some(cookie) => match keys.verify(cookie.value()) {
                Ok(data) => (data, false),
                Err(e) => {
                    // Unreadable cookie: start over and clear it on the way out.
                    warn!(error = %e, "discarding invalid session cookie");
                    (SessionData::default(), true)
                }
            },
        };

        Ok(Session {
            jar,
            keys,
            data,
            dirty,
        })
    }
}

impl Session {
    pub fn current_user_id(&self) -> Option<i64> {
        self.data.uid
    }

    pub fn set_current_user(&mut self, user_id: i64) {
        self.data.uid = Some(user_id);
        self.dirty = true;
    }

    pub fn clear_current_user(&mut self) {
        if self.data.uid.take().is_some() {
            self.dirty = true;
        }
    }

    pub fn flash(&mut self, message: impl Into<String>) {
        self.flash_with(DEFAULT_FLASH_CATEGORY, message);
    }

    /// Queues a notice unless the same one is already pending.
    pub fn flash_with(&mut self, category: &str, message: impl Into<String>) {
        let flash = Flash {
            category: category.to_string(),
            message: message.into(),
        };
        if self.data.flashes.contains(&flash) {
            return;
        }
        self.data.flashes.push(flash);
        self.dirty = true;
    }

    /// Pending notices; each is handed out once.
    pub fn take_flashes(&mut self) -> Vec<Flash> {
        if self.data.flashes.is_empty() {
            return Vec::new();
        }
        self.dirty = true;
        std::mem::take(&mut self.data.flashes)
    }

    pub fn csrf_token(&mut self) -> String {
        if let Some(token) = &self.data.csrf {
            return token.clone();
        }
        let token: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(32)
            .map(char::from)
            .collect();
        self.data.csrf = Some(token.clone());
        self.dirty = true;
        token
    }

    pub fn check_csrf(&self, submitted: &str) -> Result<(), &'static str> {
        if submitted.is_empty() {
            return Err(CSRF_MISSING);
        }
        match &self.data.csrf {
            Some(expected) if expected == submitted => Ok(()),
            _ => Err(CSRF_MISMATCH),
        }
    }

    fn into_jar(self) -> CookieJar {
        if !self.dirty {
            return self.jar;
        }
        if self.data.is_empty() {
            return self.jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
        }
        match self.keys.sign(&self.data) {
            Ok(token) => self.jar.add(self.keys.cookie(token)),
            Err(e) => {
                error!(error = %e, "session sign failed");
                self.jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
            }
        }
    }
}

impl IntoResponseParts for Session {
    type Error = Infallible;

    fn into_response_parts(self, res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        self.into_jar().into_response_parts(res)
    }
}
