//! The visitor's session: who is signed in and with which bearer token.
//!
//! A [`Session`] is an explicit value handed to every view operation that
//! needs it. The token itself lives in a [`TokenStore`]; on the web that is the
//! `token` cookie.

use std::sync::Arc;

use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue};

use crate::api::ImageApi;
use crate::config::SessionConfig;
use crate::error::ClientResult;
use crate::models::{Credentials, User};

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    user: Option<User>,
    token: Option<String>,
    loading: bool,
}

impl Session {
    /// Session resolution still in flight.
    pub fn loading() -> Self {
        Self {
            user: None,
            token: None,
            loading: true,
        }
    }

    pub fn anonymous() -> Self {
        Self {
            user: None,
            token: None,
            loading: false,
        }
    }

    pub fn authenticated(user: User, token: String) -> Self {
        Self {
            user: Some(user),
            token: Some(token),
            loading: false,
        }
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// Bearer token, present only for a resolved user.
    pub fn token(&self) -> Option<&str> {
        self.user.as_ref().and(self.token.as_deref())
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(|u| u.is_admin)
    }

    /// Owners and admins may delete an image or comment.
    pub fn can_modify(&self, owner_id: &str) -> bool {
        self.user
            .as_ref()
            .is_some_and(|u| u.is_admin || u.id == owner_id)
    }
}

pub trait TokenStore {
    fn load(&self) -> Option<String>;
    fn save(&mut self, token: &str);
    fn clear(&mut self);
}

#[derive(Debug, Clone, Default)]
pub struct MemoryTokenStore {
    token: Option<String>,
}

impl MemoryTokenStore {
    pub fn with_token(token: &str) -> Self {
        Self {
            token: Some(token.to_string()),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Option<String> {
        self.token.clone()
    }

    fn save(&mut self, token: &str) {
        self.token = Some(token.to_string());
    }

    fn clear(&mut self) {
        self.token = None;
    }
}

#[derive(Debug, Clone, PartialEq)]
enum PendingCookie {
    Set(String),
    Clear,
}

/// Token kept in an HttpOnly cookie. Writes are buffered and emitted as a
/// `Set-Cookie` header on the response.
#[derive(Debug, Clone)]
pub struct CookieTokenStore {
    config: SessionConfig,
    current: Option<String>,
    pending: Option<PendingCookie>,
}

impl CookieTokenStore {
    pub fn from_headers(headers: &HeaderMap, config: &SessionConfig) -> Self {
        Self {
            config: config.clone(),
            current: cookie_value(headers, &config.cookie_name).map(str::to_string),
            pending: None,
        }
    }

    /// `Set-Cookie` value for the buffered write, if any.
    pub fn set_cookie(&self) -> Option<String> {
        let secure = if self.config.secure { "; Secure" } else { "" };
        let name = &self.config.cookie_name;
        match self.pending.as_ref()? {
            PendingCookie::Set(token) => Some(format!(
                "{name}={token}; HttpOnly; SameSite=Strict; Path=/; Max-Age={}{secure}",
                self.config.max_age_hours * 3600
            )),
            PendingCookie::Clear => Some(format!(
                "{name}=; HttpOnly; SameSite=Strict; Path=/; Max-Age=0{secure}"
            )),
        }
    }

    /// Appends the buffered write unless the response already sets this cookie.
    pub fn apply(&self, headers: &mut HeaderMap) {
        let Some(cookie) = self.set_cookie() else {
            return;
        };
        let prefix = format!("{}=", self.config.cookie_name);
        let already_set = headers
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .any(|v| v.starts_with(&prefix));
        if already_set {
            return;
        }
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                headers.append(SET_COOKIE, value);
            }
            Err(e) => tracing::error!("Unusable session cookie: {}", e),
        }
    }
}

impl TokenStore for CookieTokenStore {
    fn load(&self) -> Option<String> {
        match &self.pending {
            Some(PendingCookie::Set(token)) => Some(token.clone()),
            Some(PendingCookie::Clear) => None,
            None => self.current.clone(),
        }
    }

    fn save(&mut self, token: &str) {
        self.pending = Some(PendingCookie::Set(token.to_string()));
    }

    fn clear(&mut self) {
        self.pending = Some(PendingCookie::Clear);
    }
}

pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|s| s.split(';'))
        .map(|s| s.trim())
        .find_map(|cookie| {
            let mut split = cookie.splitn(2, '=');
            let key = split.next()?.trim();
            let val = split.next()?.trim();
            if key == name && !val.is_empty() {
                Some(val)
            } else {
                None
            }
        })
}

/// Owns the token store and resolves, creates and ends sessions against the API.
pub struct SessionProvider<S> {
    api: Arc<dyn ImageApi>,
    store: S,
    session: Session,
}

impl<S: TokenStore> SessionProvider<S> {
    pub fn new(api: Arc<dyn ImageApi>, store: S) -> Self {
        Self {
            api,
            store,
            session: Session::loading(),
        }
    }

    /// Resolves the stored token into a user. A rejected token is dropped
    /// silently and the visitor continues anonymously.
    pub async fn init(&mut self) {
        let Some(token) = self.store.load() else {
            self.session = Session::anonymous();
            return;
        };

        self.session = match self.api.me(&token).await {
            Ok(user) => Session::authenticated(user, token),
            Err(e) if e.is_auth() => {
                tracing::debug!("Stored token rejected: {}", e);
                self.store.clear();
                Session::anonymous()
            }
            Err(e) => {
                tracing::warn!("Could not resolve session: {}", e);
                Session::anonymous()
            }
        };
    }

    pub async fn login(&mut self, email: &str, password: &str) -> ClientResult<User> {
        let response = self
            .api
            .login(&Credentials {
                email: email.to_string(),
                password: password.to_string(),
            })
            .await?;
        self.store.save(&response.access_token);
        tracing::info!(user = %response.user.email, "Signed in");
        self.session = Session::authenticated(response.user.clone(), response.access_token);
        Ok(response.user)
    }

    /// Creates the account. Does not sign in.
    pub async fn register(&mut self, email: &str, password: &str) -> ClientResult<User> {
        let user = self
            .api
            .register(&Credentials {
                email: email.to_string(),
                password: password.to_string(),
            })
            .await?;
        tracing::info!(user = %user.email, "Registered");
        Ok(user)
    }

    pub fn logout(&mut self) {
        self.store.clear();
        self.session = Session::anonymous();
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_parts(self) -> (Session, S) {
        (self.session, self.store)
    }
}
