//! Per-browser session state: the last commit author and pending notices.
//!
//! The browser holds only a signed session id cookie; contexts live in
//! memory and are lost on restart, which merely resets the author default.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use axum::http::{HeaderMap, HeaderValue, header};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::util::sanitize;

pub const SESSION_COOKIE: &str = "weditor_session";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

impl NoticeLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            NoticeLevel::Success => "success",
            NoticeLevel::Error => "error",
        }
    }
}

/// One-shot message shown on the next rendered page. Text is stored escaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn success(text: &str) -> Self {
        Self {
            level: NoticeLevel::Success,
            text: sanitize(text),
        }
    }

    /// `text` must already be escaped, e.g. from `EditorError::notice_text`.
    pub fn error_escaped(text: String) -> Self {
        Self {
            level: NoticeLevel::Error,
            text,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    /// Last author name used to commit from this browser.
    pub author: Option<String>,
    pub notices: Vec<Notice>,
}

impl SessionContext {
    pub fn notify(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Nothing worth remembering: no author and no pending notices.
    pub fn is_empty(&self) -> bool {
        self.author.is_none() && self.notices.is_empty()
    }
}

/// A loaded session; hand it back to [`SessionStore::save`] when done.
#[derive(Debug)]
pub struct Session {
    id: String,
    fresh: bool,
    pub context: SessionContext,
}

pub struct SessionStore {
    secret: String,
    sessions: Mutex<HashMap<String, SessionContext>>,
}

impl SessionStore {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    fn sign(&self, id: &str) -> String {
        let digest = Sha256::new()
            .chain_update(self.secret.as_bytes())
            .chain_update(b":")
            .chain_update(id.as_bytes())
            .finalize();
        format!("{:x}", digest)
    }

    fn cookie_id(&self, headers: &HeaderMap) -> Option<String> {
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(|pair| pair.trim().strip_prefix(SESSION_COOKIE)?.strip_prefix('='))
            .find_map(|value| {
                let (id, sig) = value.split_once('.')?;
                (sig == self.sign(id)).then(|| id.to_string())
            })
    }

    /// Session for the request's cookie, or a fresh one if absent or forged.
    pub fn load(&self, headers: &HeaderMap) -> Session {
        match self.cookie_id(headers) {
            Some(id) => {
                let context = self
                    .sessions
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .get(&id)
                    .cloned()
                    .unwrap_or_default();
                Session {
                    id,
                    fresh: false,
                    context,
                }
            }
            None => Session {
                id: Uuid::new_v4().to_string(),
                fresh: true,
                context: SessionContext::default(),
            },
        }
    }

    /// Store the context; returns the `Set-Cookie` value for new sessions.
    ///
    /// Empty contexts are dropped rather than stored, and a fresh empty
    /// session gets no cookie, so clients ignoring cookies leave no entries.
    pub fn save(&self, session: Session) -> Option<HeaderValue> {
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        if session.context.is_empty() {
            sessions.remove(&session.id);
            return None;
        }

        let cookie = session.fresh.then(|| {
            format!(
                "{}={}.{}; Path=/; HttpOnly; SameSite=Lax",
                SESSION_COOKIE,
                session.id,
                self.sign(&session.id)
            )
        });
        sessions.insert(session.id, session.context);
        cookie.and_then(|c| HeaderValue::from_str(&c).ok())
    }

    /// Number of stored session contexts.
    pub fn len(&self) -> usize {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
