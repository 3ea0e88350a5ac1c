//! Process-wide default session.
//!
//! Thin convenience layer over a single lazily created [`TokenSession`] for
//! callers that want one implicit "current token". Code that needs isolation
//! (tests, per-request state) should own a `TokenSession` instead.

use once_cell::sync::Lazy;
use serde_json::Value;

use crate::property::PropertyPath;
use crate::roles::RoleQuery;
use crate::session::TokenSession;

static SESSION: Lazy<TokenSession> = Lazy::new(TokenSession::new);

pub fn session() -> &'static TokenSession {
    &SESSION
}

pub fn set_token(token: impl Into<String>) {
    SESSION.set_token(token);
}

pub fn clear_token() {
    SESSION.clear_token();
}

pub fn token() -> Option<String> {
    SESSION.token()
}

pub fn is_valid(token: &str) -> bool {
    SESSION.is_valid(token)
}

pub fn get_property(path: impl Into<PropertyPath>, default: Value) -> Value {
    SESSION.get_property(path, default)
}

pub fn has_role(query: &RoleQuery) -> bool {
    SESSION.has_role(query)
}
