use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::claims::{roles_from_value, Claims, CLAIM_ROLES};
use crate::codec::{ClaimsCodec, JwtCodec};
use crate::property::PropertyPath;
use crate::roles::RoleQuery;
use crate::state::TokenState;
use crate::temporal;

/// Holds the current token and answers validity, property and role queries
/// against it. Every query decodes the token afresh; nothing is cached.
#[derive(Debug, Clone, Default)]
pub struct TokenSession<C = JwtCodec> {
    state: TokenState,
    codec: C,
}

impl TokenSession<JwtCodec> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<C: ClaimsCodec> TokenSession<C> {
    pub fn with_codec(codec: C) -> Self {
        Self {
            state: TokenState::new(),
            codec,
        }
    }

    /// Share an existing slot, e.g. one owned by a request context.
    pub fn with_state(state: TokenState, codec: C) -> Self {
        Self { state, codec }
    }

    pub fn state(&self) -> &TokenState {
        &self.state
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    pub fn set_token(&self, token: impl Into<String>) {
        self.state.set(token);
    }

    pub fn clear_token(&self) {
        self.state.clear();
    }

    pub fn token(&self) -> Option<String> {
        self.state.get()
    }

    /// Check any token's issue/expiry window; the current token is not consulted.
    pub fn is_valid(&self, token: &str) -> bool {
        temporal::is_valid(&self.codec, token)
    }

    /// `false` when no token is set.
    pub fn is_current_valid(&self) -> bool {
        self.token()
            .is_some_and(|token| self.is_valid(&token))
    }

    /// Decoded claims of the current token, if one is set and decodes.
    pub fn claims(&self) -> Option<Claims> {
        self.state
            .get()
            .and_then(|token| self.codec.decode(&token))
    }

    /// Value at `path` in the current token, or `default` when there is no
    /// decodable token or the path does not resolve.
    pub fn get_property(&self, path: impl Into<PropertyPath>, default: Value) -> Value {
        self.get_property_at(&path.into(), default)
    }

    pub fn get_property_at(&self, path: &PropertyPath, default: Value) -> Value {
        self.claims()
            .and_then(|claims| claims.resolve(path).cloned())
            .unwrap_or(default)
    }

    /// Typed read of the value at `path`; `None` when missing or of another shape.
    pub fn property<T: DeserializeOwned>(&self, path: impl Into<PropertyPath>) -> Option<T> {
        self.claims()
            .and_then(|claims| claims.resolve_as(&path.into()))
    }

    /// Role names from the current token; empty when absent or not an array.
    pub fn roles(&self) -> Vec<String> {
        let roles = self.get_property(CLAIM_ROLES, Value::Array(Vec::new()));
        roles_from_value(Some(&roles))
    }

    /// Evaluate `query` against the current token's `roles` claim.
    pub fn has_role(&self, query: &RoleQuery) -> bool {
        query.evaluate(&self.roles())
    }
}
