use std::env;
use std::str::FromStr;

use jsonwebtoken::Algorithm;

use crate::error::{TokenError, TokenResult};

const ENV_ALGORITHMS: &str = "JWT_ALGORITHMS";
const ENV_ISSUER: &str = "JWT_ISSUER";
const ENV_AUDIENCE: &str = "JWT_AUDIENCE";
const ENV_LEEWAY: &str = "JWT_LEEWAY_SECONDS";
const ENV_IGNORE_EXPIRATION: &str = "JWT_IGNORE_EXPIRATION";

/// Options applied when issuing a token.
#[derive(Debug, Clone)]
pub struct SignOptions {
    /// Signing algorithm; HMAC algorithms take a raw secret, the others a PEM key.
    pub algorithm: Algorithm,
    /// Seconds after the issue time at which the token expires (`exp`).
    pub expires_in: Option<i64>,
    /// Seconds after the issue time before which the token is not valid (`nbf`).
    pub not_before: Option<i64>,
    pub issuer: Option<String>,
    pub subject: Option<String>,
    pub audience: Option<String>,
    pub jwt_id: Option<String>,
    /// Header `kid`.
    pub key_id: Option<String>,
    /// Skip the automatic `iat` claim.
    pub no_timestamp: bool,
}

impl Default for SignOptions {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::HS256,
            expires_in: None,
            not_before: None,
            issuer: None,
            subject: None,
            audience: None,
            jwt_id: None,
            key_id: None,
            no_timestamp: false,
        }
    }
}

impl SignOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn with_expires_in(mut self, seconds: i64) -> Self {
        self.expires_in = Some(seconds);
        self
    }

    pub fn with_not_before(mut self, seconds: i64) -> Self {
        self.not_before = Some(seconds);
        self
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    pub fn with_jwt_id(mut self, jwt_id: impl Into<String>) -> Self {
        self.jwt_id = Some(jwt_id.into());
        self
    }

    pub fn with_key_id(mut self, kid: impl Into<String>) -> Self {
        self.key_id = Some(kid.into());
        self
    }

    pub fn without_timestamp(mut self) -> Self {
        self.no_timestamp = true;
        self
    }
}

/// Options applied when verifying a token signature and its registered claims.
#[derive(Debug, Clone)]
pub struct VerifyOptions {
    /// Accepted algorithms; must all belong to the same key family.
    pub algorithms: Vec<Algorithm>,
    pub issuers: Vec<String>,
    pub audiences: Vec<String>,
    pub subject: Option<String>,
    /// Allowable clock skew in seconds when validating exp/nbf.
    pub leeway_seconds: u64,
    pub ignore_expiration: bool,
    pub ignore_not_before: bool,
}

impl Default for VerifyOptions {
    fn default() -> Self {
        Self {
            algorithms: vec![Algorithm::HS256],
            issuers: Vec::new(),
            audiences: Vec::new(),
            subject: None,
            leeway_seconds: 0,
            ignore_expiration: false,
            ignore_not_before: false,
        }
    }
}

impl VerifyOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_algorithms(mut self, algorithms: impl IntoIterator<Item = Algorithm>) -> Self {
        self.algorithms = algorithms.into_iter().collect();
        self
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuers.push(issuer.into());
        self
    }

    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audiences.push(audience.into());
        self
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn with_leeway(mut self, seconds: u64) -> Self {
        self.leeway_seconds = seconds;
        self
    }

    pub fn ignoring_expiration(mut self) -> Self {
        self.ignore_expiration = true;
        self
    }

    pub fn ignoring_not_before(mut self) -> Self {
        self.ignore_not_before = true;
        self
    }

    /// Load verification options from `JWT_*` environment variables.
    pub fn from_env() -> TokenResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build options from an arbitrary key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> TokenResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut options = Self::default();

        if let Some(raw) = lookup(ENV_ALGORITHMS).and_then(|value| normalize_optional(&value)) {
            let algorithms = split_list(&raw)
                .map(|name| {
                    Algorithm::from_str(&name.to_ascii_uppercase())
                        .map_err(|_| TokenError::Config(ENV_ALGORITHMS, name))
                })
                .collect::<TokenResult<Vec<_>>>()?;
            if algorithms.is_empty() {
                return Err(TokenError::Config(ENV_ALGORITHMS, raw));
            }
            options.algorithms = algorithms;
        }

        if let Some(raw) = lookup(ENV_ISSUER) {
            options.issuers = split_list(&raw).collect();
        }

        if let Some(raw) = lookup(ENV_AUDIENCE) {
            options.audiences = split_list(&raw).collect();
        }

        if let Some(raw) = lookup(ENV_LEEWAY).and_then(|value| normalize_optional(&value)) {
            options.leeway_seconds = raw
                .parse()
                .map_err(|_| TokenError::Config(ENV_LEEWAY, raw.clone()))?;
        }

        if let Some(raw) = lookup(ENV_IGNORE_EXPIRATION) {
            options.ignore_expiration = parse_bool(&raw);
        }

        Ok(options)
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn split_list(value: &str) -> impl Iterator<Item = String> + '_ {
    value
        .split(|c| c == ',' || c == ';' || c == ' ')
        .filter_map(normalize_optional)
}

fn normalize_optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
