use jsonwebtoken::errors::ErrorKind;
use thiserror::Error;

pub type TokenResult<T> = Result<T, TokenError>;

/// Failures surfaced by the signing/verification pass-through and by
/// configuration or role-expression parsing. Query operations never
/// return these; they degrade to `false` or a default instead.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("malformed token: {0}")]
    Malformed(String),
    #[error("invalid token signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("token not active yet")]
    NotBefore,
    #[error("token issuer rejected")]
    InvalidIssuer,
    #[error("token audience rejected")]
    InvalidAudience,
    #[error("token subject rejected")]
    InvalidSubject,
    #[error("token algorithm not allowed")]
    InvalidAlgorithm,
    #[error("invalid signing or verification key: {0}")]
    InvalidKey(String),
    #[error("claims payload must be a JSON object")]
    InvalidPayload,
    #[error("payload already has an '{0}' claim")]
    ConflictingClaim(&'static str),
    #[error("token signing failed: {0}")]
    Signing(String),
    #[error("invalid role expression: {0}")]
    InvalidRoleExpression(String),
    #[error("invalid configuration for '{0}': {1}")]
    Config(&'static str, String),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(value: jsonwebtoken::errors::Error) -> Self {
        match value.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::ImmatureSignature => Self::NotBefore,
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            ErrorKind::InvalidIssuer => Self::InvalidIssuer,
            ErrorKind::InvalidAudience => Self::InvalidAudience,
            ErrorKind::InvalidSubject => Self::InvalidSubject,
            ErrorKind::InvalidAlgorithm
            | ErrorKind::MissingAlgorithm
            | ErrorKind::InvalidAlgorithmName => Self::InvalidAlgorithm,
            ErrorKind::InvalidEcdsaKey
            | ErrorKind::InvalidRsaKey(_)
            | ErrorKind::InvalidKeyFormat => Self::InvalidKey(value.to_string()),
            ErrorKind::RsaFailedSigning => Self::Signing(value.to_string()),
            _ => Self::Malformed(value.to_string()),
        }
    }
}

/// Rejections produced by the authorization guards.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuardError {
    #[error("no current token")]
    MissingToken,
    #[error("current token is malformed or outside its validity window")]
    InvalidToken,
    #[error("{}", forbidden_message(.required))]
    Forbidden { required: Vec<String> },
}

fn forbidden_message(required: &[String]) -> String {
    if required.is_empty() {
        "Insufficient role".to_string()
    } else {
        format!("Insufficient role. Required: {}", required.join(", "))
    }
}
