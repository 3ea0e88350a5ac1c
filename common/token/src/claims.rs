use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::property::PropertyPath;

pub const CLAIM_ISSUED_AT: &str = "iat";
pub const CLAIM_EXPIRES_AT: &str = "exp";
pub const CLAIM_ROLES: &str = "roles";

/// Decoded token payload. Only `iat`, `exp` and `roles` carry meaning here;
/// every other key is passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Claims {
    raw: Map<String, Value>,
}

impl Claims {
    pub fn new(raw: Map<String, Value>) -> Self {
        Self { raw }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.raw.get(key)
    }

    /// Resolve a nested path such as `profile.emails[0]`.
    pub fn resolve(&self, path: &PropertyPath) -> Option<&Value> {
        path.resolve(&self.raw)
    }

    /// Resolve a path and deserialize the value into `T`.
    pub fn resolve_as<T: DeserializeOwned>(&self, path: &PropertyPath) -> Option<T> {
        self.resolve(path)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    /// Role names from the `roles` claim. Non-string entries are skipped and a
    /// claim that is not an array yields no roles.
    pub fn roles(&self) -> Vec<String> {
        roles_from_value(self.raw.get(CLAIM_ROLES))
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles().iter().any(|value| value == role)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.raw
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.raw)
    }
}

impl TryFrom<Value> for Claims {
    type Error = Value;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(raw) => Ok(Self { raw }),
            other => Err(other),
        }
    }
}

impl From<Claims> for Value {
    fn from(value: Claims) -> Self {
        value.into_value()
    }
}

pub(crate) fn roles_from_value(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_owned))
            .collect(),
        _ => Vec::new(),
    }
}
