use chrono::Utc;
use serde_json::Value;
use tracing::debug;

use crate::claims::{Claims, CLAIM_EXPIRES_AT, CLAIM_ISSUED_AT};
use crate::codec::ClaimsCodec;

/// Current Unix time in fractional seconds (millisecond precision).
pub fn unix_now() -> f64 {
    Utc::now().timestamp_millis() as f64 / 1000.0
}

/// Decode `token` and check its issue/expiry window against the current time.
/// Never fails: an undecodable token is simply not valid.
pub fn is_valid<C: ClaimsCodec + ?Sized>(codec: &C, token: &str) -> bool {
    is_valid_at(codec.decode(token).as_ref(), unix_now())
}

/// `iat` must not be in the future (`iat <= now`) and `exp` must be strictly
/// in the future (`exp > now`). Missing claims impose no bound; so do `null`,
/// `0`, `false` and `""`. Numeric strings are compared as numbers.
pub fn is_valid_at(claims: Option<&Claims>, now: f64) -> bool {
    let Some(claims) = claims else {
        return false;
    };

    let issued_ok = match time_claim(claims, CLAIM_ISSUED_AT) {
        TimeClaim::Absent => true,
        TimeClaim::At(iat) => iat <= now,
        TimeClaim::Invalid => false,
    };
    if !issued_ok {
        debug!(now, "token rejected: issued in the future or unreadable iat");
        return false;
    }

    let unexpired = match time_claim(claims, CLAIM_EXPIRES_AT) {
        TimeClaim::Absent => true,
        TimeClaim::At(exp) => exp > now,
        TimeClaim::Invalid => false,
    };
    if !unexpired {
        debug!(now, "token rejected: expired or unreadable exp");
    }
    unexpired
}

enum TimeClaim {
    Absent,
    At(f64),
    Invalid,
}

fn time_claim(claims: &Claims, key: &str) -> TimeClaim {
    match claims.get(key) {
        None | Some(Value::Null) | Some(Value::Bool(false)) => TimeClaim::Absent,
        Some(Value::Bool(true)) => TimeClaim::At(1.0),
        Some(Value::Number(number)) => match number.as_f64() {
            Some(seconds) if seconds == 0.0 => TimeClaim::Absent,
            Some(seconds) => TimeClaim::At(seconds),
            None => TimeClaim::Invalid,
        },
        Some(Value::String(text)) if text.is_empty() => TimeClaim::Absent,
        Some(Value::String(text)) => match text.trim() {
            "" => TimeClaim::At(0.0),
            trimmed => trimmed
                .parse::<f64>()
                .ok()
                .filter(|seconds| !seconds.is_nan())
                .map_or(TimeClaim::Invalid, TimeClaim::At),
        },
        Some(_) => TimeClaim::Invalid,
    }
}
