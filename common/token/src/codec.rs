use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde_json::{Map, Value};
use tracing::debug;

use crate::claims::{Claims, CLAIM_EXPIRES_AT, CLAIM_ISSUED_AT};
use crate::config::{SignOptions, VerifyOptions};
use crate::error::{TokenError, TokenResult};

/// Turns a token string into its claims without any trust decision.
pub trait ClaimsCodec {
    /// Structural parse only: the signature is not checked. Returns `None`
    /// when the token is not a well-formed JWT with an object payload.
    fn decode(&self, token: &str) -> Option<Claims>;
}

/// `jsonwebtoken`-backed codec. Besides decoding it exposes `sign` and
/// `verify`, which the session operations never call.
#[derive(Debug, Clone, Copy, Default)]
pub struct JwtCodec;

impl JwtCodec {
    pub fn new() -> Self {
        Self
    }

    pub fn sign(
        &self,
        claims: &Value,
        secret: &[u8],
        options: &SignOptions,
    ) -> TokenResult<String> {
        let mut payload = claims.as_object().cloned().ok_or(TokenError::InvalidPayload)?;

        // A fractional payload `iat` is truncated to whole seconds for `exp`/`nbf`.
        let timestamp = payload
            .get(CLAIM_ISSUED_AT)
            .and_then(Value::as_f64)
            .filter(|iat| *iat != 0.0)
            .map_or_else(|| Utc::now().timestamp(), |iat| iat.trunc() as i64);
        if options.no_timestamp {
            payload.remove(CLAIM_ISSUED_AT);
        } else if !payload.contains_key(CLAIM_ISSUED_AT) {
            payload.insert(CLAIM_ISSUED_AT.to_owned(), Value::from(timestamp));
        }

        if let Some(seconds) = options.expires_in {
            insert_claim(&mut payload, CLAIM_EXPIRES_AT, Value::from(timestamp + seconds))?;
        }
        if let Some(seconds) = options.not_before {
            insert_claim(&mut payload, "nbf", Value::from(timestamp + seconds))?;
        }
        if let Some(issuer) = &options.issuer {
            insert_claim(&mut payload, "iss", Value::from(issuer.as_str()))?;
        }
        if let Some(subject) = &options.subject {
            insert_claim(&mut payload, "sub", Value::from(subject.as_str()))?;
        }
        if let Some(audience) = &options.audience {
            insert_claim(&mut payload, "aud", Value::from(audience.as_str()))?;
        }
        if let Some(jwt_id) = &options.jwt_id {
            insert_claim(&mut payload, "jti", Value::from(jwt_id.as_str()))?;
        }

        let mut header = Header::new(options.algorithm);
        header.kid = options.key_id.clone();
        let key = encoding_key(options.algorithm, secret)?;

        Ok(encode(&header, &payload, &key)?)
    }

    pub fn verify(
        &self,
        token: &str,
        secret: &[u8],
        options: &VerifyOptions,
    ) -> TokenResult<Claims> {
        let algorithm = options
            .algorithms
            .first()
            .copied()
            .ok_or(TokenError::InvalidAlgorithm)?;
        let key = decoding_key(algorithm, secret)?;

        let mut validation = Validation::new(algorithm);
        validation.algorithms = options.algorithms.clone();
        validation.required_spec_claims.clear();
        validation.leeway = options.leeway_seconds;
        validation.validate_exp = !options.ignore_expiration;
        validation.validate_nbf = !options.ignore_not_before;
        validation.sub = options.subject.clone();
        if !options.issuers.is_empty() {
            validation.set_issuer(&options.issuers);
        }
        if options.audiences.is_empty() {
            validation.validate_aud = false;
        } else {
            validation.set_audience(&options.audiences);
        }

        let token_data = jsonwebtoken::decode::<Value>(token, &key, &validation)?;
        let claims = Claims::try_from(token_data.claims)
            .map_err(|_| TokenError::Malformed("payload is not a JSON object".to_string()))?;
        debug!(
            alg = ?token_data.header.alg,
            kid = ?token_data.header.kid,
            "verified JWT successfully"
        );
        Ok(claims)
    }
}

impl ClaimsCodec for JwtCodec {
    /// The header only has to be a JSON object; its `alg` is not interpreted,
    /// so unsigned (`alg: none`) tokens decode too.
    fn decode(&self, token: &str) -> Option<Claims> {
        match decode_unverified(token) {
            Ok(claims) => Some(claims),
            Err(err) => {
                debug!(error = %err, "token failed to decode");
                None
            }
        }
    }
}

/// Decode with the default codec.
pub fn decode(token: &str) -> Option<Claims> {
    JwtCodec.decode(token)
}

/// Sign with the default codec.
pub fn sign(claims: &Value, secret: &[u8], options: &SignOptions) -> TokenResult<String> {
    JwtCodec.sign(claims, secret, options)
}

/// Verify with the default codec.
pub fn verify(token: &str, secret: &[u8], options: &VerifyOptions) -> TokenResult<Claims> {
    JwtCodec.verify(token, secret, options)
}

fn decode_unverified(token: &str) -> TokenResult<Claims> {
    let mut segments = token.split('.');
    let (Some(header), Some(payload), Some(_signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(TokenError::Malformed(
            "expected three dot-separated segments".to_string(),
        ));
    };

    if !decode_segment(header)?.is_object() {
        return Err(TokenError::Malformed("header is not a JSON object".to_string()));
    }
    Claims::try_from(decode_segment(payload)?)
        .map_err(|_| TokenError::Malformed("payload is not a JSON object".to_string()))
}

fn decode_segment(segment: &str) -> TokenResult<Value> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|err| TokenError::Malformed(err.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|err| TokenError::Malformed(err.to_string()))
}

fn insert_claim(
    payload: &mut Map<String, Value>,
    name: &'static str,
    value: Value,
) -> TokenResult<()> {
    if payload.contains_key(name) {
        return Err(TokenError::ConflictingClaim(name));
    }
    payload.insert(name.to_owned(), value);
    Ok(())
}

fn encoding_key(algorithm: Algorithm, secret: &[u8]) -> TokenResult<EncodingKey> {
    let key = match algorithm {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => EncodingKey::from_secret(secret),
        Algorithm::RS256
        | Algorithm::RS384
        | Algorithm::RS512
        | Algorithm::PS256
        | Algorithm::PS384
        | Algorithm::PS512 => EncodingKey::from_rsa_pem(secret)?,
        Algorithm::ES256 | Algorithm::ES384 => EncodingKey::from_ec_pem(secret)?,
        _ => EncodingKey::from_ed_pem(secret)?,
    };
    Ok(key)
}

fn decoding_key(algorithm: Algorithm, secret: &[u8]) -> TokenResult<DecodingKey> {
    let key = match algorithm {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => DecodingKey::from_secret(secret),
        Algorithm::RS256
        | Algorithm::RS384
        | Algorithm::RS512
        | Algorithm::PS256
        | Algorithm::PS384
        | Algorithm::PS512 => DecodingKey::from_rsa_pem(secret)?,
        Algorithm::ES256 | Algorithm::ES384 => DecodingKey::from_ec_pem(secret)?,
        _ => DecodingKey::from_ed_pem(secret)?,
    };
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsa::pkcs1::{EncodeRsaPrivateKey, EncodeRsaPublicKey, LineEnding};
    use rsa::rand_core::OsRng;
    use rsa::RsaPrivateKey;
    use serde_json::json;

    const SECRET: &[u8] = b"secret";

    fn now() -> i64 {
        Utc::now().timestamp()
    }

    #[test]
    fn decode_reads_unverified_claims() {
        let token = sign(&json!({ "property": 123 }), SECRET, &SignOptions::new()).expect("sign");
        let claims = decode(&token).expect("decodes");
        assert_eq!(claims.get("property"), Some(&json!(123)));
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(decode("").is_none());
        assert!(decode("not-a-token").is_none());
        assert!(decode("a.b.c").is_none());

        let token = sign(&json!({}), SECRET, &SignOptions::new()).expect("sign");
        let mangled: String = token
            .chars()
            .map(|ch| if ch.is_ascii_lowercase() { '_' } else { ch })
            .collect();
        assert!(decode(&mangled).is_none());
    }

    #[test]
    fn decode_rejects_non_object_payload() {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(b"[1,2,3]");
        let token = format!("{header}.{payload}.c2ln");
        assert!(decode(&token).is_none());
    }

    fn unsigned_token(header: &str, payload: &str) -> String {
        format!(
            "{}.{}.",
            URL_SAFE_NO_PAD.encode(header),
            URL_SAFE_NO_PAD.encode(payload)
        )
    }

    #[test]
    fn decode_accepts_unsigned_and_unknown_algorithms() {
        let token = unsigned_token(r#"{"alg":"none"}"#, r#"{"roles":["A"],"property":1}"#);
        let claims = decode(&token).expect("alg none decodes");
        assert_eq!(claims.get("property"), Some(&json!(1)));
        assert_eq!(claims.roles(), vec!["A"]);

        let token = unsigned_token(r#"{"alg":"XS999","typ":"JWT"}"#, r#"{"sub":"ada"}"#);
        let claims = decode(&format!("{token}c2ln")).expect("unknown alg decodes");
        assert_eq!(claims.get("sub"), Some(&json!("ada")));

        assert!(decode(&unsigned_token("[]", "{}")).is_none());
        assert!(decode(&format!("{}.extra", unsigned_token("{}", "{}"))).is_none());
    }

    #[test]
    fn decode_ignores_signature_and_expiry() {
        let token = sign(
            &json!({ "exp": now() - 3600, "roles": ["admin"] }),
            b"some-other-secret",
            &SignOptions::new(),
        )
        .expect("sign");
        let claims = decode(&token).expect("structural decode succeeds");
        assert_eq!(claims.roles(), vec!["admin"]);
    }

    #[test]
    fn sign_adds_issued_at_unless_disabled() {
        let before = now();
        let token = sign(&json!({}), SECRET, &SignOptions::new()).expect("sign");
        let iat = decode(&token)
            .and_then(|claims| claims.get("iat").and_then(Value::as_i64))
            .expect("iat present");
        assert!(iat >= before && iat <= now());

        let token = sign(
            &json!({ "iat": 5 }),
            SECRET,
            &SignOptions::new().without_timestamp(),
        )
        .expect("sign");
        assert!(decode(&token).expect("decodes").get("iat").is_none());
    }

    #[test]
    fn sign_keeps_explicit_issued_at() {
        let token = sign(&json!({ "iat": 1000 }), SECRET, &SignOptions::new().with_expires_in(60))
            .expect("sign");
        let claims = decode(&token).expect("decodes");
        assert_eq!(claims.get("iat"), Some(&json!(1000)));
        assert_eq!(claims.get("exp"), Some(&json!(1060)));

        let token = sign(
            &json!({ "iat": 1000.75 }),
            SECRET,
            &SignOptions::new().with_expires_in(60).with_not_before(5),
        )
        .expect("sign");
        let claims = decode(&token).expect("decodes");
        assert_eq!(claims.get("iat"), Some(&json!(1000.75)));
        assert_eq!(claims.get("exp"), Some(&json!(1060)));
        assert_eq!(claims.get("nbf"), Some(&json!(1005)));
    }

    #[test]
    fn sign_rejects_conflicting_claims_and_non_objects() {
        let err = sign(
            &json!({ "exp": now() }),
            SECRET,
            &SignOptions::new().with_expires_in(10),
        )
        .expect_err("conflict");
        assert!(matches!(err, TokenError::ConflictingClaim("exp")));

        let err = sign(&json!("claims"), SECRET, &SignOptions::new()).expect_err("not an object");
        assert!(matches!(err, TokenError::InvalidPayload));
    }

    #[test]
    fn verify_accepts_matching_secret() {
        let options = SignOptions::new()
            .with_expires_in(600)
            .with_issuer("issuer")
            .with_audience("web")
            .with_key_id("k1");
        let token = sign(&json!({ "roles": ["user"] }), SECRET, &options).expect("sign");

        let claims = verify(
            &token,
            SECRET,
            &VerifyOptions::new().with_issuer("issuer").with_audience("web"),
        )
        .expect("verification succeeds");
        assert_eq!(claims.roles(), vec!["user"]);
        assert_eq!(claims.get("iss"), Some(&json!("issuer")));
    }

    #[test]
    fn verify_reports_error_kinds() {
        let token = sign(&json!({}), SECRET, &SignOptions::new()).expect("sign");
        let err = verify(&token, b"wrong", &VerifyOptions::new()).expect_err("bad secret");
        assert!(matches!(err, TokenError::InvalidSignature));

        let expired = sign(&json!({ "exp": now() - 120 }), SECRET, &SignOptions::new()).expect("sign");
        let err = verify(&expired, SECRET, &VerifyOptions::new()).expect_err("expired");
        assert!(matches!(err, TokenError::Expired));
        verify(&expired, SECRET, &VerifyOptions::new().ignoring_expiration())
            .expect("expiry ignored");
        verify(&expired, SECRET, &VerifyOptions::new().with_leeway(600)).expect("within leeway");

        let immature = sign(&json!({}), SECRET, &SignOptions::new().with_not_before(3600))
            .expect("sign");
        let err = verify(&immature, SECRET, &VerifyOptions::new()).expect_err("not before");
        assert!(matches!(err, TokenError::NotBefore));

        let issued = sign(&json!({}), SECRET, &SignOptions::new().with_issuer("other")).expect("sign");
        let err = verify(&issued, SECRET, &VerifyOptions::new().with_issuer("issuer"))
            .expect_err("issuer mismatch");
        assert!(matches!(err, TokenError::InvalidIssuer));

        let err = verify("garbage", SECRET, &VerifyOptions::new()).expect_err("malformed");
        assert!(matches!(err, TokenError::Malformed(_)));
    }

    #[test]
    fn verify_rejects_disallowed_algorithm() {
        let token = sign(
            &json!({}),
            SECRET,
            &SignOptions::new().with_algorithm(Algorithm::HS512),
        )
        .expect("sign");
        let err = verify(&token, SECRET, &VerifyOptions::new()).expect_err("HS512 not allowed");
        assert!(matches!(err, TokenError::InvalidAlgorithm));

        verify(
            &token,
            SECRET,
            &VerifyOptions::new().with_algorithms([Algorithm::HS256, Algorithm::HS512]),
        )
        .expect("HS512 allowed");
    }

    #[test]
    fn rs256_round_trip_with_pem_keys() {
        let mut rng = OsRng;
        let private_key = RsaPrivateKey::new(&mut rng, 2048).expect("key generation");
        let private_pem = private_key
            .to_pkcs1_pem(LineEnding::LF)
            .expect("private pem");
        let public_pem = private_key
            .to_public_key()
            .to_pkcs1_pem(LineEnding::LF)
            .expect("public pem");

        let token = sign(
            &json!({ "roles": ["admin"] }),
            private_pem.as_bytes(),
            &SignOptions::new().with_algorithm(Algorithm::RS256),
        )
        .expect("sign");

        let options = VerifyOptions::new().with_algorithms([Algorithm::RS256]);
        let claims = verify(&token, public_pem.as_bytes(), &options).expect("verify");
        assert!(claims.has_role("admin"));

        let err = verify(&token, b"not a pem", &options).expect_err("bad key");
        assert!(matches!(err, TokenError::InvalidKey(_)));
    }
}
