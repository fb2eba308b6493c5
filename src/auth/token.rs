//! Access token issuing and verification (HS256).

use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Token payload: the user object posted to `/jwt` plus timing claims.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Issued-at (unix seconds).
    pub iat: i64,
    /// Expiry (unix seconds).
    pub exp: i64,
    /// Fields of the posted user object.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Claims {
    /// Email of the token holder, when the user object carried a string one.
    pub fn email(&self) -> Option<&str> {
        self.extra.get("email").and_then(Value::as_str)
    }
}

/// Signs and verifies access tokens with a shared secret.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl_seconds: i64,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("ttl_seconds", &self.ttl_seconds)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    /// Create a service for `secret` issuing tokens valid for `ttl_seconds`.
    pub fn new(secret: &str, ttl_seconds: u64) -> Self {
        let mut validation = Validation::default();
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl_seconds: i64::try_from(ttl_seconds).unwrap_or(i64::MAX),
        }
    }

    /// Build claims from a user object, stamping `iat` and `exp`.
    ///
    /// Client-supplied `iat`/`exp` are discarded.
    pub fn claims_for(&self, mut user: Map<String, Value>) -> Claims {
        let iat = Utc::now().timestamp();
        user.remove("iat");
        user.remove("exp");

        Claims {
            iat,
            exp: iat.saturating_add(self.ttl_seconds),
            extra: user,
        }
    }

    /// Sign a user object into a token.
    pub fn issue(&self, user: Map<String, Value>) -> Result<String, jsonwebtoken::errors::Error> {
        self.sign(&self.claims_for(user))
    }

    /// Sign prepared claims.
    pub fn sign(&self, claims: &Claims) -> Result<String, jsonwebtoken::errors::Error> {
        encode(&Header::default(), claims, &self.encoding)
    }

    /// Check signature and expiry, returning the decoded claims.
    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        decode::<Claims>(token, &self.decoding, &self.validation).map(|data| data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn issued_token_verifies_and_keeps_fields() {
        let service = TokenService::new("secret", 3600);
        let token = service
            .issue(user(json!({ "email": "a@b.c", "name": "Ann" })))
            .unwrap();

        let claims = service.verify(&token).unwrap();
        assert_eq!(claims.email(), Some("a@b.c"));
        assert_eq!(claims.extra.get("name"), Some(&json!("Ann")));
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn client_supplied_expiry_is_ignored() {
        let service = TokenService::new("secret", 60);
        let claims = service.claims_for(user(json!({ "email": "a@b.c", "exp": 9_999_999_999_i64 })));
        assert_eq!(claims.exp - claims.iat, 60);
        assert!(!claims.extra.contains_key("exp"));
    }

    #[test]
    fn non_string_email_stays_in_payload() {
        let service = TokenService::new("secret", 3600);
        let token = service.issue(user(json!({ "email": 5, "name": "Ann" }))).unwrap();

        let claims = service.verify(&token).unwrap();
        assert_eq!(claims.email(), None);
        assert_eq!(claims.extra.get("email"), Some(&json!(5)));
        assert_eq!(claims.extra.get("name"), Some(&json!("Ann")));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = TokenService::new("one", 3600)
            .issue(user(json!({ "email": "a@b.c" })))
            .unwrap();
        assert!(TokenService::new("two", 3600).verify(&token).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let service = TokenService::new("secret", 3600);
        let now = Utc::now().timestamp();
        let claims = Claims {
            iat: now - 7200,
            exp: now - 3600,
            extra: user(json!({ "email": "a@b.c" })),
        };
        let token = service.sign(&claims).unwrap();
        assert!(service.verify(&token).is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        let service = TokenService::new("secret", 3600);
        assert!(service.verify("not.a.token").is_err());
        assert!(service.verify("").is_err());
    }
}
