use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::identity::Identity;
use super::AuthError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(flatten)]
    pub identity: Identity,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and validates HS256 access tokens carrying an [`Identity`].
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl JwtManager {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    pub fn issue(&self, identity: Identity) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: identity.subject(),
            identity,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?)
    }

    pub fn validate(&self, token: &str) -> Result<Identity, AuthError> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<Claims>(token, &self.decoding_key, &validation)?;
        Ok(data.claims.identity)
    }

    pub fn ttl_seconds(&self) -> i64 {
        self.ttl.num_seconds()
    }
}

pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .or_else(|| auth_header.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_validate() {
        let jwt = JwtManager::new("test-secret", Duration::minutes(30));
        let identity = Identity::Owner {
            owner_id: 5,
            organization_id: 10,
        };
        let token = jwt.issue(identity.clone()).unwrap();
        assert_eq!(jwt.validate(&token).unwrap(), identity);
    }

    #[test]
    fn test_tampered_token_rejected() {
        let jwt = JwtManager::new("test-secret", Duration::minutes(30));
        let token = jwt.issue(Identity::Operator { operator_id: 42 }).unwrap();

        let other = JwtManager::new("other-secret", Duration::minutes(30));
        assert!(matches!(other.validate(&token), Err(AuthError::Token(_))));

        let admin = jwt.issue(Identity::Admin { admin_id: 1 }).unwrap();
        let parts: Vec<&str> = token.split('.').collect();
        let admin_parts: Vec<&str> = admin.split('.').collect();
        let forged = format!("{}.{}.{}", parts[0], admin_parts[1], parts[2]);
        assert!(jwt.validate(&forged).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let jwt = JwtManager::new("test-secret", Duration::minutes(-10));
        let token = jwt.issue(Identity::Admin { admin_id: 1 }).unwrap();
        assert!(jwt.validate(&token).is_err());
    }

    #[test]
    fn test_claims_carry_role_tag() {
        let claims = Claims {
            sub: "operator:42".into(),
            identity: Identity::Operator { operator_id: 42 },
            iat: 0,
            exp: 1,
        };
        let value = serde_json::to_value(&claims).unwrap();
        assert_eq!(value["role"], "operator");
        assert_eq!(value["operator_id"], 42);
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc123"), Some("abc123"));
        assert_eq!(extract_bearer_token("bearer abc123"), Some("abc123"));
        assert_eq!(extract_bearer_token("Bearer "), None);
        assert_eq!(extract_bearer_token("Basic abc123"), None);
    }
}
