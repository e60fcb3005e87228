use super::config::JwtConfig;
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// Claims carried by an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String, // User id
    pub email: String,
    pub username: String,
    pub iat: i64,
    pub exp: i64,
}

impl JwtClaims {
    /// Numeric user id from `sub`, `None` if the subject is not an integer.
    pub fn user_id(&self) -> Option<i32> {
        self.sub.parse().ok()
    }
}

/// Stateless HS256 token codec.
#[derive(Clone)]
pub struct JwtAuth {
    encoding: EncodingKey,
    decoding: DecodingKey,
    expires_in_secs: i64,
}

impl JwtAuth {
    pub fn new(config: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            expires_in_secs: config.expires_in_secs,
        }
    }

    pub fn expires_in_secs(&self) -> i64 {
        self.expires_in_secs
    }

    /// Sign a token for the given user, valid for the configured lifetime.
    pub fn issue_token(&self, user_id: i32, email: &str, username: &str) -> eyre::Result<String> {
        let now = Utc::now();
        let claims = JwtClaims {
            sub: user_id.to_string(),
            email: email.to_string(),
            username: username.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(self.expires_in_secs)).timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        Ok(token)
    }

    /// Verify signature and expiry, returning the decoded claims.
    pub fn verify_token(&self, token: &str) -> eyre::Result<JwtClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        let data = decode::<JwtClaims>(token, &self.decoding, &validation)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth() -> JwtAuth {
        JwtAuth::new(&JwtConfig::new("test-secret-key-that-is-long-enough-123"))
    }

    #[test]
    fn test_issue_and_verify() {
        let auth = auth();
        let token = auth.issue_token(7, "alice@example.com", "alice").unwrap();
        let claims = auth.verify_token(&token).unwrap();

        assert_eq!(claims.user_id(), Some(7));
        assert_eq!(claims.email, "alice@example.com");
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.exp - claims.iat, 604_800);
    }

    #[test]
    fn test_rejects_token_signed_with_other_secret() {
        let other = JwtAuth::new(&JwtConfig::new("another-secret-key-that-is-long-enough"));
        let token = other.issue_token(1, "a@b.c", "a").unwrap();
        assert!(auth().verify_token(&token).is_err());
    }

    #[test]
    fn test_rejects_expired_token() {
        let auth = JwtAuth::new(
            &JwtConfig::new("test-secret-key-that-is-long-enough-123").with_expires_in(-60),
        );
        let token = auth.issue_token(1, "a@b.c", "a").unwrap();
        assert!(auth.verify_token(&token).is_err());
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(auth().verify_token("not-a-jwt").is_err());
    }

    #[test]
    fn test_non_numeric_subject() {
        let claims = JwtClaims {
            sub: "abc".into(),
            email: String::new(),
            username: String::new(),
            iat: 0,
            exp: 0,
        };
        assert_eq!(claims.user_id(), None);
    }
}
