//! Account session tokens (JWT).

use chrono::Duration;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::clock::SharedClock;
use crate::{FiledropError, Result};

/// Audience of account session tokens.
pub const SESSION_AUDIENCE: &str = "filedrop:session";

/// JWT claims of an account session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (user ID).
    pub sub: i64,
    /// Username.
    pub username: String,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
    /// JWT ID (unique identifier).
    pub jti: String,
    /// Always [`SESSION_AUDIENCE`].
    pub aud: String,
}

/// A freshly signed session token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// Encoded JWT.
    pub token: String,
    /// Lifetime in seconds.
    pub expires_in: i64,
}

/// Signs and verifies session tokens.
///
/// Expiry is checked against the injected clock rather than the system
/// time, so tokens and artifacts age together.
#[derive(Clone)]
pub struct SessionKeys {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
    clock: SharedClock,
}

impl SessionKeys {
    /// Create keys from the server secret.
    pub fn new(secret: &str, ttl: Duration, clock: SharedClock) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.set_audience(&[SESSION_AUDIENCE]);

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
            clock,
        }
    }

    /// Token lifetime.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Sign a session token for an account.
    pub fn issue(&self, user_id: i64, username: &str) -> Result<IssuedToken> {
        let now = self.clock.now().timestamp();
        let claims = SessionClaims {
            sub: user_id,
            username: username.to_string(),
            iat: now,
            exp: now + self.ttl.num_seconds(),
            jti: uuid::Uuid::new_v4().to_string(),
            aud: SESSION_AUDIENCE.to_string(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| FiledropError::Auth(format!("failed to sign session token: {e}")))?;

        Ok(IssuedToken {
            token,
            expires_in: self.ttl.num_seconds(),
        })
    }

    /// Verify a session token and return its claims.
    pub fn verify(&self, token: &str) -> Result<SessionClaims> {
        let data = decode::<SessionClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| FiledropError::Auth(format!("invalid session token: {e}")))?;

        if data.claims.exp < self.clock.now().timestamp() {
            return Err(FiledropError::Auth("session token expired".to_string()));
        }

        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::sync::Arc;

    fn keys(secret: &str) -> (SessionKeys, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::starting_now());
        (
            SessionKeys::new(secret, Duration::seconds(900), clock.clone()),
            clock,
        )
    }

    #[test]
    fn test_issue_and_verify() {
        let (keys, _clock) = keys("secret");
        let issued = keys.issue(1, "alice").unwrap();
        assert_eq!(issued.expires_in, 900);

        let claims = keys.verify(&issued.token).unwrap();
        assert_eq!(claims.sub, 1);
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.exp - claims.iat, 900);
    }

    #[test]
    fn test_unique_jti() {
        let (keys, _clock) = keys("secret");
        let a = keys.verify(&keys.issue(1, "alice").unwrap().token).unwrap();
        let b = keys.verify(&keys.issue(1, "alice").unwrap().token).unwrap();
        assert_ne!(a.jti, b.jti);
    }

    #[test]
    fn test_expired_token() {
        let (keys, clock) = keys("secret");
        let issued = keys.issue(1, "alice").unwrap();

        clock.advance(Duration::seconds(901));
        assert!(matches!(keys.verify(&issued.token), Err(FiledropError::Auth(_))));
    }

    #[test]
    fn test_retrieval_handle_is_not_a_session() {
        use crate::clock::Clock;
        use crate::storage::HandleSigner;

        let (keys, clock) = keys("secret");
        let url = HandleSigner::new("secret", "http://localhost:5000")
            .sign_url("key", "a.txt", clock.now() + Duration::minutes(5))
            .unwrap();
        let token = url.rsplit('/').next().unwrap();

        assert!(matches!(keys.verify(token), Err(FiledropError::Auth(_))));
    }

    #[test]
    fn test_wrong_secret() {
        let (a, _) = keys("secret-a");
        let (b, _) = keys("secret-b");
        let issued = a.issue(1, "alice").unwrap();
        assert!(b.verify(&issued.token).is_err());
    }
}
