//! Signed retrieval handles.
//!
//! A handle is a JWT naming the storage key, the download filename and an
//! expiry. It is embedded in the path of `{public_url}/blobs/{token}`.

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::{FiledropError, Result};

/// Audience of retrieval handles. Session tokens share the secret but not
/// the audience, so neither kind verifies as the other.
pub const BLOB_AUDIENCE: &str = "filedrop:blob";

/// Claims carried by a retrieval handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobClaims {
    /// Storage key of the blob.
    pub key: String,
    /// Filename offered to the recipient.
    pub name: String,
    /// Expiration (Unix seconds).
    pub exp: i64,
    /// Always [`BLOB_AUDIENCE`].
    pub aud: String,
}

/// Issues and verifies retrieval handles.
#[derive(Clone)]
pub struct HandleSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    public_url: String,
}

impl HandleSigner {
    /// Create a signer from the server secret and the public base URL.
    pub fn new(secret: &str, public_url: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against the injected clock in `verify`.
        validation.validate_exp = false;
        validation.set_audience(&[BLOB_AUDIENCE]);

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            public_url: public_url.trim_end_matches('/').to_string(),
        }
    }

    /// Sign a handle and return the full retrieval URL.
    pub fn sign_url(&self, key: &str, name: &str, expires_at: DateTime<Utc>) -> Result<String> {
        let claims = BlobClaims {
            key: key.to_string(),
            name: name.to_string(),
            exp: expires_at.timestamp(),
            aud: BLOB_AUDIENCE.to_string(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| FiledropError::Storage(format!("failed to sign retrieval handle: {e}")))?;

        Ok(format!("{}/blobs/{}", self.public_url, token))
    }

    /// Verify a handle token, rejecting bad signatures and handles past their expiry.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<BlobClaims> {
        let data = decode::<BlobClaims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            tracing::debug!("retrieval handle rejected: {}", e);
            FiledropError::Auth("invalid retrieval handle".to_string())
        })?;

        if data.claims.exp < now.timestamp() {
            return Err(FiledropError::Auth("retrieval handle expired".to_string()));
        }

        Ok(data.claims)
    }
}

impl std::fmt::Debug for HandleSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandleSigner")
            .field("public_url", &self.public_url)
            .finish_non_exhaustive()
    }
}
