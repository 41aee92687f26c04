//! Password hashing and bearer tokens
//!
//! Passwords are stored as `pbkdf2-sha256$<iterations>$<salt>$<hash>` with
//! base64 salt and hash. Tokens are `<claims>.<signature>`, both base64url:
//! the claims are JSON and the signature is HMAC-SHA256 over the encoded
//! claims.

use crate::config::AuthConfig;
use crate::error::{Error, Result};
use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use base64::Engine as _;
use rand::RngCore;
use ring::{hmac, pbkdf2};
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;

const HASH_SCHEME: &str = "pbkdf2-sha256";
const SALT_LEN: usize = 16;
const HASH_LEN: usize = 32;

/// PBKDF2-HMAC-SHA256 password hasher
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    iterations: NonZeroU32,
}

impl PasswordHasher {
    pub fn new(iterations: u32) -> Result<Self> {
        let iterations = NonZeroU32::new(iterations)
            .ok_or_else(|| Error::Config("PBKDF2 iterations must be positive".to_string()))?;
        Ok(Self { iterations })
    }

    /// Hash `password` with a fresh random salt
    pub fn hash(&self, password: &str) -> String {
        let mut salt = [0u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut salt);

        let mut hash = [0u8; HASH_LEN];
        pbkdf2::derive(
            pbkdf2::PBKDF2_HMAC_SHA256,
            self.iterations,
            &salt,
            password.as_bytes(),
            &mut hash,
        );

        format!(
            "{}${}${}${}",
            HASH_SCHEME,
            self.iterations,
            STANDARD_NO_PAD.encode(salt),
            STANDARD_NO_PAD.encode(hash)
        )
    }

    /// Check `password` against a stored hash; malformed hashes never match
    pub fn verify(&self, password: &str, stored: &str) -> bool {
        let mut parts = stored.split('$');
        let (Some(scheme), Some(iterations), Some(salt), Some(hash), None) = (
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
        ) else {
            return false;
        };
        if scheme != HASH_SCHEME {
            return false;
        }

        let Some(iterations) = iterations.parse().ok().and_then(NonZeroU32::new) else {
            return false;
        };
        let (Ok(salt), Ok(hash)) = (STANDARD_NO_PAD.decode(salt), STANDARD_NO_PAD.decode(hash))
        else {
            return false;
        };

        pbkdf2::verify(
            pbkdf2::PBKDF2_HMAC_SHA256,
            iterations,
            &salt,
            password.as_bytes(),
            &hash,
        )
        .is_ok()
    }
}

/// Claims carried by a bearer token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: String,
    pub email: String,
    /// Expiry, Unix seconds
    pub exp: i64,
}

/// Issues and verifies HMAC-signed bearer tokens
pub struct TokenIssuer {
    key: hmac::Key,
    ttl_secs: i64,
}

impl TokenIssuer {
    pub fn new(secret: &[u8], ttl_secs: u64) -> Self {
        Self {
            key: hmac::Key::new(hmac::HMAC_SHA256, secret),
            ttl_secs: ttl_secs as i64,
        }
    }

    /// Build an issuer from config; an empty secret is replaced with a random
    /// one, so tokens do not survive a restart
    pub fn from_config(config: &AuthConfig) -> Self {
        if config.token_secret.is_empty() {
            tracing::warn!("No token secret configured, using a random per-process secret");
            let mut secret = [0u8; 32];
            rand::thread_rng().fill_bytes(&mut secret);
            return Self::new(&secret, config.token_ttl_secs);
        }
        Self::new(config.token_secret.as_bytes(), config.token_ttl_secs)
    }

    /// Issue a token for a user, valid for the configured lifetime
    pub fn issue(&self, user_id: &str, email: &str) -> Result<String> {
        self.issue_at(user_id, email, chrono::Utc::now().timestamp())
    }

    pub fn issue_at(&self, user_id: &str, email: &str, now: i64) -> Result<String> {
        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            exp: now + self.ttl_secs,
        };
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?);
        let signature = hmac::sign(&self.key, payload.as_bytes());
        Ok(format!("{}.{}", payload, URL_SAFE_NO_PAD.encode(signature.as_ref())))
    }

    /// Verify signature and expiry, returning the claims
    pub fn verify(&self, token: &str) -> Result<Claims> {
        self.verify_at(token, chrono::Utc::now().timestamp())
    }

    pub fn verify_at(&self, token: &str, now: i64) -> Result<Claims> {
        let (payload, signature) = token
            .split_once('.')
            .ok_or_else(|| Error::Unauthorized("malformed token".to_string()))?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| Error::Unauthorized("malformed token signature".to_string()))?;
        hmac::verify(&self.key, payload.as_bytes(), &signature)
            .map_err(|_| Error::Unauthorized("invalid token signature".to_string()))?;

        let claims: Claims = URL_SAFE_NO_PAD
            .decode(payload)
            .ok()
            .and_then(|bytes| serde_json::from_slice(&bytes).ok())
            .ok_or_else(|| Error::Unauthorized("malformed token claims".to_string()))?;
        if claims.exp <= now {
            return Err(Error::Unauthorized("token expired".to_string()));
        }
        Ok(claims)
    }
}
