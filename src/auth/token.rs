//! Access tokens: `herald_<lookup>_<secret>`.
//!
//! The lookup part is stored in clear and indexed; the whole raw token is
//! only ever stored as an Argon2id hash.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{DateTime, Utc};
use rand::Rng;
use rand::distributions::Alphanumeric;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::Token;

const ARGON2_MEMORY_KIB: u32 = 64 * 1024;
const ARGON2_ITERATIONS: u32 = 1;
const ARGON2_PARALLELISM: u32 = 4;
const ARGON2_OUTPUT_LEN: usize = 32;

const TOKEN_PREFIX: &str = "herald";
const LOOKUP_LENGTH: usize = 8;
const SECRET_LENGTH: usize = 24;

pub struct TokenGenerator {
    argon2: Argon2<'static>,
}

impl Default for TokenGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenGenerator {
    #[must_use]
    pub fn new() -> Self {
        // Constant parameters inside argon2's documented bounds.
        let params = Params::new(
            ARGON2_MEMORY_KIB,
            ARGON2_ITERATIONS,
            ARGON2_PARALLELISM,
            Some(ARGON2_OUTPUT_LEN),
        )
        .unwrap_or_default();

        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        }
    }

    /// Issues a ready-to-store token record together with its raw form.
    /// The raw string is shown once to the operator or reader and never kept.
    pub fn issue(
        &self,
        is_admin: bool,
        user_id: Option<String>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<(Token, String)> {
        let lookup = random_chars(LOOKUP_LENGTH).to_ascii_lowercase();
        let raw = format!("{TOKEN_PREFIX}_{lookup}_{}", random_chars(SECRET_LENGTH));

        let token = Token {
            id: Uuid::new_v4().to_string(),
            token_hash: self.hash(&raw)?,
            token_lookup: lookup,
            is_admin,
            user_id,
            created_at: Utc::now(),
            expires_at,
            last_used_at: None,
        };
        Ok((token, raw))
    }

    pub fn hash(&self, raw: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(raw.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| Error::Crypto(format!("failed to hash token: {e}")))
    }

    /// Checks a raw token against a stored PHC hash. A mismatch is `Ok(false)`;
    /// only a corrupt hash is an error.
    pub fn verify(&self, raw: &str, hash: &str) -> Result<bool> {
        let parsed = PasswordHash::new(hash)
            .map_err(|e| Error::Crypto(format!("invalid hash format: {e}")))?;

        match self.argon2.verify_password(raw.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(Error::Crypto(format!("failed to verify token: {e}"))),
        }
    }
}

fn random_chars(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Splits a raw token into `(lookup, secret)`.
pub fn parse_token(raw: &str) -> Result<(String, String)> {
    let rest = raw
        .strip_prefix(TOKEN_PREFIX)
        .and_then(|r| r.strip_prefix('_'))
        .ok_or(Error::InvalidTokenFormat)?;
    let (lookup, secret) = rest.split_once('_').ok_or(Error::InvalidTokenFormat)?;

    let well_formed = |part: &str, len: usize| {
        part.len() == len && part.chars().all(|c| c.is_ascii_alphanumeric())
    };
    if !well_formed(lookup, LOOKUP_LENGTH) || !well_formed(secret, SECRET_LENGTH) {
        return Err(Error::InvalidTokenFormat);
    }

    Ok((lookup.to_string(), secret.to_string()))
}
