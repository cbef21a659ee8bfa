//! Signed redirect tokens.
//!
//! A token is an HS256 JWT carrying the real destination in a `target`
//! claim. It lives for [`TOKEN_TTL`] and is never stored anywhere: the
//! signature and the expiry are the whole check. Nothing prevents replay
//! inside the window.

use std::time::Duration;

use jsonwebtoken::{
    decode, encode, get_current_timestamp, Algorithm, DecodingKey, EncodingKey, Header,
    Validation,
};
use serde::{Deserialize, Serialize};
use url::Url;

/// Fixed token lifetime.
pub const TOKEN_TTL: Duration = Duration::from_secs(30);

/// Claims carried by a redirect token. Extra or missing fields are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Claims {
    /// Absolute URL the verifier redirects to.
    pub target: String,
    /// Issued-at, seconds since the Unix epoch.
    pub iat: u64,
    /// Expiry, seconds since the Unix epoch.
    pub exp: u64,
}

/// Token failures.
///
/// `Invalid` deliberately folds expiry, tampering and malformed input into
/// one variant; callers only log the source.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("failed to sign token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),

    #[error("invalid token: {0}")]
    Invalid(String),
}

/// Issues and verifies redirect tokens with one shared secret.
pub struct TokenSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenSigner {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// A signer holding an RSA key under an HS256 header; every `issue` fails.
    #[cfg(test)]
    pub(crate) fn misconfigured() -> Self {
        Self {
            encoding: EncodingKey::from_rsa_der(&[]),
            ..Self::new("unused")
        }
    }

    /// Signs a token for `target`, valid from now for [`TOKEN_TTL`].
    pub fn issue(&self, target: &str) -> Result<String, TokenError> {
        self.issue_at(target, get_current_timestamp())
    }

    /// Signs a token as if issued at `iat` (Unix seconds).
    pub fn issue_at(&self, target: &str, iat: u64) -> Result<String, TokenError> {
        let claims = Claims {
            target: target.to_owned(),
            iat,
            exp: iat + TOKEN_TTL.as_secs(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(TokenError::Signing)
    }

    /// Checks signature and expiry and returns the claims.
    ///
    /// The `target` claim must also parse as an absolute URL.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|e| TokenError::Invalid(e.to_string()))?;

        // jsonwebtoken still accepts `exp == now`; a 30 s token is dead at second 30.
        if get_current_timestamp() >= data.claims.exp {
            return Err(TokenError::Invalid("token expired".into()));
        }

        let target = Url::parse(&data.claims.target)
            .map_err(|e| TokenError::Invalid(format!("target: {e}")))?;
        if target.cannot_be_a_base() {
            return Err(TokenError::Invalid("target is not an absolute URL".into()));
        }

        Ok(data.claims)
    }
}
