//! Token signature and validity checks.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde_json::{Map, Value as JsonValue};
use tracing::debug;

use tollgate_core::{AuthError, AuthResult, ClaimSet};

/// Turns a raw token into verified claims.
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str) -> AuthResult<ClaimSet>;
}

/// RS256 verification against one PEM public key.
///
/// Only RS256 is accepted. `aud` is not checked; `exp` is checked unless
/// expiration is ignored.
#[derive(Clone)]
pub struct Rs256Verifier {
    key: DecodingKey,
    validation: Validation,
}

impl Rs256Verifier {
    pub fn from_pem(public_key: &str, ignore_expiration: bool) -> AuthResult<Self> {
        let key = DecodingKey::from_rsa_pem(public_key.as_bytes())
            .map_err(|e| AuthError::configuration(format!("invalid RSA public key: {e}")))?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.validate_aud = false;
        if ignore_expiration {
            validation.validate_exp = false;
            validation.validate_nbf = false;
            validation.required_spec_claims.clear();
        }

        Ok(Self { key, validation })
    }
}

impl core::fmt::Debug for Rs256Verifier {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Rs256Verifier")
            .field("validate_exp", &self.validation.validate_exp)
            .finish_non_exhaustive()
    }
}

impl TokenVerifier for Rs256Verifier {
    fn verify(&self, token: &str) -> AuthResult<ClaimSet> {
        let data = decode::<Map<String, JsonValue>>(token, &self.key, &self.validation).map_err(|e| {
            debug!(error = %e, "token rejected");
            AuthError::invalid_credential(format!("error parsing bearer: {e}"))
        })?;
        Ok(ClaimSet::from(data.claims))
    }
}
