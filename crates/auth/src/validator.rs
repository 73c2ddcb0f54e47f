use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

use crate::claims::{validate_claims, JwtClaims, TokenValidationError};

/// Verifies a bearer token and returns its claims.
///
/// `now` is a parameter so expiry checks stay deterministic under test.
pub trait JwtValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>)
        -> Result<JwtClaims, TokenValidationError>;
}

/// HS256 (shared-secret) validator.
pub struct Hs256JwtValidator {
    key: DecodingKey,
}

impl Hs256JwtValidator {
    pub fn new(secret: Vec<u8>) -> Self {
        Self {
            key: DecodingKey::from_secret(&secret),
        }
    }
}

impl JwtValidator for Hs256JwtValidator {
    fn validate(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<JwtClaims, TokenValidationError> {
        // The time window lives in our own claim names, so jsonwebtoken's
        // registered-claim checks are switched off and validate_claims runs
        // instead.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let data = decode::<JwtClaims>(token, &self.key, &validation)
            .map_err(|_| TokenValidationError::Invalid)?;
        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use jsonwebtoken::{encode, EncodingKey, Header};

    use velo_core::UserId;

    use super::*;
    use crate::Role;

    const SECRET: &[u8] = b"velo-test-secret";

    fn mint(claims: &JwtClaims, secret: &[u8]) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret),
        )
        .unwrap()
    }

    fn fresh_claims(now: DateTime<Utc>) -> JwtClaims {
        JwtClaims {
            sub: UserId::new(),
            roles: vec![Role::CUSTOMER],
            issued_at: now - Duration::minutes(1),
            expires_at: now + Duration::minutes(30),
        }
    }

    #[test]
    fn round_trips_a_well_formed_token() {
        let now = Utc::now();
        let claims = fresh_claims(now);
        let token = mint(&claims, SECRET);

        let validator = Hs256JwtValidator::new(SECRET.to_vec());
        let decoded = validator.validate(&token, now).unwrap();
        assert_eq!(decoded, claims);
    }

    #[test]
    fn wrong_secret_is_invalid() {
        let now = Utc::now();
        let token = mint(&fresh_claims(now), b"some-other-secret");

        let validator = Hs256JwtValidator::new(SECRET.to_vec());
        assert_eq!(
            validator.validate(&token, now),
            Err(TokenValidationError::Invalid)
        );
    }

    #[test]
    fn garbage_is_invalid() {
        let validator = Hs256JwtValidator::new(SECRET.to_vec());
        assert_eq!(
            validator.validate("not-a-jwt", Utc::now()),
            Err(TokenValidationError::Invalid)
        );
    }

    #[test]
    fn expired_token_is_rejected_after_signature_check() {
        let now = Utc::now();
        let mut claims = fresh_claims(now);
        claims.issued_at = now - Duration::hours(2);
        claims.expires_at = now - Duration::hours(1);
        let token = mint(&claims, SECRET);

        let validator = Hs256JwtValidator::new(SECRET.to_vec());
        assert_eq!(
            validator.validate(&token, now),
            Err(TokenValidationError::Expired)
        );
    }
}
