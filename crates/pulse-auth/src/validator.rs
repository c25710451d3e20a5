//! Token validation — the gateway's external credential collaborator.

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};

use pulse_core::config::auth::AuthConfig;
use pulse_core::error::AppError;
use pulse_core::principal::Principal;

use super::claims::Claims;

/// Validates a bearer credential and produces the authenticated principal.
///
/// Implementations must be pure per call: validation results are never
/// cached across connections by the gateway itself.
#[async_trait]
pub trait TokenValidator: Send + Sync + std::fmt::Debug {
    /// Validate a raw bearer token.
    async fn validate(&self, token: &str) -> Result<Principal, AppError>;
}

/// Validates HMAC-signed JWT access tokens.
#[derive(Clone)]
pub struct JwtTokenValidator {
    /// HMAC secret key for verification.
    decoding_key: DecodingKey,
    /// Validation configuration.
    validation: Validation,
}

impl std::fmt::Debug for JwtTokenValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtTokenValidator")
            .field("validation", &self.validation)
            .finish()
    }
}

impl JwtTokenValidator {
    /// Creates a new validator from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = config.leeway_seconds;

        Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        }
    }
}

#[async_trait]
impl TokenValidator for JwtTokenValidator {
    async fn validate(&self, token: &str) -> Result<Principal, AppError> {
        let token_data =
            decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                        AppError::unauthenticated("Token has expired")
                    }
                    jsonwebtoken::errors::ErrorKind::InvalidToken => {
                        AppError::unauthenticated("Invalid token format")
                    }
                    jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                        AppError::unauthenticated("Invalid token signature")
                    }
                    _ => AppError::unauthenticated(format!("Token validation failed: {e}")),
                }
            })?;

        Ok(token_data.claims.into_principal())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use pulse_core::principal::Role;
    use uuid::Uuid;

    fn make_validator(secret: &str) -> JwtTokenValidator {
        JwtTokenValidator::new(&AuthConfig {
            jwt_secret: secret.to_string(),
            ..AuthConfig::default()
        })
    }

    fn make_token(secret: &str, exp_offset_seconds: i64) -> String {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: Uuid::new_v4(),
            sid: Uuid::new_v4(),
            roles: vec![Role::User],
            iat: now,
            exp: now + exp_offset_seconds,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_valid_token_yields_authenticated_principal() {
        let validator = make_validator("secret");
        let token = make_token("secret", 3600);
        let principal = validator.validate(&token).await.unwrap();
        assert!(principal.is_authenticated());
        assert!(principal.has_role(Role::User));
    }

    #[tokio::test]
    async fn test_expired_token_is_rejected() {
        let validator = make_validator("secret");
        let token = make_token("secret", -3600);
        let err = validator.validate(&token).await.unwrap_err();
        assert_eq!(err.kind, pulse_core::ErrorKind::Authentication);
    }

    #[tokio::test]
    async fn test_wrong_signature_is_rejected() {
        let validator = make_validator("secret");
        let token = make_token("other-secret", 3600);
        assert!(validator.validate(&token).await.is_err());
    }

    #[tokio::test]
    async fn test_garbage_token_is_rejected() {
        let validator = make_validator("secret");
        assert!(validator.validate("not-a-jwt").await.is_err());
    }
}
