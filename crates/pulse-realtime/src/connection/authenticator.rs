//! Connection authentication — resolves the bearer credential presented
//! at handshake time into a [`Principal`].

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use pulse_auth::TokenValidator;
use pulse_core::config::auth::RuntimeMode;
use pulse_core::error::AppError;
use pulse_core::principal::Principal;

/// Authenticates new connections against the external token validator.
///
/// Stateless per call: every connection attempt is validated
/// independently, with no caching of results across connections.
#[derive(Debug, Clone)]
pub struct ConnectionAuthenticator {
    validator: Arc<dyn TokenValidator>,
    mode: RuntimeMode,
}

impl ConnectionAuthenticator {
    /// Creates an authenticator for the given runtime mode.
    pub fn new(validator: Arc<dyn TokenValidator>, mode: RuntimeMode) -> Self {
        Self { validator, mode }
    }

    /// Resolves an optional bearer credential into a principal.
    ///
    /// A missing credential yields a synthetic anonymous principal in
    /// development mode and `Unauthenticated` in production. Invalid
    /// credentials are rejected in both modes.
    pub async fn authenticate(&self, credential: Option<&str>) -> Result<Principal, AppError> {
        match credential {
            Some(token) => self.validator.validate(token).await,
            None => match self.mode {
                RuntimeMode::Development => {
                    debug!("No credential presented, issuing anonymous principal");
                    Ok(Principal::anonymous())
                }
                RuntimeMode::Production => {
                    Err(AppError::unauthenticated("Missing bearer credential"))
                }
            },
        }
    }

    /// The configured runtime mode.
    pub fn mode(&self) -> RuntimeMode {
        self.mode
    }
}

/// Extracts a bearer token from connection handshake parameters.
///
/// Accepts either `authorization: "Bearer <token>"` or `token: "<token>"`.
pub fn bearer_from_params(params: &HashMap<String, String>) -> Option<String> {
    if let Some(auth) = params.get("authorization") {
        if let Some(token) = auth.strip_prefix("Bearer ") {
            return Some(token.trim().to_string());
        }
    }
    params.get("token").map(|t| t.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pulse_core::ErrorKind;

    #[derive(Debug)]
    struct FixedValidator {
        accept: bool,
    }

    #[async_trait]
    impl TokenValidator for FixedValidator {
        async fn validate(&self, _token: &str) -> Result<Principal, AppError> {
            if self.accept {
                Ok(Principal::authenticated(
                    pulse_core::types::UserId::new(),
                    pulse_core::types::SessionId::new(),
                    vec![],
                ))
            } else {
                Err(AppError::unauthenticated("Invalid token"))
            }
        }
    }

    #[tokio::test]
    async fn test_missing_credential_development_mode() {
        let auth = ConnectionAuthenticator::new(
            Arc::new(FixedValidator { accept: true }),
            RuntimeMode::Development,
        );
        let principal = auth.authenticate(None).await.unwrap();
        assert!(!principal.is_authenticated());
    }

    #[tokio::test]
    async fn test_missing_credential_production_mode() {
        let auth = ConnectionAuthenticator::new(
            Arc::new(FixedValidator { accept: true }),
            RuntimeMode::Production,
        );
        let err = auth.authenticate(None).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authentication);
    }

    #[tokio::test]
    async fn test_invalid_credential_rejected_in_both_modes() {
        for mode in [RuntimeMode::Development, RuntimeMode::Production] {
            let auth =
                ConnectionAuthenticator::new(Arc::new(FixedValidator { accept: false }), mode);
            assert!(auth.authenticate(Some("bad")).await.is_err());
        }
    }

    #[test]
    fn test_bearer_extraction() {
        let mut params = HashMap::new();
        params.insert("authorization".to_string(), "Bearer abc123".to_string());
        assert_eq!(bearer_from_params(&params), Some("abc123".to_string()));

        let mut params = HashMap::new();
        params.insert("token".to_string(), "xyz".to_string());
        assert_eq!(bearer_from_params(&params), Some("xyz".to_string()));

        assert_eq!(bearer_from_params(&HashMap::new()), None);
    }
}
