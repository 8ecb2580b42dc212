//! JWT bearer authentication and role policies.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json,
    body::Body,
    extract::State,
    http::{Request, StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// Token issuing and validation settings.
#[derive(Clone)]
pub struct JwtOptions {
    pub issuer: String,
    pub audience: String,
    pub signing_key: String,
    pub clock_skew: Duration,
    pub token_lifetime: Duration,
}

impl std::fmt::Debug for JwtOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtOptions")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("signing_key", &"<redacted>")
            .field("clock_skew", &self.clock_skew)
            .field("token_lifetime", &self.token_lifetime)
            .finish()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Token error: {0}")]
    Internal(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match &self {
            AuthError::Unauthorized => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden => StatusCode::FORBIDDEN,
            AuthError::Internal(msg) => {
                tracing::error!(error = %msg, "Token handling failed");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!({ "error": "An unexpected error occurred." })),
                )
                    .into_response();
            }
        };

        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    #[serde(default)]
    roles: Vec<String>,
    iss: String,
    aud: String,
    nbf: i64,
    iat: i64,
    exp: i64,
}

/// Authenticated caller, attached to request extensions by [`auth_middleware`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub client_id: String,
    pub roles: Vec<String>,
}

impl Principal {
    pub fn has_any_role(&self, accepted: &[&str]) -> bool {
        self.roles
            .iter()
            .any(|role| accepted.iter().any(|a| a.eq_ignore_ascii_case(role)))
    }
}

/// Named authorization policies, each satisfied by any one of its roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    RatesRead,
    Convert,
    HistoryRead,
}

impl Policy {
    pub fn accepted_roles(&self) -> &'static [&'static str] {
        match self {
            Policy::RatesRead => &["rates.read", "admin"],
            Policy::Convert => &["convert", "admin"],
            Policy::HistoryRead => &["history.read", "admin"],
        }
    }

    pub fn allows(&self, principal: &Principal) -> bool {
        principal.has_any_role(self.accepted_roles())
    }
}

/// HS256 token service.
pub struct JwtTokenService {
    options: JwtOptions,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtTokenService {
    pub fn new(options: JwtOptions) -> Self {
        let encoding_key = EncodingKey::from_secret(options.signing_key.as_bytes());
        let decoding_key = DecodingKey::from_secret(options.signing_key.as_bytes());

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = options.clock_skew.as_secs();
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.set_issuer(&[options.issuer.as_str()]);
        validation.set_audience(&[options.audience.as_str()]);
        validation.set_required_spec_claims(&["exp", "nbf", "iss", "aud", "sub"]);

        Self {
            options,
            encoding_key,
            decoding_key,
            validation,
        }
    }

    /// Signs a token for `client_id`. Blank roles are dropped and duplicates
    /// removed case-insensitively, keeping the first spelling.
    pub fn create_token(&self, client_id: &str, roles: &[String]) -> Result<String, AuthError> {
        let now = chrono::Utc::now().timestamp();

        let mut seen = HashSet::new();
        let roles = roles
            .iter()
            .map(|r| r.trim())
            .filter(|r| !r.is_empty())
            .filter(|r| seen.insert(r.to_ascii_lowercase()))
            .map(str::to_string)
            .collect();

        let claims = Claims {
            sub: client_id.to_string(),
            roles,
            iss: self.options.issuer.clone(),
            aud: self.options.audience.clone(),
            nbf: now,
            iat: now,
            exp: now + self.options.token_lifetime.as_secs() as i64,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(format!("Failed to sign token: {e}")))
    }

    /// Validates signature, issuer, audience and lifetime.
    pub fn validate_token(&self, token: &str) -> Result<Principal, AuthError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| Principal {
                client_id: data.claims.sub,
                roles: data.claims.roles,
            })
            .map_err(|err| {
                tracing::debug!(error = %err, "Bearer token rejected");
                AuthError::Unauthorized
            })
    }
}

fn bearer_token(header: Option<&str>) -> Option<&str> {
    let token = header?.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}

/// Validates the bearer token and attaches the [`Principal`].
pub async fn auth_middleware(
    State(tokens): State<Arc<JwtTokenService>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let Some(token) = bearer_token(header) else {
        return AuthError::Unauthorized.into_response();
    };

    match tokens.validate_token(token) {
        Ok(principal) => {
            tracing::Span::current().record("client_id", principal.client_id.as_str());
            request.extensions_mut().insert(principal);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

/// Per-route policy check; runs after [`auth_middleware`].
pub async fn authorize(State(policy): State<Policy>, request: Request<Body>, next: Next) -> Response {
    match request.extensions().get::<Principal>() {
        Some(principal) if policy.allows(principal) => next.run(request).await,
        Some(principal) => {
            tracing::info!(client_id = %principal.client_id, ?policy, "Policy denied");
            AuthError::Forbidden.into_response()
        }
        None => AuthError::Unauthorized.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> JwtOptions {
        JwtOptions {
            issuer: "currency-converter".into(),
            audience: "currency-converter".into(),
            signing_key: "0123456789abcdef0123456789abcdef".into(),
            clock_skew: Duration::from_secs(30),
            token_lifetime: Duration::from_secs(3600),
        }
    }

    #[test]
    fn test_token_round_trip_dedupes_roles() {
        let service = JwtTokenService::new(options());
        let roles = vec![
            "admin".to_string(),
            "ADMIN".to_string(),
            " ".to_string(),
            "rates.read".to_string(),
        ];

        let token = service.create_token("client-1", &roles).unwrap();
        let principal = service.validate_token(&token).unwrap();

        assert_eq!(principal.client_id, "client-1");
        assert_eq!(principal.roles, vec!["admin".to_string(), "rates.read".to_string()]);
    }

    #[test]
    fn test_wrong_key_is_unauthorized() {
        let token = JwtTokenService::new(options()).create_token("c", &[]).unwrap();

        let mut other = options();
        other.signing_key = "ffffffffffffffffffffffffffffffff".into();
        let result = JwtTokenService::new(other).validate_token(&token);
        assert!(matches!(result, Err(AuthError::Unauthorized)));
    }

    #[test]
    fn test_wrong_audience_is_unauthorized() {
        let token = JwtTokenService::new(options()).create_token("c", &[]).unwrap();

        let mut other = options();
        other.audience = "someone-else".into();
        let result = JwtTokenService::new(other).validate_token(&token);
        assert!(matches!(result, Err(AuthError::Unauthorized)));
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(Some("Bearer abc")), Some("abc"));
        assert_eq!(bearer_token(Some("Bearer   ")), None);
        assert_eq!(bearer_token(Some("abc")), None);
        assert_eq!(bearer_token(None), None);
    }

    #[test]
    fn test_policies() {
        let principal = Principal {
            client_id: "c".into(),
            roles: vec!["Rates.Read".into()],
        };
        assert!(Policy::RatesRead.allows(&principal));
        assert!(!Policy::Convert.allows(&principal));
        assert!(!Policy::HistoryRead.allows(&principal));

        let admin = Principal {
            client_id: "a".into(),
            roles: vec!["admin".into()],
        };
        assert!(Policy::Convert.allows(&admin));
        assert!(Policy::HistoryRead.allows(&admin));
    }

    #[test]
    fn test_token_lifetime_starts_now() {
        let service = JwtTokenService::new(options());
        let before = chrono::Utc::now().timestamp();
        let token = service.create_token("client-1", &[]).unwrap();

        let claims = decode::<Claims>(&token, &service.decoding_key, &service.validation)
            .unwrap()
            .claims;

        assert!(claims.iat >= before && claims.iat <= before + 5);
        assert_eq!(claims.nbf, claims.iat);
        assert_eq!(claims.exp - claims.iat, 3600);
    }
}
