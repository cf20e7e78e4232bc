//! Identity: bearer JWTs issued by the external identity provider.
//!
//! `AuthUser` rejects requests without a valid token. Handlers that also serve
//! anonymous callers take `Option<AuthUser>` instead.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::AppError;
use crate::state::AppState;

/// Who is calling, as asserted by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub exp: usize,
}

/// Validates an HS256 token and returns the identity it carries.
pub fn verify_token(token: &str, secret: &str) -> Result<Identity, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| {
        debug!("JWT validation failed: {e}");
        AppError::Unauthorized
    })?;

    if data.claims.sub.trim().is_empty() {
        return Err(AppError::Unauthorized);
    }

    Ok(Identity {
        user_id: data.claims.sub,
        email: data.claims.email,
    })
}

pub struct AuthUser(pub Identity);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .ok_or(AppError::Unauthorized)?;

        verify_token(token.trim(), &state.config.jwt_secret).map(AuthUser)
    }
}

/// An authenticated identity whose email is on the admin allowlist.
pub struct AdminUser(pub Identity);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let AuthUser(identity) = AuthUser::from_request_parts(parts, state).await?;
        if !state.config.is_admin(&identity.email) {
            return Err(AppError::Forbidden);
        }
        Ok(AdminUser(identity))
    }
}

/// Signs a token the way the identity provider does, for tests.
#[cfg(test)]
pub(crate) fn issue_test_token(sub: &str, email: &str, secret: &str) -> String {
    use jsonwebtoken::{encode, EncodingKey, Header};

    let claims = Claims {
        sub: sub.to_string(),
        email: email.to_string(),
        exp: (chrono::Utc::now().timestamp() + 3600) as usize,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}
