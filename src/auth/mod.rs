/*!
 * # Authentication and Authorization
 *
 * Bearer JWTs (HS256) issued at register/login carry the user id, display
 * name, email and roles. Handlers opt in through extractors:
 *
 * - [`AuthUser`]: any signed-in user, 401 otherwise
 * - [`AdminUser`]: role `admin`, 403 for other users
 * - [`CustomerUser`]: signed-in non-admin (reviews are written by shoppers)
 * - [`MaybeAuthUser`]: identity when a valid token is present, anonymous otherwise
 * - [`StreamAdmin`]: admin check that also accepts `?token=` because
 *   `EventSource` cannot send headers
 */

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, Query},
    http::{header, request::Parts},
    response::{IntoResponse, Response},
};
use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::errors::ServiceError;

pub const ADMIN_ROLE: &str = "admin";
pub const CUSTOMER_ROLE: &str = "customer";

/// Claim structure for JWT tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,        // User ID
    pub name: String,       // Display name
    pub email: String,      // Login email
    pub roles: Vec<String>, // "admin" and/or "customer"
    pub jti: String,        // Token id
    pub iat: i64,           // Issued at
    pub exp: i64,           // Expiration
    pub iss: String,        // Issuer
}

/// Authenticated user data extracted from the JWT token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub roles: Vec<String>,
}

impl AuthUser {
    /// Check if the user has a specific role
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Check if the user is an admin
    pub fn is_admin(&self) -> bool {
        self.has_role(ADMIN_ROLE)
    }

    /// Owners and admins may see a resource
    pub fn can_access(&self, owner_id: Uuid) -> bool {
        self.user_id == owner_id || self.is_admin()
    }
}

impl TryFrom<Claims> for AuthUser {
    type Error = AuthError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidToken)?;
        Ok(AuthUser {
            user_id,
            name: claims.name,
            email: claims.email,
            roles: claims.roles,
        })
    }
}

/// Authentication configuration
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub token_expiration: Duration,
}

impl AuthConfig {
    pub fn new(jwt_secret: String, jwt_issuer: String, token_expiration: Duration) -> Self {
        Self {
            jwt_secret,
            jwt_issuer,
            token_expiration,
        }
    }
}

/// Issues and validates tokens and hashes passwords
#[derive(Debug, Clone)]
pub struct AuthService {
    config: AuthConfig,
}

impl AuthService {
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    /// Generate a JWT for a user
    pub fn issue_token(
        &self,
        user_id: Uuid,
        name: &str,
        email: &str,
        is_admin: bool,
    ) -> Result<String, AuthError> {
        let now = Utc::now();
        let exp = now
            + ChronoDuration::from_std(self.config.token_expiration)
                .map_err(|_| AuthError::InternalError("Invalid token duration".to_string()))?;

        let mut roles = vec![CUSTOMER_ROLE.to_string()];
        if is_admin {
            roles.push(ADMIN_ROLE.to_string());
        }

        let claims = Claims {
            sub: user_id.to_string(),
            name: name.to_string(),
            email: email.to_string(),
            roles,
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            iss: self.config.jwt_issuer.clone(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::TokenCreation(e.to_string()))
    }

    /// Validate a JWT and extract the claims
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.config.jwt_issuer.as_str()]);

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => {
                debug!(error = %e, "rejected bearer token");
                AuthError::InvalidToken
            }
        })
    }

    pub fn authenticate(&self, token: &str) -> Result<AuthUser, AuthError> {
        self.validate_token(token)?.try_into()
    }

    pub fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::InternalError(format!("password hashing failed: {}", e)))
    }

    pub fn verify_password(&self, password: &str, password_hash: &str) -> bool {
        PasswordHash::new(password_hash)
            .map(|parsed| {
                Argon2::default()
                    .verify_password(password.as_bytes(), &parsed)
                    .is_ok()
            })
            .unwrap_or(false)
    }
}

/// Authentication error types
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Not authorized, no token")]
    MissingToken,

    #[error("Not authorized, token failed")]
    InvalidToken,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Not authorized as an admin")]
    AdminRequired,

    #[error("Admins cannot perform this action")]
    CustomerOnly,

    #[error("Token creation failed: {0}")]
    TokenCreation(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<AuthError> for ServiceError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingToken
            | AuthError::InvalidToken
            | AuthError::TokenExpired
            | AuthError::InvalidCredentials => ServiceError::Unauthorized(err.to_string()),
            AuthError::AdminRequired | AuthError::CustomerOnly => {
                ServiceError::Forbidden(err.to_string())
            }
            AuthError::TokenCreation(msg) | AuthError::InternalError(msg) => {
                ServiceError::InternalError(msg)
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        ServiceError::from(self).into_response()
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    Arc<AuthService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth = Arc::<AuthService>::from_ref(state);
        let token = bearer_token(parts).ok_or(AuthError::MissingToken)?;
        auth.authenticate(token)
    }
}

/// Signed-in administrator
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    Arc<AuthService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            return Err(AuthError::AdminRequired);
        }
        Ok(AdminUser(user))
    }
}

/// Signed-in shopper that is not an admin
#[derive(Debug, Clone)]
pub struct CustomerUser(pub AuthUser);

#[async_trait]
impl<S> FromRequestParts<S> for CustomerUser
where
    Arc<AuthService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if user.is_admin() {
            return Err(AuthError::CustomerOnly);
        }
        Ok(CustomerUser(user))
    }
}

/// Identity when a valid bearer token accompanies a public request
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

#[async_trait]
impl<S> FromRequestParts<S> for MaybeAuthUser
where
    Arc<AuthService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth = Arc::<AuthService>::from_ref(state);
        Ok(MaybeAuthUser(
            bearer_token(parts).and_then(|token| auth.authenticate(token).ok()),
        ))
    }
}

#[derive(Debug, Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

/// Admin for long-lived event streams; the token may come from `?token=`
#[derive(Debug, Clone)]
pub struct StreamAdmin(pub AuthUser);

#[async_trait]
impl<S> FromRequestParts<S> for StreamAdmin
where
    Arc<AuthService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth = Arc::<AuthService>::from_ref(state);
        let query_token = Query::<TokenQuery>::try_from_uri(&parts.uri)
            .ok()
            .and_then(|Query(q)| q.token);
        let token = bearer_token(parts)
            .map(str::to_string)
            .or(query_token)
            .ok_or(AuthError::MissingToken)?;

        let user = auth.authenticate(&token)?;
        if !user.is_admin() {
            return Err(AuthError::AdminRequired);
        }
        Ok(StreamAdmin(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> AuthService {
        AuthService::new(AuthConfig::new(
            "unit_test_secret_with_enough_entropy_0123456789".into(),
            "saria-api".into(),
            Duration::from_secs(3600),
        ))
    }

    #[test]
    fn issued_token_round_trips_identity() {
        let auth = service();
        let id = Uuid::new_v4();
        let token = auth.issue_token(id, "Lina", "lina@example.com", false).unwrap();

        let user = auth.authenticate(&token).unwrap();
        assert_eq!(user.user_id, id);
        assert_eq!(user.name, "Lina");
        assert!(!user.is_admin());
        assert!(user.has_role(CUSTOMER_ROLE));
    }

    #[test]
    fn admin_flag_becomes_role() {
        let auth = service();
        let token = auth
            .issue_token(Uuid::new_v4(), "Admin", "admin@example.com", true)
            .unwrap();
        assert!(auth.authenticate(&token).unwrap().is_admin());
    }

    #[test]
    fn token_from_other_issuer_is_rejected() {
        let auth = service();
        let other = AuthService::new(AuthConfig::new(
            "unit_test_secret_with_enough_entropy_0123456789".into(),
            "someone-else".into(),
            Duration::from_secs(3600),
        ));
        let token = other
            .issue_token(Uuid::new_v4(), "X", "x@example.com", false)
            .unwrap();
        assert!(matches!(
            auth.authenticate(&token),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn password_hash_verifies() {
        let auth = service();
        let hash = auth.hash_password("rosewater").unwrap();
        assert!(auth.verify_password("rosewater", &hash));
        assert!(!auth.verify_password("rose", &hash));
        assert!(!auth.verify_password("rosewater", "not-a-hash"));
    }

    #[test]
    fn owner_or_admin_access() {
        let owner = Uuid::new_v4();
        let user = AuthUser {
            user_id: owner,
            name: "A".into(),
            email: "a@example.com".into(),
            roles: vec![CUSTOMER_ROLE.into()],
        };
        assert!(user.can_access(owner));
        assert!(!user.can_access(Uuid::new_v4()));
    }
}
