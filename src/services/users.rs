use crate::{
    auth::{AuthError, AuthService, AuthUser},
    db::DbPool,
    entities::user,
    errors::ServiceError,
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, SqlErr,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Please provide a valid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Fields left out keep their current values
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: Option<String>,
    #[validate(email(message = "Please provide a valid email address"))]
    pub email: Option<String>,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetAdminRequest {
    pub is_admin: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl From<user::Model> for UserResponse {
    fn from(u: user::Model) -> Self {
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
            is_admin: u.is_admin,
            created_at: u.created_at,
        }
    }
}

/// Profile plus a fresh bearer token
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub token: String,
}

#[derive(Clone)]
pub struct UserService {
    db_pool: Arc<DbPool>,
    auth: Arc<AuthService>,
}

impl UserService {
    pub fn new(db_pool: Arc<DbPool>, auth: Arc<AuthService>) -> Self {
        Self { db_pool, auth }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<user::Model>, ServiceError> {
        Ok(user::Entity::find()
            .filter(user::Column::Email.eq(email.trim().to_lowercase()))
            .one(&*self.db_pool)
            .await?)
    }

    fn authenticated(&self, user: user::Model) -> Result<AuthResponse, ServiceError> {
        let token = self
            .auth
            .issue_token(user.id, &user.name, &user.email, user.is_admin)?;
        Ok(AuthResponse {
            user: user.into(),
            token,
        })
    }

    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn register(&self, request: RegisterRequest) -> Result<AuthResponse, ServiceError> {
        request.validate()?;
        let email = request.email.trim().to_lowercase();
        if self.find_by_email(&email).await?.is_some() {
            return Err(ServiceError::BadRequest("User already exists".to_string()));
        }

        let password_hash = self.auth.hash_password(&request.password)?;
        let created = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(request.name.trim().to_string()),
            email: Set(email),
            password_hash: Set(password_hash),
            is_admin: Set(false),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await
        .map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                ServiceError::BadRequest("User already exists".to_string())
            }
            _ => ServiceError::DatabaseError(e),
        })?;

        info!(user_id = %created.id, "User registered");
        self.authenticated(created)
    }

    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, ServiceError> {
        request.validate()?;
        let user = self
            .find_by_email(&request.email)
            .await?
            .filter(|u| self.auth.verify_password(&request.password, &u.password_hash))
            .ok_or(AuthError::InvalidCredentials)?;
        self.authenticated(user)
    }

    pub async fn profile(&self, viewer: &AuthUser) -> Result<UserResponse, ServiceError> {
        user::Entity::find_by_id(viewer.user_id)
            .one(&*self.db_pool)
            .await?
            .map(Into::into)
            .ok_or_else(|| ServiceError::NotFound("User not found".to_string()))
    }

    /// Updates the caller's own name, email or password and re-issues the token
    #[instrument(skip(self, viewer, request), fields(user_id = %viewer.user_id))]
    pub async fn update_profile(
        &self,
        viewer: &AuthUser,
        request: UpdateProfileRequest,
    ) -> Result<AuthResponse, ServiceError> {
        request.validate()?;
        let existing = user::Entity::find_by_id(viewer.user_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User not found".to_string()))?;

        let mut active: user::ActiveModel = existing.clone().into();
        if let Some(name) = request.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(email) = request.email {
            let email = email.trim().to_lowercase();
            if email != existing.email {
                if self.find_by_email(&email).await?.is_some() {
                    return Err(ServiceError::BadRequest("User already exists".to_string()));
                }
                active.email = Set(email);
            }
        }
        if let Some(password) = request.password {
            active.password_hash = Set(self.auth.hash_password(&password)?);
        }

        let saved = active.update(&*self.db_pool).await.map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                ServiceError::BadRequest("User already exists".to_string())
            }
            _ => ServiceError::DatabaseError(e),
        })?;
        info!(user_id = %saved.id, "Profile updated");
        self.authenticated(saved)
    }

    pub async fn list_users(&self) -> Result<Vec<UserResponse>, ServiceError> {
        let users = user::Entity::find()
            .order_by_desc(user::Column::CreatedAt)
            .all(&*self.db_pool)
            .await?;
        Ok(users.into_iter().map(Into::into).collect())
    }

    /// Grants or revokes the admin role. Admins cannot demote themselves.
    #[instrument(skip(self, acting), fields(acting_user = %acting.user_id))]
    pub async fn set_admin(
        &self,
        acting: &AuthUser,
        user_id: Uuid,
        is_admin: bool,
    ) -> Result<UserResponse, ServiceError> {
        if acting.user_id == user_id && !is_admin {
            return Err(ServiceError::BadRequest(
                "You cannot remove your own admin role".to_string(),
            ));
        }
        let existing = user::Entity::find_by_id(user_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User not found".to_string()))?;

        let mut active: user::ActiveModel = existing.into();
        active.is_admin = Set(is_admin);
        let saved = active.update(&*self.db_pool).await?;
        info!(user_id = %user_id, is_admin, "Admin role changed");
        Ok(saved.into())
    }

    /// Creates the configured administrator when no account uses its email
    pub async fn seed_admin(
        &self,
        name: &str,
        email: &str,
        password: Option<&str>,
    ) -> Result<bool, ServiceError> {
        let Some(password) = password.filter(|p| !p.is_empty()) else {
            warn!("No admin password configured; skipping admin seed");
            return Ok(false);
        };
        if self.find_by_email(email).await?.is_some() {
            return Ok(false);
        }

        user::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            email: Set(email.trim().to_lowercase()),
            password_hash: Set(self.auth.hash_password(password)?),
            is_admin: Set(true),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await?;
        info!(email = %email, "Seeded admin account");
        Ok(true)
    }
}
