//! Authentication service for login, token management and admin seeding

use std::sync::Arc;

use bcrypt::{hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use shared::models::NewUser;
use shared::validation::{validate_password, validate_username};
use uuid::Uuid;

use crate::config::{AdminConfig, AuthConfig};
use crate::error::{AppError, AppResult};
use crate::store::LedgerStore;

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn LedgerStore>,
    jwt_secret: String,
    token_expiry_secs: i64,
    bcrypt_cost: u32,
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // User ID
    pub username: String,
    pub exp: i64,
    pub iat: i64,
}

/// Access token issued on login
#[derive(Debug, Serialize)]
pub struct AuthToken {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

impl AuthService {
    /// Create a new AuthService instance
    pub fn new(store: Arc<dyn LedgerStore>, config: &AuthConfig) -> Self {
        Self {
            store,
            jwt_secret: config.jwt_secret.clone(),
            token_expiry_secs: config.token_expiry_secs,
            bcrypt_cost: config.bcrypt_cost,
        }
    }

    /// Login with username and password
    pub async fn login(&self, username: &str, password: &str) -> AppResult<AuthToken> {
        let stored = self
            .store
            .find_user_by_username(username.trim())
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let valid = verify(password, &stored.password_hash)
            .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))?;

        if !valid {
            tracing::info!(username = %stored.user.username, "Rejected login");
            return Err(AppError::InvalidCredentials);
        }

        tracing::info!(username = %stored.user.username, "User logged in");
        self.generate_token(stored.user.id, &stored.user.username)
    }

    /// Validate an access token and return its claims
    pub fn validate_token(&self, token: &str) -> AppResult<Claims> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| AppError::Unauthorized {
            message: format!("Invalid token: {}", e),
        })?;

        Ok(token_data.claims)
    }

    fn generate_token(&self, user_id: Uuid, username: &str) -> AppResult<AuthToken> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.token_expiry_secs);

        let claims = Claims {
            sub: user_id.to_string(),
            username: username.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        let access_token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))?;

        Ok(AuthToken {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.token_expiry_secs,
        })
    }

    /// Create the configured admin account when no users exist.
    ///
    /// Without a configured password a random one is generated and logged once.
    pub async fn ensure_admin(&self, admin: &AdminConfig) -> AppResult<bool> {
        if self.store.count_users().await? > 0 {
            return Ok(false);
        }

        validate_username(&admin.username)
            .map_err(|msg| AppError::Configuration(format!("admin.username: {}", msg)))?;

        let (password, generated) = match &admin.password {
            Some(password) => {
                validate_password(password)
                    .map_err(|msg| AppError::Configuration(format!("admin.password: {}", msg)))?;
                (password.clone(), false)
            }
            None => (Uuid::new_v4().simple().to_string(), true),
        };

        let password_hash = hash(&password, self.bcrypt_cost)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

        let user = self
            .store
            .insert_user(NewUser {
                username: admin.username.clone(),
                password_hash,
                email: admin.email.clone(),
            })
            .await?;

        if generated {
            tracing::warn!(
                username = %user.username,
                "Created admin account with generated password: {}",
                password
            );
        } else {
            tracing::info!(username = %user.username, "Created admin account");
        }
        Ok(true)
    }
}
