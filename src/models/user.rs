//! User model, JWT claims and caller identity

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use super::enums::UserRole;

/// User model from database (renter or staff)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: UserRole,
    pub license_number: Option<String>,
    pub license_card_front_image_url: Option<String>,
    pub license_card_back_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// A renter may book only with both license images and a license
    /// number on file.
    pub fn has_complete_license(&self) -> bool {
        self.license_card_front_image_url.is_some()
            && self.license_card_back_image_url.is_some()
            && self
                .license_number
                .as_deref()
                .map(|n| !n.trim().is_empty())
                .unwrap_or(false)
    }
}

/// JWT claims issued by the identity provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: Uuid,
    pub email: String,
    pub role: UserRole,
    pub exp: i64,
}

impl UserClaims {
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        let data = decode::<UserClaims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(data.claims)
    }
}

/// Authenticated caller, threaded explicitly through every state-machine
/// operation instead of being pulled from ambient request context.
#[derive(Debug, Clone)]
pub struct CallerIdentity {
    pub subject_id: Uuid,
    pub email: String,
    pub role: UserRole,
}

impl CallerIdentity {
    pub fn is_staff(&self) -> bool {
        matches!(self.role, UserRole::Staff | UserRole::Admin)
    }

    pub fn is_admin(&self) -> bool {
        matches!(self.role, UserRole::Admin)
    }
}

impl From<UserClaims> for CallerIdentity {
    fn from(claims: UserClaims) -> Self {
        Self {
            subject_id: claims.sub,
            email: claims.email,
            role: claims.role,
        }
    }
}
