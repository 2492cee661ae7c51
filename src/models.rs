use std::{collections::BTreeMap, fmt};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::FieldErrors,
    validation::{self, Validator},
};

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// The public view of an account in the `users` table. This is what every endpoint
/// returns; it never carries the password hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub telephone: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// UserRecord
///
/// Full row including the bcrypt hash. Only the login path reads it.
#[derive(Debug, Clone, FromRow)]
pub struct UserRecord {
    #[sqlx(flatten)]
    pub user: User,
    pub password_hash: String,
}

/// NewUser
///
/// A validated, normalized registration ready for insertion.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub telephone: String,
    pub password_hash: String,
}

// --- Request Payloads (Input Schemas) ---

/// RegisterUserRequest
///
/// Input payload for the public registration endpoint (POST /register).
/// Keys are camelCase; `first_name`/`last_name` are accepted as aliases.
/// The password is hashed before it reaches the repository and is never logged.
#[derive(Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RegisterUserRequest {
    #[schema(example = "ada@example.com")]
    pub email: String,
    #[serde(alias = "first_name")]
    #[schema(example = "Ada")]
    pub first_name: String,
    #[serde(alias = "last_name")]
    #[schema(example = "Lovelace")]
    pub last_name: String,
    #[schema(example = "ada")]
    pub username: String,
    #[schema(example = "12 St James's Square, London")]
    pub address: String,
    #[schema(example = "+44 20 7946 0958")]
    pub telephone: String,
    pub password: String,
}

impl fmt::Debug for RegisterUserRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterUserRequest")
            .field("email", &self.email)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl RegisterUserRequest {
    /// validate
    ///
    /// Trims every text field, lowercases the email and checks each field. Returns the
    /// normalized request, or every failing field at once.
    pub fn validate(self) -> Result<Self, FieldErrors> {
        let mut v = Validator::default();

        let email = self.email.trim().to_lowercase();
        let username = self.username.trim().to_string();
        let first_name = self.first_name.trim().to_string();
        let last_name = self.last_name.trim().to_string();
        let address = self.address.trim().to_string();
        let telephone = self.telephone.trim().to_string();

        v.check("email", validation::email(&email));
        v.check("username", validation::username(&username));
        v.check("firstName", validation::name(&first_name, validation::MAX_NAME_LEN));
        v.check("lastName", validation::name(&last_name, validation::MAX_NAME_LEN));
        v.check("address", validation::name(&address, validation::MAX_ADDRESS_LEN));
        v.check("telephone", validation::telephone(&telephone));
        v.check("password", validation::password(&self.password));

        v.finish(Self {
            email,
            first_name,
            last_name,
            username,
            address,
            telephone,
            password: self.password,
        })
    }
}

/// LoginRequest
///
/// Input payload for POST /login. `login` is either the email or the username.
#[derive(Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginRequest {
    #[schema(example = "ada")]
    pub login: String,
    pub password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("login", &self.login)
            .finish_non_exhaustive()
    }
}

/// UpdateProfileRequest
///
/// Partial update payload for PUT /me. Only the provided fields change.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UpdateProfileRequest {
    #[serde(skip_serializing_if = "Option::is_none", alias = "first_name")]
    pub first_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none", alias = "last_name")]
    pub last_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub telephone: Option<String>,
}

impl UpdateProfileRequest {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.address.is_none()
            && self.telephone.is_none()
    }

    /// Same field rules as registration, applied only to the fields that are present.
    pub fn validate(self) -> Result<Self, FieldErrors> {
        let mut v = Validator::default();

        let trim = |s: Option<String>| s.map(|s| s.trim().to_string());
        let first_name = trim(self.first_name);
        let last_name = trim(self.last_name);
        let address = trim(self.address);
        let telephone = trim(self.telephone);

        if let Some(s) = &first_name {
            v.check("firstName", validation::name(s, validation::MAX_NAME_LEN));
        }
        if let Some(s) = &last_name {
            v.check("lastName", validation::name(s, validation::MAX_NAME_LEN));
        }
        if let Some(s) = &address {
            v.check("address", validation::name(s, validation::MAX_ADDRESS_LEN));
        }
        if let Some(s) = &telephone {
            v.check("telephone", validation::telephone(s));
        }

        v.finish(Self {
            first_name,
            last_name,
            address,
            telephone,
        })
    }
}

// --- Response Schemas (Output) ---

/// AuthResponse
///
/// Returned by registration and login: the account plus a freshly signed bearer token.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
    // Always "Bearer".
    pub token_type: String,
    // Seconds until `token` expires.
    pub expires_in: u64,
}

/// ClaimsResponse
///
/// The decoded token payload that was attached to the current request (GET /me/claims).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ClaimsResponse {
    pub sub: Uuid,
    pub username: String,
    pub iat: u64,
    pub exp: u64,
}

/// DbStatus
///
/// Body of a successful GET /health/db.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DbStatus {
    pub status: String,
    pub latency_ms: u64,
}

/// ErrorBody
///
/// JSON document for every non-2xx response. `details` is only present for
/// validation failures and maps field names to messages.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub details: Option<BTreeMap<String, String>>,
}
