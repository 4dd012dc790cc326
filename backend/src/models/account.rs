//! Account records and the payloads of the login flow.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::types::AccountId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
/// A registered account. Identified by email for login purposes.
pub struct Account {
    #[schema(value_type = String, format = Uuid)]
    pub id: AccountId,
    /// Display name.
    pub name: String,
    /// Unique, matched exactly on login.
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
/// Payload for `POST /register`.
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 50))]
    pub name: String,
    #[validate(email, length(max = 50))]
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
/// Payload for `POST /login`.
pub struct LoginRequest {
    pub email: String,
}
