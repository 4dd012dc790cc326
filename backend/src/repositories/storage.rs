//! Storage trait for dependency injection and testing.
//!
//! Handlers only see `Arc<dyn Storage>`; the Postgres implementation backs the
//! running service and the in-memory one backs tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{
    models::{
        account::Account,
        medicine::{Medicine, MedicineUpdate},
    },
    types::{AccountId, MedicineId},
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("email {0} is already registered")]
    DuplicateEmail(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("database error")]
    Database(#[from] sqlx::Error),
}

/// Operations the login flow and medicine handlers need from persistence.
///
/// This trait is designed to be mockable using mockall for testing.
/// Use `MockStorage` in unit tests to force failure paths.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Storage: Send + Sync {
    /// Insert a new account; fails with `DuplicateEmail` when the email is taken.
    async fn create_account(&self, name: &str, email: &str) -> Result<Account, StoreError>;

    /// Exact-match lookup by email.
    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;

    async fn create_medicine(&self, medicine: &Medicine) -> Result<Medicine, StoreError>;

    /// All medicines owned by `user_id`, newest first.
    async fn list_medicines(&self, user_id: AccountId) -> Result<Vec<Medicine>, StoreError>;

    async fn find_medicine(&self, id: MedicineId) -> Result<Option<Medicine>, StoreError>;

    async fn update_medicine(&self, update: &MedicineUpdate) -> Result<Medicine, StoreError>;

    async fn delete_medicine(&self, id: MedicineId) -> Result<(), StoreError>;

    /// Record a login link as redeemed. Returns `false` if it already was.
    async fn consume_login_token(
        &self,
        jti: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    /// Forget redeemed links whose tokens have expired anyway.
    async fn purge_consumed_login_tokens(&self, now: DateTime<Utc>) -> Result<u64, StoreError>;
}
