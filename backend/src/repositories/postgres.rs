//! Postgres-backed `Storage`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::storage::{Storage, StoreError};
use crate::{
    models::{
        account::Account,
        medicine::{Medicine, MedicineUpdate},
    },
    types::{AccountId, MedicineId},
};

const ACCOUNT_COLUMNS: &str = "id, name, email";
const MEDICINE_COLUMNS: &str = "id, name, dosage, frequency, user_id, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct PgStorage {
    pool: PgPool,
}

impl PgStorage {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn map_account_insert_error(err: sqlx::Error, email: &str) -> StoreError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            StoreError::DuplicateEmail(email.to_string())
        }
        _ => StoreError::Database(err),
    }
}

#[async_trait]
impl Storage for PgStorage {
    async fn create_account(&self, name: &str, email: &str) -> Result<Account, StoreError> {
        let query = format!(
            "INSERT INTO accounts (id, name, email) VALUES ($1, $2, $3) RETURNING {}",
            ACCOUNT_COLUMNS
        );
        sqlx::query_as::<_, Account>(&query)
            .bind(AccountId::new())
            .bind(name)
            .bind(email)
            .fetch_one(&self.pool)
            .await
            .map_err(|err| map_account_insert_error(err, email))
    }

    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let query = format!("SELECT {} FROM accounts WHERE email = $1", ACCOUNT_COLUMNS);
        let account = sqlx::query_as::<_, Account>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(account)
    }

    async fn create_medicine(&self, medicine: &Medicine) -> Result<Medicine, StoreError> {
        let query = format!(
            "INSERT INTO medicines (id, name, dosage, frequency, user_id, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {}",
            MEDICINE_COLUMNS
        );
        let row = sqlx::query_as::<_, Medicine>(&query)
            .bind(medicine.id)
            .bind(&medicine.name)
            .bind(medicine.dosage)
            .bind(medicine.frequency)
            .bind(medicine.user_id)
            .bind(medicine.created_at)
            .bind(medicine.updated_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn list_medicines(&self, user_id: AccountId) -> Result<Vec<Medicine>, StoreError> {
        let query = format!(
            "SELECT {} FROM medicines WHERE user_id = $1 ORDER BY created_at DESC",
            MEDICINE_COLUMNS
        );
        let rows = sqlx::query_as::<_, Medicine>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn find_medicine(&self, id: MedicineId) -> Result<Option<Medicine>, StoreError> {
        let query = format!("SELECT {} FROM medicines WHERE id = $1", MEDICINE_COLUMNS);
        let row = sqlx::query_as::<_, Medicine>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn update_medicine(&self, update: &MedicineUpdate) -> Result<Medicine, StoreError> {
        let query = format!(
            "UPDATE medicines SET name = $2, dosage = $3, frequency = $4, updated_at = $5 \
             WHERE id = $1 RETURNING {}",
            MEDICINE_COLUMNS
        );
        sqlx::query_as::<_, Medicine>(&query)
            .bind(update.id)
            .bind(&update.name)
            .bind(update.dosage)
            .bind(update.frequency)
            .bind(update.updated_at)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound("medicine"))
    }

    async fn delete_medicine(&self, id: MedicineId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM medicines WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("medicine"));
        }
        Ok(())
    }

    async fn consume_login_token(
        &self,
        jti: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "INSERT INTO consumed_login_tokens (jti, expires_at) VALUES ($1, $2) \
             ON CONFLICT (jti) DO NOTHING",
        )
        .bind(jti)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn purge_consumed_login_tokens(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM consumed_login_tokens WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
