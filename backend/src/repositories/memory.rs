//! In-process `Storage` with the same semantics as the Postgres one.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::storage::{Storage, StoreError};
use crate::{
    models::{
        account::Account,
        medicine::{Medicine, MedicineUpdate},
    },
    types::{AccountId, MedicineId},
};

#[derive(Debug, Default)]
struct Tables {
    accounts: HashMap<AccountId, Account>,
    medicines: HashMap<MedicineId, Medicine>,
    consumed_login_tokens: HashMap<String, DateTime<Utc>>,
}

#[derive(Debug, Default)]
pub struct InMemoryStorage {
    tables: RwLock<Tables>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn account_count(&self) -> usize {
        self.tables.read().await.accounts.len()
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn create_account(&self, name: &str, email: &str) -> Result<Account, StoreError> {
        let mut tables = self.tables.write().await;
        if tables.accounts.values().any(|a| a.email == email) {
            return Err(StoreError::DuplicateEmail(email.to_string()));
        }
        let account = Account {
            id: AccountId::new(),
            name: name.to_string(),
            email: email.to_string(),
        };
        tables.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.accounts.values().find(|a| a.email == email).cloned())
    }

    async fn create_medicine(&self, medicine: &Medicine) -> Result<Medicine, StoreError> {
        let mut tables = self.tables.write().await;
        // Mirrors the foreign key on medicines.user_id.
        if !tables.accounts.contains_key(&medicine.user_id) {
            return Err(StoreError::NotFound("account"));
        }
        tables.medicines.insert(medicine.id, medicine.clone());
        Ok(medicine.clone())
    }

    async fn list_medicines(&self, user_id: AccountId) -> Result<Vec<Medicine>, StoreError> {
        let tables = self.tables.read().await;
        let mut rows: Vec<Medicine> = tables
            .medicines
            .values()
            .filter(|m| m.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn find_medicine(&self, id: MedicineId) -> Result<Option<Medicine>, StoreError> {
        Ok(self.tables.read().await.medicines.get(&id).cloned())
    }

    async fn update_medicine(&self, update: &MedicineUpdate) -> Result<Medicine, StoreError> {
        let mut tables = self.tables.write().await;
        let medicine = tables
            .medicines
            .get_mut(&update.id)
            .ok_or(StoreError::NotFound("medicine"))?;
        medicine.name = update.name.clone();
        medicine.dosage = update.dosage;
        medicine.frequency = update.frequency;
        medicine.updated_at = update.updated_at;
        Ok(medicine.clone())
    }

    async fn delete_medicine(&self, id: MedicineId) -> Result<(), StoreError> {
        self.tables
            .write()
            .await
            .medicines
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound("medicine"))
    }

    async fn consume_login_token(
        &self,
        jti: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        if tables.consumed_login_tokens.contains_key(jti) {
            return Ok(false);
        }
        tables
            .consumed_login_tokens
            .insert(jti.to_string(), expires_at);
        Ok(true)
    }

    async fn purge_consumed_login_tokens(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut tables = self.tables.write().await;
        let before = tables.consumed_login_tokens.len();
        tables
            .consumed_login_tokens
            .retain(|_, expires_at| *expires_at > now);
        Ok((before - tables.consumed_login_tokens.len()) as u64)
    }
}
