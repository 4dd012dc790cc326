//! Medicine records tracked per account.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::types::{AccountId, MedicineId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Medicine {
    #[schema(value_type = String, format = Uuid)]
    pub id: MedicineId,
    pub name: String,
    /// Dose amount, in whatever unit the client tracks.
    pub dosage: i32,
    /// Doses per day.
    pub frequency: i32,
    #[schema(value_type = String, format = Uuid)]
    pub user_id: AccountId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Medicine {
    pub fn new(request: CreateMedicineRequest) -> Self {
        let now = Utc::now();
        Self {
            id: MedicineId::new(),
            name: request.name,
            dosage: request.dosage,
            frequency: request.frequency,
            user_id: request.user_id,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
/// Payload for `POST /medicine`.
pub struct CreateMedicineRequest {
    #[validate(length(min = 1, max = 50))]
    pub name: String,
    #[validate(range(min = 0))]
    pub dosage: i32,
    #[validate(range(min = 0))]
    pub frequency: i32,
    #[schema(value_type = String, format = Uuid)]
    pub user_id: AccountId,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
/// Payload for `PUT /medicine`.
pub struct UpdateMedicineRequest {
    #[schema(value_type = String, format = Uuid)]
    pub id: MedicineId,
    #[validate(length(min = 1, max = 50))]
    pub name: String,
    #[validate(range(min = 0))]
    pub dosage: i32,
    #[validate(range(min = 0))]
    pub frequency: i32,
}

/// Changes applied to an existing medicine, stamped with the update time.
#[derive(Debug, Clone, PartialEq)]
pub struct MedicineUpdate {
    pub id: MedicineId,
    pub name: String,
    pub dosage: i32,
    pub frequency: i32,
    pub updated_at: DateTime<Utc>,
}

impl From<UpdateMedicineRequest> for MedicineUpdate {
    fn from(request: UpdateMedicineRequest) -> Self {
        Self {
            id: request.id,
            name: request.name,
            dosage: request.dosage,
            frequency: request.frequency,
            updated_at: Utc::now(),
        }
    }
}
