//! Per-account medicine CRUD behind the session guard.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Extension, Json,
};
use validator::Validate;

use crate::{
    error::AppError,
    middleware::auth::CurrentAccount,
    models::medicine::{CreateMedicineRequest, Medicine, MedicineUpdate, UpdateMedicineRequest},
    state::AppState,
    types::{AccountId, MedicineId},
};

pub async fn create_medicine(
    State(state): State<AppState>,
    Extension(CurrentAccount(account_id)): Extension<CurrentAccount>,
    payload: Result<Json<CreateMedicineRequest>, JsonRejection>,
) -> Result<Json<Medicine>, AppError> {
    let Json(payload) = payload?;
    payload.validate()?;
    ensure_owner(account_id, payload.user_id)?;

    let medicine = state
        .storage
        .create_medicine(&Medicine::new(payload))
        .await?;
    tracing::debug!(medicine_id = %medicine.id, %account_id, "Medicine created");
    Ok(Json(medicine))
}

pub async fn list_medicines(
    State(state): State<AppState>,
    Extension(CurrentAccount(account_id)): Extension<CurrentAccount>,
    path: Result<Path<AccountId>, PathRejection>,
) -> Result<Json<Vec<Medicine>>, AppError> {
    let Path(user_id) = path?;
    ensure_owner(account_id, user_id)?;

    let medicines = state.storage.list_medicines(user_id).await?;
    Ok(Json(medicines))
}

pub async fn update_medicine(
    State(state): State<AppState>,
    Extension(CurrentAccount(account_id)): Extension<CurrentAccount>,
    payload: Result<Json<UpdateMedicineRequest>, JsonRejection>,
) -> Result<Json<Medicine>, AppError> {
    let Json(payload) = payload?;
    payload.validate()?;
    load_owned(&state, account_id, payload.id).await?;

    let medicine = state
        .storage
        .update_medicine(&MedicineUpdate::from(payload))
        .await?;
    Ok(Json(medicine))
}

pub async fn delete_medicine(
    State(state): State<AppState>,
    Extension(CurrentAccount(account_id)): Extension<CurrentAccount>,
    path: Result<Path<MedicineId>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let Path(id) = path?;
    load_owned(&state, account_id, id).await?;

    state.storage.delete_medicine(id).await?;
    tracing::debug!(medicine_id = %id, %account_id, "Medicine deleted");
    Ok(StatusCode::NO_CONTENT)
}

fn ensure_owner(session_account: AccountId, owner: AccountId) -> Result<(), AppError> {
    if session_account == owner {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "medicine records belong to another account".to_string(),
        ))
    }
}

async fn load_owned(
    state: &AppState,
    account_id: AccountId,
    id: MedicineId,
) -> Result<Medicine, AppError> {
    let medicine = state
        .storage
        .find_medicine(id)
        .await?
        .ok_or_else(|| AppError::NotFound("medicine not found".to_string()))?;
    ensure_owner(account_id, medicine.user_id)?;
    Ok(medicine)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ownership_check_rejects_other_accounts() {
        let me = AccountId::new();
        assert!(ensure_owner(me, me).is_ok());
        assert!(matches!(
            ensure_owner(me, AccountId::new()),
            Err(AppError::Forbidden(_))
        ));
    }
}
