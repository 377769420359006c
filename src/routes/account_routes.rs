use actix_web::{web, HttpResponse};
use std::str::FromStr;
use crate::app_state::AppState;
use crate::error::ApiError;
use crate::models::payment::AccountResponse;
use crate::models::types::AccountId;

/// Authoritative balance for a client; the top-up client refreshes from here
/// instead of keeping its own running total.
pub async fn get_account(id: web::Path<String>, app_state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let id_str = id.into_inner();

    let account_id = AccountId::from_str(&id_str)
        .map_err(|_| ApiError::BadRequest(format!("Invalid account id: {}", id_str)))?;

    let account = app_state
        .accounts
        .get_account(&account_id)
        .await
        .map_err(|e| ApiError::store(e, "Error fetching account"))?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(HttpResponse::Ok().json(AccountResponse {
        success: true,
        account: account.into(),
    }))
}
