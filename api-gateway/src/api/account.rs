//! Account API handlers
//!
//! Handles endpoints related to account management:
//! - Create account
//! - Get account details
//! - Get account history

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use common::decimal::Amount;
use common::model::Account;
use ledger_service::query::AccountView;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::api::response::ApiResponse;
use crate::error::ApiError;
use crate::AppState;

/// Create account request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateAccountRequest {
    /// Display name of the account holder
    pub holder_name: String,
    /// Starting balance; zero when omitted
    pub opening_balance: Option<Amount>,
}

/// Create a new account
#[utoipa::path(
    post,
    path = "/api/v1/accounts",
    request_body = CreateAccountRequest,
    responses(
        (status = 201, description = "Account successfully created"),
        (status = 400, description = "Invalid holder name or opening balance"),
        (status = 500, description = "Internal server error")
    ),
    tag = "account"
)]
pub async fn create_account(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateAccountRequest>,
) -> Result<(StatusCode, ApiResponse<Account>), ApiError> {
    let opening_balance = request.opening_balance.unwrap_or(Amount::ZERO);

    let account = state
        .account_service
        .create_account(&request.holder_name, opening_balance)
        .await
        .map_err(ApiError::Common)?;

    Ok((StatusCode::CREATED, ApiResponse::new(account)))
}

/// Get an account by ID
#[utoipa::path(
    get,
    path = "/api/v1/accounts/{id}",
    params(
        ("id" = Uuid, Path, description = "Account ID")
    ),
    responses(
        (status = 200, description = "Account details retrieved successfully"),
        (status = 404, description = "Account not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "account"
)]
pub async fn get_account(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<Account>, ApiError> {
    // Request the account from the service
    let account = state
        .account_service
        .get_account(id)
        .await
        .map_err(ApiError::Common)?;

    Ok(ApiResponse::new(account))
}

/// Get an account together with its ledger history
#[utoipa::path(
    get,
    path = "/api/v1/accounts/{id}/history",
    params(
        ("id" = Uuid, Path, description = "Account ID")
    ),
    responses(
        (status = 200, description = "Account history retrieved successfully"),
        (status = 404, description = "Account not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "account"
)]
pub async fn get_history(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<AccountView>, ApiError> {
    // The view pairs the account's fields with its entries in commit order
    let view = state
        .query_service
        .get_account_with_history(id)
        .await
        .map_err(ApiError::Common)?;

    Ok(ApiResponse::new(view))
}
