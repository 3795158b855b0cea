//! Transfer API handlers
//!
//! Handlers for submitting funds transfers to the transfer engine.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use common::decimal::Amount;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::api::response::ApiResponse;
use crate::error::ApiError;
use crate::AppState;

/// Transfer request
#[derive(Debug, Deserialize, ToSchema)]
pub struct TransferRequest {
    /// Account to debit
    pub source_account_id: Uuid,
    /// Account to credit
    pub destination_account_id: Uuid,
    /// Amount to move from source to destination
    pub amount: Amount,
}

/// Transfer result
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TransferReceipt {
    /// Correlation ID shared by the transfer's two ledger entries
    pub correlation_id: Uuid,
}

/// Execute a transfer between two accounts
#[utoipa::path(
    post,
    path = "/api/v1/transfers",
    request_body = TransferRequest,
    responses(
        (status = 201, description = "Transfer committed"),
        (status = 400, description = "Invalid transfer request or insufficient funds"),
        (status = 404, description = "Account not found"),
        (status = 409, description = "Transfer kept conflicting with concurrent activity"),
        (status = 500, description = "Internal server error")
    ),
    tag = "transfer"
)]
pub async fn create_transfer(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TransferRequest>,
) -> Result<(StatusCode, ApiResponse<TransferReceipt>), ApiError> {
    let correlation_id = state
        .transfer_engine
        .transfer(
            request.source_account_id,
            request.destination_account_id,
            request.amount,
        )
        .await
        .map_err(ApiError::Common)?;

    let receipt = TransferReceipt { correlation_id };
    Ok((StatusCode::CREATED, ApiResponse::new(receipt)))
}
