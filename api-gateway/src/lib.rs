//! HTTP gateway for the ledger service
//!
//! Exposes account management, funds transfers, and history queries as a
//! JSON API. The application router is assembled here so the server
//! binaries and the integration tests all mount the same routes, layers,
//! and OpenAPI document.

pub mod api;
pub mod config;
pub mod error;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use ledger_service::{
    AccountQueryService, AccountRepository, AccountService, EntryRepository, LedgerConfig,
    LedgerStore, TransferEngine,
};

use crate::api::account::{create_account, get_account, get_history};
use crate::api::transfer::create_transfer;

/// App state shared across handlers
pub struct AppState {
    /// Account creation and reads
    pub account_service: AccountService,
    /// Account history queries
    pub query_service: AccountQueryService,
    /// Atomic funds transfers
    pub transfer_engine: TransferEngine,
}

impl AppState {
    /// Wire the services and the transfer engine over one document store
    pub fn new(store: LedgerStore, config: &LedgerConfig) -> Self {
        let accounts = AccountRepository::new(store.clone());
        let entries = EntryRepository::new(store.clone());

        Self {
            account_service: AccountService::new(store.clone()),
            query_service: AccountQueryService::new(accounts, entries),
            transfer_engine: TransferEngine::with_config(store, config),
        }
    }
}

/// API documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        // Account routes
        api::account::create_account,
        api::account::get_account,
        api::account::get_history,
        // Transfer routes
        api::transfer::create_transfer,
    ),
    components(
        schemas(
            // Account API
            api::account::CreateAccountRequest,
            common::model::Account,
            common::model::LedgerEntry,
            common::model::EntryDirection,
            ledger_service::AccountView,

            // Transfer API
            api::transfer::TransferRequest,
            api::transfer::TransferReceipt,

            // Response models
            api::response::ApiResponse<common::model::Account>,
            api::response::ApiResponse<ledger_service::AccountView>,
            api::response::ApiResponse<api::transfer::TransferReceipt>,
            api::response::ResponseMetadata
        )
    ),
    tags(
        (name = "account", description = "Account management endpoints"),
        (name = "transfer", description = "Funds transfer endpoints")
    ),
    info(
        title = "Ledger API",
        version = "1.0.0",
        description = "API for the ledger service allowing account management, funds transfers, and account history access"
    )
)]
pub struct ApiDoc;

/// Build the gateway application
///
/// Versioned API routes, the Swagger UI, permissive CORS, and request
/// tracing over the given state.
pub fn router(state: Arc<AppState>) -> Router {
    // Set up API routes
    let api_routes = Router::new()
        // Account routes
        .route("/accounts", post(create_account))
        .route("/accounts/:id", get(get_account))
        .route("/accounts/:id/history", get(get_history))
        // Transfer routes
        .route("/transfers", post(create_transfer));

    // Set up Swagger UI
    let swagger_ui = SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi());

    // Set up CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api/v1", api_routes)
        .merge(swagger_ui)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
