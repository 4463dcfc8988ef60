//! Parkwise API Library
//!
//! Core functionality for the Parkwise parking-reservation API: location and
//! slot registries, the booking workflow, accounts, and the HTTP surface.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod openapi;
pub mod services;

use axum::{extract::State, response::Json, routing::get, Router};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use utoipa::ToSchema;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: handlers::AppServices,
}

/// Envelope for every successful response: `success` is true, `data` holds
/// the payload, list endpoints also set `count`, mutations may add `message`.
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            count: None,
            message: None,
            data: Some(data),
        }
    }

    pub fn with_message(message: &str, data: T) -> Self {
        Self {
            success: true,
            count: None,
            message: Some(message.to_string()),
            data: Some(data),
        }
    }

    pub fn message(message: &str) -> Self {
        Self {
            success: true,
            count: None,
            message: Some(message.to_string()),
            data: None,
        }
    }
}

impl<T> ApiResponse<Vec<T>> {
    /// List payload with its length reported as `count`.
    pub fn with_count(data: Vec<T>) -> Self {
        Self {
            success: true,
            count: Some(data.len()),
            message: None,
            data: Some(data),
        }
    }
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

/// The versionless API surface: accounts, locations, slots, bookings.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", handlers::auth::routes())
        .nest("/locations", handlers::locations::routes())
        .nest("/slots", handlers::slots::routes())
        .nest("/bookings", handlers::bookings::routes())
        .route("/health", get(health_check))
        .route("/", get(api_status))
}

async fn api_status() -> Json<Value> {
    Json(json!({
        "message": "Parkwise parking reservation API",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn health_check(State(state): State<AppState>) -> ApiResult<Value> {
    let db_status = match state.db.ping().await {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };

    Ok(Json(ApiResponse::success(json!({
        "status": db_status,
        "checks": { "database": db_status },
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))))
}

#[cfg(test)]
mod response_tests {
    use super::*;

    #[test]
    fn success_payload_shape() {
        let body = serde_json::to_value(ApiResponse::success(json!({"id": 1}))).unwrap();
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["data"]["id"], json!(1));
        assert!(body.get("count").is_none());
        assert!(body.get("message").is_none());
    }

    #[test]
    fn list_payload_reports_count() {
        let body = serde_json::to_value(ApiResponse::with_count(vec![1, 2, 3])).unwrap();
        assert_eq!(body["count"], json!(3));
        assert_eq!(body["data"], json!([1, 2, 3]));
    }

    #[test]
    fn message_only_payload_omits_data() {
        let body =
            serde_json::to_value(ApiResponse::<()>::message("Slot deleted successfully")).unwrap();
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["message"], json!("Slot deleted successfully"));
        assert!(body.get("data").is_none());
    }
}
