//! HTTP surface for the two request operations.

pub mod handlers;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::otp::OtpService;
use crate::registration::RegistrationOrchestrator;

#[derive(Clone)]
pub struct AppState {
    pub otp: Arc<OtpService>,
    pub registration: Arc<RegistrationOrchestrator>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/otp", post(handlers::request_otp))
        .route("/register", post(handlers::verify_and_register))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).into_inner())
        .with_state(state)
}
