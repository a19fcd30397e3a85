use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, warn};

use super::AppState;
use crate::error::ClientError;
use crate::registration::RegistrationRequest;

#[derive(Debug, Deserialize)]
pub struct OtpRequestBody {
    pub email: String,
}

fn error_response(err: ClientError) -> (StatusCode, Json<Value>) {
    (
        err.status_code(),
        Json(json!({
            "error": err.code(),
            "message": err.user_message(),
            "retryable": err.is_retryable(),
        })),
    )
}

fn malformed_body(rejection: JsonRejection) -> (StatusCode, Json<Value>) {
    warn!("Rejected request body: {}", rejection);
    error_response(ClientError::Validation("malformed request body".to_string()))
}

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "hats-onboarding",
        "timestamp": chrono::Utc::now()
    }))
}

pub async fn request_otp(
    State(state): State<AppState>,
    body: Result<Json<OtpRequestBody>, JsonRejection>,
) -> (StatusCode, Json<Value>) {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return malformed_body(rejection),
    };

    match state.otp.request_otp(&body.email).await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "ok" }))),
        Err(err) => error_response(err),
    }
}

pub async fn verify_and_register(
    State(state): State<AppState>,
    body: Result<Json<RegistrationRequest>, JsonRejection>,
) -> (StatusCode, Json<Value>) {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => return malformed_body(rejection),
    };

    // Detached so a client disconnect cannot cancel an in-flight chain write.
    let orchestrator = state.registration.clone();
    let handle = tokio::spawn(async move { orchestrator.verify_and_register(request).await });

    match handle.await {
        Ok(Ok(receipt)) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "attemptId": receipt.attempt_id,
                "credentialTx": receipt.credential_tx,
                "admissionTx": receipt.admission_tx,
            })),
        ),
        Ok(Err(err)) => error_response(err),
        Err(join_err) => {
            error!("Registration task failed: {}", join_err);
            error_response(ClientError::Infra)
        }
    }
}
