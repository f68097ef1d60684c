//! HTTP request handlers

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{error, info};

use crate::deploy::steps::PublishStep;
use crate::errors::PagesmithError;
use crate::models::deployment::{DeployRequest, DeploymentResult};
use crate::server::state::ServerState;
use crate::utils::version_info;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

/// Health check handler
pub async fn health_handler() -> impl IntoResponse {
    let version = version_info();
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "pagesmith".to_string(),
        version: version.version,
    })
}

/// Version handler
pub async fn version_handler() -> impl IntoResponse {
    Json(version_info())
}

/// Error body returned by the deploy endpoint
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<PublishStep>,
}

/// HTTP mapping of a failed deployment
pub struct ApiError(pub PagesmithError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            PagesmithError::ConfigError(_) | PagesmithError::MaterializationError { .. } => {
                StatusCode::BAD_REQUEST
            }
            PagesmithError::LeaseConflict(_) => StatusCode::CONFLICT,
            PagesmithError::TimeoutError { .. } => StatusCode::GATEWAY_TIMEOUT,
            PagesmithError::PublishError { .. } | PagesmithError::AgentInvocationError(_) => {
                StatusCode::BAD_GATEWAY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorResponse {
            error: self.0.to_string(),
            step: self.0.failed_step(),
        };
        (status, Json(body)).into_response()
    }
}

/// Deploy handler: generate and publish one round
pub async fn deploy_handler(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<DeployRequest>,
) -> Result<Json<DeploymentResult>, ApiError> {
    info!(
        "Deploy requested for task {} round {}",
        request.task.id, request.round
    );

    match state.deployer.deploy(&request).await {
        Ok(result) => Ok(Json(result)),
        Err(e) => {
            error!("Deploy for task {} failed: {}", request.task.id, e);
            Err(ApiError(e))
        }
    }
}
