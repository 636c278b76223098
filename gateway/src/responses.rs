//! Wire envelope and error mapping.
//!
//! Every endpoint answers `{status: "success", data}` or
//! `{status: "error", message}`. Validation problems map to 400, forecast
//! data problems to 422, anything unexpected to 500 with a generic message
//! and the detail kept in the log.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use demand_forecast::ForecastError;
use scenario_engine::ScenarioError;

pub fn success<T: Serialize>(data: T) -> Json<serde_json::Value> {
    Json(json!({ "status": "success", "data": data }))
}

#[derive(Error, Debug)]
#[error("{message}")]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn internal(detail: impl std::fmt::Display) -> Self {
        tracing::error!("Internal error: {}", detail);
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "internal error".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(json!({ "status": "error", "message": self.message })),
        )
            .into_response()
    }
}

impl From<ScenarioError> for ApiError {
    fn from(err: ScenarioError) -> Self {
        match err {
            ScenarioError::Validation(_) | ScenarioError::UnknownBase(_) => Self {
                status: StatusCode::BAD_REQUEST,
                message: err.to_string(),
            },
            ScenarioError::Computation(_) => Self::internal(err),
        }
    }
}

impl From<ForecastError> for ApiError {
    fn from(err: ForecastError) -> Self {
        match err {
            ForecastError::InvalidConfig(_) | ForecastError::UnknownRegressor(_) => Self {
                status: StatusCode::BAD_REQUEST,
                message: err.to_string(),
            },
            ForecastError::InsufficientData { .. } | ForecastError::RegressorAlignment { .. } => {
                Self {
                    status: StatusCode::UNPROCESSABLE_ENTITY,
                    message: err.to_string(),
                }
            }
            ForecastError::Computation(_) => Self::internal(err),
        }
    }
}
