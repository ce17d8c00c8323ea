use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    /// Work item ou recurso remoto inexistente
    NotFound(String),
    /// Work item existe mas não é uma Feature
    InvalidKind(String),
    /// Credenciais recusadas por um dos serviços upstream
    AuthError(String),
    /// Chamada recebida sem o segredo esperado (ou com segredo errado)
    Unauthorized(String),
    /// Falha reportada pela API do Azure DevOps
    DevOpsApi(String),
    /// Falha reportada pela API do Microsoft Graph
    SharePointApi(String),
    /// Conflito de nome não-contornável no drive
    NameConflict(String),
    /// Payload inválido recebido pela API
    ValidationError(String),
    ConfigError(String),
    JsonError(serde_json::Error),
    InternalError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::InvalidKind(msg) => write!(f, "Invalid work item kind: {}", msg),
            AppError::AuthError(msg) => write!(f, "Authentication error: {}", msg),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::DevOpsApi(msg) => write!(f, "Azure DevOps API error: {}", msg),
            AppError::SharePointApi(msg) => write!(f, "SharePoint API error: {}", msg),
            AppError::NameConflict(msg) => write!(f, "Name conflict: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AppError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            AppError::JsonError(err) => write!(f, "JSON error: {}", err),
            AppError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::JsonError(err)
    }
}

impl From<devops::DevOpsError> for AppError {
    fn from(err: devops::DevOpsError) -> Self {
        use devops::DevOpsError;
        match err {
            DevOpsError::NotFound(msg) => AppError::NotFound(msg),
            DevOpsError::AuthError(msg) => AppError::AuthError(msg),
            DevOpsError::ValidationError(msg) => AppError::ValidationError(msg),
            DevOpsError::ConfigError(msg) => AppError::ConfigError(msg),
            DevOpsError::ApiError { status, message } => {
                AppError::DevOpsApi(format!("status {}: {}", status, message))
            }
            DevOpsError::HttpError(e) => AppError::DevOpsApi(e.to_string()),
            DevOpsError::JsonError(e) => AppError::DevOpsApi(e.to_string()),
        }
    }
}

impl From<sharepoint::GraphError> for AppError {
    fn from(err: sharepoint::GraphError) -> Self {
        use sharepoint::GraphError;
        match err {
            GraphError::NotFound(msg) => AppError::NotFound(msg),
            GraphError::NameConflict(msg) => AppError::NameConflict(msg),
            GraphError::AuthError(msg) => AppError::AuthError(msg),
            GraphError::ConfigError(msg) => AppError::ConfigError(msg),
            GraphError::ApiError { status, message } => {
                AppError::SharePointApi(format!("status {}: {}", status, message))
            }
            GraphError::HttpError(e) => AppError::SharePointApi(e.to_string()),
            GraphError::JsonError(e) => AppError::SharePointApi(e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::InvalidKind(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            AppError::AuthError(msg) => (StatusCode::BAD_GATEWAY, msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::DevOpsApi(msg) => (StatusCode::BAD_GATEWAY, msg),
            AppError::SharePointApi(msg) => (StatusCode::BAD_GATEWAY, msg),
            AppError::NameConflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::ConfigError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::JsonError(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            AppError::InternalError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = json!({
            "error": error_message,
            "status": status.as_u16()
        });

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
