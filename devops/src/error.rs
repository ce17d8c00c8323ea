//! Tipos de erro para o crate devops

use thiserror::Error;

/// Erros do cliente Azure DevOps
#[derive(Debug, Error)]
pub enum DevOpsError {
    /// Erro de requisição HTTP
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Erro da API do Azure DevOps (status code não-2xx)
    #[error("Azure DevOps API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    /// Erro de autenticação (PAT ausente, inválido ou sem permissão)
    #[error("Authentication failed: {0}")]
    AuthError(String),

    /// Erro de parsing JSON
    #[error("JSON parsing failed: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Recurso não encontrado (work item, anexo, etc)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Erro de configuração
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Work item rejeitado por regra de validação do processo
    #[error("Validation rejected: {0}")]
    ValidationError(String),
}

/// Tipo Result padrão para o crate
pub type Result<T> = std::result::Result<T, DevOpsError>;
