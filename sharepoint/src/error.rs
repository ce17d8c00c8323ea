//! Tipos de erro para o crate sharepoint

use thiserror::Error;

/// Erros do cliente Microsoft Graph
#[derive(Debug, Error)]
pub enum GraphError {
    /// Erro de requisição HTTP
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Erro da API do Graph (status code não-2xx)
    #[error("Microsoft Graph API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    /// Erro de autenticação (credenciais da app ou token)
    #[error("Authentication failed: {0}")]
    AuthError(String),

    /// Erro de parsing JSON
    #[error("JSON parsing failed: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Recurso não encontrado (site, drive, pasta, item)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Conflito de nome no destino (já existe item com o mesmo nome)
    #[error("Name conflict: {0}")]
    NameConflict(String),

    /// Erro de configuração
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Tipo Result padrão para o crate
pub type Result<T> = std::result::Result<T, GraphError>;
