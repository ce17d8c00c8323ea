//! Cliente HTTP para a API do Microsoft Graph

use crate::auth::GraphAuth;
use crate::error::{GraphError, Result};
use reqwest::{Client as HttpClient, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

// Configuração de retry para erros transientes (rede, 429, 5xx)
const MAX_RETRIES: u32 = 3;
const INITIAL_BACKOFF_MS: u64 = 500;

/// Cliente para interagir com a API do Graph
///
/// Injeta o bearer token do [`GraphAuth`] em cada chamada e traduz os
/// status de erro nos variantes de [`GraphError`].
pub struct GraphClient {
    http_client: HttpClient,
    auth: GraphAuth,
    base_url: String,
}

impl GraphClient {
    /// Cria um novo cliente Graph
    pub fn new(auth: GraphAuth) -> Result<Self> {
        Self::with_base_url(auth, "https://graph.microsoft.com/v1.0")
    }

    /// Cria um cliente com URL base customizada
    pub fn with_base_url(auth: GraphAuth, base_url: impl Into<String>) -> Result<Self> {
        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(120))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| GraphError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            auth,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Executa uma requisição GET
    pub(crate) async fn get(&self, endpoint: &str) -> Result<Response> {
        let url = format!("{}{}", self.base_url, endpoint);
        self.get_absolute(&url).await
    }

    /// Executa uma requisição GET e parseia JSON
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        let response = self.get(endpoint).await?;
        let json = response.json().await?;
        Ok(json)
    }

    /// Executa uma requisição GET em URL absoluta (paginação `nextLink`)
    pub(crate) async fn get_absolute(&self, url: &str) -> Result<Response> {
        tracing::debug!("GET {}", url);

        let token = self.auth.get_token().await?;
        let request = self.http_client.get(url).bearer_auth(&token);

        let response = self.send_with_retry(request).await?;
        self.handle_response(response).await
    }

    /// Executa uma requisição GET em URL absoluta e parseia JSON
    pub(crate) async fn get_absolute_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self.get_absolute(url).await?;
        let json = response.json().await?;
        Ok(json)
    }

    /// Executa uma requisição POST com corpo JSON
    pub(crate) async fn post_json<T: DeserializeOwned>(&self, endpoint: &str, body: &Value) -> Result<T> {
        let url = format!("{}{}", self.base_url, endpoint);

        tracing::debug!("POST {}", url);

        let token = self.auth.get_token().await?;
        let request = self
            .http_client
            .post(&url)
            .bearer_auth(&token)
            .header("Content-Type", "application/json")
            .json(body);

        let response = self.send_with_retry(request).await?;
        let response = self.handle_response(response).await?;
        let json = response.json().await?;
        Ok(json)
    }

    /// Executa uma requisição PATCH com corpo JSON
    ///
    /// Devolve a resposta sem tradução de status; chamadores que precisam
    /// distinguir 409 (conflito de nome) inspecionam o status direto.
    pub(crate) async fn patch_json_raw(&self, endpoint: &str, body: &Value) -> Result<Response> {
        let url = format!("{}{}", self.base_url, endpoint);

        tracing::debug!("PATCH {}", url);

        let token = self.auth.get_token().await?;
        let request = self
            .http_client
            .patch(&url)
            .bearer_auth(&token)
            .header("Content-Type", "application/json")
            .json(body);

        self.send_with_retry(request).await
    }

    /// Executa uma requisição POST e devolve a resposta crua
    pub(crate) async fn post_json_raw(&self, endpoint: &str, body: &Value) -> Result<Response> {
        let url = format!("{}{}", self.base_url, endpoint);

        tracing::debug!("POST {}", url);

        let token = self.auth.get_token().await?;
        let request = self
            .http_client
            .post(&url)
            .bearer_auth(&token)
            .header("Content-Type", "application/json")
            .json(body);

        self.send_with_retry(request).await
    }

    /// Executa um PUT binário (upload simples)
    pub(crate) async fn put_bytes<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        content: Vec<u8>,
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, endpoint);

        tracing::debug!("PUT {} ({} bytes)", url, content.len());

        let token = self.auth.get_token().await?;
        let request = self
            .http_client
            .put(&url)
            .bearer_auth(&token)
            .header("Content-Type", "application/octet-stream")
            .body(content);

        let response = self.send_with_retry(request).await?;
        let response = self.handle_response(response).await?;
        let json = response.json().await?;
        Ok(json)
    }

    /// Executa um PUT de um trecho de upload de sessão
    ///
    /// A URL da sessão é absoluta e pré-autorizada; o header `Content-Range`
    /// delimita o trecho.
    pub(crate) async fn put_chunk(
        &self,
        upload_url: &str,
        range_header: &str,
        total_len: usize,
        chunk: Vec<u8>,
    ) -> Result<Response> {
        tracing::debug!("PUT chunk {} ({} bytes de {})", range_header, chunk.len(), total_len);

        let request = self
            .http_client
            .put(upload_url)
            .header("Content-Range", range_header)
            .header("Content-Length", chunk.len() as u64)
            .body(chunk);

        let response = self.send_with_retry(request).await?;
        self.handle_response(response).await
    }

    /// Executa uma requisição DELETE
    pub(crate) async fn delete(&self, endpoint: &str) -> Result<()> {
        let url = format!("{}{}", self.base_url, endpoint);

        tracing::debug!("DELETE {}", url);

        let token = self.auth.get_token().await?;
        let request = self.http_client.delete(&url).bearer_auth(&token);

        let response = self.send_with_retry(request).await?;
        self.handle_response(response).await?;
        Ok(())
    }

    /// Envia a requisição com retry exponencial para falhas transientes
    async fn send_with_retry(&self, request: reqwest::RequestBuilder) -> Result<Response> {
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;

            let req = request.try_clone().ok_or_else(|| {
                GraphError::ConfigError("request body não clonável para retry".to_string())
            })?;

            match req.send().await {
                Ok(response) => {
                    let status = response.status();
                    let transient = status.as_u16() == 429 || status.is_server_error();
                    if transient && attempt < MAX_RETRIES {
                        let backoff_ms = INITIAL_BACKOFF_MS * 2u64.pow(attempt - 1);
                        tracing::warn!(
                            "⚠️ Graph API {} (tentativa {}/{}), aguardando {}ms",
                            status,
                            attempt,
                            MAX_RETRIES,
                            backoff_ms
                        );
                        tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                        continue;
                    }
                    return Ok(response);
                }
                Err(e) => {
                    if attempt < MAX_RETRIES {
                        let backoff_ms = INITIAL_BACKOFF_MS * 2u64.pow(attempt - 1);
                        tracing::warn!(
                            "⚠️ Falha de rede Graph (tentativa {}/{}): {}, aguardando {}ms",
                            attempt,
                            MAX_RETRIES,
                            e,
                            backoff_ms
                        );
                        tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                        continue;
                    }
                    return Err(GraphError::HttpError(e));
                }
            }
        }
    }

    /// Processa a resposta HTTP e traduz erros
    pub(crate) async fn handle_response(&self, response: Response) -> Result<Response> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let status_code = status.as_u16();
        let error_body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        tracing::error!("Microsoft Graph API error ({}): {}", status_code, error_body);

        let message = extract_error_message(&error_body);

        match status_code {
            401 | 403 => Err(GraphError::AuthError(message)),
            404 => Err(GraphError::NotFound(message)),
            409 => Err(GraphError::NameConflict(message)),
            _ => Err(GraphError::ApiError {
                status: status_code,
                message,
            }),
        }
    }

    /// Obtém a URL base da API
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Extrai a mensagem do envelope de erro do Graph (`{"error": {...}}`)
pub(crate) fn extract_error_message(error_body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<Value>(error_body) {
        if let Some(error) = json.get("error") {
            let code = error.get("code").and_then(|v| v.as_str()).unwrap_or("");
            let message = error.get("message").and_then(|v| v.as_str()).unwrap_or("");
            if !code.is_empty() || !message.is_empty() {
                return format!("{}: {}", code, message);
            }
        }
    }
    error_body.to_string()
}

/// Verifica se um corpo de erro indica conflito de nome
pub(crate) fn is_name_conflict(message: &str) -> bool {
    message.contains("nameAlreadyExists")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_error_message_envelope() {
        let body = r#"{"error": {"code": "itemNotFound", "message": "The resource could not be found."}}"#;
        assert_eq!(
            extract_error_message(body),
            "itemNotFound: The resource could not be found."
        );
    }

    #[test]
    fn test_extract_error_message_corpo_cru() {
        assert_eq!(extract_error_message("gateway timeout"), "gateway timeout");
    }

    #[test]
    fn test_is_name_conflict() {
        assert!(is_name_conflict("nameAlreadyExists: An item with the same name exists"));
        assert!(!is_name_conflict("itemNotFound: nope"));
    }
}
