//! Cliente HTTP para a API REST do Azure DevOps

use crate::error::{DevOpsError, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::{Client as HttpClient, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

/// Versão da API usada em todas as chamadas
pub(crate) const API_VERSION: &str = "7.1";

// Configuração de retry para erros transientes (rede, 429, 5xx)
const MAX_RETRIES: u32 = 3;
const INITIAL_BACKOFF_MS: u64 = 500;

/// Cliente para interagir com a API do Azure DevOps
///
/// Autenticação via Personal Access Token (Basic auth com usuário vazio).
/// Todas as rotas são relativas a `{base_url}/{org}/{project}/_apis`.
#[derive(Clone)]
pub struct DevOpsClient {
    http_client: HttpClient,
    api_base: String,
    auth_header: String,
}

impl DevOpsClient {
    /// Cria um novo cliente DevOps
    ///
    /// # Argumentos
    ///
    /// * `base_url` - URL base do serviço (padrão `https://dev.azure.com`)
    /// * `organization` - Nome da organização
    /// * `project` - Nome do projeto
    /// * `pat` - Personal Access Token (não pode ser vazio)
    ///
    /// # Timeouts
    ///
    /// - Total: 30s
    /// - Connect: 5s
    pub fn new(
        base_url: impl Into<String>,
        organization: impl Into<String>,
        project: impl Into<String>,
        pat: impl Into<String>,
    ) -> Result<Self> {
        let pat = pat.into();
        if pat.trim().is_empty() {
            return Err(DevOpsError::AuthError(
                "Personal Access Token não configurado".to_string(),
            ));
        }

        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| DevOpsError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        let base_url = base_url.into();
        let api_base = format!(
            "{}/{}/{}/_apis",
            base_url.trim_end_matches('/'),
            organization.into(),
            project.into()
        );

        Ok(Self {
            http_client,
            api_base,
            auth_header: format!("Basic {}", BASE64.encode(format!(":{}", pat))),
        })
    }

    /// Executa uma requisição GET
    pub(crate) async fn get(&self, endpoint: &str) -> Result<Response> {
        let url = format!("{}{}", self.api_base, endpoint);

        tracing::debug!("GET {}", url);

        let request = self
            .http_client
            .get(&url)
            .header("Authorization", &self.auth_header);

        let response = self.send_with_retry(request).await?;
        self.handle_response(response).await
    }

    /// Executa uma requisição GET e parseia JSON
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        let response = self.get(endpoint).await?;
        let json = response.json().await?;
        Ok(json)
    }

    /// Executa uma requisição POST com corpo JSON
    pub(crate) async fn post_json<T: DeserializeOwned>(&self, endpoint: &str, body: &Value) -> Result<T> {
        let url = format!("{}{}", self.api_base, endpoint);

        tracing::debug!("POST {}", url);

        let request = self
            .http_client
            .post(&url)
            .header("Authorization", &self.auth_header)
            .header("Content-Type", "application/json")
            .json(body);

        let response = self.send_with_retry(request).await?;
        let response = self.handle_response(response).await?;
        let json = response.json().await?;
        Ok(json)
    }

    /// Executa uma requisição PATCH com corpo JSON-patch
    ///
    /// Content-Type `application/json-patch+json`, exigido pelos endpoints
    /// de atualização de work item.
    pub(crate) async fn patch_json(&self, endpoint: &str, body: &Value) -> Result<Response> {
        let url = format!("{}{}", self.api_base, endpoint);

        tracing::debug!("PATCH {}", url);

        let request = self
            .http_client
            .patch(&url)
            .header("Authorization", &self.auth_header)
            .header("Content-Type", "application/json-patch+json")
            .json(body);

        self.send_with_retry(request).await
    }

    /// Envia a requisição com retry exponencial para falhas transientes
    ///
    /// Erros de rede, 429 e 5xx são retentados; qualquer outra resposta é
    /// devolvida ao chamador para tratamento normal.
    async fn send_with_retry(&self, request: reqwest::RequestBuilder) -> Result<Response> {
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;

            let req = request.try_clone().ok_or_else(|| {
                DevOpsError::ConfigError("request body não clonável para retry".to_string())
            })?;

            match req.send().await {
                Ok(response) => {
                    let status = response.status();
                    let transient = status.as_u16() == 429 || status.is_server_error();
                    if transient && attempt < MAX_RETRIES {
                        let backoff_ms = INITIAL_BACKOFF_MS * 2u64.pow(attempt - 1);
                        tracing::warn!(
                            "⚠️ DevOps API {} (tentativa {}/{}), aguardando {}ms",
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
                            "⚠️ Falha de rede DevOps (tentativa {}/{}): {}, aguardando {}ms",
                            attempt,
                            MAX_RETRIES,
                            e,
                            backoff_ms
                        );
                        tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                        continue;
                    }
                    return Err(DevOpsError::HttpError(e));
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

        tracing::error!("Azure DevOps API error ({}): {}", status_code, error_body);

        let message = extract_error_message(&error_body);

        match status_code {
            401 | 403 => Err(DevOpsError::AuthError(message)),
            404 => Err(DevOpsError::NotFound(message)),
            _ => Err(DevOpsError::ApiError {
                status: status_code,
                message,
            }),
        }
    }

    /// Obtém a URL base da API (`.../{org}/{project}/_apis`)
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Obtém o header de autenticação (Basic + PAT)
    pub fn auth_header(&self) -> &str {
        &self.auth_header
    }
}

/// Extrai a mensagem de erro do corpo JSON, quando possível
pub(crate) fn extract_error_message(error_body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<Value>(error_body) {
        json.get("message")
            .or_else(|| json.get("error"))
            .and_then(|v| v.as_str())
            .unwrap_or(error_body)
            .to_string()
    } else {
        error_body.to_string()
    }
}
