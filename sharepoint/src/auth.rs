//! Autenticação OAuth2 client-credentials contra o Azure AD
//!
//! O token de aplicação é obtido uma vez e reutilizado até perto da
//! expiração; a renovação é transparente para os chamadores.

use crate::error::{GraphError, Result};
use crate::types::TokenResponse;
use reqwest::Client as HttpClient;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Margem subtraída do `expires_in` para renovar antes do vencimento
const EXPIRY_MARGIN_SECS: u64 = 300;

/// Escopo fixo do fluxo client-credentials
const GRAPH_SCOPE: &str = "https://graph.microsoft.com/.default";

/// Credenciais da aplicação registrada no Azure AD
#[derive(Debug, Clone)]
pub struct GraphAuthConfig {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
}

/// Cache de token em memória
#[derive(Debug, Clone)]
struct TokenCache {
    token: Option<String>,
    acquired_at: Option<Instant>,
    ttl: Duration,
}

impl TokenCache {
    fn new() -> Self {
        Self {
            token: None,
            acquired_at: None,
            ttl: Duration::from_secs(0),
        }
    }

    fn is_valid(&self) -> bool {
        if let (Some(_), Some(acquired_at)) = (&self.token, self.acquired_at) {
            acquired_at.elapsed() < self.ttl
        } else {
            false
        }
    }

    fn set(&mut self, token: String, expires_in_secs: u64) {
        self.token = Some(token);
        self.acquired_at = Some(Instant::now());
        // nunca abaixo de 60s para não re-autenticar em loop
        self.ttl = Duration::from_secs(expires_in_secs.saturating_sub(EXPIRY_MARGIN_SECS).max(60));
    }
}

/// Provedor de tokens do Graph
pub struct GraphAuth {
    config: GraphAuthConfig,
    http_client: HttpClient,
    token_url: String,
    cache: Arc<RwLock<TokenCache>>,
}

impl GraphAuth {
    /// Cria um novo provedor de tokens
    ///
    /// # Argumentos
    ///
    /// * `config` - Credenciais da app (tenant, client id e secret, todos
    ///   obrigatórios)
    pub fn new(config: GraphAuthConfig) -> Result<Self> {
        let token_url = format!(
            "https://login.microsoftonline.com/{}/oauth2/v2.0/token",
            config.tenant_id
        );
        Self::with_token_url(config, token_url)
    }

    /// Cria um provedor com URL de token customizada
    pub fn with_token_url(config: GraphAuthConfig, token_url: impl Into<String>) -> Result<Self> {
        if config.tenant_id.trim().is_empty()
            || config.client_id.trim().is_empty()
            || config.client_secret.trim().is_empty()
        {
            return Err(GraphError::AuthError(
                "Credenciais do Graph não configuradas (tenant/client/secret)".to_string(),
            ));
        }

        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| GraphError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http_client,
            token_url: token_url.into(),
            cache: Arc::new(RwLock::new(TokenCache::new())),
        })
    }

    /// Obtém um token válido (cache → endpoint de token)
    ///
    /// # Retorno
    /// - `Ok(String)`: access token válido
    /// - `Err(GraphError)`: credenciais recusadas ou falha de rede
    pub async fn get_token(&self) -> Result<String> {
        {
            let cache = self.cache.read().await;
            if cache.is_valid() {
                if let Some(token) = &cache.token {
                    return Ok(token.clone());
                }
            }
        }

        tracing::debug!("🔄 Token do Graph expirado ou ausente, renovando...");

        let response = self
            .http_client
            .post(&self.token_url)
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("scope", GRAPH_SCOPE),
                ("grant_type", "client_credentials"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::error!("❌ Azure AD recusou as credenciais ({}): {}", status, body);
            return Err(GraphError::AuthError(format!(
                "token endpoint retornou {}: {}",
                status, body
            )));
        }

        let token_response: TokenResponse = response.json().await?;
        let expires_in = token_response.expires_in.unwrap_or(3600);

        let mut cache = self.cache.write().await;
        cache.set(token_response.access_token.clone(), expires_in);

        tracing::debug!("✅ Token do Graph renovado (expira em {}s)", expires_in);

        Ok(token_response.access_token)
    }
}
