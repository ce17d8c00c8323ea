use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

use crate::models::DEFAULT_CLOSED_STATES;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub devops: DevOpsSettings,
    pub sharepoint: SharePointSettings,
    #[serde(default)]
    pub sync: SyncSettings,
    #[serde(default)]
    pub webhook: WebhookSettings,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DevOpsSettings {
    pub organization: String,
    pub project: String,
    #[serde(default = "default_devops_base_url")]
    pub base_url: String,
    pub pat: String,
    /// Raiz organizacional das Features (area path). Só itens sob ela são sincronizados.
    pub area_root: String,
    #[serde(default = "default_proposal_field")]
    pub proposal_field: String,
    #[serde(default = "default_link_field")]
    pub link_field: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SharePointSettings {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
    /// Hostname do tenant, ex.: `contoso.sharepoint.com`.
    pub hostname: String,
    pub site_name: String,
    #[serde(default = "default_drive_preferences")]
    pub drive_name_preferences: Vec<String>,
    /// Pasta base dentro do drive (vazio = raiz do drive).
    #[serde(default)]
    pub base_folder_path: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SyncSettings {
    #[serde(default = "default_closed_states")]
    pub closed_states: Vec<String>,
    #[serde(default = "default_fallback_year_bucket")]
    pub fallback_year_bucket: String,
    #[serde(default)]
    pub fail_on_feature_error: bool,
    #[serde(default = "default_last_run_file")]
    pub last_run_file: String,
    #[serde(default = "default_report_dir")]
    pub report_dir: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct WebhookSettings {
    /// Segredo esperado no header `X-Webhook-Secret`. Sem segredo configurado,
    /// o endpoint de webhook rejeita todas as chamadas.
    pub secret: Option<String>,
}

fn default_devops_base_url() -> String {
    "https://dev.azure.com".to_string()
}

fn default_proposal_field() -> String {
    "Custom.NumeroProposta".to_string()
}

fn default_link_field() -> String {
    "Custom.LinkPastaDocumentacao".to_string()
}

fn default_drive_preferences() -> Vec<String> {
    vec![
        "Documentos".to_string(),
        "Documents".to_string(),
        "Documentos Compartilhados".to_string(),
        "Shared Documents".to_string(),
    ]
}

fn default_closed_states() -> Vec<String> {
    DEFAULT_CLOSED_STATES.iter().map(|s| s.to_string()).collect()
}

fn default_fallback_year_bucket() -> String {
    "2020-2023".to_string()
}

fn default_last_run_file() -> String {
    "last_run.txt".to_string()
}

fn default_report_dir() -> String {
    "reports".to_string()
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            closed_states: default_closed_states(),
            fallback_year_bucket: default_fallback_year_bucket(),
            fail_on_feature_error: false,
            last_run_file: default_last_run_file(),
            report_dir: default_report_dir(),
        }
    }
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let mut builder = Config::builder()
            // Arquivo de configuração base
            .add_source(File::with_name("config/default").required(false))
            // Arquivo específico do ambiente
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false));

        // Credenciais e valores de deploy sempre podem vir do ambiente
        let env_overrides = [
            ("AZURE_DEVOPS_ORGANIZATION", "devops.organization"),
            ("AZURE_DEVOPS_PROJECT", "devops.project"),
            ("AZURE_DEVOPS_PAT", "devops.pat"),
            ("AZURE_DEVOPS_AREA_ROOT", "devops.area_root"),
            ("GRAPH_TENANT_ID", "sharepoint.tenant_id"),
            ("GRAPH_CLIENT_ID", "sharepoint.client_id"),
            ("GRAPH_CLIENT_SECRET", "sharepoint.client_secret"),
            ("SHAREPOINT_HOSTNAME", "sharepoint.hostname"),
            ("SHAREPOINT_SITE_NAME", "sharepoint.site_name"),
            ("SHAREPOINT_BASE_FOLDER", "sharepoint.base_folder_path"),
            ("WEBHOOK_SECRET", "webhook.secret"),
        ];
        for (var, key) in env_overrides {
            if let Ok(value) = std::env::var(var) {
                builder = builder.set_override(key, value)?;
            }
        }

        // Também suportar o prefixo genérico do serviço
        builder = builder.add_source(Environment::with_prefix("DEVOPS_SHAREPOINT"));

        let s = builder.build()?;

        s.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_settings_padrao() {
        let sync = SyncSettings::default();
        assert!(sync.closed_states.contains(&"encerrado".to_string()));
        assert!(sync.closed_states.contains(&"closed".to_string()));
        assert_eq!(sync.fallback_year_bucket, "2020-2023");
        assert!(!sync.fail_on_feature_error);
        assert_eq!(sync.last_run_file, "last_run.txt");
        assert_eq!(sync.report_dir, "reports");
    }

    #[test]
    fn test_secoes_opcionais_com_default() {
        // Sem as seções [sync] e [webhook], os defaults entram em vigor
        let toml = r#"
            [server]
            host = "0.0.0.0"
            port = 8080

            [devops]
            organization = "minha-org"
            project = "Projetos"
            pat = "abc123"
            area_root = "Projetos"

            [sharepoint]
            tenant_id = "t"
            client_id = "c"
            client_secret = "s"
            hostname = "contoso.sharepoint.com"
            site_name = "Documentacao"
        "#;

        let settings: Settings = Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(settings.devops.base_url, "https://dev.azure.com");
        assert_eq!(settings.devops.proposal_field, "Custom.NumeroProposta");
        assert_eq!(settings.sharepoint.drive_name_preferences[0], "Documentos");
        assert_eq!(settings.sharepoint.base_folder_path, "");
        assert_eq!(settings.sync.fallback_year_bucket, "2020-2023");
        assert_eq!(settings.webhook.secret, None);
    }
}
