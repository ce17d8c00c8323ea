/// Consolidação de pastas compartilhadas: copia o conteúdo de cada URL de
/// compartilhamento configurada para a árvore do projeto, preservando a
/// estrutura relativa e sem sobrescrever arquivos existentes.
///
/// Execute com: CONSOLIDATE_SOURCE_URLS="url1;url2" cargo run --bin consolidate

use std::process::ExitCode;

use anyhow::Context;

use devops_sharepoint_middleware::config::Settings;
use devops_sharepoint_middleware::services::ConsolidatorService;
use devops_sharepoint_middleware::utils::logging::*;

/// Variável com as URLs de origem, separadas por `;`.
const SOURCE_URLS_VAR: &str = "CONSOLIDATE_SOURCE_URLS";

fn source_urls() -> Vec<String> {
    std::env::var(SOURCE_URLS_VAR)
        .unwrap_or_default()
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    init_logging();

    let urls = source_urls();
    if urls.is_empty() {
        eprintln!("❌ Nenhuma URL de origem configurada");
        eprintln!(
            "Uso: {}=\"url1;url2\" consolidate",
            SOURCE_URLS_VAR
        );
        return ExitCode::from(2);
    }

    match run(&urls).await {
        Ok(code) => code,
        Err(e) => {
            log_error(&format!("❌ Consolidação abortada: {:#}", e));
            ExitCode::FAILURE
        }
    }
}

async fn run(urls: &[String]) -> anyhow::Result<ExitCode> {
    let settings = Settings::new().context("Falha ao carregar configurações")?;

    let graph_auth = sharepoint::GraphAuth::new(sharepoint::GraphAuthConfig {
        tenant_id: settings.sharepoint.tenant_id.clone(),
        client_id: settings.sharepoint.client_id.clone(),
        client_secret: settings.sharepoint.client_secret.clone(),
    })?;
    let graph_client = sharepoint::GraphClient::new(graph_auth)?;
    let drive = sharepoint::DriveService::new(
        graph_client,
        sharepoint::DriveConfig {
            hostname: settings.sharepoint.hostname.clone(),
            site_name: settings.sharepoint.site_name.clone(),
            drive_name_preferences: settings.sharepoint.drive_name_preferences.clone(),
        },
    );

    let consolidator =
        ConsolidatorService::new(drive, settings.sharepoint.base_folder_path.clone());
    let report = consolidator.consolidate(urls).await?;

    println!("Consolidação:");
    println!("  copiados:    {}", report.copied);
    println!("  já existiam: {}", report.skipped);
    println!("  erros:       {}", report.errors);

    if report.has_errors() {
        return Ok(ExitCode::from(1));
    }
    Ok(ExitCode::SUCCESS)
}
