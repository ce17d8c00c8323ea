/// Main Application: Middleware DevOps → SharePoint
///
/// Arquitetura:
/// - Webhook recebe eventos de work item do Azure DevOps
/// - Cada Feature ganha uma pasta canônica `{id} - {proposta} - {título}`
///   na biblioteca de documentos, organizada por ano e cliente
/// - Anexos são espelhados para a pasta e o link de documentação é
///   gravado de volta no work item
///
/// Os binários auxiliares (pipeline, reorganize, consolidate) reusam os
/// mesmos serviços para execuções em lote fora do servidor.

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

// Importar módulos da biblioteca
use devops_sharepoint_middleware::{config, services, utils, AppState};

mod handlers;

use config::Settings;
use handlers::{handle_devops_webhook, health_check, status_check, sync_feature};
use utils::{logging::*, AppError};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 🔧 Carregar variáveis de ambiente do arquivo .env (se existir)
    if let Err(_) = dotenvy::dotenv() {
        // Em produção (container), não existe .env - variáveis vêm do ambiente
        tracing::debug!("Arquivo .env não encontrado - usando variáveis de ambiente do sistema");
    } else {
        tracing::info!("✅ Arquivo .env carregado com sucesso");
    }

    // Inicializar tracing
    init_logging();

    // Carregar configurações
    let settings = Settings::new()
        .map_err(|e| AppError::ConfigError(format!("Failed to load settings: {}", e)))?;

    log_config_loaded(&std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string()));

    // Cliente do Azure DevOps (WIQL + work items + anexos)
    let devops_client = devops::DevOpsClient::new(
        settings.devops.base_url.clone(),
        settings.devops.organization.clone(),
        settings.devops.project.clone(),
        settings.devops.pat.clone(),
    )
    .map_err(|e| AppError::ConfigError(format!("Failed to create DevOps client: {}", e)))?;

    let work_items = devops::WorkItemManager::new(
        devops_client,
        devops::WorkItemFieldConfig {
            area_root: settings.devops.area_root.clone(),
            proposal_field: settings.devops.proposal_field.clone(),
            link_field: settings.devops.link_field.clone(),
        },
    );
    log_info(&format!(
        "⚡ DevOps configurado: org '{}', projeto '{}'",
        settings.devops.organization, settings.devops.project
    ));

    // Cliente do Microsoft Graph (site + biblioteca de documentos)
    let graph_auth = sharepoint::GraphAuth::new(sharepoint::GraphAuthConfig {
        tenant_id: settings.sharepoint.tenant_id.clone(),
        client_id: settings.sharepoint.client_id.clone(),
        client_secret: settings.sharepoint.client_secret.clone(),
    })
    .map_err(|e| AppError::ConfigError(format!("Failed to create Graph auth: {}", e)))?;
    let graph_client = sharepoint::GraphClient::new(graph_auth)
        .map_err(|e| AppError::ConfigError(format!("Failed to create Graph client: {}", e)))?;
    let drive = sharepoint::DriveService::new(
        graph_client,
        sharepoint::DriveConfig {
            hostname: settings.sharepoint.hostname.clone(),
            site_name: settings.sharepoint.site_name.clone(),
            drive_name_preferences: settings.sharepoint.drive_name_preferences.clone(),
        },
    );
    log_info(&format!(
        "⚡ Graph configurado: site '{}' em '{}'",
        settings.sharepoint.site_name, settings.sharepoint.hostname
    ));

    let feature_service = services::FeatureFolderService::new(
        work_items,
        drive,
        settings.sync.clone(),
        settings.sharepoint.base_folder_path.clone(),
    );

    if settings.webhook.secret.is_none() {
        log_warning("⚠️ WEBHOOK_SECRET não configurado - chamadas ao webhook serão rejeitadas");
    }

    // Inicializar estado da aplicação
    let app_state = Arc::new(AppState {
        settings: settings.clone(),
        feature_service,
    });

    // Configurar rotas
    let app = Router::new()
        // Health checks (públicos)
        .route("/health", get(health_check))
        .route("/status", get(status_check))

        // Webhook do Azure DevOps (validação própria por segredo)
        .route("/webhook/devops", post(handle_devops_webhook))

        // Sincronização manual de uma Feature específica
        .route("/sync/feature/:id", post(sync_feature))

        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    // Iniciar servidor
    // Em containers, usar a variável de ambiente PORT
    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(settings.server.port);
    let listener = TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    log_server_startup(port);
    log_server_ready(port);

    // Graceful shutdown com signal handling
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log_info("🛑 Server shut down gracefully");
    Ok(())
}

/// Signal handler para graceful shutdown
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            log_info("🛑 Received Ctrl+C, shutting down gracefully...");
        },
        _ = terminate => {
            log_info("🛑 Received SIGTERM, shutting down gracefully...");
        }
    }
}
