use axum::{extract::State, response::Json};
use serde_json::{json, Value};
use std::sync::Arc;

use devops_sharepoint_middleware::utils::logging::*;
use devops_sharepoint_middleware::AppState;

pub async fn health_check() -> Json<Value> {
    log_health_check();

    Json(json!({
        "status": "healthy",
        "service": "devops-sharepoint-middleware",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Metadados do serviço e integrações configuradas. Nunca expõe segredos.
pub async fn status_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    log_integration_status_check();

    let devops_configured = !state.settings.devops.pat.is_empty();
    let graph_configured = !state.settings.sharepoint.client_secret.is_empty()
        && !state.settings.sharepoint.tenant_id.is_empty();

    Json(json!({
        "service": "devops-sharepoint-middleware",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "environment": std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string()),
        "integrations": {
            "devops": {
                "configured": devops_configured,
                "organization": state.settings.devops.organization,
                "project": state.settings.devops.project,
                "area_root": state.settings.devops.area_root
            },
            "sharepoint": {
                "configured": graph_configured,
                "hostname": state.settings.sharepoint.hostname,
                "site_name": state.settings.sharepoint.site_name,
                "base_folder_path": state.settings.sharepoint.base_folder_path
            },
            "webhook": {
                "secret_configured": state.settings.webhook.secret.is_some()
            }
        }
    }))
}
