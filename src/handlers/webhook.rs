use axum::{extract::State, http::HeaderMap, response::Json};
use serde_json::Value;
use std::sync::Arc;
use tokio::time::Instant;

use devops_sharepoint_middleware::config::settings::WebhookSettings;
use devops_sharepoint_middleware::services::ProcessOptions;
use devops_sharepoint_middleware::utils::logging::*;
use devops_sharepoint_middleware::utils::{AppError, AppResult};
use devops_sharepoint_middleware::AppState;

use super::sync::outcome_body;

/// Recebe o service hook do Azure DevOps e sincroniza o work item citado.
///
/// O corpo segue o envelope dos service hooks: `resource.workItemId` nos
/// eventos de atualização, `resource.id` nos de criação. A sincronização
/// roda inline; a resposta é o mesmo resumo do disparo manual.
pub async fn handle_devops_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<Value>,
) -> Result<Json<Value>, AppError> {
    let start_time = Instant::now();
    log_request_received("/webhook/devops", "POST");

    verify_webhook_secret(&headers, &state.settings.webhook)?;

    let feature_id = extract_work_item_id(&payload).ok_or_else(|| {
        AppError::ValidationError("payload sem id de work item em resource".to_string())
    })?;

    let event_type = payload
        .get("eventType")
        .and_then(Value::as_str)
        .unwrap_or("?");
    log_info(&format!(
        "📥 Evento '{}' para o work item {}",
        event_type, feature_id
    ));

    let outcome = state
        .feature_service
        .process_feature(feature_id, ProcessOptions::default())
        .await?;

    let processing_time = start_time.elapsed().as_millis() as u64;
    log_request_processed("/webhook/devops", 200, processing_time);

    Ok(Json(outcome_body(&outcome)))
}

/// Id do work item no envelope do service hook.
fn extract_work_item_id(payload: &Value) -> Option<i64> {
    let resource = payload.get("resource")?;
    resource
        .get("workItemId")
        .and_then(Value::as_i64)
        .or_else(|| resource.get("id").and_then(Value::as_i64))
}

/// Valida o header `X-Webhook-Secret` contra o segredo configurado.
///
/// Sem segredo configurado, toda chamada é recusada.
fn verify_webhook_secret(headers: &HeaderMap, settings: &WebhookSettings) -> AppResult<()> {
    let Some(secret) = settings.secret.as_deref() else {
        log_webhook_rejected("segredo não configurado no servidor");
        return Err(AppError::Unauthorized(
            "webhook sem segredo configurado".to_string(),
        ));
    };

    let provided = headers
        .get("X-Webhook-Secret")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if !constant_time_eq(provided.as_bytes(), secret.as_bytes()) {
        log_webhook_rejected("segredo inválido");
        return Err(AppError::Unauthorized(
            "segredo do webhook inválido".to_string(),
        ));
    }

    Ok(())
}

// Comparação de tempo constante para evitar timing attacks
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}
