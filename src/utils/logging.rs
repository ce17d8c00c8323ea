use tracing::{info, warn, error, debug};

/// Inicializa o tracing com filtro vindo de `RUST_LOG` (padrão: `info`).
pub fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

pub fn log_request_received(endpoint: &str, method: &str) {
    info!("Request received: {} {}", method, endpoint);
}

pub fn log_request_processed(endpoint: &str, status: u16, duration_ms: u64) {
    info!("Request processed: {} - Status: {} - Duration: {}ms", endpoint, status, duration_ms);
}

pub fn log_config_loaded(env: &str) {
    info!("Configuration loaded successfully for environment: {}", env);
}

pub fn log_server_startup(port: u16) {
    info!("🚀 DevOps-SharePoint middleware server starting on port {}", port);
}

pub fn log_server_ready(port: u16) {
    info!("✅ Server ready and listening on http://0.0.0.0:{}", port);
}

pub fn log_health_check() {
    debug!("Health check requested");
}

pub fn log_integration_status_check() {
    debug!("Integration status check requested");
}

pub fn log_feature_sync_start(feature_id: i64) {
    info!("🔄 Starting sync for Feature #{}", feature_id);
}

pub fn log_feature_sync_result(
    feature_id: i64,
    client: &str,
    folder_name: &str,
    uploaded: usize,
    skipped: usize,
    failed: usize,
) {
    info!(
        "✅ Feature #{} synced: client '{}' - folder '{}' - {} uploaded, {} skipped, {} failed",
        feature_id, client, folder_name, uploaded, skipped, failed
    );
}

pub fn log_attachment_uploaded(feature_id: i64, file_name: &str) {
    info!("⬆️ Feature #{}: attachment '{}' uploaded", feature_id, file_name);
}

pub fn log_attachment_skipped(feature_id: i64, file_name: &str) {
    debug!("Feature #{}: attachment '{}' already present, skipped", feature_id, file_name);
}

pub fn log_attachment_failed(feature_id: i64, file_name: &str, reason: &str) {
    warn!("⚠️ Feature #{}: attachment '{}' failed: {}", feature_id, file_name, reason);
}

pub fn log_devops_api_error(endpoint: &str, error: &str) {
    error!("Azure DevOps API error: {} - Error: {}", endpoint, error);
}

pub fn log_sharepoint_api_error(context: &str, error: &str) {
    error!("SharePoint API error: {} - Error: {}", context, error);
}

pub fn log_webhook_rejected(reason: &str) {
    warn!("Webhook rejected: {}", reason);
}

pub fn log_info(message: &str) {
    info!("{}", message);
}

pub fn log_error(message: &str) {
    error!("{}", message);
}

pub fn log_warning(message: &str) {
    warn!("{}", message);
}
