use axum::{
    extract::{Path, State},
    response::Json,
};
use devops::LinkUpdate;
use serde_json::{json, Value};
use std::sync::Arc;

use devops_sharepoint_middleware::services::{
    AttachmentStatus, FeatureSyncOutcome, ProcessOptions,
};
use devops_sharepoint_middleware::utils::logging::*;
use devops_sharepoint_middleware::utils::AppError;
use devops_sharepoint_middleware::AppState;

/// Disparo manual da sincronização de uma Feature.
pub async fn sync_feature(
    State(state): State<Arc<AppState>>,
    Path(feature_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    log_request_received(&format!("/sync/feature/{}", feature_id), "POST");

    let outcome = state
        .feature_service
        .process_feature(feature_id, ProcessOptions::default())
        .await?;

    Ok(Json(outcome_body(&outcome)))
}

/// Corpo de resposta comum à sincronização (webhook e disparo manual).
pub fn outcome_body(outcome: &FeatureSyncOutcome) -> Value {
    let uploaded: Vec<&str> = outcome
        .attachments
        .iter()
        .filter(|a| a.status == AttachmentStatus::Uploaded)
        .map(|a| a.file_name.as_str())
        .collect();

    let link_update = match &outcome.link_update {
        LinkUpdate::Updated => "updated",
        LinkUpdate::Unchanged => "unchanged",
        LinkUpdate::Skipped => "skipped",
        LinkUpdate::Rejected(_) => "rejected",
    };

    json!({
        "feature_id": outcome.feature_id,
        "client": outcome.client,
        "proposal": outcome.proposal,
        "title": outcome.title,
        "folder_path": outcome.folder_path,
        "folder_created": outcome.folder_created,
        "folder_url": outcome.folder_url,
        "link_update": link_update,
        "attachments_uploaded": uploaded,
        "attachments_skipped": outcome.skipped_count(),
        "attachments_failed": outcome.failed_count()
    })
}
