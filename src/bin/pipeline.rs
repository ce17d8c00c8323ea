/// Pipeline de reconciliação em lote: varre as Features do Azure DevOps e
/// garante pasta, anexos e link de documentação de cada uma.
///
/// Execute com: cargo run --bin pipeline -- [--full] [--only-closed] [--limit N] [--dry-run]
///
/// Sem `--full`, a varredura é incremental a partir do marcador gravado na
/// última execução (`sync.last_run_file`). `--dry-run` apenas lista as
/// Features que seriam processadas.

use std::path::Path;
use std::process::ExitCode;

use anyhow::Context;
use chrono::Utc;
use devops::FeatureListFilter;

use devops_sharepoint_middleware::config::Settings;
use devops_sharepoint_middleware::services::{
    FeatureFolderService, FeatureSyncOutcome, ProcessOptions,
};
use devops_sharepoint_middleware::utils::logging::*;
use devops_sharepoint_middleware::utils::report::{ReportRow, RowStatus, RunReport};
use devops_sharepoint_middleware::utils::scan_marker;
use devops_sharepoint_middleware::utils::AppError;

#[derive(Debug, Default)]
struct PipelineArgs {
    full: bool,
    only_closed: bool,
    limit: Option<usize>,
    dry_run: bool,
}

fn parse_args() -> Result<PipelineArgs, String> {
    let mut args = PipelineArgs::default();
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--full" => args.full = true,
            "--only-closed" => args.only_closed = true,
            "--dry-run" => args.dry_run = true,
            "--limit" => {
                let value = iter
                    .next()
                    .ok_or_else(|| "--limit requer um número".to_string())?;
                args.limit = Some(
                    value
                        .parse()
                        .map_err(|_| format!("--limit inválido: '{}'", value))?,
                );
            }
            other => return Err(format!("argumento desconhecido: '{}'", other)),
        }
    }
    Ok(args)
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    init_logging();

    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("❌ {}", e);
            eprintln!("Uso: pipeline [--full] [--only-closed] [--limit N] [--dry-run]");
            return ExitCode::from(2);
        }
    };

    match run(&args).await {
        Ok(code) => code,
        Err(e) => {
            log_error(&format!("❌ Pipeline abortado: {:#}", e));
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &PipelineArgs) -> anyhow::Result<ExitCode> {
    let settings = Settings::new().context("Falha ao carregar configurações")?;

    let devops_client = devops::DevOpsClient::new(
        settings.devops.base_url.clone(),
        settings.devops.organization.clone(),
        settings.devops.project.clone(),
        settings.devops.pat.clone(),
    )?;
    let work_items = devops::WorkItemManager::new(
        devops_client,
        devops::WorkItemFieldConfig {
            area_root: settings.devops.area_root.clone(),
            proposal_field: settings.devops.proposal_field.clone(),
            link_field: settings.devops.link_field.clone(),
        },
    );

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

    let service = FeatureFolderService::new(
        work_items.clone(),
        drive,
        settings.sync.clone(),
        settings.sharepoint.base_folder_path.clone(),
    );

    // O marcador delimita a varredura incremental. O timestamp da execução
    // atual é capturado ANTES da listagem: alterações feitas durante o
    // processamento entram na próxima varredura.
    let marker_path = Path::new(&settings.sync.last_run_file);
    let updated_since = if args.full {
        None
    } else {
        scan_marker::read_last_run(marker_path)
    };
    let run_started = Utc::now();

    match updated_since {
        Some(since) => log_info(&format!(
            "🔄 Varredura incremental: Features alteradas desde {}",
            since.to_rfc3339()
        )),
        None => log_info("🔄 Varredura completa de Features"),
    }

    let filter = FeatureListFilter {
        include_closed: true,
        only_closed: args.only_closed,
        updated_since,
    };
    let mut features = work_items.list_features(&filter).await?;
    if let Some(limit) = args.limit {
        features.truncate(limit);
    }

    log_info(&format!("📋 {} Feature(s) na fila", features.len()));

    if args.dry_run {
        for item in &features {
            println!(
                "  {} - {} [{}]",
                item.id,
                item.title().unwrap_or("(sem título)"),
                item.state().unwrap_or("?")
            );
        }
        log_info("🔎 [dry-run] Nenhuma alteração feita, marcador não atualizado");
        return Ok(ExitCode::SUCCESS);
    }

    let mut report = RunReport::new();
    let mut failed: Vec<(usize, i64)> = Vec::new();

    for item in &features {
        match service.process_feature(item.id, ProcessOptions::default()).await {
            Ok(outcome) => report.push(outcome_row(&outcome)),
            Err(e) => {
                log_error(&format!("❌ Feature {}: {}", item.id, e));
                report.push(failure_row(item.id, item.title(), &e));
                failed.push((report.total() - 1, item.id));
            }
        }
    }

    // Um único passe de retry para as falhas, sem regravar o link (o campo
    // pode ter sido a causa da falha e o valor correto já pode estar lá).
    if !failed.is_empty() {
        log_info(&format!("🔄 Retry de {} falha(s)", failed.len()));
        let mut remaining: Vec<(usize, i64)> = Vec::new();
        for (row_index, feature_id) in failed {
            let options = ProcessOptions {
                skip_link_update: true,
            };
            match service.process_feature(feature_id, options).await {
                Ok(outcome) => report.replace(row_index, outcome_row(&outcome)),
                Err(e) => {
                    log_error(&format!("❌ Feature {} (retry): {}", feature_id, e));
                    remaining.push((row_index, feature_id));
                }
            }
        }
        failed = remaining;
    }

    match report.write_html(Path::new(&settings.sync.report_dir)) {
        Ok(path) => log_info(&format!("📊 Relatório gravado em {}", path.display())),
        Err(e) => log_warning(&format!("⚠️ Falha ao gravar relatório: {}", e)),
    }

    if let Err(e) = scan_marker::write_last_run(marker_path, run_started) {
        log_warning(&format!(
            "⚠️ Falha ao gravar marcador '{}': {}",
            marker_path.display(),
            e
        ));
    }

    log_info(&format!(
        "✅ Pipeline concluído: {} Feature(s), {} falha(s)",
        report.total(),
        failed.len()
    ));

    if !failed.is_empty() && settings.sync.fail_on_feature_error {
        return Ok(ExitCode::from(1));
    }
    Ok(ExitCode::SUCCESS)
}

fn outcome_row(outcome: &FeatureSyncOutcome) -> ReportRow {
    let status = if outcome.has_failures() {
        RowStatus::Partial
    } else {
        RowStatus::Success
    };
    ReportRow {
        feature_id: outcome.feature_id,
        client: outcome.client.clone(),
        title: outcome.title.clone(),
        proposal: outcome.proposal.clone(),
        folder_url: outcome.folder_url.clone(),
        uploaded: outcome.uploaded_count(),
        skipped: outcome.skipped_count(),
        failed: outcome.failed_count(),
        status,
        error: None,
    }
}

fn failure_row(feature_id: i64, title: Option<&str>, error: &AppError) -> ReportRow {
    ReportRow {
        feature_id,
        client: String::new(),
        title: title.unwrap_or_default().to_string(),
        proposal: String::new(),
        folder_url: None,
        uploaded: 0,
        skipped: 0,
        failed: 0,
        status: RowStatus::Failed,
        error: Some(error.to_string()),
    }
}
