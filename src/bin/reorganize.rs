/// Reorganização única da biblioteca de documentos: move pastas soltas para
/// o caminho canônico `{ano}/{cliente}/{id} - {proposta} - {título}`,
/// remove duplicatas do bucket de fallback e mescla grafias de cliente.
///
/// Execute com: cargo run --bin reorganize -- [--dry-run] [--skip-audit]

use std::process::ExitCode;

use anyhow::Context;

use devops_sharepoint_middleware::config::Settings;
use devops_sharepoint_middleware::services::{
    FeatureResolver, ReorganizeOptions, ReorganizerService,
};
use devops_sharepoint_middleware::utils::logging::*;

fn parse_args() -> Result<ReorganizeOptions, String> {
    let mut options = ReorganizeOptions::default();
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--dry-run" => options.dry_run = true,
            "--skip-audit" => options.skip_audit = true,
            other => return Err(format!("argumento desconhecido: '{}'", other)),
        }
    }
    Ok(options)
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    init_logging();

    let options = match parse_args() {
        Ok(options) => options,
        Err(e) => {
            eprintln!("❌ {}", e);
            eprintln!("Uso: reorganize [--dry-run] [--skip-audit]");
            return ExitCode::from(2);
        }
    };

    match run(options).await {
        Ok(code) => code,
        Err(e) => {
            log_error(&format!("❌ Reorganização abortada: {:#}", e));
            ExitCode::FAILURE
        }
    }
}

async fn run(options: ReorganizeOptions) -> anyhow::Result<ExitCode> {
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
    let resolver = FeatureResolver::new(work_items);

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

    let reorganizer = ReorganizerService::new(
        resolver,
        drive,
        settings.sync.clone(),
        settings.sharepoint.base_folder_path.clone(),
        options,
    );

    let report = reorganizer.run().await?;

    println!("Reorganização{}:", if options.dry_run { " (dry-run)" } else { "" });
    println!("  movidas:             {}", report.moved);
    println!("  ignoradas:           {}", report.skipped);
    println!("  duplicatas removidas: {}", report.duplicates_removed);
    println!("  grafias mescladas:   {}", report.alias_merges);
    println!("  erros:               {}", report.errors);
    if !report.non_canonical.is_empty() {
        println!("  fora do padrão canônico:");
        for path in &report.non_canonical {
            println!("    - {}", path);
        }
    }

    if report.has_errors() {
        return Ok(ExitCode::from(1));
    }
    Ok(ExitCode::SUCCESS)
}
