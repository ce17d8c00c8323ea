//! Consolidação de documentos de pastas externas na árvore do projeto.
//!
//! Recebe URLs de compartilhamento de pastas (inclusive de outros drives),
//! percorre os arquivos recursivamente e os copia para debaixo da pasta
//! base preservando a estrutura relativa de cada origem. Arquivos cujo nome
//! já existe na pasta de destino são ignorados; nada é sobrescrito.

use sharepoint::{DriveService, RemoteFile};

use crate::utils::error::{AppError, AppResult};
use crate::utils::naming::sanitize_attachment_filename;

/// Totais de uma execução da consolidação.
#[derive(Debug, Default)]
pub struct ConsolidateReport {
    /// Arquivos copiados para a árvore do projeto.
    pub copied: u32,
    /// Arquivos ignorados por já existirem no destino.
    pub skipped: u32,
    /// Falhas individuais (origem ou arquivo).
    pub errors: u32,
}

impl ConsolidateReport {
    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }
}

/// Serviço de consolidação de pastas de origem.
pub struct ConsolidatorService {
    drive: DriveService,
    base_folder_path: String,
}

impl ConsolidatorService {
    pub fn new(drive: DriveService, base_folder_path: String) -> Self {
        Self {
            drive,
            base_folder_path,
        }
    }

    /// Copia o conteúdo de cada pasta de origem para a árvore do projeto.
    ///
    /// Uma origem que falha inteira (URL inválida, drive inacessível) conta
    /// um erro e não interrompe as demais; o mesmo vale para cada arquivo.
    pub async fn consolidate(&self, sharing_urls: &[String]) -> AppResult<ConsolidateReport> {
        let mut report = ConsolidateReport::default();
        tracing::info!(
            "🔄 Consolidando {} pasta(s) de origem na estrutura do projeto",
            sharing_urls.len()
        );

        for (index, url) in sharing_urls.iter().enumerate() {
            if let Err(e) = self.consolidate_source(index + 1, url, &mut report).await {
                report.errors += 1;
                tracing::warn!("⚠️ Erro ao processar origem {}: {}", index + 1, e);
            }
        }

        tracing::info!(
            "✅ Consolidação concluída: {} copiado(s), {} já existia(m), {} erro(s)",
            report.copied,
            report.skipped,
            report.errors
        );
        Ok(report)
    }

    async fn consolidate_source(
        &self,
        position: usize,
        sharing_url: &str,
        report: &mut ConsolidateReport,
    ) -> AppResult<()> {
        let item = self.drive.resolve_sharing_url(sharing_url).await?;
        if !item.is_folder() {
            tracing::warn!("⚠️ Origem {} não é uma pasta, ignorando", position);
            return Ok(());
        }

        let source_drive = item
            .parent_reference
            .as_ref()
            .and_then(|p| p.drive_id.clone())
            .ok_or_else(|| {
                AppError::SharePointApi(format!(
                    "item compartilhado '{}' sem driveId na referência",
                    item.name.trim()
                ))
            })?;

        tracing::info!("📂 Origem {}: {}", position, item.name.trim());

        let files = self
            .drive
            .list_files_recursive_in(&source_drive, &item.id)
            .await?;

        for file in &files {
            match self.copy_file(&source_drive, file).await {
                Ok(true) => report.copied += 1,
                Ok(false) => report.skipped += 1,
                Err(e) => {
                    report.errors += 1;
                    tracing::warn!(
                        "⚠️ Erro ao copiar {}: {}",
                        display_path(&file.folder, &file.name),
                        e
                    );
                }
            }
        }
        Ok(())
    }

    /// Copia um arquivo para a pasta correspondente sob a base.
    ///
    /// Retorna `Ok(false)` quando o destino já tem item homônimo
    /// (case-insensitive).
    async fn copy_file(&self, source_drive: &str, file: &RemoteFile) -> AppResult<bool> {
        let upload_name = sanitize_attachment_filename(&file.name);

        let dest = self
            .drive
            .ensure_folder_path(&self.join_base(&file.folder))
            .await?;

        let wanted = upload_name.to_lowercase();
        let exists = self
            .drive
            .list_children(&dest.id)
            .await?
            .iter()
            .any(|c| c.name.trim().to_lowercase() == wanted);
        if exists {
            tracing::debug!("  Já existe, ignorando: {}", upload_name);
            return Ok(false);
        }

        let content = self.drive.download_file_in(source_drive, &file.id).await?;
        self.drive
            .upload_file(&dest.id, &upload_name, content, false)
            .await?;
        tracing::info!("📄 Copiado: {}", display_path(&file.folder, &upload_name));
        Ok(true)
    }

    fn join_base(&self, relative: &str) -> String {
        let base = self.base_folder_path.trim_matches('/');
        let relative = relative.trim_matches('/');
        if base.is_empty() {
            relative.to_string()
        } else if relative.is_empty() {
            base.to_string()
        } else {
            format!("{}/{}", base, relative)
        }
    }
}

fn display_path(folder: &str, name: &str) -> String {
    if folder.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", folder, name)
    }
}
