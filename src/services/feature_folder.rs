//! Sincronização de uma Feature com sua pasta de documentação.
//!
//! Para cada Feature o serviço garante a pasta canônica no drive, migra o
//! conteúdo quando a Feature encerra, cria o link compartilhável, grava o
//! link de volta no work item e sobe os anexos que ainda não estão na pasta.
//! O processo é idempotente: uma segunda execução sem mudanças upstream não
//! cria pastas, não sobe arquivos e não grava o link de novo.

use std::collections::{HashMap, HashSet};

use devops::{LinkUpdate, WorkItemManager};
use sharepoint::DriveService;

use crate::config::settings::SyncSettings;
use crate::models::{FeatureFolderPath, FeatureInfo};
use crate::utils::error::{AppError, AppResult};
use crate::utils::logging::{
    log_attachment_failed, log_attachment_skipped, log_attachment_uploaded,
    log_feature_sync_result, log_feature_sync_start,
};
use crate::utils::naming::sanitize_attachment_filename;

/// Opções de uma execução de sincronização.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessOptions {
    /// Suprime a gravação do link no work item (usado no passe de retry).
    pub skip_link_update: bool,
}

/// Resultado de um anexo individual.
#[derive(Debug, Clone, PartialEq)]
pub enum AttachmentStatus {
    Uploaded,
    SkippedExisting,
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct AttachmentOutcome {
    pub file_name: String,
    pub status: AttachmentStatus,
}

/// Resultado estruturado da sincronização de uma Feature.
#[derive(Debug, Clone)]
pub struct FeatureSyncOutcome {
    pub feature_id: i64,
    pub client: String,
    pub title: String,
    /// Proposta da Feature, ou "N/A" quando ausente.
    pub proposal: String,
    /// Caminho relativo canônico da pasta dentro da base.
    pub folder_path: String,
    pub folder_id: String,
    pub folder_url: Option<String>,
    pub folder_created: bool,
    pub link_update: LinkUpdate,
    pub attachments: Vec<AttachmentOutcome>,
}

impl FeatureSyncOutcome {
    pub fn uploaded_count(&self) -> usize {
        self.attachments
            .iter()
            .filter(|a| a.status == AttachmentStatus::Uploaded)
            .count()
    }

    pub fn skipped_count(&self) -> usize {
        self.attachments
            .iter()
            .filter(|a| a.status == AttachmentStatus::SkippedExisting)
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.attachments
            .iter()
            .filter(|a| matches!(a.status, AttachmentStatus::Failed(_)))
            .count()
    }

    pub fn has_failures(&self) -> bool {
        self.failed_count() > 0
    }
}

/// Serviço de sincronização Feature → pasta de documentação.
pub struct FeatureFolderService {
    work_items: WorkItemManager,
    drive: DriveService,
    sync: SyncSettings,
    base_folder_path: String,
}

impl FeatureFolderService {
    pub fn new(
        work_items: WorkItemManager,
        drive: DriveService,
        sync: SyncSettings,
        base_folder_path: String,
    ) -> Self {
        Self {
            work_items,
            drive,
            sync,
            base_folder_path,
        }
    }

    /// Executa a sincronização completa de uma Feature.
    ///
    /// # Erros
    /// - [`AppError::NotFound`]: o id não existe no projeto
    /// - [`AppError::InvalidKind`]: o work item não é uma Feature
    ///
    /// Falhas localizadas (um anexo, a migração de encerrada) são capturadas
    /// e registradas no resultado sem abortar o restante.
    pub async fn process_feature(
        &self,
        feature_id: i64,
        options: ProcessOptions,
    ) -> AppResult<FeatureSyncOutcome> {
        log_feature_sync_start(feature_id);

        // 1. Metadados e projeção tipada
        let work_item = self
            .work_items
            .get_work_item(feature_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Work item {} não encontrado", feature_id))
            })?;

        let kind = work_item.work_item_type().unwrap_or("");
        if kind != "Feature" {
            return Err(AppError::InvalidKind(format!(
                "Work item {} não é uma Feature (tipo: '{}')",
                feature_id, kind
            )));
        }

        let feature = FeatureInfo::from_work_item(
            &work_item,
            self.work_items.proposal_field(),
            self.work_items.link_field(),
        );
        let path = FeatureFolderPath::for_feature(
            &feature,
            &self.sync.closed_states,
            &self.sync.fallback_year_bucket,
        );
        let relative = path.relative_path();
        let full_path = self.join_base(&relative);

        // 2. Garantir a pasta canônica
        let (folder, folder_created) = match self.drive.get_folder_by_path(&full_path).await? {
            Some(item) if item.is_folder() => (item, false),
            Some(_) => {
                return Err(AppError::NameConflict(format!(
                    "'{}' já existe como arquivo",
                    full_path
                )))
            }
            None => (self.drive.ensure_folder_path(&full_path).await?, true),
        };

        // 3. Migração de pasta ativa quando a Feature encerrou (best-effort)
        if path.closed {
            let active_path = self.join_base(&path.relative_path_active());
            if let Err(e) = self.migrate_active_folder(&active_path, &folder.id).await {
                tracing::warn!(
                    "⚠️ Feature #{}: migração da pasta ativa falhou: {}",
                    feature_id,
                    e
                );
            }
        }

        // 4. Link compartilhável (fallback: webUrl do item)
        let folder_url = match self.drive.create_sharing_link(&folder.id).await {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::warn!(
                    "⚠️ Feature #{}: falha ao criar link compartilhável: {}",
                    feature_id,
                    e
                );
                folder.web_url.clone()
            }
        };

        // 5. Gravação condicional do link no work item
        let link_update = if options.skip_link_update {
            LinkUpdate::Skipped
        } else {
            match &folder_url {
                Some(url) if feature.documentation_link.as_deref() == Some(url.as_str()) => {
                    LinkUpdate::Unchanged
                }
                Some(url) => {
                    self.work_items
                        .update_documentation_link(feature_id, url)
                        .await?
                }
                None => LinkUpdate::Skipped,
            }
        };

        // 6. Anexos
        let attachments = self
            .sync_attachments(&work_item, &feature, &folder.id)
            .await?;

        let outcome = FeatureSyncOutcome {
            feature_id,
            client: feature.client_name(),
            title: feature.title.clone(),
            proposal: feature
                .proposal_number
                .clone()
                .unwrap_or_else(|| "N/A".to_string()),
            folder_path: relative,
            folder_id: folder.id.clone(),
            folder_url,
            folder_created,
            link_update,
            attachments,
        };

        log_feature_sync_result(
            outcome.feature_id,
            &outcome.client,
            &outcome.folder_path,
            outcome.uploaded_count(),
            outcome.skipped_count(),
            outcome.failed_count(),
        );

        Ok(outcome)
    }

    /// Copia os arquivos da pasta ativa para a canônica e apaga a ativa.
    ///
    /// Só atua quando existe pasta no caminho ativo e ela não é a própria
    /// pasta canônica.
    async fn migrate_active_folder(
        &self,
        active_path: &str,
        canonical_id: &str,
    ) -> AppResult<()> {
        let active = match self.drive.get_folder_by_path(active_path).await? {
            Some(item) if item.is_folder() && item.id != canonical_id => item,
            _ => return Ok(()),
        };

        let copied = self.drive.copy_folder_files(&active.id, canonical_id).await?;
        tracing::info!(
            "🔄 {} arquivo(s) migrados de '{}' para a pasta de encerradas",
            copied,
            active_path
        );

        self.drive.delete_item(&active.id).await?;
        tracing::info!("🗑️ Pasta ativa removida: {}", active_path);
        Ok(())
    }

    /// Sobe os anexos da Feature que ainda não estão na pasta.
    ///
    /// O snapshot de nomes existentes é tirado uma única vez; nomes repetidos
    /// entre os anexos da própria Feature ganham sufixo " (n)" antes da
    /// extensão. Falhas individuais não interrompem os demais anexos.
    async fn sync_attachments(
        &self,
        work_item: &devops::WorkItem,
        feature: &FeatureInfo,
        folder_id: &str,
    ) -> AppResult<Vec<AttachmentOutcome>> {
        let refs = work_item.attachment_relations();
        if refs.is_empty() {
            return Ok(Vec::new());
        }

        // Snapshot tolerante: sem a listagem, seguimos com conjunto vazio
        let mut existing: HashSet<String> = match self.drive.list_children(folder_id).await {
            Ok(children) => children
                .iter()
                .filter(|c| c.is_file())
                .map(|c| c.name.trim().to_lowercase())
                .collect(),
            Err(e) => {
                tracing::warn!(
                    "⚠️ Feature #{}: falha ao listar pasta, conjunto de exclusão vazio: {}",
                    feature.id,
                    e
                );
                HashSet::new()
            }
        };

        let mut seen_names: HashMap<String, u32> = HashMap::new();
        let mut outcomes = Vec::with_capacity(refs.len());

        for aref in refs {
            let downloaded = match self
                .work_items
                .download_attachment(&aref.id, aref.name.as_deref())
                .await
            {
                Ok(d) => d,
                Err(e) => {
                    let name = aref.name.clone().unwrap_or_else(|| aref.id.clone());
                    log_attachment_failed(feature.id, &name, &e.to_string());
                    outcomes.push(AttachmentOutcome {
                        file_name: name,
                        status: AttachmentStatus::Failed(format!("download: {}", e)),
                    });
                    continue;
                }
            };

            // O segundo anexo homônimo vira "nome (2).ext", o terceiro "(3)", etc.
            let base_name = sanitize_attachment_filename(&downloaded.file_name);
            let occurrence = seen_names.entry(base_name.to_lowercase()).or_insert(0);
            *occurrence += 1;
            let file_name = if *occurrence > 1 {
                append_copy_suffix(&base_name, *occurrence)
            } else {
                base_name
            };

            if existing.contains(&file_name.to_lowercase()) {
                log_attachment_skipped(feature.id, &file_name);
                outcomes.push(AttachmentOutcome {
                    file_name,
                    status: AttachmentStatus::SkippedExisting,
                });
                continue;
            }

            match self
                .drive
                .upload_file(folder_id, &file_name, downloaded.content, true)
                .await
            {
                Ok(_) => {
                    log_attachment_uploaded(feature.id, &file_name);
                    existing.insert(file_name.to_lowercase());
                    outcomes.push(AttachmentOutcome {
                        file_name,
                        status: AttachmentStatus::Uploaded,
                    });
                }
                Err(e) => {
                    log_attachment_failed(feature.id, &file_name, &e.to_string());
                    outcomes.push(AttachmentOutcome {
                        file_name,
                        status: AttachmentStatus::Failed(format!("upload: {}", e)),
                    });
                }
            }
        }

        Ok(outcomes)
    }

    fn join_base(&self, relative: &str) -> String {
        let base = self.base_folder_path.trim_matches('/');
        if base.is_empty() {
            relative.to_string()
        } else {
            format!("{}/{}", base, relative)
        }
    }
}

/// Insere o disambiguador " (n)" antes da extensão.
fn append_copy_suffix(name: &str, n: u32) -> String {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => {
            format!("{} ({}).{}", stem, n, ext)
        }
        _ => format!("{} ({})", name, n),
    }
}
