//! Reorganização em massa da árvore de pastas já existente no drive.
//!
//! Ferramenta de reparo acionada pelo operador, não faz parte da
//! sincronização contínua. Percorre a árvore `Ano/Cliente/Feature` e corrige
//! o que ficou fora do lugar:
//!
//! 1. Pastas de cliente soltas na raiz têm suas subpastas resolvidas no
//!    Azure DevOps e movidas para `Ano/Cliente/{nome canônico}`; sem
//!    resolução, a subpasta vai para o bucket de fallback mantendo o cliente.
//! 2. Dentro de cada pasta de ano (incluindo o bucket), pastas com cara de
//!    Feature são resolvidas diretamente; as demais são tratadas como pastas
//!    de cliente e têm suas subpastas resolvidas com o cliente como dica.
//! 3. Pastas do bucket de fallback cuja versão canônica já existe em outro
//!    ano, com conteúdo, são removidas como duplicatas.
//! 4. As duas grafias do mesmo cliente são mescladas por ano.
//! 5. Auditoria final: nomes de pasta de Feature fora do padrão canônico são
//!    apontados no relatório, sem correção automática.
//!
//! Todo movimento confere antes se o destino já tem pasta homônima
//! (case-insensitive) e ignora em vez de falhar; um 409 que escape da
//! conferência também vira skip. Re-execuções convergem: o que já está no
//! lugar é reconhecido e ignorado.

use devops::WorkItem;
use sharepoint::{DriveItem, DriveService, MoveOutcome};

use crate::config::settings::SyncSettings;
use crate::models::{FeatureFolderPath, FeatureInfo};
use crate::services::resolver::FeatureResolver;
use crate::utils::error::{AppError, AppResult};
use crate::utils::naming::{
    is_canonical_feature_folder_name, is_year_folder_name, looks_like_feature_folder,
    normalize_client_name, sanitize_folder_name_for_sharepoint,
};

/// Grafia antiga do cliente, encontrada em pastas pré-existentes.
const CLIENT_ALIAS_SOURCE: &str = "Qualiit";

/// Grafia canônica do mesmo cliente.
const CLIENT_ALIAS_TARGET: &str = "Quali It";

/// Nome do nível intermediário de Features encerradas.
const CLOSED_SEGMENT: &str = "Closed";

/// Opções de uma execução da reorganização.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReorganizeOptions {
    /// Só registra o que seria feito; nada é criado, movido ou apagado.
    pub dry_run: bool,
    /// Pula a auditoria estrutural final.
    pub skip_audit: bool,
}

/// Resultado agregado de uma execução da reorganização.
#[derive(Debug, Default)]
pub struct ReorganizeReport {
    /// Pastas movidas para o caminho canônico.
    pub moved: u32,
    /// Movimentos ignorados porque o destino já tinha pasta homônima.
    pub skipped: u32,
    /// Falhas individuais de resolução ou movimentação.
    pub errors: u32,
    /// Duplicatas removidas do bucket de fallback.
    pub duplicates_removed: u32,
    /// Anos em que as grafias do cliente foram mescladas.
    pub alias_merges: u32,
    /// Caminhos relativos de pastas de Feature fora do padrão canônico.
    pub non_canonical: Vec<String>,
}

impl ReorganizeReport {
    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }
}

/// Papel de um nome de pasta na mescla de grafias do cliente.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AliasRole {
    Source,
    Target,
}

/// Serviço de reorganização em massa.
pub struct ReorganizerService {
    resolver: FeatureResolver,
    drive: DriveService,
    sync: SyncSettings,
    base_folder_path: String,
    options: ReorganizeOptions,
}

impl ReorganizerService {
    pub fn new(
        resolver: FeatureResolver,
        drive: DriveService,
        sync: SyncSettings,
        base_folder_path: String,
        options: ReorganizeOptions,
    ) -> Self {
        Self {
            resolver,
            drive,
            sync,
            base_folder_path,
            options,
        }
    }

    /// Executa os cinco passos da reorganização sobre a pasta base.
    ///
    /// Falhas localizadas (uma pasta que não resolve, um movimento recusado)
    /// são contadas no relatório sem interromper o restante; falhas
    /// estruturais (listar a base, autenticação) abortam a execução.
    pub async fn run(&self) -> AppResult<ReorganizeReport> {
        let mut report = ReorganizeReport::default();

        if self.options.dry_run {
            tracing::info!("🔎 Reorganização em modo dry-run: nada será alterado no drive");
        }

        let base = self.base_folder().await?;

        // 1. Pastas de cliente soltas na raiz
        for item in self.drive.list_children(&base.id).await? {
            if !item.is_folder() {
                continue;
            }
            let name = item.name.trim().to_string();
            if name.is_empty() {
                continue;
            }
            if is_year_folder_name(&name, &self.sync.fallback_year_bucket) {
                tracing::info!("📁 Pasta de ano já no lugar: {}", name);
                continue;
            }
            self.relocate_root_client_folder(&item, &mut report).await;
        }

        // 2. Conteúdo de cada pasta de ano
        self.reorganize_year_folders(&base.id, &mut report).await?;

        // 3. Duplicatas no bucket de fallback
        self.remove_fallback_duplicates(&base.id, &mut report)
            .await?;

        // 4. Mescla das grafias do cliente por ano
        self.merge_client_alias(&base.id, &mut report).await?;

        // 5. Auditoria estrutural
        if !self.options.skip_audit {
            self.audit_folder_names(&base.id, &mut report).await?;
        }

        tracing::info!(
            "✅ Reorganização concluída: {} movida(s), {} ignorada(s), {} erro(s)",
            report.moved,
            report.skipped,
            report.errors
        );
        Ok(report)
    }

    /// Pasta base da reorganização (raiz do drive quando não configurada).
    async fn base_folder(&self) -> AppResult<DriveItem> {
        let base = self.base_folder_path.trim_matches('/');
        if base.is_empty() {
            return Ok(self.drive.root_folder().await?);
        }
        match self.drive.get_folder_by_path(base).await? {
            Some(item) if item.is_folder() => Ok(item),
            Some(_) => Err(AppError::NameConflict(format!(
                "'{}' já existe como arquivo",
                base
            ))),
            None if self.options.dry_run => Err(AppError::NotFound(format!(
                "Pasta base '{}' não encontrada",
                base
            ))),
            None => Ok(self.drive.ensure_folder_path(base).await?),
        }
    }

    /// Move as subpastas de uma pasta de cliente fora do lugar.
    ///
    /// Cada subpasta é resolvida com o nome do cliente como dica; falhas
    /// individuais são contadas e o restante segue.
    async fn relocate_root_client_folder(
        &self,
        client_folder: &DriveItem,
        report: &mut ReorganizeReport,
    ) {
        let client_name = client_folder.name.trim().to_string();
        tracing::info!("🔄 Pasta de cliente na raiz: {}", client_name);

        let subfolders = match self.drive.list_children(&client_folder.id).await {
            Ok(children) => children
                .into_iter()
                .filter(|c| c.is_folder() && !c.name.trim().is_empty())
                .collect::<Vec<_>>(),
            Err(e) => {
                report.errors += 1;
                tracing::warn!("⚠️ Falha ao listar '{}': {}", client_name, e);
                return;
            }
        };

        if subfolders.is_empty() {
            tracing::info!("  Nenhuma subpasta em {}", client_name);
            return;
        }

        let client_hint = normalize_client_name(&client_name);
        for sub in &subfolders {
            if let Err(e) = self
                .move_to_canonical(sub, Some(&client_hint), Some(&client_name), report)
                .await
            {
                report.errors += 1;
                tracing::warn!("⚠️ Erro ao mover '{}': {}", sub.name.trim(), e);
            }
        }
    }

    /// Percorre cada pasta de ano e encaminha seu conteúdo.
    ///
    /// As duas grafias do cliente mesclado ficam para o passo seguinte; uma
    /// pasta sem Feature correspondente permanece onde está.
    async fn reorganize_year_folders(
        &self,
        base_id: &str,
        report: &mut ReorganizeReport,
    ) -> AppResult<()> {
        tracing::info!("🔄 Reorganizando o conteúdo das pastas de ano");

        let year_folders: Vec<DriveItem> = self
            .drive
            .list_children(base_id)
            .await?
            .into_iter()
            .filter(|c| {
                c.is_folder() && is_year_folder_name(c.name.trim(), &self.sync.fallback_year_bucket)
            })
            .collect();

        for year in &year_folders {
            let year_name = year.name.trim().to_string();
            for item in self.drive.list_children(&year.id).await? {
                if !item.is_folder() {
                    continue;
                }
                let name = item.name.trim().to_string();
                if name.is_empty() || client_alias_role(&name).is_some() {
                    continue;
                }

                if looks_like_feature_folder(&name) {
                    if let Err(e) = self.move_to_canonical(&item, None, None, report).await {
                        report.errors += 1;
                        tracing::warn!("⚠️ [{}] Erro ao mover {}: {}", year_name, name, e);
                    }
                    continue;
                }

                // Pasta de cliente (ex.: Arteb, Aurora): processa as subpastas
                let subfolders = match self.drive.list_children(&item.id).await {
                    Ok(children) => children,
                    Err(e) => {
                        report.errors += 1;
                        tracing::warn!("⚠️ [{}] Falha ao listar {}: {}", year_name, name, e);
                        continue;
                    }
                };
                let client_hint = normalize_client_name(&name);
                for sub in &subfolders {
                    if !sub.is_folder() || sub.name.trim().is_empty() {
                        continue;
                    }
                    if let Err(e) = self
                        .move_to_canonical(sub, Some(&client_hint), None, report)
                        .await
                    {
                        report.errors += 1;
                        tracing::warn!(
                            "⚠️ [{}/{}] Erro ao mover {}: {}",
                            year_name,
                            name,
                            sub.name.trim(),
                            e
                        );
                    }
                }
            }
        }
        Ok(())
    }

    /// Resolve uma pasta para sua Feature e a move para o caminho canônico.
    ///
    /// Sem resolução: com `fallback_client` a pasta vai para o bucket de
    /// fallback mantendo o nível de cliente; sem ele, permanece onde está.
    async fn move_to_canonical(
        &self,
        folder: &DriveItem,
        client_hint: Option<&str>,
        fallback_client: Option<&str>,
        report: &mut ReorganizeReport,
    ) -> AppResult<()> {
        let folder_name = folder.name.trim();

        let (parent_rel, target_name) =
            match self.resolver.resolve(folder_name, client_hint).await? {
                Some(resolved) => {
                    let path = self.folder_path_for(&resolved.work_item);
                    let parent = match path.relative_path().rsplit_once('/') {
                        Some((head, _)) => head.to_string(),
                        None => String::new(),
                    };
                    (parent, path.folder_name)
                }
                None => match fallback_client {
                    Some(client) => (
                        format!(
                            "{}/{}",
                            self.sync.fallback_year_bucket,
                            sanitize_folder_name_for_sharepoint(client)
                        ),
                        sanitize_folder_name_for_sharepoint(folder_name),
                    ),
                    None => {
                        tracing::info!("  Sem Feature correspondente, permanece: {}", folder_name);
                        return Ok(());
                    }
                },
            };

        let dest_path = self.join_base(&parent_rel);

        if self.options.dry_run {
            if let Some(parent) = self.drive.get_folder_by_path(&dest_path).await? {
                let children = self.drive.list_children(&parent.id).await?;
                if has_child_folder_named(&children, &target_name) {
                    tracing::info!(
                        "  Pasta já existe em {}/{}, ignorando: {}",
                        parent_rel,
                        target_name,
                        folder_name
                    );
                    report.skipped += 1;
                    return Ok(());
                }
            }
            tracing::info!(
                "🔎 [dry-run] Moveria: {} → {}/{}",
                folder_name,
                parent_rel,
                target_name
            );
            report.moved += 1;
            return Ok(());
        }

        let dest_parent = self.drive.ensure_folder_path(&dest_path).await?;

        // Evita o 409: não move quando o destino já tem pasta homônima
        let children = self.drive.list_children(&dest_parent.id).await?;
        if has_child_folder_named(&children, &target_name) {
            tracing::info!(
                "  Pasta já existe em {}/{}, ignorando: {}",
                parent_rel,
                target_name,
                folder_name
            );
            report.skipped += 1;
            return Ok(());
        }

        match self
            .drive
            .move_item(&folder.id, &dest_parent.id, &target_name)
            .await?
        {
            MoveOutcome::Moved(_) => {
                report.moved += 1;
                tracing::info!(
                    "✅ Movido: {} → {}/{}",
                    folder_name,
                    parent_rel,
                    target_name
                );
            }
            MoveOutcome::SkippedConflict => {
                report.skipped += 1;
                tracing::info!(
                    "  Destino já contém a pasta canônica, ignorando: {}",
                    folder_name
                );
            }
        }
        Ok(())
    }

    /// Remove do bucket de fallback as pastas cuja versão canônica já existe
    /// em outro ano, com conteúdo.
    async fn remove_fallback_duplicates(
        &self,
        base_id: &str,
        report: &mut ReorganizeReport,
    ) -> AppResult<()> {
        let bucket = self.sync.fallback_year_bucket.clone();
        let children = self.drive.list_children(base_id).await?;
        let Some(bucket_folder) = children
            .into_iter()
            .find(|c| c.is_folder() && c.name.trim() == bucket)
        else {
            return Ok(());
        };

        // Diretas com cara de Feature e subpastas de pastas de cliente
        let mut to_check: Vec<(DriveItem, Option<String>)> = Vec::new();
        for item in self.drive.list_children(&bucket_folder.id).await? {
            if !item.is_folder() {
                continue;
            }
            let name = item.name.trim().to_string();
            if name.is_empty() || client_alias_role(&name).is_some() {
                continue;
            }
            if looks_like_feature_folder(&name) {
                to_check.push((item, None));
                continue;
            }
            let hint = normalize_client_name(&name);
            for sub in self.drive.list_children(&item.id).await? {
                if sub.is_folder() && !sub.name.trim().is_empty() {
                    to_check.push((sub, Some(hint.clone())));
                }
            }
        }

        for (folder, hint) in to_check {
            match self.try_remove_duplicate(&folder, hint.as_deref()).await {
                Ok(true) => report.duplicates_removed += 1,
                Ok(false) => {}
                Err(e) => {
                    tracing::debug!(
                        "  [{}] Ao verificar duplicata {}: {}",
                        bucket,
                        folder.name.trim(),
                        e
                    );
                }
            }
        }

        if report.duplicates_removed > 0 {
            tracing::info!(
                "🗑️ {} pasta(s) duplicada(s) removida(s) de {}",
                report.duplicates_removed,
                bucket
            );
        }
        Ok(())
    }

    /// Apaga uma pasta do bucket quando a canônica existe fora dele e tem
    /// conteúdo próprio.
    async fn try_remove_duplicate(
        &self,
        folder: &DriveItem,
        client_hint: Option<&str>,
    ) -> AppResult<bool> {
        let folder_name = folder.name.trim();
        let Some(resolved) = self.resolver.resolve(folder_name, client_hint).await? else {
            return Ok(false);
        };

        let rel = self.folder_path_for(&resolved.work_item).relative_path();
        if rel.starts_with(&format!("{}/", self.sync.fallback_year_bucket)) {
            // o lugar canônico é o próprio bucket
            return Ok(false);
        }

        let Some(canonical) = self.drive.get_folder_by_path(&self.join_base(&rel)).await? else {
            return Ok(false);
        };
        if !canonical.is_folder() {
            return Ok(false);
        }
        if self.drive.list_children(&canonical.id).await?.is_empty() {
            return Ok(false);
        }

        if self.options.dry_run {
            tracing::info!(
                "🔎 [dry-run] Removeria duplicata (canônica em {}): {}",
                rel,
                folder_name
            );
            return Ok(true);
        }

        self.drive.delete_item(&folder.id).await?;
        tracing::info!("🗑️ Duplicata removida (já existe em {}): {}", rel, folder_name);
        Ok(true)
    }

    /// Mescla as duas grafias do mesmo cliente dentro de cada pasta de ano.
    ///
    /// Todo o conteúdo da grafia antiga vai para a canônica, nomes
    /// preservados; a pasta de origem só é apagada quando fica vazia.
    async fn merge_client_alias(
        &self,
        base_id: &str,
        report: &mut ReorganizeReport,
    ) -> AppResult<()> {
        for year in self.drive.list_children(base_id).await? {
            if !year.is_folder()
                || !is_year_folder_name(year.name.trim(), &self.sync.fallback_year_bucket)
            {
                continue;
            }
            let year_name = year.name.trim().to_string();

            let children = self.drive.list_children(&year.id).await?;
            let source = children
                .iter()
                .find(|c| c.is_folder() && client_alias_role(&c.name) == Some(AliasRole::Source));
            let target = children
                .iter()
                .find(|c| c.is_folder() && client_alias_role(&c.name) == Some(AliasRole::Target));
            let (Some(source), Some(target)) = (source, target) else {
                continue;
            };

            if self.options.dry_run {
                let count = self.drive.list_children(&source.id).await?.len();
                tracing::info!(
                    "🔎 [dry-run] [{}] Mesclaria {} item(ns) de {} em {}",
                    year_name,
                    count,
                    CLIENT_ALIAS_SOURCE,
                    CLIENT_ALIAS_TARGET
                );
                report.alias_merges += 1;
                continue;
            }

            let mut remaining = 0u32;
            for child in self.drive.list_children(&source.id).await? {
                let child_name = child.name.trim().to_string();
                if child_name.is_empty() {
                    continue;
                }
                match self.drive.move_item(&child.id, &target.id, &child_name).await {
                    Ok(MoveOutcome::Moved(_)) => {
                        tracing::info!(
                            "  [{}] {} → {}: {}",
                            year_name,
                            CLIENT_ALIAS_SOURCE,
                            CLIENT_ALIAS_TARGET,
                            child_name
                        );
                    }
                    Ok(MoveOutcome::SkippedConflict) => {
                        remaining += 1;
                        tracing::warn!(
                            "⚠️ [{}] {} já existe em {}, item mantido",
                            year_name,
                            child_name,
                            CLIENT_ALIAS_TARGET
                        );
                    }
                    Err(e) => {
                        remaining += 1;
                        tracing::warn!("⚠️ [{}] Erro ao mover {}: {}", year_name, child_name, e);
                    }
                }
            }

            if remaining == 0 {
                match self.drive.delete_item(&source.id).await {
                    Ok(()) => tracing::info!(
                        "🗑️ [{}] Pasta {} vazia removida",
                        year_name,
                        CLIENT_ALIAS_SOURCE
                    ),
                    Err(e) => tracing::warn!(
                        "⚠️ [{}] Erro ao remover {}: {}",
                        year_name,
                        CLIENT_ALIAS_SOURCE,
                        e
                    ),
                }
            } else {
                tracing::warn!(
                    "⚠️ [{}] {} mantida com {} item(ns) não movidos",
                    year_name,
                    CLIENT_ALIAS_SOURCE,
                    remaining
                );
            }
            report.alias_merges += 1;
        }
        Ok(())
    }

    /// Auditoria estrutural: aponta pastas de Feature fora do padrão
    /// canônico. Só reporta; nenhuma correção automática.
    async fn audit_folder_names(
        &self,
        base_id: &str,
        report: &mut ReorganizeReport,
    ) -> AppResult<()> {
        for year in self.drive.list_children(base_id).await? {
            if !year.is_folder()
                || !is_year_folder_name(year.name.trim(), &self.sync.fallback_year_bucket)
            {
                continue;
            }
            let year_name = year.name.trim().to_string();

            for entry in self.drive.list_children(&year.id).await? {
                if !entry.is_folder() {
                    continue;
                }
                let name = entry.name.trim().to_string();
                if name.is_empty() {
                    continue;
                }

                if looks_like_feature_folder(&name) {
                    // pasta de Feature direto no ano, sem nível de cliente
                    if !is_canonical_feature_folder_name(&name) {
                        report.non_canonical.push(format!("{}/{}", year_name, name));
                    }
                    continue;
                }

                if name.eq_ignore_ascii_case(CLOSED_SEGMENT) {
                    // Closed tem um nível extra: Closed/Cliente/Feature
                    for client in self.drive.list_children(&entry.id).await? {
                        if !client.is_folder() {
                            continue;
                        }
                        let client_name = client.name.trim().to_string();
                        self.audit_feature_level(
                            &format!("{}/{}/{}", year_name, name, client_name),
                            &client.id,
                            report,
                        )
                        .await?;
                    }
                    continue;
                }

                self.audit_feature_level(&format!("{}/{}", year_name, name), &entry.id, report)
                    .await?;
            }
        }

        for path in &report.non_canonical {
            tracing::warn!("⚠️ Pasta fora do padrão canônico: {}", path);
        }
        if report.non_canonical.is_empty() {
            tracing::info!("✅ Auditoria: nomes de pasta de Feature todos no padrão canônico");
        }
        Ok(())
    }

    /// Confere os filhos-pasta de um nível de cliente contra o padrão.
    async fn audit_feature_level(
        &self,
        prefix: &str,
        client_id: &str,
        report: &mut ReorganizeReport,
    ) -> AppResult<()> {
        for feature in self.drive.list_children(client_id).await? {
            if !feature.is_folder() {
                continue;
            }
            let feature_name = feature.name.trim().to_string();
            if !feature_name.is_empty() && !is_canonical_feature_folder_name(&feature_name) {
                report
                    .non_canonical
                    .push(format!("{}/{}", prefix, feature_name));
            }
        }
        Ok(())
    }

    /// Deriva a localização canônica a partir do work item resolvido.
    fn folder_path_for(&self, work_item: &WorkItem) -> FeatureFolderPath {
        let manager = self.resolver.work_items();
        let info =
            FeatureInfo::from_work_item(work_item, manager.proposal_field(), manager.link_field());
        FeatureFolderPath::for_feature(
            &info,
            &self.sync.closed_states,
            &self.sync.fallback_year_bucket,
        )
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

/// Classifica um nome nas duas grafias do cliente mesclado (espaços
/// colapsados, case-insensitive).
fn client_alias_role(name: &str) -> Option<AliasRole> {
    let squashed = name
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    if squashed == CLIENT_ALIAS_SOURCE.to_lowercase() {
        Some(AliasRole::Source)
    } else if squashed == CLIENT_ALIAS_TARGET.to_lowercase() {
        Some(AliasRole::Target)
    } else {
        None
    }
}

/// Há pasta com este nome (case-insensitive) entre os filhos?
fn has_child_folder_named(children: &[DriveItem], name: &str) -> bool {
    let wanted = name.trim().to_lowercase();
    children
        .iter()
        .any(|c| c.is_folder() && c.name.trim().to_lowercase() == wanted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use devops::{DevOpsClient, WorkItemFieldConfig, WorkItemManager};
    use httpmock::prelude::*;
    use httpmock::Method::PATCH;
    use serde_json::json;
    use sharepoint::{DriveConfig, GraphAuth, GraphAuthConfig, GraphClient};

    fn service_for(
        devops_server: &MockServer,
        graph_server: &MockServer,
        options: ReorganizeOptions,
    ) -> ReorganizerService {
        graph_server.mock(|when, then| {
            when.method(POST).path("/token");
            then.status(200)
                .json_body(json!({"access_token": "tok", "expires_in": 3600}));
        });
        graph_server.mock(|when, then| {
            when.method(GET).path("/sites/contoso.sharepoint.com:/sites/TI");
            then.status(200).json_body(json!({"id": "site-1"}));
        });
        graph_server.mock(|when, then| {
            when.method(GET).path("/sites/site-1/drives");
            then.status(200)
                .json_body(json!({"value": [{"id": "d1", "name": "Documentos"}]}));
        });

        let devops_client =
            DevOpsClient::new(&devops_server.base_url(), "org", "proj", "pat-teste").unwrap();
        let work_items = WorkItemManager::new(
            devops_client,
            WorkItemFieldConfig {
                area_root: "Projetos".to_string(),
                proposal_field: "Custom.NumeroProposta".to_string(),
                link_field: "Custom.LinkPastaDocumentacao".to_string(),
            },
        );

        let auth = GraphAuth::with_token_url(
            GraphAuthConfig {
                tenant_id: "t".to_string(),
                client_id: "c".to_string(),
                client_secret: "s".to_string(),
            },
            format!("{}/token", graph_server.base_url()),
        )
        .unwrap();
        let client = GraphClient::with_base_url(auth, graph_server.base_url()).unwrap();
        let drive = DriveService::new(
            client,
            DriveConfig {
                hostname: "contoso.sharepoint.com".to_string(),
                site_name: "TI".to_string(),
                drive_name_preferences: vec!["Documentos".to_string()],
            },
        );

        ReorganizerService::new(
            FeatureResolver::new(work_items),
            drive,
            SyncSettings::default(),
            String::new(),
            options,
        )
    }

    fn mock_root(graph_server: &MockServer, children: serde_json::Value) {
        graph_server.mock(|when, then| {
            when.method(GET).path("/drives/d1/root");
            then.status(200)
                .json_body(json!({"id": "root-1", "name": "root", "folder": {}}));
        });
        graph_server.mock(|when, then| {
            when.method(GET).path("/drives/d1/items/root-1/children");
            then.status(200).json_body(json!({ "value": children }));
        });
    }

    /// Feature 16526 do cliente Arteb, criada em 2026, proposta 025571-02.
    fn mock_feature_16526(devops_server: &MockServer) {
        devops_server.mock(|when, then| {
            when.method(POST)
                .path("/org/proj/_apis/wit/wiql")
                .body_contains("= '25571-02'");
            then.status(200).json_body(json!({"workItems": [{"id": 16526}]}));
        });
        devops_server.mock(|when, then| {
            when.method(GET)
                .path("/org/proj/_apis/wit/workitems")
                .query_param("ids", "16526");
            then.status(200).json_body(json!({
                "value": [{
                    "id": 16526,
                    "fields": {
                        "System.Title": "Quadro de comando",
                        "System.WorkItemType": "Feature",
                        "System.State": "Active",
                        "System.AreaPath": "Projetos\\ARTEB",
                        "System.CreatedDate": "2026-02-10T09:00:00Z",
                        "Custom.NumeroProposta": "025571-02"
                    }
                }]
            }));
        });
    }

    /// Feature 14796 do cliente Belliz, criada em 2025, proposta 025539-01.
    fn mock_feature_14796(devops_server: &MockServer) {
        devops_server.mock(|when, then| {
            when.method(POST)
                .path("/org/proj/_apis/wit/wiql")
                .body_contains("= '25539-01'");
            then.status(200).json_body(json!({"workItems": [{"id": 14796}]}));
        });
        devops_server.mock(|when, then| {
            when.method(GET)
                .path("/org/proj/_apis/wit/workitems")
                .query_param("ids", "14796");
            then.status(200).json_body(json!({
                "value": [{
                    "id": 14796,
                    "fields": {
                        "System.Title": "Validação de processo",
                        "System.WorkItemType": "Feature",
                        "System.State": "Active",
                        "System.AreaPath": "Projetos\\Belliz",
                        "System.CreatedDate": "2025-06-01T08:00:00Z",
                        "Custom.NumeroProposta": "025539-01"
                    }
                }]
            }));
        });
    }

    #[tokio::test]
    async fn test_pasta_de_cliente_na_raiz_e_movida() {
        let devops_server = MockServer::start();
        let graph_server = MockServer::start();
        let service = service_for(&devops_server, &graph_server, ReorganizeOptions::default());

        mock_root(
            &graph_server,
            json!([{"id": "c-arteb", "name": "Arteb", "folder": {}}]),
        );
        graph_server.mock(|when, then| {
            when.method(GET).path("/drives/d1/items/c-arteb/children");
            then.status(200).json_body(json!({
                "value": [{"id": "sub-1", "name": "16526 - 025571-02 - Quadro", "folder": {}}]
            }));
        });
        mock_feature_16526(&devops_server);

        // Destino 2026/Arteb ainda não existe
        graph_server.mock(|when, then| {
            when.method(GET).path("/drives/d1/root:/2026");
            then.status(404)
                .json_body(json!({"error": {"code": "itemNotFound", "message": "x"}}));
        });
        graph_server.mock(|when, then| {
            when.method(GET).path("/drives/d1/root:/2026/Arteb");
            then.status(404)
                .json_body(json!({"error": {"code": "itemNotFound", "message": "x"}}));
        });
        graph_server.mock(|when, then| {
            when.method(POST)
                .path("/drives/d1/items/root-1/children")
                .body_contains("\"2026\"");
            then.status(201)
                .json_body(json!({"id": "y1", "name": "2026", "folder": {}}));
        });
        graph_server.mock(|when, then| {
            when.method(POST)
                .path("/drives/d1/items/y1/children")
                .body_contains("\"Arteb\"");
            then.status(201)
                .json_body(json!({"id": "a1", "name": "Arteb", "folder": {}}));
        });
        graph_server.mock(|when, then| {
            when.method(GET).path("/drives/d1/items/a1/children");
            then.status(200).json_body(json!({"value": []}));
        });
        let move_mock = graph_server.mock(|when, then| {
            when.method(PATCH)
                .path("/drives/d1/items/sub-1")
                .body_contains("\"a1\"")
                .body_contains("16526 - 025571-02 - Quadro de comando");
            then.status(200).json_body(json!({
                "id": "sub-1",
                "name": "16526 - 025571-02 - Quadro de comando",
                "folder": {}
            }));
        });

        let report = service.run().await.unwrap();

        move_mock.assert();
        assert_eq!(report.moved, 1);
        assert_eq!(report.skipped, 0);
        assert_eq!(report.errors, 0);
        assert!(report.non_canonical.is_empty());
    }

    #[tokio::test]
    async fn test_destino_ja_existente_vira_skip() {
        let devops_server = MockServer::start();
        let graph_server = MockServer::start();
        let service = service_for(&devops_server, &graph_server, ReorganizeOptions::default());

        mock_root(
            &graph_server,
            json!([{"id": "y-2025", "name": "2025", "folder": {}}]),
        );
        graph_server.mock(|when, then| {
            when.method(GET).path("/drives/d1/items/y-2025/children");
            then.status(200).json_body(json!({
                "value": [{"id": "f-old", "name": "14796 - 025539-01 - VALIDACAO", "folder": {}}]
            }));
        });
        mock_feature_14796(&devops_server);

        graph_server.mock(|when, then| {
            when.method(GET).path("/drives/d1/root:/2025");
            then.status(200)
                .json_body(json!({"id": "y-2025", "name": "2025", "folder": {}}));
        });
        graph_server.mock(|when, then| {
            when.method(GET).path("/drives/d1/root:/2025/Belliz");
            then.status(200)
                .json_body(json!({"id": "c-belliz", "name": "Belliz", "folder": {}}));
        });
        graph_server.mock(|when, then| {
            when.method(GET).path("/drives/d1/items/c-belliz/children");
            then.status(200).json_body(json!({
                "value": [{
                    "id": "f-new",
                    "name": "14796 - 025539-01 - Validação de processo",
                    "folder": {}
                }]
            }));
        });
        let move_mock = graph_server.mock(|when, then| {
            when.method(PATCH).path("/drives/d1/items/f-old");
            then.status(200).json_body(json!({"id": "f-old", "name": "x", "folder": {}}));
        });

        let report = service.run().await.unwrap();

        move_mock.assert_hits(0);
        assert_eq!(report.moved, 0);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.errors, 0);
    }

    #[tokio::test]
    async fn test_duplicata_no_bucket_de_fallback_e_removida() {
        let devops_server = MockServer::start();
        let graph_server = MockServer::start();
        let service = service_for(&devops_server, &graph_server, ReorganizeOptions::default());

        mock_root(
            &graph_server,
            json!([{"id": "b-old", "name": "2020-2023", "folder": {}}]),
        );
        graph_server.mock(|when, then| {
            when.method(GET).path("/drives/d1/items/b-old/children");
            then.status(200).json_body(json!({
                "value": [{"id": "f-dup", "name": "14796 - 025539-01 - VALIDACAO", "folder": {}}]
            }));
        });
        mock_feature_14796(&devops_server);

        // A versão canônica já existe em 2025/Belliz, com conteúdo
        graph_server.mock(|when, then| {
            when.method(GET).path("/drives/d1/root:/2025");
            then.status(200)
                .json_body(json!({"id": "y-2025", "name": "2025", "folder": {}}));
        });
        graph_server.mock(|when, then| {
            when.method(GET).path("/drives/d1/root:/2025/Belliz");
            then.status(200)
                .json_body(json!({"id": "c-belliz", "name": "Belliz", "folder": {}}));
        });
        graph_server.mock(|when, then| {
            when.method(GET).path("/drives/d1/items/c-belliz/children");
            then.status(200).json_body(json!({
                "value": [{
                    "id": "f-can",
                    "name": "14796 - 025539-01 - Validação de processo",
                    "folder": {}
                }]
            }));
        });
        graph_server.mock(|when, then| {
            when.method(GET)
                .path("/drives/d1/root:/2025/Belliz/14796 - 025539-01 - Validação de processo");
            then.status(200).json_body(json!({
                "id": "f-can",
                "name": "14796 - 025539-01 - Validação de processo",
                "folder": {}
            }));
        });
        graph_server.mock(|when, then| {
            when.method(GET).path("/drives/d1/items/f-can/children");
            then.status(200).json_body(json!({
                "value": [{"id": "file-1", "name": "relatorio.pdf", "file": {}}]
            }));
        });
        let delete_mock = graph_server.mock(|when, then| {
            when.method(DELETE).path("/drives/d1/items/f-dup");
            then.status(204);
        });

        let report = service.run().await.unwrap();

        delete_mock.assert();
        assert_eq!(report.duplicates_removed, 1);
        // o passo de ano tentou mover e encontrou a canônica no destino
        assert_eq!(report.skipped, 1);
        assert_eq!(report.moved, 0);
        assert_eq!(report.errors, 0);
        assert!(report.non_canonical.is_empty());
    }

    #[tokio::test]
    async fn test_qualiit_e_mesclado_em_quali_it() {
        let devops_server = MockServer::start();
        let graph_server = MockServer::start();
        let service = service_for(
            &devops_server,
            &graph_server,
            ReorganizeOptions {
                skip_audit: true,
                ..Default::default()
            },
        );

        mock_root(
            &graph_server,
            json!([{"id": "y-2025", "name": "2025", "folder": {}}]),
        );
        graph_server.mock(|when, then| {
            when.method(GET).path("/drives/d1/items/y-2025/children");
            then.status(200).json_body(json!({
                "value": [
                    {"id": "q-src", "name": "Qualiit", "folder": {}},
                    {"id": "q-tgt", "name": "Quali It", "folder": {}}
                ]
            }));
        });
        graph_server.mock(|when, then| {
            when.method(GET).path("/drives/d1/items/q-src/children");
            then.status(200).json_body(json!({
                "value": [
                    {"id": "m-1", "name": "16000 - 025500-01 - Integração", "folder": {}},
                    {"id": "m-2", "name": "nota.pdf", "file": {}}
                ]
            }));
        });
        let move_folder = graph_server.mock(|when, then| {
            when.method(PATCH)
                .path("/drives/d1/items/m-1")
                .body_contains("\"q-tgt\"");
            then.status(200).json_body(json!({
                "id": "m-1", "name": "16000 - 025500-01 - Integração", "folder": {}
            }));
        });
        let move_file = graph_server.mock(|when, then| {
            when.method(PATCH)
                .path("/drives/d1/items/m-2")
                .body_contains("\"q-tgt\"");
            then.status(200)
                .json_body(json!({"id": "m-2", "name": "nota.pdf", "file": {}}));
        });
        let delete_source = graph_server.mock(|when, then| {
            when.method(DELETE).path("/drives/d1/items/q-src");
            then.status(204);
        });

        let report = service.run().await.unwrap();

        move_folder.assert();
        move_file.assert();
        delete_source.assert();
        assert_eq!(report.alias_merges, 1);
        assert_eq!(report.moved, 0);
        assert_eq!(report.errors, 0);
    }

    #[tokio::test]
    async fn test_dry_run_nao_altera_o_drive() {
        let devops_server = MockServer::start();
        let graph_server = MockServer::start();
        let service = service_for(
            &devops_server,
            &graph_server,
            ReorganizeOptions {
                dry_run: true,
                ..Default::default()
            },
        );

        mock_root(
            &graph_server,
            json!([{"id": "c-arteb", "name": "Arteb", "folder": {}}]),
        );
        graph_server.mock(|when, then| {
            when.method(GET).path("/drives/d1/items/c-arteb/children");
            then.status(200).json_body(json!({
                "value": [{"id": "sub-1", "name": "16526 - 025571-02 - Quadro", "folder": {}}]
            }));
        });
        mock_feature_16526(&devops_server);

        graph_server.mock(|when, then| {
            when.method(GET).path("/drives/d1/root:/2026/Arteb");
            then.status(404)
                .json_body(json!({"error": {"code": "itemNotFound", "message": "x"}}));
        });
        let create_mock = graph_server.mock(|when, then| {
            when.method(POST).path("/drives/d1/items/root-1/children");
            then.status(201).json_body(json!({"id": "x", "name": "x", "folder": {}}));
        });
        let move_mock = graph_server.mock(|when, then| {
            when.method(PATCH).path("/drives/d1/items/sub-1");
            then.status(200).json_body(json!({"id": "sub-1", "name": "x", "folder": {}}));
        });

        let report = service.run().await.unwrap();

        create_mock.assert_hits(0);
        move_mock.assert_hits(0);
        assert_eq!(report.moved, 1);
        assert_eq!(report.errors, 0);
    }

    #[tokio::test]
    async fn test_auditoria_aponta_pasta_fora_do_padrao() {
        let devops_server = MockServer::start();
        let graph_server = MockServer::start();
        let service = service_for(&devops_server, &graph_server, ReorganizeOptions::default());

        mock_root(
            &graph_server,
            json!([{"id": "y-2024", "name": "2024", "folder": {}}]),
        );
        graph_server.mock(|when, then| {
            when.method(GET).path("/drives/d1/items/y-2024/children");
            then.status(200).json_body(json!({
                "value": [{"id": "c-belliz", "name": "Belliz", "folder": {}}]
            }));
        });
        graph_server.mock(|when, then| {
            when.method(GET).path("/drives/d1/items/c-belliz/children");
            then.status(200).json_body(json!({
                "value": [
                    {"id": "s1", "name": "Relatórios antigos", "folder": {}},
                    {"id": "s2", "name": "10 - 02211-01 - Algo", "folder": {}}
                ]
            }));
        });
        // Nenhuma consulta encontra Feature correspondente
        devops_server.mock(|when, then| {
            when.method(POST).path("/org/proj/_apis/wit/wiql");
            then.status(200).json_body(json!({"workItems": []}));
        });

        let report = service.run().await.unwrap();

        assert_eq!(report.moved, 0);
        assert_eq!(report.errors, 0);
        assert_eq!(report.non_canonical, vec!["2024/Belliz/Relatórios antigos"]);
    }

    #[test]
    fn test_client_alias_role() {
        assert_eq!(client_alias_role("Qualiit"), Some(AliasRole::Source));
        assert_eq!(client_alias_role("  QUALIIT "), Some(AliasRole::Source));
        assert_eq!(client_alias_role("Quali It"), Some(AliasRole::Target));
        assert_eq!(client_alias_role("quali  it"), Some(AliasRole::Target));
        assert_eq!(client_alias_role("Quali"), None);
        assert_eq!(client_alias_role(""), None);
    }

    #[test]
    fn test_has_child_folder_named() {
        let children: Vec<DriveItem> = serde_json::from_value(json!([
            {"id": "1", "name": "Camil", "folder": {}},
            {"id": "2", "name": "nota.pdf", "file": {}}
        ]))
        .unwrap();
        assert!(has_child_folder_named(&children, "camil"));
        assert!(has_child_folder_named(&children, " CAMIL "));
        // arquivo homônimo não conta como pasta
        assert!(!has_child_folder_named(&children, "nota.pdf"));
        assert!(!has_child_folder_named(&children, "Arteb"));
    }
}
