//! Resolve nomes de pasta de volta para Features do Azure DevOps.
//!
//! Usado pela reorganização em massa: dado o nome de uma pasta já existente
//! (ex.: "16526 - 025571-02 - Arteb"), descobre qual Feature ela representa.
//!
//! Estratégia em camadas, primeira que acertar vence:
//! 1. O nome inteiro é um id numérico → busca direta
//! 2. O nome contém um número de proposta (NNNNN-NN) → busca pelo campo de
//!    proposta, com retry na variante com/sem zero à esquerda
//! 3. O nome (≥ 2 caracteres) aparece como substring do título → busca por título
//!
//! Cada candidato ainda precisa passar pelos filtros: tipo "Feature", area path
//! sob a raiz configurada e, se houver dica de cliente, o cliente derivado do
//! area path precisa bater com a dica.

use devops::{WorkItem, WorkItemManager};

use crate::utils::error::AppResult;
use crate::utils::naming::{
    find_proposal_in_text, normalize_client_name, proposal_padding_variant,
};

/// Camada que encontrou a Feature (diagnóstico e log).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionTier {
    ById,
    ByProposal,
    ByTitle,
}

/// Resolução bem-sucedida: o work item e a camada que o encontrou.
#[derive(Debug)]
pub struct ResolvedFeature {
    pub work_item: WorkItem,
    pub tier: ResolutionTier,
}

pub struct FeatureResolver {
    work_items: WorkItemManager,
}

impl FeatureResolver {
    pub fn new(work_items: WorkItemManager) -> Self {
        Self { work_items }
    }

    /// Gerenciador de work items subjacente (para projeções tipadas).
    pub fn work_items(&self) -> &WorkItemManager {
        &self.work_items
    }

    /// Tenta descobrir qual Feature corresponde ao nome de pasta dado.
    ///
    /// `client_hint` é o nome (normalizado ou não) da pasta de cliente que
    /// contém a pasta sendo resolvida; quando presente, só aceita Features
    /// cujo cliente derivado do area path seja o mesmo.
    ///
    /// Retorna `Ok(None)` quando nenhuma camada encontra correspondência.
    pub async fn resolve(
        &self,
        folder_name: &str,
        client_hint: Option<&str>,
    ) -> AppResult<Option<ResolvedFeature>> {
        let input = folder_name.trim();
        if input.is_empty() {
            return Ok(None);
        }

        // 1. Id numérico direto
        if let Ok(id) = input.parse::<i64>() {
            if let Some(work_item) = self.work_items.get_work_item(id).await? {
                if self.passes_filters(&work_item, client_hint) {
                    tracing::info!("✅ '{}' resolvido por id → Feature #{}", input, id);
                    return Ok(Some(ResolvedFeature {
                        work_item,
                        tier: ResolutionTier::ById,
                    }));
                }
            }
        }

        // 2. Número de proposta presente no nome
        if let Some(proposal) = find_proposal_in_text(input) {
            if let Some(found) = self.find_by_proposal_filtered(&proposal, client_hint).await? {
                return Ok(Some(found));
            }

            // O campo upstream pode guardar a proposta com ou sem zero à esquerda
            if let Some(variant) = proposal_padding_variant(&proposal) {
                tracing::debug!("Proposta '{}' sem resultado, tentando variante '{}'", proposal, variant);
                if let Some(found) = self.find_by_proposal_filtered(&variant, client_hint).await? {
                    return Ok(Some(found));
                }
            }
        }

        // 3. Substring do título
        if input.chars().count() >= 2 {
            let candidates = self.work_items.find_by_title_contains(input).await?;
            if let Some(work_item) = candidates
                .into_iter()
                .find(|wi| self.passes_filters(wi, client_hint))
            {
                tracing::info!(
                    "✅ '{}' resolvido por título → Feature #{}",
                    input,
                    work_item.id
                );
                return Ok(Some(ResolvedFeature {
                    work_item,
                    tier: ResolutionTier::ByTitle,
                }));
            }
        }

        tracing::warn!("⚠️ Nenhuma Feature encontrada para '{}'", input);
        Ok(None)
    }

    async fn find_by_proposal_filtered(
        &self,
        proposal: &str,
        client_hint: Option<&str>,
    ) -> AppResult<Option<ResolvedFeature>> {
        let candidates = self.work_items.find_by_proposal_number(proposal).await?;
        let found = candidates
            .into_iter()
            .find(|wi| self.passes_filters(wi, client_hint));

        if let Some(work_item) = found {
            tracing::info!(
                "✅ Proposta '{}' resolvida → Feature #{}",
                proposal,
                work_item.id
            );
            return Ok(Some(ResolvedFeature {
                work_item,
                tier: ResolutionTier::ByProposal,
            }));
        }
        Ok(None)
    }

    /// Filtros comuns a todas as camadas: tipo Feature, area path sob a raiz
    /// e (se houver) a dica de cliente.
    fn passes_filters(&self, work_item: &WorkItem, client_hint: Option<&str>) -> bool {
        if work_item.work_item_type() != Some("Feature") {
            return false;
        }

        let area_path = work_item.area_path().unwrap_or("");
        if !self.area_under_root(area_path) {
            return false;
        }

        if let Some(hint) = client_hint {
            let client = normalize_client_name(last_area_segment(area_path));
            let hint = normalize_client_name(hint);
            if client.to_lowercase() != hint.to_lowercase() {
                return false;
            }
        }

        true
    }

    fn area_under_root(&self, area_path: &str) -> bool {
        let area = area_path.to_lowercase();
        let root = self.work_items.area_root().to_lowercase();
        area == root || area.starts_with(&format!("{}\\", root))
    }
}

fn last_area_segment(area_path: &str) -> &str {
    area_path
        .split('\\')
        .filter(|s| !s.trim().is_empty())
        .last()
        .unwrap_or("")
}
