//! Projeção tipada dos work items do Azure DevOps.
//!
//! A conversão do `WorkItem` cru (mapa de campos) para `FeatureInfo` acontece
//! uma única vez, na fronteira com a API. Todo o restante do código trabalha
//! com os tipos deste módulo, nunca com os nomes de campo da API.

use chrono::{DateTime, Datelike, Utc};
use devops::WorkItem;

use crate::utils::naming::{
    build_feature_folder_name, normalize_client_name, sanitize_folder_name_for_sharepoint,
};

/// Estados tratados como "encerrado" quando a configuração não define outros.
pub const DEFAULT_CLOSED_STATES: &[&str] = &[
    "encerrado",
    "closed",
    "concluído",
    "concluido",
    "resolved",
    "done",
    "resolvido",
];

/// Retrato imutável de uma Feature no momento da leitura.
///
/// Sempre reconstruído a partir do work item; nunca atualizado em memória.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureInfo {
    pub id: i64,
    pub title: String,
    pub state: String,
    pub area_path: String,
    pub created_date: Option<DateTime<Utc>>,
    pub proposal_number: Option<String>,
    pub documentation_link: Option<String>,
}

impl FeatureInfo {
    /// Projeta um work item cru para `FeatureInfo`.
    ///
    /// # Argumentos
    /// * `work_item` - Work item retornado pela API (com campos expandidos)
    /// * `proposal_field` - Reference name do campo de proposta (ex.: `Custom.NumeroProposta`)
    /// * `link_field` - Reference name do campo do link de documentação
    pub fn from_work_item(work_item: &WorkItem, proposal_field: &str, link_field: &str) -> Self {
        let field_trimmed = |name: &str| {
            work_item
                .field_str(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Self {
            id: work_item.id,
            title: work_item
                .title()
                .map(|t| t.trim().to_string())
                .unwrap_or_default(),
            state: work_item.state().map(|s| s.to_string()).unwrap_or_default(),
            area_path: work_item
                .area_path()
                .map(|a| a.to_string())
                .unwrap_or_default(),
            created_date: work_item.created_date(),
            proposal_number: field_trimmed(proposal_field),
            documentation_link: field_trimmed(link_field),
        }
    }

    /// Cliente derivado do último segmento do area path.
    ///
    /// Area path vazio produz o placeholder "Sem Cliente".
    pub fn client_name(&self) -> String {
        let last_segment = self
            .area_path
            .split('\\')
            .filter(|s| !s.trim().is_empty())
            .last()
            .unwrap_or("");
        normalize_client_name(last_segment)
    }

    /// Nome canônico da pasta desta Feature: `{id} - {proposta|N/A} - {título}`.
    pub fn folder_name(&self) -> String {
        build_feature_folder_name(self.id, self.proposal_number.as_deref(), &self.title)
    }

    /// Compara o estado (case-insensitive) contra o conjunto de estados encerrados.
    pub fn is_closed(&self, closed_states: &[String]) -> bool {
        let state = self.state.trim().to_lowercase();
        closed_states.iter().any(|s| s.trim().to_lowercase() == state)
    }
}

/// Localização canônica da pasta de uma Feature dentro do drive.
///
/// Features ativas: `{ano}/{cliente}/{pasta}`.
/// Features encerradas: `{ano}/Closed/{cliente}/{pasta}`.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureFolderPath {
    pub year: String,
    pub client: String,
    pub folder_name: String,
    pub closed: bool,
}

impl FeatureFolderPath {
    /// Deriva a localização canônica a partir dos dados da Feature.
    ///
    /// Sem data de criação, a Feature cai no balde `fallback_year_bucket`
    /// (ex.: "2020-2023"). Cliente e nome da pasta já saem sanitizados para
    /// uso como segmentos remotos (a barra do placeholder `N/A` vira espaço).
    pub fn for_feature(
        feature: &FeatureInfo,
        closed_states: &[String],
        fallback_year_bucket: &str,
    ) -> Self {
        let year = feature
            .created_date
            .map(|d| d.year().to_string())
            .unwrap_or_else(|| fallback_year_bucket.to_string());

        Self {
            year,
            client: sanitize_folder_name_for_sharepoint(&feature.client_name()),
            folder_name: sanitize_folder_name_for_sharepoint(&feature.folder_name()),
            closed: feature.is_closed(closed_states),
        }
    }

    /// Caminho relativo canônico, considerando o estado da Feature.
    pub fn relative_path(&self) -> String {
        if self.closed {
            format!("{}/Closed/{}/{}", self.year, self.client, self.folder_name)
        } else {
            self.relative_path_active()
        }
    }

    /// Caminho relativo da variante ativa (sem `Closed`), usado para detectar
    /// pastas que precisam migrar quando a Feature encerra.
    pub fn relative_path_active(&self) -> String {
        format!("{}/{}/{}", self.year, self.client, self.folder_name)
    }
}
