//! Tipos de dados da API do Azure DevOps

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

/// Deserializa um id que pode vir como número ou string
///
/// NOTA: payloads de webhook e respostas WIQL nem sempre concordam no tipo
pub fn deserialize_id_flexible<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Deserialize};

    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| de::Error::custom("id fora do intervalo de i64")),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| de::Error::custom("id must be string or number")),
        _ => Err(de::Error::custom("id must be string or number")),
    }
}

/// Work item retornado pela API (campos crus + relações)
///
/// Os campos vivem em um mapa `System.*`/`Custom.*` exatamente como a API
/// devolve; a projeção para um tipo de domínio acontece uma única vez no
/// consumidor, nunca aqui.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkItem {
    #[serde(deserialize_with = "deserialize_id_flexible")]
    pub id: i64,
    #[serde(default)]
    pub rev: Option<i64>,
    #[serde(default)]
    pub fields: serde_json::Map<String, Value>,
    #[serde(default)]
    pub relations: Option<Vec<Relation>>,
    #[serde(default)]
    pub url: Option<String>,
}

impl WorkItem {
    /// Lê um campo string pelo nome completo (ex: `System.Title`)
    pub fn field_str(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(|v| v.as_str())
    }

    /// Tipo do work item (`System.WorkItemType`)
    pub fn work_item_type(&self) -> Option<&str> {
        self.field_str("System.WorkItemType")
    }

    /// Título (`System.Title`)
    pub fn title(&self) -> Option<&str> {
        self.field_str("System.Title")
    }

    /// Estado (`System.State`)
    pub fn state(&self) -> Option<&str> {
        self.field_str("System.State")
    }

    /// Area path (`System.AreaPath`)
    pub fn area_path(&self) -> Option<&str> {
        self.field_str("System.AreaPath")
    }

    /// Data de criação (`System.CreatedDate`), quando parseável
    pub fn created_date(&self) -> Option<DateTime<Utc>> {
        self.field_str("System.CreatedDate")
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// Relações de anexo (`rel == "AttachedFile"`)
    pub fn attachment_relations(&self) -> Vec<AttachmentRef> {
        self.relations
            .as_deref()
            .unwrap_or_default()
            .iter()
            .filter(|r| r.rel == "AttachedFile")
            .filter_map(|r| {
                let id = attachment_id_from_url(&r.url)?;
                Some(AttachmentRef {
                    id,
                    name: r
                        .attributes
                        .as_ref()
                        .and_then(|a| a.name.as_deref())
                        .map(|n| n.trim().to_string())
                        .filter(|n| !n.is_empty()),
                })
            })
            .collect()
    }
}

/// Extrai o id (GUID) de um anexo da URL da relação
///
/// URLs têm a forma `.../_apis/wit/attachments/{guid}`, opcionalmente com
/// query string (`?fileName=...`).
fn attachment_id_from_url(url: &str) -> Option<String> {
    let path = url.split('?').next().unwrap_or(url);
    let (_, tail) = path.split_once("/attachments/")?;
    let id = tail.trim_matches('/');
    if id.is_empty() {
        None
    } else {
        Some(id.to_string())
    }
}

/// Relação de um work item (anexos, links, hierarquia)
#[derive(Debug, Clone, Deserialize)]
pub struct Relation {
    pub rel: String,
    pub url: String,
    #[serde(default)]
    pub attributes: Option<RelationAttributes>,
}

/// Atributos de uma relação
#[derive(Debug, Clone, Deserialize)]
pub struct RelationAttributes {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "resourceSize")]
    pub resource_size: Option<i64>,
}

/// Referência a um anexo de work item
#[derive(Debug, Clone)]
pub struct AttachmentRef {
    /// GUID do anexo
    pub id: String,
    /// Nome declarado na relação, quando presente e não-vazio
    pub name: Option<String>,
}

/// Anexo baixado (nome resolvido + conteúdo)
#[derive(Debug, Clone)]
pub struct DownloadedAttachment {
    pub file_name: String,
    pub content: Vec<u8>,
}

/// Resposta de uma consulta WIQL (apenas referências)
#[derive(Debug, Deserialize)]
pub struct WiqlResponse {
    #[serde(default, rename = "workItems")]
    pub work_items: Vec<WorkItemRef>,
}

/// Referência de work item em resposta WIQL
#[derive(Debug, Deserialize)]
pub struct WorkItemRef {
    #[serde(deserialize_with = "deserialize_id_flexible")]
    pub id: i64,
}

/// Resposta de busca em lote de work items
#[derive(Debug, Deserialize)]
pub struct WorkItemBatchResponse {
    #[serde(default)]
    pub count: Option<i64>,
    #[serde(default)]
    pub value: Vec<WorkItem>,
}

/// Filtro para listagem de Features
#[derive(Debug, Clone, Default)]
pub struct FeatureListFilter {
    /// Incluir Features encerradas
    pub include_closed: bool,
    /// Restringir a Features encerradas
    pub only_closed: bool,
    /// Limite inferior de `System.ChangedDate` (scan incremental)
    pub updated_since: Option<DateTime<Utc>>,
}

/// Resultado da escrita do link de documentação
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkUpdate {
    /// Campo atualizado com o novo valor
    Updated,
    /// Valor armazenado já era o esperado, nenhuma escrita feita
    Unchanged,
    /// Escrita suprimida pelo chamador
    Skipped,
    /// Regra de validação do processo rejeitou a escrita (não-fatal)
    Rejected(String),
}
