//! Operações sobre work items: consulta direta, WIQL, anexos e atualização
//! do link de documentação

use crate::client::{extract_error_message, DevOpsClient, API_VERSION};
use crate::error::{DevOpsError, Result};
use crate::types::{
    DownloadedAttachment, FeatureListFilter, LinkUpdate, WiqlResponse, WorkItem,
    WorkItemBatchResponse,
};
use serde_json::json;

/// Tamanho máximo de lote aceito pelo endpoint de busca por ids
const BATCH_SIZE: usize = 200;

/// Estado usado nos filtros WIQL de Features encerradas
///
/// A classificação completa de estados encerrados vive no domínio; aqui só
/// entra o literal que o processo do projeto usa no quadro.
const CLOSED_STATE: &str = "Encerrado";

/// Campos customizados e raiz de área usados nas consultas
#[derive(Debug, Clone)]
pub struct WorkItemFieldConfig {
    /// Raiz de `System.AreaPath` que delimita o projeto (ex: `Nextly`)
    pub area_root: String,
    /// Nome completo do campo de número de proposta
    pub proposal_field: String,
    /// Nome completo do campo de link da pasta de documentação
    pub link_field: String,
}

/// Gerenciador de work items
///
/// Encapsula as rotas `wit/*` usadas pela sincronização: busca por id,
/// consultas WIQL (listagem, proposta, título), anexos e o patch do link
/// de documentação.
#[derive(Clone)]
pub struct WorkItemManager {
    client: DevOpsClient,
    config: WorkItemFieldConfig,
}

impl WorkItemManager {
    /// Cria um novo gerenciador
    pub fn new(client: DevOpsClient, config: WorkItemFieldConfig) -> Self {
        Self { client, config }
    }

    /// Raiz de área configurada para as consultas
    pub fn area_root(&self) -> &str {
        &self.config.area_root
    }

    /// Reference name do campo de número de proposta
    pub fn proposal_field(&self) -> &str {
        &self.config.proposal_field
    }

    /// Reference name do campo de link de documentação
    pub fn link_field(&self) -> &str {
        &self.config.link_field
    }

    /// Busca um work item pelo id, com relações expandidas
    ///
    /// # Retorno
    /// - `Ok(Some(WorkItem))`: item encontrado
    /// - `Ok(None)`: id inexistente (404)
    pub async fn get_work_item(&self, id: i64) -> Result<Option<WorkItem>> {
        let endpoint = format!(
            "/wit/workitems/{}?$expand=all&api-version={}",
            id, API_VERSION
        );

        match self.client.get_json::<WorkItem>(&endpoint).await {
            Ok(item) => Ok(Some(item)),
            Err(DevOpsError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Busca work items em lote, preservando a ordem dos ids
    ///
    /// O endpoint aceita no máximo 200 ids por chamada; listas maiores são
    /// particionadas.
    pub async fn get_work_items(&self, ids: &[i64]) -> Result<Vec<WorkItem>> {
        let mut items = Vec::with_capacity(ids.len());

        for chunk in ids.chunks(BATCH_SIZE) {
            let ids_param = chunk
                .iter()
                .map(|id| id.to_string())
                .collect::<Vec<_>>()
                .join(",");
            let endpoint = format!(
                "/wit/workitems?ids={}&$expand=all&api-version={}",
                ids_param, API_VERSION
            );

            let batch: WorkItemBatchResponse = self.client.get_json(&endpoint).await?;
            items.extend(batch.value);
        }

        Ok(items)
    }

    /// Lista Features do projeto segundo o filtro
    ///
    /// A consulta WIQL devolve ids em ordem decrescente; os itens são
    /// hidratados em lote na mesma ordem.
    pub async fn list_features(&self, filter: &FeatureListFilter) -> Result<Vec<WorkItem>> {
        let mut conditions = vec![
            "[System.WorkItemType] = 'Feature'".to_string(),
            format!(
                "[System.AreaPath] UNDER '{}'",
                escape_wiql(&self.config.area_root)
            ),
        ];

        if filter.only_closed {
            conditions.push(format!("[System.State] = '{}'", CLOSED_STATE));
        } else if !filter.include_closed {
            conditions.push(format!("[System.State] <> '{}'", CLOSED_STATE));
        }

        if let Some(since) = filter.updated_since {
            conditions.push(format!(
                "[System.ChangedDate] >= '{}'",
                since.format("%Y-%m-%dT%H:%M:%SZ")
            ));
        }

        let wiql = format!(
            "SELECT [System.Id] FROM WorkItems WHERE {} ORDER BY [System.Id] DESC",
            conditions.join(" AND ")
        );

        // timePrecision é necessário para o corte por ChangedDate ter hora
        self.run_query(&wiql, filter.updated_since.is_some()).await
    }

    /// Busca Features cujo campo de proposta é igual ao valor dado
    ///
    /// # Retorno
    /// Itens em ordem decrescente de id (mais recente primeiro)
    pub async fn find_by_proposal_number(&self, value: &str) -> Result<Vec<WorkItem>> {
        let wiql = format!(
            "SELECT [System.Id] FROM WorkItems WHERE [System.WorkItemType] = 'Feature' \
             AND [System.AreaPath] UNDER '{}' AND [{}] = '{}' ORDER BY [System.Id] DESC",
            escape_wiql(&self.config.area_root),
            self.config.proposal_field,
            escape_wiql(value)
        );

        self.run_query(&wiql, false).await
    }

    /// Busca Features cujo título contém o texto dado
    pub async fn find_by_title_contains(&self, text: &str) -> Result<Vec<WorkItem>> {
        let wiql = format!(
            "SELECT [System.Id] FROM WorkItems WHERE [System.WorkItemType] = 'Feature' \
             AND [System.AreaPath] UNDER '{}' AND [System.Title] CONTAINS '{}' \
             ORDER BY [System.Id] DESC",
            escape_wiql(&self.config.area_root),
            escape_wiql(text)
        );

        self.run_query(&wiql, false).await
    }

    /// Escreve o link da pasta de documentação no campo customizado
    ///
    /// # Retorno
    /// - `Ok(LinkUpdate::Updated)`: campo gravado
    /// - `Ok(LinkUpdate::Rejected)`: regra de processo recusou a escrita
    ///   (tratado como não-fatal pelo chamador)
    /// - `Err(_)`: falha de autenticação, item inexistente ou erro de API
    pub async fn update_documentation_link(&self, id: i64, url: &str) -> Result<LinkUpdate> {
        let endpoint = format!("/wit/workitems/{}?api-version={}", id, API_VERSION);
        let body = json!([
            {
                "op": "add",
                "path": format!("/fields/{}", self.config.link_field),
                "value": url,
            }
        ]);

        let response = self.client.patch_json(&endpoint, &body).await?;
        let status = response.status();

        if status.is_success() {
            return Ok(LinkUpdate::Updated);
        }

        let status_code = status.as_u16();
        let error_body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        let message = extract_error_message(&error_body);

        match status_code {
            // Regras de validação do processo devolvem 400; o link fica
            // desatualizado mas a sincronização do restante continua
            400 | 422 => {
                tracing::warn!(
                    "⚠️ Regra de validação recusou link do work item {}: {}",
                    id,
                    message
                );
                Ok(LinkUpdate::Rejected(message))
            }
            401 | 403 => Err(DevOpsError::AuthError(message)),
            404 => Err(DevOpsError::NotFound(message)),
            _ => Err(DevOpsError::ApiError {
                status: status_code,
                message,
            }),
        }
    }

    /// Baixa um anexo e resolve o nome do arquivo
    ///
    /// Preferência de nome: declarado na relação → `Content-Disposition` →
    /// `attachment_{id}`.
    pub async fn download_attachment(
        &self,
        attachment_id: &str,
        declared_name: Option<&str>,
    ) -> Result<DownloadedAttachment> {
        let endpoint = format!("/wit/attachments/{}?api-version={}", attachment_id, API_VERSION);

        let response = self.client.get(&endpoint).await?;

        let header_name = response
            .headers()
            .get(reqwest::header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(filename_from_content_disposition);

        let content = response.bytes().await?.to_vec();

        let file_name = declared_name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(String::from)
            .or(header_name)
            .unwrap_or_else(|| format!("attachment_{}", attachment_id));

        Ok(DownloadedAttachment { file_name, content })
    }

    /// Executa uma consulta WIQL e hidrata os itens referenciados
    async fn run_query(&self, wiql: &str, time_precision: bool) -> Result<Vec<WorkItem>> {
        let endpoint = if time_precision {
            format!("/wit/wiql?timePrecision=true&api-version={}", API_VERSION)
        } else {
            format!("/wit/wiql?api-version={}", API_VERSION)
        };

        tracing::debug!("WIQL: {}", wiql);

        let response: WiqlResponse = self
            .client
            .post_json(&endpoint, &json!({ "query": wiql }))
            .await?;

        let ids: Vec<i64> = response.work_items.iter().map(|r| r.id).collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        self.get_work_items(&ids).await
    }
}

/// Escapa aspas simples em literais WIQL
fn escape_wiql(value: &str) -> String {
    value.replace('\'', "''")
}

/// Extrai o nome de arquivo de um header `Content-Disposition`
///
/// Suporta a forma estendida RFC 5987 (`filename*=UTF-8''nome%20url`) com
/// precedência sobre a forma simples (`filename="nome"`).
fn filename_from_content_disposition(value: &str) -> Option<String> {
    let mut plain: Option<String> = None;

    for part in value.split(';') {
        let part = part.trim();
        let Some((key, val)) = part.split_once('=') else {
            continue;
        };
        let key = key.trim().to_ascii_lowercase();
        let val = val.trim().trim_matches('"');

        if key == "filename*" {
            let encoded = val.split_once("''").map(|(_, v)| v).unwrap_or(val);
            if let Ok(decoded) = urlencoding::decode(encoded) {
                let decoded = decoded.trim();
                if !decoded.is_empty() {
                    return Some(decoded.to_string());
                }
            }
        } else if key == "filename" && plain.is_none() && !val.is_empty() {
            plain = Some(val.to_string());
        }
    }

    plain
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use httpmock::Method::PATCH;
    use serde_json::json;

    fn manager_for(server: &MockServer) -> WorkItemManager {
        let client = DevOpsClient::new(server.base_url(), "org", "proj", "pat").unwrap();
        WorkItemManager::new(
            client,
            WorkItemFieldConfig {
                area_root: "Nextly".to_string(),
                proposal_field: "Custom.NumeroProposta".to_string(),
                link_field: "Custom.LinkPastaDocumentacao".to_string(),
            },
        )
    }

    #[tokio::test]
    async fn test_get_work_item_encontrado() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/org/proj/_apis/wit/workitems/42")
                .query_param("api-version", "7.1")
                .query_param("$expand", "all");
            then.status(200).json_body(json!({
                "id": 42,
                "fields": {"System.Title": "Portal", "System.WorkItemType": "Feature"}
            }));
        });

        let item = manager_for(&server).get_work_item(42).await.unwrap();
        mock.assert();
        assert_eq!(item.unwrap().title(), Some("Portal"));
    }

    #[tokio::test]
    async fn test_get_work_item_404_vira_none() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/org/proj/_apis/wit/workitems/99");
            then.status(404)
                .json_body(json!({"message": "TF401232: Work item 99 does not exist"}));
        });

        let item = manager_for(&server).get_work_item(99).await.unwrap();
        assert!(item.is_none());
    }

    #[tokio::test]
    async fn test_list_features_ordem_e_filtro_de_estado() {
        let server = MockServer::start();
        let wiql = server.mock(|when, then| {
            when.method(POST)
                .path("/org/proj/_apis/wit/wiql")
                .body_contains("[System.WorkItemType] = 'Feature'")
                .body_contains("[System.AreaPath] UNDER 'Nextly'")
                .body_contains("[System.State] <> 'Encerrado'")
                .body_contains("ORDER BY [System.Id] DESC");
            then.status(200)
                .json_body(json!({"workItems": [{"id": 30}, {"id": 10}]}));
        });
        let batch = server.mock(|when, then| {
            when.method(GET)
                .path("/org/proj/_apis/wit/workitems")
                .query_param("ids", "30,10");
            then.status(200).json_body(json!({
                "count": 2,
                "value": [
                    {"id": 30, "fields": {"System.Title": "B"}},
                    {"id": 10, "fields": {"System.Title": "A"}}
                ]
            }));
        });

        let items = manager_for(&server)
            .list_features(&FeatureListFilter::default())
            .await
            .unwrap();

        wiql.assert();
        batch.assert();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, 30);
        assert_eq!(items[1].id, 10);
    }

    #[tokio::test]
    async fn test_list_features_incremental_usa_time_precision() {
        let server = MockServer::start();
        let wiql = server.mock(|when, then| {
            when.method(POST)
                .path("/org/proj/_apis/wit/wiql")
                .query_param("timePrecision", "true")
                .body_contains("[System.ChangedDate] >= '2024-05-10T08:00:00Z'");
            then.status(200).json_body(json!({"workItems": []}));
        });

        let since = chrono::DateTime::parse_from_rfc3339("2024-05-10T08:00:00Z")
            .unwrap()
            .with_timezone(&chrono::Utc);
        let filter = FeatureListFilter {
            include_closed: true,
            only_closed: false,
            updated_since: Some(since),
        };

        let items = manager_for(&server).list_features(&filter).await.unwrap();
        wiql.assert();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_find_by_proposal_number() {
        let server = MockServer::start();
        let wiql = server.mock(|when, then| {
            when.method(POST)
                .path("/org/proj/_apis/wit/wiql")
                .body_contains("[Custom.NumeroProposta] = '25288-01'");
            then.status(200).json_body(json!({"workItems": [{"id": 7}]}));
        });
        server.mock(|when, then| {
            when.method(GET)
                .path("/org/proj/_apis/wit/workitems")
                .query_param("ids", "7");
            then.status(200).json_body(json!({
                "value": [{"id": 7, "fields": {"System.Title": "Proposta"}}]
            }));
        });

        let items = manager_for(&server)
            .find_by_proposal_number("25288-01")
            .await
            .unwrap();
        wiql.assert();
        assert_eq!(items[0].id, 7);
    }

    #[tokio::test]
    async fn test_update_link_atualizado() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(PATCH)
                .path("/org/proj/_apis/wit/workitems/42")
                .header("content-type", "application/json-patch+json")
                .body_contains("/fields/Custom.LinkPastaDocumentacao")
                .body_contains("https://sp.example/pasta");
            then.status(200).json_body(json!({"id": 42, "fields": {}}));
        });

        let result = manager_for(&server)
            .update_documentation_link(42, "https://sp.example/pasta")
            .await
            .unwrap();
        mock.assert();
        assert_eq!(result, LinkUpdate::Updated);
    }

    #[tokio::test]
    async fn test_update_link_rejeitado_por_regra() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(PATCH).path("/org/proj/_apis/wit/workitems/42");
            then.status(400)
                .json_body(json!({"message": "The field cannot be modified in this state"}));
        });

        let result = manager_for(&server)
            .update_documentation_link(42, "https://sp.example/pasta")
            .await
            .unwrap();
        assert!(matches!(result, LinkUpdate::Rejected(_)));
    }

    #[tokio::test]
    async fn test_download_attachment_nome_declarado_vence() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/org/proj/_apis/wit/attachments/abc-1");
            then.status(200)
                .header("content-disposition", "attachment; filename=\"outro.pdf\"")
                .body("conteudo");
        });

        let att = manager_for(&server)
            .download_attachment("abc-1", Some("relatorio.pdf"))
            .await
            .unwrap();
        assert_eq!(att.file_name, "relatorio.pdf");
        assert_eq!(att.content, b"conteudo");
    }

    #[tokio::test]
    async fn test_download_attachment_content_disposition_fallback() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/org/proj/_apis/wit/attachments/abc-2");
            then.status(200)
                .header(
                    "content-disposition",
                    "attachment; filename*=UTF-8''Relat%C3%B3rio%20Final.pdf",
                )
                .body("x");
        });

        let att = manager_for(&server)
            .download_attachment("abc-2", None)
            .await
            .unwrap();
        assert_eq!(att.file_name, "Relatório Final.pdf");
    }

    #[tokio::test]
    async fn test_download_attachment_sem_nome_usa_id() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/org/proj/_apis/wit/attachments/abc-3");
            then.status(200).body("x");
        });

        let att = manager_for(&server)
            .download_attachment("abc-3", None)
            .await
            .unwrap();
        assert_eq!(att.file_name, "attachment_abc-3");
    }

    #[test]
    fn test_escape_wiql() {
        assert_eq!(escape_wiql("O'Brien"), "O''Brien");
        assert_eq!(escape_wiql("sem aspas"), "sem aspas");
    }

    #[test]
    fn test_filename_from_content_disposition() {
        assert_eq!(
            filename_from_content_disposition("attachment; filename=\"doc.pdf\""),
            Some("doc.pdf".to_string())
        );
        assert_eq!(
            filename_from_content_disposition("attachment; filename=doc.pdf"),
            Some("doc.pdf".to_string())
        );
        // forma estendida tem precedência
        assert_eq!(
            filename_from_content_disposition(
                "attachment; filename=\"fallback.pdf\"; filename*=UTF-8''ata%20reuni%C3%A3o.pdf"
            ),
            Some("ata reunião.pdf".to_string())
        );
        assert_eq!(filename_from_content_disposition("inline"), None);
    }
}
