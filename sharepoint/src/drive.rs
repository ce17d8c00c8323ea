//! Operações sobre o drive de documentos: pastas, uploads, movimentação,
//! links de compartilhamento e listagens

use crate::client::{extract_error_message, is_name_conflict, GraphClient};
use crate::error::{GraphError, Result};
use crate::types::{
    Drive, DriveItem, DriveItemPage, DriveList, EnsureOutcome, MoveOutcome, RemoteFile,
    SharingLinkResponse, Site, UploadSession,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde_json::json;
use tokio::sync::OnceCell;

/// Limite do upload simples; acima disso o upload usa sessão em trechos
const SIMPLE_UPLOAD_LIMIT: usize = 4 * 1024 * 1024;

/// Tamanho de cada trecho de sessão (múltiplo de 320 KiB exigido pelo serviço)
const UPLOAD_CHUNK_SIZE: usize = 12 * 327_680;

/// Localização do site e preferência de biblioteca
#[derive(Debug, Clone)]
pub struct DriveConfig {
    /// Hostname do tenant (ex: `contoso.sharepoint.com`)
    pub hostname: String,
    /// Nome do site (ex: `TI`)
    pub site_name: String,
    /// Nomes de biblioteca aceitos, em ordem de preferência
    pub drive_name_preferences: Vec<String>,
}

/// Serviço de operações no drive
///
/// O id do drive é resolvido uma única vez (site por hostname + nome, drive
/// pela lista de preferência) e reutilizado em todas as chamadas.
pub struct DriveService {
    client: GraphClient,
    config: DriveConfig,
    drive_id: OnceCell<String>,
}

impl DriveService {
    /// Cria um novo serviço de drive
    pub fn new(client: GraphClient, config: DriveConfig) -> Self {
        Self {
            client,
            config,
            drive_id: OnceCell::new(),
        }
    }

    /// Id do drive de documentos (resolvido e cacheado na primeira chamada)
    pub async fn drive_id(&self) -> Result<&str> {
        self.drive_id
            .get_or_try_init(|| self.resolve_drive_id())
            .await
            .map(|s| s.as_str())
    }

    /// Resolve site e drive a partir da configuração
    async fn resolve_drive_id(&self) -> Result<String> {
        let endpoint = format!(
            "/sites/{}:/sites/{}",
            self.config.hostname, self.config.site_name
        );
        let site: Site = self.client.get_json(&endpoint).await?;

        let drives: DriveList = self
            .client
            .get_json(&format!("/sites/{}/drives", site.id))
            .await?;

        if drives.value.is_empty() {
            return Err(GraphError::NotFound(format!(
                "site {} não tem bibliotecas de documentos",
                self.config.site_name
            )));
        }

        let chosen: &Drive = self
            .config
            .drive_name_preferences
            .iter()
            .find_map(|preferred| {
                drives.value.iter().find(|d| {
                    d.name
                        .as_deref()
                        .map(|n| n.eq_ignore_ascii_case(preferred))
                        .unwrap_or(false)
                })
            })
            .unwrap_or(&drives.value[0]);

        tracing::info!(
            "📂 Drive selecionado: {} ({})",
            chosen.name.as_deref().unwrap_or("?"),
            chosen.id
        );

        Ok(chosen.id.clone())
    }

    /// Busca um item pelo caminho relativo à raiz do drive
    ///
    /// # Retorno
    /// - `Ok(Some(DriveItem))`: item existente (pasta ou arquivo)
    /// - `Ok(None)`: caminho inexistente (404)
    pub async fn get_folder_by_path(&self, path: &str) -> Result<Option<DriveItem>> {
        let drive_id = self.drive_id().await?;
        let endpoint = item_path_endpoint(drive_id, path);

        match self.client.get_json::<DriveItem>(&endpoint).await {
            Ok(item) => Ok(Some(item)),
            Err(GraphError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Item raiz do drive
    pub async fn root_folder(&self) -> Result<DriveItem> {
        let drive_id = self.drive_id().await?;
        self.client
            .get_json(&format!("/drives/{}/root", drive_id))
            .await
    }

    /// Garante a existência de uma subpasta direta
    ///
    /// Criação com conflict-behavior `fail`; um 409 (corrida com outra
    /// execução ou pasta preexistente) é resolvido buscando a subpasta
    /// homônima.
    pub async fn ensure_folder(&self, parent_id: &str, name: &str) -> Result<EnsureOutcome> {
        let drive_id = self.drive_id().await?;
        let endpoint = format!("/drives/{}/items/{}/children", drive_id, parent_id);
        let body = json!({
            "name": name,
            "folder": {},
            "@microsoft.graph.conflictBehavior": "fail",
        });

        let response = self.client.post_json_raw(&endpoint, &body).await?;
        let status = response.status();

        if status.as_u16() == 409 {
            let text = response.text().await.unwrap_or_default();
            let message = extract_error_message(&text);
            tracing::debug!("Pasta '{}' já existe sob {}: {}", name, parent_id, message);

            return match self.find_child_folder(parent_id, name).await? {
                Some(item) => Ok(EnsureOutcome::Existing(item)),
                None => Err(GraphError::NameConflict(message)),
            };
        }

        let response = self.client.handle_response(response).await?;
        let item: DriveItem = response.json().await?;
        Ok(EnsureOutcome::Created(item))
    }

    /// Busca uma subpasta direta pelo nome (case-insensitive)
    pub async fn find_child_folder(
        &self,
        parent_id: &str,
        name: &str,
    ) -> Result<Option<DriveItem>> {
        let wanted = name.trim().to_lowercase();
        let children = self.list_children(parent_id).await?;
        Ok(children
            .into_iter()
            .find(|c| c.is_folder() && c.name.trim().to_lowercase() == wanted))
    }

    /// Garante a existência de uma cadeia de pastas, criando as ausentes
    ///
    /// # Argumentos
    ///
    /// * `path` - Caminho relativo à raiz do drive (`2024/Camil/42 - ...`)
    ///
    /// # Retorno
    /// Item da última pasta da cadeia
    pub async fn ensure_folder_path(&self, path: &str) -> Result<DriveItem> {
        let mut current = self.root_folder().await?;
        let mut built = String::new();

        for segment in path.split('/').filter(|s| !s.trim().is_empty()) {
            if built.is_empty() {
                built.push_str(segment);
            } else {
                built = format!("{}/{}", built, segment);
            }

            match self.get_folder_by_path(&built).await? {
                Some(item) if item.is_folder() => current = item,
                Some(_) => {
                    return Err(GraphError::NameConflict(format!(
                        "'{}' já existe como arquivo",
                        built
                    )))
                }
                None => {
                    let outcome = self.ensure_folder(&current.id, segment).await?;
                    if matches!(outcome, EnsureOutcome::Created(_)) {
                        tracing::info!("📁 Pasta criada: {}", built);
                    }
                    current = outcome.into_item();
                }
            }
        }

        Ok(current)
    }

    /// Lista os filhos diretos de um item, seguindo a paginação
    pub async fn list_children(&self, item_id: &str) -> Result<Vec<DriveItem>> {
        let drive_id = self.drive_id().await?;
        self.list_children_in(drive_id, item_id).await
    }

    /// Lista os filhos diretos de um item em um drive arbitrário
    ///
    /// Variante para itens fora do drive do projeto (ex.: pastas de origem
    /// resolvidas por URL de compartilhamento).
    pub async fn list_children_in(
        &self,
        drive_id: &str,
        item_id: &str,
    ) -> Result<Vec<DriveItem>> {
        let mut items = Vec::new();

        let mut page: DriveItemPage = self
            .client
            .get_json(&format!(
                "/drives/{}/items/{}/children?$top=200",
                drive_id, item_id
            ))
            .await?;

        loop {
            items.extend(page.value);
            match page.next_link {
                Some(url) => page = self.client.get_absolute_json(&url).await?,
                None => break,
            }
        }

        Ok(items)
    }

    /// Faz upload de um arquivo para dentro de uma pasta
    ///
    /// Conteúdo até 4 MiB sobe em uma única chamada; acima disso o upload
    /// usa sessão com trechos sequenciais.
    ///
    /// # Argumentos
    ///
    /// * `overwrite` - `true` substitui arquivo homônimo; `false` falha com
    ///   [`GraphError::NameConflict`]
    pub async fn upload_file(
        &self,
        parent_id: &str,
        file_name: &str,
        content: Vec<u8>,
        overwrite: bool,
    ) -> Result<DriveItem> {
        let behavior = if overwrite { "replace" } else { "fail" };

        if content.len() <= SIMPLE_UPLOAD_LIMIT {
            let drive_id = self.drive_id().await?;
            let endpoint = format!(
                "/drives/{}/items/{}:/{}:/content?@microsoft.graph.conflictBehavior={}",
                drive_id,
                parent_id,
                urlencoding::encode(file_name),
                behavior
            );
            return self.client.put_bytes(&endpoint, content).await;
        }

        self.upload_large(parent_id, file_name, content, behavior).await
    }

    /// Upload por sessão em trechos com `Content-Range`
    async fn upload_large(
        &self,
        parent_id: &str,
        file_name: &str,
        content: Vec<u8>,
        behavior: &str,
    ) -> Result<DriveItem> {
        let drive_id = self.drive_id().await?;
        let endpoint = format!(
            "/drives/{}/items/{}:/{}:/createUploadSession",
            drive_id,
            parent_id,
            urlencoding::encode(file_name)
        );
        let body = json!({
            "item": {
                "@microsoft.graph.conflictBehavior": behavior,
                "name": file_name,
            }
        });

        let session: UploadSession = self.client.post_json(&endpoint, &body).await?;
        let total = content.len();

        tracing::info!(
            "⬆️ Upload em sessão: {} ({} bytes, trechos de {})",
            file_name,
            total,
            UPLOAD_CHUNK_SIZE
        );

        let mut offset = 0usize;
        let mut final_response = None;

        while offset < total {
            let end = (offset + UPLOAD_CHUNK_SIZE).min(total);
            let range = format!("bytes {}-{}/{}", offset, end - 1, total);
            let chunk = content[offset..end].to_vec();

            let response = self
                .client
                .put_chunk(&session.upload_url, &range, total, chunk)
                .await?;

            final_response = Some(response);
            offset = end;
        }

        let response = final_response.ok_or_else(|| {
            GraphError::ConfigError("upload de sessão sem conteúdo".to_string())
        })?;
        let item: DriveItem = response.json().await?;
        Ok(item)
    }

    /// Cria um link de visualização com escopo da organização
    pub async fn create_sharing_link(&self, item_id: &str) -> Result<String> {
        let drive_id = self.drive_id().await?;
        let endpoint = format!("/drives/{}/items/{}/createLink", drive_id, item_id);
        let body = json!({"type": "view", "scope": "organization"});

        let response: SharingLinkResponse = self.client.post_json(&endpoint, &body).await?;
        Ok(response.link.web_url)
    }

    /// Move um item para outra pasta, opcionalmente renomeando
    ///
    /// # Retorno
    /// - `Ok(MoveOutcome::Moved)`: item movido
    /// - `Ok(MoveOutcome::SkippedConflict)`: destino já tinha item homônimo
    pub async fn move_item(
        &self,
        item_id: &str,
        new_parent_id: &str,
        new_name: &str,
    ) -> Result<MoveOutcome> {
        let drive_id = self.drive_id().await?;
        let endpoint = format!("/drives/{}/items/{}", drive_id, item_id);
        let body = json!({
            "parentReference": {"id": new_parent_id},
            "name": new_name,
        });

        let response = self.client.patch_json_raw(&endpoint, &body).await?;
        let status = response.status();

        if !status.is_success() {
            let status_code = status.as_u16();
            let text = response.text().await.unwrap_or_default();
            let message = extract_error_message(&text);

            if status_code == 409 || is_name_conflict(&message) {
                tracing::info!("↪️ Movimento pulado, destino já tem '{}'", new_name);
                return Ok(MoveOutcome::SkippedConflict);
            }

            return Err(match status_code {
                401 | 403 => GraphError::AuthError(message),
                404 => GraphError::NotFound(message),
                _ => GraphError::ApiError {
                    status: status_code,
                    message,
                },
            });
        }

        let item: DriveItem = response.json().await?;
        Ok(MoveOutcome::Moved(item))
    }

    /// Remove um item (pasta ou arquivo)
    pub async fn delete_item(&self, item_id: &str) -> Result<()> {
        let drive_id = self.drive_id().await?;
        self.client
            .delete(&format!("/drives/{}/items/{}", drive_id, item_id))
            .await
    }

    /// Baixa o conteúdo de um arquivo
    pub async fn download_file(&self, item_id: &str) -> Result<Vec<u8>> {
        let drive_id = self.drive_id().await?;
        self.download_file_in(drive_id, item_id).await
    }

    /// Baixa o conteúdo de um arquivo em um drive arbitrário
    pub async fn download_file_in(&self, drive_id: &str, item_id: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(&format!("/drives/{}/items/{}/content", drive_id, item_id))
            .await?;
        Ok(response.bytes().await?.to_vec())
    }

    /// Copia os arquivos diretos de uma pasta para outra (sobrescrevendo)
    ///
    /// # Retorno
    /// Quantidade de arquivos copiados
    pub async fn copy_folder_files(&self, source_id: &str, target_id: &str) -> Result<u32> {
        let mut copied = 0u32;

        for child in self.list_children(source_id).await? {
            if !child.is_file() {
                continue;
            }
            let content = self.download_file(&child.id).await?;
            self.upload_file(target_id, &child.name, content, true).await?;
            tracing::debug!("📄 Copiado: {}", child.name);
            copied += 1;
        }

        Ok(copied)
    }

    /// Resolve uma URL de compartilhamento para o item correspondente
    pub async fn resolve_sharing_url(&self, sharing_url: &str) -> Result<DriveItem> {
        let token = format!("u!{}", URL_SAFE_NO_PAD.encode(sharing_url));
        self.client
            .get_json(&format!("/shares/{}/driveItem", token))
            .await
    }

    /// Lista recursivamente os arquivos sob uma pasta
    ///
    /// Os caminhos devolvidos são relativos à pasta de partida.
    pub async fn list_files_recursive(&self, folder_id: &str) -> Result<Vec<RemoteFile>> {
        let drive_id = self.drive_id().await?;
        self.list_files_recursive_in(drive_id, folder_id).await
    }

    /// Lista recursivamente os arquivos sob uma pasta de um drive arbitrário
    pub async fn list_files_recursive_in(
        &self,
        drive_id: &str,
        folder_id: &str,
    ) -> Result<Vec<RemoteFile>> {
        let mut files = Vec::new();
        let mut stack: Vec<(String, String)> = vec![(folder_id.to_string(), String::new())];

        while let Some((id, prefix)) = stack.pop() {
            for child in self.list_children_in(drive_id, &id).await? {
                if child.is_folder() {
                    let sub = if prefix.is_empty() {
                        child.name.clone()
                    } else {
                        format!("{}/{}", prefix, child.name)
                    };
                    stack.push((child.id.clone(), sub));
                } else if child.is_file() {
                    files.push(RemoteFile {
                        id: child.id.clone(),
                        name: child.name.clone(),
                        folder: prefix.clone(),
                    });
                }
            }
        }

        Ok(files)
    }
}

/// Monta o endpoint de um item endereçado por caminho
fn item_path_endpoint(drive_id: &str, path: &str) -> String {
    let encoded = encode_path(path);
    if encoded.is_empty() {
        format!("/drives/{}/root", drive_id)
    } else {
        format!("/drives/{}/root:/{}", drive_id, encoded)
    }
}

/// Codifica cada segmento do caminho para URL, preservando as barras
fn encode_path(path: &str) -> String {
    path.split('/')
        .filter(|s| !s.trim().is_empty())
        .map(|s| urlencoding::encode(s).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{GraphAuth, GraphAuthConfig};
    use httpmock::prelude::*;
    use httpmock::Method::PATCH;
    use serde_json::json;

    fn service_for(server: &MockServer) -> DriveService {
        server.mock(|when, then| {
            when.method(POST).path("/token");
            then.status(200)
                .json_body(json!({"access_token": "tok", "expires_in": 3600}));
        });
        server.mock(|when, then| {
            when.method(GET).path("/sites/contoso.sharepoint.com:/sites/TI");
            then.status(200).json_body(json!({"id": "site-1"}));
        });
        server.mock(|when, then| {
            when.method(GET).path("/sites/site-1/drives");
            then.status(200).json_body(json!({
                "value": [
                    {"id": "d-outro", "name": "Outro"},
                    {"id": "d1", "name": "Documentos"}
                ]
            }));
        });

        let auth = GraphAuth::with_token_url(
            GraphAuthConfig {
                tenant_id: "t".to_string(),
                client_id: "c".to_string(),
                client_secret: "s".to_string(),
            },
            format!("{}/token", server.base_url()),
        )
        .unwrap();
        let client = GraphClient::with_base_url(auth, server.base_url()).unwrap();

        DriveService::new(
            client,
            DriveConfig {
                hostname: "contoso.sharepoint.com".to_string(),
                site_name: "TI".to_string(),
                drive_name_preferences: vec!["Documentos".to_string(), "Documents".to_string()],
            },
        )
    }

    #[test]
    fn test_encode_path() {
        assert_eq!(encode_path("2024/Camil"), "2024/Camil");
        assert_eq!(
            encode_path("2024/Quali It/100 - N A"),
            "2024/Quali%20It/100%20-%20N%20A"
        );
        assert_eq!(encode_path(""), "");
        assert_eq!(encode_path("//a//"), "a");
    }

    #[tokio::test]
    async fn test_drive_id_prefere_nome_configurado() {
        let server = MockServer::start();
        let service = service_for(&server);
        assert_eq!(service.drive_id().await.unwrap(), "d1");
        // chamadas subsequentes usam o cache
        assert_eq!(service.drive_id().await.unwrap(), "d1");
    }

    #[tokio::test]
    async fn test_get_folder_by_path_404_vira_none() {
        let server = MockServer::start();
        let service = service_for(&server);

        server.mock(|when, then| {
            when.method(GET).path("/drives/d1/root:/2024");
            then.status(404).json_body(
                json!({"error": {"code": "itemNotFound", "message": "not found"}}),
            );
        });

        assert!(service.get_folder_by_path("2024").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_ensure_folder_conflito_resolve_existente() {
        let server = MockServer::start();
        let service = service_for(&server);

        server.mock(|when, then| {
            when.method(POST).path("/drives/d1/items/p1/children");
            then.status(409).json_body(
                json!({"error": {"code": "nameAlreadyExists", "message": "exists"}}),
            );
        });
        server.mock(|when, then| {
            when.method(GET).path("/drives/d1/items/p1/children");
            then.status(200).json_body(json!({
                "value": [{"id": "f1", "name": "camil", "folder": {}}]
            }));
        });

        let outcome = service.ensure_folder("p1", "Camil").await.unwrap();
        match outcome {
            EnsureOutcome::Existing(item) => assert_eq!(item.id, "f1"),
            EnsureOutcome::Created(_) => panic!("deveria resolver a pasta existente"),
        }
    }

    #[tokio::test]
    async fn test_ensure_folder_path_cria_faltantes() {
        let server = MockServer::start();
        let service = service_for(&server);

        server.mock(|when, then| {
            when.method(GET).path("/drives/d1/root");
            then.status(200)
                .json_body(json!({"id": "root-1", "name": "root", "folder": {}}));
        });
        server.mock(|when, then| {
            when.method(GET).path("/drives/d1/root:/2024");
            then.status(404)
                .json_body(json!({"error": {"code": "itemNotFound", "message": "x"}}));
        });
        let create_year = server.mock(|when, then| {
            when.method(POST)
                .path("/drives/d1/items/root-1/children")
                .body_contains("\"2024\"");
            then.status(201)
                .json_body(json!({"id": "y1", "name": "2024", "folder": {}}));
        });
        server.mock(|when, then| {
            when.method(GET).path("/drives/d1/root:/2024/Camil");
            then.status(404)
                .json_body(json!({"error": {"code": "itemNotFound", "message": "x"}}));
        });
        let create_client = server.mock(|when, then| {
            when.method(POST)
                .path("/drives/d1/items/y1/children")
                .body_contains("\"Camil\"");
            then.status(201)
                .json_body(json!({"id": "c1", "name": "Camil", "folder": {}}));
        });

        let item = service.ensure_folder_path("2024/Camil").await.unwrap();
        create_year.assert();
        create_client.assert();
        assert_eq!(item.id, "c1");
    }

    #[tokio::test]
    async fn test_upload_simples_com_substituicao() {
        let server = MockServer::start();
        let service = service_for(&server);

        let upload = server.mock(|when, then| {
            when.method(PUT)
                .path("/drives/d1/items/p1:/ata.pdf:/content")
                .query_param("@microsoft.graph.conflictBehavior", "replace")
                .body("conteudo");
            then.status(201).json_body(
                json!({"id": "file-1", "name": "ata.pdf", "file": {}, "size": 8}),
            );
        });

        let item = service
            .upload_file("p1", "ata.pdf", b"conteudo".to_vec(), true)
            .await
            .unwrap();
        upload.assert();
        assert_eq!(item.id, "file-1");
    }

    #[tokio::test]
    async fn test_upload_grande_usa_sessao_em_trechos() {
        let server = MockServer::start();
        let service = service_for(&server);

        server.mock(|when, then| {
            when.method(POST)
                .path("/drives/d1/items/p1:/video.mp4:/createUploadSession");
            then.status(200)
                .json_body(json!({"uploadUrl": format!("{}/sessao-1", server.base_url())}));
        });
        let chunks = server.mock(|when, then| {
            when.method(PUT).path("/sessao-1").header_exists("Content-Range");
            then.status(201)
                .json_body(json!({"id": "file-2", "name": "video.mp4", "file": {}}));
        });

        // 5 MiB força dois trechos
        let content = vec![7u8; 5 * 1024 * 1024];
        let item = service
            .upload_file("p1", "video.mp4", content, true)
            .await
            .unwrap();

        chunks.assert_hits(2);
        assert_eq!(item.id, "file-2");
    }

    #[tokio::test]
    async fn test_move_item_conflito_vira_skip() {
        let server = MockServer::start();
        let service = service_for(&server);

        server.mock(|when, then| {
            when.method(PATCH).path("/drives/d1/items/i1");
            then.status(409).json_body(
                json!({"error": {"code": "nameAlreadyExists", "message": "exists"}}),
            );
        });

        let outcome = service.move_item("i1", "p2", "42 - N/A - Portal").await.unwrap();
        assert!(matches!(outcome, MoveOutcome::SkippedConflict));
    }

    #[tokio::test]
    async fn test_move_item_ok() {
        let server = MockServer::start();
        let service = service_for(&server);

        let patch = server.mock(|when, then| {
            when.method(PATCH)
                .path("/drives/d1/items/i1")
                .body_contains("\"p2\"");
            then.status(200)
                .json_body(json!({"id": "i1", "name": "novo", "folder": {}}));
        });

        let outcome = service.move_item("i1", "p2", "novo").await.unwrap();
        patch.assert();
        assert!(matches!(outcome, MoveOutcome::Moved(_)));
    }

    #[tokio::test]
    async fn test_create_sharing_link() {
        let server = MockServer::start();
        let service = service_for(&server);

        server.mock(|when, then| {
            when.method(POST)
                .path("/drives/d1/items/i1/createLink")
                .body_contains("organization");
            then.status(201).json_body(
                json!({"link": {"webUrl": "https://contoso.sharepoint.com/:f:/s/TI/abc"}}),
            );
        });

        let url = service.create_sharing_link("i1").await.unwrap();
        assert_eq!(url, "https://contoso.sharepoint.com/:f:/s/TI/abc");
    }

    #[tokio::test]
    async fn test_resolve_sharing_url() {
        let server = MockServer::start();
        let service = service_for(&server);

        let sharing_url = "https://contoso.sharepoint.com/:f:/s/TI/XyZ";
        let token = format!("u!{}", URL_SAFE_NO_PAD.encode(sharing_url));

        server.mock(|when, then| {
            when.method(GET).path(format!("/shares/{}/driveItem", token));
            then.status(200)
                .json_body(json!({"id": "shared-1", "name": "Origem", "folder": {}}));
        });

        let item = service.resolve_sharing_url(sharing_url).await.unwrap();
        assert_eq!(item.id, "shared-1");
    }

    #[tokio::test]
    async fn test_list_children_segue_paginacao() {
        let server = MockServer::start();
        let service = service_for(&server);

        server.mock(|when, then| {
            when.method(GET).path("/drives/d1/items/p1/children");
            then.status(200).json_body(json!({
                "value": [{"id": "a", "name": "a.pdf", "file": {}}],
                "@odata.nextLink": format!("{}/pagina-2", server.base_url())
            }));
        });
        server.mock(|when, then| {
            when.method(GET).path("/pagina-2");
            then.status(200).json_body(json!({
                "value": [{"id": "b", "name": "b.pdf", "file": {}}]
            }));
        });

        let children = service.list_children("p1").await.unwrap();
        assert_eq!(children.len(), 2);
        assert_eq!(children[1].id, "b");
    }

    #[tokio::test]
    async fn test_list_files_recursive() {
        let server = MockServer::start();
        let service = service_for(&server);

        server.mock(|when, then| {
            when.method(GET).path("/drives/d1/items/raiz/children");
            then.status(200).json_body(json!({
                "value": [
                    {"id": "f-a", "name": "a.pdf", "file": {}},
                    {"id": "sub-1", "name": "Atas", "folder": {}}
                ]
            }));
        });
        server.mock(|when, then| {
            when.method(GET).path("/drives/d1/items/sub-1/children");
            then.status(200).json_body(json!({
                "value": [{"id": "f-b", "name": "b.pdf", "file": {}}]
            }));
        });

        let mut files = service.list_files_recursive("raiz").await.unwrap();
        files.sort_by(|a, b| a.name.cmp(&b.name));

        assert_eq!(files.len(), 2);
        assert_eq!(files[0].folder, "");
        assert_eq!(files[1].folder, "Atas");
    }
}
