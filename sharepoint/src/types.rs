//! Tipos de dados da API do Microsoft Graph (drives)

use serde::Deserialize;

/// Item de drive (arquivo ou pasta)
#[derive(Debug, Clone, Deserialize)]
pub struct DriveItem {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "webUrl")]
    pub web_url: Option<String>,
    #[serde(default)]
    pub size: Option<i64>,
    #[serde(default)]
    pub folder: Option<FolderFacet>,
    #[serde(default)]
    pub file: Option<FileFacet>,
    #[serde(default, rename = "parentReference")]
    pub parent_reference: Option<ParentReference>,
}

impl DriveItem {
    /// Item é uma pasta
    pub fn is_folder(&self) -> bool {
        self.folder.is_some()
    }

    /// Item é um arquivo
    pub fn is_file(&self) -> bool {
        self.file.is_some()
    }
}

/// Facet de pasta
#[derive(Debug, Clone, Deserialize)]
pub struct FolderFacet {
    #[serde(default, rename = "childCount")]
    pub child_count: Option<i64>,
}

/// Facet de arquivo
#[derive(Debug, Clone, Deserialize)]
pub struct FileFacet {
    #[serde(default, rename = "mimeType")]
    pub mime_type: Option<String>,
}

/// Referência ao pai de um item
#[derive(Debug, Clone, Deserialize)]
pub struct ParentReference {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, rename = "driveId")]
    pub drive_id: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
}

/// Página de listagem de itens
#[derive(Debug, Deserialize)]
pub struct DriveItemPage {
    #[serde(default)]
    pub value: Vec<DriveItem>,
    #[serde(default, rename = "@odata.nextLink")]
    pub next_link: Option<String>,
}

/// Site do SharePoint
#[derive(Debug, Deserialize)]
pub struct Site {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Drive (biblioteca de documentos)
#[derive(Debug, Clone, Deserialize)]
pub struct Drive {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Lista de drives de um site
#[derive(Debug, Deserialize)]
pub struct DriveList {
    #[serde(default)]
    pub value: Vec<Drive>,
}

/// Resposta do endpoint de token OAuth2
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// Resposta de criação de link de compartilhamento
#[derive(Debug, Deserialize)]
pub struct SharingLinkResponse {
    pub link: SharingLink,
}

/// Link de compartilhamento
#[derive(Debug, Deserialize)]
pub struct SharingLink {
    #[serde(rename = "webUrl")]
    pub web_url: String,
}

/// Resposta de criação de sessão de upload
#[derive(Debug, Deserialize)]
pub struct UploadSession {
    #[serde(rename = "uploadUrl")]
    pub upload_url: String,
}

/// Resultado de garantir a existência de uma pasta
#[derive(Debug, Clone)]
pub enum EnsureOutcome {
    /// Pasta criada nesta chamada
    Created(DriveItem),
    /// Pasta já existia (inclusive quando detectada por corrida de criação)
    Existing(DriveItem),
}

impl EnsureOutcome {
    /// Item da pasta, criado ou preexistente
    pub fn item(&self) -> &DriveItem {
        match self {
            EnsureOutcome::Created(item) | EnsureOutcome::Existing(item) => item,
        }
    }

    /// Consome o resultado devolvendo o item
    pub fn into_item(self) -> DriveItem {
        match self {
            EnsureOutcome::Created(item) | EnsureOutcome::Existing(item) => item,
        }
    }
}

/// Resultado de mover um item
#[derive(Debug, Clone)]
pub enum MoveOutcome {
    /// Item movido (e possivelmente renomeado)
    Moved(DriveItem),
    /// Destino já tinha item com o mesmo nome; nada foi feito
    SkippedConflict,
}

/// Arquivo encontrado em listagem recursiva
///
/// `folder` é o caminho relativo à pasta de partida, sem o nome do arquivo
/// (vazio para arquivos na raiz da listagem).
#[derive(Debug, Clone)]
pub struct RemoteFile {
    pub id: String,
    pub name: String,
    pub folder: String,
}
