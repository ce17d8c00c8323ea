//! Cliente da API REST do Azure DevOps
//!
//! Este crate cobre o subconjunto de `wit/*` usado pela sincronização de
//! pastas de documentação:
//!
//! - Busca de work items por id (individual e em lote, com relações)
//! - Consultas WIQL: listagem de Features, busca por número de proposta,
//!   busca por trecho de título
//! - Download de anexos com resolução de nome de arquivo
//! - Escrita do link de documentação via JSON-patch
//!
//! # Autenticação
//!
//! Personal Access Token via Basic auth (usuário vazio, PAT como senha),
//! exatamente como o serviço espera. O token NUNCA deve ser hardcoded:
//! leia de variável de ambiente ou configuração.
//!
//! # Exemplo Básico
//!
//! ```rust,ignore
//! use devops::{DevOpsClient, WorkItemFieldConfig, WorkItemManager};
//!
//! #[tokio::main]
//! async fn main() -> devops::Result<()> {
//!     let pat = std::env::var("DEVOPS_PAT").expect("DEVOPS_PAT não configurado");
//!     let client = DevOpsClient::new("https://dev.azure.com", "minha-org", "MeuProjeto", pat)?;
//!     let manager = WorkItemManager::new(client, WorkItemFieldConfig {
//!         area_root: "MeuProjeto".to_string(),
//!         proposal_field: "Custom.NumeroProposta".to_string(),
//!         link_field: "Custom.LinkPastaDocumentacao".to_string(),
//!     });
//!
//!     if let Some(item) = manager.get_work_item(1234).await? {
//!         println!("{:?}", item.title());
//!     }
//!
//!     Ok(())
//! }
//! ```

// Módulos públicos
pub mod client;
pub mod error;
pub mod types;
pub mod work_items;

// Re-exports principais
pub use client::DevOpsClient;
pub use error::{DevOpsError, Result};
pub use types::{
    AttachmentRef, DownloadedAttachment, FeatureListFilter, LinkUpdate, WorkItem,
};
pub use work_items::{WorkItemFieldConfig, WorkItemManager};
