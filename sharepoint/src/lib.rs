//! Cliente Microsoft Graph para drives do SharePoint
//!
//! Este crate cobre o subconjunto do Graph usado pela sincronização de
//! pastas de documentação:
//!
//! - Resolução de site e biblioteca de documentos (com lista de nomes
//!   preferidos, já que o nome da biblioteca varia por idioma do site)
//! - Criação idempotente de cadeias de pastas
//! - Upload de arquivos (simples até 4 MiB, sessão em trechos acima)
//! - Links de visualização com escopo da organização
//! - Movimentação com detecção de conflito de nome
//! - Resolução de URLs de compartilhamento e listagem recursiva
//!
//! # Autenticação
//!
//! Fluxo OAuth2 client-credentials (app-only) com cache de token em
//! memória. As credenciais NUNCA devem ser hardcoded: leia de variável de
//! ambiente ou configuração.
//!
//! # Exemplo Básico
//!
//! ```rust,ignore
//! use sharepoint::{DriveConfig, DriveService, GraphAuth, GraphAuthConfig, GraphClient};
//!
//! #[tokio::main]
//! async fn main() -> sharepoint::Result<()> {
//!     let auth = GraphAuth::new(GraphAuthConfig {
//!         tenant_id: std::env::var("SP_TENANT_ID").expect("SP_TENANT_ID não configurado"),
//!         client_id: std::env::var("SP_CLIENT_ID").expect("SP_CLIENT_ID não configurado"),
//!         client_secret: std::env::var("SP_CLIENT_SECRET").expect("SP_CLIENT_SECRET não configurado"),
//!     })?;
//!     let client = GraphClient::new(auth)?;
//!     let drive = DriveService::new(client, DriveConfig {
//!         hostname: "contoso.sharepoint.com".to_string(),
//!         site_name: "TI".to_string(),
//!         drive_name_preferences: vec!["Documentos".to_string(), "Documents".to_string()],
//!     });
//!
//!     let folder = drive.ensure_folder_path("2024/Camil").await?;
//!     println!("{}", folder.id);
//!
//!     Ok(())
//! }
//! ```

// Módulos públicos
pub mod auth;
pub mod client;
pub mod drive;
pub mod error;
pub mod types;

// Re-exports principais
pub use auth::{GraphAuth, GraphAuthConfig};
pub use client::GraphClient;
pub use drive::{DriveConfig, DriveService};
pub use error::{GraphError, Result};
pub use types::{DriveItem, EnsureOutcome, MoveOutcome, RemoteFile};
