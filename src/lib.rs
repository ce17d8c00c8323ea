// Biblioteca do middleware DevOps-SharePoint
// Expõe módulos para uso em testes e binários

pub mod config;
pub mod models;
pub mod services;
pub mod utils;

// AppState é definido aqui para ser compartilhado entre os handlers
pub struct AppState {
    pub settings: config::Settings,
    pub feature_service: services::FeatureFolderService,
}
