//! Marcador de última execução do pipeline incremental.
//!
//! O marcador é um arquivo texto com um único timestamp RFC 3339. Um arquivo
//! ausente ou ilegível significa "nunca executou" e força uma varredura completa.

use chrono::{DateTime, Utc};
use std::path::Path;

/// Lê o timestamp da última execução bem-sucedida.
///
/// Retorna `None` se o arquivo não existe ou se o conteúdo não é um
/// timestamp RFC 3339 válido (nesse caso loga um aviso).
pub fn read_last_run(path: &Path) -> Option<DateTime<Utc>> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(_) => return None,
    };

    match DateTime::parse_from_rfc3339(content.trim()) {
        Ok(ts) => Some(ts.with_timezone(&Utc)),
        Err(e) => {
            tracing::warn!(
                "⚠️ Marcador '{}' com conteúdo inválido ({}), assumindo varredura completa",
                path.display(),
                e
            );
            None
        }
    }
}

/// Grava o timestamp da execução atual em formato RFC 3339.
pub fn write_last_run(path: &Path, timestamp: DateTime<Utc>) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, timestamp.to_rfc3339())
}
