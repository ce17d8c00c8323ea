//! Relatório HTML por execução do pipeline.
//!
//! Cada execução gera um arquivo `report_{timestamp}.html` com uma linha por
//! Feature processada. A escrita do relatório é best-effort: falhas aqui são
//! logadas pelo chamador e nunca derrubam a execução.

use chrono::{DateTime, Utc};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Status consolidado de uma Feature no relatório.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowStatus {
    /// Todos os anexos sincronizados (ou nenhum a sincronizar).
    Success,
    /// Pasta garantida, mas parte dos anexos falhou.
    Partial,
    /// A Feature não pôde ser processada.
    Failed,
}

impl RowStatus {
    fn label(&self) -> &'static str {
        match self {
            RowStatus::Success => "OK",
            RowStatus::Partial => "Parcial",
            RowStatus::Failed => "Falha",
        }
    }

    fn css_class(&self) -> &'static str {
        match self {
            RowStatus::Success => "ok",
            RowStatus::Partial => "partial",
            RowStatus::Failed => "failed",
        }
    }
}

/// Uma linha do relatório: o resultado de uma Feature.
#[derive(Debug, Clone)]
pub struct ReportRow {
    pub feature_id: i64,
    pub client: String,
    pub title: String,
    pub proposal: String,
    pub folder_url: Option<String>,
    pub uploaded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub status: RowStatus,
    pub error: Option<String>,
}

/// Acumula os resultados de uma execução e materializa o HTML ao final.
#[derive(Debug)]
pub struct RunReport {
    started_at: DateTime<Utc>,
    rows: Vec<ReportRow>,
}

impl RunReport {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: ReportRow) {
        self.rows.push(row);
    }

    /// Substitui uma linha já registrada (usado pelo passe de retry).
    ///
    /// Índices fora do intervalo são ignorados.
    pub fn replace(&mut self, index: usize, row: ReportRow) {
        if let Some(slot) = self.rows.get_mut(index) {
            *slot = row;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn total(&self) -> usize {
        self.rows.len()
    }

    pub fn failed_count(&self) -> usize {
        self.rows
            .iter()
            .filter(|r| r.status == RowStatus::Failed)
            .count()
    }

    /// Gera o documento HTML completo do relatório.
    pub fn to_html(&self) -> String {
        let mut html = String::new();
        let _ = write!(
            html,
            "<!DOCTYPE html>\n<html lang=\"pt-BR\">\n<head>\n<meta charset=\"utf-8\">\n\
             <title>Sincronização DevOps → SharePoint</title>\n<style>\n\
             body {{ font-family: sans-serif; margin: 2em; }}\n\
             table {{ border-collapse: collapse; width: 100%; }}\n\
             th, td {{ border: 1px solid #ccc; padding: 6px 10px; text-align: left; }}\n\
             th {{ background: #f0f0f0; }}\n\
             tr.ok td.status {{ color: #1a7f37; }}\n\
             tr.partial td.status {{ color: #9a6700; }}\n\
             tr.failed td.status {{ color: #cf222e; }}\n\
             </style>\n</head>\n<body>\n"
        );
        let _ = write!(
            html,
            "<h1>Sincronização DevOps → SharePoint</h1>\n\
             <p>Execução iniciada em {} - {} Features, {} falhas</p>\n",
            self.started_at.format("%Y-%m-%d %H:%M:%S UTC"),
            self.total(),
            self.failed_count()
        );
        html.push_str(
            "<table>\n<tr><th>Feature</th><th>Cliente</th><th>Título</th><th>Proposta</th>\
             <th>Pasta</th><th>Enviados</th><th>Ignorados</th><th>Falhas</th>\
             <th>Status</th><th>Erro</th></tr>\n",
        );
        for row in &self.rows {
            let folder_cell = match &row.folder_url {
                Some(url) => format!(
                    "<a href=\"{}\">abrir</a>",
                    html_escape(url)
                ),
                None => "-".to_string(),
            };
            let _ = write!(
                html,
                "<tr class=\"{}\"><td>{}</td><td>{}</td><td>{}</td><td>{}</td>\
                 <td>{}</td><td>{}</td><td>{}</td><td>{}</td>\
                 <td class=\"status\">{}</td><td>{}</td></tr>\n",
                row.status.css_class(),
                row.feature_id,
                html_escape(&row.client),
                html_escape(&row.title),
                html_escape(&row.proposal),
                folder_cell,
                row.uploaded,
                row.skipped,
                row.failed,
                row.status.label(),
                html_escape(row.error.as_deref().unwrap_or("-")),
            );
        }
        html.push_str("</table>\n</body>\n</html>\n");
        html
    }

    /// Escreve o relatório em `dir` como `report_{timestamp}.html`.
    ///
    /// Cria o diretório se necessário e retorna o caminho do arquivo gerado.
    pub fn write_html(&self, dir: &Path) -> std::io::Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let file_name = format!("report_{}.html", self.started_at.format("%Y%m%d_%H%M%S"));
        let path = dir.join(file_name);
        std::fs::write(&path, self.to_html())?;
        Ok(path)
    }
}

impl Default for RunReport {
    fn default() -> Self {
        Self::new()
    }
}

/// Escapa os metacaracteres de HTML para uso seguro em células do relatório.
fn html_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
