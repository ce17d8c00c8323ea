//! Normalização de nomes para as pastas de documentação
//!
//! Este módulo concentra as regras de nome usadas em toda a sincronização:
//! nome de cliente (derivado do area path), título sanitizado, nome
//! canônico de pasta de Feature (`{id} - {proposta|N/A} - {título}`),
//! nomes de anexo e a camada extra de restrições do SharePoint.
//!
//! Todas as funções são puras; a mesma entrada produz sempre a mesma saída.

use once_cell::sync::Lazy;
use regex::Regex;

/// Placeholder para cliente ausente ou vazio
pub const EMPTY_CLIENT_PLACEHOLDER: &str = "Sem Cliente";

/// Placeholder para título ausente ou vazio
pub const EMPTY_TITLE_PLACEHOLDER: &str = "Sem título";

/// Placeholder para Feature sem número de proposta
pub const NO_PROPOSAL_PLACEHOLDER: &str = "N/A";

/// Comprimento máximo (em caracteres) do título dentro do nome canônico
pub const MAX_TITLE_LENGTH: usize = 200;

/// Comprimento máximo (em caracteres) de um nome de anexo
pub const MAX_ATTACHMENT_NAME_LENGTH: usize = 200;

/// Comprimento máximo de um segmento de pasta no SharePoint
const MAX_REMOTE_SEGMENT_LENGTH: usize = 400;

/// Caracteres que o SharePoint rejeita em nomes de pasta e arquivo
const FORBIDDEN_CHARS: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Número de proposta: 5 dígitos, hífen, 2 dígitos (ex: `25288-01`)
pub static PROPOSAL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{5}-\d{2}").unwrap());

static PROPOSAL_FULL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{5}-\d{2}$").unwrap());

static PROPOSAL_PADDED_FULL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^0\d{5}-\d{2}$").unwrap());

/// Nome canônico de pasta de Feature. Aceita `n/a` em qualquer caixa, a
/// forma remota `N A` (a barra é proibida no drive e vira espaço) e a
/// proposta com zero à esquerda, já que o campo upstream guarda as duas.
static CANONICAL_FOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\d+ - (0?\d{5}-\d{2}|N[/ ]A) - .+$").unwrap());

/// Pasta de ano do intervalo suportado (2010-2029)
static YEAR_FOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(201[0-9]|202[0-9])$").unwrap());

/// Nome que começa com id numérico seguido de espaço ou hífen
static LEADING_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+[\s-]").unwrap());

fn is_forbidden(c: char) -> bool {
    FORBIDDEN_CHARS.contains(&c)
}

/// Normaliza um nome de cliente para uso como segmento de pasta
///
/// Remove caracteres proibidos, colapsa espaços e aplica capitalização por
/// palavra (primeira letra maiúscula, restante minúsculo), de modo que
/// `"CAMIL"`, `"camil"` e `" Camil "` convergem para `"Camil"`.
///
/// # Exemplos
/// ```
/// use devops_sharepoint_middleware::utils::naming::normalize_client_name;
///
/// assert_eq!(normalize_client_name("CAMIL"), "Camil");
/// assert_eq!(normalize_client_name("  quali   it  "), "Quali It");
/// assert_eq!(normalize_client_name(""), "Sem Cliente");
/// ```
pub fn normalize_client_name(raw: &str) -> String {
    let cleaned: String = raw
        .trim()
        .chars()
        .map(|c| if is_forbidden(c) { ' ' } else { c })
        .collect();

    let joined = cleaned
        .split_whitespace()
        .map(capitalize_word)
        .collect::<Vec<_>>()
        .join(" ");

    if joined.is_empty() {
        EMPTY_CLIENT_PLACEHOLDER.to_string()
    } else {
        joined
    }
}

/// Primeira letra maiúscula, restante minúsculo
fn capitalize_word(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.as_str().to_lowercase().chars())
            .collect(),
        None => String::new(),
    }
}

/// Sanitiza um texto para uso como nome de pasta
///
/// Caracteres proibidos viram espaço, espaços consecutivos colapsam e o
/// resultado é truncado em `max_length` caracteres com reticências.
/// Entrada vazia devolve string vazia; o placeholder é decisão do chamador.
pub fn sanitize_folder_name(raw: &str, max_length: usize) -> String {
    let cleaned: String = raw
        .trim()
        .chars()
        .map(|c| if is_forbidden(c) { ' ' } else { c })
        .collect();

    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    truncate_chars_with_ellipsis(&collapsed, max_length)
}

/// Trunca por contagem de caracteres, preservando limites UTF-8 e
/// acrescentando reticências
fn truncate_chars_with_ellipsis(s: &str, max_length: usize) -> String {
    if s.chars().count() <= max_length {
        return s.to_string();
    }
    if max_length <= 3 {
        return s.chars().take(max_length).collect();
    }
    let cut: String = s.chars().take(max_length - 3).collect();
    format!("{}...", cut.trim_end())
}

/// Sanitiza um nome de arquivo de anexo
///
/// Remove prefixos de caminho (ambas as convenções de separador), troca
/// caracteres proibidos e NUL por `_`, colapsa espaços e trunca preservando
/// a extensão. Entrada vazia devolve `"attachment"`.
pub fn sanitize_attachment_filename(raw: &str) -> String {
    // o nome declarado pode vir com caminho completo da máquina de origem
    let base = raw
        .rsplit(|c| c == '\\' || c == '/')
        .next()
        .unwrap_or(raw);

    let cleaned: String = base
        .trim()
        .chars()
        .map(|c| {
            if is_forbidden(c) || c == '\0' {
                '_'
            } else {
                c
            }
        })
        .collect();

    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.is_empty() {
        return "attachment".to_string();
    }

    if collapsed.chars().count() <= MAX_ATTACHMENT_NAME_LENGTH {
        return collapsed;
    }

    match collapsed.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => {
            let ext = format!(".{}", ext);
            let keep = MAX_ATTACHMENT_NAME_LENGTH.saturating_sub(ext.chars().count() + 1);
            let cut: String = stem.chars().take(keep).collect();
            format!("{}{}", cut.trim_end_matches(|c| c == '.' || c == '_'), ext)
        }
        _ => collapsed.chars().take(MAX_ATTACHMENT_NAME_LENGTH).collect(),
    }
}

/// Aplica as restrições extras do SharePoint a um segmento de pasta
///
/// Além da sanitização padrão: remove pontos e espaços finais (rejeitados
/// pela API) e acrescenta `_` a nomes de dispositivo reservados do Windows
/// (`CON`, `PRN`, `AUX`, `NUL`, `COM1`-`COM9`, `LPT1`-`LPT9`).
pub fn sanitize_folder_name_for_sharepoint(raw: &str) -> String {
    let sanitized = sanitize_folder_name(raw, MAX_REMOTE_SEGMENT_LENGTH);
    let trimmed = sanitized.trim_end_matches(|c| c == ' ' || c == '.');

    if trimmed.is_empty() {
        return "_".to_string();
    }

    if is_reserved_device_name(trimmed) {
        format!("{}_", trimmed)
    } else {
        trimmed.to_string()
    }
}

/// Nomes de dispositivo reservados, comparados sem distinção de caixa
fn is_reserved_device_name(name: &str) -> bool {
    let upper = name.to_ascii_uppercase();
    if matches!(upper.as_str(), "CON" | "PRN" | "AUX" | "NUL") {
        return true;
    }
    if let Some(rest) = upper.strip_prefix("COM").or_else(|| upper.strip_prefix("LPT")) {
        return rest.len() == 1 && rest.chars().all(|c| ('1'..='9').contains(&c));
    }
    false
}

/// Monta o nome canônico da pasta de uma Feature
///
/// Formato `{id} - {proposta|N/A} - {título sanitizado}`. Quando o título
/// já contém o mesmo número de proposta que será inserido, a ocorrência é
/// removida para o número não aparecer duas vezes.
///
/// # Exemplos
/// ```
/// use devops_sharepoint_middleware::utils::naming::build_feature_folder_name;
///
/// assert_eq!(
///     build_feature_folder_name(42, None, "Relatórios"),
///     "42 - N/A - Relatórios"
/// );
/// assert_eq!(
///     build_feature_folder_name(10, Some("01234-56"), "01234-56 Corrigir bug"),
///     "10 - 01234-56 - Corrigir bug"
/// );
/// ```
pub fn build_feature_folder_name(id: i64, proposal: Option<&str>, title: &str) -> String {
    let proposal_clean = proposal.map(str::trim).filter(|p| !p.is_empty());
    let prop = proposal_clean.unwrap_or(NO_PROPOSAL_PLACEHOLDER);

    let title_base = match proposal_clean {
        Some(p) if PROPOSAL_FULL.is_match(p) => strip_proposal_occurrence(title, p),
        _ => title.to_string(),
    };

    let mut sanitized_title = sanitize_folder_name(&title_base, MAX_TITLE_LENGTH);
    if sanitized_title.is_empty() {
        sanitized_title = EMPTY_TITLE_PLACEHOLDER.to_string();
    }

    format!("{} - {} - {}", id, prop, sanitized_title)
}

/// Remove do título uma ocorrência exata do número de proposta, junto com
/// os separadores adjacentes
///
/// Ocorrências coladas a outros dígitos (ex: `01234-567`) não contam como
/// o mesmo número e ficam intactas.
fn strip_proposal_occurrence(title: &str, proposal: &str) -> String {
    let Some(pos) = title.find(proposal) else {
        return title.to_string();
    };
    let end = pos + proposal.len();

    let before_ok = title[..pos]
        .chars()
        .last()
        .map(|c| !c.is_ascii_digit())
        .unwrap_or(true);
    let after_ok = title[end..]
        .chars()
        .next()
        .map(|c| !c.is_ascii_digit())
        .unwrap_or(true);
    if !before_ok || !after_ok {
        return title.to_string();
    }

    let head = title[..pos].trim_end_matches(|c: char| c.is_whitespace() || c == '-');
    let tail = title[end..].trim_start_matches(|c: char| c.is_whitespace() || c == '-');

    if head.is_empty() {
        tail.to_string()
    } else if tail.is_empty() {
        head.to_string()
    } else {
        format!("{} {}", head, tail)
    }
}

/// Verifica se um nome segue o padrão canônico de pasta de Feature
pub fn is_canonical_feature_folder_name(name: &str) -> bool {
    CANONICAL_FOLDER.is_match(name)
}

/// Encontra o primeiro número de proposta dentro de um texto
pub fn find_proposal_in_text(text: &str) -> Option<&str> {
    PROPOSAL_PATTERN.find(text).map(|m| m.as_str())
}

/// Variante de preenchimento de um número de proposta
///
/// O campo upstream ora guarda o prefixo com 5 dígitos, ora com 6 (zero à
/// esquerda); a variante permite consultar as duas formas.
pub fn proposal_padding_variant(value: &str) -> Option<String> {
    let v = value.trim();
    if PROPOSAL_FULL.is_match(v) {
        Some(format!("0{}", v))
    } else if PROPOSAL_PADDED_FULL.is_match(v) {
        Some(v[1..].to_string())
    } else {
        None
    }
}

/// Verifica se um nome é pasta de ano (`2010`-`2029`) ou o bucket de
/// fallback configurado
pub fn is_year_folder_name(name: &str, fallback_bucket: &str) -> bool {
    YEAR_FOLDER.is_match(name) || name == fallback_bucket
}

/// Heurística de pasta com cara de Feature
///
/// Nome com pelo menos 5 caracteres que contém um número de proposta ou
/// começa com um id numérico seguido de espaço/hífen.
pub fn looks_like_feature_folder(name: &str) -> bool {
    let n = name.trim();
    if n.chars().count() < 5 {
        return false;
    }
    PROPOSAL_PATTERN.is_match(n) || LEADING_ID.is_match(n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_client_name_equivalencia_caixa_e_espacos() {
        assert_eq!(normalize_client_name("CAMIL"), "Camil");
        assert_eq!(normalize_client_name("camil"), "Camil");
        assert_eq!(normalize_client_name("  Camil  "), "Camil");
        assert_eq!(normalize_client_name("quali   it"), "Quali It");
        assert_eq!(normalize_client_name("QUALI IT"), "Quali It");
    }

    #[test]
    fn test_normalize_client_name_placeholder() {
        assert_eq!(normalize_client_name(""), "Sem Cliente");
        assert_eq!(normalize_client_name("   "), "Sem Cliente");
        // só caracteres proibidos também colapsa para o placeholder
        assert_eq!(normalize_client_name("///"), "Sem Cliente");
    }

    #[test]
    fn test_normalize_client_name_remove_proibidos() {
        let result = normalize_client_name("Cliente/Filial:Sul");
        assert_eq!(result, "Cliente Filial Sul");
        for c in ['\\', '/', ':', '*', '?', '"', '<', '>', '|'] {
            assert!(!result.contains(c));
        }
    }

    #[test]
    fn test_sanitize_folder_name_basico() {
        assert_eq!(sanitize_folder_name("Relatório: Q1/Q2", 100), "Relatório Q1 Q2");
        assert_eq!(sanitize_folder_name("   ", 100), "");
        assert_eq!(sanitize_folder_name("a  b   c", 100), "a b c");
    }

    #[test]
    fn test_sanitize_folder_name_trunca_com_reticencias() {
        let long = "x".repeat(250);
        let result = sanitize_folder_name(&long, 200);
        assert_eq!(result.chars().count(), 200);
        assert!(result.ends_with("..."));

        // título multibyte não quebra no meio do caractere
        let acentuado = "ã".repeat(250);
        let result = sanitize_folder_name(&acentuado, 200);
        assert_eq!(result.chars().count(), 200);
        assert!(result.ends_with("..."));
    }

    #[test]
    fn test_sanitize_attachment_filename_caminhos_e_proibidos() {
        assert_eq!(
            sanitize_attachment_filename(r"C:\Users\ana\Desktop\ata.pdf"),
            "ata.pdf"
        );
        assert_eq!(sanitize_attachment_filename("/tmp/upload/nota.txt"), "nota.txt");
        assert_eq!(sanitize_attachment_filename("rel*atório?.pdf"), "rel_atório_.pdf");
        assert_eq!(sanitize_attachment_filename(""), "attachment");
        assert_eq!(sanitize_attachment_filename("docs/"), "attachment");
    }

    #[test]
    fn test_sanitize_attachment_filename_preserva_extensao() {
        let long = format!("{}.pdf", "a".repeat(300));
        let result = sanitize_attachment_filename(&long);
        assert!(result.ends_with(".pdf"));
        assert!(result.chars().count() <= 200);

        let sem_ext = "b".repeat(300);
        let result = sanitize_attachment_filename(&sem_ext);
        assert_eq!(result.chars().count(), 200);
    }

    #[test]
    fn test_sanitize_for_sharepoint_pontos_e_espacos_finais() {
        assert_eq!(sanitize_folder_name_for_sharepoint("Relatórios..."), "Relatórios");
        assert_eq!(sanitize_folder_name_for_sharepoint("Encerrado. "), "Encerrado");
        assert_eq!(sanitize_folder_name_for_sharepoint("..."), "_");
    }

    #[test]
    fn test_sanitize_for_sharepoint_nomes_reservados() {
        assert_eq!(sanitize_folder_name_for_sharepoint("CON"), "CON_");
        assert_eq!(sanitize_folder_name_for_sharepoint("con"), "con_");
        assert_eq!(sanitize_folder_name_for_sharepoint("COM7"), "COM7_");
        assert_eq!(sanitize_folder_name_for_sharepoint("LPT1"), "LPT1_");
        // não-reservados ficam como estão
        assert_eq!(sanitize_folder_name_for_sharepoint("COM10"), "COM10");
        assert_eq!(sanitize_folder_name_for_sharepoint("CONSModular"), "CONSModular");
    }

    #[test]
    fn test_build_feature_folder_name_composicao() {
        assert_eq!(
            build_feature_folder_name(100, Some("P001"), "Minha Feature"),
            "100 - P001 - Minha Feature"
        );
        assert_eq!(
            build_feature_folder_name(42, None, "Relatórios"),
            "42 - N/A - Relatórios"
        );
        assert_eq!(build_feature_folder_name(42, Some("  "), ""), "42 - N/A - Sem título");
    }

    #[test]
    fn test_build_feature_folder_name_deduplica_proposta_do_titulo() {
        let name = build_feature_folder_name(10, Some("01234-56"), "01234-56 Corrigir bug");
        assert_eq!(name, "10 - 01234-56 - Corrigir bug");
        assert_eq!(name.matches("01234-56").count(), 1);

        // ocorrência no meio do título, com separadores
        assert_eq!(
            build_feature_folder_name(11, Some("01234-56"), "Projeto 01234-56 - ajuste"),
            "11 - 01234-56 - Projeto ajuste"
        );

        // número diferente não é removido
        assert_eq!(
            build_feature_folder_name(12, Some("01234-56"), "99999-01 outro"),
            "12 - 01234-56 - 99999-01 outro"
        );

        // dígito colado não conta como a mesma proposta
        assert_eq!(
            build_feature_folder_name(13, Some("01234-56"), "Caso 01234-567"),
            "13 - 01234-56 - Caso 01234-567"
        );
    }

    #[test]
    fn test_is_canonical_feature_folder_name() {
        assert!(is_canonical_feature_folder_name("123 - 25288-01 - Portal"));
        assert!(is_canonical_feature_folder_name("14796 - 025539-01 - Validação"));
        assert!(is_canonical_feature_folder_name("7 - N/A - Fase 2"));
        assert!(is_canonical_feature_folder_name("7 - N A - Fase 2"));
        assert!(is_canonical_feature_folder_name("7 - n/a - minúsculo"));
        assert!(!is_canonical_feature_folder_name("Ano 2024"));
        assert!(!is_canonical_feature_folder_name("Cliente X"));
        assert!(!is_canonical_feature_folder_name("12345"));
        assert!(!is_canonical_feature_folder_name("123 - ABC - Portal"));
    }

    #[test]
    fn test_nome_construido_e_canonico() {
        // proposta ausente ou no padrão produz sempre nome canônico
        for (id, prop, title) in [
            (1i64, None, ""),
            (999, Some("25288-01"), "Integração"),
            (14796, Some("025539-01"), "Validação de processo"),
            (42, None, "Portal: do/Cliente"),
        ] {
            let name = build_feature_folder_name(id, prop, title);
            assert!(
                is_canonical_feature_folder_name(&name),
                "nome não-canônico: {}",
                name
            );

            // a forma que chega ao drive também precisa passar na auditoria
            let remote = sanitize_folder_name_for_sharepoint(&name);
            assert!(
                is_canonical_feature_folder_name(&remote),
                "forma remota não-canônica: {}",
                remote
            );
        }
    }

    #[test]
    fn test_proposal_padding_variant() {
        assert_eq!(proposal_padding_variant("25288-01").as_deref(), Some("025288-01"));
        assert_eq!(proposal_padding_variant("025288-01").as_deref(), Some("25288-01"));
        assert_eq!(proposal_padding_variant("1234-56"), None);
        assert_eq!(proposal_padding_variant("P001"), None);
    }

    #[test]
    fn test_find_proposal_in_text() {
        assert_eq!(find_proposal_in_text("16526 - 025571-02 - Arteb"), Some("25571-02"));
        assert_eq!(find_proposal_in_text("sem proposta"), None);
    }

    #[test]
    fn test_is_year_folder_name() {
        assert!(is_year_folder_name("2024", "2020-2023"));
        assert!(is_year_folder_name("2010", "2020-2023"));
        assert!(is_year_folder_name("2029", "2020-2023"));
        assert!(is_year_folder_name("2020-2023", "2020-2023"));
        assert!(!is_year_folder_name("2009", "2020-2023"));
        assert!(!is_year_folder_name("2030", "2020-2023"));
        assert!(!is_year_folder_name("Camil", "2020-2023"));
    }

    #[test]
    fn test_looks_like_feature_folder() {
        assert!(looks_like_feature_folder("16526 - 025571-02 - Arteb"));
        assert!(looks_like_feature_folder("123 - Portal"));
        assert!(looks_like_feature_folder("25288-01 legado"));
        assert!(!looks_like_feature_folder("Camil"));
        assert!(!looks_like_feature_folder("12"));
        assert!(!looks_like_feature_folder("Relatórios"));
    }
}
