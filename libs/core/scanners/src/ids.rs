// [libs/core/scanners/src/ids.rs]
/*!
 * =================================================================
 * APARATO: INTRUSION DETECTION SCANNER (V6.3 - SINGLE PASS AUTOMATON)
 * CLASIFICACIÓN: CORE COMPUTE (ESTRATO L1)
 * RESPONSABILIDAD: MULTI-COINCIDENCIA LITERAL CON SEVERIDAD PONDERADA
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. SINGLE AUTOMATON: Un autómata Aho-Corasick reconoce el set
 *    completo de patrones en una pasada; las coincidencias solapadas
 *    se reportan todas, sin consumo.
 * 2. CASE FOLDING ASCII: Normalización insensible a mayúsculas en la
 *    construcción y en el byte corriente; bytes no-ASCII comparan tal cual.
 * 3. FORENSIC ECONOMY: El detalle transporta conteos, categorías y
 *    offsets de muestra. Los bytes coincidentes jamás viajan.
 *
 * # Mathematical Proof (Linear Complexity):
 * La construcción del trie con función de fallo cuesta O(m) sobre la
 * longitud total de patrones; el escaneo cuesta O(n + z) con z
 * coincidencias. La memoria residente es un múltiplo pequeño de m.
 * =================================================================
 */

use aho_corasick::AhoCorasick;
use once_cell::sync::Lazy;

use helixgate_domain_models::IdsDetail;

/// Tope de offsets de muestra transportados en el detalle.
const SAMPLE_OFFSET_CAP: usize = 8;
/// Tope de categorías dominantes transportadas en el detalle.
const TOP_CATEGORY_CAP: usize = 4;

/// Severidad de un patrón, con su peso de puntaje.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn weight(&self) -> u32 {
        match self {
            Severity::Low => 1,
            Severity::Medium => 3,
            Severity::High => 6,
            Severity::Critical => 12,
        }
    }
}

/// Categoría táctica del patrón.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThreatCategory {
    Sql,
    Script,
    PathTraversal,
    Shell,
}

impl ThreatCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThreatCategory::Sql => "sql",
            ThreatCategory::Script => "script",
            ThreatCategory::PathTraversal => "path_traversal",
            ThreatCategory::Shell => "shell",
        }
    }
}

struct ThreatPattern {
    literal: &'static str,
    category: ThreatCategory,
    severity: Severity,
}

const fn pattern(
    literal: &'static str,
    category: ThreatCategory,
    severity: Severity,
) -> ThreatPattern {
    ThreatPattern { literal, category, severity }
}

/// Set fijo de patrones literales. Las expresiones regulares quedan
/// fuera de alcance por contrato.
static THREAT_PATTERNS: &[ThreatPattern] = &[
    // --- ESTRATO SQL ---
    pattern("drop table", ThreatCategory::Sql, Severity::Critical),
    pattern("union select", ThreatCategory::Sql, Severity::High),
    pattern("or 1=1", ThreatCategory::Sql, Severity::High),
    pattern("and 1=1", ThreatCategory::Sql, Severity::Medium),
    pattern(";--", ThreatCategory::Sql, Severity::Medium),
    pattern("--", ThreatCategory::Sql, Severity::Low),
    pattern("/*", ThreatCategory::Sql, Severity::Low),
    pattern("*/", ThreatCategory::Sql, Severity::Low),
    pattern("'", ThreatCategory::Sql, Severity::Low),
    pattern("\"", ThreatCategory::Sql, Severity::Low),
    pattern(";", ThreatCategory::Sql, Severity::Low),
    // --- ESTRATO SCRIPT/MARKUP ---
    pattern("<script", ThreatCategory::Script, Severity::Critical),
    pattern("javascript:", ThreatCategory::Script, Severity::High),
    pattern("onload=", ThreatCategory::Script, Severity::Medium),
    pattern("onerror=", ThreatCategory::Script, Severity::Medium),
    pattern("<iframe", ThreatCategory::Script, Severity::High),
    pattern("<embed", ThreatCategory::Script, Severity::Medium),
    // --- ESTRATO PATH TRAVERSAL ---
    pattern("../", ThreatCategory::PathTraversal, Severity::Medium),
    pattern("..\\", ThreatCategory::PathTraversal, Severity::Medium),
    pattern("/etc/passwd", ThreatCategory::PathTraversal, Severity::High),
    pattern("c:\\windows", ThreatCategory::PathTraversal, Severity::High),
    pattern("\\\\", ThreatCategory::PathTraversal, Severity::Low),
    // --- ESTRATO SHELL ---
    pattern("rm -rf", ThreatCategory::Shell, Severity::Critical),
    pattern("; rm ", ThreatCategory::Shell, Severity::High),
    pattern("&& rm ", ThreatCategory::Shell, Severity::High),
    pattern("| rm ", ThreatCategory::Shell, Severity::High),
    pattern("`", ThreatCategory::Shell, Severity::Low),
    pattern("$(", ThreatCategory::Shell, Severity::Medium),
];

/// Autómata compartido de proceso: solo lectura tras la construcción.
static THREAT_AUTOMATON: Lazy<AhoCorasick> = Lazy::new(|| {
    AhoCorasick::builder()
        .ascii_case_insensitive(true)
        .build(THREAT_PATTERNS.iter().map(|p| p.literal))
        .expect("FATAL: Threat automaton construction collapsed.")
});

/// Veredicto del escáner de intrusiones.
#[derive(Debug, Clone)]
pub struct IdsReport {
    pub passed: bool,
    pub detail: IdsDetail,
}

/// Escáner IDS configurado con umbral y techo de puntaje.
#[derive(Debug, Clone)]
pub struct IdsScanner {
    score_threshold: u32,
    score_ceiling: u32,
}

impl IdsScanner {
    pub fn new(score_threshold: u32, score_ceiling: u32) -> Self {
        Self { score_threshold, score_ceiling }
    }

    /**
     * Escanea el buffer completo y acumula severidades de toda
     * coincidencia (solapamientos incluidos).
     *
     * passed sii score ≤ umbral; con el umbral por defecto (5) la
     * entrada tolera hasta cinco coincidencias de severidad baja.
     */
    pub fn scan(&self, input_buffer: &[u8]) -> IdsReport {
        let mut accumulated_score: u64 = 0;
        let mut match_count = 0usize;
        let mut category_counts: [(ThreatCategory, usize); 4] = [
            (ThreatCategory::Sql, 0),
            (ThreatCategory::Script, 0),
            (ThreatCategory::PathTraversal, 0),
            (ThreatCategory::Shell, 0),
        ];
        let mut sample_offsets = Vec::with_capacity(SAMPLE_OFFSET_CAP);

        for matched in THREAT_AUTOMATON.find_overlapping_iter(input_buffer) {
            let pattern_record = &THREAT_PATTERNS[matched.pattern().as_usize()];

            match_count += 1;
            accumulated_score += u64::from(pattern_record.severity.weight());

            for slot in category_counts.iter_mut() {
                if slot.0 == pattern_record.category {
                    slot.1 += 1;
                }
            }

            if sample_offsets.len() < SAMPLE_OFFSET_CAP {
                sample_offsets.push(matched.start());
            }
        }

        let capped_score = accumulated_score.min(u64::from(self.score_ceiling)) as u32;

        let mut ranked_categories: Vec<(String, usize)> = category_counts
            .iter()
            .filter(|(_, count)| *count > 0)
            .map(|(category, count)| (category.as_str().to_string(), *count))
            .collect();
        ranked_categories.sort_by(|a, b| b.1.cmp(&a.1));
        ranked_categories.truncate(TOP_CATEGORY_CAP);

        IdsReport {
            passed: capped_score <= self.score_threshold,
            detail: IdsDetail {
                match_count,
                score: capped_score,
                threshold: self.score_threshold,
                top_categories: ranked_categories,
                sample_offsets,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn default_scanner() -> IdsScanner {
        IdsScanner::new(5, 100)
    }

    #[test]
    fn certify_clean_genomic_payload_scores_zero() {
        let report = default_scanner().scan(b">h1\nACGTACGTACGT\n");
        assert!(report.passed);
        assert_eq!(report.detail.score, 0);
        assert_eq!(report.detail.match_count, 0);
        assert!(report.detail.top_categories.is_empty());
    }

    #[test]
    fn certify_sql_injection_shape_detected() {
        // Escenario del Proving Grounds: cabecera hostil con carga SQL.
        let report = default_scanner().scan(b">h\nACGT\n>evil'; DROP TABLE users;--\nACGT\n");
        assert!(!report.passed);

        // ' + ; + drop table + ; + ;-- + -- como mínimo.
        assert!(report.detail.score > 5);
        assert!(report.detail.match_count >= 5);
        assert_eq!(report.detail.top_categories[0].0, "sql");
    }

    #[test]
    fn certify_case_insensitive_matching() {
        let lower = default_scanner().scan(b"drop table users");
        let upper = default_scanner().scan(b"DROP TABLE users");
        let mixed = default_scanner().scan(b"DrOp TaBlE users");
        assert_eq!(lower.detail.score, upper.detail.score);
        assert_eq!(lower.detail.score, mixed.detail.score);
        assert!(!mixed.passed);
    }

    #[test]
    fn certify_threshold_boundary_semantics() {
        let scanner = default_scanner();

        // Cinco delimitadores de severidad baja: score 5 == umbral -> pass.
        let at_threshold = scanner.scan(b"'''''");
        assert_eq!(at_threshold.detail.score, 5);
        assert!(at_threshold.passed);

        // Uno más: score 6 > umbral -> fail.
        let over_threshold = scanner.scan(b"''''''");
        assert_eq!(over_threshold.detail.score, 6);
        assert!(!over_threshold.passed);
    }

    #[test]
    fn certify_overlapping_matches_all_reported() {
        // ";--" contiene también ";" y "--": tres coincidencias solapadas.
        let report = default_scanner().scan(b";--");
        assert_eq!(report.detail.match_count, 3);
        // medium(3) + low(1) + low(1)
        assert_eq!(report.detail.score, 5);
    }

    #[test]
    fn certify_score_ceiling_caps_accumulation() {
        let hostile_burst = b"rm -rf ".repeat(50);
        let report = default_scanner().scan(&hostile_burst);
        assert_eq!(report.detail.score, 100);
        assert!(!report.passed);
    }

    #[test]
    fn certify_sample_offsets_bounded_and_in_range() {
        let hostile_burst = b"` ` ` ` ` ` ` ` ` ` ` `".to_vec();
        let report = default_scanner().scan(&hostile_burst);
        assert!(report.detail.sample_offsets.len() <= 8);
        for offset in &report.detail.sample_offsets {
            assert!(*offset < hostile_burst.len());
        }
    }

    #[test]
    fn certify_shell_and_traversal_categories() {
        let report = default_scanner().scan(b"$(cat /etc/passwd) && rm -rf ../secrets");
        assert!(!report.passed);
        let categories: Vec<&str> = report
            .detail
            .top_categories
            .iter()
            .map(|(label, _)| label.as_str())
            .collect();
        assert!(categories.contains(&"shell"));
        assert!(categories.contains(&"path_traversal"));
    }

    proptest! {
        /// Los offsets reportados siempre caen dentro de [0, n) y el
        /// puntaje jamás supera el techo, para cualquier entrada.
        #[test]
        fn certify_offset_and_ceiling_invariants(random_payload in proptest::collection::vec(any::<u8>(), 0..2048)) {
            let report = default_scanner().scan(&random_payload);
            prop_assert!(report.detail.score <= 100);
            for offset in &report.detail.sample_offsets {
                prop_assert!(*offset < random_payload.len());
            }
        }
    }
}
