// [libs/domain/pipeline/src/analyzer.rs]
/*!
 * =================================================================
 * APARATO: SEQUENCE ANALYSIS COLLABORATOR (V6.0 - EXTERNAL SEAM)
 * CLASIFICACIÓN: DOMAIN ENGINE (ESTRATO L2)
 * RESPONSABILIDAD: COSTURA HACIA EL COLABORADOR DE ANÁLISIS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. SEAM DISCIPLINE: El colaborador lee el plaintext una única vez y
 *    devuelve un resultado estructurado pequeño; sus colapsos son
 *    no-fatales para el pipeline.
 * 2. DEFAULT PROFILER: El perfilador de composición local cubre el
 *    despliegue sin colaborador externo configurado.
 * =================================================================
 */

use thiserror::Error;

use helixgate_domain_models::AnalysisResult;

#[derive(Error, Debug)]
pub enum AnalysisError {
    /// El colaborador no reconoce la estructura de la carga.
    #[error("[L2_ANALYZE_FAULT]: UNRECOGNIZED_PAYLOAD -> {0}")]
    Unrecognized(String),

    /// Colapso interno del colaborador.
    #[error("[L2_ANALYZE_FAULT]: COLLABORATOR_COLLAPSE -> {0}")]
    Internal(String),
}

/// Costura hacia el colaborador de análisis. El executor lo invoca una
/// única vez por trabajo, después de la persistencia.
pub trait SequenceAnalyzer: Send + Sync {
    fn analyze(&self, plaintext: &[u8]) -> Result<AnalysisResult, AnalysisError>;
}

/// Perfilador de composición por defecto: conteos de registros, bases
/// y fracción GC en una pasada.
#[derive(Debug, Clone, Default)]
pub struct CompositionProfiler;

impl SequenceAnalyzer for CompositionProfiler {
    fn analyze(&self, plaintext: &[u8]) -> Result<AnalysisResult, AnalysisError> {
        let first_meaningful_byte = plaintext
            .iter()
            .copied()
            .find(|byte| !byte.is_ascii_whitespace());

        let (format_label, is_fastq) = match first_meaningful_byte {
            Some(b'>') => ("fasta", false),
            Some(b'@') => ("fastq", true),
            _ => return Err(AnalysisError::Unrecognized("no_sequence_sentinel".into())),
        };

        let mut record_count = 0usize;
        let mut total_bases = 0u64;
        let mut gc_bases = 0u64;

        let meaningful_lines = plaintext
            .split(|byte| *byte == b'\n')
            .filter(|line| !line.iter().all(|byte| byte.is_ascii_whitespace()));

        for (line_index, line) in meaningful_lines.enumerate() {
            let is_sequence_line = if is_fastq {
                if line_index % 4 == 0 {
                    record_count += 1;
                }
                line_index % 4 == 1
            } else {
                if line.first() == Some(&b'>') {
                    record_count += 1;
                    false
                } else {
                    true
                }
            };

            if !is_sequence_line {
                continue;
            }

            for byte in line {
                match byte.to_ascii_uppercase() {
                    b'A' | b'T' => total_bases += 1,
                    b'G' | b'C' => {
                        total_bases += 1;
                        gc_bases += 1;
                    }
                    _ => {}
                }
            }
        }

        if record_count == 0 {
            return Err(AnalysisError::Unrecognized("no_records".into()));
        }

        Ok(AnalysisResult {
            record_count,
            total_bases,
            gc_fraction: if total_bases > 0 {
                gc_bases as f64 / total_bases as f64
            } else {
                0.0
            },
            mean_sequence_length: total_bases as f64 / record_count as f64,
            format_label: format_label.to_string(),
        })
    }
}
