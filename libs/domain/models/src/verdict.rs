// [libs/domain/models/src/verdict.rs]
/*!
 * =================================================================
 * APARATO: VERDICT DOMAIN MODELS (V4.0 - SEALED OUTCOME)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: CONTRATO DEL VEREDICTO TERMINAL POR TRABAJO
 *
 * # Mathematical Proof (Reason Stability):
 * 'FailureReason' es un enum cerrado y estable: los consumidores pueden
 * testear contra sus variantes sin acoplarse a cadenas libres, las
 * cuales quedan reservadas exclusivamente para los logs.
 * =================================================================
 */

use serde::{Deserialize, Serialize};

use crate::artifact::ArtifactRef;
use crate::job::JobState;
use crate::stage::StageRecord;

/// Razón gruesa y estable de colapso de pipeline.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    FormatInvalid,
    ThreatsDetected,
    Adversarial,
    Timeout,
    Cancelled,
    StorageError,
    IntegrityError,
    Internal,
}

impl FailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::FormatInvalid => "format_invalid",
            FailureReason::ThreatsDetected => "threats_detected",
            FailureReason::Adversarial => "adversarial",
            FailureReason::Timeout => "timeout",
            FailureReason::Cancelled => "cancelled",
            FailureReason::StorageError => "storage_error",
            FailureReason::IntegrityError => "integrity_error",
            FailureReason::Internal => "internal",
        }
    }
}

/// Resultado estructurado del colaborador de análisis.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AnalysisResult {
    /// Registros de secuencia observados en el plaintext.
    pub record_count: usize,
    /// Bases totales acumuladas sobre todos los registros.
    pub total_bases: u64,
    /// Fracción GC global en [0, 1].
    pub gc_fraction: f64,
    /// Longitud media de secuencia por registro.
    pub mean_sequence_length: f64,
    /// Etiqueta de formato reportada por el colaborador.
    pub format_label: String,
}

/// Veredicto terminal inmutable de un trabajo de ingesta.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verdict {
    /// Estado terminal alcanzado (Completed | Failed | Cancelled).
    pub terminal_state: JobState,
    /// Rastro completo de etapas en orden de ejecución.
    pub stages: Vec<StageRecord>,
    /// Referencia de artefacto, presente sii 'persist' selló.
    pub artifact_ref: Option<ArtifactRef>,
    /// Resultado del colaborador de análisis cuando concluyó sin fallo.
    pub analysis_result: Option<AnalysisResult>,
    /// Verdadero cuando la etapa 'analyze' concluyó sin fallo.
    pub analysis_ok: bool,
    /// Puntaje acumulado del escáner IDS.
    pub ids_score: u32,
    /// Error de reconstrucción AML, ausente cuando la etapa fue omitida.
    pub aml_score: Option<f64>,
    /// Duración física total del pipeline.
    pub total_duration_ms: u64,
    /// Razón de colapso, ausente en trabajos completados.
    pub reason: Option<FailureReason>,
}
