// [libs/domain/models/src/job.rs]
/*!
 * =================================================================
 * APARATO: JOB DOMAIN MODELS (V4.0 - PRODUCTION MASTER)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: DEFINICIÓN DE CONTRATOS SOBERANOS DE TRABAJO
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. STATE MACHINE PURITY: La legalidad de transiciones vive junto al
 *    enum de estados, de modo que el Registro solo necesita consultar
 *    'is_legal_transition' para sellar su CAS.
 * 2. SNAPSHOT DISCIPLINE: 'JobView' es una copia inmutable y completa,
 *    segura para múltiples lectores concurrentes.
 * 3. NOMINAL PRECISION: Nomenclatura nominal absoluta en todos los campos.
 *
 * # Mathematical Proof (Terminal Immutability):
 * Un estado terminal no posee transiciones salientes excepto hacia
 * 'RetainedDeleted', y 'RetainedDeleted' no posee ninguna. Por inducción
 * sobre la tabla de legalidad, ningún historial de operaciones puede
 * resucitar un trabajo sellado.
 * =================================================================
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::artifact::ArtifactRef;
use crate::stage::StageRecord;
use crate::verdict::Verdict;

/// Estados del ciclo de vida de un trabajo de ingesta.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Admitido y en cola FIFO, a la espera de un worker.
    Queued,
    /// Un worker ejecuta el bucle de etapas en este instante.
    Running,
    /// Todas las etapas fatales superadas; veredicto disponible.
    Completed,
    /// Una etapa fatal colapsó; veredicto disponible con razón.
    Failed,
    /// El operador disparó la señal de cancelación antes del sellado.
    Cancelled,
    /// Retención expirada: artefacto borrado con prueba emitida.
    RetainedDeleted,
}

impl JobState {
    /// Un estado terminal nunca vuelve a mutar (el registro puede podarlo).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Completed | JobState::Failed | JobState::Cancelled | JobState::RetainedDeleted
        )
    }

    /// Tabla de legalidad soberana del autómata de estados.
    ///
    /// Transiciones admitidas:
    /// - `Queued -> Running`
    /// - `Running -> {Completed, Failed, Cancelled}`
    /// - `{Completed, Failed, Cancelled} -> RetainedDeleted`
    pub fn is_legal_transition(from: JobState, to: JobState) -> bool {
        matches!(
            (from, to),
            (JobState::Queued, JobState::Running)
                | (JobState::Running, JobState::Completed)
                | (JobState::Running, JobState::Failed)
                | (JobState::Running, JobState::Cancelled)
                | (JobState::Completed, JobState::RetainedDeleted)
                | (JobState::Failed, JobState::RetainedDeleted)
                | (JobState::Cancelled, JobState::RetainedDeleted)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Queued => "queued",
            JobState::Running => "running",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
            JobState::Cancelled => "cancelled",
            JobState::RetainedDeleted => "retained_deleted",
        }
    }
}

/**
 * Registro maestro de un trabajo de ingesta. Propiedad exclusiva del
 * Registro de Trabajos; el executor es el único escritor mientras el
 * estado sea 'Running'.
 */
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Identificador único universal (UUID v4) usado en URLs y metadatos.
    pub id: String,
    /// Etiqueta suministrada por el cliente. Texto NO confiable, almacenado verbatim.
    pub filename: String,
    /// Tamaño declarado del payload en bytes.
    pub declared_size_bytes: u64,
    /// Marca de recepción con precisión de milisegundos.
    pub received_at: DateTime<Utc>,
    /// Sellada únicamente cuando el estado es terminal de pipeline.
    pub completed_at: Option<DateTime<Utc>>,
    /// Sellada únicamente cuando existe prueba de borrado del artefacto.
    pub deletion_at: Option<DateTime<Utc>>,
    /// Estado vigente del autómata.
    pub state: JobState,
    /// Índice de la etapa en ejecución. Avanza de forma monótona.
    pub stage_cursor: usize,
    /// Rastro ordenado de etapas ejecutadas.
    pub stage_records: Vec<StageRecord>,
    /// Veredicto terminal, presente cuando state ∈ {Completed, Failed, Cancelled}.
    pub verdict: Option<Verdict>,
    /// Referencia al Object Store, presente sii la etapa 'persist' selló.
    pub artifact_ref: Option<ArtifactRef>,
}

impl Job {
    pub fn new(id: String, filename: String, declared_size_bytes: u64) -> Self {
        Self {
            id,
            filename,
            declared_size_bytes,
            received_at: Utc::now(),
            completed_at: None,
            deletion_at: None,
            state: JobState::Queued,
            stage_cursor: 0,
            stage_records: Vec::new(),
            verdict: None,
            artifact_ref: None,
        }
    }

    /// Corte consistente e inmutable para lectores concurrentes.
    pub fn snapshot(&self) -> JobView {
        JobView {
            id: self.id.clone(),
            filename: self.filename.clone(),
            declared_size_bytes: self.declared_size_bytes,
            received_at: self.received_at,
            completed_at: self.completed_at,
            deletion_at: self.deletion_at,
            state: self.state,
            stage_cursor: self.stage_cursor,
            stages: self.stage_records.clone(),
            verdict: self.verdict.clone(),
            artifact_ref: self.artifact_ref.clone(),
        }
    }
}

/// Copia de solo lectura devuelta a los consumidores de estado.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobView {
    pub id: String,
    pub filename: String,
    pub declared_size_bytes: u64,
    pub received_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub deletion_at: Option<DateTime<Utc>>,
    pub state: JobState,
    pub stage_cursor: usize,
    pub stages: Vec<StageRecord>,
    pub verdict: Option<Verdict>,
    pub artifact_ref: Option<ArtifactRef>,
}
