// [libs/domain/models/src/events.rs]
/*!
 * =================================================================
 * APARATO: PIPELINE EVENT TAXONOMY (V4.0 - NEURAL SIGNALS)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: TAXONOMÍA DE SEÑALES OBSERVABLES DEL NÚCLEO
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. BACKEND AGNOSTIC: El núcleo emite esta taxonomía; el colector de
 *    métricas que la consuma es decisión del despliegue.
 * 2. WIRE ECONOMY: Etiquetas serde cortas para el transporte en ráfaga.
 * =================================================================
 */

use serde::{Deserialize, Serialize};

use crate::job::JobState;
use crate::stage::{StageName, StageOutcome};
use crate::verdict::FailureReason;

/// Señal observable emitida por el núcleo de procesamiento.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PipelineEvent {
    /// Un trabajo fue admitido y encolado.
    #[serde(rename = "job_submitted")]
    JobSubmitted { job_id: String, size_bytes: u64 },

    /// Una etapa inició su ejecución.
    #[serde(rename = "stage_started")]
    StageStarted { job_id: String, stage: StageName },

    /// Una etapa concluyó con resultado y duración física.
    #[serde(rename = "stage_finished")]
    StageFinished {
        job_id: String,
        stage: StageName,
        outcome: StageOutcome,
        duration_ms: u64,
    },

    /// El trabajo alcanzó un estado terminal de pipeline.
    #[serde(rename = "job_terminal")]
    JobTerminal {
        job_id: String,
        state: JobState,
        reason: Option<FailureReason>,
    },

    /// Un artefacto cifrado fue sellado en disco.
    #[serde(rename = "artifact_written")]
    ArtifactWritten { job_id: String, size: u64 },

    /// Un artefacto fue borrado con prueba emitida.
    #[serde(rename = "artifact_deleted")]
    ArtifactDeleted { job_id: String },

    /// Verificación de integridad fallida en una lectura del almacén.
    #[serde(rename = "integrity_failure")]
    IntegrityFailure { content_hash: String },
}
