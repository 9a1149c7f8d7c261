// [libs/domain/pipeline/src/events.rs]
/*!
 * =================================================================
 * APARATO: NEURAL EVENT BUS SERVICE (V6.1 - PIPELINE BROADCASTER)
 * CLASIFICACIÓN: DOMAIN ENGINE (ESTRATO L2)
 * RESPONSABILIDAD: DIFUSIÓN SOBERANA DE SEÑALES DEL NÚCLEO
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. BACKEND AGNOSTIC: El bus transporta la taxonomía de eventos del
 *    dominio; el colector que la consuma es decisión del despliegue.
 * 2. LOCK-FREE EMISSION: La pérdida de un suscriptor no afecta el
 *    determinismo del reactor asíncrono principal.
 *
 * # Mathematical Proof (Signal Propagation):
 * El Bus garantiza un tiempo de despacho O(1) independientemente del
 * número de receptores.
 * =================================================================
 */

use tokio::sync::broadcast;
use tracing::{error, trace};

use helixgate_domain_models::{FailureReason, JobState, PipelineEvent, StageName, StageOutcome};

/// Capacidad del canal de difusión soberano.
/// Sintonizada para absorber ráfagas de etapas sin disparar 'Lagging'.
const SOVEREIGN_CHANNEL_CAPACITY: usize = 4096;

/**
 * Orquestador central de señales del núcleo de procesamiento.
 */
#[derive(Debug, Clone)]
pub struct EventBus {
    internal_transmission_channel: broadcast::Sender<PipelineEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(SOVEREIGN_CHANNEL_CAPACITY);
        Self { internal_transmission_channel: sender }
    }

    /// Genera un nuevo receptor para el colector de telemetría.
    pub fn subscribe(&self) -> broadcast::Receiver<PipelineEvent> {
        self.internal_transmission_channel.subscribe()
    }

    // --- ESTRATO DE EMISIÓN TÁCTICA ---

    pub fn emit_job_submitted(&self, job_identifier: &str, size_bytes: u64) {
        self.dispatch_event_sovereign(PipelineEvent::JobSubmitted {
            job_id: job_identifier.to_string(),
            size_bytes,
        });
    }

    pub fn emit_stage_started(&self, job_identifier: &str, stage: StageName) {
        self.dispatch_event_sovereign(PipelineEvent::StageStarted {
            job_id: job_identifier.to_string(),
            stage,
        });
    }

    pub fn emit_stage_finished(
        &self,
        job_identifier: &str,
        stage: StageName,
        outcome: StageOutcome,
        duration_ms: u64,
    ) {
        self.dispatch_event_sovereign(PipelineEvent::StageFinished {
            job_id: job_identifier.to_string(),
            stage,
            outcome,
            duration_ms,
        });
    }

    pub fn emit_job_terminal(
        &self,
        job_identifier: &str,
        state: JobState,
        reason: Option<FailureReason>,
    ) {
        self.dispatch_event_sovereign(PipelineEvent::JobTerminal {
            job_id: job_identifier.to_string(),
            state,
            reason,
        });
    }

    pub fn emit_artifact_written(&self, job_identifier: &str, size: u64) {
        self.dispatch_event_sovereign(PipelineEvent::ArtifactWritten {
            job_id: job_identifier.to_string(),
            size,
        });
    }

    pub fn emit_artifact_deleted(&self, job_identifier: &str) {
        self.dispatch_event_sovereign(PipelineEvent::ArtifactDeleted {
            job_id: job_identifier.to_string(),
        });
    }

    pub fn emit_integrity_failure(&self, content_hash: &str) {
        self.dispatch_event_sovereign(PipelineEvent::IntegrityFailure {
            content_hash: content_hash.to_string(),
        });
    }

    // --- ESTRATO DE DESPACHO INTERNO ---

    /**
     * Motor interno de despacho con auditoría de congestión.
     *
     * Si no hay suscriptores activos, el mensaje se descarta en silencio.
     */
    fn dispatch_event_sovereign(&self, event_artifact: PipelineEvent) {
        match self.internal_transmission_channel.send(event_artifact) {
            Ok(subscriber_count) => {
                if subscriber_count == 0 {
                    trace!("💤 [EVENT_BUS]: Signal discarded. No active neural links.");
                } else {
                    trace!("📡 [EVENT_BUS]: Signal broadcasted to {} active links.", subscriber_count);
                }
            }
            Err(_) => {
                error!("💀 [EVENT_BUS_FATAL]: Internal transmission channel collapsed.");
            }
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
