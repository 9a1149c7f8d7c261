// [libs/domain/registry/src/registry.rs]
/*!
 * =================================================================
 * APARATO: SOVEREIGN JOB REGISTRY (V5.2 - SINGLE WRITER DISCIPLINE)
 * CLASIFICACIÓN: DOMAIN STATE (ESTRATO L2)
 * RESPONSABILIDAD: MAPA PROCESO-GLOBAL DE TRABAJOS CON ACCESO SEGURO
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. CAS TRANSITIONS: Toda transición compara el estado origen bajo el
 *    candado de escritura; la ilegalidad colapsa explícitamente.
 * 2. FAN-OUT DISCIPLINE: Cada trabajo posee su canal de difusión; los
 *    suscriptores retienen únicamente el receptor, jamás el Job, de
 *    modo que la poda no deja ciclos de propiedad.
 * 3. DROP OLDEST: El buffer por suscriptor es acotado; ante desborde
 *    se pierden los valores intermedios más antiguos, pero el estado
 *    terminal siempre es el último emitido y por tanto siempre llega.
 *
 * # Mathematical Proof (Consistent Cut):
 * Toda mutación ocurre bajo el candado de escritura y todo snapshot
 * bajo el de lectura: un lector jamás observa un registro a medio
 * transicionar, y dentro de un snapshot stage_cursor ≥ len(stages) − 1.
 * =================================================================
 */

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::RwLock;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, instrument, warn};

use helixgate_domain_models::{
    ArtifactRef, Job, JobState, JobView, StageRecord, Verdict,
};

use crate::errors::RegistryError;

/// Capacidad del buffer por suscriptor (drop-oldest ante desborde).
const SUBSCRIBER_BUFFER_CAPACITY: usize = 16;

/// Resultado idempotente de una señal de cancelación.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    /// La señal quedó disparada (primera vez o repetida).
    Signalled,
    /// El trabajo ya estaba en estado terminal; la señal es inocua.
    AlreadyTerminal,
}

/// Suscripción viva: snapshot inmediato más el flujo de cambios.
pub struct JobSubscription {
    pub initial_snapshot: JobView,
    pub updates: broadcast::Receiver<JobView>,
}

/// Ranura interna: el Job más sus canales de señalización.
struct JobSlot {
    job: Job,
    cancel_sender: watch::Sender<bool>,
    cancel_receiver: watch::Receiver<bool>,
    view_broadcaster: broadcast::Sender<JobView>,
}

impl JobSlot {
    fn new(job: Job) -> Self {
        let (cancel_sender, cancel_receiver) = watch::channel(false);
        let (view_broadcaster, _) = broadcast::channel(SUBSCRIBER_BUFFER_CAPACITY);
        Self { job, cancel_sender, cancel_receiver, view_broadcaster }
    }
}

/// Registro proceso-global de trabajos de ingesta.
///
/// Disciplina de escritura: un único escritor por trabajo (el worker
/// asignado); múltiples lectores concurrentes vía snapshots.
pub struct JobRegistry {
    slots: RwLock<HashMap<String, JobSlot>>,
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl JobRegistry {
    pub fn new() -> Self {
        Self { slots: RwLock::new(HashMap::new()) }
    }

    /**
     * Inserta un trabajo en estado 'Queued'.
     *
     * # Errors:
     * `RegistryError::Duplicate` si el identificador ya existe.
     */
    #[instrument(skip(self))]
    pub fn create(
        &self,
        job_identifier: &str,
        filename: String,
        declared_size_bytes: u64,
    ) -> Result<JobView, RegistryError> {
        let mut slots_guard = self.slots.write().expect("FATAL: Registry lock poisoned.");

        if slots_guard.contains_key(job_identifier) {
            return Err(RegistryError::Duplicate);
        }

        let job = Job::new(job_identifier.to_string(), filename, declared_size_bytes);
        let snapshot = job.snapshot();
        slots_guard.insert(job_identifier.to_string(), JobSlot::new(job));

        debug!("🧾 [REGISTRY]: Job {} admitted in queued strata.", job_identifier);
        Ok(snapshot)
    }

    /**
     * Transición CAS del autómata de estados.
     *
     * Sella 'completed_at' al entrar a un terminal de pipeline.
     *
     * # Errors:
     * - `RegistryError::NotFound`
     * - `RegistryError::IllegalTransition` fuera de la tabla de legalidad
     *   o cuando el estado observado difiere del esperado.
     */
    #[instrument(skip(self))]
    pub fn transition(
        &self,
        job_identifier: &str,
        expected_from: JobState,
        target_state: JobState,
    ) -> Result<JobView, RegistryError> {
        let snapshot = {
            let mut slots_guard = self.slots.write().expect("FATAL: Registry lock poisoned.");
            let slot = slots_guard
                .get_mut(job_identifier)
                .ok_or(RegistryError::NotFound)?;

            let observed_state = slot.job.state;
            if observed_state != expected_from
                || !JobState::is_legal_transition(observed_state, target_state)
            {
                return Err(RegistryError::IllegalTransition {
                    from: observed_state,
                    to: target_state,
                });
            }

            slot.job.state = target_state;
            if matches!(
                target_state,
                JobState::Completed | JobState::Failed | JobState::Cancelled
            ) {
                slot.job.completed_at = Some(Utc::now());
            }

            let snapshot = slot.job.snapshot();
            let _ = slot.view_broadcaster.send(snapshot.clone());
            snapshot
        };

        info!("🔄 [REGISTRY]: Job {} -> {:?}.", job_identifier, target_state);
        Ok(snapshot)
    }

    /// Marca el inicio de una etapa: el cursor avanza de forma monótona.
    pub fn begin_stage(&self, job_identifier: &str, stage_index: usize) -> Result<(), RegistryError> {
        let mut slots_guard = self.slots.write().expect("FATAL: Registry lock poisoned.");
        let slot = slots_guard
            .get_mut(job_identifier)
            .ok_or(RegistryError::NotFound)?;

        if slot.job.state != JobState::Running {
            return Err(RegistryError::NotRunning(slot.job.state));
        }

        // El cursor jamás retrocede.
        if stage_index > slot.job.stage_cursor {
            slot.job.stage_cursor = stage_index;
        }

        let snapshot = slot.job.snapshot();
        let _ = slot.view_broadcaster.send(snapshot);
        Ok(())
    }

    /**
     * Anexa el rastro de una etapa ejecutada. Solo legal en 'Running'.
     */
    pub fn append_stage(
        &self,
        job_identifier: &str,
        stage_record: StageRecord,
    ) -> Result<(), RegistryError> {
        let mut slots_guard = self.slots.write().expect("FATAL: Registry lock poisoned.");
        let slot = slots_guard
            .get_mut(job_identifier)
            .ok_or(RegistryError::NotFound)?;

        if slot.job.state != JobState::Running {
            return Err(RegistryError::NotRunning(slot.job.state));
        }

        slot.job.stage_records.push(stage_record);

        let snapshot = slot.job.snapshot();
        let _ = slot.view_broadcaster.send(snapshot);
        Ok(())
    }

    /// Sella la referencia de artefacto tras el éxito de 'persist'.
    pub fn set_artifact(
        &self,
        job_identifier: &str,
        artifact_reference: ArtifactRef,
    ) -> Result<(), RegistryError> {
        let mut slots_guard = self.slots.write().expect("FATAL: Registry lock poisoned.");
        let slot = slots_guard
            .get_mut(job_identifier)
            .ok_or(RegistryError::NotFound)?;
        slot.job.artifact_ref = Some(artifact_reference);
        Ok(())
    }

    /// Retira la referencia de artefacto (persistencia revertida).
    pub fn clear_artifact(&self, job_identifier: &str) -> Result<(), RegistryError> {
        let mut slots_guard = self.slots.write().expect("FATAL: Registry lock poisoned.");
        let slot = slots_guard
            .get_mut(job_identifier)
            .ok_or(RegistryError::NotFound)?;
        slot.job.artifact_ref = None;
        Ok(())
    }

    /**
     * Sellado terminal atómico: CAS Running -> estado terminal, veredicto
     * y 'completed_at' bajo el mismo candado.
     */
    #[instrument(skip(self, verdict))]
    pub fn seal_terminal(
        &self,
        job_identifier: &str,
        target_state: JobState,
        verdict: Verdict,
    ) -> Result<JobView, RegistryError> {
        let snapshot = {
            let mut slots_guard = self.slots.write().expect("FATAL: Registry lock poisoned.");
            let slot = slots_guard
                .get_mut(job_identifier)
                .ok_or(RegistryError::NotFound)?;

            let observed_state = slot.job.state;
            if observed_state != JobState::Running
                || !JobState::is_legal_transition(observed_state, target_state)
            {
                return Err(RegistryError::IllegalTransition {
                    from: observed_state,
                    to: target_state,
                });
            }

            slot.job.state = target_state;
            slot.job.completed_at = Some(Utc::now());
            slot.job.verdict = Some(verdict);

            let snapshot = slot.job.snapshot();
            let _ = slot.view_broadcaster.send(snapshot.clone());
            snapshot
        };

        info!("🏁 [REGISTRY]: Job {} sealed as {:?}.", job_identifier, target_state);
        Ok(snapshot)
    }

    /// Registra la marca de borrado tras la emisión de la prueba.
    pub fn record_deletion(
        &self,
        job_identifier: &str,
        deletion_timestamp: DateTime<Utc>,
    ) -> Result<(), RegistryError> {
        let mut slots_guard = self.slots.write().expect("FATAL: Registry lock poisoned.");
        let slot = slots_guard
            .get_mut(job_identifier)
            .ok_or(RegistryError::NotFound)?;
        slot.job.deletion_at = Some(deletion_timestamp);
        Ok(())
    }

    /// Copia inmutable de solo lectura; jamás un registro a medio mutar.
    pub fn snapshot(&self, job_identifier: &str) -> Result<JobView, RegistryError> {
        let slots_guard = self.slots.read().expect("FATAL: Registry lock poisoned.");
        slots_guard
            .get(job_identifier)
            .map(|slot| slot.job.snapshot())
            .ok_or(RegistryError::NotFound)
    }

    /**
     * Suscripción con entrega inmediata del snapshot vigente y flujo
     * posterior de cambios (política drop-oldest por suscriptor).
     */
    pub fn subscribe(&self, job_identifier: &str) -> Result<JobSubscription, RegistryError> {
        let slots_guard = self.slots.read().expect("FATAL: Registry lock poisoned.");
        let slot = slots_guard
            .get(job_identifier)
            .ok_or(RegistryError::NotFound)?;

        Ok(JobSubscription {
            initial_snapshot: slot.job.snapshot(),
            updates: slot.view_broadcaster.subscribe(),
        })
    }

    /// Receptor de la señal de cancelación para el worker asignado.
    pub fn cancel_receiver(&self, job_identifier: &str) -> Result<watch::Receiver<bool>, RegistryError> {
        let slots_guard = self.slots.read().expect("FATAL: Registry lock poisoned.");
        slots_guard
            .get(job_identifier)
            .map(|slot| slot.cancel_receiver.clone())
            .ok_or(RegistryError::NotFound)
    }

    /**
     * Dispara la señal de cancelación. Idempotente: invocaciones
     * repetidas producen el mismo resultado observable.
     */
    #[instrument(skip(self))]
    pub fn cancel(&self, job_identifier: &str) -> Result<CancelOutcome, RegistryError> {
        let slots_guard = self.slots.read().expect("FATAL: Registry lock poisoned.");
        let slot = slots_guard
            .get(job_identifier)
            .ok_or(RegistryError::NotFound)?;

        if slot.job.state.is_terminal() {
            return Ok(CancelOutcome::AlreadyTerminal);
        }

        let _ = slot.cancel_sender.send(true);
        warn!("⛔ [REGISTRY]: Cancellation signalled for job {}.", job_identifier);
        Ok(CancelOutcome::Signalled)
    }

    /// Trabajos en terminal de pipeline cuya retención ya expiró.
    pub fn expired_for_retention(&self, cutoff: DateTime<Utc>) -> Vec<JobView> {
        let slots_guard = self.slots.read().expect("FATAL: Registry lock poisoned.");
        slots_guard
            .values()
            .filter(|slot| {
                matches!(
                    slot.job.state,
                    JobState::Completed | JobState::Failed | JobState::Cancelled
                ) && slot
                    .job
                    .completed_at
                    .map(|completed_at| completed_at < cutoff)
                    .unwrap_or(false)
            })
            .map(|slot| slot.job.snapshot())
            .collect()
    }

    /**
     * Poda trabajos 'RetainedDeleted' anteriores al corte.
     * Devuelve la cantidad retirada del mapa.
     */
    #[instrument(skip(self))]
    pub fn prune(&self, before_timestamp: DateTime<Utc>) -> usize {
        let mut slots_guard = self.slots.write().expect("FATAL: Registry lock poisoned.");
        let initial_count = slots_guard.len();

        slots_guard.retain(|_, slot| {
            let is_prunable = slot.job.state == JobState::RetainedDeleted
                && slot
                    .job
                    .deletion_at
                    .or(slot.job.completed_at)
                    .map(|sealed_at| sealed_at < before_timestamp)
                    .unwrap_or(true);
            !is_prunable
        });

        let pruned_count = initial_count - slots_guard.len();
        if pruned_count > 0 {
            info!("💀 [REGISTRY]: Pruned {} retained jobs from ephemeral strata.", pruned_count);
        }
        pruned_count
    }

    /**
     * Retira un trabajo jamás ejecutado (rechazo de admisión por
     * back-pressure). Solo legal mientras el estado sea 'Queued'.
     */
    pub fn discard_queued(&self, job_identifier: &str) -> Result<(), RegistryError> {
        let mut slots_guard = self.slots.write().expect("FATAL: Registry lock poisoned.");
        match slots_guard.get(job_identifier) {
            None => Err(RegistryError::NotFound),
            Some(slot) if slot.job.state != JobState::Queued => {
                Err(RegistryError::NotRunning(slot.job.state))
            }
            Some(_) => {
                slots_guard.remove(job_identifier);
                Ok(())
            }
        }
    }

    /// Conteo de trabajos vivos en el mapa.
    pub fn population(&self) -> usize {
        self.slots.read().expect("FATAL: Registry lock poisoned.").len()
    }
}
