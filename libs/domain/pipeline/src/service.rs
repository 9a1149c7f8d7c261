// [libs/domain/pipeline/src/service.rs]
/*!
 * =================================================================
 * APARATO: INTAKE SURFACE SERVICE (V6.3 - TRANSPORT AGNOSTIC)
 * CLASIFICACIÓN: DOMAIN ENGINE (ESTRATO L2)
 * RESPONSABILIDAD: OPERACIONES DE ADMISIÓN Y CONSULTA POR TRABAJO
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. ADMISSION CONTROL: submit rechaza vacíos, sobredimensionados y
 *    cola llena antes de que exista cualquier efecto durable.
 * 2. OWNERSHIP CONTRACT: El buffer de bytes pertenece al núcleo desde
 *    la admisión hasta el sellado final; el emisor no debe reutilizarlo.
 * 3. QUERY SEMANTICS: status responde mientras el trabajo exista;
 *    result distingue 'not_ready' de 'not_found'; proof responde
 *    'not_found' hasta que el borrado ocurre de verdad.
 * =================================================================
 */

use std::sync::Arc;
use thiserror::Error;
use tracing::{info, instrument};
use uuid::Uuid;

use helixgate_domain_models::{DeletionProof, EngineConfig, JobView, Verdict};
use helixgate_domain_registry::{CancelOutcome, JobRegistry, JobSubscription, RegistryError};
use helixgate_infra_store::{ObjectStore, StoreError};

use crate::events::EventBus;
use crate::worker::{QueuedJob, WorkerPool};

/// Errores de admisión y consulta expuestos al emisor.
#[derive(Error, Debug)]
pub enum IntakeError {
    #[error("[L2_INTAKE_FAULT]: PAYLOAD_EMPTY")]
    Empty,

    #[error("[L2_INTAKE_FAULT]: PAYLOAD_OVERSIZE -> {actual} > {limit}")]
    Oversize { limit: u64, actual: u64 },

    #[error("[L2_INTAKE_FAULT]: QUEUE_SATURATED")]
    QueueFull,

    #[error("[L2_INTAKE_FAULT]: IDENTIFIER_NOT_FOUND")]
    NotFound,

    #[error("[L2_INTAKE_FAULT]: VERDICT_NOT_READY")]
    NotReady,

    #[error("[L2_INTAKE_FAULT]: REGISTRY_COLLAPSE -> {0}")]
    Registry(#[from] RegistryError),
}

/// Superficie de admisión y consulta (C5), agnóstica al transporte.
pub struct IntakeService {
    registry: Arc<JobRegistry>,
    store: Arc<ObjectStore>,
    worker_pool: WorkerPool,
    event_bus: EventBus,
    config: EngineConfig,
}

impl IntakeService {
    pub fn new(
        registry: Arc<JobRegistry>,
        store: Arc<ObjectStore>,
        worker_pool: WorkerPool,
        event_bus: EventBus,
        config: EngineConfig,
    ) -> Self {
        Self { registry, store, worker_pool, event_bus, config }
    }

    /**
     * Admite una carga y la encola para ejecución.
     *
     * # Errors:
     * - `IntakeError::Empty` / `Oversize`: rechazo inmediato, sin efecto.
     * - `IntakeError::QueueFull`: back-pressure; el registro queda limpio.
     */
    #[instrument(skip(self, payload), fields(size = payload.len()))]
    pub fn submit(&self, filename: String, payload: Vec<u8>) -> Result<String, IntakeError> {
        let payload_size = payload.len() as u64;
        if payload.is_empty() {
            return Err(IntakeError::Empty);
        }
        if payload_size > self.config.max_input_bytes {
            return Err(IntakeError::Oversize {
                limit: self.config.max_input_bytes,
                actual: payload_size,
            });
        }

        let job_identifier = Uuid::new_v4().to_string();
        self.registry.create(&job_identifier, filename, payload_size)?;

        let queued_job = QueuedJob { job_id: job_identifier.clone(), payload };
        if self.worker_pool.try_enqueue(queued_job).is_err() {
            // Reversión de la admisión: el trabajo jamás corrió.
            self.registry.discard_queued(&job_identifier).ok();
            return Err(IntakeError::QueueFull);
        }

        self.event_bus.emit_job_submitted(&job_identifier, payload_size);
        info!("📥 [INTAKE]: Job {} admitted ({} bytes).", job_identifier, payload_size);
        Ok(job_identifier)
    }

    /// Último snapshot del trabajo, con rastro de etapas y cursor.
    pub fn status(&self, job_identifier: &str) -> Result<JobView, IntakeError> {
        self.registry
            .snapshot(job_identifier)
            .map_err(|_| IntakeError::NotFound)
    }

    /**
     * Veredicto terminal. Solo definido cuando el estado es terminal;
     * antes responde 'NotReady' (error de conflicto).
     */
    pub fn result(&self, job_identifier: &str) -> Result<Verdict, IntakeError> {
        let view = self
            .registry
            .snapshot(job_identifier)
            .map_err(|_| IntakeError::NotFound)?;

        if !view.state.is_terminal() {
            return Err(IntakeError::NotReady);
        }
        view.verdict.ok_or(IntakeError::NotReady)
    }

    /// Prueba de borrado; 'NotFound' hasta que el borrado haya ocurrido.
    pub async fn proof(&self, job_identifier: &str) -> Result<DeletionProof, IntakeError> {
        match self.store.proof(job_identifier).await {
            Ok(deletion_proof) => Ok(deletion_proof),
            Err(StoreError::NotFound) => Err(IntakeError::NotFound),
            Err(_) => Err(IntakeError::NotFound),
        }
    }

    /// Cancelación idempotente; sobre un terminal responde ok inocuo.
    pub fn cancel(&self, job_identifier: &str) -> Result<CancelOutcome, IntakeError> {
        self.registry
            .cancel(job_identifier)
            .map_err(|_| IntakeError::NotFound)
    }

    /// Suscripción de cambios de estado con snapshot inmediato.
    pub fn subscribe(&self, job_identifier: &str) -> Result<JobSubscription, IntakeError> {
        self.registry
            .subscribe(job_identifier)
            .map_err(|_| IntakeError::NotFound)
    }

    /// Drena el pool de workers durante el apagado del proceso.
    pub async fn shutdown(&self) {
        self.worker_pool.shutdown().await;
    }
}
