// [apps/intake-gateway/src/services/retention.rs]
/*!
 * =================================================================
 * APARATO: RETENTION REAPER SERVICE (V6.3 - EVIDENCE OF DELETION)
 * CLASIFICACIÓN: APPLICATION SERVICES (ESTRATO L4)
 * RESPONSABILIDAD: EXPIRACIÓN DE RETENCIÓN, BORRADO PROBADO Y PODA
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. EVIDENCE FIRST: Todo artefacto expira con prueba criptográfica
 *    sellada antes de la transición a 'retained_deleted'.
 * 2. IDEMPOTENT SWEEPS: Un barrido interrumpido se completa en el
 *    siguiente; el borrado del almacén es idempotente por bitácora.
 * 3. TWO PHASE, TWO CUTOFFS: Fase A expira terminales con el corte de
 *    retención; Fase B poda 'retained_deleted' con una gracia corta e
 *    independiente, de modo que un registro sellado en un barrido se
 *    retira en el siguiente y no una retención completa después.
 * =================================================================
 */

use chrono::{Duration as ChronoDuration, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::{error, info, instrument, warn};

use helixgate_domain_models::JobState;
use helixgate_domain_pipeline::EventBus;
use helixgate_domain_registry::JobRegistry;
use helixgate_infra_store::{ObjectStore, StoreError};

/// Cadencia del barrido de retención.
const SWEEP_INTERVAL_SECONDS: u64 = 60;

/// Gracia de poda: media cadencia, para que un registro sellado como
/// 'retained_deleted' en un barrido quede podado en el siguiente.
const DEFAULT_PRUNE_GRACE_SECONDS: i64 = (SWEEP_INTERVAL_SECONDS / 2) as i64;

/**
 * Daemon de retención: convierte terminales vencidos en
 * 'retained_deleted' con evidencia, y poda el residuo.
 */
pub struct RetentionReaperService {
    registry: Arc<JobRegistry>,
    store: Arc<ObjectStore>,
    event_bus: EventBus,
    retention_seconds: i64,
    prune_grace_seconds: i64,
}

impl RetentionReaperService {
    pub fn new(
        registry: Arc<JobRegistry>,
        store: Arc<ObjectStore>,
        event_bus: EventBus,
        retention_seconds: u64,
    ) -> Self {
        Self {
            registry,
            store,
            event_bus,
            retention_seconds: retention_seconds as i64,
            prune_grace_seconds: DEFAULT_PRUNE_GRACE_SECONDS,
        }
    }

    /// Ajusta la gracia de poda (auditorías y despliegues de cadencia corta).
    pub fn with_prune_grace(mut self, prune_grace_seconds: u64) -> Self {
        self.prune_grace_seconds = prune_grace_seconds as i64;
        self
    }

    /// Enciende el bucle perpetuo del daemon.
    pub fn spawn_reaper_daemon(self: Arc<Self>) {
        tokio::spawn(async move {
            let mut sweep_cadence = interval(Duration::from_secs(SWEEP_INTERVAL_SECONDS));
            loop {
                sweep_cadence.tick().await;
                self.execute_sweep().await;
            }
        });
    }

    /**
     * Un barrido completo: expiración con evidencia y poda.
     */
    #[instrument(skip(self))]
    pub async fn execute_sweep(&self) {
        let retention_cutoff = Utc::now() - ChronoDuration::seconds(self.retention_seconds);

        // --- FASE A: EXPIRACIÓN DE TERMINALES VENCIDOS ---
        for expired_view in self.registry.expired_for_retention(retention_cutoff) {
            let job_identifier = expired_view.id.clone();

            if expired_view.artifact_ref.is_some() {
                match self.store.delete(&job_identifier).await {
                    Ok(deletion_proof) => {
                        self.registry
                            .record_deletion(&job_identifier, deletion_proof.deletion_timestamp)
                            .ok();
                        self.event_bus.emit_artifact_deleted(&job_identifier);
                        info!("🗑️ [REAPER]: Artifact for {} expired with sealed proof.", job_identifier);
                    }
                    Err(StoreError::NotFound) => {
                        // Sin fila activa: un barrido previo ya borró.
                        warn!("⚪ [REAPER]: Artifact row for {} already gone.", job_identifier);
                    }
                    Err(store_fault) => {
                        // El barrido siguiente reintenta: delete es idempotente.
                        error!("💀 [REAPER]: Deletion collapsed for {}: {}", job_identifier, store_fault);
                        continue;
                    }
                }
            }

            if let Err(transition_fault) =
                self.registry
                    .transition(&job_identifier, expired_view.state, JobState::RetainedDeleted)
            {
                error!("💀 [REAPER]: Retention seal rejected for {}: {}", job_identifier, transition_fault);
            }
        }

        // --- FASE B: PODA DEL RESIDUO RETENIDO ---
        // Corte independiente: la retención ya se cumplió en la Fase A,
        // aquí solo media una gracia corta desde el sellado del borrado.
        let prune_cutoff = Utc::now() - ChronoDuration::seconds(self.prune_grace_seconds);
        let pruned_count = self.registry.prune(prune_cutoff);
        if pruned_count > 0 {
            info!("💀 [REAPER]: Pruned {} retained jobs.", pruned_count);
        }
    }
}
