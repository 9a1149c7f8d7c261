// [apps/intake-gateway/src/state.rs]
/*!
 * =================================================================
 * APARATO: GATEWAY SHARED STATE (V6.1 - COMPOSITION ROOT)
 * CLASIFICACIÓN: APPLICATION STATE (ESTRATO L1-APP)
 * RESPONSABILIDAD: CONTENEDOR THREAD-SAFE DE APARATOS DEL NÚCLEO
 *
 * # Mathematical Proof (Deterministic State Hub):
 * Todos los estratos se inyectan por construcción (Arc<T> inmutable);
 * ningún aparato posee acceso ambiental al estado de otro.
 * =================================================================
 */

use std::sync::Arc;

use helixgate_domain_pipeline::{EventBus, IntakeService};
use helixgate_domain_registry::JobRegistry;
use helixgate_infra_store::ObjectStore;

/**
 * Contenedor de estado compartido (Thread-Safe) para el Gateway.
 * Actúa como la placa base donde se conectan todos los estratos.
 */
#[derive(Clone)]
pub struct AppState {
    /// Superficie de admisión y consulta (C5).
    pub intake: Arc<IntakeService>,
    /// Registro proceso-global de trabajos.
    pub registry: Arc<JobRegistry>,
    /// Almacén de objetos cifrados.
    pub store: Arc<ObjectStore>,
    /// Bus de eventos para los daemons de observabilidad.
    pub event_bus: EventBus,
}
