// [apps/intake-gateway/src/services/telemetry.rs]
/*!
 * =================================================================
 * APARATO: TELEMETRY DRAIN LOOP (V6.1 - PANOPTICON BRIDGE)
 * CLASIFICACIÓN: APPLICATION SERVICES (ESTRATO L4)
 * RESPONSABILIDAD: DRENAJE DEL BUS DE EVENTOS HACIA EL TRAZADO
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. SINK AGNOSTIC: El núcleo emite su taxonomía; este puente la vierte
 *    en 'tracing' y cualquier colector aguas abajo la consume de ahí.
 * 2. LAG TOLERANT: Ante desborde del buffer el puente salta los valores
 *    perdidos y continúa; jamás presiona al emisor.
 * =================================================================
 */

use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use helixgate_domain_models::PipelineEvent;
use helixgate_domain_pipeline::EventBus;

/// Enciende el bucle de drenaje de eventos hacia el Panóptico.
pub fn spawn_telemetry_loop(event_bus: EventBus) {
    tokio::spawn(async move {
        let mut event_stream = event_bus.subscribe();
        info!("📡 [TELEMETRY]: Event drain online.");

        loop {
            match event_stream.recv().await {
                Ok(pipeline_event) => emit_event_trace(&pipeline_event),
                Err(RecvError::Lagged(dropped_count)) => {
                    warn!("⚠️ [TELEMETRY]: Drain lagged; {} events dropped.", dropped_count);
                }
                Err(RecvError::Closed) => {
                    warn!("🛑 [TELEMETRY]: Event bus sealed. Drain standing down.");
                    break;
                }
            }
        }
    });
}

fn emit_event_trace(pipeline_event: &PipelineEvent) {
    match serde_json::to_string(pipeline_event) {
        Ok(wire_frame) => info!(target: "panopticon", "{}", wire_frame),
        Err(serialization_fault) => {
            warn!("⚠️ [TELEMETRY]: Event serialization collapsed: {}", serialization_fault);
        }
    }
}
