// [libs/shared/panoptes/src/lib.rs]
/*!
 * =================================================================
 * APARATO: PANOPTES FORENSIC OBSERVER (V4.1 - INGEST CONTEXT)
 * CLASIFICACIÓN: SHARED UTILITY (ESTRATO L4)
 * RESPONSABILIDAD: TRAZADO ESTRUCTURADO Y CONTEXTO FORENSE DE INGESTA
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. FORENSIC CONTEXT: Los escáneres del pipeline corren en hilos
 *    bloqueantes donde los spans asíncronos no llegan; este aparato
 *    mantiene una etiqueta trabajo::etapa por hilo para que un pánico
 *    dentro de un escáner identifique la carga que lo provocó.
 * 2. FORMAT AUTHORITY: El formato de emisión (json | pretty) se decide
 *    por HELIXGATE_LOG_FORMAT y solo en su ausencia por el perfil de
 *    compilación.
 * 3. SILENCE TABLE: Las dependencias de infraestructura se silencian
 *    desde una tabla nominal única, no desde cadenas dispersas.
 * =================================================================
 */

use std::cell::RefCell;
use std::panic;
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Tabla de silenciamiento de estratos de infraestructura.
/// Un solo lugar de verdad para el ruido que no es de dominio.
const INFRASTRUCTURE_SILENCE_TABLE: &[(&str, &str)] = &[
    ("tower_http", "warn"),
    ("hyper", "warn"),
    ("libsql", "error"),
];

/// Variable de entorno que fija el formato de emisión.
const LOG_FORMAT_ENV: &str = "HELIXGATE_LOG_FORMAT";

// --- ESTRATO DE CONTEXTO FORENSE POR HILO ---

thread_local! {
    static ACTIVE_FORENSIC_LABEL: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Contexto forense del hilo: etiqueta `trabajo::etapa` vigente.
///
/// El executor lo arma alrededor de cada cómputo bloqueante; el hook
/// de pánicos lo lee para atribuir el colapso a una carga concreta.
pub struct ForensicContext;

impl ForensicContext {
    /// Arma la etiqueta del hilo y devuelve el guard que la restaura.
    pub fn enter(forensic_label: &str) -> ForensicContextGuard {
        let previous_label = ACTIVE_FORENSIC_LABEL
            .with(|slot| slot.borrow_mut().replace(forensic_label.to_string()));
        ForensicContextGuard { previous_label }
    }

    /// Etiqueta vigente del hilo, si un cómputo de ingesta está en curso.
    pub fn current() -> Option<String> {
        ACTIVE_FORENSIC_LABEL.with(|slot| slot.borrow().clone())
    }
}

/// Restaura la etiqueta anterior del hilo al salir del cómputo.
pub struct ForensicContextGuard {
    previous_label: Option<String>,
}

impl Drop for ForensicContextGuard {
    fn drop(&mut self) {
        let restored_label = self.previous_label.take();
        ACTIVE_FORENSIC_LABEL.with(|slot| *slot.borrow_mut() = restored_label);
    }
}

// --- ESTRATO DE IGNICIÓN DE TRAZADO ---

/// Formato de emisión del colector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TelemetryFormat {
    /// Tramas JSON planas para el colector de producción.
    Json,
    /// Salida compacta legible para el operador.
    Pretty,
}

fn resolve_telemetry_format() -> TelemetryFormat {
    match std::env::var(LOG_FORMAT_ENV).as_deref() {
        Ok("json") => TelemetryFormat::Json,
        Ok("pretty") => TelemetryFormat::Pretty,
        _ if cfg!(debug_assertions) => TelemetryFormat::Pretty,
        _ => TelemetryFormat::Json,
    }
}

/// Directiva por defecto: dominio al nivel pedido, infraestructura
/// acallada según la tabla nominal.
fn forge_default_directives(service_nominal_identifier: &str, domain_level: &str) -> String {
    let mut directives = format!(
        "{}={level},helixgate={level}",
        service_nominal_identifier,
        level = domain_level
    );
    for (infrastructure_target, ceiling) in INFRASTRUCTURE_SILENCE_TABLE {
        directives.push_str(&format!(",{}={}", infrastructure_target, ceiling));
    }
    directives
}

/**
 * Inicializa el trazado Panoptes y el hook de pánicos con atribución
 * de carga.
 *
 * # Errors:
 * Retorna pánico si otro suscriptor global ya fue inicializado.
 */
pub fn init_tracing(service_nominal_identifier: &str) {
    let domain_level = if cfg!(debug_assertions) { "debug" } else { "info" };
    let environmental_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        forge_default_directives(service_nominal_identifier, domain_level).into()
    });

    match resolve_telemetry_format() {
        TelemetryFormat::Json => {
            tracing_subscriber::registry()
                .with(environmental_filter)
                .with(tracing_subscriber::fmt::layer().json().flatten_event(true))
                .init();
        }
        TelemetryFormat::Pretty => {
            tracing_subscriber::registry()
                .with(environmental_filter)
                .with(tracing_subscriber::fmt::layer().compact().with_target(false))
                .init();
        }
    }

    install_forensic_panic_hook(service_nominal_identifier);

    info!(
        "👁️  [PANOPTES_ONLINE]: Forensic observer armed for [{}].",
        service_nominal_identifier
    );
}

/**
 * Hook global de pánicos: todo colapso de hilo se emite con las
 * coordenadas de código y, cuando existe, la etiqueta forense del
 * trabajo/etapa que el hilo estaba procesando.
 */
fn install_forensic_panic_hook(service_nominal_identifier: &str) {
    let service_label = service_nominal_identifier.to_string();

    panic::set_hook(Box::new(move |panic_metadata| {
        let code_coordinates = panic_metadata
            .location()
            .map(|location| format!("{}:{}", location.file(), location.line()))
            .unwrap_or_else(|| "<unlocated>".to_string());

        let ingest_attribution =
            ForensicContext::current().unwrap_or_else(|| "<no_active_ingest>".to_string());

        error!(
            target: "panic_monitor",
            service = %service_label,
            ingest = %ingest_attribution,
            at = %code_coordinates,
            "💥 [WORKER_PANIC]: {}",
            describe_panic_payload(panic_metadata.payload())
        );
    }));
}

fn describe_panic_payload(payload: &dyn std::any::Any) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<opaque panic payload>")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn certify_forensic_context_nesting() {
        assert_eq!(ForensicContext::current(), None);

        {
            let _outer_guard = ForensicContext::enter("JOB_A::ids");
            assert_eq!(ForensicContext::current().as_deref(), Some("JOB_A::ids"));

            {
                let _inner_guard = ForensicContext::enter("JOB_A::aml");
                assert_eq!(ForensicContext::current().as_deref(), Some("JOB_A::aml"));
            }

            // El guard interno restaura la etiqueta externa.
            assert_eq!(ForensicContext::current().as_deref(), Some("JOB_A::ids"));
        }

        assert_eq!(ForensicContext::current(), None);
    }

    #[test]
    fn certify_default_directives_include_silence_table() {
        let directives = forge_default_directives("helixgate_intake_gateway", "debug");
        assert!(directives.starts_with("helixgate_intake_gateway=debug"));
        assert!(directives.contains("helixgate=debug"));
        assert!(directives.contains("tower_http=warn"));
        assert!(directives.contains("libsql=error"));
    }

    #[test]
    fn certify_panic_payload_description() {
        let static_payload: &dyn std::any::Any = &"scanner collapsed";
        assert_eq!(describe_panic_payload(static_payload), "scanner collapsed");

        let owned_payload: Box<dyn std::any::Any> = Box::new(String::from("owned collapse"));
        assert_eq!(describe_panic_payload(owned_payload.as_ref()), "owned collapse");

        let opaque_payload: &dyn std::any::Any = &42u32;
        assert_eq!(describe_panic_payload(opaque_payload), "<opaque panic payload>");
    }
}
