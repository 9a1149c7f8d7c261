// [apps/intake-gateway/src/lib.rs]
/*!
 * =================================================================
 * APARATO: GATEWAY LIBRARY ROOT (V6.1 - SOVEREIGN AUTHORITY)
 * CLASIFICACIÓN: CRATE ROOT (ESTRATO L3)
 * RESPONSABILIDAD: DEFINICIÓN SUPREMA DEL ÁRBOL DE MÓDULOS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. MODULE HIERARCHY HARDENING: Establece la autoridad única de
 *    módulos, permitiendo que 'crate::' sea resuelto de forma
 *    determinista tanto en la librería como en el binario.
 * 2. PROVING GROUNDS ACCESS: Expone los servicios de fondo (retención)
 *    para su certificación extremo-a-extremo desde el estrato espejo.
 * 3. PUBLIC INTERFACE: Expone 'prelude' para facilitar la ignición
 *    del Kernel desde el binario 'main.rs'.
 * =================================================================
 */

// --- ESTRATO DE CONFIGURACIÓN Y ESTADO (L1-APP) ---
/// Captura de entorno y resolución de parámetros del motor.
pub mod config;
/// Contenedor thread-safe de los aparatos del núcleo.
pub mod state;

// --- ESTRATO DE TRANSPORTE Y ACCIÓN ---
/// Adaptadores de entrada para las operaciones de ingesta.
pub mod handlers;
/// Núcleo de mando y control para la ignición de servicios.
pub mod kernel;
/// Topología de rutas y escudos de red.
pub mod routes;

// --- ESTRATO DE SOPORTE ---
/// Daemons de fondo: retención con evidencia y drenaje de telemetría.
pub mod services;

/**
 * PRELUDIO DEL GATEWAY
 *
 * Re-exportación estratégica de los componentes necesarios para
 * la ignición mínima del sistema. Reduce el acoplamiento en 'main.rs'.
 */
pub mod prelude {
    pub use crate::config::GatewayConfig;
    pub use crate::kernel::IntakeKernel;
    pub use crate::state::AppState;
}
