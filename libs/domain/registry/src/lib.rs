// [libs/domain/registry/src/lib.rs]
/*!
 * =================================================================
 * APARATO: REGISTRY CRATE ROOT (V5.0)
 * CLASIFICACIÓN: DOMAIN STATE (ESTRATO L2)
 * RESPONSABILIDAD: EXPORTACIÓN NOMINAL DEL REGISTRO DE TRABAJOS
 * =================================================================
 */

pub mod errors;
pub mod registry;

pub use errors::RegistryError;
pub use registry::{CancelOutcome, JobRegistry, JobSubscription};
