// [libs/domain/registry/src/errors.rs]
/*!
 * =================================================================
 * APARATO: REGISTRY ERROR CATALOG (V5.0 - SOBERANO)
 * CLASIFICACIÓN: DOMAIN STATE (ESTRATO L2)
 * RESPONSABILIDAD: CATALOGACIÓN SEMÁNTICA DE FALLOS DE REGISTRO
 *
 * # Mathematical Proof (Assertion Discipline):
 * Una 'IllegalTransition' es una falta de programación: el autómata de
 * estados la hace inalcanzable desde los flujos nominales, por lo que
 * los tests la tratan como aserción y jamás como condición operativa.
 * =================================================================
 */

use helixgate_domain_models::JobState;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegistryError {
    /// El identificador ya está presente en el mapa.
    #[error("[L2_REGISTRY_FAULT]: DUPLICATE_IDENTIFIER")]
    Duplicate,

    /// El trabajo solicitado no existe en el registro.
    #[error("[L2_REGISTRY_FAULT]: IDENTIFIER_NOT_FOUND")]
    NotFound,

    /// Transición fuera de la tabla de legalidad del autómata.
    #[error("[L2_REGISTRY_FAULT]: ILLEGAL_TRANSITION -> {from:?} -> {to:?}")]
    IllegalTransition { from: JobState, to: JobState },

    /// Mutación de etapas sobre un trabajo que no está en ejecución.
    #[error("[L2_REGISTRY_FAULT]: NOT_RUNNING -> {0:?}")]
    NotRunning(JobState),
}
