// [libs/infra/store/src/errors.rs]
/*!
 * =================================================================
 * APARATO: STORE ERROR CATALOG (V7.0 - SOBERANO)
 * CLASIFICACIÓN: INFRASTRUCTURE CORE (ESTRATO L3)
 * RESPONSABILIDAD: CATALOGACIÓN SEMÁNTICA DE FALLOS DE PERSISTENCIA
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. SEMANTIC TRIAGE: Distingue ausencia ('NotFound'), corrupción
 *    ('Integrity') y colapso de I/O ('Storage') para que el pipeline
 *    seleccione la razón de veredicto correcta.
 * 2. PANOPTICON COMPLIANCE: Mensajes con prefijo de estrato para el
 *    renderizado del colector.
 * =================================================================
 */

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    /// Error de enlace con el sustrato libSQL local.
    #[error("[L3_STORE_NET_FAULT]: METADATA_UPLINK_SEVERED -> {0}")]
    Connection(String),

    /// Error de sintaxis o ejecución devuelto por el motor libSQL.
    #[error("[L3_STORE_QUERY_FAULT]: SQL_QUERY_REJECTED -> {0}")]
    Query(#[from] libsql::Error),

    /// Fallo en la transformación de tipos entre SQLite y el dominio.
    #[error("[L3_STORE_MAPPING_FAULT]: DATA_MAPPING_VIOLATION -> {0}")]
    Mapping(String),

    // --- ESTRATO DE ARTEFACTOS ---

    /// El artefacto o la prueba solicitada no existe.
    #[error("[L3_ARTIFACT_FAULT]: IDENTIFIER_NOT_FOUND")]
    NotFound,

    /// El tag de autenticación del ciphertext no verifica.
    #[error("[L3_ARTIFACT_FAULT]: INTEGRITY_VIOLATION")]
    Integrity,

    /// Colapso de I/O sobre el directorio de blobs.
    #[error("[L3_ARTIFACT_FAULT]: BLOB_IO_COLLAPSE -> {0}")]
    Storage(String),
}

impl From<std::io::Error> for StoreError {
    fn from(io_fault: std::io::Error) -> Self {
        StoreError::Storage(io_fault.to_string())
    }
}

impl From<helixgate_core_vault::VaultError> for StoreError {
    fn from(vault_fault: helixgate_core_vault::VaultError) -> Self {
        match vault_fault {
            helixgate_core_vault::VaultError::Integrity => StoreError::Integrity,
            helixgate_core_vault::VaultError::Truncated(_) => StoreError::Integrity,
        }
    }
}
