// [libs/core/vault/src/lib.rs]
/*!
 * =================================================================
 * APARATO: CRYPTOGRAPHIC VAULT ENGINE (V5.3 - DUAL CIPHER)
 * CLASIFICACIÓN: CORE SECURITY (ESTRATO L1)
 * RESPONSABILIDAD: SELLADO AUTENTICADO Y DERIVACIÓN DE LLAVES POR TRABAJO
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. DUAL CIPHER: AES-256-GCM como algoritmo preferido; keystream XOR
 *    con HMAC-SHA256 como fallback verificable. Ambas formas abren con
 *    verificación de integridad obligatoria.
 * 2. KEY SOVEREIGNTY: La llave por trabajo se deriva con PBKDF2 desde
 *    el secreto de proceso; solo su huella SHA-256 abandona este aparato.
 * 3. ZERO ABBREVIATIONS: Nomenclatura nominal absoluta.
 *
 * # Mathematical Proof (Integrity Duality):
 * En el modo GCM el tag de autenticación cubre nonce y ciphertext por
 * construcción del modo. En el fallback, HMAC-SHA256(llave_mac,
 * nonce ∥ ciphertext) cubre el mismo dominio, de modo que cualquier
 * mutación de un solo bit en disco invalida la apertura en ambos modos.
 * =================================================================
 */

pub mod engine;
pub mod keys;

pub use engine::{CipherAlgorithm, SealedPayload, VaultCryptoEngine};
pub use keys::{derive_artifact_key, fingerprint_key, ArtifactKey};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VaultError {
    /// El tag de autenticación o el MAC no verifican: material corrupto
    /// o llave incorrecta.
    #[error("[L1_VAULT_FAULT]: INTEGRITY_VIOLATION -> Auth tag or MAC mismatch")]
    Integrity,

    /// El buffer sellado es demasiado corto para contener nonce y tag.
    #[error("[L1_VAULT_FAULT]: TRUNCATED_PAYLOAD -> {0} bytes")]
    Truncated(usize),
}
