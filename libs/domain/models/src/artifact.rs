// [libs/domain/models/src/artifact.rs]
/*!
 * =================================================================
 * APARATO: ARTIFACT DOMAIN MODELS (V4.0 - CONTENT ADDRESSED)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: CONTRATOS DE ARTEFACTO CIFRADO Y PRUEBA DE BORRADO
 *
 * # Mathematical Proof (Content Addressing):
 * La identidad de un artefacto es SHA-256 del plaintext previo al
 * cifrado. Dos cargas idénticas colapsan al mismo 'content_hash' y por
 * tanto al mismo archivo de ciphertext, garantizando deduplicación.
 * =================================================================
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Algoritmo de sellado registrado por artefacto. Ambas formas son
/// verificables en la lectura.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AlgorithmTag {
    /// AES-256-GCM con nonce único de 96 bits por registro (preferido).
    AeadGcm256,
    /// Keystream XOR con llave + HMAC-SHA256 sobre el ciphertext (fallback).
    XorHmac,
}

impl AlgorithmTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlgorithmTag::AeadGcm256 => "aead_gcm_256",
            AlgorithmTag::XorHmac => "xor_hmac",
        }
    }

    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "aead_gcm_256" => Some(AlgorithmTag::AeadGcm256),
            "xor_hmac" => Some(AlgorithmTag::XorHmac),
            _ => None,
        }
    }
}

/// Referencia durable hacia el Object Store, sellada por la etapa 'persist'.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArtifactRef {
    /// SHA-256 del plaintext (hexadecimal, minúsculas), tomado antes de cifrar.
    pub content_hash: String,
    /// Ruta relativa del archivo de ciphertext bajo el directorio de blobs.
    pub ciphertext_path: String,
    /// Tamaño del plaintext en bytes.
    pub original_size: u64,
    /// Tamaño del ciphertext en disco (nonce y tag incluidos).
    pub stored_size: u64,
    /// Algoritmo con el que se selló el registro.
    pub algorithm_tag: AlgorithmTag,
    /// SHA-256 del material de llave. Jamás la llave.
    pub key_fingerprint: String,
}

/// Evidencia criptográfica de borrado, emitida una única vez por trabajo.
///
/// `proof_digest = SHA256(job_id ∥ content_hash ∥ deletion_ts ∥ server_secret)`
/// donde el secreto de proceso es legible solo por el firmante.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeletionProof {
    pub job_id: String,
    pub artifact_content_hash: String,
    /// Marca de borrado con precisión de milisegundos.
    pub deletion_timestamp: DateTime<Utc>,
    /// Digest con llave secreta, en hexadecimal.
    pub proof_digest: String,
}
