// [libs/core/vault/src/engine.rs]
/*!
 * =================================================================
 * APARATO: DUAL CIPHER ENGINE (V5.3 - AEAD PREFERRED)
 * CLASIFICACIÓN: CORE SECURITY (ESTRATO L1)
 * RESPONSABILIDAD: SELLADO Y APERTURA AUTENTICADA DE ARTEFACTOS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. WIRE LAYOUT GCM: nonce(12) ∥ ciphertext+tag. El tag viaja fundido
 *    al ciphertext por el modo GCM.
 * 2. WIRE LAYOUT XOR-HMAC: nonce(16) ∥ ciphertext ∥ mac(32). El MAC
 *    cubre nonce y ciphertext.
 * 3. NONCE UNIQUENESS: Entropía del sistema por registro sellado; el
 *    mismo plaintext produce ciphertexts distintos en cada sellado.
 * =================================================================
 */

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key, Nonce,
};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::keys::ArtifactKey;
use crate::VaultError;

type HmacSha256 = Hmac<Sha256>;

const GCM_NONCE_LENGTH: usize = 12;
const GCM_TAG_LENGTH: usize = 16;
const XOR_NONCE_LENGTH: usize = 16;
const XOR_MAC_LENGTH: usize = 32;
const KEYSTREAM_BLOCK_LENGTH: usize = 32;

/// Algoritmo de sellado seleccionable por configuración.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CipherAlgorithm {
    /// AES-256-GCM (preferido): confidencialidad + integridad del modo AEAD.
    AeadGcm256,
    /// Keystream XOR con llave + HMAC-SHA256 (fallback verificable).
    XorHmac,
}

/// Resultado de un sellado: bytes listos para disco más el algoritmo usado.
#[derive(Debug, Clone)]
pub struct SealedPayload {
    pub ciphertext: Vec<u8>,
    pub algorithm: CipherAlgorithm,
}

pub struct VaultCryptoEngine;

impl VaultCryptoEngine {
    /**
     * Sella un plaintext bajo la llave del trabajo con el algoritmo indicado.
     *
     * # Errors:
     * El sellado GCM solo colapsa ante material de llave malformado, lo
     * cual es imposible por construcción de 'ArtifactKey'; el fallback
     * es total.
     */
    pub fn seal(
        artifact_key: &ArtifactKey,
        plaintext: &[u8],
        algorithm: CipherAlgorithm,
    ) -> Result<SealedPayload, VaultError> {
        match algorithm {
            CipherAlgorithm::AeadGcm256 => Self::seal_gcm(artifact_key, plaintext),
            CipherAlgorithm::XorHmac => Ok(Self::seal_xor_hmac(artifact_key, plaintext)),
        }
    }

    /**
     * Abre un buffer sellado verificando integridad de forma obligatoria.
     *
     * # Errors:
     * - `VaultError::Truncated`: el buffer no contiene nonce y tag completos.
     * - `VaultError::Integrity`: tag o MAC no verifican (corrupción o llave errónea).
     */
    pub fn open(
        artifact_key: &ArtifactKey,
        sealed_bytes: &[u8],
        algorithm: CipherAlgorithm,
    ) -> Result<Vec<u8>, VaultError> {
        match algorithm {
            CipherAlgorithm::AeadGcm256 => Self::open_gcm(artifact_key, sealed_bytes),
            CipherAlgorithm::XorHmac => Self::open_xor_hmac(artifact_key, sealed_bytes),
        }
    }

    // --- ESTRATO GCM (PREFERIDO) ---

    fn seal_gcm(artifact_key: &ArtifactKey, plaintext: &[u8]) -> Result<SealedPayload, VaultError> {
        let key = Key::<Aes256Gcm>::from_slice(artifact_key.material());
        let cipher_engine = Aes256Gcm::new(key);

        let mut nonce_material = [0u8; GCM_NONCE_LENGTH];
        rand::thread_rng().fill_bytes(&mut nonce_material);
        let nonce = Nonce::from_slice(&nonce_material);

        let sealed_body = cipher_engine
            .encrypt(nonce, plaintext)
            .map_err(|_| VaultError::Integrity)?;

        let mut wire_buffer = Vec::with_capacity(GCM_NONCE_LENGTH + sealed_body.len());
        wire_buffer.extend_from_slice(&nonce_material);
        wire_buffer.extend_from_slice(&sealed_body);

        Ok(SealedPayload {
            ciphertext: wire_buffer,
            algorithm: CipherAlgorithm::AeadGcm256,
        })
    }

    fn open_gcm(artifact_key: &ArtifactKey, sealed_bytes: &[u8]) -> Result<Vec<u8>, VaultError> {
        if sealed_bytes.len() < GCM_NONCE_LENGTH + GCM_TAG_LENGTH {
            return Err(VaultError::Truncated(sealed_bytes.len()));
        }

        let (nonce_material, sealed_body) = sealed_bytes.split_at(GCM_NONCE_LENGTH);
        let key = Key::<Aes256Gcm>::from_slice(artifact_key.material());
        let cipher_engine = Aes256Gcm::new(key);
        let nonce = Nonce::from_slice(nonce_material);

        cipher_engine
            .decrypt(nonce, sealed_body)
            .map_err(|_| VaultError::Integrity)
    }

    // --- ESTRATO XOR-HMAC (FALLBACK) ---

    fn seal_xor_hmac(artifact_key: &ArtifactKey, plaintext: &[u8]) -> SealedPayload {
        let (stream_key, mac_key) = Self::split_fallback_keys(artifact_key);

        let mut nonce_material = [0u8; XOR_NONCE_LENGTH];
        rand::thread_rng().fill_bytes(&mut nonce_material);

        let mut body = plaintext.to_vec();
        Self::apply_keystream(&stream_key, &nonce_material, &mut body);

        let mac_engine = Self::mac_over(&mac_key, &nonce_material, &body);

        let mut wire_buffer =
            Vec::with_capacity(XOR_NONCE_LENGTH + body.len() + XOR_MAC_LENGTH);
        wire_buffer.extend_from_slice(&nonce_material);
        wire_buffer.extend_from_slice(&body);
        wire_buffer.extend_from_slice(&mac_engine);

        SealedPayload {
            ciphertext: wire_buffer,
            algorithm: CipherAlgorithm::XorHmac,
        }
    }

    fn open_xor_hmac(artifact_key: &ArtifactKey, sealed_bytes: &[u8]) -> Result<Vec<u8>, VaultError> {
        if sealed_bytes.len() < XOR_NONCE_LENGTH + XOR_MAC_LENGTH {
            return Err(VaultError::Truncated(sealed_bytes.len()));
        }

        let (nonce_material, remainder) = sealed_bytes.split_at(XOR_NONCE_LENGTH);
        let (body, transported_mac) = remainder.split_at(remainder.len() - XOR_MAC_LENGTH);

        let (stream_key, mac_key) = Self::split_fallback_keys(artifact_key);

        // Verificación del MAC en tiempo constante antes de tocar el keystream.
        let mut transport_verifier =
            <HmacSha256 as Mac>::new_from_slice(&mac_key).expect("HMAC accepts any key length");
        transport_verifier.update(nonce_material);
        transport_verifier.update(body);
        transport_verifier
            .verify_slice(transported_mac)
            .map_err(|_| VaultError::Integrity)?;

        let mut recovered = body.to_vec();
        Self::apply_keystream(&stream_key, nonce_material, &mut recovered);
        Ok(recovered)
    }

    /// Separa las llaves de cifrado y autenticación del material del trabajo.
    fn split_fallback_keys(artifact_key: &ArtifactKey) -> ([u8; 32], [u8; 32]) {
        let derive = |domain_label: &[u8]| -> [u8; 32] {
            let mut hasher = Sha256::new();
            hasher.update(artifact_key.material());
            hasher.update(domain_label);
            hasher.finalize().into()
        };
        (derive(b"helixgate_stream"), derive(b"helixgate_mac"))
    }

    /// Keystream en modo contador: bloque_i = SHA256(llave ∥ nonce ∥ i).
    fn apply_keystream(stream_key: &[u8; 32], nonce_material: &[u8], buffer: &mut [u8]) {
        let mut block_index: u64 = 0;
        for chunk in buffer.chunks_mut(KEYSTREAM_BLOCK_LENGTH) {
            let mut hasher = Sha256::new();
            hasher.update(stream_key);
            hasher.update(nonce_material);
            hasher.update(block_index.to_le_bytes());
            let keystream_block = hasher.finalize();

            for (byte, keystream_byte) in chunk.iter_mut().zip(keystream_block.iter()) {
                *byte ^= keystream_byte;
            }
            block_index += 1;
        }
    }

    fn mac_over(mac_key: &[u8; 32], nonce_material: &[u8], body: &[u8]) -> [u8; XOR_MAC_LENGTH] {
        let mut mac_engine =
            <HmacSha256 as Mac>::new_from_slice(mac_key).expect("HMAC accepts any key length");
        mac_engine.update(nonce_material);
        mac_engine.update(body);
        mac_engine.finalize().into_bytes().into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::derive_artifact_key;

    fn proving_key() -> ArtifactKey {
        derive_artifact_key(b"proving-grounds-secret", "JOB_CIPHER")
    }

    /**
     * CERTIFICACIÓN: Roundtrip bajo ambos algoritmos con verificación
     * de integridad en la apertura.
     */
    #[test]
    fn certify_dual_cipher_roundtrip() {
        let key_instance = proving_key();
        let plaintext = b">chr1\nACGTACGTNNNN-ACGT\n".to_vec();

        for algorithm in [CipherAlgorithm::AeadGcm256, CipherAlgorithm::XorHmac] {
            let sealed = VaultCryptoEngine::seal(&key_instance, &plaintext, algorithm)
                .expect("CRITICAL_FAULT: Seal collapsed.");
            assert_eq!(sealed.algorithm, algorithm);
            assert!(sealed.ciphertext.len() > plaintext.len());

            let recovered = VaultCryptoEngine::open(&key_instance, &sealed.ciphertext, algorithm)
                .expect("CRITICAL_FAULT: Open collapsed.");
            assert_eq!(recovered, plaintext);
        }
    }

    /**
     * CERTIFICACIÓN: Un solo bit mutado en disco invalida la apertura
     * en ambos modos.
     */
    #[test]
    fn certify_single_bit_tamper_detection() {
        let key_instance = proving_key();
        let plaintext = vec![0xA5u8; 4096];

        for algorithm in [CipherAlgorithm::AeadGcm256, CipherAlgorithm::XorHmac] {
            let mut sealed = VaultCryptoEngine::seal(&key_instance, &plaintext, algorithm)
                .unwrap()
                .ciphertext;
            let flip_position = sealed.len() / 2;
            sealed[flip_position] ^= 0x01;

            let verdict = VaultCryptoEngine::open(&key_instance, &sealed, algorithm);
            assert!(
                matches!(verdict, Err(VaultError::Integrity)),
                "TAMPER_UNDETECTED under {:?}",
                algorithm
            );
        }
    }

    #[test]
    fn certify_wrong_key_rejected() {
        let sealing_key = proving_key();
        let foreign_key = derive_artifact_key(b"proving-grounds-secret", "JOB_FOREIGN");

        let sealed =
            VaultCryptoEngine::seal(&sealing_key, b"payload", CipherAlgorithm::AeadGcm256).unwrap();
        let verdict =
            VaultCryptoEngine::open(&foreign_key, &sealed.ciphertext, CipherAlgorithm::AeadGcm256);
        assert!(matches!(verdict, Err(VaultError::Integrity)));
    }

    #[test]
    fn certify_truncated_payload_rejected() {
        let key_instance = proving_key();
        for algorithm in [CipherAlgorithm::AeadGcm256, CipherAlgorithm::XorHmac] {
            let verdict = VaultCryptoEngine::open(&key_instance, &[0u8; 8], algorithm);
            assert!(matches!(verdict, Err(VaultError::Truncated(8))));
        }
    }

    #[test]
    fn certify_nonce_uniqueness_across_seals() {
        let key_instance = proving_key();
        let first = VaultCryptoEngine::seal(&key_instance, b"same", CipherAlgorithm::AeadGcm256)
            .unwrap()
            .ciphertext;
        let second = VaultCryptoEngine::seal(&key_instance, b"same", CipherAlgorithm::AeadGcm256)
            .unwrap()
            .ciphertext;
        assert_ne!(first, second, "NONCE_REUSE: identical wire material detected.");
    }
}
