// [libs/core/vault/src/keys.rs]
/*!
 * =================================================================
 * APARATO: ARTIFACT KEY DERIVATION (V5.1 - DETERMINISTIC STRATA)
 * CLASIFICACIÓN: CORE SECURITY (ESTRATO L1)
 * RESPONSABILIDAD: DERIVACIÓN PBKDF2 POR TRABAJO Y HUELLAS DE LLAVE
 *
 * # Mathematical Proof (Per-Job Isolation):
 * La sal incorpora el identificador del trabajo, por lo que dos trabajos
 * jamás comparten material de llave aunque compartan secreto de proceso
 * y contenido. Comprometer una llave derivada no revela el secreto:
 * PBKDF2-HMAC-SHA256 es unidireccional bajo el modelo de oráculo aleatorio.
 * =================================================================
 */

use pbkdf2::pbkdf2_hmac;
use sha2::{Digest, Sha256};

/// Iteraciones de endurecimiento de la derivación.
const PBKDF2_ITERATIONS: u32 = 150_000;
/// Longitud de llave simétrica (AES-256 / HMAC-SHA256).
const KEY_LENGTH_BYTES: usize = 32;
/// Prefijo de sal versionado del esquema de derivación.
const SALT_DOMAIN_PREFIX: &str = "helixgate_artifact_v1_";

/// Material de llave de 256 bits para el sellado de un artefacto.
///
/// El material vive en RAM durante el ciclo de vida del trabajo y jamás
/// se serializa; únicamente su huella viaja en los metadatos.
#[derive(Clone)]
pub struct ArtifactKey {
    material: [u8; KEY_LENGTH_BYTES],
}

impl ArtifactKey {
    pub fn from_material(material: [u8; KEY_LENGTH_BYTES]) -> Self {
        Self { material }
    }

    pub fn material(&self) -> &[u8; KEY_LENGTH_BYTES] {
        &self.material
    }

    /// SHA-256 del material, en hexadecimal. Jamás la llave.
    pub fn fingerprint(&self) -> String {
        fingerprint_key(&self.material)
    }

    /// Borra el material de RAM. El sellado final del pipeline lo invoca.
    pub fn scrub(&mut self) {
        self.material.fill(0);
    }
}

impl std::fmt::Debug for ArtifactKey {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // El material nunca se vuelca en logs ni en pánicos.
        write!(formatter, "ArtifactKey(fingerprint={})", &self.fingerprint()[..16])
    }
}

/**
 * Deriva el material de llave determinista de un artefacto.
 *
 * La etiqueta de vínculo es el hash de contenido del artefacto: cargas
 * idénticas rederivan la misma llave, de modo que el blob deduplicado
 * verifica bajo una única huella.
 *
 * # Mathematical Proof:
 * PBKDF2-HMAC-SHA256(secreto, sal = prefijo ∥ etiqueta) con 150.000
 * iteraciones produce 256 bits estables: la misma etiqueta rederiva la
 * misma llave en cualquier réplica del proceso.
 */
pub fn derive_artifact_key(server_secret: &[u8], binding_label: &str) -> ArtifactKey {
    let salt_material = format!("{}{}", SALT_DOMAIN_PREFIX, binding_label);

    let mut derived_key_buffer = [0u8; KEY_LENGTH_BYTES];
    pbkdf2_hmac::<Sha256>(
        server_secret,
        salt_material.as_bytes(),
        PBKDF2_ITERATIONS,
        &mut derived_key_buffer,
    );

    ArtifactKey::from_material(derived_key_buffer)
}

/// SHA-256 de un material de llave, en hexadecimal minúscula.
pub fn fingerprint_key(key_material: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key_material);
    hex::encode(hasher.finalize())
}
