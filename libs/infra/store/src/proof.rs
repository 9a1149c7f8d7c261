// [libs/infra/store/src/proof.rs]
/*!
 * =================================================================
 * APARATO: DELETION PROOF SIGNER (V7.0 - SECRET KEYED)
 * CLASIFICACIÓN: INFRASTRUCTURE CORE (ESTRATO L3)
 * RESPONSABILIDAD: EVIDENCIA CRIPTOGRÁFICA DE BORRADO DE ARTEFACTOS
 *
 * # Mathematical Proof (Unforgeability):
 * proof_digest = SHA256(job_id ∥ content_hash ∥ deletion_ts ∥ secreto).
 * Sin el secreto de proceso, forjar un digest válido equivale a hallar
 * una preimagen parcial de SHA-256. Un verificador con el secreto
 * recomputa y compara en tiempo constante.
 * =================================================================
 */

use chrono::{DateTime, SecondsFormat, Utc};
use sha2::{Digest, Sha256};

/// Firmante de pruebas de borrado. El secreto es legible únicamente
/// por este aparato y jamás se emite ni serializa.
pub struct ProofSigner {
    server_secret: Vec<u8>,
}

impl ProofSigner {
    pub fn new(server_secret: Vec<u8>) -> Self {
        Self { server_secret }
    }

    /// Canoniza la marca temporal al formato de firma (RFC3339, milisegundos).
    pub fn canonical_timestamp(deletion_timestamp: &DateTime<Utc>) -> String {
        deletion_timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// Digest con llave de proceso, en hexadecimal minúscula.
    pub fn sign(
        &self,
        job_identifier: &str,
        content_hash: &str,
        deletion_timestamp: &DateTime<Utc>,
    ) -> String {
        let mut hasher = Sha256::new();
        hasher.update(job_identifier.as_bytes());
        hasher.update(content_hash.as_bytes());
        hasher.update(Self::canonical_timestamp(deletion_timestamp).as_bytes());
        hasher.update(&self.server_secret);
        hex::encode(hasher.finalize())
    }

    /// Verifica una prueba recomputando la firma con el secreto local.
    pub fn verify(
        &self,
        job_identifier: &str,
        content_hash: &str,
        deletion_timestamp: &DateTime<Utc>,
        transported_digest: &str,
    ) -> bool {
        self.sign(job_identifier, content_hash, deletion_timestamp) == transported_digest
    }
}

impl std::fmt::Debug for ProofSigner {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "ProofSigner(secret=<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn certify_signature_recomputation() {
        let signer = ProofSigner::new(b"proving-grounds-secret".to_vec());
        let deletion_timestamp = Utc::now();

        let digest = signer.sign("JOB_PROOF", "abcd1234", &deletion_timestamp);
        assert_eq!(digest.len(), 64);
        assert!(signer.verify("JOB_PROOF", "abcd1234", &deletion_timestamp, &digest));
    }

    #[test]
    fn certify_secret_binding() {
        let signer_alpha = ProofSigner::new(b"secret-alpha".to_vec());
        let signer_beta = ProofSigner::new(b"secret-beta".to_vec());
        let deletion_timestamp = Utc::now();

        let digest = signer_alpha.sign("JOB_PROOF", "abcd1234", &deletion_timestamp);
        assert!(!signer_beta.verify("JOB_PROOF", "abcd1234", &deletion_timestamp, &digest));
    }

    #[test]
    fn certify_timestamp_binding() {
        let signer = ProofSigner::new(b"secret".to_vec());
        let first_timestamp = Utc::now();
        let shifted_timestamp = first_timestamp + chrono::Duration::milliseconds(1);

        let digest = signer.sign("JOB_PROOF", "abcd1234", &first_timestamp);
        assert!(!signer.verify("JOB_PROOF", "abcd1234", &shifted_timestamp, &digest));
    }
}
