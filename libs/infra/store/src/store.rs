// [libs/infra/store/src/store.rs]
/*!
 * =================================================================
 * APARATO: ENCRYPTED OBJECT STORE (V7.3 - CONTENT ADDRESSED)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: CICLO DE VIDA DURABLE DE ARTEFACTOS CIFRADOS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. PUT DISCIPLINE: hash -> sellado -> rename atómico -> fila de
 *    metadatos. Ante cualquier colapso la fila no existe y el blob
 *    parcial se retira.
 * 2. GET DISCIPLINE: El almacén jamás lee plaintext de su propio disco;
 *    toda lectura verifica el tag de autenticación antes de devolver.
 * 3. DELETE LEDGER: Borrado idempotente con bitácora append-only; la
 *    segunda invocación devuelve la prueba original, mismo timestamp.
 *
 * # Mathematical Proof (Metadata Invariant):
 * Toda fila de 'artifacts' se inserta después del rename y se retira
 * antes de sellar la bitácora de borrado. Por lo tanto, para todo
 * content_hash presente en metadatos, el archivo de ciphertext existe
 * y su integridad verifica bajo el algoritmo registrado.
 * =================================================================
 */

use chrono::{DateTime, Utc};
use libsql::params;
use sha2::{Digest, Sha256};
use std::path::Path;
use tracing::{info, instrument, warn};

use helixgate_core_vault::{ArtifactKey, CipherAlgorithm, VaultCryptoEngine};
use helixgate_domain_models::{AlgorithmTag, ArtifactRef, DeletionProof};

use crate::blob::BlobVault;
use crate::client::MetaClient;
use crate::errors::StoreError;
use crate::proof::ProofSigner;

const INSERT_ARTIFACT: &str = "INSERT INTO artifacts \
    (job_id, content_hash, ciphertext_path, algorithm_tag, key_fingerprint, original_size, stored_size) \
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)";

const SELECT_ARTIFACT_BY_HASH: &str = "SELECT content_hash, ciphertext_path, algorithm_tag, \
    key_fingerprint, original_size, stored_size FROM artifacts WHERE content_hash = ?1 LIMIT 1";

const SELECT_ARTIFACT_BY_JOB: &str = "SELECT content_hash, ciphertext_path, algorithm_tag, \
    key_fingerprint, original_size, stored_size FROM artifacts WHERE job_id = ?1 LIMIT 1";

const COUNT_HASH_REFERENCES: &str = "SELECT COUNT(*) FROM artifacts WHERE content_hash = ?1";

const DELETE_ARTIFACT_ROW: &str = "DELETE FROM artifacts WHERE job_id = ?1";

const INSERT_DELETION: &str =
    "INSERT INTO deletions (job_id, content_hash, deletion_ts, proof_digest) VALUES (?1, ?2, ?3, ?4)";

const SELECT_DELETION: &str =
    "SELECT content_hash, deletion_ts, proof_digest FROM deletions WHERE job_id = ?1 LIMIT 1";

/// Fachada soberana del almacén de objetos cifrados.
pub struct ObjectStore {
    blob_vault: BlobVault,
    meta_client: MetaClient,
    proof_signer: ProofSigner,
    cipher_algorithm: CipherAlgorithm,
}

impl ObjectStore {
    /**
     * Abre el almacén: ancla el directorio de blobs y sincroniza el
     * esquema del índice de metadatos.
     */
    pub async fn open(
        blob_root_directory: &Path,
        metadata_url: &str,
        server_secret: Vec<u8>,
        cipher_algorithm: CipherAlgorithm,
    ) -> Result<Self, StoreError> {
        let blob_vault = BlobVault::new(blob_root_directory)?;
        let meta_client = MetaClient::connect(metadata_url).await?;

        Ok(Self {
            blob_vault,
            meta_client,
            proof_signer: ProofSigner::new(server_secret),
            cipher_algorithm,
        })
    }

    /// SHA-256 del plaintext en hexadecimal minúscula (identidad del artefacto).
    pub fn content_hash(plaintext: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(plaintext);
        hex::encode(hasher.finalize())
    }

    pub fn signer(&self) -> &ProofSigner {
        &self.proof_signer
    }

    /**
     * Sella un plaintext bajo la llave del trabajo y registra sus metadatos.
     *
     * # Errors:
     * `StoreError::Storage` ante colapso de I/O; en tal caso el blob
     * parcial queda retirado y la fila jamás existió.
     */
    #[instrument(skip(self, plaintext, artifact_key), fields(job = %job_identifier))]
    pub async fn put(
        &self,
        job_identifier: &str,
        plaintext: &[u8],
        artifact_key: &ArtifactKey,
    ) -> Result<ArtifactRef, StoreError> {
        let content_hash = Self::content_hash(plaintext);

        // 1. SELLADO CRIPTOGRÁFICO (CPU, sin I/O)
        let sealed_payload = VaultCryptoEngine::seal(artifact_key, plaintext, self.cipher_algorithm)?;
        let stored_size = sealed_payload.ciphertext.len() as u64;

        // 2. CRISTALIZACIÓN ATÓMICA DEL BLOB (hermano temporal + rename)
        let ciphertext_path = self.blob_vault.write_atomic(&content_hash, &sealed_payload.ciphertext)?;

        // 3. FILA DE METADATOS (la fila solo existe si el blob ya existe)
        let algorithm_tag = algorithm_tag_of(self.cipher_algorithm);
        let connection = self.meta_client.get_connection()?;
        let insert_result = connection
            .execute(
                INSERT_ARTIFACT,
                params![
                    job_identifier,
                    content_hash.clone(),
                    ciphertext_path.clone(),
                    algorithm_tag.as_str(),
                    artifact_key.fingerprint(),
                    plaintext.len() as i64,
                    stored_size as i64
                ],
            )
            .await;

        if let Err(insert_fault) = insert_result {
            // Retiro del blob si nadie más lo referencia.
            self.remove_blob_if_unreferenced(&content_hash).await.ok();
            return Err(StoreError::Storage(format!("METADATA_INSERT_FAULT: {}", insert_fault)));
        }

        info!("📦 [OBJECT_STORE]: Artifact {} sealed ({} -> {} bytes).",
            &content_hash[..12], plaintext.len(), stored_size);

        Ok(ArtifactRef {
            content_hash,
            ciphertext_path,
            original_size: plaintext.len() as u64,
            stored_size,
            algorithm_tag,
            key_fingerprint: artifact_key.fingerprint(),
        })
    }

    /**
     * Recupera y descifra un artefacto verificando integridad.
     *
     * # Errors:
     * - `StoreError::NotFound`: sin fila de metadatos para el hash.
     * - `StoreError::Integrity`: tag o MAC no verifican.
     */
    #[instrument(skip(self, artifact_key))]
    pub async fn get(
        &self,
        content_hash: &str,
        artifact_key: &ArtifactKey,
    ) -> Result<Vec<u8>, StoreError> {
        let connection = self.meta_client.get_connection()?;
        let mut query_result = connection
            .query(SELECT_ARTIFACT_BY_HASH, params![content_hash])
            .await?;

        let Some(metadata_row) = query_result.next().await? else {
            return Err(StoreError::NotFound);
        };

        let algorithm_label: String = metadata_row.get(2)?;
        let algorithm_tag = AlgorithmTag::parse(&algorithm_label)
            .ok_or_else(|| StoreError::Mapping(format!("UNKNOWN_ALGORITHM_TAG: {}", algorithm_label)))?;

        let sealed_bytes = self.blob_vault.read(content_hash)?;

        let plaintext =
            VaultCryptoEngine::open(artifact_key, &sealed_bytes, cipher_algorithm_of(algorithm_tag))
                .map_err(|_| {
                    warn!("🛑 [OBJECT_STORE]: Integrity violation on {}", &content_hash[..12]);
                    StoreError::Integrity
                })?;

        Ok(plaintext)
    }

    /**
     * Borra el artefacto del trabajo y emite la prueba criptográfica.
     * Idempotente: una segunda invocación devuelve la prueba original
     * con el mismo timestamp de borrado.
     */
    #[instrument(skip(self), fields(job = %job_identifier))]
    pub async fn delete(&self, job_identifier: &str) -> Result<DeletionProof, StoreError> {
        // 1. BITÁCORA PRIMERO: ¿ya existe prueba sellada?
        if let Some(existing_proof) = self.lookup_proof(job_identifier).await? {
            return Ok(existing_proof);
        }

        // 2. RESOLUCIÓN DEL ARTEFACTO ACTIVO
        let connection = self.meta_client.get_connection()?;
        let mut query_result = connection
            .query(SELECT_ARTIFACT_BY_JOB, params![job_identifier])
            .await?;
        let Some(metadata_row) = query_result.next().await? else {
            return Err(StoreError::NotFound);
        };
        let content_hash: String = metadata_row.get(0)?;

        // 3. RETIRO DEL CIPHERTEXT (la ausencia previa se tolera; otro
        //    trabajo puede seguir referenciando el mismo contenido)
        let remaining_references = self.count_hash_references(&content_hash).await?;
        if remaining_references <= 1 {
            self.blob_vault.remove(&content_hash)?;
        }

        // 4. RETIRO DE LA FILA DE METADATOS
        connection
            .execute(DELETE_ARTIFACT_ROW, params![job_identifier])
            .await?;

        // 5. SELLADO DE LA PRUEBA EN LA BITÁCORA APPEND-ONLY
        let deletion_timestamp = Utc::now();
        let proof_digest =
            self.proof_signer
                .sign(job_identifier, &content_hash, &deletion_timestamp);

        connection
            .execute(
                INSERT_DELETION,
                params![
                    job_identifier,
                    content_hash.clone(),
                    ProofSigner::canonical_timestamp(&deletion_timestamp),
                    proof_digest.clone()
                ],
            )
            .await?;

        info!("🗑️ [OBJECT_STORE]: Artifact for job {} deleted. Proof sealed.", job_identifier);

        Ok(DeletionProof {
            job_id: job_identifier.to_string(),
            artifact_content_hash: content_hash,
            deletion_timestamp,
            proof_digest,
        })
    }

    /// Consulta la bitácora de borrados; NotFound si jamás hubo borrado.
    pub async fn proof(&self, job_identifier: &str) -> Result<DeletionProof, StoreError> {
        self.lookup_proof(job_identifier)
            .await?
            .ok_or(StoreError::NotFound)
    }

    /**
     * Deshace una persistencia interrumpida (cancelación o deadline):
     * retira la fila si llegó a existir y el blob si quedó huérfano.
     */
    pub async fn rollback(&self, job_identifier: &str, content_hash: &str) -> Result<(), StoreError> {
        let connection = self.meta_client.get_connection()?;
        connection
            .execute(DELETE_ARTIFACT_ROW, params![job_identifier])
            .await?;
        self.remove_blob_if_unreferenced(content_hash).await
    }

    // --- ESTRATO INTERNO ---

    async fn lookup_proof(&self, job_identifier: &str) -> Result<Option<DeletionProof>, StoreError> {
        let connection = self.meta_client.get_connection()?;
        let mut query_result = connection
            .query(SELECT_DELETION, params![job_identifier])
            .await?;

        let Some(deletion_row) = query_result.next().await? else {
            return Ok(None);
        };

        let content_hash: String = deletion_row.get(0)?;
        let timestamp_label: String = deletion_row.get(1)?;
        let proof_digest: String = deletion_row.get(2)?;

        let deletion_timestamp = DateTime::parse_from_rfc3339(&timestamp_label)
            .map_err(|parse_fault| StoreError::Mapping(format!("DELETION_TS_DRIFT: {}", parse_fault)))?
            .with_timezone(&Utc);

        Ok(Some(DeletionProof {
            job_id: job_identifier.to_string(),
            artifact_content_hash: content_hash,
            deletion_timestamp,
            proof_digest,
        }))
    }

    async fn count_hash_references(&self, content_hash: &str) -> Result<i64, StoreError> {
        let connection = self.meta_client.get_connection()?;
        let mut query_result = connection
            .query(COUNT_HASH_REFERENCES, params![content_hash])
            .await?;
        let Some(count_row) = query_result.next().await? else {
            return Ok(0);
        };
        Ok(count_row.get(0)?)
    }

    async fn remove_blob_if_unreferenced(&self, content_hash: &str) -> Result<(), StoreError> {
        if self.count_hash_references(content_hash).await? == 0 {
            self.blob_vault.remove(content_hash)?;
        }
        Ok(())
    }
}

fn algorithm_tag_of(cipher_algorithm: CipherAlgorithm) -> AlgorithmTag {
    match cipher_algorithm {
        CipherAlgorithm::AeadGcm256 => AlgorithmTag::AeadGcm256,
        CipherAlgorithm::XorHmac => AlgorithmTag::XorHmac,
    }
}

fn cipher_algorithm_of(algorithm_tag: AlgorithmTag) -> CipherAlgorithm {
    match algorithm_tag {
        AlgorithmTag::AeadGcm256 => CipherAlgorithm::AeadGcm256,
        AlgorithmTag::XorHmac => CipherAlgorithm::XorHmac,
    }
}
