// [libs/infra/store/src/blob.rs]
/*!
 * =================================================================
 * APARATO: CONTENT-ADDRESSED BLOB VAULT (V7.1 - ATOMIC RENAME)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: ARCHIVOS DE CIPHERTEXT BAJO DIRECCIONAMIENTO SHA-256
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. LAYOUT: blobs/ab/cdef… donde 'ab' son los dos primeros caracteres
 *    hexadecimales del hash de contenido.
 * 2. ATOMIC WRITES: Hermano temporal + rename. Escritores concurrentes
 *    del mismo hash convergen al mismo contenido por idempotencia.
 * 3. OWNER ONLY: Permisos 0600 sobre el archivo final en Unix.
 *
 * # Mathematical Proof (Rename Atomicity):
 * rename(2) dentro del mismo sistema de archivos es atómico: ningún
 * lector observa jamás un ciphertext parcial bajo la ruta final.
 * =================================================================
 */

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::errors::StoreError;

/// Bóveda de blobs anclada a un directorio raíz.
#[derive(Debug, Clone)]
pub struct BlobVault {
    root_directory: PathBuf,
}

impl BlobVault {
    pub fn new(root_directory: &Path) -> Result<Self, StoreError> {
        fs::create_dir_all(root_directory)?;
        Ok(Self { root_directory: root_directory.to_path_buf() })
    }

    /// Ruta relativa derivada del hash: "ab/cdef…".
    pub fn relative_path_for(content_hash: &str) -> String {
        format!("{}/{}", &content_hash[..2], &content_hash[2..])
    }

    pub fn absolute_path_for(&self, content_hash: &str) -> PathBuf {
        self.root_directory.join(Self::relative_path_for(content_hash))
    }

    /**
     * Escribe el ciphertext de forma atómica y devuelve la ruta relativa.
     *
     * La secuencia completa es síncrona: el hermano temporal se descarta
     * solo en caso de fallo, y el rename final es indivisible.
     */
    pub fn write_atomic(&self, content_hash: &str, sealed_bytes: &[u8]) -> Result<String, StoreError> {
        let final_path = self.absolute_path_for(content_hash);
        let shard_directory = final_path
            .parent()
            .ok_or_else(|| StoreError::Storage("BLOB_PATH_WITHOUT_PARENT".into()))?;
        fs::create_dir_all(shard_directory)?;

        let mut temporary_sibling = NamedTempFile::new_in(shard_directory)?;
        std::io::Write::write_all(&mut temporary_sibling, sealed_bytes)?;
        temporary_sibling.flush()?;

        temporary_sibling
            .persist(&final_path)
            .map_err(|persist_fault| StoreError::Storage(persist_fault.to_string()))?;

        restrict_to_owner(&final_path)?;
        debug!("💾 [BLOB_VAULT]: Sealed {} bytes at {}", sealed_bytes.len(), final_path.display());

        Ok(Self::relative_path_for(content_hash))
    }

    pub fn read(&self, content_hash: &str) -> Result<Vec<u8>, StoreError> {
        let blob_path = self.absolute_path_for(content_hash);
        match fs::read(&blob_path) {
            Ok(sealed_bytes) => Ok(sealed_bytes),
            Err(io_fault) if io_fault.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound)
            }
            Err(io_fault) => Err(io_fault.into()),
        }
    }

    /// Elimina el blob. La ausencia previa se tolera (borrado idempotente).
    pub fn remove(&self, content_hash: &str) -> Result<(), StoreError> {
        let blob_path = self.absolute_path_for(content_hash);
        match fs::remove_file(&blob_path) {
            Ok(()) => Ok(()),
            Err(io_fault) if io_fault.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(io_fault) => Err(io_fault.into()),
        }
    }

    pub fn exists(&self, content_hash: &str) -> bool {
        self.absolute_path_for(content_hash).is_file()
    }
}

#[cfg(unix)]
fn restrict_to_owner(final_path: &Path) -> Result<(), StoreError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(final_path, fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_to_owner(_final_path: &Path) -> Result<(), StoreError> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_HASH: &str = "ab12cd34ef56ab12cd34ef56ab12cd34ef56ab12cd34ef56ab12cd34ef56ab12";

    #[test]
    fn certify_sharded_layout() {
        assert_eq!(
            BlobVault::relative_path_for(SAMPLE_HASH),
            format!("ab/{}", &SAMPLE_HASH[2..])
        );
    }

    #[test]
    fn certify_atomic_write_and_read() {
        let workspace = tempfile::tempdir().unwrap();
        let vault = BlobVault::new(workspace.path()).unwrap();

        let relative_path = vault.write_atomic(SAMPLE_HASH, b"sealed-material").unwrap();
        assert_eq!(relative_path, BlobVault::relative_path_for(SAMPLE_HASH));
        assert!(vault.exists(SAMPLE_HASH));
        assert_eq!(vault.read(SAMPLE_HASH).unwrap(), b"sealed-material");
    }

    #[test]
    fn certify_idempotent_concurrent_content() {
        let workspace = tempfile::tempdir().unwrap();
        let vault = BlobVault::new(workspace.path()).unwrap();

        vault.write_atomic(SAMPLE_HASH, b"same-content").unwrap();
        vault.write_atomic(SAMPLE_HASH, b"same-content").unwrap();
        assert_eq!(vault.read(SAMPLE_HASH).unwrap(), b"same-content");
    }

    #[test]
    fn certify_remove_tolerates_absence() {
        let workspace = tempfile::tempdir().unwrap();
        let vault = BlobVault::new(workspace.path()).unwrap();

        vault.write_atomic(SAMPLE_HASH, b"to-be-deleted").unwrap();
        vault.remove(SAMPLE_HASH).unwrap();
        assert!(!vault.exists(SAMPLE_HASH));
        // Segunda pasada sobre un blob ausente: silencio nominal.
        vault.remove(SAMPLE_HASH).unwrap();
    }

    #[test]
    fn certify_missing_blob_is_not_found() {
        let workspace = tempfile::tempdir().unwrap();
        let vault = BlobVault::new(workspace.path()).unwrap();
        assert!(matches!(vault.read(SAMPLE_HASH), Err(StoreError::NotFound)));
    }

    #[cfg(unix)]
    #[test]
    fn certify_owner_only_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let workspace = tempfile::tempdir().unwrap();
        let vault = BlobVault::new(workspace.path()).unwrap();
        vault.write_atomic(SAMPLE_HASH, b"private").unwrap();

        let mode = std::fs::metadata(vault.absolute_path_for(SAMPLE_HASH))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
