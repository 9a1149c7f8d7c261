// [libs/infra/store/src/schema.rs]
/**
 * =================================================================
 * APARATO: METADATA SCHEMA ENGINE (V7.2 - DELETION LEDGER)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: GOBERNANZA ESTRUCTURAL E IDEMPOTENCIA TOTAL
 *
 * VISION HIPER-HOLÍSTICA:
 * 1. ARTIFACT INDEX: Tabla 'artifacts' con trazabilidad criptográfica
 *    completa (hash, algoritmo, huella de llave).
 * 2. APPEND-ONLY LEDGER: Tabla 'deletions' como bitácora de pruebas
 *    de borrado, una fila por trabajo.
 * 3. IDEMPOTENCIA: Gestión de errores para migraciones en caliente.
 * 4. PERFORMANCE: Índices de aceleración para consultas por hash.
 * =================================================================
 */

use anyhow::{Context, Result};
use libsql::Connection;
use tracing::{debug, info, instrument, warn};

/**
 * ESTRATO 1: SOLIDIFICACIÓN (Génesis de Tablas)
 * Define las entidades base del índice de metadatos.
 */
const METADATA_TABLES: &[(&str, &str)] = &[
    ("TABLE_ARTIFACTS", r#"
        CREATE TABLE IF NOT EXISTS artifacts (
            job_id TEXT PRIMARY KEY,
            content_hash TEXT NOT NULL,
            ciphertext_path TEXT NOT NULL,
            algorithm_tag TEXT NOT NULL,
            key_fingerprint TEXT NOT NULL,
            original_size INTEGER NOT NULL,
            stored_size INTEGER NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );
    "#),
    ("TABLE_DELETIONS", r#"
        CREATE TABLE IF NOT EXISTS deletions (
            job_id TEXT PRIMARY KEY,
            content_hash TEXT NOT NULL,
            deletion_ts TEXT NOT NULL,
            proof_digest TEXT NOT NULL
        );
    "#),
];

/**
 * ESTRATO 2: EVOLUCIÓN (Mutaciones de Columna)
 * Asegura que índices desplegados con esquemas previos se adapten.
 */
const EVOLUTIONARY_STRATA: &[(&str, &str)] = &[
    ("ARTIFACT_CREATED_AT", "ALTER TABLE artifacts ADD COLUMN created_at DATETIME DEFAULT CURRENT_TIMESTAMP"),
];

/**
 * ESTRATO 3: ENDURECIMIENTO (Índices de Aceleración)
 * Optimiza la resolución content-addressed de 'get'.
 */
const ACCELERATION_INDEXES: &[(&str, &str)] = &[
    ("IDX_ARTIFACTS_HASH", "CREATE INDEX IF NOT EXISTS idx_artifacts_content_hash ON artifacts(content_hash);"),
    ("IDX_DELETIONS_HASH", "CREATE INDEX IF NOT EXISTS idx_deletions_content_hash ON deletions(content_hash);"),
];

/**
 * Ejecuta la secuencia maestra de sincronización del esquema estructural.
 *
 * # Errors:
 * Retorna error si alguna tabla base falla en solidificarse, indicando
 * un colapso en el enlace con el sustrato libSQL.
 */
#[instrument(skip(database_connection))]
pub async fn apply_full_metadata_schema(database_connection: &Connection) -> Result<()> {
    info!("🏗️ [SCHEMA_ENGINE]: Initiating structural synchronization V7.2...");

    solidify_base_strata(database_connection).await?;
    execute_evolutionary_repair(database_connection).await?;
    harden_access_layer(database_connection).await?;

    info!("✅ [SCHEMA_ENGINE]: Metadata index V7.2 level and certified.");
    Ok(())
}

async fn solidify_base_strata(db: &Connection) -> Result<()> {
    for (identifier, sql) in METADATA_TABLES {
        debug!("  ↳ Solidifying: {}", identifier);
        db.execute(*sql, ())
            .await
            .with_context(|| format!("CRITICAL_SOLIDIFICATION_FAULT: {}", identifier))?;
    }
    Ok(())
}

async fn execute_evolutionary_repair(db: &Connection) -> Result<()> {
    for (identifier, sql) in EVOLUTIONARY_STRATA {
        match db.execute(*sql, ()).await {
            Ok(_) => info!("  🟢 [REPAIR_OK]: Applied evolutionary stratum {}", identifier),
            Err(fault) => {
                let message = fault.to_string();
                if message.contains("duplicate column name") {
                    debug!("  ⚪ [REPAIR_SKIP]: {} already level.", identifier);
                } else {
                    warn!("  ⚠️ [REPAIR_BYPASS]: {} check incomplete: {}", identifier, message);
                }
            }
        }
    }
    Ok(())
}

async fn harden_access_layer(db: &Connection) -> Result<()> {
    for (identifier, sql) in ACCELERATION_INDEXES {
        debug!("  ↳ Hardening: {}", identifier);
        db.execute(*sql, ())
            .await
            .with_context(|| format!("CRITICAL_HARDENING_FAULT: {}", identifier))?;
    }
    Ok(())
}
