// [libs/infra/store/src/client.rs]
/*!
 * =================================================================
 * APARATO: METADATA CONNECTION CLIENT (V7.1 - MEMORY ANCHORED)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: GESTIÓN DE ENLACES AL ÍNDICE DE METADATOS
 *
 * # Mathematical Proof (In-Memory Consistency):
 * Para garantizar que el esquema sea visible entre hilos en modo RAM,
 * el cliente detecta URLs de memoria y aplica el ancla de persistencia
 * ANTES de la ejecución del bootstrap, asegurando que las tablas
 * residan en un segmento de memoria compartido.
 * =================================================================
 */

use crate::errors::StoreError;
use crate::schema::apply_full_metadata_schema;
use libsql::{Builder, Connection, Database};
use std::sync::Arc;
use tracing::{error, info, instrument};

#[derive(Clone)]
pub struct MetaClient {
    internal_database_driver: Arc<Database>,
    /// Mantiene la base viva en memoria evitando que SQLite la purgue.
    _memory_persistence_anchor: Option<Arc<Connection>>,
}

impl MetaClient {
    #[instrument]
    pub async fn connect(database_connection_url: &str) -> Result<Self, StoreError> {
        if database_connection_url.is_empty() {
            return Err(StoreError::Connection("CRITICAL_FAULT: METADATA_URL_UNDEFINED".into()));
        }

        info!("🔌 [METADATA]: Initiating index link synchronization to [{}]", database_connection_url);

        let is_memory = database_connection_url.contains(":memory:")
            || database_connection_url.contains("mode=memory");

        let database_driver = Builder::new_local(database_connection_url)
            .build()
            .await
            .map_err(|fault| StoreError::Connection(format!("DRIVER_IGNITION_FAILURE: {}", fault)))?;

        let shared_driver = Arc::new(database_driver);
        let mut anchor = None;

        if is_memory {
            // En modo memoria abrimos el ancla ANTES que cualquier otra operación.
            let anchor_connection = shared_driver
                .connect()
                .map_err(|fault| StoreError::Connection(format!("ANCHOR_FAULT: {}", fault)))?;

            apply_full_metadata_schema(&anchor_connection)
                .await
                .map_err(|fault| StoreError::Connection(format!("SCHEMA_SYNC_FAULT: {}", fault)))?;

            anchor = Some(Arc::new(anchor_connection));
            info!("⚓ [METADATA]: Memory strata solidified and anchored.");
        } else {
            let bootstrap_connection = shared_driver
                .connect()
                .map_err(|fault| StoreError::Connection(format!("BOOTSTRAP_LINK_FAULT: {}", fault)))?;
            apply_full_metadata_schema(&bootstrap_connection)
                .await
                .map_err(|fault| StoreError::Connection(format!("SCHEMA_SYNC_FAULT: {}", fault)))?;
        }

        Ok(Self {
            internal_database_driver: shared_driver,
            _memory_persistence_anchor: anchor,
        })
    }

    pub fn get_connection(&self) -> Result<Connection, StoreError> {
        self.internal_database_driver.connect().map_err(|fault| {
            error!("⚠️ [POOL_FAULT]: Connection allocation failed: {}", fault);
            StoreError::Connection(fault.to_string())
        })
    }
}
