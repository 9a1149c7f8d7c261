// [libs/infra/store/src/lib.rs]
/*!
 * =================================================================
 * APARATO: STORE CRATE ROOT (V7.0)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: EXPORTACIÓN NOMINAL DEL ALMACÉN DE OBJETOS
 * =================================================================
 */

pub mod blob;
pub mod client;
pub mod errors;
pub mod proof;
pub mod schema;
pub mod store;

pub use blob::BlobVault;
pub use client::MetaClient;
pub use errors::StoreError;
pub use proof::ProofSigner;
pub use store::ObjectStore;
