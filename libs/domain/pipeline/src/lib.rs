// [libs/domain/pipeline/src/lib.rs]
/*!
 * =================================================================
 * APARATO: PIPELINE CRATE ROOT (V6.0)
 * CLASIFICACIÓN: DOMAIN ENGINE (ESTRATO L2)
 * RESPONSABILIDAD: EXPORTACIÓN NOMINAL DEL MOTOR DE INGESTA
 * =================================================================
 */

pub mod analyzer;
pub mod events;
pub mod executor;
pub mod service;
pub mod worker;

pub use analyzer::{AnalysisError, CompositionProfiler, SequenceAnalyzer};
pub use events::EventBus;
pub use executor::PipelineExecutor;
pub use service::{IntakeError, IntakeService};
pub use worker::{QueuedJob, WorkerPool};
