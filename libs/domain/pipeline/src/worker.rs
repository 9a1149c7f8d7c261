// [libs/domain/pipeline/src/worker.rs]
/*!
 * =================================================================
 * APARATO: PIPELINE WORKER POOL (V6.2 - BOUNDED FIFO)
 * CLASIFICACIÓN: DOMAIN ENGINE (ESTRATO L2)
 * RESPONSABILIDAD: DRENAJE CONCURRENTE DE LA COLA DE TRABAJOS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. FIXED PARALLELISM: Un conjunto fijo de workers drena una FIFO
 *    acotada; cada worker sostiene exactamente un trabajo a la vez.
 * 2. BACK-PRESSURE: El encolado jamás bloquea; la cola llena se
 *    reporta al emisor como error de admisión.
 * 3. GRACEFUL DRAIN: El apagado suelta el emisor y espera a que cada
 *    worker concluya su trabajo en curso.
 *
 * # Mathematical Proof (Memory Bound):
 * A lo sumo queue_depth cargas esperan en la FIFO y workers cargas
 * están en vuelo, de modo que la memoria de buffers de subida está
 * acotada por (queue_depth + workers) × max_input_bytes.
 * =================================================================
 */

use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument};

use crate::executor::PipelineExecutor;

/// Unidad encolada: identidad más el buffer de carga, propiedad del núcleo.
pub struct QueuedJob {
    pub job_id: String,
    pub payload: Vec<u8>,
}

/// Pool de workers de pipeline sobre una FIFO acotada.
pub struct WorkerPool {
    /// None tras el sellado de la cola durante el apagado.
    submission_sender: std::sync::Mutex<Option<mpsc::Sender<QueuedJob>>>,
    worker_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl WorkerPool {
    /**
     * Enciende el pool: N workers compartiendo el receptor de la FIFO.
     */
    #[instrument(skip(executor))]
    pub fn ignite(executor: Arc<PipelineExecutor>, worker_count: usize, queue_depth: usize) -> Self {
        let (submission_sender, submission_receiver) = mpsc::channel::<QueuedJob>(queue_depth.max(1));
        let shared_receiver = Arc::new(Mutex::new(submission_receiver));

        let mut worker_handles = Vec::with_capacity(worker_count);
        for worker_index in 0..worker_count.max(1) {
            let receiver_reference = Arc::clone(&shared_receiver);
            let executor_reference = Arc::clone(&executor);

            worker_handles.push(tokio::spawn(async move {
                debug!("⚙️ [WORKER_{}]: Online and draining queue.", worker_index);
                loop {
                    // El candado cubre únicamente la extracción; la
                    // ejecución corre sin serializar entre workers.
                    let next_assignment = {
                        let mut receiver_guard = receiver_reference.lock().await;
                        receiver_guard.recv().await
                    };

                    match next_assignment {
                        Some(queued_job) => {
                            executor_reference
                                .run_job(&queued_job.job_id, queued_job.payload)
                                .await;
                        }
                        None => {
                            debug!("⚙️ [WORKER_{}]: Queue sealed. Standing down.", worker_index);
                            break;
                        }
                    }
                }
            }));
        }

        info!("🚀 [WORKER_POOL]: {} workers ignited (queue depth {}).", worker_count.max(1), queue_depth);
        Self {
            submission_sender: std::sync::Mutex::new(Some(submission_sender)),
            worker_handles: Mutex::new(worker_handles),
        }
    }

    /**
     * Encola sin bloquear. Devuelve el trabajo al emisor cuando la FIFO
     * está llena o sellada, para que la admisión reporte back-pressure.
     */
    pub fn try_enqueue(&self, queued_job: QueuedJob) -> Result<(), QueuedJob> {
        let sender_guard = self
            .submission_sender
            .lock()
            .expect("FATAL: Worker pool sender lock poisoned.");

        let Some(sender) = sender_guard.as_ref() else {
            return Err(queued_job);
        };

        sender.try_send(queued_job).map_err(|send_fault| match send_fault {
            mpsc::error::TrySendError::Full(rejected_job) => rejected_job,
            mpsc::error::TrySendError::Closed(rejected_job) => rejected_job,
        })
    }

    /// Drena el pool: sella la cola y espera los trabajos en curso.
    pub async fn shutdown(&self) {
        self.submission_sender
            .lock()
            .expect("FATAL: Worker pool sender lock poisoned.")
            .take();

        let drained_handles: Vec<JoinHandle<()>> =
            std::mem::take(&mut *self.worker_handles.lock().await);
        for worker_handle in drained_handles {
            let _ = worker_handle.await;
        }
        info!("🛑 [WORKER_POOL]: Drained and sealed.");
    }
}
