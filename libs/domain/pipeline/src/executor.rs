// [libs/domain/pipeline/src/executor.rs]
/*!
 * =================================================================
 * APARATO: PIPELINE STAGE EXECUTOR (V6.4 - DEADLINE ENFORCED)
 * CLASIFICACIÓN: DOMAIN ENGINE (ESTRATO L2)
 * RESPONSABILIDAD: BUCLE SECUENCIAL DE ETAPAS CON CORTE Y CANCELACIÓN
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. SEQUENTIAL DISCIPLINE: Las etapas de un trabajo corren en orden
 *    estricto; el paralelismo vive entre trabajos, jamás dentro de uno.
 * 2. SHORT CIRCUIT: El primer 'fail' fatal omite las etapas restantes;
 *    'finalize' corre siempre y sella el veredicto.
 * 3. DEADLINE AS CANCEL: Un deadline vencido se trata como cancelación
 *    en la frontera de etapa, pero se registra como fail{timeout}.
 * 4. ORPHAN-FREE CANCEL: La cancelación durante 'persist' espera el
 *    sellado en vuelo y revierte fila y blob: ningún archivo huérfano.
 *
 * # Mathematical Proof (Cursor Terminal Invariant):
 * 'begin_stage' se invoca para cada índice de la secuencia fija y el
 * cursor es monótono, por lo que en todo estado terminal
 * stage_cursor == len(stages) − 1.
 * =================================================================
 */

use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};

use helixgate_core_scanners::{
    aml::FeatureExtractor, AmlDetector, AmlScanReport, FormatValidator, IdsScanner,
};
use helixgate_core_vault::derive_artifact_key;
use helixgate_domain_models::{
    AdmitDetail, AnalysisResult, AnalyzeDetail, ArtifactRef, EngineConfig, FailureReason,
    JobState, PersistDetail, StageDetail, StageName, StageOutcome, StageRecord, Verdict,
};
use helixgate_domain_registry::JobRegistry;
use helixgate_infra_store::ObjectStore;
use helixgate_shared_panoptes::ForensicContext;

use crate::analyzer::SequenceAnalyzer;
use crate::events::EventBus;

/// Resultado de una ejecución vigilada (deadline + señal de cancelación).
enum GuardedRun<T> {
    Completed(T),
    TimedOut,
    CancelSignalled,
    /// Pánico o colapso del task subyacente.
    Faulted,
}

/// Evaluación nominal de una etapa.
struct StageEval {
    outcome: StageOutcome,
    detail: StageDetail,
    fatal: Option<FailureReason>,
}

impl StageEval {
    fn pass(detail: StageDetail) -> Self {
        Self { outcome: StageOutcome::Pass, detail, fatal: None }
    }

    fn fail(detail: StageDetail, reason: FailureReason) -> Self {
        Self { outcome: StageOutcome::Fail, detail, fatal: Some(reason) }
    }

    fn skip(detail: StageDetail) -> Self {
        Self { outcome: StageOutcome::Skip, detail, fatal: None }
    }

    fn timeout() -> Self {
        Self {
            outcome: StageOutcome::Fail,
            detail: StageDetail::timeout(),
            fatal: Some(FailureReason::Timeout),
        }
    }

    /// Fallo no-fatal: el trabajo continúa (reservado para 'analyze').
    fn soft_fail(detail: StageDetail) -> Self {
        Self { outcome: StageOutcome::Fail, detail, fatal: None }
    }
}

/// Motor de ejecución: corre un trabajo completo a través de la
/// secuencia fija de etapas.
pub struct PipelineExecutor {
    registry: Arc<JobRegistry>,
    store: Arc<ObjectStore>,
    format_validator: FormatValidator,
    ids_scanner: IdsScanner,
    aml_detector: Arc<AmlDetector>,
    analyzer: Arc<dyn SequenceAnalyzer>,
    event_bus: EventBus,
    config: EngineConfig,
    server_secret: Vec<u8>,
}

impl PipelineExecutor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        registry: Arc<JobRegistry>,
        store: Arc<ObjectStore>,
        aml_detector: Arc<AmlDetector>,
        analyzer: Arc<dyn SequenceAnalyzer>,
        event_bus: EventBus,
        config: EngineConfig,
        server_secret: Vec<u8>,
    ) -> Self {
        let ids_scanner = IdsScanner::new(config.ids_threshold, config.ids_score_ceiling);
        Self {
            registry,
            store,
            format_validator: FormatValidator::new(),
            ids_scanner,
            aml_detector,
            analyzer,
            event_bus,
            config,
            server_secret,
        }
    }

    /**
     * Ejecuta el pipeline completo de un trabajo encolado.
     *
     * El buffer de carga es propiedad del núcleo desde la admisión; al
     * sellar, 'finalize' lo pone a cero antes de soltarlo.
     */
    #[instrument(skip(self, payload), fields(job = %job_identifier))]
    pub async fn run_job(&self, job_identifier: &str, payload: Vec<u8>) {
        if let Err(transition_fault) =
            self.registry
                .transition(job_identifier, JobState::Queued, JobState::Running)
        {
            error!("💀 [EXECUTOR]: Ignition rejected for {}: {}", job_identifier, transition_fault);
            return;
        }

        let Ok(mut cancel_signal) = self.registry.cancel_receiver(job_identifier) else {
            error!("💀 [EXECUTOR]: Cancel channel vanished for {}.", job_identifier);
            return;
        };

        let payload = Arc::new(payload);
        let pipeline_start = Instant::now();

        let mut fatal_reason: Option<FailureReason> = None;
        let mut was_cancelled = false;
        let mut ids_score = 0u32;
        let mut aml_score: Option<f64> = None;
        let mut analysis_ok = false;
        let mut analysis_result: Option<AnalysisResult> = None;
        let mut artifact_reference: Option<ArtifactRef> = None;

        for (stage_index, stage) in StageName::ORDERED.iter().copied().enumerate() {
            self.registry.begin_stage(job_identifier, stage_index).ok();
            self.event_bus.emit_stage_started(job_identifier, stage);

            let started_at = Utc::now();
            let stage_timer = Instant::now();

            let evaluation = if stage == StageName::Finalize {
                StageEval::pass(StageDetail::empty())
            } else if fatal_reason.is_some() || was_cancelled {
                // Corte corto: las etapas posteriores al colapso se omiten.
                StageEval::skip(StageDetail::empty())
            } else if *cancel_signal.borrow() {
                was_cancelled = true;
                StageEval::skip(StageDetail::empty())
            } else {
                let deadline = self.config.stage_deadlines.for_stage(stage);
                match stage {
                    StageName::Admit => self.stage_admit(&payload),
                    StageName::Format => {
                        self.stage_format(
                            job_identifier,
                            deadline,
                            &mut cancel_signal,
                            &payload,
                            &mut was_cancelled,
                        )
                        .await
                    }
                    StageName::Ids => {
                        self.stage_ids(
                            job_identifier,
                            deadline,
                            &mut cancel_signal,
                            &payload,
                            &mut was_cancelled,
                            &mut ids_score,
                        )
                        .await
                    }
                    StageName::Aml => {
                        self.stage_aml(
                            job_identifier,
                            deadline,
                            &mut cancel_signal,
                            &payload,
                            &mut was_cancelled,
                            &mut aml_score,
                        )
                        .await
                    }
                    StageName::Persist => {
                        self.stage_persist(
                            deadline,
                            &mut cancel_signal,
                            job_identifier,
                            &payload,
                            &mut was_cancelled,
                            &mut artifact_reference,
                        )
                        .await
                    }
                    StageName::Analyze => {
                        self.stage_analyze(
                            job_identifier,
                            deadline,
                            &mut cancel_signal,
                            &payload,
                            &mut was_cancelled,
                            &mut analysis_ok,
                            &mut analysis_result,
                        )
                        .await
                    }
                    StageName::Finalize => unreachable!("finalize handled above"),
                }
            };

            let stage_record = StageRecord {
                name: stage,
                started_at,
                finished_at: Utc::now(),
                outcome: evaluation.outcome,
                detail: evaluation.detail,
            };
            self.registry.append_stage(job_identifier, stage_record).ok();
            self.event_bus.emit_stage_finished(
                job_identifier,
                stage,
                evaluation.outcome,
                stage_timer.elapsed().as_millis() as u64,
            );

            if fatal_reason.is_none() {
                fatal_reason = evaluation.fatal;
            }
        }

        // --- SELLADO FINAL: PUESTA A CERO Y VEREDICTO ---

        scrub_payload(payload);

        let terminal_state = if was_cancelled {
            JobState::Cancelled
        } else if fatal_reason.is_some() {
            JobState::Failed
        } else {
            JobState::Completed
        };

        let verdict_reason = if was_cancelled {
            Some(FailureReason::Cancelled)
        } else {
            fatal_reason
        };

        let recorded_stages = self
            .registry
            .snapshot(job_identifier)
            .map(|view| view.stages)
            .unwrap_or_default();

        let verdict = Verdict {
            terminal_state,
            stages: recorded_stages,
            artifact_ref: artifact_reference,
            analysis_result,
            analysis_ok,
            ids_score,
            aml_score,
            total_duration_ms: pipeline_start.elapsed().as_millis() as u64,
            reason: verdict_reason,
        };

        match self.registry.seal_terminal(job_identifier, terminal_state, verdict) {
            Ok(_) => {
                self.event_bus
                    .emit_job_terminal(job_identifier, terminal_state, verdict_reason);
                info!(
                    "🏁 [EXECUTOR]: Job {} sealed as {:?} in {}ms.",
                    job_identifier,
                    terminal_state,
                    pipeline_start.elapsed().as_millis()
                );
            }
            Err(seal_fault) => {
                error!("💀 [EXECUTOR]: Terminal seal rejected for {}: {}", job_identifier, seal_fault);
            }
        }
    }

    // --- ESTRATO DE ETAPAS ---

    /// admit: tamaño verificado y no-vacío. La admisión HTTP ya filtró;
    /// esta re-validación protege cualquier ruta de encolado futura.
    fn stage_admit(&self, payload: &Arc<Vec<u8>>) -> StageEval {
        let payload_size_bytes = payload.len() as u64;
        let detail = StageDetail::Admit(AdmitDetail { payload_size_bytes });

        if payload.is_empty() || payload_size_bytes > self.config.max_input_bytes {
            return StageEval::fail(detail, FailureReason::Internal);
        }
        StageEval::pass(detail)
    }

    async fn stage_format(
        &self,
        job_identifier: &str,
        deadline: Option<Duration>,
        cancel_signal: &mut watch::Receiver<bool>,
        payload: &Arc<Vec<u8>>,
        was_cancelled: &mut bool,
    ) -> StageEval {
        let validator = self.format_validator.clone();
        let payload_task = Arc::clone(payload);

        match run_blocking_guarded(
            forensic_label_for(job_identifier, StageName::Format),
            deadline,
            cancel_signal,
            move || validator.validate(&payload_task),
        )
        .await
        {
            GuardedRun::Completed(report) => {
                let detail = StageDetail::Format(report.detail);
                if report.passed {
                    StageEval::pass(detail)
                } else {
                    StageEval::fail(detail, FailureReason::FormatInvalid)
                }
            }
            GuardedRun::TimedOut => StageEval::timeout(),
            GuardedRun::CancelSignalled => {
                *was_cancelled = true;
                StageEval::skip(StageDetail::empty())
            }
            GuardedRun::Faulted => StageEval::fail(StageDetail::empty(), FailureReason::Internal),
        }
    }

    async fn stage_ids(
        &self,
        job_identifier: &str,
        deadline: Option<Duration>,
        cancel_signal: &mut watch::Receiver<bool>,
        payload: &Arc<Vec<u8>>,
        was_cancelled: &mut bool,
        ids_score: &mut u32,
    ) -> StageEval {
        let scanner = self.ids_scanner.clone();
        let payload_task = Arc::clone(payload);

        match run_blocking_guarded(
            forensic_label_for(job_identifier, StageName::Ids),
            deadline,
            cancel_signal,
            move || scanner.scan(&payload_task),
        )
        .await
        {
            GuardedRun::Completed(report) => {
                *ids_score = report.detail.score;
                let detail = StageDetail::Ids(report.detail);
                if report.passed {
                    StageEval::pass(detail)
                } else {
                    StageEval::fail(detail, FailureReason::ThreatsDetected)
                }
            }
            GuardedRun::TimedOut => StageEval::timeout(),
            GuardedRun::CancelSignalled => {
                *was_cancelled = true;
                StageEval::skip(StageDetail::empty())
            }
            GuardedRun::Faulted => StageEval::fail(StageDetail::empty(), FailureReason::Internal),
        }
    }

    async fn stage_aml(
        &self,
        job_identifier: &str,
        deadline: Option<Duration>,
        cancel_signal: &mut watch::Receiver<bool>,
        payload: &Arc<Vec<u8>>,
        was_cancelled: &mut bool,
        aml_score: &mut Option<f64>,
    ) -> StageEval {
        let detector = Arc::clone(&self.aml_detector);
        let payload_task = Arc::clone(payload);

        let scan_task = move || {
            let sequence_body = FeatureExtractor::extract_sequence_body(&payload_task);
            detector.scan(&sequence_body)
        };

        match run_blocking_guarded(
            forensic_label_for(job_identifier, StageName::Aml),
            deadline,
            cancel_signal,
            scan_task,
        )
        .await
        {
            GuardedRun::Completed(AmlScanReport::Scored { passed, detail }) => {
                *aml_score = Some(detail.score);
                let stage_detail = StageDetail::Aml(detail);
                if passed {
                    StageEval::pass(stage_detail)
                } else {
                    StageEval::fail(stage_detail, FailureReason::Adversarial)
                }
            }
            // Sin modelo cargado la etapa se omite; el pipeline continúa.
            GuardedRun::Completed(AmlScanReport::Skipped) => {
                StageEval::skip(StageDetail::empty())
            }
            GuardedRun::TimedOut => StageEval::timeout(),
            GuardedRun::CancelSignalled => {
                *was_cancelled = true;
                StageEval::skip(StageDetail::empty())
            }
            GuardedRun::Faulted => StageEval::fail(StageDetail::empty(), FailureReason::Internal),
        }
    }

    async fn stage_persist(
        &self,
        deadline: Option<Duration>,
        cancel_signal: &mut watch::Receiver<bool>,
        job_identifier: &str,
        payload: &Arc<Vec<u8>>,
        was_cancelled: &mut bool,
        artifact_reference: &mut Option<ArtifactRef>,
    ) -> StageEval {
        let content_hash = ObjectStore::content_hash(payload);
        let artifact_key = derive_artifact_key(&self.server_secret, &content_hash);

        let store_task = Arc::clone(&self.store);
        let payload_task = Arc::clone(payload);
        let job_label = job_identifier.to_string();
        let key_task = artifact_key.clone();

        let mut put_handle = tokio::spawn(async move {
            store_task.put(&job_label, &payload_task, &key_task).await
        });

        let deadline_sleep = async {
            match deadline {
                Some(window) => sleep(window).await,
                None => std::future::pending().await,
            }
        };
        let cancel_wait = async {
            let signalled = cancel_signal.wait_for(|flag| *flag).await.is_ok();
            if !signalled {
                std::future::pending::<()>().await;
            }
        };

        tokio::select! {
            joined = &mut put_handle => match joined {
                Ok(Ok(sealed_reference)) => {
                    self.registry
                        .set_artifact(job_identifier, sealed_reference.clone())
                        .ok();
                    self.event_bus
                        .emit_artifact_written(job_identifier, sealed_reference.stored_size);

                    let detail = StageDetail::Persist(PersistDetail {
                        content_hash: sealed_reference.content_hash.clone(),
                        original_size: sealed_reference.original_size,
                        stored_size: sealed_reference.stored_size,
                        algorithm_tag: sealed_reference.algorithm_tag.as_str().to_string(),
                    });
                    *artifact_reference = Some(sealed_reference);
                    StageEval::pass(detail)
                }
                Ok(Err(store_fault)) => {
                    warn!("🛑 [EXECUTOR]: Persist collapsed for {}: {}", job_identifier, store_fault);
                    StageEval::fail(StageDetail::empty(), FailureReason::StorageError)
                }
                Err(_join_fault) => StageEval::fail(StageDetail::empty(), FailureReason::Internal),
            },
            _ = deadline_sleep => {
                put_handle.abort();
                let _ = (&mut put_handle).await;
                self.rollback_persist(job_identifier, &content_hash).await;
                StageEval::timeout()
            }
            _ = cancel_wait => {
                // El sellado en vuelo concluye su frontera observable y
                // después se revierte por completo.
                let _ = (&mut put_handle).await;
                self.rollback_persist(job_identifier, &content_hash).await;
                *was_cancelled = true;
                StageEval::skip(StageDetail::empty())
            }
        }
    }

    async fn rollback_persist(&self, job_identifier: &str, content_hash: &str) {
        if let Err(rollback_fault) = self.store.rollback(job_identifier, content_hash).await {
            error!(
                "💀 [EXECUTOR]: Persist rollback incomplete for {}: {}",
                job_identifier, rollback_fault
            );
        }
        self.registry.clear_artifact(job_identifier).ok();
    }

    async fn stage_analyze(
        &self,
        job_identifier: &str,
        deadline: Option<Duration>,
        cancel_signal: &mut watch::Receiver<bool>,
        payload: &Arc<Vec<u8>>,
        was_cancelled: &mut bool,
        analysis_ok: &mut bool,
        analysis_result: &mut Option<AnalysisResult>,
    ) -> StageEval {
        let analyzer = Arc::clone(&self.analyzer);
        let payload_task = Arc::clone(payload);

        match run_blocking_guarded(
            forensic_label_for(job_identifier, StageName::Analyze),
            deadline,
            cancel_signal,
            move || analyzer.analyze(&payload_task),
        )
        .await
        {
            GuardedRun::Completed(Ok(collaborator_result)) => {
                *analysis_ok = true;
                *analysis_result = Some(collaborator_result);
                StageEval::pass(StageDetail::Analyze(AnalyzeDetail {
                    analysis_ok: true,
                    failure_note: None,
                }))
            }
            // Los colapsos del colaborador son no-fatales: el trabajo
            // llega a 'completed' con analysis_ok=false.
            GuardedRun::Completed(Err(collaborator_fault)) => {
                warn!("⚠️ [EXECUTOR]: Analysis collaborator collapsed: {}", collaborator_fault);
                StageEval::soft_fail(StageDetail::Analyze(AnalyzeDetail {
                    analysis_ok: false,
                    failure_note: Some(collaborator_fault.to_string()),
                }))
            }
            GuardedRun::TimedOut => StageEval::timeout(),
            GuardedRun::CancelSignalled => {
                *was_cancelled = true;
                StageEval::skip(StageDetail::empty())
            }
            GuardedRun::Faulted => StageEval::fail(StageDetail::empty(), FailureReason::Internal),
        }
    }
}

/**
 * Ejecuta un cómputo bloqueante bajo vigilancia de deadline y señal de
 * cancelación. El cómputo corre en el pool bloqueante de Tokio con el
 * contexto forense 'trabajo::etapa' armado en su hilo, de modo que un
 * pánico dentro del escáner queda atribuido a la carga que lo provocó.
 * Ante deadline o cancelación se abandona la espera (el cierre residual
 * termina en segundo plano y su resultado se descarta).
 */
async fn run_blocking_guarded<T: Send + 'static>(
    forensic_label: String,
    deadline: Option<Duration>,
    cancel_signal: &mut watch::Receiver<bool>,
    blocking_task: impl FnOnce() -> T + Send + 'static,
) -> GuardedRun<T> {
    let mut join_handle = tokio::task::spawn_blocking(move || {
        let _forensic_guard = ForensicContext::enter(&forensic_label);
        blocking_task()
    });

    let deadline_sleep = async {
        match deadline {
            Some(window) => sleep(window).await,
            None => std::future::pending().await,
        }
    };
    let cancel_wait = async {
        let signalled = cancel_signal.wait_for(|flag| *flag).await.is_ok();
        if !signalled {
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        joined = &mut join_handle => match joined {
            Ok(task_output) => GuardedRun::Completed(task_output),
            Err(_join_fault) => GuardedRun::Faulted,
        },
        _ = deadline_sleep => {
            join_handle.abort();
            GuardedRun::TimedOut
        }
        _ = cancel_wait => {
            join_handle.abort();
            GuardedRun::CancelSignalled
        }
    }
}

/// Etiqueta forense 'trabajo::etapa' para la atribución de pánicos.
fn forensic_label_for(job_identifier: &str, stage: StageName) -> String {
    format!("{}::{}", job_identifier, stage.as_str())
}

/// Pone a cero el buffer de carga si este hilo es el último propietario.
fn scrub_payload(payload: Arc<Vec<u8>>) {
    match Arc::try_unwrap(payload) {
        Ok(mut owned_buffer) => owned_buffer.fill(0),
        Err(_still_shared) => {
            // Un task bloqueante abandonado aún retiene el buffer; se
            // liberará al concluir y el proceso no lo reutiliza.
            warn!("⚠️ [EXECUTOR]: Payload buffer still shared at finalize; scrub deferred to drop.");
        }
    }
}
