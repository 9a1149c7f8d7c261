// [tests/mirror/libs/domain/pipeline/pipeline_scenarios.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DE ESCENARIOS DE PIPELINE (V1.4 - ZENITH)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L2-MIRROR
 * RESPONSABILIDAD: AUDITORÍA EXTREMO-A-EXTREMO DEL MOTOR DE INGESTA
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. SCENARIO PARITY: Cada auditoría reproduce un flujo operativo
 *    literal (carga limpia, amenaza SQL, formato roto, homopolímero,
 *    cancelación, prueba de borrado) y verifica el observable exacto.
 * 2. VOLATILE SUBSTRATE: Blobs en tempdir, metadatos en RAM anclada;
 *    ninguna auditoría deja residuo en el host.
 * 3. DETERMINISM: Runtime de hilo único; la cancelación previa al
 *    drenaje de la FIFO es determinista por construcción.
 * =================================================================
 */

use std::sync::Arc;
use std::time::Duration;

use helixgate_core_scanners::AmlDetector;
use helixgate_core_vault::{derive_artifact_key, CipherAlgorithm};
use helixgate_domain_models::{
    EngineConfig, FailureReason, JobState, JobView, StageName, StageOutcome,
};
use helixgate_domain_pipeline::{
    AnalysisError, CompositionProfiler, EventBus, IntakeError, IntakeService, PipelineExecutor,
    SequenceAnalyzer, WorkerPool,
};
use helixgate_domain_registry::JobRegistry;
use helixgate_infra_store::{ObjectStore, StoreError};

const PROCESS_SECRET: &[u8] = b"pipeline-proving-grounds-secret";

/// Cámara de auditoría volátil: registro, almacén y superficie de admisión.
struct ProvingGrounds {
    blob_workspace: tempfile::TempDir,
    registry: Arc<JobRegistry>,
    store: Arc<ObjectStore>,
    service: IntakeService,
}

async fn ignite_proving_grounds(
    label: &str,
    config: EngineConfig,
    detector: AmlDetector,
    analyzer: Arc<dyn SequenceAnalyzer>,
) -> ProvingGrounds {
    let blob_workspace = tempfile::tempdir().expect("INFRA_FAULT: tempdir allocation failed.");
    let metadata_url = format!("file:pipeline_{}?mode=memory&cache=shared", label);

    let store = Arc::new(
        ObjectStore::open(
            blob_workspace.path(),
            &metadata_url,
            PROCESS_SECRET.to_vec(),
            CipherAlgorithm::AeadGcm256,
        )
        .await
        .expect("CRITICAL_FAULT: Failed to anchor volatile object store."),
    );

    let registry = Arc::new(JobRegistry::new());
    let event_bus = EventBus::new();

    let executor = Arc::new(PipelineExecutor::new(
        Arc::clone(&registry),
        Arc::clone(&store),
        Arc::new(detector),
        analyzer,
        event_bus.clone(),
        config.clone(),
        PROCESS_SECRET.to_vec(),
    ));

    let worker_pool = WorkerPool::ignite(executor, config.workers, config.queue_depth);
    let service = IntakeService::new(
        Arc::clone(&registry),
        Arc::clone(&store),
        worker_pool,
        event_bus,
        config,
    );

    ProvingGrounds { blob_workspace, registry, store, service }
}

/// Espera el sellado terminal del trabajo con tope de paciencia.
async fn await_terminal(registry: &JobRegistry, job_identifier: &str) -> JobView {
    for _ in 0..1_000 {
        let view = registry.snapshot(job_identifier).expect("JOB_VANISHED");
        if view.state.is_terminal() {
            return view;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("PATIENCE_EXHAUSTED: job {} never sealed.", job_identifier);
}

fn stage_outcome(view: &JobView, stage: StageName) -> StageOutcome {
    view.stages
        .iter()
        .find(|record| record.name == stage)
        .unwrap_or_else(|| panic!("STAGE_TRACE_MISSING: {:?}", stage))
        .outcome
}

fn count_blob_files(root: &std::path::Path) -> usize {
    let mut blob_count = 0;
    if let Ok(shard_entries) = std::fs::read_dir(root) {
        for shard_entry in shard_entries.flatten() {
            if shard_entry.path().is_dir() {
                blob_count += std::fs::read_dir(shard_entry.path())
                    .map(|files| files.count())
                    .unwrap_or(0);
            }
        }
    }
    blob_count
}

/**
 * ESCENARIO 1 + 6: Carga FASTA limpia hasta 'completed' con artefacto,
 * después borrado con prueba recomputable y ausencia posterior.
 */
#[tokio::test]
async fn certify_clean_fasta_lifecycle_with_deletion_proof() {
    println!("\n🧬 [INICIO]: Auditoría de ciclo limpio + prueba de borrado...");
    let grounds = ignite_proving_grounds(
        "clean",
        EngineConfig::default(),
        AmlDetector::disabled(),
        Arc::new(CompositionProfiler),
    )
    .await;

    let job_identifier = grounds
        .service
        .submit("clean.fasta".into(), b">h1\nACGTACGTACGT\n".to_vec())
        .expect("ADMISSION_FAULT");

    let terminal_view = await_terminal(&grounds.registry, &job_identifier).await;

    // Observables del escenario 1.
    assert_eq!(terminal_view.state, JobState::Completed);
    assert_eq!(terminal_view.stages.len(), 7);
    assert_eq!(terminal_view.stage_cursor, terminal_view.stages.len() - 1);
    assert_eq!(stage_outcome(&terminal_view, StageName::Format), StageOutcome::Pass);
    assert_eq!(stage_outcome(&terminal_view, StageName::Ids), StageOutcome::Pass);
    assert_eq!(stage_outcome(&terminal_view, StageName::Aml), StageOutcome::Skip);
    assert_eq!(stage_outcome(&terminal_view, StageName::Persist), StageOutcome::Pass);

    let verdict = grounds.service.result(&job_identifier).expect("VERDICT_FAULT");
    assert!(verdict.reason.is_none());
    assert_eq!(verdict.ids_score, 0);
    assert!(verdict.analysis_ok);
    let artifact_reference = verdict.artifact_ref.expect("ARTIFACT_MISSING");
    assert_eq!(artifact_reference.original_size, 16);

    // Roundtrip del artefacto: bytes exactos bajo la llave derivada.
    let artifact_key = derive_artifact_key(PROCESS_SECRET, &artifact_reference.content_hash);
    let recovered = grounds
        .store
        .get(&artifact_reference.content_hash, &artifact_key)
        .await
        .expect("RETRIEVAL_FAULT");
    assert_eq!(recovered, b">h1\nACGTACGTACGT\n");

    // Escenario 6: borrado con prueba recomputable.
    let deletion_proof = grounds.store.delete(&job_identifier).await.expect("DELETION_FAULT");
    assert!(grounds.store.signer().verify(
        &deletion_proof.job_id,
        &deletion_proof.artifact_content_hash,
        &deletion_proof.deletion_timestamp,
        &deletion_proof.proof_digest,
    ));
    assert!(matches!(
        grounds.store.get(&artifact_reference.content_hash, &artifact_key).await,
        Err(StoreError::NotFound)
    ));
    assert!(grounds.service.proof(&job_identifier).await.is_ok());

    println!("   ✅ [SUCCESS]: Ciclo limpio y evidencia de borrado certificados.");
}

/**
 * ESCENARIO 2: Cabecera hostil con carga SQL. 'ids' colapsa fatal,
 * las etapas posteriores se omiten y no existe artefacto.
 */
#[tokio::test]
async fn certify_sql_threat_short_circuit() {
    let grounds = ignite_proving_grounds(
        "threat",
        EngineConfig::default(),
        AmlDetector::disabled(),
        Arc::new(CompositionProfiler),
    )
    .await;

    let job_identifier = grounds
        .service
        .submit(
            "evil.fasta".into(),
            b">h\nACGT\n>evil'; DROP TABLE users;--\nACGT\n".to_vec(),
        )
        .unwrap();

    let terminal_view = await_terminal(&grounds.registry, &job_identifier).await;

    assert_eq!(terminal_view.state, JobState::Failed);
    assert_eq!(stage_outcome(&terminal_view, StageName::Format), StageOutcome::Pass);
    assert_eq!(stage_outcome(&terminal_view, StageName::Ids), StageOutcome::Fail);
    assert_eq!(stage_outcome(&terminal_view, StageName::Aml), StageOutcome::Skip);
    assert_eq!(stage_outcome(&terminal_view, StageName::Persist), StageOutcome::Skip);
    assert_eq!(stage_outcome(&terminal_view, StageName::Analyze), StageOutcome::Skip);
    assert_eq!(stage_outcome(&terminal_view, StageName::Finalize), StageOutcome::Pass);

    let verdict = grounds.service.result(&job_identifier).unwrap();
    assert_eq!(verdict.reason, Some(FailureReason::ThreatsDetected));
    assert!(verdict.ids_score > 5);
    assert!(verdict.artifact_ref.is_none());
    assert_eq!(count_blob_files(grounds.blob_workspace.path()), 0);
}

/**
 * ESCENARIO 3: Violación de alfabeto. 'format' colapsa y los escáneres
 * posteriores jamás corren.
 */
#[tokio::test]
async fn certify_format_violation_aborts_early() {
    let grounds = ignite_proving_grounds(
        "format",
        EngineConfig::default(),
        AmlDetector::disabled(),
        Arc::new(CompositionProfiler),
    )
    .await;

    let job_identifier = grounds
        .service
        .submit("broken.fasta".into(), b">h\nACGT!@#\n".to_vec())
        .unwrap();

    let terminal_view = await_terminal(&grounds.registry, &job_identifier).await;

    assert_eq!(terminal_view.state, JobState::Failed);
    assert_eq!(stage_outcome(&terminal_view, StageName::Format), StageOutcome::Fail);
    assert_eq!(stage_outcome(&terminal_view, StageName::Ids), StageOutcome::Skip);
    assert_eq!(stage_outcome(&terminal_view, StageName::Aml), StageOutcome::Skip);
    assert_eq!(stage_outcome(&terminal_view, StageName::Persist), StageOutcome::Skip);

    let verdict = grounds.service.result(&job_identifier).unwrap();
    assert_eq!(verdict.reason, Some(FailureReason::FormatInvalid));
    assert!(verdict.artifact_ref.is_none());
}

/**
 * ESCENARIO 4 (sin modelo): Homopolímero extremo. 'aml' se omite y el
 * trabajo llega a 'completed'.
 */
#[tokio::test]
async fn certify_extreme_homopolymer_skips_without_model() {
    let grounds = ignite_proving_grounds(
        "homopolymer",
        EngineConfig::default(),
        AmlDetector::disabled(),
        Arc::new(CompositionProfiler),
    )
    .await;

    let mut hostile_body = b">h\n".to_vec();
    hostile_body.extend(std::iter::repeat(b'A').take(10_000));
    hostile_body.push(b'\n');

    let job_identifier = grounds.service.submit("homopolymer.fasta".into(), hostile_body).unwrap();
    let terminal_view = await_terminal(&grounds.registry, &job_identifier).await;

    assert_eq!(terminal_view.state, JobState::Completed);
    assert_eq!(stage_outcome(&terminal_view, StageName::Aml), StageOutcome::Skip);
    assert!(grounds.service.result(&job_identifier).unwrap().aml_score.is_none());
}

/**
 * ESCENARIO 4 (con modelo): Homopolímero extremo contra un autoencoder
 * armado. 'aml' colapsa con reason=adversarial y no existe artefacto.
 */
#[tokio::test]
async fn certify_extreme_homopolymer_fails_with_model() {
    use helixgate_core_scanners::aml::{AutoencoderModel, FEATURE_DIM};

    // Pesos nulos: reconstrucción constante 0.5; un cuerpo cuyas
    // características se concentran en {0, 1} puntúa exactamente 0.25.
    let flat_model = AutoencoderModel::from_parts(
        FEATURE_DIM,
        4,
        vec![0.0; 4 * FEATURE_DIM],
        vec![0.0; 4],
        vec![0.0; FEATURE_DIM * 4],
        vec![0.0; FEATURE_DIM],
    )
    .expect("MODEL_FORGE_FAULT");

    let grounds = ignite_proving_grounds(
        "adversarial",
        EngineConfig::default(),
        AmlDetector::with_model(flat_model, 0.2),
        Arc::new(CompositionProfiler),
    )
    .await;

    let mut hostile_body = b">h\n".to_vec();
    hostile_body.extend(std::iter::repeat(b'A').take(10_000));
    hostile_body.push(b'\n');

    let job_identifier = grounds.service.submit("adversarial.fasta".into(), hostile_body).unwrap();
    let terminal_view = await_terminal(&grounds.registry, &job_identifier).await;

    assert_eq!(terminal_view.state, JobState::Failed);
    assert_eq!(stage_outcome(&terminal_view, StageName::Aml), StageOutcome::Fail);
    assert_eq!(stage_outcome(&terminal_view, StageName::Persist), StageOutcome::Skip);

    let verdict = grounds.service.result(&job_identifier).unwrap();
    assert_eq!(verdict.reason, Some(FailureReason::Adversarial));
    assert!(verdict.aml_score.unwrap() > 0.2);
    assert!(verdict.artifact_ref.is_none());
}

/**
 * ESCENARIO 5: Cancelación previa al drenaje de la FIFO. El trabajo
 * sella 'cancelled' sin archivo de blob ni fila de metadatos.
 */
#[tokio::test]
async fn certify_cancellation_leaves_no_orphans() {
    let grounds = ignite_proving_grounds(
        "cancel",
        EngineConfig::default(),
        AmlDetector::disabled(),
        Arc::new(CompositionProfiler),
    )
    .await;

    // 10 MiB de FASTA válido.
    let mut bulky_body = b">bulk\n".to_vec();
    bulky_body.extend(std::iter::repeat(b"ACGTACGTACGTACGTACGTACGTACGTACGT\n".as_slice()).take(320_000).flatten());

    let job_identifier = grounds.service.submit("bulk.fasta".into(), bulky_body).unwrap();

    // Runtime de hilo único: la señal llega antes de que el worker drene.
    grounds.service.cancel(&job_identifier).unwrap();
    // Segunda invocación: mismo resultado observable.
    grounds.service.cancel(&job_identifier).unwrap();

    let terminal_view = await_terminal(&grounds.registry, &job_identifier).await;

    assert_eq!(terminal_view.state, JobState::Cancelled);
    assert!(terminal_view.artifact_ref.is_none());
    assert_eq!(count_blob_files(grounds.blob_workspace.path()), 0);
    assert!(matches!(
        grounds.service.proof(&job_identifier).await,
        Err(IntakeError::NotFound)
    ));

    let verdict = grounds.service.result(&job_identifier).unwrap();
    assert_eq!(verdict.reason, Some(FailureReason::Cancelled));
}

/**
 * FRONTERAS DE ADMISIÓN: vacío, tamaño exacto, exceso y back-pressure.
 */
#[tokio::test]
async fn certify_admission_boundaries() {
    let mut config = EngineConfig::default();
    config.max_input_bytes = 1_024;
    config.queue_depth = 1;
    config.workers = 1;

    let grounds = ignite_proving_grounds(
        "admission",
        config,
        AmlDetector::disabled(),
        Arc::new(CompositionProfiler),
    )
    .await;

    // Vacío: rechazo inmediato.
    assert!(matches!(
        grounds.service.submit("empty.fasta".into(), Vec::new()),
        Err(IntakeError::Empty)
    ));

    // Tamaño exacto: admitido.
    let mut exact_body = b">h\n".to_vec();
    exact_body.extend(std::iter::repeat(b'A').take(1_020));
    exact_body.push(b'\n');
    assert_eq!(exact_body.len(), 1_024);
    let admitted_identifier = grounds.service.submit("exact.fasta".into(), exact_body.clone()).unwrap();

    // Un byte más: rechazo por sobredimensión.
    let mut oversize_body = exact_body;
    oversize_body.push(b'A');
    assert!(matches!(
        grounds.service.submit("oversize.fasta".into(), oversize_body),
        Err(IntakeError::Oversize { .. })
    ));

    // Back-pressure: la FIFO de profundidad 1 ya está ocupada y el
    // runtime de hilo único aún no cedió el control a los workers.
    let saturated_attempt = grounds.service.submit("second.fasta".into(), b">h\nACGT\n".to_vec());
    assert!(matches!(saturated_attempt, Err(IntakeError::QueueFull)), "BACKPRESSURE_ABSENT");

    // El trabajo admitido concluye con normalidad.
    let terminal_view = await_terminal(&grounds.registry, &admitted_identifier).await;
    assert_eq!(terminal_view.state, JobState::Completed);
}

/**
 * DEADLINE ENFORCEMENT: un colaborador de análisis que excede su
 * ventana colapsa el trabajo con reason=timeout.
 */
struct StalledAnalyzer;

impl SequenceAnalyzer for StalledAnalyzer {
    fn analyze(&self, _plaintext: &[u8]) -> Result<helixgate_domain_models::AnalysisResult, AnalysisError> {
        std::thread::sleep(Duration::from_millis(400));
        Err(AnalysisError::Internal("never reached in time".into()))
    }
}

#[tokio::test]
async fn certify_stage_deadline_records_timeout() {
    let mut config = EngineConfig::default();
    config.stage_deadlines.analyze_ms = 40;

    let grounds = ignite_proving_grounds(
        "deadline",
        config,
        AmlDetector::disabled(),
        Arc::new(StalledAnalyzer),
    )
    .await;

    let job_identifier = grounds
        .service
        .submit("slow.fasta".into(), b">h\nACGT\n".to_vec())
        .unwrap();

    let terminal_view = await_terminal(&grounds.registry, &job_identifier).await;

    assert_eq!(terminal_view.state, JobState::Failed);
    assert_eq!(stage_outcome(&terminal_view, StageName::Analyze), StageOutcome::Fail);

    let verdict = grounds.service.result(&job_identifier).unwrap();
    assert_eq!(verdict.reason, Some(FailureReason::Timeout));
}

/**
 * COLABORADOR NO-FATAL: un colapso ordinario de 'analyze' deja el
 * trabajo en 'completed' con analysis_ok=false.
 */
struct BrokenAnalyzer;

impl SequenceAnalyzer for BrokenAnalyzer {
    fn analyze(&self, _plaintext: &[u8]) -> Result<helixgate_domain_models::AnalysisResult, AnalysisError> {
        Err(AnalysisError::Internal("collaborator offline".into()))
    }
}

#[tokio::test]
async fn certify_analysis_failure_is_non_fatal() {
    let grounds = ignite_proving_grounds(
        "soft_fail",
        EngineConfig::default(),
        AmlDetector::disabled(),
        Arc::new(BrokenAnalyzer),
    )
    .await;

    let job_identifier = grounds
        .service
        .submit("soft.fasta".into(), b">h\nACGT\n".to_vec())
        .unwrap();

    let terminal_view = await_terminal(&grounds.registry, &job_identifier).await;

    assert_eq!(terminal_view.state, JobState::Completed);
    assert_eq!(stage_outcome(&terminal_view, StageName::Analyze), StageOutcome::Fail);

    let verdict = grounds.service.result(&job_identifier).unwrap();
    assert!(verdict.reason.is_none());
    assert!(!verdict.analysis_ok);
    assert!(verdict.artifact_ref.is_some());
}
