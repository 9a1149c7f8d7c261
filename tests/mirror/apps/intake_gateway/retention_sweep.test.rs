// [tests/mirror/apps/intake_gateway/retention_sweep.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DE BARRIDO DE RETENCIÓN (V1.1 - ZENITH)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L4-MIRROR
 * RESPONSABILIDAD: AUDITORÍA EXTREMO-A-EXTREMO DEL REAPER DE RETENCIÓN
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. TWO-CUTOFF PARITY: Certifica que la Fase A usa el corte de
 *    retención y la Fase B una gracia corta independiente: un registro
 *    sellado como 'retained_deleted' no espera otra retención completa
 *    para su poda.
 * 2. EVIDENCE DURABILITY: La prueba de borrado sobrevive a la poda del
 *    registro en RAM; la bitácora del almacén es la autoridad.
 * 3. NON-EXPIRY DISCIPLINE: Un terminal dentro de su ventana de
 *    retención permanece intacto, artefacto incluido.
 * =================================================================
 */

use std::sync::Arc;

use helixgate_core_vault::{derive_artifact_key, CipherAlgorithm};
use helixgate_domain_models::{FailureReason, JobState, Verdict};
use helixgate_domain_pipeline::EventBus;
use helixgate_domain_registry::{JobRegistry, RegistryError};
use helixgate_infra_store::{ObjectStore, StoreError};
use helixgate_intake_gateway::services::RetentionReaperService;

const PROCESS_SECRET: &[u8] = b"retention-proving-grounds-secret";

async fn ignite_volatile_substrate(label: &str) -> (tempfile::TempDir, Arc<JobRegistry>, Arc<ObjectStore>) {
    let blob_workspace = tempfile::tempdir().expect("INFRA_FAULT: tempdir allocation failed.");
    let metadata_url = format!("file:retention_{}?mode=memory&cache=shared", label);

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

    (blob_workspace, Arc::new(JobRegistry::new()), store)
}

/// Sella un trabajo 'Completed' con artefacto persistido, imitando el
/// rastro que deja el executor.
async fn seal_completed_job_with_artifact(
    registry: &JobRegistry,
    store: &ObjectStore,
    job_identifier: &str,
    plaintext: &[u8],
) -> helixgate_domain_models::ArtifactRef {
    registry
        .create(job_identifier, "retained.fasta".into(), plaintext.len() as u64)
        .unwrap();
    registry
        .transition(job_identifier, JobState::Queued, JobState::Running)
        .unwrap();

    let artifact_key =
        derive_artifact_key(PROCESS_SECRET, &ObjectStore::content_hash(plaintext));
    let artifact_reference = store
        .put(job_identifier, plaintext, &artifact_key)
        .await
        .expect("SEAL_FAULT: put collapsed.");
    registry
        .set_artifact(job_identifier, artifact_reference.clone())
        .unwrap();

    registry
        .seal_terminal(
            job_identifier,
            JobState::Completed,
            Verdict {
                terminal_state: JobState::Completed,
                stages: Vec::new(),
                artifact_ref: Some(artifact_reference.clone()),
                analysis_result: None,
                analysis_ok: true,
                ids_score: 0,
                aml_score: None,
                total_duration_ms: 7,
                reason: None,
            },
        )
        .unwrap();

    artifact_reference
}

/**
 * FASE A: un terminal vencido expira con evidencia sellada y queda en
 * 'retained_deleted' mientras la gracia de poda no transcurra.
 */
#[tokio::test]
async fn certify_sweep_expires_terminal_with_evidence() {
    let (blob_workspace, registry, store) = ignite_volatile_substrate("expiry").await;
    let event_bus = EventBus::new();

    let artifact_reference = seal_completed_job_with_artifact(
        &registry,
        &store,
        "JOB_RETENTION_EXPIRY",
        b">r1\nACGTACGT\n",
    )
    .await;

    // Retención ya vencida; gracia de poda deliberadamente larga para
    // observar el estado intermedio.
    let reaper = RetentionReaperService::new(
        Arc::clone(&registry),
        Arc::clone(&store),
        event_bus,
        0,
    )
    .with_prune_grace(3_600);

    reaper.execute_sweep().await;

    // El registro sigue vivo, sellado como 'retained_deleted' y con la
    // marca de borrado estampada.
    let retained_view = registry.snapshot("JOB_RETENTION_EXPIRY").unwrap();
    assert_eq!(retained_view.state, JobState::RetainedDeleted);
    assert!(retained_view.deletion_at.is_some());

    // El artefacto ya no existe; la prueba recomputa.
    let artifact_key =
        derive_artifact_key(PROCESS_SECRET, &artifact_reference.content_hash);
    assert!(matches!(
        store.get(&artifact_reference.content_hash, &artifact_key).await,
        Err(StoreError::NotFound)
    ));

    let deletion_proof = store.proof("JOB_RETENTION_EXPIRY").await.unwrap();
    assert!(store.signer().verify(
        &deletion_proof.job_id,
        &deletion_proof.artifact_content_hash,
        &deletion_proof.deletion_timestamp,
        &deletion_proof.proof_digest,
    ));

    // Ningún residuo de ciphertext en el directorio de blobs.
    let shard_count = std::fs::read_dir(blob_workspace.path())
        .map(|entries| {
            entries
                .flatten()
                .filter(|entry| entry.path().is_dir())
                .flat_map(|shard| std::fs::read_dir(shard.path()).into_iter().flatten())
                .count()
        })
        .unwrap_or(0);
    assert_eq!(shard_count, 0);
}

/**
 * FASE B: con la gracia de poda consumida, el residuo 'retained_deleted'
 * se retira sin esperar otra retención completa; la evidencia durable
 * sobrevive a la poda. Cubre además un terminal sin artefacto.
 */
#[tokio::test]
async fn certify_retained_records_pruned_promptly() {
    let (_blob_workspace, registry, store) = ignite_volatile_substrate("prune").await;
    let event_bus = EventBus::new();

    seal_completed_job_with_artifact(&registry, &store, "JOB_PRUNE_ALPHA", b">p1\nGGCC\n").await;

    // Terminal fallido sin artefacto: expira sin prueba que emitir.
    registry.create("JOB_PRUNE_BETA", "failed.fasta".into(), 4).unwrap();
    registry
        .transition("JOB_PRUNE_BETA", JobState::Queued, JobState::Running)
        .unwrap();
    registry
        .seal_terminal(
            "JOB_PRUNE_BETA",
            JobState::Failed,
            Verdict {
                terminal_state: JobState::Failed,
                stages: Vec::new(),
                artifact_ref: None,
                analysis_result: None,
                analysis_ok: false,
                ids_score: 9,
                aml_score: None,
                total_duration_ms: 3,
                reason: Some(FailureReason::ThreatsDetected),
            },
        )
        .unwrap();

    // Retención vencida y gracia nula: el sellado y la poda caben en la
    // misma ventana de auditoría.
    let reaper = RetentionReaperService::new(
        Arc::clone(&registry),
        Arc::clone(&store),
        event_bus,
        0,
    )
    .with_prune_grace(0);

    reaper.execute_sweep().await;

    // Ambos registros podados del mapa en RAM.
    assert_eq!(registry.population(), 0);
    assert!(matches!(
        registry.snapshot("JOB_PRUNE_ALPHA"),
        Err(RegistryError::NotFound)
    ));

    // La evidencia durable es la autoridad: sobrevive a la poda.
    assert!(store.proof("JOB_PRUNE_ALPHA").await.is_ok());
    assert!(matches!(
        store.proof("JOB_PRUNE_BETA").await,
        Err(StoreError::NotFound)
    ));

    // Un segundo barrido sobre el sustrato vacío es inocuo.
    reaper.execute_sweep().await;
    assert_eq!(registry.population(), 0);
}

/**
 * DISCIPLINA DE NO-EXPIRACIÓN: un terminal dentro de su ventana de
 * retención permanece intacto, artefacto incluido.
 */
#[tokio::test]
async fn certify_unexpired_terminal_untouched() {
    let (_blob_workspace, registry, store) = ignite_volatile_substrate("unexpired").await;
    let event_bus = EventBus::new();

    let artifact_reference = seal_completed_job_with_artifact(
        &registry,
        &store,
        "JOB_RETENTION_FRESH",
        b">f1\nTTAA\n",
    )
    .await;

    let reaper = RetentionReaperService::new(
        Arc::clone(&registry),
        Arc::clone(&store),
        event_bus,
        3_600,
    );

    reaper.execute_sweep().await;

    let untouched_view = registry.snapshot("JOB_RETENTION_FRESH").unwrap();
    assert_eq!(untouched_view.state, JobState::Completed);
    assert!(untouched_view.deletion_at.is_none());

    let artifact_key =
        derive_artifact_key(PROCESS_SECRET, &artifact_reference.content_hash);
    let surviving_plaintext = store
        .get(&artifact_reference.content_hash, &artifact_key)
        .await
        .unwrap();
    assert_eq!(surviving_plaintext, b">f1\nTTAA\n");
    assert!(matches!(
        store.proof("JOB_RETENTION_FRESH").await,
        Err(StoreError::NotFound)
    ));
}
