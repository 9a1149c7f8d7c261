// [tests/mirror/libs/infra/store/artifact_lifecycle.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DE CICLO DE VIDA DE ARTEFACTOS (V1.2 - ZENITH)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L3-MIRROR
 * RESPONSABILIDAD: AUDITORÍA PUT/GET/DELETE/PROOF SOBRE SUSTRATO VOLÁTIL
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. ROUNDTRIP PARITY: put seguido de get devuelve los bytes exactos y
 *    el hash recomputado coincide con la identidad content-addressed.
 * 2. LEDGER IDEMPOTENCE: delete invocado dos veces devuelve la misma
 *    prueba con el mismo timestamp de borrado.
 * 3. PROOF RECOMPUTATION: El digest de la prueba verifica contra el
 *    firmante con el secreto de proceso.
 *
 * # Mathematical Proof (Content Addressing):
 * Dos put del mismo plaintext producen el mismo content_hash: SHA-256
 * es determinista y la identidad del artefacto es función pura del
 * contenido.
 * =================================================================
 */

use helixgate_core_vault::{derive_artifact_key, CipherAlgorithm};
use helixgate_infra_store::{ObjectStore, StoreError};
use std::time::Instant;

const PROCESS_SECRET: &[u8] = b"mirror-proving-grounds-secret";

async fn ignite_volatile_store(label: &str) -> (tempfile::TempDir, ObjectStore) {
    let blob_workspace = tempfile::tempdir().expect("INFRA_FAULT: tempdir allocation failed.");
    let metadata_url = format!("file:mirror_{}?mode=memory&cache=shared", label);

    let store = ObjectStore::open(
        blob_workspace.path(),
        &metadata_url,
        PROCESS_SECRET.to_vec(),
        CipherAlgorithm::AeadGcm256,
    )
    .await
    .expect("CRITICAL_FAULT: Failed to anchor volatile object store.");

    (blob_workspace, store)
}

/**
 * Ejecuta la validación de integridad del ciclo completo:
 * [Put -> Get -> Delete -> Proof -> Get(NotFound)].
 */
#[tokio::test]
async fn certify_artifact_lifecycle_integrity() {
    println!("\n🗄️  [INICIO]: Iniciando Auditoría del Ciclo de Vida de Artefactos V1.2...");
    let suite_execution_start = Instant::now();
    let mut accumulated_anomalies_count = 0u32;

    let (_blob_workspace, store) = ignite_volatile_store("lifecycle").await;
    let artifact_key = derive_artifact_key(PROCESS_SECRET, "JOB_MIRROR_LIFECYCLE");
    let plaintext = b">chr1\nACGTACGTACGTACGTNNNN\n".to_vec();

    // 1. FASE DE SELLADO (Génesis)
    println!("   🧪 Fase 1: Sellando artefacto en el almacén...");
    let artifact_reference = store
        .put("JOB_MIRROR_LIFECYCLE", &plaintext, &artifact_key)
        .await
        .expect("SEAL_FAULT: put collapsed.");

    if artifact_reference.content_hash != ObjectStore::content_hash(&plaintext) {
        println!("      ❌ FALLO: Deriva de identidad content-addressed.");
        accumulated_anomalies_count += 1;
    }
    if artifact_reference.original_size != plaintext.len() as u64 {
        accumulated_anomalies_count += 1;
    }

    // 2. FASE DE RECUPERACIÓN (Integridad verificada)
    println!("   🧪 Fase 2: Recuperando y verificando bytes exactos...");
    let recovered_plaintext = store
        .get(&artifact_reference.content_hash, &artifact_key)
        .await
        .expect("RETRIEVAL_FAULT: get collapsed.");

    if recovered_plaintext != plaintext {
        println!("      ❌ FALLO: Los bytes recuperados divergen del plaintext.");
        accumulated_anomalies_count += 1;
    } else {
        println!("      ✅ Paridad bit-perfecta certificada.");
    }

    // 3. FASE DE BORRADO IDEMPOTENTE (Seal Protocol)
    println!("   🧪 Fase 3: Validando borrado con prueba idempotente...");
    let first_proof = store
        .delete("JOB_MIRROR_LIFECYCLE")
        .await
        .expect("DELETION_FAULT: first delete collapsed.");
    let second_proof = store
        .delete("JOB_MIRROR_LIFECYCLE")
        .await
        .expect("DELETION_FAULT: second delete collapsed.");

    if first_proof != second_proof {
        println!("      ❌ FALLO: La segunda prueba diverge (timestamp no estable).");
        accumulated_anomalies_count += 1;
    }

    // 4. FASE DE RECOMPUTACIÓN DE FIRMA
    let signature_verified = store.signer().verify(
        &first_proof.job_id,
        &first_proof.artifact_content_hash,
        &first_proof.deletion_timestamp,
        &first_proof.proof_digest,
    );
    if !signature_verified {
        println!("      ❌ FALLO: El digest de la prueba no recomputa.");
        accumulated_anomalies_count += 1;
    } else {
        println!("      ✅ Prueba de borrado recomputada y certificada.");
    }

    // 5. FASE DE AUSENCIA POST-BORRADO
    let post_deletion_verdict = store.get(&artifact_reference.content_hash, &artifact_key).await;
    if !matches!(post_deletion_verdict, Err(StoreError::NotFound)) {
        println!("      ❌ FALLO: El artefacto sobrevivió a su borrado.");
        accumulated_anomalies_count += 1;
    }

    // 6. SENTENCIA
    let final_verdict_label = if accumulated_anomalies_count == 0 { "GOLD_MASTER" } else { "DEGRADED" };
    println!(
        "\n🏁 [INFORME]: Auditoría finalizada en {:?}. Veredicto: {}",
        suite_execution_start.elapsed(),
        final_verdict_label
    );

    assert_eq!(
        accumulated_anomalies_count, 0,
        "La integridad del almacén de artefactos ha sido comprometida."
    );
}

/**
 * CERTIFICACIÓN: Re-put del mismo plaintext desde otro trabajo produce
 * el mismo content_hash (deduplicación content-addressed) y el borrado
 * de uno no destruye el blob compartido.
 */
#[tokio::test]
async fn certify_content_addressed_deduplication() {
    let (_blob_workspace, store) = ignite_volatile_store("dedup").await;
    let plaintext = b">shared\nACGTACGT\n".to_vec();

    // La llave se vincula al hash de contenido: cargas idénticas
    // comparten llave y por tanto huella.
    let shared_key = derive_artifact_key(PROCESS_SECRET, &ObjectStore::content_hash(&plaintext));

    let reference_alpha = store.put("JOB_DEDUP_ALPHA", &plaintext, &shared_key).await.unwrap();
    let reference_beta = store.put("JOB_DEDUP_BETA", &plaintext, &shared_key).await.unwrap();

    assert_eq!(reference_alpha.content_hash, reference_beta.content_hash);
    assert_eq!(reference_alpha.key_fingerprint, reference_beta.key_fingerprint);

    // El borrado de ALPHA preserva el blob mientras BETA lo referencie.
    store.delete("JOB_DEDUP_ALPHA").await.unwrap();
    let surviving_plaintext = store.get(&reference_beta.content_hash, &shared_key).await.unwrap();
    assert_eq!(surviving_plaintext, plaintext);
}

/**
 * CERTIFICACIÓN: proof() responde NotFound hasta que el borrado ocurre.
 */
#[tokio::test]
async fn certify_proof_absence_before_deletion() {
    let (_blob_workspace, store) = ignite_volatile_store("proof_absence").await;
    let artifact_key = derive_artifact_key(PROCESS_SECRET, "JOB_PROOF_ABSENCE");

    store
        .put("JOB_PROOF_ABSENCE", b">x\nACGT\n", &artifact_key)
        .await
        .unwrap();

    assert!(matches!(
        store.proof("JOB_PROOF_ABSENCE").await,
        Err(StoreError::NotFound)
    ));

    store.delete("JOB_PROOF_ABSENCE").await.unwrap();
    assert!(store.proof("JOB_PROOF_ABSENCE").await.is_ok());
}
