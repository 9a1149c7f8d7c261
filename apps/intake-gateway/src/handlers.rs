// [apps/intake-gateway/src/handlers.rs]
/*!
 * =================================================================
 * APARATO: INTAKE HTTP HANDLERS (V6.3 - OPERATION ADAPTER)
 * CLASIFICACIÓN: API ADAPTER LAYER (ESTRATO L3)
 * RESPONSABILIDAD: MAPEO 1:1 DE OPERACIONES DEL NÚCLEO A HTTP
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. THIN ADAPTER: Cada handler delega en la superficie de admisión
 *    transport-agnostic; ninguna regla de negocio vive aquí.
 * 2. ERROR TAXONOMY: oversize/empty -> 422, queue_full -> 429,
 *    not_found -> 404, not_ready -> 409. El cancel de un terminal es
 *    inocuo y responde ok.
 * =================================================================
 */

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use serde_json::json;

use helixgate_domain_pipeline::IntakeError;
use helixgate_domain_registry::CancelOutcome;

use crate::state::AppState;

/// Parámetros de la admisión: etiqueta de archivo del cliente.
#[derive(Debug, Deserialize)]
pub struct UploadParams {
    pub filename: Option<String>,
}

fn intake_error_response(intake_fault: IntakeError) -> Response {
    let (status_code, error_kind) = match &intake_fault {
        IntakeError::Empty => (StatusCode::UNPROCESSABLE_ENTITY, "empty"),
        IntakeError::Oversize { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "oversize"),
        IntakeError::QueueFull => (StatusCode::TOO_MANY_REQUESTS, "queue_full"),
        IntakeError::NotFound => (StatusCode::NOT_FOUND, "not_found"),
        IntakeError::NotReady => (StatusCode::CONFLICT, "not_ready"),
        IntakeError::Registry(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
    };

    (
        status_code,
        Json(json!({
            "error": error_kind,
            "detail": intake_fault.to_string(),
        })),
    )
        .into_response()
}

/// POST /upload — admite una carga y responde {job_id}.
pub async fn handle_upload(
    State(application_state): State<AppState>,
    Query(upload_params): Query<UploadParams>,
    payload: Bytes,
) -> Response {
    let filename = upload_params
        .filename
        .unwrap_or_else(|| "upload.bin".to_string());

    match application_state.intake.submit(filename, payload.to_vec()) {
        Ok(job_identifier) => {
            (StatusCode::ACCEPTED, Json(json!({ "job_id": job_identifier }))).into_response()
        }
        Err(intake_fault) => intake_error_response(intake_fault),
    }
}

/// GET /status/{id} — último snapshot con rastro de etapas y cursor.
pub async fn handle_status(
    State(application_state): State<AppState>,
    Path(job_identifier): Path<String>,
) -> Response {
    match application_state.intake.status(&job_identifier) {
        Ok(job_view) => Json(job_view).into_response(),
        Err(intake_fault) => intake_error_response(intake_fault),
    }
}

/// GET /result/{id} — veredicto terminal; 409 mientras no esté sellado.
pub async fn handle_result(
    State(application_state): State<AppState>,
    Path(job_identifier): Path<String>,
) -> Response {
    match application_state.intake.result(&job_identifier) {
        Ok(verdict) => Json(verdict).into_response(),
        Err(intake_fault) => intake_error_response(intake_fault),
    }
}

/// GET /proof/{id} — prueba de borrado; 404 hasta que el borrado ocurra.
pub async fn handle_proof(
    State(application_state): State<AppState>,
    Path(job_identifier): Path<String>,
) -> Response {
    match application_state.intake.proof(&job_identifier).await {
        Ok(deletion_proof) => Json(deletion_proof).into_response(),
        Err(intake_fault) => intake_error_response(intake_fault),
    }
}

/// POST /cancel/{id} — idempotente; sobre un terminal responde ok inocuo.
pub async fn handle_cancel(
    State(application_state): State<AppState>,
    Path(job_identifier): Path<String>,
) -> Response {
    match application_state.intake.cancel(&job_identifier) {
        Ok(CancelOutcome::Signalled) => {
            Json(json!({ "status": "cancellation_signalled" })).into_response()
        }
        Ok(CancelOutcome::AlreadyTerminal) => {
            Json(json!({ "status": "already_terminal" })).into_response()
        }
        Err(intake_fault) => intake_error_response(intake_fault),
    }
}
