// [apps/intake-gateway/src/routes.rs]
/*!
 * =================================================================
 * APARATO: GATEWAY ROUTING MATRIX (V6.2 - INTAKE TOPOLOGY)
 * CLASIFICACIÓN: API ADAPTER LAYER (ESTRATO L3)
 * RESPONSABILIDAD: TOPOLOGÍA DE RUTAS Y ESCUDOS DE RED
 *
 * VISION HIPER-HOLÍSTICA:
 * Una ruta por operación de la superficie de admisión:
 * 1. POST /upload           (admisión)
 * 2. GET  /status/{id}      (snapshot)
 * 3. GET  /result/{id}      (veredicto terminal)
 * 4. GET  /proof/{id}       (evidencia de borrado)
 * 5. POST /cancel/{id}      (cancelación idempotente)
 * =================================================================
 */

use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method},
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Margen sobre el techo de admisión: la regla de negocio 'oversize'
/// del núcleo decide primero; el límite de transporte solo corta abusos.
const TRANSPORT_LIMIT_MARGIN_BYTES: usize = 4_096;

pub fn create_gateway_router(application_shared_state: AppState, max_input_bytes: u64) -> Router {
    // Escudo de Red: CORS permisivo para herramientas de operación.
    let network_security_shield = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(Duration::from_secs(3600));

    Router::new()
        .route("/health", get(|| async { "STATUS_OK" }))
        .route("/upload", post(handlers::handle_upload))
        .route("/status/:id", get(handlers::handle_status))
        .route("/result/:id", get(handlers::handle_result))
        .route("/proof/:id", get(handlers::handle_proof))
        .route("/cancel/:id", post(handlers::handle_cancel))
        .layer(DefaultBodyLimit::max(
            max_input_bytes as usize + TRANSPORT_LIMIT_MARGIN_BYTES,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(network_security_shield)
        .with_state(application_shared_state)
}
