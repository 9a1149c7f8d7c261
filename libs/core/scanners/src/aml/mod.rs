// [libs/core/scanners/src/aml/mod.rs]
/*!
 * =================================================================
 * APARATO: ANOMALY DETECTION FACADE (V6.2 - SKIP AWARE)
 * CLASIFICACIÓN: CORE COMPUTE (ESTRATO L1)
 * RESPONSABILIDAD: VEREDICTO ADVERSARIAL POR ERROR DE RECONSTRUCCIÓN
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. SKIP SEMANTICS: Sin modelo cargado el escaneo se omite, jamás
 *    colapsa; el pipeline trata la omisión como no-fatal.
 * 2. OPERATOR CORRELATION: El umbral vigente viaja en el detalle para
 *    correlacionar veredictos con cambios de configuración.
 * =================================================================
 */

pub mod features;
pub mod model;

use std::path::Path;
use tracing::{info, warn};

use helixgate_domain_models::AmlDetail;

pub use features::{FeatureExtractor, FeatureVector, DEFAULT_MAX_BODY_LENGTH, FEATURE_DIM};
pub use model::{load_threshold, AutoencoderModel, ModelError};

/// Nombre del contenedor de pesos bajo el directorio de modelos.
const MODEL_FILE_NAME: &str = "aml.bin";
/// Nombre del sidecar de umbral.
const THRESHOLD_FILE_NAME: &str = "aml.threshold";
/// Umbral de reserva cuando el sidecar está ausente y no hay override.
const FALLBACK_THRESHOLD: f64 = 0.05;

/// Veredicto del detector: puntuado o omitido.
#[derive(Debug, Clone)]
pub enum AmlScanReport {
    /// Modelo cargado: puntaje contra umbral.
    Scored { passed: bool, detail: AmlDetail },
    /// Modelo ausente: la etapa registra 'skip'.
    Skipped,
}

/// Detector de entradas adversariales por reconstrucción.
pub struct AmlDetector {
    model: Option<AutoencoderModel>,
    threshold: f64,
    extractor: FeatureExtractor,
}

impl AmlDetector {
    /**
     * Sondea el directorio de modelos. Un contenedor ausente o corrupto
     * degrada el detector a modo de omisión con advertencia, jamás
     * detiene la ignición del servicio.
     */
    pub fn from_model_dir(model_directory: &Path, threshold_override: Option<f64>) -> Self {
        let model_path = model_directory.join(MODEL_FILE_NAME);
        let threshold_path = model_directory.join(THRESHOLD_FILE_NAME);

        let model = if model_path.is_file() {
            match AutoencoderModel::load(&model_path) {
                Ok(loaded_model) => {
                    info!(
                        "🧠 [AML]: Autoencoder online. D={} H={}",
                        loaded_model.input_dim, loaded_model.hidden_dim
                    );
                    Some(loaded_model)
                }
                Err(load_fault) => {
                    warn!("⚠️ [AML]: Model container rejected, running in skip mode: {}", load_fault);
                    None
                }
            }
        } else {
            info!("💤 [AML]: No model present. Detector in skip mode.");
            None
        };

        let threshold = threshold_override
            .or_else(|| {
                if threshold_path.is_file() {
                    match load_threshold(&threshold_path) {
                        Ok(parsed_threshold) => Some(parsed_threshold),
                        Err(parse_fault) => {
                            warn!("⚠️ [AML]: Threshold sidecar rejected: {}", parse_fault);
                            None
                        }
                    }
                } else {
                    None
                }
            })
            .unwrap_or(FALLBACK_THRESHOLD);

        Self { model, threshold, extractor: FeatureExtractor::default() }
    }

    /// Detector sin modelo: toda exploración se omite.
    pub fn disabled() -> Self {
        Self { model: None, threshold: FALLBACK_THRESHOLD, extractor: FeatureExtractor::default() }
    }

    /// Detector con modelo ya construido (Proving Grounds y despliegues embebidos).
    pub fn with_model(model: AutoencoderModel, threshold: f64) -> Self {
        Self { model: Some(model), threshold, extractor: FeatureExtractor::default() }
    }

    pub fn is_armed(&self) -> bool {
        self.model.is_some()
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /**
     * Evalúa el cuerpo de secuencia. Sin modelo devuelve 'Skipped'.
     *
     * passed sii score ≤ umbral, con score = MSE(x, modelo(x)).
     */
    pub fn scan(&self, sequence_body: &[u8]) -> AmlScanReport {
        let Some(model) = &self.model else {
            return AmlScanReport::Skipped;
        };

        let feature_vector = self.extractor.extract(sequence_body);
        let score = model.reconstruction_score(&feature_vector.values);

        AmlScanReport::Scored {
            passed: score <= self.threshold,
            detail: AmlDetail {
                score,
                threshold: self.threshold,
                feature_dim: feature_vector.values.len(),
                body_length_used: feature_vector.body_length_used,
            },
        }
    }
}
