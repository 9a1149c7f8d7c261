// [libs/domain/models/src/config.rs]
/*!
 * =================================================================
 * APARATO: ENGINE CONFIGURATION CONTRACTS (V4.2 - GA OVERRIDE READY)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: OPCIONES RECONOCIDAS DEL NÚCLEO Y TUPLA DEL TUNER
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. SINGLE SOURCE: Todos los aparatos reciben esta configuración por
 *    construcción; no existe acceso ambiental.
 * 2. TUNER SYNAPSE: El optimizador externo publica una tupla opaca que,
 *    de estar presente, sobreescribe umbrales y paralelismo.
 * =================================================================
 */

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Deadlines por etapa en milisegundos. Un deadline vencido abandona la
/// etapa con outcome 'fail' y detail.timeout=true.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDeadlines {
    pub format_ms: u64,
    pub ids_ms: u64,
    pub aml_ms: u64,
    pub persist_ms: u64,
    pub analyze_ms: u64,
}

impl Default for StageDeadlines {
    fn default() -> Self {
        Self {
            format_ms: 2_000,
            ids_ms: 5_000,
            aml_ms: 10_000,
            persist_ms: 30_000,
            analyze_ms: 30_000,
        }
    }
}

impl StageDeadlines {
    /// Deadline vigente para una etapa; 'admit' y 'finalize' corren libres.
    pub fn for_stage(&self, stage: crate::stage::StageName) -> Option<Duration> {
        use crate::stage::StageName;
        let millis = match stage {
            StageName::Admit | StageName::Finalize => return None,
            StageName::Format => self.format_ms,
            StageName::Ids => self.ids_ms,
            StageName::Aml => self.aml_ms,
            StageName::Persist => self.persist_ms,
            StageName::Analyze => self.analyze_ms,
        };
        Some(Duration::from_millis(millis))
    }
}

/// Tupla opaca publicada por el optimizador genético externo.
///
/// El tuner es un subsistema offline fuera de alcance; su único efecto
/// sobre el núcleo es sobreescribir estos tres parámetros si publica.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GaParameterTuple {
    pub ids_threshold: Option<u32>,
    pub aml_threshold: Option<f64>,
    pub workers: Option<usize>,
}

/// Configuración reconocida del motor de ingesta.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Rechazo de cargas por encima de este tamaño en la admisión.
    pub max_input_bytes: u64,
    /// Umbral de back-pressure de la cola FIFO.
    pub queue_depth: usize,
    /// Paralelismo del pool de workers del pipeline.
    pub workers: usize,
    /// Corte de aprobación del puntaje IDS.
    pub ids_threshold: u32,
    /// Techo del puntaje IDS acumulado.
    pub ids_score_ceiling: u32,
    /// Corte de aprobación del puntaje AML; None delega al archivo del modelo.
    pub aml_threshold: Option<f64>,
    /// Deadlines por etapa.
    pub stage_deadlines: StageDeadlines,
    /// Segundos tras el estado terminal antes de que la retención actúe.
    pub retention_seconds: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_input_bytes: 50 * 1024 * 1024,
            queue_depth: 64,
            workers: 4,
            ids_threshold: 5,
            ids_score_ceiling: 100,
            aml_threshold: None,
            stage_deadlines: StageDeadlines::default(),
            retention_seconds: 604_800,
        }
    }
}

impl EngineConfig {
    /// Aplica la tupla del tuner sobre la configuración base.
    pub fn apply_ga_parameters(&mut self, tuple: &GaParameterTuple) {
        if let Some(ids_threshold) = tuple.ids_threshold {
            self.ids_threshold = ids_threshold;
        }
        if let Some(aml_threshold) = tuple.aml_threshold {
            self.aml_threshold = Some(aml_threshold);
        }
        if let Some(workers) = tuple.workers {
            if workers > 0 {
                self.workers = workers;
            }
        }
    }
}
