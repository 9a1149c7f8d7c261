// [apps/intake-gateway/src/config.rs]
/*!
 * =================================================================
 * APARATO: GATEWAY CONFIGURATION MATRIX (V6.2 - GA OVERRIDE READY)
 * CLASIFICACIÓN: APPLICATION SHELL (ESTRATO L1-APP)
 * RESPONSABILIDAD: CAPTURA DE ENTORNO Y RESOLUCIÓN DE PARÁMETROS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. ENV FIRST: Toda opción es capturable por bandera CLI o variable
 *    de entorno hidratada por dotenvy.
 * 2. TUNER SYNAPSE: La tupla del optimizador externo, de publicarse en
 *    'models/ga_parameters.json' o en GA_PARAMETERS, sobreescribe
 *    umbrales y paralelismo.
 * 3. SECRET DISCIPLINE: El secreto de proceso jamás se loguea; en su
 *    ausencia se forja uno efímero con advertencia explícita.
 * =================================================================
 */

use clap::Parser;
use rand::RngCore;
use std::path::PathBuf;
use tracing::{info, warn};

use helixgate_core_vault::CipherAlgorithm;
use helixgate_domain_models::{EngineConfig, GaParameterTuple, StageDeadlines};

/// Nombre del archivo de tupla publicado por el tuner externo.
const GA_PARAMETERS_FILE: &str = "ga_parameters.json";

#[derive(Parser, Debug, Clone)]
#[command(name = "intake-gateway", version, about = "HelixGate genomic intake gateway")]
pub struct GatewayConfig {
    /// Puerto de escucha del adaptador HTTP.
    #[arg(long, env = "HELIXGATE_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Directorio raíz de datos durables (blobs/ y meta.db).
    #[arg(long, env = "HELIXGATE_DATA_DIR", default_value = "./data")]
    pub data_dir: PathBuf,

    /// Directorio de modelos (aml.bin, aml.threshold, ga_parameters.json).
    #[arg(long, env = "HELIXGATE_MODELS_DIR", default_value = "./models")]
    pub models_dir: PathBuf,

    /// Techo de admisión por carga, en bytes.
    #[arg(long, env = "HELIXGATE_MAX_INPUT_BYTES", default_value_t = 50 * 1024 * 1024)]
    pub max_input_bytes: u64,

    /// Profundidad de la FIFO de trabajos encolados.
    #[arg(long, env = "HELIXGATE_QUEUE_DEPTH", default_value_t = 64)]
    pub queue_depth: usize,

    /// Paralelismo del pool de workers del pipeline.
    #[arg(long, env = "HELIXGATE_WORKERS", default_value_t = 4)]
    pub workers: usize,

    /// Corte de aprobación del puntaje IDS.
    #[arg(long, env = "HELIXGATE_IDS_THRESHOLD", default_value_t = 5)]
    pub ids_threshold: u32,

    /// Techo del puntaje IDS acumulado.
    #[arg(long, env = "HELIXGATE_IDS_SCORE_CEILING", default_value_t = 100)]
    pub ids_score_ceiling: u32,

    /// Corte de aprobación AML; en ausencia manda el sidecar del modelo.
    #[arg(long, env = "HELIXGATE_AML_THRESHOLD")]
    pub aml_threshold: Option<f64>,

    /// Segundos tras el estado terminal antes de que la retención actúe.
    #[arg(long, env = "HELIXGATE_RETENTION_SECONDS", default_value_t = 604_800)]
    pub retention_seconds: u64,

    /// Secreto de proceso para llaves y pruebas de borrado (hexadecimal).
    #[arg(long, env = "HELIXGATE_SERVER_SECRET", hide_env_values = true)]
    pub server_secret: Option<String>,

    /// Algoritmo de sellado: "aead-gcm" (preferido) o "xor-hmac".
    #[arg(long, env = "HELIXGATE_CIPHER", default_value = "aead-gcm")]
    pub cipher: String,

    // --- DEADLINES POR ETAPA (MILISEGUNDOS) ---
    #[arg(long, env = "HELIXGATE_DEADLINE_FORMAT_MS", default_value_t = 2_000)]
    pub deadline_format_ms: u64,

    #[arg(long, env = "HELIXGATE_DEADLINE_IDS_MS", default_value_t = 5_000)]
    pub deadline_ids_ms: u64,

    #[arg(long, env = "HELIXGATE_DEADLINE_AML_MS", default_value_t = 10_000)]
    pub deadline_aml_ms: u64,

    #[arg(long, env = "HELIXGATE_DEADLINE_PERSIST_MS", default_value_t = 30_000)]
    pub deadline_persist_ms: u64,

    #[arg(long, env = "HELIXGATE_DEADLINE_ANALYZE_MS", default_value_t = 30_000)]
    pub deadline_analyze_ms: u64,
}

impl GatewayConfig {
    /**
     * Resuelve la configuración del motor, aplicando la tupla del tuner
     * externo si está publicada.
     */
    pub fn resolve_engine_config(&self) -> EngineConfig {
        let mut engine_config = EngineConfig {
            max_input_bytes: self.max_input_bytes,
            queue_depth: self.queue_depth,
            workers: self.workers,
            ids_threshold: self.ids_threshold,
            ids_score_ceiling: self.ids_score_ceiling,
            aml_threshold: self.aml_threshold,
            stage_deadlines: StageDeadlines {
                format_ms: self.deadline_format_ms,
                ids_ms: self.deadline_ids_ms,
                aml_ms: self.deadline_aml_ms,
                persist_ms: self.deadline_persist_ms,
                analyze_ms: self.deadline_analyze_ms,
            },
            retention_seconds: self.retention_seconds,
        };

        if let Some(ga_tuple) = self.load_ga_parameters() {
            info!("🧬 [CONFIG]: GA tuner tuple published. Applying overrides: {:?}", ga_tuple);
            engine_config.apply_ga_parameters(&ga_tuple);
        }

        engine_config
    }

    /// Busca la tupla del tuner: archivo publicado primero, entorno después.
    fn load_ga_parameters(&self) -> Option<GaParameterTuple> {
        let published_file = self.models_dir.join(GA_PARAMETERS_FILE);
        if published_file.is_file() {
            match std::fs::read_to_string(&published_file)
                .map_err(|fault| fault.to_string())
                .and_then(|raw| serde_json::from_str(&raw).map_err(|fault| fault.to_string()))
            {
                Ok(ga_tuple) => return Some(ga_tuple),
                Err(parse_fault) => {
                    warn!("⚠️ [CONFIG]: GA tuple file rejected: {}", parse_fault);
                }
            }
        }

        match std::env::var("GA_PARAMETERS") {
            Ok(raw_tuple) => match serde_json::from_str(&raw_tuple) {
                Ok(ga_tuple) => Some(ga_tuple),
                Err(parse_fault) => {
                    warn!("⚠️ [CONFIG]: GA_PARAMETERS env rejected: {}", parse_fault);
                    None
                }
            },
            Err(_) => None,
        }
    }

    /// Resuelve el algoritmo de sellado del almacén.
    pub fn resolve_cipher(&self) -> CipherAlgorithm {
        match self.cipher.as_str() {
            "xor-hmac" => {
                warn!("⚠️ [CONFIG]: Fallback cipher selected. Production should mandate AEAD.");
                CipherAlgorithm::XorHmac
            }
            _ => CipherAlgorithm::AeadGcm256,
        }
    }

    /**
     * Resuelve el secreto de proceso. En ausencia de configuración se
     * forja uno efímero: las pruebas de borrado no serán verificables
     * tras el reinicio del proceso.
     */
    pub fn resolve_server_secret(&self) -> Vec<u8> {
        if let Some(configured_secret) = &self.server_secret {
            if let Ok(decoded_secret) = hex::decode(configured_secret) {
                return decoded_secret;
            }
            return configured_secret.as_bytes().to_vec();
        }

        warn!("⚠️ [CONFIG]: HELIXGATE_SERVER_SECRET absent. Forging ephemeral process secret.");
        let mut ephemeral_secret = vec![0u8; 32];
        rand::thread_rng().fill_bytes(&mut ephemeral_secret);
        ephemeral_secret
    }
}
