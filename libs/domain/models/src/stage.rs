// [libs/domain/models/src/stage.rs]
/*!
 * =================================================================
 * APARATO: STAGE DOMAIN MODELS (V4.1 - TAGGED DETAIL)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: CONTRATOS DE ETAPA Y DETALLE POLIMÓRFICO
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. TAGGED SUM DISCIPLINE: El detalle de cada etapa es una suma
 *    etiquetada con forma conocida por variante; el código aguas abajo
 *    despacha sobre la etiqueta, jamás sobre blobs dinámicos.
 * 2. FORENSIC MINIMALISM: Los detalles transportan conteos, puntajes y
 *    umbrales. Los bytes de entrada del cliente nunca viajan aquí.
 *
 * # Mathematical Proof (Detail Boundedness):
 * Cada variante acota sus colecciones (violaciones ≤ 32, offsets ≤ 8,
 * categorías ≤ 4), de modo que el tamaño serializado de un StageRecord
 * es O(1) respecto del tamaño de la entrada.
 * =================================================================
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identidad nominal de cada etapa del pipeline, en orden de ejecución.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StageName {
    Admit,
    Format,
    Ids,
    Aml,
    Persist,
    Analyze,
    Finalize,
}

impl StageName {
    /// Secuencia fija del pipeline. El executor itera exactamente esta lista.
    pub const ORDERED: [StageName; 7] = [
        StageName::Admit,
        StageName::Format,
        StageName::Ids,
        StageName::Aml,
        StageName::Persist,
        StageName::Analyze,
        StageName::Finalize,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StageName::Admit => "admit",
            StageName::Format => "format",
            StageName::Ids => "ids",
            StageName::Aml => "aml",
            StageName::Persist => "persist",
            StageName::Analyze => "analyze",
            StageName::Finalize => "finalize",
        }
    }
}

/// Resultado observable de una etapa.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StageOutcome {
    Pass,
    Fail,
    Skip,
}

/// Violación de alfabeto detectada por el validador de formato.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AlphabetViolation {
    /// Carácter ofensor, tal como aparece en la entrada.
    pub offending_character: char,
    /// Offset de byte absoluto (base cero) dentro del buffer.
    pub byte_offset: usize,
    /// Cabecera del registro que contiene la violación.
    pub record_header: String,
}

/// Resumen estructural del validador de formato (FASTA/FASTQ).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FormatDetail {
    /// Formato reconocido: "fasta", "fastq" o "unknown_format".
    pub detected_format: String,
    /// Registros completos observados.
    pub record_count: usize,
    /// Violaciones de alfabeto, acotadas a 32.
    pub violations: Vec<AlphabetViolation>,
    /// Falla estructural (registro incompleto, calidad desalineada), si la hubo.
    pub structural_fault: Option<String>,
    /// Verdadero si el escaneo abortó al alcanzar el tope de violaciones.
    pub truncated: bool,
}

/// Resumen del escáner de intrusiones. Los bytes coincidentes jamás se incluyen.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct IdsDetail {
    /// Total de coincidencias (solapamientos incluidos).
    pub match_count: usize,
    /// Puntaje acumulado de severidad, acotado por el techo configurado.
    pub score: u32,
    /// Umbral vigente en el momento del escaneo.
    pub threshold: u32,
    /// Categorías dominantes como pares (categoría, conteo), descendente.
    pub top_categories: Vec<(String, usize)>,
    /// Hasta 8 offsets de muestra dentro de [0, longitud_entrada).
    pub sample_offsets: Vec<usize>,
}

/// Resumen del detector de anomalías por reconstrucción.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmlDetail {
    /// Error cuadrático medio de reconstrucción.
    pub score: f64,
    /// Umbral vigente, expuesto para correlación operativa.
    pub threshold: f64,
    /// Dimensión fija del vector de características.
    pub feature_dim: usize,
    /// Bases efectivamente consumidas tras el truncado.
    pub body_length_used: usize,
}

/// Resumen de la etapa de persistencia cifrada.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PersistDetail {
    /// SHA-256 del plaintext, en hexadecimal.
    pub content_hash: String,
    pub original_size: u64,
    pub stored_size: u64,
    /// Algoritmo de sellado registrado ("aead_gcm_256" | "xor_hmac").
    pub algorithm_tag: String,
}

/// Resumen de la etapa de análisis (colaborador externo).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AnalyzeDetail {
    pub analysis_ok: bool,
    /// Diagnóstico grueso cuando el colaborador colapsa.
    pub failure_note: Option<String>,
}

/// Resumen de la etapa de admisión.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AdmitDetail {
    /// Tamaño verificado del payload en bytes.
    pub payload_size_bytes: u64,
}

/// Suma etiquetada de detalles por clase de etapa.
///
/// El código aguas abajo despacha sobre la etiqueta serde "kind".
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "summary", rename_all = "snake_case")]
pub enum StageDetail {
    Admit(AdmitDetail),
    Format(FormatDetail),
    Ids(IdsDetail),
    Aml(AmlDetail),
    Persist(PersistDetail),
    Analyze(AnalyzeDetail),
    /// Finalize y etapas abortadas transportan banderas mínimas.
    Terminal {
        /// Verdadero cuando la etapa fue abandonada por deadline.
        timeout: bool,
    },
}

impl StageDetail {
    pub fn timeout() -> Self {
        StageDetail::Terminal { timeout: true }
    }

    pub fn empty() -> Self {
        StageDetail::Terminal { timeout: false }
    }
}

/// Rastro inmutable de una etapa ejecutada, propiedad de su Job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageRecord {
    pub name: StageName,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcome: StageOutcome,
    pub detail: StageDetail,
}

impl StageRecord {
    /// Duración física de la etapa en milisegundos.
    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}
