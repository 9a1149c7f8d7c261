// [libs/core/scanners/src/lib.rs]
/*!
 * =================================================================
 * APARATO: SCANNER SUITE ROOT (V6.0 - PURE VERDICTS)
 * CLASIFICACIÓN: CORE COMPUTE (ESTRATO L1)
 * RESPONSABILIDAD: FUNCIONES PURAS DE VEREDICTO SOBRE RÁFAGAS DE BYTES
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. PURITY DISCIPLINE: Los tres escáneres son funciones totales de
 *    bytes/características a un registro de veredicto; ningún estado
 *    mutable, ningún efecto sobre disco.
 * 2. SHARED SHAPE: Todo veredicto expone {passed, score, detail} donde
 *    'passed' compara el puntaje contra el umbral configurado.
 * =================================================================
 */

pub mod aml;
pub mod format;
pub mod ids;

pub use aml::{AmlDetector, AmlScanReport, ModelError};
pub use format::{FormatReport, FormatValidator};
pub use ids::{IdsReport, IdsScanner, Severity, ThreatCategory};
