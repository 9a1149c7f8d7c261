// [libs/domain/models/src/tests_serialization.rs]
/**
 * =================================================================
 * APARATO: DOMAIN SERIALIZATION TEST (V4.1 - INTEGRATION LEVEL)
 * CLASIFICACIÓN: TRINITY EVIDENCE (ESTRATO L2-MODELS)
 * RESPONSABILIDAD: CERTIFICACIÓN DE PARIDAD JSON DE LOS CONTRATOS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. TAG DISCIPLINE: Valida que los discriminadores serde de la suma
 *    etiquetada de detalles sean estables para los consumidores.
 * 2. STATE MACHINE EVIDENCE: Certifica la tabla de legalidad del
 *    autómata de estados contra el producto cartesiano completo.
 * 3. HYGIENE: Erradicación total de 'crate::' por nombres nominales.
 * =================================================================
 */
