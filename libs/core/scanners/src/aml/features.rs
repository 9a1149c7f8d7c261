// [libs/core/scanners/src/aml/features.rs]
/*!
 * =================================================================
 * APARATO: GENOMIC FEATURE EXTRACTOR (V6.1 - FIXED DIMENSION)
 * CLASIFICACIÓN: CORE COMPUTE (ESTRATO L1)
 * RESPONSABILIDAD: VECTORIZACIÓN DETERMINISTA DE CUERPOS DE SECUENCIA
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. TOTAL FUNCTION: Toda entrada (incluso vacía) produce un vector de
 *    dimensión fija D=784 con componentes en [0, 1].
 * 2. AMBIGUITY DISCIPLINE: Caracteres ambiguos o de hueco rompen la
 *    continuidad de k-meros y no aportan a ningún conteo.
 *
 * # Mathematical Proof (Feature Layout):
 * Índices [0, 64)  -> frecuencias de trinucleótidos ACGT³ (orden lexicográfico)
 * Índices [64, 80) -> frecuencias de dinucleótidos ACGT²
 * Índice  80       -> fracción GC
 * Índice  81       -> homopolímero máximo global / longitud del cuerpo
 * Índices [82, 86) -> homopolímero máximo por base {A,C,G,T} / longitud
 * Índices [86, 784)-> relleno con ceros
 * Toda frecuencia es un cociente de conteos, luego cae en [0, 1].
 * =================================================================
 */

/// Dimensión fija del vector de características.
pub const FEATURE_DIM: usize = 784;
/// Tope por defecto de bases consumidas del cuerpo.
pub const DEFAULT_MAX_BODY_LENGTH: usize = 250_000;

const TRINUCLEOTIDE_COUNT: usize = 64;
const DINUCLEOTIDE_COUNT: usize = 16;

/// Vector de características más el rastro de bases consumidas.
#[derive(Debug, Clone)]
pub struct FeatureVector {
    pub values: Vec<f64>,
    pub body_length_used: usize,
}

/// Extractor puro configurado con el tope de cuerpo.
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    max_body_length: usize,
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self { max_body_length: DEFAULT_MAX_BODY_LENGTH }
    }
}

impl FeatureExtractor {
    pub fn new(max_body_length: usize) -> Self {
        Self { max_body_length }
    }

    /**
     * Extrae el cuerpo de secuencia de un buffer FASTA/FASTQ: la
     * concatenación de las líneas de secuencia de todos los registros.
     *
     * Para FASTA se excluyen cabeceras; para FASTQ se toma únicamente
     * la segunda línea de cada registro de cuatro.
     */
    pub fn extract_sequence_body(input_buffer: &[u8]) -> Vec<u8> {
        let first_meaningful_byte = input_buffer
            .iter()
            .copied()
            .find(|byte| !byte.is_ascii_whitespace());

        match first_meaningful_byte {
            Some(b'>') => Self::fasta_body(input_buffer),
            Some(b'@') => Self::fastq_body(input_buffer),
            _ => Vec::new(),
        }
    }

    fn fasta_body(input_buffer: &[u8]) -> Vec<u8> {
        let mut body = Vec::new();
        for line in input_buffer.split(|byte| *byte == b'\n') {
            if line.first() == Some(&b'>') {
                continue;
            }
            body.extend(line.iter().copied().filter(|byte| !byte.is_ascii_whitespace()));
        }
        body
    }

    fn fastq_body(input_buffer: &[u8]) -> Vec<u8> {
        let mut body = Vec::new();
        let meaningful_lines = input_buffer
            .split(|byte| *byte == b'\n')
            .filter(|line| !line.iter().all(|byte| byte.is_ascii_whitespace()));

        for (line_index, line) in meaningful_lines.enumerate() {
            // Registro de cuatro líneas: la secuencia ocupa la posición 1.
            if line_index % 4 == 1 {
                body.extend(line.iter().copied().filter(|byte| !byte.is_ascii_whitespace()));
            }
        }
        body
    }

    /**
     * Vectoriza un cuerpo de secuencia a dimensión fija.
     *
     * # Performance:
     * Una pasada O(n) sobre el cuerpo truncado; memoria O(D).
     */
    pub fn extract(&self, sequence_body: &[u8]) -> FeatureVector {
        let truncated_body = if sequence_body.len() > self.max_body_length {
            &sequence_body[..self.max_body_length]
        } else {
            sequence_body
        };

        let mut trinucleotide_counts = [0u64; TRINUCLEOTIDE_COUNT];
        let mut dinucleotide_counts = [0u64; DINUCLEOTIDE_COUNT];
        let mut base_counts = [0u64; 4];
        let mut per_base_max_run = [0usize; 4];

        let mut current_run_base: Option<usize> = None;
        let mut current_run_length = 0usize;
        // Ventana deslizante de índices de base; None rompe la continuidad.
        let mut previous_base: Option<usize> = None;
        let mut previous_pair: Option<(usize, usize)> = None;

        for byte in truncated_body {
            let base_index = base_index_of(*byte);

            match base_index {
                Some(index) => {
                    base_counts[index] += 1;

                    if let Some(previous) = previous_base {
                        dinucleotide_counts[previous * 4 + index] += 1;
                    }
                    if let Some((first, second)) = previous_pair {
                        trinucleotide_counts[first * 16 + second * 4 + index] += 1;
                    }
                    previous_pair = previous_base.map(|previous| (previous, index));
                    previous_base = Some(index);

                    if current_run_base == Some(index) {
                        current_run_length += 1;
                    } else {
                        current_run_base = Some(index);
                        current_run_length = 1;
                    }
                    if current_run_length > per_base_max_run[index] {
                        per_base_max_run[index] = current_run_length;
                    }
                }
                None => {
                    // Ambiguos y huecos no aportan y rompen la continuidad.
                    previous_base = None;
                    previous_pair = None;
                    current_run_base = None;
                    current_run_length = 0;
                }
            }
        }

        let mut values = vec![0.0f64; FEATURE_DIM];

        let trinucleotide_total: u64 = trinucleotide_counts.iter().sum();
        if trinucleotide_total > 0 {
            for (index, count) in trinucleotide_counts.iter().enumerate() {
                values[index] = *count as f64 / trinucleotide_total as f64;
            }
        }

        let dinucleotide_total: u64 = dinucleotide_counts.iter().sum();
        if dinucleotide_total > 0 {
            for (index, count) in dinucleotide_counts.iter().enumerate() {
                values[TRINUCLEOTIDE_COUNT + index] = *count as f64 / dinucleotide_total as f64;
            }
        }

        let valid_base_total: u64 = base_counts.iter().sum();
        let body_length = truncated_body.len();

        if valid_base_total > 0 {
            // Fracción GC: índices 1 (C) y 2 (G).
            values[80] = (base_counts[1] + base_counts[2]) as f64 / valid_base_total as f64;
        }

        if body_length > 0 {
            let global_max_run = per_base_max_run.iter().copied().max().unwrap_or(0);
            values[81] = global_max_run as f64 / body_length as f64;
            for (base, max_run) in per_base_max_run.iter().enumerate() {
                values[82 + base] = *max_run as f64 / body_length as f64;
            }
        }

        FeatureVector { values, body_length_used: body_length }
    }
}

/// A=0, C=1, G=2, T=3; cualquier otro byte es ambiguo.
fn base_index_of(byte: u8) -> Option<usize> {
    match byte.to_ascii_uppercase() {
        b'A' => Some(0),
        b'C' => Some(1),
        b'G' => Some(2),
        b'T' => Some(3),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn certify_fixed_dimension_and_range() {
        let extractor = FeatureExtractor::default();
        let vector = extractor.extract(b"ACGTACGTNNNNACGT----acgt");
        assert_eq!(vector.values.len(), FEATURE_DIM);
        for value in &vector.values {
            assert!(*value >= 0.0 && *value <= 1.0);
        }
    }

    #[test]
    fn certify_empty_body_is_total() {
        let vector = FeatureExtractor::default().extract(b"");
        assert_eq!(vector.values.len(), FEATURE_DIM);
        assert_eq!(vector.body_length_used, 0);
        assert!(vector.values.iter().all(|value| *value == 0.0));
    }

    #[test]
    fn certify_homopolymer_features() {
        // Cuerpo 100% A: homopolímero global normalizado = 1.0.
        let body = vec![b'A'; 64];
        let vector = FeatureExtractor::default().extract(&body);
        assert!((vector.values[81] - 1.0).abs() < f64::EPSILON);
        assert!((vector.values[82] - 1.0).abs() < f64::EPSILON); // máximo de A
        assert_eq!(vector.values[83], 0.0); // máximo de C
        // Trinucleótido AAA (índice 0) concentra toda la masa.
        assert!((vector.values[0] - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn certify_gc_fraction() {
        let vector = FeatureExtractor::default().extract(b"GGCCAATT");
        assert!((vector.values[80] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn certify_ambiguity_breaks_kmer_continuity() {
        // "ACN GT": ningún trinucleótido válido, un dinucleótido (GT)
        // y otro (AC).
        let vector = FeatureExtractor::default().extract(b"ACNGT");
        let trinucleotide_mass: f64 = vector.values[..64].iter().sum();
        assert_eq!(trinucleotide_mass, 0.0);
        let dinucleotide_mass: f64 = vector.values[64..80].iter().sum();
        assert!((dinucleotide_mass - 1.0).abs() < 1e-12);
    }

    #[test]
    fn certify_body_truncation_cap() {
        let oversized_body = vec![b'A'; 1_000];
        let vector = FeatureExtractor::new(100).extract(&oversized_body);
        assert_eq!(vector.body_length_used, 100);
    }

    #[test]
    fn certify_fasta_body_extraction() {
        let body = FeatureExtractor::extract_sequence_body(b">h1\nACGT\nGGTT\n>h2\nTTAA\n");
        assert_eq!(body, b"ACGTGGTTTTAA");
    }

    #[test]
    fn certify_fastq_body_extraction() {
        let body =
            FeatureExtractor::extract_sequence_body(b"@r1\nACGT\n+\nIIII\n@r2\nGGTT\n+\nFFFF\n");
        assert_eq!(body, b"ACGTGGTT");
    }

    proptest! {
        /// La extracción es total y acotada para cuerpos arbitrarios.
        #[test]
        fn certify_extraction_totality(random_body in proptest::collection::vec(any::<u8>(), 0..4096)) {
            let vector = FeatureExtractor::default().extract(&random_body);
            prop_assert_eq!(vector.values.len(), FEATURE_DIM);
            for value in &vector.values {
                prop_assert!(*value >= 0.0 && *value <= 1.0);
            }
        }
    }
}
