// [libs/core/scanners/src/aml/model.rs]
/*!
 * =================================================================
 * APARATO: DENOISING AUTOENCODER RUNTIME (V6.2 - DETERMINISTIC INFERENCE)
 * CLASIFICACIÓN: CORE COMPUTE (ESTRATO L1)
 * RESPONSABILIDAD: CARGA DEL MODELO BINARIO E INFERENCIA DE RECONSTRUCCIÓN
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. WIRE FORMAT: magic "HXAE" ∥ u32 versión ∥ u32 D ∥ u32 H ∥
 *    f32-LE W1[H×D] ∥ b1[H] ∥ W2[D×H] ∥ b2[D].
 * 2. READ ONLY AFTER LOAD: Los pesos son inmutables tras la carga y se
 *    comparten entre workers sin sincronización.
 *
 * # Mathematical Proof (Deterministic Inference):
 * reconstruction = σ(W2·ReLU(W1·x + b1) + b2) con aritmética f64 en la
 * acumulación: el mismo vector produce el mismo puntaje en toda réplica.
 * =================================================================
 */

use byteorder::{LittleEndian, ReadBytesExt};
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use thiserror::Error;

/// Firma mágica del contenedor de pesos.
const MODEL_MAGIC: [u8; 4] = *b"HXAE";
/// Versión de formato soportada por este runtime.
const SUPPORTED_VERSION: u32 = 1;
/// Cota dura de dimensiones para rechazar contenedores corruptos.
const DIMENSION_HARD_CAP: u32 = 65_536;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("[L1_AML_FAULT]: MODEL_IO_FAILURE -> {0}")]
    Io(#[from] std::io::Error),

    #[error("[L1_AML_FAULT]: MODEL_MAGIC_MISMATCH")]
    BadMagic,

    #[error("[L1_AML_FAULT]: MODEL_VERSION_UNSUPPORTED -> {0}")]
    UnsupportedVersion(u32),

    #[error("[L1_AML_FAULT]: MODEL_DIMENSIONS_REJECTED -> D={0} H={1}")]
    DimensionsRejected(u32, u32),

    #[error("[L1_AML_FAULT]: THRESHOLD_PARSE_FAILURE -> {0}")]
    ThresholdParse(String),
}

/// Autoencoder de una capa oculta con pesos inmutables tras la carga.
#[derive(Debug, Clone)]
pub struct AutoencoderModel {
    pub input_dim: usize,
    pub hidden_dim: usize,
    encoder_weights: Vec<f32>,
    encoder_bias: Vec<f32>,
    decoder_weights: Vec<f32>,
    decoder_bias: Vec<f32>,
}

impl AutoencoderModel {
    /**
     * Construye el modelo desde bloques de pesos ya residentes en RAM
     * (despliegues embebidos y calibración).
     *
     * # Errors:
     * `ModelError::DimensionsRejected` si las longitudes de los bloques
     * no son consistentes con las dimensiones declaradas.
     */
    pub fn from_parts(
        input_dim: usize,
        hidden_dim: usize,
        encoder_weights: Vec<f32>,
        encoder_bias: Vec<f32>,
        decoder_weights: Vec<f32>,
        decoder_bias: Vec<f32>,
    ) -> Result<Self, ModelError> {
        let dimensions_consistent = input_dim > 0
            && hidden_dim > 0
            && encoder_weights.len() == hidden_dim * input_dim
            && encoder_bias.len() == hidden_dim
            && decoder_weights.len() == input_dim * hidden_dim
            && decoder_bias.len() == input_dim;

        if !dimensions_consistent {
            return Err(ModelError::DimensionsRejected(input_dim as u32, hidden_dim as u32));
        }

        Ok(Self {
            input_dim,
            hidden_dim,
            encoder_weights,
            encoder_bias,
            decoder_weights,
            decoder_bias,
        })
    }

    /**
     * Deserializa el contenedor binario de pesos.
     *
     * # Errors:
     * - `ModelError::BadMagic` / `UnsupportedVersion`: contenedor ajeno.
     * - `ModelError::DimensionsRejected`: dimensiones fuera de la cota dura.
     * - `ModelError::Io`: contenedor truncado o ilegible.
     */
    pub fn load(model_path: &Path) -> Result<Self, ModelError> {
        let mut reader = BufReader::new(File::open(model_path)?);

        let mut magic_buffer = [0u8; 4];
        reader.read_exact(&mut magic_buffer)?;
        if magic_buffer != MODEL_MAGIC {
            return Err(ModelError::BadMagic);
        }

        let container_version = reader.read_u32::<LittleEndian>()?;
        if container_version != SUPPORTED_VERSION {
            return Err(ModelError::UnsupportedVersion(container_version));
        }

        let input_dim = reader.read_u32::<LittleEndian>()?;
        let hidden_dim = reader.read_u32::<LittleEndian>()?;
        if input_dim == 0
            || hidden_dim == 0
            || input_dim > DIMENSION_HARD_CAP
            || hidden_dim > DIMENSION_HARD_CAP
        {
            return Err(ModelError::DimensionsRejected(input_dim, hidden_dim));
        }

        let input_dim = input_dim as usize;
        let hidden_dim = hidden_dim as usize;

        let mut read_f32_block = |length: usize| -> Result<Vec<f32>, ModelError> {
            let mut block = vec![0.0f32; length];
            reader.read_f32_into::<LittleEndian>(&mut block)?;
            Ok(block)
        };

        let encoder_weights = read_f32_block(hidden_dim * input_dim)?;
        let encoder_bias = read_f32_block(hidden_dim)?;
        let decoder_weights = read_f32_block(input_dim * hidden_dim)?;
        let decoder_bias = read_f32_block(input_dim)?;

        Ok(Self {
            input_dim,
            hidden_dim,
            encoder_weights,
            encoder_bias,
            decoder_weights,
            decoder_bias,
        })
    }

    /**
     * Reconstruye el vector de entrada y devuelve la salida de la capa
     * de decodificación.
     *
     * La activación oculta es ReLU; la salida pasa por la logística para
     * permanecer en [0, 1], el mismo dominio de las características.
     */
    pub fn reconstruct(&self, features: &[f64]) -> Vec<f64> {
        debug_assert_eq!(features.len(), self.input_dim);

        let mut hidden_activation = vec![0.0f64; self.hidden_dim];
        for hidden_index in 0..self.hidden_dim {
            let weight_row = &self.encoder_weights
                [hidden_index * self.input_dim..(hidden_index + 1) * self.input_dim];
            let mut accumulator = f64::from(self.encoder_bias[hidden_index]);
            for (weight, feature) in weight_row.iter().zip(features.iter()) {
                accumulator += f64::from(*weight) * feature;
            }
            hidden_activation[hidden_index] = accumulator.max(0.0);
        }

        let mut reconstruction = vec![0.0f64; self.input_dim];
        for output_index in 0..self.input_dim {
            let weight_row = &self.decoder_weights
                [output_index * self.hidden_dim..(output_index + 1) * self.hidden_dim];
            let mut accumulator = f64::from(self.decoder_bias[output_index]);
            for (weight, activation) in weight_row.iter().zip(hidden_activation.iter()) {
                accumulator += f64::from(*weight) * activation;
            }
            reconstruction[output_index] = logistic(accumulator);
        }

        reconstruction
    }

    /// Error cuadrático medio entre características y reconstrucción.
    pub fn reconstruction_score(&self, features: &[f64]) -> f64 {
        let reconstruction = self.reconstruct(features);
        let squared_error_sum: f64 = features
            .iter()
            .zip(reconstruction.iter())
            .map(|(feature, output)| (feature - output).powi(2))
            .sum();
        squared_error_sum / self.input_dim as f64
    }
}

fn logistic(value: f64) -> f64 {
    1.0 / (1.0 + (-value).exp())
}

/// Lee el umbral de corte desde su archivo sidecar (decimal en texto).
pub fn load_threshold(threshold_path: &Path) -> Result<f64, ModelError> {
    let mut first_line = String::new();
    BufReader::new(File::open(threshold_path)?).read_line(&mut first_line)?;

    first_line
        .trim()
        .parse::<f64>()
        .map_err(|fault| ModelError::ThresholdParse(fault.to_string()))
}
