// [apps/intake-gateway/src/main.rs]
/*!
 * =================================================================
 * APARATO: GATEWAY MAIN ENTRY POINT (V6.2 - GOLD MASTER)
 * CLASIFICACIÓN: APPLICATION SHELL (ESTRATO L1-APP)
 * RESPONSABILIDAD: BOOTSTRAP DE ENTORNO E IGNICIÓN SEGURA
 *
 * # Mathematical Proof (Deterministic Ignition):
 * El proceso garantiza que el almacén durable quede anclado antes de
 * la apertura del socket TCP, previniendo estados de carrera donde una
 * admisión llegue sin índice de metadatos solidificado.
 * =================================================================
 */

use clap::Parser;
use dotenvy::dotenv;
use helixgate_intake_gateway::prelude::{GatewayConfig, IntakeKernel};
use helixgate_shared_panoptes::init_tracing;
use tracing::info;

/**
 * Punto de ignición supremo del binario del Gateway.
 */
fn main() -> anyhow::Result<()> {
    // 1. CARGA DE ENTORNO SOBERANO
    // Hidrata las variables de .env en el espacio de nombres del proceso.
    dotenv().ok();

    // 2. INICIALIZACIÓN DE OBSERVABILIDAD NEURAL (PANOPTES)
    init_tracing("helixgate_intake_gateway");

    // 3. CAPTURA DE CONFIGURACIÓN (CLI + ENTORNO)
    let gateway_config = GatewayConfig::parse();

    // 4. RUNTIME SOBERANO
    let runtime_gateway = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime_gateway.block_on(async {
        info!("🛰️  [INTAKE_GATEWAY]: Global ignition sequence starting...");

        // 5. CONSTRUCCIÓN DEL KERNEL SOBERANO (ESTRATO L1-APP)
        let kernel_instance = IntakeKernel::ignite(&gateway_config).await?;

        // 6. IGNICIÓN DE OPERACIONES
        info!(
            "🚀 [HELIXGATE_ONLINE]: System fully operational on port {}.",
            kernel_instance.server_network_port
        );
        kernel_instance.launch_sovereign_operations().await?;

        Ok(())
    })
}
