// [apps/intake-gateway/src/kernel.rs]
/*!
 * =================================================================
 * APARATO: INTAKE GATEWAY KERNEL (V6.4 - GUARD ACTIVE)
 * CLASIFICACIÓN: COMPOSITION ROOT (ESTRATO L1-APP)
 * RESPONSABILIDAD: BOOTSTRAP DE INFRAESTRUCTURA E IGNICIÓN SEGURA
 *
 * VISION HIPER-HOLÍSTICA:
 * Actúa como la placa base donde se conectan todos los aparatos:
 * almacén cifrado, registro, escáneres, pool de workers, daemons de
 * retención y telemetría, y el transporte HTTP.
 * =================================================================
 */

use anyhow::Context;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tracing::{error, info, instrument};

use helixgate_core_scanners::AmlDetector;
use helixgate_domain_pipeline::{
    CompositionProfiler, EventBus, IntakeService, PipelineExecutor, WorkerPool,
};
use helixgate_domain_registry::JobRegistry;
use helixgate_infra_store::ObjectStore;

use crate::config::GatewayConfig;
use crate::routes::create_gateway_router;
use crate::services::{spawn_telemetry_loop, RetentionReaperService};
use crate::state::AppState;

pub struct IntakeKernel {
    pub server_network_port: u16,
    pub application_shared_state: AppState,
    retention_seconds: u64,
    max_input_bytes: u64,
}

impl IntakeKernel {
    /**
     * Realiza la ignición de la infraestructura durable y el estado
     * neural. Ancla el almacén antes de levantar cualquier servicio.
     */
    #[instrument(skip(gateway_config))]
    pub async fn ignite(gateway_config: &GatewayConfig) -> anyhow::Result<Self> {
        let engine_config = gateway_config.resolve_engine_config();
        let server_secret = gateway_config.resolve_server_secret();

        // 1. SUSTRATO DURABLE (BLOBS + ÍNDICE DE METADATOS)
        std::fs::create_dir_all(&gateway_config.data_dir)
            .context("CRITICAL_FAULT: Data directory unreachable.")?;
        let blob_root = gateway_config.data_dir.join("blobs");
        let metadata_url = gateway_config
            .data_dir
            .join("meta.db")
            .to_string_lossy()
            .into_owned();

        let store = Arc::new(
            ObjectStore::open(
                &blob_root,
                &metadata_url,
                server_secret.clone(),
                gateway_config.resolve_cipher(),
            )
            .await
            .context("CRITICAL_FAULT: Object store ignition collapsed.")?,
        );

        // 2. ESTADO NEURAL Y ESCÁNERES
        let registry = Arc::new(JobRegistry::new());
        let event_bus = EventBus::new();
        let aml_detector = Arc::new(AmlDetector::from_model_dir(
            &gateway_config.models_dir,
            engine_config.aml_threshold,
        ));

        // 3. MOTOR DE PIPELINE Y POOL DE WORKERS
        let executor = Arc::new(PipelineExecutor::new(
            Arc::clone(&registry),
            Arc::clone(&store),
            aml_detector,
            Arc::new(CompositionProfiler),
            event_bus.clone(),
            engine_config.clone(),
            server_secret,
        ));
        let worker_pool = WorkerPool::ignite(executor, engine_config.workers, engine_config.queue_depth);

        let intake_service = Arc::new(IntakeService::new(
            Arc::clone(&registry),
            Arc::clone(&store),
            worker_pool,
            event_bus.clone(),
            engine_config.clone(),
        ));

        Ok(Self {
            server_network_port: gateway_config.port,
            application_shared_state: AppState {
                intake: intake_service,
                registry,
                store,
                event_bus,
            },
            retention_seconds: engine_config.retention_seconds,
            max_input_bytes: engine_config.max_input_bytes,
        })
    }

    /**
     * Lanza los daemons de mantenimiento y el servidor HTTP principal.
     * El apagado por señal drena el pool antes de soltar el proceso.
     */
    pub async fn launch_sovereign_operations(self) -> anyhow::Result<()> {
        let shared_application_state = self.application_shared_state.clone();

        // --- 1. DAEMON DE TELEMETRÍA (PANÓPTICO) ---
        spawn_telemetry_loop(shared_application_state.event_bus.clone());

        // --- 2. DAEMON DE RETENCIÓN (EVIDENCIA DE BORRADO) ---
        let retention_reaper = Arc::new(RetentionReaperService::new(
            Arc::clone(&shared_application_state.registry),
            Arc::clone(&shared_application_state.store),
            shared_application_state.event_bus.clone(),
            self.retention_seconds,
        ));
        retention_reaper.spawn_reaper_daemon();

        // --- 3. IGNICIÓN DEL TRANSPORTE HTTP (AXUM) ---
        let gateway_router =
            create_gateway_router(shared_application_state.clone(), self.max_input_bytes);

        let bind_address = SocketAddr::new(
            "0.0.0.0".parse::<IpAddr>().expect("static address"),
            self.server_network_port,
        );

        info!("🚀 [KERNEL_ONLINE]: Intake gateway listening at {}", bind_address);

        let tcp_listener = tokio::net::TcpListener::bind(bind_address)
            .await
            .context("CRITICAL_FAULT: Failed to bind network port.")?;

        let serve_result = axum::serve(tcp_listener, gateway_router)
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
                info!("🛑 [KERNEL]: Shutdown signal observed. Sealing intake.");
            })
            .await;

        if let Err(server_fault) = serve_result {
            error!("💀 [KERNEL_COLLAPSE]: Runtime failure: {}", server_fault);
            return Err(server_fault.into());
        }

        // --- 4. DRENAJE DEL POOL ANTES DE LA DEFUNCIÓN DEL PROCESO ---
        shared_application_state.intake.shutdown().await;
        info!("✅ [KERNEL]: Worker pool drained. Process sealed.");
        Ok(())
    }
}
