// [apps/intake-gateway/src/services/mod.rs]

pub mod retention;
pub mod telemetry;

pub use retention::RetentionReaperService;
pub use telemetry::spawn_telemetry_loop;
