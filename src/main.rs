use order_flow::MigrationConfig;
use std::process::ExitCode;

/// Migra los pedidos del origen heredado al esquema destino.
///
/// Configuración por entorno (o `.env`): `SOURCE_DB_URL`, `DEST_DB_URL`,
/// `BATCH_SIZE`, `STORE_ID`, `DB_POOL_SIZE`, `MIGRATION_WORKERS`,
/// `REPORT_DIR`, `DEST_RUN_MIGRATIONS`, `APP_ENV`, `LOG_REDACT_KEYS` y
/// `LOG_LEVEL`. Sale con 1 ante un fallo fatal (configuración, conexión o
/// lectura de una página).
fn main() -> ExitCode {
    let config = match MigrationConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            order_migration::init_logging("info");
            log::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    order_migration::init_logging(&config.log_level);
    log::info!("Iniciando migración de pedidos (tienda {}, lotes de {})", config.store_id, config.batch_size);

    match order_migration::run(&config) {
        Ok(outcome) => {
            let s = outcome.report.stats;
            log::info!("Migración completa [run:{}]", outcome.run_id);
            log::info!("Pedidos procesados: {}", s.total_processed);
            log::info!("Migrados y validados: {}", s.success_count);
            log::info!("Fallos de migración: {}", s.failure_count);
            log::info!("Fallos de validación: {}", s.validation_failure_count);
            if let Some(a) = outcome.artifacts {
                log::info!("Informe completo en: {}", a.report_path.display());
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("La migración falló: {}", e);
            ExitCode::FAILURE
        }
    }
}
