//! Arranque de la migración: conecta los dos almacenes a partir de
//! `MigrationConfig`, ejecuta el motor y genera el informe.
use order_domain::StoreFilter;
use order_flow::{EngineConfig, EventLog, FileReporter, FlowError, MigrationConfig, MigrationEngine, MigrationReport,
                 RedactingLogger, ReportArtifacts};
use order_persistence::{connect, DieselDestination, DieselSourceStore};
use serde_json::json;
use std::sync::{Arc, OnceLock};
use uuid::Uuid;

static LOGGER: OnceLock<()> = OnceLock::new();

/// Inicializa `env_logger` una sola vez. `RUST_LOG` tiene prioridad sobre
/// `level`.
pub fn init_logging(level: &str) {
  LOGGER.get_or_init(|| {
          let env = env_logger::Env::default().default_filter_or(level);
          let _ = env_logger::Builder::from_env(env).format_timestamp_millis().try_init();
        });
}

pub struct RunOutcome {
  pub run_id: Uuid,
  pub report: MigrationReport,
  /// `None` si el informe no pudo escribirse.
  pub artifacts: Option<ReportArtifacts>,
}

/// Ejecuta una migración completa. Los pools se liberan al salir, tanto si
/// la ejecución termina bien como si falla.
pub fn run(config: &MigrationConfig) -> Result<RunOutcome, FlowError> {
  let run_id = Uuid::new_v4();
  let log: Arc<dyn EventLog> =
    Arc::new(RedactingLogger::for_environment(run_id, config.production, &config.extra_redact_keys));
  log.log(log::Level::Info, json!({"event": "connecting", "store_id": config.store_id}));

  let source_pool = connect(&config.source_db_url, config.pool_size)
    .map_err(|e| FlowError::Connection(format!("origen: {}", e)))?;
  let dest_pool = connect(&config.dest_db_url, config.pool_size)
    .map_err(|e| FlowError::Connection(format!("destino: {}", e)))?;
  let source = Arc::new(DieselSourceStore::new(Arc::new(source_pool)));
  let destination = Arc::new(DieselDestination::new(Arc::new(dest_pool)));
  if config.run_migrations {
    let applied = destination.run_migrations()
                             .map_err(|e| FlowError::Connection(format!("migraciones: {}", e)))?;
    log.log(log::Level::Info, json!({"event": "migrations_applied", "count": applied}));
  }

  let engine = MigrationEngine::new(source, destination, log.clone(), EngineConfig { workers: config.workers });
  let report = engine.run(config.batch_size, &StoreFilter::new(config.store_id.clone()))?;

  let artifacts = match FileReporter::new(&config.report_dir).generate(&report) {
    Ok(a) => {
      log.log(log::Level::Info,
              json!({"event": "report_written", "report_path": a.report_path.display().to_string(),
                     "csv_path": a.csv_path.as_ref().map(|p| p.display().to_string())}));
      Some(a)
    }
    Err(e) => {
      log.log(log::Level::Error, json!({"event": "report_failed", "error": e.to_string()}));
      None
    }
  };
  if report.stats.validation_failure_count > 0 {
    log.log(log::Level::Warn,
            json!({"event": "validation_failures_present", "count": report.stats.validation_failure_count,
                   "hint": "revise el informe y vuelva a ejecutar la migración para esos pedidos"}));
  }
  Ok(RunOutcome { run_id, report, artifacts })
}
