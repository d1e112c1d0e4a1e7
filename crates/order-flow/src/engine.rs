// Archivo: engine.rs
// Propósito: motor de migración por lotes. Recorre el origen por páginas,
// procesa cada pedido (vales, transformación, carga, validación) y acumula
// el resumen de la ejecución.
use crate::errors::{FlowError, RecordError, Result};
use crate::logging::EventLog;
use crate::stats::{MigrationReport, RecordOutcome};
use order_domain::{transform, validate, DestinationStore, SourceOrder, SourceStore, StoreFilter};
use rayon::prelude::*;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

/// Configuración del motor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
  /// Pedidos procesados en paralelo dentro de una página. `<= 1` es
  /// secuencial.
  pub workers: usize,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self { workers: 1 }
  }
}

pub struct MigrationEngine<S, D>
  where S: SourceStore + ?Sized,
        D: DestinationStore + ?Sized
{
  source: Arc<S>,
  destination: Arc<D>,
  log: Arc<dyn EventLog>,
  config: EngineConfig,
}

impl<S, D> MigrationEngine<S, D>
  where S: SourceStore + ?Sized,
        D: DestinationStore + ?Sized
{
  pub fn new(source: Arc<S>, destination: Arc<D>, log: Arc<dyn EventLog>, config: EngineConfig) -> Self {
    Self { source, destination, log, config }
  }

  /// Ejecuta la migración completa.
  ///
  /// - Se piden páginas de `batch_size` filas desde el desplazamiento 0 hasta
  ///   recibir una página vacía; el desplazamiento avanza `batch_size` tras
  ///   cada página.
  /// - Un error al pedir una página aborta la ejecución.
  /// - Un error en un pedido se registra como fallo y no detiene el lote.
  pub fn run(&self, batch_size: usize, filter: &StoreFilter) -> Result<MigrationReport> {
    if batch_size == 0 {
      return Err(FlowError::Config("el tamaño de lote debe ser mayor que 0".into()));
    }
    let pool = self.worker_pool()?;
    let limit = i64::try_from(batch_size).map_err(|_| FlowError::Config(format!("tamaño de lote fuera de rango: {}", batch_size)))?;
    let mut report = MigrationReport::default();
    let mut offset: i64 = 0;

    self.log.log(log::Level::Info,
                 json!({"event": "migration_start", "batch_size": batch_size, "store_id": filter.store_id,
                        "workers": self.config.workers}));
    loop {
      let page = match self.source.fetch_page(filter, limit, offset) {
        Ok(page) => page,
        Err(e) => {
          self.log.log(log::Level::Error, json!({"event": "page_fetch_failed", "offset": offset, "error": e.to_string()}));
          return Err(FlowError::Source(e));
        }
      };
      report.pages_fetched += 1;
      if page.is_empty() {
        break;
      }
      self.log.log(log::Level::Info, json!({"event": "batch_start", "offset": offset, "size": page.len()}));

      let outcomes: Vec<RecordOutcome> = match &pool {
        Some(pool) => pool.install(|| self.process_grouped(&page)),
        None => page.iter().map(|order| self.process_record(order)).collect(),
      };
      for outcome in outcomes {
        self.log_outcome(&outcome);
        report.record(outcome);
      }

      offset += limit;
      let s = report.stats;
      self.log.log(log::Level::Info,
                   json!({"event": "batch_complete", "total_processed": s.total_processed,
                          "success": s.success_count, "failures": s.failure_count,
                          "validation_failures": s.validation_failure_count}));
    }

    let s = report.stats;
    self.log.log(log::Level::Info,
                 json!({"event": "migration_complete", "total_processed": s.total_processed,
                        "success": s.success_count, "failures": s.failure_count,
                        "validation_failures": s.validation_failure_count, "pages": report.pages_fetched}));
    Ok(report)
  }

  fn worker_pool(&self) -> Result<Option<rayon::ThreadPool>> {
    if self.config.workers <= 1 {
      return Ok(None);
    }
    rayon::ThreadPoolBuilder::new().num_threads(self.config.workers)
                                   .thread_name(|i| format!("order-migration-{}", i))
                                   .build()
                                   .map(Some)
                                   .map_err(|e| FlowError::Worker(e.to_string()))
  }

  /// Filas de una página agrupadas por pedido. Cada grupo corre en orden
  /// dentro de una única tarea; los resultados vuelven en el orden de la
  /// página.
  fn process_grouped(&self, page: &[SourceOrder]) -> Vec<RecordOutcome> {
    let mut slots: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<Vec<usize>> = Vec::new();
    for (i, order) in page.iter().enumerate() {
      let slot = *slots.entry(order.id.trim()).or_insert_with(|| {
                         groups.push(Vec::new());
                         groups.len() - 1
                       });
      groups[slot].push(i);
    }
    let per_group: Vec<Vec<(usize, RecordOutcome)>> =
      groups.par_iter()
            .map(|rows| rows.iter().map(|&i| (i, self.process_record(&page[i]))).collect())
            .collect();
    let mut indexed: Vec<(usize, RecordOutcome)> = per_group.into_iter().flatten().collect();
    indexed.sort_by_key(|(i, _)| *i);
    indexed.into_iter().map(|(_, outcome)| outcome).collect()
  }

  /// Procesa un pedido y lo clasifica. Nunca falla: cualquier error queda
  /// dentro del resultado.
  pub fn process_record(&self, order: &SourceOrder) -> RecordOutcome {
    match self.try_process(order) {
      Ok(outcome) => outcome,
      Err(e) => RecordOutcome::Failure { order_id: order.id.trim().to_string(), error: e.to_string() },
    }
  }

  fn try_process(&self, order: &SourceOrder) -> std::result::Result<RecordOutcome, RecordError> {
    let order_id = order.id.trim();
    let vouchers = self.source
                       .fetch_vouchers(order_id)
                       .map_err(|e| RecordError::Vouchers(e.to_string()))?;
    let transformed = transform(order, &vouchers)?;
    let loaded = self.destination.load(&transformed);
    if !loaded.success {
      return Err(RecordError::Load(loaded.error.unwrap_or_else(|| "unknown error".into())));
    }
    let result = validate(self.destination.as_ref(), order, &transformed.order_id);
    Ok(if result.is_valid {
      RecordOutcome::Success { order_id: transformed.order_id }
    } else {
      RecordOutcome::ValidationFailure { order_id: transformed.order_id, result }
    })
  }

  fn log_outcome(&self, outcome: &RecordOutcome) {
    match outcome {
      RecordOutcome::Success { order_id } => {
        self.log.log(log::Level::Info, json!({"event": "order_migrated", "order_id": order_id}));
      }
      RecordOutcome::ValidationFailure { order_id, result } => {
        self.log.log(log::Level::Error,
                     json!({"event": "order_validation_failed", "order_id": order_id, "errors": result.errors}));
        for d in &result.discrepancies {
          self.log.log(log::Level::Error,
                       json!({"event": "discrepancy", "order_id": order_id, "type": d.kind, "field": d.field,
                              "source_value": d.source_value, "dest_value": d.dest_value, "error": d.error}));
        }
      }
      RecordOutcome::Failure { order_id, error } => {
        self.log.log(log::Level::Error, json!({"event": "order_failed", "order_id": order_id, "error": error}));
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::logging::MemoryLog;
  use order_domain::{DomainStubs, InMemoryDestination, InMemorySourceStore};

  fn engine(source: InMemorySourceStore,
            dest: Arc<InMemoryDestination>,
            workers: usize)
            -> (MigrationEngine<InMemorySourceStore, InMemoryDestination>, Arc<MemoryLog>) {
    let log = Arc::new(MemoryLog::new());
    (MigrationEngine::new(Arc::new(source), dest, log.clone(), EngineConfig { workers }), log)
  }

  #[test]
  fn zero_batch_size_is_a_configuration_error() {
    let (e, _) = engine(InMemorySourceStore::new(), Arc::new(InMemoryDestination::new()), 1);
    assert!(matches!(e.run(0, &StoreFilter::new("MTB")), Err(FlowError::Config(_))));
  }

  #[test]
  fn voucher_fetch_error_is_a_record_failure() {
    let source = DomainStubs::sample_source(2);
    source.fail_vouchers_for("O1");
    let (e, log) = engine(source, Arc::new(InMemoryDestination::new()), 1);
    let report = e.run(10, &StoreFilter::new("MTB")).unwrap();
    assert_eq!(report.stats.failure_count, 1);
    assert_eq!(report.stats.success_count, 1);
    assert!(report.failed_orders[0].error.starts_with("voucher fetch failed"));
    assert_eq!(log.events("order_failed").len(), 1);
  }

  #[test]
  fn page_fetch_error_aborts_the_run() {
    let source = DomainStubs::sample_source(3);
    source.fail_page_at(2);
    let (e, log) = engine(source, Arc::new(InMemoryDestination::new()), 1);
    assert!(matches!(e.run(2, &StoreFilter::new("MTB")), Err(FlowError::Source(_))));
    assert_eq!(log.events("page_fetch_failed").len(), 1);
  }
}
