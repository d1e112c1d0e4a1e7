// Archivo: stats.rs
// Propósito: contadores y detalle acumulado de una ejecución.
use order_domain::{Discrepancy, ValidationResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationStats {
  pub total_processed: usize,
  pub success_count: usize,
  pub failure_count: usize,
  pub validation_failure_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedOrder {
  pub order_id: String,
  pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationFailureDetail {
  pub order_id: String,
  pub discrepancies: Vec<Discrepancy>,
  pub errors: Vec<String>,
}

/// Clasificación de un pedido procesado: exactamente una de las tres.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordOutcome {
  Success { order_id: String },
  ValidationFailure { order_id: String, result: ValidationResult },
  Failure { order_id: String, error: String },
}

/// Resumen de la ejecución que recibe el generador de informes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MigrationReport {
  pub stats: MigrationStats,
  pub failed_orders: Vec<FailedOrder>,
  pub validation_failures: Vec<ValidationFailureDetail>,
  pub pages_fetched: usize,
}

impl MigrationReport {
  /// Acumula un resultado; `total_processed` crece una vez por pedido.
  pub fn record(&mut self, outcome: RecordOutcome) {
    self.stats.total_processed += 1;
    match outcome {
      RecordOutcome::Success { .. } => self.stats.success_count += 1,
      RecordOutcome::ValidationFailure { order_id, result } => {
        self.stats.validation_failure_count += 1;
        self.validation_failures.push(ValidationFailureDetail { order_id,
                                                                discrepancies: result.discrepancies,
                                                                errors: result.errors });
      }
      RecordOutcome::Failure { order_id, error } => {
        self.stats.failure_count += 1;
        self.failed_orders.push(FailedOrder { order_id, error });
      }
    }
  }
}
