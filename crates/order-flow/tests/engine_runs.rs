use order_domain::{DestinationSnapshot, DestinationStore, DomainError, DomainStubs, InMemoryDestination,
                   InMemorySourceStore, LoadResult, SourceOrder, SqlValue, StoreFilter, TransformedOrder};
use order_flow::{EngineConfig, MemoryLog, MigrationEngine, MigrationReport};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::thread::{self, ThreadId};

fn run_with(source: InMemorySourceStore, dest: Arc<dyn DestinationStore>, batch: usize, workers: usize)
            -> (MigrationReport, Arc<InMemorySourceStore>, Arc<MemoryLog>) {
  let source = Arc::new(source);
  let log = Arc::new(MemoryLog::new());
  let engine = MigrationEngine::new(source.clone(), dest, log.clone(), EngineConfig { workers });
  let report = engine.run(batch, &StoreFilter::new("MTB")).expect("run");
  (report, source, log)
}

fn dated(id: &str, price: &str, minute: u32) -> SourceOrder {
  let mut o = DomainStubs::order(id, price, "USD");
  o.createddate = Some(format!("2024-05-01T10:{:02}:00", minute));
  o
}

/// Destino que altera la moneda tras cada carga para provocar discrepancias.
struct DriftingDestination {
  inner: InMemoryDestination,
}

impl DestinationStore for DriftingDestination {
  fn load(&self, order: &TransformedOrder) -> LoadResult {
    let result = self.inner.load(order);
    self.inner.overwrite_value("order", &[order.order_id.as_str()], "currency_code", SqlValue::text("XXX"));
    result
  }

  fn read_back(&self, order_id: &str) -> Result<Option<DestinationSnapshot>, DomainError> {
    self.inner.read_back(order_id)
  }
}

/// Destino que anota el hilo de cada carga por pedido.
#[derive(Default)]
struct ThreadTrackingDestination {
  inner: InMemoryDestination,
  threads: Mutex<HashMap<String, Vec<ThreadId>>>,
}

impl DestinationStore for ThreadTrackingDestination {
  fn load(&self, order: &TransformedOrder) -> LoadResult {
    if let Ok(mut threads) = self.threads.lock() {
      threads.entry(order.order_id.clone()).or_default().push(thread::current().id());
    }
    self.inner.load(order)
  }

  fn read_back(&self, order_id: &str) -> Result<Option<DestinationSnapshot>, DomainError> {
    self.inner.read_back(order_id)
  }
}

/// Pedido de dos líneas: P-A a 10.00 y P-B a 5.00, total 15.00.
fn two_line_order(id: &str, minute: u32) -> Vec<SourceOrder> {
  ["P-A", "P-B"].iter()
                .zip(["10.00", "5.00"])
                .map(|(product, price)| {
                  let mut row = dated(id, "15.00", minute);
                  row.productid = Some(product.to_string());
                  row.itemprice = Some(price.to_string());
                  row
                })
                .collect()
}

#[test]
fn empty_source_processes_nothing() {
  let (report, source, _) = run_with(InMemorySourceStore::new(), Arc::new(InMemoryDestination::new()), 100, 1);
  assert_eq!(report.stats.total_processed, 0);
  assert_eq!(report.stats.success_count, 0);
  assert_eq!(report.pages_fetched, 1);
  assert_eq!(source.page_requests(), 1);
}

#[test]
fn pagination_stops_after_the_first_empty_page() {
  let (report, source, log) = run_with(DomainStubs::sample_source(5), Arc::new(InMemoryDestination::new()), 2, 1);
  assert_eq!(report.stats.total_processed, 5);
  assert_eq!(report.stats.success_count, 5);
  assert_eq!(source.page_requests(), 4);
  assert_eq!(report.pages_fetched, 4);
  assert_eq!(log.events("batch_complete").len(), 3);
  assert_eq!(log.events("migration_complete").len(), 1);
}

#[test]
fn malformed_record_does_not_stop_the_batch() {
  let source = InMemorySourceStore::with_orders(vec![dated("A", "1.00", 5),
                                                     dated("B", "2.00", 4),
                                                     dated("C", "not-a-price", 3),
                                                     dated("D", "4.00", 2),
                                                     dated("E", "5.00", 1)]);
  let dest = Arc::new(InMemoryDestination::new());
  let (report, _, _) = run_with(source, dest.clone(), 2, 1);
  let s = report.stats;
  assert_eq!(s.total_processed, 5);
  assert_eq!(s.failure_count, 1);
  assert_eq!(s.success_count, 4);
  assert_eq!(report.failed_orders[0].order_id, "C");
  assert!(report.failed_orders[0].error.contains("not-a-price"));
  assert!(dest.read_back("D").unwrap().is_some());
  assert!(dest.read_back("C").unwrap().is_none());
}

#[test]
fn load_failure_is_counted_as_failure() {
  let dest = Arc::new(InMemoryDestination::new());
  dest.fail_loads_for("O2");
  let (report, _, _) = run_with(DomainStubs::sample_source(3), dest, 10, 1);
  assert_eq!(report.stats.failure_count, 1);
  assert_eq!(report.stats.success_count, 2);
  assert_eq!(report.failed_orders[0].order_id, "O2");
  assert!(report.failed_orders[0].error.starts_with("load failed"));
}

#[test]
fn mismatched_destination_is_a_validation_failure() {
  let dest = Arc::new(DriftingDestination { inner: InMemoryDestination::new() });
  let (report, _, log) = run_with(DomainStubs::sample_source(2), dest, 10, 1);
  assert_eq!(report.stats.validation_failure_count, 2);
  assert_eq!(report.stats.success_count, 0);
  let detail = &report.validation_failures[0];
  assert_eq!(detail.discrepancies[0].field.as_deref(), Some("currency_code"));
  assert_eq!(log.events("discrepancy").len(), 2);
}

#[test]
fn read_back_error_is_a_validation_failure() {
  let dest = Arc::new(InMemoryDestination::new());
  dest.fail_reads_for("O1");
  let (report, _, _) = run_with(DomainStubs::sample_source(2), dest, 10, 1);
  assert_eq!(report.stats.validation_failure_count, 1);
  assert_eq!(report.stats.success_count, 1);
  assert!(report.validation_failures[0].errors[0].starts_with("validation failed due to error"));
}

#[test]
fn parallel_workers_produce_the_same_summary() {
  let sequential = run_with(DomainStubs::sample_source(7), Arc::new(InMemoryDestination::new()), 3, 1).0;
  let parallel = run_with(DomainStubs::sample_source(7), Arc::new(InMemoryDestination::new()), 3, 4).0;
  assert_eq!(sequential.stats, parallel.stats);
  assert_eq!(sequential.pages_fetched, parallel.pages_fetched);
  assert_eq!(parallel.stats.success_count, 7);
}

#[test]
fn multi_line_order_keeps_every_line_and_the_order_total() {
  for workers in [1, 4] {
    let dest = Arc::new(InMemoryDestination::new());
    let (report, _, _) = run_with(InMemorySourceStore::with_orders(two_line_order("O1", 1)), dest.clone(), 10, workers);
    assert_eq!(report.stats.total_processed, 2);
    assert_eq!(report.stats.success_count, 2, "workers={}: {:?}", workers, report.validation_failures);

    let snap = dest.read_back("O1").unwrap().expect("O1 migrated");
    let line_totals: Vec<SqlValue> = snap.products.iter().map(|p| p["total"].clone()).collect();
    assert_eq!(line_totals, vec![SqlValue::Decimal(10.0), SqlValue::Decimal(5.0)]);
    assert_eq!(snap.totals.len(), 1);
    assert_eq!(snap.totals[0]["code"], SqlValue::text("total"));
    assert_eq!(snap.totals[0]["value"], SqlValue::Decimal(15.0));
  }
}

#[test]
fn parallel_mode_keeps_rows_of_one_order_on_one_thread() {
  let mut rows = Vec::new();
  for (i, id) in ["A", "B", "C", "D"].iter().enumerate() {
    rows.extend(two_line_order(id, i as u32));
  }
  let dest = Arc::new(ThreadTrackingDestination::default());
  let (report, _, _) = run_with(InMemorySourceStore::with_orders(rows), dest.clone(), 8, 4);
  assert_eq!(report.stats.success_count, 8);

  let threads = dest.threads.lock().unwrap();
  assert_eq!(threads.len(), 4);
  for (order_id, seen) in threads.iter() {
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0], seen[1], "las filas de {} corrieron en hilos distintos", order_id);
  }
}

#[test]
fn padded_identifier_is_trimmed_for_vouchers_and_failures() {
  let source = InMemorySourceStore::with_orders(vec![dated(" O7 ", "25.00", 1)]);
  source.add_voucher(DomainStubs::voucher("O7", "GIFT-7", "25"));
  let dest = Arc::new(InMemoryDestination::new());
  let (report, _, _) = run_with(source, dest.clone(), 10, 1);
  assert_eq!(report.stats.success_count, 1);
  assert_eq!(dest.read_back("O7").unwrap().expect("O7 migrated").vouchers.len(), 1);

  let failing = InMemorySourceStore::with_orders(vec![dated(" O8 ", "25.00", 1)]);
  failing.fail_vouchers_for("O8");
  let (report, _, _) = run_with(failing, Arc::new(InMemoryDestination::new()), 10, 1);
  assert_eq!(report.stats.failure_count, 1);
  assert_eq!(report.failed_orders[0].order_id, "O8");
}
