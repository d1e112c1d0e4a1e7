use chrono::{TimeZone, Utc};
use order_domain::{Discrepancy, DiscrepancyKind, SqlValue};
use order_flow::{FailedOrder, FileReporter, MigrationReport, MigrationStats, ValidationFailureDetail};
use uuid::Uuid;

fn sample_report() -> MigrationReport {
  MigrationReport { stats: MigrationStats { total_processed: 4,
                                            success_count: 1,
                                            failure_count: 1,
                                            validation_failure_count: 2 },
                    failed_orders: vec![FailedOrder { order_id: "O2".into(), error: "load failed: db: boom".into() }],
                    validation_failures: vec![ValidationFailureDetail { order_id: "O3".into(),
                                                                        discrepancies: vec![
      Discrepancy::mismatch(DiscrepancyKind::Order, "currency_code", &SqlValue::text("USD"), &SqlValue::text("EUR")),
      Discrepancy::missing(DiscrepancyKind::Total, "total line not found"),
    ],
                                                                        errors: vec![] },
                                              ValidationFailureDetail { order_id: "O4".into(),
                                                                        discrepancies: vec![],
                                                                        errors: vec!["validation failed due to error: x".into()] }],
                    pages_fetched: 2 }
}

#[test]
fn writes_text_report_and_discrepancy_csv() {
  let dir = std::env::temp_dir().join(format!("order_reports_{}", Uuid::new_v4()));
  let reporter = FileReporter::new(&dir);
  let at = Utc.with_ymd_and_hms(2024, 6, 1, 12, 30, 5).unwrap();
  let artifacts = reporter.generate_at(&sample_report(), at).expect("report");

  assert_eq!(artifacts.report_path, dir.join("migration-report-2024-06-01T12-30-05.txt"));
  let text = std::fs::read_to_string(&artifacts.report_path).unwrap();
  assert!(text.contains("- Pedidos procesados: 4"));
  assert!(text.contains("- Pedido: O2"));
  assert!(text.contains("load failed: db: boom"));
  assert!(text.contains("order campo \"currency_code\": origen \"USD\", destino \"EUR\""));

  let csv_path = artifacts.csv_path.expect("csv");
  assert_eq!(csv_path, dir.join("validation-failures-2024-06-01T12-30-05.csv"));
  let csv = std::fs::read_to_string(&csv_path).unwrap();
  let lines: Vec<&str> = csv.lines().collect();
  assert_eq!(lines[0], "order_id,discrepancy_type,field,source_value,dest_value,error");
  assert_eq!(lines[1], "O3,order,currency_code,USD,EUR,");
  assert_eq!(lines[2], "O3,total,,,,total line not found");
  assert_eq!(lines[3], "O4,unknown,,,,validation failed due to error: x");
  assert_eq!(lines.len(), 4);
  let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn no_csv_without_validation_failures() {
  let dir = std::env::temp_dir().join(format!("order_reports_{}", Uuid::new_v4()));
  let report = MigrationReport { stats: MigrationStats { total_processed: 1, success_count: 1, ..Default::default() },
                                 ..Default::default() };
  let artifacts = FileReporter::new(&dir).generate(&report).expect("report");
  assert!(artifacts.report_path.exists());
  assert!(artifacts.csv_path.is_none());
  let _ = std::fs::remove_dir_all(dir);
}
