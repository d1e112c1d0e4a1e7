// Archivo: report.rs
// Propósito: informe de fin de ejecución. Escribe un resumen de texto y, si
// hubo fallos de validación, un CSV con una fila por discrepancia.
use crate::errors::{FlowError, Result};
use crate::stats::MigrationReport;
use chrono::{DateTime, Utc};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

pub const CSV_HEADERS: [&str; 6] = ["order_id", "discrepancy_type", "field", "source_value", "dest_value", "error"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportArtifacts {
  pub report_path: PathBuf,
  /// Sólo cuando hubo fallos de validación.
  pub csv_path: Option<PathBuf>,
}

pub struct FileReporter {
  dir: PathBuf,
}

impl FileReporter {
  pub fn new(dir: impl Into<PathBuf>) -> Self {
    Self { dir: dir.into() }
  }

  pub fn generate(&self, report: &MigrationReport) -> Result<ReportArtifacts> {
    self.generate_at(report, Utc::now())
  }

  /// Genera los ficheros usando `at` para el sello de tiempo del nombre.
  pub fn generate_at(&self, report: &MigrationReport, at: DateTime<Utc>) -> Result<ReportArtifacts> {
    let stamp = at.format("%Y-%m-%dT%H-%M-%S").to_string();
    fs::create_dir_all(&self.dir)?;

    let report_path = self.dir.join(format!("migration-report-{}.txt", stamp));
    let text = render_text(report, &stamp).map_err(|e| FlowError::Report(e.to_string()))?;
    fs::write(&report_path, text)?;

    let csv_path = if report.validation_failures.is_empty() {
      None
    } else {
      let path = self.dir.join(format!("validation-failures-{}.csv", stamp));
      write_csv(report, &path)?;
      Some(path)
    };
    Ok(ReportArtifacts { report_path, csv_path })
  }
}

fn render_text(report: &MigrationReport, stamp: &str) -> std::result::Result<String, std::fmt::Error> {
  let s = &report.stats;
  let mut out = String::new();
  writeln!(out, "=== INFORME DE MIGRACIÓN DE PEDIDOS ({}) ===", stamp)?;
  writeln!(out)?;
  writeln!(out, "RESUMEN:")?;
  writeln!(out, "- Pedidos procesados: {}", s.total_processed)?;
  writeln!(out, "- Migrados correctamente: {}", s.success_count)?;
  writeln!(out, "- Fallos de migración: {}", s.failure_count)?;
  writeln!(out, "- Fallos de validación: {}", s.validation_failure_count)?;
  writeln!(out, "- Páginas leídas: {}", report.pages_fetched)?;

  if !report.failed_orders.is_empty() {
    writeln!(out)?;
    writeln!(out, "PEDIDOS FALLIDOS:")?;
    for f in &report.failed_orders {
      writeln!(out, "- Pedido: {}", f.order_id)?;
      writeln!(out, "  Error: {}", f.error)?;
    }
  }

  if !report.validation_failures.is_empty() {
    writeln!(out)?;
    writeln!(out, "FALLOS DE VALIDACIÓN:")?;
    for v in &report.validation_failures {
      writeln!(out, "- Pedido: {}", v.order_id)?;
      if !v.discrepancies.is_empty() {
        writeln!(out, "  Discrepancias:")?;
      }
      for d in &v.discrepancies {
        match &d.error {
          Some(err) => writeln!(out, "    - {}: {}", d.kind, err)?,
          None => writeln!(out,
                           "    - {} campo \"{}\": origen \"{}\", destino \"{}\"",
                           d.kind,
                           d.field.as_deref().unwrap_or(""),
                           d.source_value.as_deref().unwrap_or(""),
                           d.dest_value.as_deref().unwrap_or(""))?,
        }
      }
      for e in &v.errors {
        writeln!(out, "  Error: {}", e)?;
      }
    }
  }
  Ok(out)
}

fn write_csv(report: &MigrationReport, path: &Path) -> Result<()> {
  let mut writer = csv::Writer::from_path(path)?;
  writer.write_record(CSV_HEADERS)?;
  for v in &report.validation_failures {
    if v.discrepancies.is_empty() {
      let error = if v.errors.is_empty() { "no specific discrepancies reported".to_string() } else { v.errors.join("; ") };
      writer.write_record([v.order_id.as_str(), "unknown", "", "", "", error.as_str()])?;
      continue;
    }
    for d in &v.discrepancies {
      let kind = d.kind.to_string();
      writer.write_record([v.order_id.as_str(),
                           kind.as_str(),
                           d.field.as_deref().unwrap_or(""),
                           d.source_value.as_deref().unwrap_or(""),
                           d.dest_value.as_deref().unwrap_or(""),
                           d.error.as_deref().unwrap_or("")])?;
    }
  }
  writer.flush()?;
  Ok(())
}
