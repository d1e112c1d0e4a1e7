// Archivo: errors.rs
// Propósito: errores del motor de migración. Los fallos de un pedido se
// recogen en `RecordError` y nunca abortan la ejecución; `FlowError` es
// siempre fatal.
use order_domain::{DomainError, TransformError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlowError {
  /// Configuración inválida (variables de entorno, tamaño de lote...).
  #[error("Error de configuración: {0}")]
  Config(String),
  /// No se pudo conectar (o migrar) un almacén.
  #[error("Error de conexión: {0}")]
  Connection(String),
  /// Fallo al leer una página del origen.
  #[error("Error del origen: {0}")]
  Source(#[from] DomainError),
  #[error("Error del informe: {0}")]
  Report(String),
  #[error("Error de E/S: {0}")]
  Io(#[from] std::io::Error),
  #[error("Error CSV: {0}")]
  Csv(#[from] csv::Error),
  /// No se pudo crear el pool de workers.
  #[error("Error de workers: {0}")]
  Worker(String),
}

/// Error de un pedido concreto, capturado en el límite del registro.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecordError {
  #[error("voucher fetch failed: {0}")]
  Vouchers(String),
  #[error("transform failed: {0}")]
  Transform(#[from] TransformError),
  #[error("load failed: {0}")]
  Load(String),
}

pub type Result<T> = std::result::Result<T, FlowError>;
