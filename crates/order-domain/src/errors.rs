// errors.rs
use thiserror::Error;

/// Errores de los almacenes y del modelo de pedidos.
#[derive(Debug, Error, Clone)]
pub enum DomainError {
  #[error("Error de validación: {0}")]
  ValidationError(String),
  #[error("Error externo: {0}")]
  ExternalError(String),
  #[error("Error de serialización: {0}")]
  SerializationError(String),
}

impl From<serde_json::Error> for DomainError {
  fn from(e: serde_json::Error) -> Self {
    Self::SerializationError(e.to_string())
  }
}

/// Errores del transformador. Un valor presente que no puede convertirse al
/// tipo de la columna destino se rechaza en lugar de coaccionarse en silencio.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TransformError {
  #[error("El pedido no tiene identificador")]
  MissingOrderId,
  #[error("Valor numérico inválido en {table}.{column}: '{value}'")]
  InvalidNumber {
    table: &'static str,
    column: &'static str,
    value: String,
  },
}
