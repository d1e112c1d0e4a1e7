// value.rs
//
// Modelo de valores escalares que viajan entre el origen, el transformador y
// el destino. Cada columna destino declara un `ColumnKind` para que los NULL y
// los parámetros se enlacen con el tipo SQL correcto.
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

/// Registro ordenado columna -> valor.
pub type Record = IndexMap<String, SqlValue>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnKind {
  Text,
  Integer,
  Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SqlValue {
  Null,
  Integer(i64),
  Decimal(f64),
  Text(String),
}

/// Valor por defecto declarado en las tablas estáticas de columnas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Literal {
  Null,
  Text(&'static str),
  Integer(i64),
  Decimal(f64),
}

impl Literal {
  pub fn to_value(self) -> SqlValue {
    match self {
      Literal::Null => SqlValue::Null,
      Literal::Text(s) => SqlValue::Text(s.to_string()),
      Literal::Integer(i) => SqlValue::Integer(i),
      Literal::Decimal(d) => SqlValue::Decimal(d),
    }
  }
}

impl SqlValue {
  pub fn text(s: impl Into<String>) -> Self {
    SqlValue::Text(s.into())
  }

  pub fn is_null(&self) -> bool {
    matches!(self, SqlValue::Null)
  }

  /// NULL o texto vacío/espacios.
  pub fn is_blank(&self) -> bool {
    match self {
      SqlValue::Null => true,
      SqlValue::Text(s) => s.trim().is_empty(),
      _ => false,
    }
  }

  fn is_numeric(&self) -> bool {
    matches!(self, SqlValue::Integer(_) | SqlValue::Decimal(_))
  }

  /// Forma textual usada en la comparación tolerante; `None` para NULL.
  pub fn render(&self) -> Option<String> {
    match self {
      SqlValue::Null => None,
      SqlValue::Integer(i) => Some(i.to_string()),
      SqlValue::Decimal(d) => Some(d.to_string()),
      SqlValue::Text(s) => Some(s.clone()),
    }
  }

  pub fn to_text(&self) -> Option<String> {
    self.render()
  }

  pub fn to_i64(&self) -> Option<i64> {
    match self {
      SqlValue::Null => None,
      SqlValue::Integer(i) => Some(*i),
      SqlValue::Decimal(d) => whole_to_i64(*d),
      SqlValue::Text(s) => parse_integer(s),
    }
  }

  pub fn to_f64(&self) -> Option<f64> {
    match self {
      SqlValue::Null => None,
      SqlValue::Integer(i) => Some(*i as f64),
      SqlValue::Decimal(d) => Some(*d),
      SqlValue::Text(s) => parse_decimal(s),
    }
  }

  /// Convierte el valor al tipo de la columna. Devuelve `None` si el valor
  /// no es representable (por ejemplo "abc" en una columna numérica).
  pub fn coerce(&self, kind: ColumnKind) -> Option<SqlValue> {
    if self.is_null() {
      return Some(SqlValue::Null);
    }
    match kind {
      ColumnKind::Text => self.to_text().map(SqlValue::Text),
      ColumnKind::Integer => self.to_i64().map(SqlValue::Integer),
      ColumnKind::Decimal => self.to_f64().map(SqlValue::Decimal),
    }
  }

  /// Decodifica un valor leído como JSON desde el destino.
  pub fn from_json(kind: ColumnKind, value: &JsonValue) -> SqlValue {
    let raw = match value {
      JsonValue::Null => return SqlValue::Null,
      JsonValue::Bool(b) => SqlValue::Integer(i64::from(*b)),
      JsonValue::Number(n) => match n.as_i64() {
        Some(i) => SqlValue::Integer(i),
        None => n.as_f64().map(SqlValue::Decimal).unwrap_or(SqlValue::Null),
      },
      JsonValue::String(s) => SqlValue::Text(s.clone()),
      other => SqlValue::Text(other.to_string()),
    };
    raw.coerce(kind).unwrap_or(raw)
  }
}

impl PartialEq for SqlValue {
  fn eq(&self, other: &Self) -> bool {
    match (self, other) {
      (SqlValue::Null, SqlValue::Null) => true,
      (SqlValue::Text(a), SqlValue::Text(b)) => a == b,
      (SqlValue::Integer(a), SqlValue::Integer(b)) => a == b,
      (a, b) if a.is_numeric() && b.is_numeric() => a.to_f64() == b.to_f64(),
      _ => false,
    }
  }
}

impl fmt::Display for SqlValue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.render() {
      Some(s) => write!(f, "{}", s),
      None => write!(f, "NULL"),
    }
  }
}

impl From<&str> for SqlValue {
  fn from(s: &str) -> Self {
    SqlValue::Text(s.to_string())
  }
}

impl From<String> for SqlValue {
  fn from(s: String) -> Self {
    SqlValue::Text(s)
  }
}

impl From<i64> for SqlValue {
  fn from(i: i64) -> Self {
    SqlValue::Integer(i)
  }
}

impl From<f64> for SqlValue {
  fn from(d: f64) -> Self {
    SqlValue::Decimal(d)
  }
}

pub fn parse_decimal(raw: &str) -> Option<f64> {
  raw.trim().parse::<f64>().ok().filter(|d| d.is_finite())
}

pub fn parse_integer(raw: &str) -> Option<i64> {
  let trimmed = raw.trim();
  trimmed.parse::<i64>().ok().or_else(|| parse_decimal(trimmed).and_then(whole_to_i64))
}

/// Entero exacto de un decimal sin parte fraccionaria y dentro del rango de
/// `i64`. `as` satura fuera de rango, así que se comprueba antes.
pub(crate) fn whole_to_i64(d: f64) -> Option<i64> {
  if d.fract() == 0.0 && d >= i64::MIN as f64 && d < i64::MAX as f64 {
    Some(d as i64)
  } else {
    None
  }
}
