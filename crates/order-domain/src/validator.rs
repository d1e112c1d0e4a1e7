// validator.rs
//
// Verificación posterior a la carga: relee el pedido del destino y compara un
// subconjunto fijo de campos contra la fila del origen.
use crate::domain_repository::{DestinationSnapshot, DestinationStore};
use crate::order::{FieldSource, SourceOrder};
use crate::value::{whole_to_i64, Record, SqlValue};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscrepancyKind {
  Order,
  Product,
  Total,
}

impl fmt::Display for DiscrepancyKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      DiscrepancyKind::Order => "order",
      DiscrepancyKind::Product => "product",
      DiscrepancyKind::Total => "total",
    };
    f.write_str(s)
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discrepancy {
  #[serde(rename = "type")]
  pub kind: DiscrepancyKind,
  pub field: Option<String>,
  pub source_value: Option<String>,
  pub dest_value: Option<String>,
  pub error: Option<String>,
}

impl Discrepancy {
  pub fn mismatch(kind: DiscrepancyKind, field: &str, source: &SqlValue, dest: &SqlValue) -> Self {
    Self { kind,
           field: Some(field.to_string()),
           source_value: source.render(),
           dest_value: dest.render(),
           error: None }
  }

  pub fn missing(kind: DiscrepancyKind, error: impl Into<String>) -> Self {
    Self { kind, field: None, source_value: None, dest_value: None, error: Some(error.into()) }
  }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ValidationResult {
  pub is_valid: bool,
  pub discrepancies: Vec<Discrepancy>,
  pub errors: Vec<String>,
}

impl ValidationResult {
  fn from_discrepancies(discrepancies: Vec<Discrepancy>) -> Self {
    Self { is_valid: discrepancies.is_empty(), discrepancies, errors: Vec::new() }
  }

  fn failed(error: String) -> Self {
    Self { is_valid: false, discrepancies: Vec::new(), errors: vec![error] }
  }
}

/// Conversión aplicada a un lado de la comparación.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Coercion {
  None,
  Float,
  Int,
}

impl Coercion {
  /// Un valor no numérico bajo `Float`/`Int` se compara como NULL.
  fn apply(self, v: SqlValue) -> SqlValue {
    match self {
      Coercion::None => v,
      Coercion::Float => v.to_f64().map(SqlValue::Decimal).unwrap_or(SqlValue::Null),
      Coercion::Int => v.to_i64()
                        .or_else(|| v.to_f64().and_then(|d| whole_to_i64(d.trunc())))
                        .map(SqlValue::Integer)
                        .unwrap_or(SqlValue::Null),
    }
  }
}

struct FieldCheck {
  source: &'static str,
  dest: &'static str,
  source_coercion: Coercion,
  dest_coercion: Coercion,
}

const HEADER_CHECKS: &[FieldCheck] =
  &[FieldCheck { source: "customerid", dest: "customer_id", source_coercion: Coercion::None, dest_coercion: Coercion::None },
    FieldCheck { source: "storeid", dest: "store_id", source_coercion: Coercion::None, dest_coercion: Coercion::None },
    FieldCheck { source: "orderprice", dest: "total", source_coercion: Coercion::Float, dest_coercion: Coercion::None },
    FieldCheck { source: "currency", dest: "currency_code", source_coercion: Coercion::None, dest_coercion: Coercion::None }];

const PRODUCT_CHECKS: &[FieldCheck] =
  &[FieldCheck { source: "name", dest: "name", source_coercion: Coercion::None, dest_coercion: Coercion::None },
    FieldCheck { source: "quantity", dest: "quantity", source_coercion: Coercion::Int, dest_coercion: Coercion::Int },
    FieldCheck { source: "itemprice", dest: "price", source_coercion: Coercion::Float, dest_coercion: Coercion::Float }];

/// Iguales si coinciden los valores tipados o, en su defecto, su forma
/// textual ("20" frente a 20.0 no es discrepancia).
pub fn loosely_equal(a: &SqlValue, b: &SqlValue) -> bool {
  a == b || a.render() == b.render()
}

fn check_fields(kind: DiscrepancyKind,
                checks: &[FieldCheck],
                source: &SourceOrder,
                dest: &Record,
                out: &mut Vec<Discrepancy>) {
  for c in checks {
    let s = c.source_coercion.apply(source.field(c.source).unwrap_or(SqlValue::Null));
    let d = c.dest_coercion.apply(dest.get(c.dest).cloned().unwrap_or(SqlValue::Null));
    if !loosely_equal(&s, &d) {
      out.push(Discrepancy::mismatch(kind, c.dest, &s, &d));
    }
  }
}

/// Compara una fila del origen con lo leído del destino.
pub fn compare(source: &SourceOrder, snapshot: &DestinationSnapshot) -> ValidationResult {
  let mut discrepancies = Vec::new();
  check_fields(DiscrepancyKind::Order, HEADER_CHECKS, source, &snapshot.header, &mut discrepancies);

  if let Some(product_id) = source.productid.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
    let line = snapshot.products
                       .iter()
                       .find(|p| p.get("product_id").and_then(SqlValue::render).as_deref() == Some(product_id));
    match line {
      Some(line) => check_fields(DiscrepancyKind::Product, PRODUCT_CHECKS, source, line, &mut discrepancies),
      None => discrepancies.push(Discrepancy::missing(DiscrepancyKind::Product,
                                                      format!("product {} not found", product_id))),
    }
  }

  let total = snapshot.totals
                      .iter()
                      .find(|t| t.get("code").and_then(SqlValue::render).as_deref() == Some("total"));
  match total {
    Some(row) => {
      let s = Coercion::Float.apply(source.field("orderprice").unwrap_or(SqlValue::Null));
      let d = Coercion::Float.apply(row.get("value").cloned().unwrap_or(SqlValue::Null));
      if !loosely_equal(&s, &d) {
        discrepancies.push(Discrepancy::mismatch(DiscrepancyKind::Total, "total", &s, &d));
      }
    }
    None => discrepancies.push(Discrepancy::missing(DiscrepancyKind::Total, "total line not found")),
  }

  ValidationResult::from_discrepancies(discrepancies)
}

/// Relee el pedido `order_id` y lo compara con `source`. Un error de lectura
/// se devuelve como resultado inválido con una entrada en `errors`.
pub fn validate<D: DestinationStore + ?Sized>(store: &D, source: &SourceOrder, order_id: &str) -> ValidationResult {
  match store.read_back(order_id) {
    Ok(Some(snapshot)) => compare(source, &snapshot),
    Ok(None) => ValidationResult::from_discrepancies(vec![Discrepancy::missing(DiscrepancyKind::Order, "not found")]),
    Err(e) => ValidationResult::failed(format!("validation failed due to error: {}", e)),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain_repository::InMemoryDestination;
  use crate::domain_stubs::DomainStubs;
  use crate::transformer::transform;

  fn loaded(order: &SourceOrder) -> InMemoryDestination {
    let dest = InMemoryDestination::new();
    let t = transform(order, &[]).expect("transform");
    assert!(dest.load(&t).success);
    dest
  }

  #[test]
  fn freshly_loaded_order_is_valid() {
    let order = DomainStubs::order("O1", "19.99", "USD");
    let dest = loaded(&order);
    let result = validate(&dest, &order, "O1");
    assert!(result.is_valid, "{:?}", result);
    assert!(result.discrepancies.is_empty());
  }

  #[test]
  fn changed_header_field_is_reported() {
    let order = DomainStubs::order("O1", "19.99", "USD");
    let dest = loaded(&order);
    assert!(dest.overwrite_value("order", &["O1"], "currency_code", SqlValue::text("EUR")));
    let result = validate(&dest, &order, "O1");
    assert!(!result.is_valid);
    assert_eq!(result.discrepancies.len(), 1);
    let d = &result.discrepancies[0];
    assert_eq!(d.kind, DiscrepancyKind::Order);
    assert_eq!(d.field.as_deref(), Some("currency_code"));
    assert_eq!(d.source_value.as_deref(), Some("USD"));
    assert_eq!(d.dest_value.as_deref(), Some("EUR"));
  }

  #[test]
  fn missing_header_yields_single_not_found() {
    let order = DomainStubs::order("O9", "1", "USD");
    let result = validate(&InMemoryDestination::new(), &order, "O9");
    assert!(!result.is_valid);
    assert_eq!(result.discrepancies, vec![Discrepancy::missing(DiscrepancyKind::Order, "not found")]);
  }

  #[test]
  fn missing_total_and_product_lines_are_reported() {
    let order = DomainStubs::order("O1", "5", "USD");
    let dest = loaded(&order);
    assert!(dest.remove_row("order_total", &["O1", "total"]));
    assert!(dest.remove_row("order_product", &["O1", "P-O1"]));
    let result = validate(&dest, &order, "O1");
    let kinds: Vec<DiscrepancyKind> = result.discrepancies.iter().map(|d| d.kind).collect();
    assert_eq!(kinds, vec![DiscrepancyKind::Product, DiscrepancyKind::Total]);
    assert!(result.discrepancies.iter().all(|d| d.error.is_some()));
  }

  #[test]
  fn numeric_text_matches_typed_number() {
    let order = DomainStubs::order("O1", "20", "USD");
    let dest = loaded(&order);
    assert!(dest.overwrite_value("order", &["O1"], "total", SqlValue::Decimal(20.0)));
    assert!(dest.overwrite_value("order_product", &["O1", "P-O1"], "quantity", SqlValue::text("1")));
    assert!(validate(&dest, &order, "O1").is_valid);
    assert!(loosely_equal(&SqlValue::text("20"), &SqlValue::Integer(20)));
    assert!(!loosely_equal(&SqlValue::text("20.5"), &SqlValue::Integer(20)));
  }

  #[test]
  fn read_back_error_is_an_invalid_result_with_errors() {
    let order = DomainStubs::order("O1", "19.99", "USD");
    let dest = loaded(&order);
    dest.fail_reads_for("O1");
    let result = validate(&dest, &order, "O1");
    assert!(!result.is_valid);
    assert!(result.discrepancies.is_empty());
    assert!(result.errors[0].starts_with("validation failed due to error:"));
  }

  #[test]
  fn order_without_product_skips_product_checks() {
    let mut order = DomainStubs::order("O1", "3", "USD");
    order.productid = None;
    let dest = loaded(&order);
    assert!(validate(&dest, &order, "O1").is_valid);
  }
}
