// transformer.rs
//
// Transformación pura de una fila del origen (más sus vales) al pedido con la
// forma del destino. Sin E/S ni estado compartido: mismas entradas, misma
// salida.
use crate::columns::{decimal_field, Source, TableSpec, ORDER_TABLE, PRODUCT_DATA_TABLE, PRODUCT_TABLE,
                     TOTAL_TABLE, VOUCHER_TABLE};
use crate::errors::TransformError;
use crate::order::{FieldSource, ProductLine, SourceOrder, TotalLine, TransformedOrder, VoucherRecord};
use crate::value::{Record, SqlValue};

/// Construye un registro con todas las columnas de `table`. Un valor ausente
/// o en blanco toma el valor por defecto de la columna (NULL explícito si no
/// declara otro); un valor presente que no admite el tipo de la columna es un
/// error.
pub fn map_record<S: FieldSource + 'static>(table: &TableSpec<S>, input: &S, order_id: &str) -> Result<Record, TransformError> {
  let mut record = Record::with_capacity(table.columns.len());
  for col in table.columns {
    let raw = match &col.source {
      Source::Field(name) => input.field(name),
      Source::OrderId => Some(SqlValue::text(order_id)),
      Source::Derived(f) => f(input)?,
      Source::Absent => None,
    };
    let value = match raw.filter(|v| !v.is_blank()) {
      None => col.default.to_value(),
      Some(v) => v.coerce(col.kind).ok_or_else(|| TransformError::InvalidNumber { table: table.name,
                                                                                 column: col.column,
                                                                                 value: v.to_string() })?,
    };
    record.insert(col.column.to_string(), value);
  }
  Ok(record)
}

fn display_text(currency: Option<&str>, value: Option<f64>) -> Option<String> {
  value.map(|v| match currency {
         Some(c) => format!("{} {:.2}", c, v),
         None => format!("{:.2}", v),
       })
}

/// Líneas de totales del pedido. Sólo el total del pedido: cada fila del
/// origen es una línea de producto y todas comparten este valor, así que el
/// upsert es el mismo venga de la fila que venga. El importe de cada línea
/// queda en `order_product.total`.
fn total_lines(order: &SourceOrder) -> Result<Vec<TotalLine>, TransformError> {
  let currency = order.currency.as_deref().map(str::trim).filter(|c| !c.is_empty());
  let total = decimal_field("order_total", "value", &order.orderprice)?;
  Ok(vec![TotalLine { code: "total",
                      title: "Total",
                      value: total,
                      sort_order: 9,
                      text: display_text(currency, total) }])
}

/// Transforma un pedido del origen y sus vales.
///
/// - La cabecera siempre se genera.
/// - Se genera una línea de producto cuando la fila trae `productid`, con
///   fila de extensión si además trae `imageurl`.
/// - Cada vale produce un registro que comparte el identificador del pedido.
pub fn transform(order: &SourceOrder, vouchers: &[VoucherRecord]) -> Result<TransformedOrder, TransformError> {
  let order_id = order.id.trim();
  if order_id.is_empty() {
    return Err(TransformError::MissingOrderId);
  }
  let header = map_record(&ORDER_TABLE, order, order_id)?;

  let mut products = Vec::new();
  if order.field("productid").is_some_and(|v| !v.is_blank()) {
    let record = map_record(&PRODUCT_TABLE, order, order_id)?;
    let extension = match order.field("imageurl") {
      Some(url) if !url.is_blank() => Some(map_record(&PRODUCT_DATA_TABLE, order, order_id)?),
      _ => None,
    };
    products.push(ProductLine { record, extension });
  }

  let totals = total_lines(order)?.iter()
                                  .map(|t| map_record(&TOTAL_TABLE, t, order_id))
                                  .collect::<Result<Vec<_>, _>>()?;
  let vouchers = vouchers.iter()
                         .map(|v| map_record(&VOUCHER_TABLE, v, order_id))
                         .collect::<Result<Vec<_>, _>>()?;

  Ok(TransformedOrder { order_id: order_id.to_string(), header, products, totals, vouchers })
}
