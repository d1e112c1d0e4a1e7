// order.rs
use crate::value::{Record, SqlValue};
use serde::{Deserialize, Serialize};

/// Acceso por nombre a los campos de una fila de entrada. Las tablas
/// estáticas de columnas referencian los campos por este nombre.
pub trait FieldSource {
  fn field(&self, name: &str) -> Option<SqlValue>;
}

fn text(v: &Option<String>) -> Option<SqlValue> {
  v.as_ref().map(|s| SqlValue::Text(s.clone()))
}

/// Fila desnormalizada del origen: cabecera del pedido unida a una línea,
/// su envío, las direcciones agregadas y los pagos agregados. Todos los
/// campos llegan como texto tal como los devuelve la consulta de extracción.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceOrder {
  pub id: String,
  pub ordernumber: Option<String>,
  pub status: Option<String>,
  pub createddate: Option<String>,
  pub modifieddate: Option<String>,
  pub orderprice: Option<String>,
  pub currency: Option<String>,
  pub customername: Option<String>,
  pub customerid: Option<String>,
  pub storeid: Option<String>,
  pub productid: Option<String>,
  pub name: Option<String>,
  pub quantity: Option<String>,
  pub itemprice: Option<String>,
  pub itemcurrency: Option<String>,
  pub imageurl: Option<String>,
  pub paymentouterids: Option<String>,
  pub address: Option<String>,
  pub shipmentnumber: Option<String>,
  pub shipmentstatus: Option<String>,
}

impl SourceOrder {
  pub fn new(id: impl Into<String>) -> Self {
    Self { id: id.into(), ..Default::default() }
  }
}

impl FieldSource for SourceOrder {
  fn field(&self, name: &str) -> Option<SqlValue> {
    match name {
      "id" => Some(SqlValue::Text(self.id.clone())),
      "ordernumber" => text(&self.ordernumber),
      "status" => text(&self.status),
      "createddate" => text(&self.createddate),
      "modifieddate" => text(&self.modifieddate),
      "orderprice" => text(&self.orderprice),
      "currency" => text(&self.currency),
      "customername" => text(&self.customername),
      "customerid" => text(&self.customerid),
      "storeid" => text(&self.storeid),
      "productid" => text(&self.productid),
      "name" => text(&self.name),
      "quantity" => text(&self.quantity),
      "itemprice" => text(&self.itemprice),
      "itemcurrency" => text(&self.itemcurrency),
      "imageurl" => text(&self.imageurl),
      "paymentouterids" => text(&self.paymentouterids),
      "address" => text(&self.address),
      "shipmentnumber" => text(&self.shipmentnumber),
      "shipmentstatus" => text(&self.shipmentstatus),
      _ => None,
    }
  }
}

/// Vale regalo asociado a un pedido del origen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VoucherRecord {
  pub order_id: String,
  pub voucher_code: Option<String>,
  pub pin: Option<String>,
  pub amount: Option<String>,
  pub validity: Option<String>,
  pub product_id: Option<String>,
}

impl FieldSource for VoucherRecord {
  fn field(&self, name: &str) -> Option<SqlValue> {
    match name {
      "order_id" => Some(SqlValue::Text(self.order_id.clone())),
      "voucher_code" => text(&self.voucher_code),
      "pin" => text(&self.pin),
      "amount" => text(&self.amount),
      "validity" => text(&self.validity),
      "product_id" => text(&self.product_id),
      _ => None,
    }
  }
}

/// Línea de totales calculada por el transformador antes de mapearse a
/// `order_total`.
#[derive(Debug, Clone, PartialEq)]
pub struct TotalLine {
  pub code: &'static str,
  pub title: &'static str,
  pub value: Option<f64>,
  pub sort_order: i64,
  pub text: Option<String>,
}

impl FieldSource for TotalLine {
  fn field(&self, name: &str) -> Option<SqlValue> {
    match name {
      "code" => Some(SqlValue::text(self.code)),
      "title" => Some(SqlValue::text(self.title)),
      "value" => self.value.map(SqlValue::Decimal),
      "sort_order" => Some(SqlValue::Integer(self.sort_order)),
      "text" => text(&self.text),
      _ => None,
    }
  }
}

/// Filtro de extracción. El identificador de pedido se considera único
/// sólo dentro de una tienda.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreFilter {
  pub store_id: String,
}

impl StoreFilter {
  pub fn new(store_id: impl Into<String>) -> Self {
    Self { store_id: store_id.into() }
  }
}

/// Línea de producto con su fila de extensión opcional (`image_url`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductLine {
  pub record: Record,
  pub extension: Option<Record>,
}

/// Pedido con la forma del destino: cabecera, líneas, totales y vales. Todos
/// los registros comparten `order_id`, que es la clave de idempotencia.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformedOrder {
  pub order_id: String,
  pub header: Record,
  pub products: Vec<ProductLine>,
  pub totals: Vec<Record>,
  pub vouchers: Vec<Record>,
}
