use crate::connection::{checkout, map_db_err, DbConn, DbPool};
use crate::statements::{source_page_sql, voucher_sql, ACTIVE};
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Nullable, Text};
use once_cell::sync::Lazy;
use order_domain::{DomainError, SourceOrder, SourceStore, StoreFilter, VoucherRecord};
use std::sync::Arc;

static PAGE_SQL: Lazy<String> = Lazy::new(|| source_page_sql(ACTIVE));
static VOUCHER_SQL: Lazy<String> = Lazy::new(|| voucher_sql(ACTIVE));

#[derive(Debug, QueryableByName)]
struct SourceRow {
  #[diesel(sql_type = Text)]
  id: String,
  #[diesel(sql_type = Nullable<Text>)]
  ordernumber: Option<String>,
  #[diesel(sql_type = Nullable<Text>)]
  status: Option<String>,
  #[diesel(sql_type = Nullable<Text>)]
  createddate: Option<String>,
  #[diesel(sql_type = Nullable<Text>)]
  modifieddate: Option<String>,
  #[diesel(sql_type = Nullable<Text>)]
  orderprice: Option<String>,
  #[diesel(sql_type = Nullable<Text>)]
  currency: Option<String>,
  #[diesel(sql_type = Nullable<Text>)]
  customername: Option<String>,
  #[diesel(sql_type = Nullable<Text>)]
  customerid: Option<String>,
  #[diesel(sql_type = Nullable<Text>)]
  storeid: Option<String>,
  #[diesel(sql_type = Nullable<Text>)]
  productid: Option<String>,
  #[diesel(sql_type = Nullable<Text>)]
  name: Option<String>,
  #[diesel(sql_type = Nullable<Text>)]
  quantity: Option<String>,
  #[diesel(sql_type = Nullable<Text>)]
  itemprice: Option<String>,
  #[diesel(sql_type = Nullable<Text>)]
  itemcurrency: Option<String>,
  #[diesel(sql_type = Nullable<Text>)]
  imageurl: Option<String>,
  #[diesel(sql_type = Nullable<Text>)]
  paymentouterids: Option<String>,
  #[diesel(sql_type = Nullable<Text>)]
  address: Option<String>,
  #[diesel(sql_type = Nullable<Text>)]
  shipmentnumber: Option<String>,
  #[diesel(sql_type = Nullable<Text>)]
  shipmentstatus: Option<String>,
}

impl From<SourceRow> for SourceOrder {
  fn from(r: SourceRow) -> Self {
    SourceOrder { id: r.id,
                  ordernumber: r.ordernumber,
                  status: r.status,
                  createddate: r.createddate,
                  modifieddate: r.modifieddate,
                  orderprice: r.orderprice,
                  currency: r.currency,
                  customername: r.customername,
                  customerid: r.customerid,
                  storeid: r.storeid,
                  productid: r.productid,
                  name: r.name,
                  quantity: r.quantity,
                  itemprice: r.itemprice,
                  itemcurrency: r.itemcurrency,
                  imageurl: r.imageurl,
                  paymentouterids: r.paymentouterids,
                  address: r.address,
                  shipmentnumber: r.shipmentnumber,
                  shipmentstatus: r.shipmentstatus }
  }
}

#[derive(Debug, QueryableByName)]
struct VoucherRow {
  #[diesel(sql_type = Text)]
  order_id: String,
  #[diesel(sql_type = Nullable<Text>)]
  voucher_code: Option<String>,
  #[diesel(sql_type = Nullable<Text>)]
  pin: Option<String>,
  #[diesel(sql_type = Nullable<Text>)]
  amount: Option<String>,
  #[diesel(sql_type = Nullable<Text>)]
  validity: Option<String>,
  #[diesel(sql_type = Nullable<Text>)]
  product_id: Option<String>,
}

impl From<VoucherRow> for VoucherRecord {
  fn from(r: VoucherRow) -> Self {
    VoucherRecord { order_id: r.order_id,
                    voucher_code: r.voucher_code,
                    pin: r.pin,
                    amount: r.amount,
                    validity: r.validity,
                    product_id: r.product_id }
  }
}

/// Origen sobre el esquema heredado de pedidos (`customerorder` y tablas
/// relacionadas). Sólo lectura.
pub struct DieselSourceStore {
  pool: Arc<DbPool>,
}

impl DieselSourceStore {
  pub fn new(pool: Arc<DbPool>) -> Self {
    Self { pool }
  }
}

impl SourceStore for DieselSourceStore {
  fn fetch_page(&self, filter: &StoreFilter, limit: i64, offset: i64) -> Result<Vec<SourceOrder>, DomainError> {
    let mut pooled = checkout(&self.pool)?;
    let conn: &mut DbConn = &mut pooled;
    let rows = map_db_err(diesel::sql_query(PAGE_SQL.as_str()).bind::<Text, _>(&filter.store_id)
                                                              .bind::<BigInt, _>(limit)
                                                              .bind::<BigInt, _>(offset)
                                                              .load::<SourceRow>(conn))?;
    Ok(rows.into_iter().map(SourceOrder::from).collect())
  }

  fn fetch_vouchers(&self, order_id: &str) -> Result<Vec<VoucherRecord>, DomainError> {
    let mut pooled = checkout(&self.pool)?;
    let conn: &mut DbConn = &mut pooled;
    let rows = map_db_err(diesel::sql_query(VOUCHER_SQL.as_str()).bind::<Text, _>(order_id)
                                                                 .load::<VoucherRow>(conn))?;
    Ok(rows.into_iter().map(VoucherRecord::from).collect())
  }
}
