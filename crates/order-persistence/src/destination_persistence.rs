use crate::connection::{checkout, map_db_err, DbBackend, DbConn, DbPool};
use crate::statements::{select_json_sql, upsert_sql, ACTIVE};
use diesel::prelude::*;
use diesel::query_builder::{BoxedSqlQuery, SqlQuery};
use diesel::result::Error as DieselError;
use diesel::sql_types::{BigInt, Double, Nullable, Text};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use once_cell::sync::Lazy;
use order_domain::{ColumnKind, DestinationSnapshot, DestinationStore, DomainError, LoadResult, Record, SqlValue,
                   TableSpec, TransformedOrder, ORDER_TABLE, PRODUCT_DATA_TABLE, PRODUCT_TABLE, TOTAL_TABLE,
                   VOUCHER_TABLE};
use serde_json::Value as JsonValue;
use std::sync::Arc;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("./migrations");

type BoxedQuery = BoxedSqlQuery<'static, DbBackend, SqlQuery>;

/// Sentencias de una tabla, generadas una sola vez.
struct TableStatements {
  upsert: String,
  select: String,
}

impl TableStatements {
  fn new<S: 'static>(table: &TableSpec<S>) -> Self {
    Self { upsert: upsert_sql(ACTIVE, table), select: select_json_sql(ACTIVE, table) }
  }
}

struct Statements {
  order: TableStatements,
  product: TableStatements,
  product_data: TableStatements,
  total: TableStatements,
  voucher: TableStatements,
}

static STATEMENTS: Lazy<Statements> = Lazy::new(|| Statements { order: TableStatements::new(&ORDER_TABLE),
                                                                 product: TableStatements::new(&PRODUCT_TABLE),
                                                                 product_data: TableStatements::new(&PRODUCT_DATA_TABLE),
                                                                 total: TableStatements::new(&TOTAL_TABLE),
                                                                 voucher: TableStatements::new(&VOUCHER_TABLE) });

#[derive(Debug, QueryableByName)]
struct JsonRow {
  #[diesel(sql_type = Text)]
  row_json: String,
}

fn bind_value(query: BoxedQuery, kind: ColumnKind, value: &SqlValue) -> BoxedQuery {
  match kind {
    ColumnKind::Text => query.bind::<Nullable<Text>, _>(value.to_text()),
    ColumnKind::Integer => query.bind::<Nullable<BigInt>, _>(value.to_i64()),
    ColumnKind::Decimal => query.bind::<Nullable<Double>, _>(value.to_f64()),
  }
}

fn upsert<S: 'static>(conn: &mut DbConn, sql: &str, table: &TableSpec<S>, record: &Record) -> Result<usize, DieselError> {
  let mut query: BoxedQuery = diesel::sql_query(sql.to_string()).into_boxed();
  for col in table.columns {
    let value = record.get(col.column).unwrap_or(&SqlValue::Null);
    query = bind_value(query, col.kind, value);
  }
  query.execute(conn)
}

fn decode_row<S: 'static>(table: &TableSpec<S>, raw: &str) -> Result<Record, DomainError> {
  let object: serde_json::Map<String, JsonValue> = serde_json::from_str(raw)?;
  Ok(table.columns
          .iter()
          .map(|c| {
            let value = object.get(c.column).unwrap_or(&JsonValue::Null);
            (c.column.to_string(), SqlValue::from_json(c.kind, value))
          })
          .collect())
}

fn read_rows<S: 'static>(conn: &mut DbConn, sql: &str, table: &TableSpec<S>, order_id: &str) -> Result<Vec<Record>, DomainError> {
  let rows = map_db_err(diesel::sql_query(sql).bind::<Text, _>(order_id).load::<JsonRow>(conn))?;
  rows.iter().map(|r| decode_row(table, &r.row_json)).collect()
}

/// Cargador del destino: cada pedido se escribe en una única transacción
/// (cabecera, líneas con su extensión, totales y vales) mediante upserts por
/// clave de conflicto.
pub struct DieselDestination {
  pool: Arc<DbPool>,
}

impl DieselDestination {
  pub fn new(pool: Arc<DbPool>) -> Self {
    Self { pool }
  }

  /// Aplica las migraciones embebidas del esquema destino.
  pub fn run_migrations(&self) -> Result<usize, DomainError> {
    let mut pooled = checkout(&self.pool)?;
    let conn: &mut DbConn = &mut pooled;
    let applied = conn.run_pending_migrations(MIGRATIONS)
                      .map_err(|e| DomainError::ExternalError(format!("migrations: {}", e)))?;
    Ok(applied.len())
  }

  fn write_order(conn: &mut DbConn, order: &TransformedOrder) -> Result<(), DieselError> {
    let st = &*STATEMENTS;
    conn.transaction::<_, DieselError, _>(|c| {
          upsert(c, &st.order.upsert, &ORDER_TABLE, &order.header)?;
          for line in &order.products {
            upsert(c, &st.product.upsert, &PRODUCT_TABLE, &line.record)?;
            if let Some(ext) = &line.extension {
              upsert(c, &st.product_data.upsert, &PRODUCT_DATA_TABLE, ext)?;
            }
          }
          for total in &order.totals {
            upsert(c, &st.total.upsert, &TOTAL_TABLE, total)?;
          }
          for voucher in &order.vouchers {
            upsert(c, &st.voucher.upsert, &VOUCHER_TABLE, voucher)?;
          }
          Ok(())
        })
  }
}

impl DestinationStore for DieselDestination {
  fn load(&self, order: &TransformedOrder) -> LoadResult {
    let mut pooled = match checkout(&self.pool) {
      Ok(c) => c,
      Err(e) => return LoadResult::failed(&order.order_id, e.to_string()),
    };
    match Self::write_order(&mut pooled, order) {
      Ok(()) => LoadResult::ok(&order.order_id),
      Err(e) => {
        log::error!("rollback de la carga del pedido {}: {}", order.order_id, e);
        LoadResult::failed(&order.order_id, format!("db: {}", e))
      }
    }
  }

  fn read_back(&self, order_id: &str) -> Result<Option<DestinationSnapshot>, DomainError> {
    let st = &*STATEMENTS;
    let mut pooled = checkout(&self.pool)?;
    let conn: &mut DbConn = &mut pooled;
    let header = match read_rows(conn, &st.order.select, &ORDER_TABLE, order_id)?.into_iter().next() {
      Some(h) => h,
      None => return Ok(None),
    };
    Ok(Some(DestinationSnapshot { header,
                                  products: read_rows(conn, &st.product.select, &PRODUCT_TABLE, order_id)?,
                                  product_data: read_rows(conn, &st.product_data.select, &PRODUCT_DATA_TABLE, order_id)?,
                                  totals: read_rows(conn, &st.total.select, &TOTAL_TABLE, order_id)?,
                                  vouchers: read_rows(conn, &st.voucher.select, &VOUCHER_TABLE, order_id)? }))
  }
}
