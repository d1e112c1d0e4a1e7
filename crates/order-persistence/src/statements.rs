//! Generación de SQL a partir de las tablas estáticas de columnas. Los valores
//! nunca se interpolan: todo dato viaja como parámetro enlazado.
use order_domain::TableSpec;

/// Diferencias de sintaxis entre los dos backends soportados.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
  Postgres,
  Sqlite,
}

#[cfg(all(feature = "pg", not(test)))]
pub const ACTIVE: Dialect = Dialect::Postgres;
#[cfg(any(test, not(feature = "pg")))]
pub const ACTIVE: Dialect = Dialect::Sqlite;

impl Dialect {
  /// Marcador del parámetro `n` (base 1).
  pub fn placeholder(self, n: usize) -> String {
    match self {
      Dialect::Postgres => format!("${}", n),
      Dialect::Sqlite => format!("?{}", n),
    }
  }

  /// Concatenación de valores distintos separados por coma.
  pub fn string_agg(self, expr: &str) -> String {
    match self {
      Dialect::Postgres => format!("string_agg(DISTINCT {}, ',')", expr),
      Dialect::Sqlite => format!("group_concat(DISTINCT {})", expr),
    }
  }

  fn json_object(self) -> &'static str {
    match self {
      Dialect::Postgres => "json_build_object",
      Dialect::Sqlite => "json_object",
    }
  }
}

pub fn quote_ident(name: &str) -> String {
  format!("\"{}\"", name.replace('"', "\"\""))
}

fn ident_list<'a>(names: impl Iterator<Item = &'a str>) -> String {
  names.map(quote_ident).collect::<Vec<_>>().join(", ")
}

/// `INSERT ... ON CONFLICT (claves) DO UPDATE` que sobrescribe todas las
/// columnas que no son clave. Los parámetros siguen el orden de la tabla.
pub fn upsert_sql<S: 'static>(dialect: Dialect, table: &TableSpec<S>) -> String {
  let columns = ident_list(table.column_names());
  let params = (1..=table.columns.len()).map(|n| dialect.placeholder(n)).collect::<Vec<_>>().join(", ");
  let keys = ident_list(table.conflict_keys.iter().copied());
  let updates = table.column_names()
                     .filter(|c| !table.conflict_keys.contains(c))
                     .map(|c| format!("{0} = excluded.{0}", quote_ident(c)))
                     .collect::<Vec<_>>();
  let action = if updates.is_empty() { "NOTHING".to_string() } else { format!("UPDATE SET {}", updates.join(", ")) };
  format!("INSERT INTO {} ({}) VALUES ({}) ON CONFLICT ({}) DO {}",
          quote_ident(table.name),
          columns,
          params,
          keys,
          action)
}

/// Lectura de las filas de un pedido como objetos JSON (una columna de texto
/// `row_json` por fila), ordenadas por la clave de conflicto.
pub fn select_json_sql<S: 'static>(dialect: Dialect, table: &TableSpec<S>) -> String {
  let pairs = table.column_names()
                   .map(|c| format!("'{}', {}", c, quote_ident(c)))
                   .collect::<Vec<_>>()
                   .join(", ");
  format!("SELECT CAST({}({}) AS TEXT) AS row_json FROM {} WHERE {} = {} ORDER BY {}",
          dialect.json_object(),
          pairs,
          quote_ident(table.name),
          quote_ident("order_id"),
          dialect.placeholder(1),
          ident_list(table.conflict_keys.iter().copied()))
}

/// Página del origen: una fila por línea de pedido con envío, direcciones y
/// pagos agregados. Parámetros: tienda, límite, desplazamiento.
pub fn source_page_sql(dialect: Dialect) -> String {
  let payments = dialect.string_agg("opi.outerid || ';' || COALESCE(opi.status, '')");
  let address = dialect.string_agg(
    "COALESCE(oa.addresstype, '') || ' : ' || COALESCE(oa.line1, '') || ' ' || COALESCE(oa.line2, '') || ' ' || \
     COALESCE(oa.city, '') || ' ' || COALESCE(oa.regionid, '') || ' ' || COALESCE(oa.regionname, '') || ' ' || \
     COALESCE(oa.postalcode, '') || ' ' || COALESCE(oa.countrycode, '') || ' ' || COALESCE(oa.countryname, '')",
  );
  format!("SELECT CAST(co.id AS TEXT) AS id, CAST(co.number AS TEXT) AS ordernumber, CAST(co.status AS TEXT) AS status, \
           CAST(co.createddate AS TEXT) AS createddate, CAST(co.modifieddate AS TEXT) AS modifieddate, \
           CAST(co.sum AS TEXT) AS orderprice, CAST(co.currency AS TEXT) AS currency, \
           CAST(co.customername AS TEXT) AS customername, CAST(co.customerid AS TEXT) AS customerid, \
           CAST(co.storeid AS TEXT) AS storeid, CAST(oli.productid AS TEXT) AS productid, \
           CAST(oli.name AS TEXT) AS name, CAST(oli.quantity AS TEXT) AS quantity, \
           CAST(oli.price AS TEXT) AS itemprice, CAST(oli.currency AS TEXT) AS itemcurrency, \
           CAST(oli.imageurl AS TEXT) AS imageurl, {payments} AS paymentouterids, {address} AS address, \
           CAST(os.number AS TEXT) AS shipmentnumber, CAST(os.status AS TEXT) AS shipmentstatus \
           FROM customerorder co \
           JOIN orderlineitem oli ON co.id = oli.customerorderid \
           LEFT OUTER JOIN ordershipmentitem osi ON osi.lineitemid = oli.id \
           LEFT OUTER JOIN ordershipment os ON osi.shipmentid = os.id \
           LEFT OUTER JOIN orderaddress oa ON oa.shipmentid = os.id \
           LEFT OUTER JOIN orderpaymentin opi ON co.id = opi.customerorderid \
           WHERE co.storeid = {p1} \
           GROUP BY co.id, co.number, co.status, co.createddate, co.modifieddate, co.sum, co.currency, \
           co.customername, co.customerid, co.storeid, oli.id, oli.productid, oli.name, oli.quantity, oli.price, \
           oli.currency, oli.imageurl, os.number, os.status \
           ORDER BY co.createddate DESC, co.id DESC, oli.productid \
           LIMIT {p2} OFFSET {p3}",
          payments = payments,
          address = address,
          p1 = dialect.placeholder(1),
          p2 = dialect.placeholder(2),
          p3 = dialect.placeholder(3))
}

/// Vales de un pedido. Parámetro: id del pedido.
pub fn voucher_sql(dialect: Dialect) -> String {
  format!("SELECT CAST(orderid AS TEXT) AS order_id, CAST(code AS TEXT) AS voucher_code, CAST(pin AS TEXT) AS pin, \
           CAST(amount AS TEXT) AS amount, CAST(validitydate AS TEXT) AS validity, \
           CAST(productid AS TEXT) AS product_id \
           FROM ordervoucherdetails WHERE CAST(orderid AS TEXT) = {} ORDER BY code",
          dialect.placeholder(1))
}
