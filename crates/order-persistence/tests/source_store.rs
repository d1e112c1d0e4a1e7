use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use order_domain::{SourceStore, StoreFilter};
use order_persistence::{connect, DieselSourceStore};
use std::sync::Arc;
use uuid::Uuid;

const SCHEMA: &str = include_str!("fixtures/source_schema.sql");
const DATA: &str = include_str!("fixtures/source_data.sql");

fn seeded_source() -> (DieselSourceStore, std::path::PathBuf) {
  let path = std::env::temp_dir().join(format!("order_source_{}.db", Uuid::new_v4()));
  let url = path.to_str().unwrap().to_string();
  let mut conn = SqliteConnection::establish(&url).expect("open sqlite");
  conn.batch_execute(SCHEMA).expect("schema");
  conn.batch_execute(DATA).expect("data");
  let pool = connect(&url, 2).expect("pool");
  (DieselSourceStore::new(Arc::new(pool)), path)
}

#[test]
fn pages_follow_creation_order_and_store_filter() {
  if cfg!(feature = "pg") {
    eprintln!("skipping sqlite-only source test because 'pg' feature is enabled");
    return;
  }
  let (store, path) = seeded_source();
  let filter = StoreFilter::new("MTB");

  let first = store.fetch_page(&filter, 1, 0).expect("page 0");
  let second = store.fetch_page(&filter, 1, 1).expect("page 1");
  let third = store.fetch_page(&filter, 1, 2).expect("page 2");
  assert_eq!(first.len(), 1);
  assert_eq!(first[0].id, "O1");
  assert_eq!(second[0].id, "O2");
  assert!(third.is_empty());

  let all = store.fetch_page(&filter, 10, 0).expect("all");
  assert_eq!(all.iter().map(|o| o.id.as_str()).collect::<Vec<_>>(), vec!["O1", "O2"]);
  assert!(store.fetch_page(&StoreFilter::new("NONE"), 10, 0).expect("empty").is_empty());
  let _ = std::fs::remove_file(path);
}

#[test]
fn joined_fields_are_extracted_as_text() {
  if cfg!(feature = "pg") {
    eprintln!("skipping sqlite-only source test because 'pg' feature is enabled");
    return;
  }
  let (store, path) = seeded_source();
  let o1 = store.fetch_page(&StoreFilter::new("MTB"), 1, 0).expect("page").remove(0);
  assert_eq!(o1.orderprice.as_deref(), Some("19.99"));
  assert_eq!(o1.currency.as_deref(), Some("USD"));
  assert_eq!(o1.productid.as_deref(), Some("P-1"));
  assert_eq!(o1.quantity.as_deref(), Some("1"));
  assert_eq!(o1.paymentouterids.as_deref(), Some("PAY-1;Paid"));
  assert_eq!(o1.shipmentnumber.as_deref(), Some("SH-1"));
  assert!(o1.address.as_deref().unwrap_or("").starts_with("Shipping : Calle Mayor 1"));
  assert_eq!(o1.imageurl.as_deref(), Some("https://cdn.example/p1.png"));
  let _ = std::fs::remove_file(path);
}

#[test]
fn vouchers_are_read_per_order() {
  if cfg!(feature = "pg") {
    eprintln!("skipping sqlite-only source test because 'pg' feature is enabled");
    return;
  }
  let (store, path) = seeded_source();
  let vouchers = store.fetch_vouchers("O2").expect("vouchers");
  assert_eq!(vouchers.len(), 1);
  assert_eq!(vouchers[0].voucher_code.as_deref(), Some("GIFT-50"));
  assert_eq!(vouchers[0].pin.as_deref(), Some("1234"));
  assert!(store.fetch_vouchers("O1").expect("none").is_empty());
  let _ = std::fs::remove_file(path);
}
