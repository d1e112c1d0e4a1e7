use order_domain::{transform, validate, DestinationStore, DiscrepancyKind, DomainStubs, InMemoryDestination, SqlValue,
                   TransformError, ORDER_TABLE, VOUCHER_TABLE};

#[test]
fn scenario_single_order_round_trips_through_in_memory_destination() {
  let order = DomainStubs::order("O1", "19.99", "USD");
  let t = transform(&order, &[]).expect("transform O1");
  // Header carries every destination column, in table order.
  assert_eq!(t.header.len(), ORDER_TABLE.columns.len());
  assert_eq!(t.header["total"], SqlValue::Decimal(19.99));
  assert_eq!(t.header["currency_code"], SqlValue::text("USD"));

  let dest = InMemoryDestination::new();
  let loaded = dest.load(&t);
  assert!(loaded.success, "load failed: {:?}", loaded.error);
  let result = validate(&dest, &order, "O1");
  assert!(result.is_valid, "unexpected discrepancies: {:?}", result.discrepancies);
}

#[test]
fn second_load_with_new_total_overwrites_the_first() {
  let dest = InMemoryDestination::new();
  let first = DomainStubs::order("O2", "10.00", "USD");
  let second = DomainStubs::order("O2", "12.50", "USD");
  assert!(dest.load(&transform(&first, &[]).unwrap()).success);
  assert!(dest.load(&transform(&second, &[]).unwrap()).success);
  let snap = dest.read_back("O2").unwrap().expect("header");
  assert_eq!(snap.header["total"], SqlValue::Decimal(12.5));
  assert_eq!(dest.row_count("order"), 1);
  assert!(validate(&dest, &second, "O2").is_valid);
  let stale = validate(&dest, &first, "O2");
  assert!(!stale.is_valid);
  assert!(stale.discrepancies.iter().any(|d| d.kind == DiscrepancyKind::Total));
}

#[test]
fn voucher_code_comes_from_the_voucher_itself() {
  let mut order = DomainStubs::order("O3", "30", "USD");
  // Un campo del pedido con el mismo nombre no debe pisar el código del vale.
  order.ordernumber = Some("code-from-order".into());
  let vouchers = vec![DomainStubs::voucher("O3", "GIFT-123", "30")];
  let t = transform(&order, &vouchers).unwrap();
  assert_eq!(t.vouchers.len(), 1);
  assert_eq!(t.vouchers[0]["code"], SqlValue::text("GIFT-123"));
  assert_eq!(t.vouchers[0].len(), VOUCHER_TABLE.columns.len());
  assert_eq!(t.vouchers[0]["status"], SqlValue::Integer(1));
}

#[test]
fn non_numeric_price_fails_the_transform() {
  let order = DomainStubs::order("O4", "abc", "USD");
  assert!(matches!(transform(&order, &[]), Err(TransformError::InvalidNumber { .. })));
}
