use crate::domain_repository::InMemorySourceStore;
use crate::{SourceOrder, VoucherRecord};

pub struct DomainStubs;

impl DomainStubs {
    /// Pedido de ejemplo de la tienda `MTB` con una línea de producto.
    pub fn order(id: &str, price: &str, currency: &str) -> SourceOrder {
        SourceOrder { ordernumber: Some(format!("N-{}", id)),
                      status: Some("Completed".into()),
                      createddate: Some("2024-03-01T10:00:00".into()),
                      modifieddate: Some("2024-03-02T09:30:00".into()),
                      orderprice: Some(price.into()),
                      currency: Some(currency.into()),
                      customername: Some("Ana Pérez".into()),
                      customerid: Some(format!("C-{}", id)),
                      storeid: Some("MTB".into()),
                      productid: Some(format!("P-{}", id)),
                      name: Some("Gift Card".into()),
                      quantity: Some("1".into()),
                      itemprice: Some(price.into()),
                      itemcurrency: Some(currency.into()),
                      paymentouterids: Some(format!("PAY-{};Paid", id)),
                      address: Some("Shipping : Calle Mayor 1".into()),
                      shipmentnumber: Some(format!("S-{}", id)),
                      shipmentstatus: Some("Delivered".into()),
                      ..SourceOrder::new(id) }
    }

    pub fn voucher(order_id: &str, code: &str, amount: &str) -> VoucherRecord {
        VoucherRecord { order_id: order_id.into(),
                        voucher_code: Some(code.into()),
                        pin: Some("0000".into()),
                        amount: Some(amount.into()),
                        validity: Some("2025-12-31".into()),
                        product_id: None }
    }

    /// Origen en memoria con `n` pedidos `O1..On`; `On` es el más reciente.
    pub fn sample_source(n: usize) -> InMemorySourceStore {
        let store = InMemorySourceStore::new();
        for i in 1..=n {
            let mut order = Self::order(&format!("O{}", i), "10.00", "USD");
            order.createddate = Some(format!("2024-01-01T{:02}:{:02}:00", i / 60, i % 60));
            store.add_order(order);
        }
        store
    }
}
