use crate::columns::{TableSpec, ORDER_TABLE, PRODUCT_DATA_TABLE, PRODUCT_TABLE, TOTAL_TABLE, VOUCHER_TABLE};
use crate::errors::DomainError;
use crate::order::{SourceOrder, StoreFilter, TransformedOrder, VoucherRecord};
use crate::value::{Record, SqlValue};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

/// Resultado de cargar un pedido en el destino.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadResult {
    pub success: bool,
    pub order_id: String,
    pub error: Option<String>,
}

impl LoadResult {
    pub fn ok(order_id: impl Into<String>) -> Self {
        Self { success: true, order_id: order_id.into(), error: None }
    }

    pub fn failed(order_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self { success: false, order_id: order_id.into(), error: Some(error.into()) }
    }
}

/// Filas del destino asociadas a un pedido, tal como se leen para validar.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DestinationSnapshot {
    pub header: Record,
    pub products: Vec<Record>,
    pub product_data: Vec<Record>,
    pub totals: Vec<Record>,
    pub vouchers: Vec<Record>,
}

/// Almacén de origen (sólo lectura).
pub trait SourceStore: Send + Sync {
    /// Devuelve hasta `limit` filas a partir de `offset`, ordenadas por fecha
    /// de creación descendente (desempate por id de pedido y de producto).
    fn fetch_page(&self, filter: &StoreFilter, limit: i64, offset: i64) -> Result<Vec<SourceOrder>, DomainError>;

    fn fetch_vouchers(&self, order_id: &str) -> Result<Vec<VoucherRecord>, DomainError>;
}

/// Almacén de destino: carga atómica por pedido y lectura de verificación.
pub trait DestinationStore: Send + Sync {
    /// Inserta o actualiza todas las filas del pedido en una única
    /// transacción. Los fallos se devuelven dentro del `LoadResult`.
    fn load(&self, order: &TransformedOrder) -> LoadResult;

    /// `Ok(None)` si no existe la cabecera del pedido.
    fn read_back(&self, order_id: &str) -> Result<Option<DestinationSnapshot>, DomainError>;
}

fn lock<'a, T>(m: &'a Mutex<T>, name: &str) -> Result<MutexGuard<'a, T>, DomainError> {
    m.lock()
     .map_err(|e| DomainError::ExternalError(format!("Mutex '{}' poisoned: {}", name, e)))
}

/// Implementación en memoria del origen para tests y desarrollo.
#[derive(Default)]
pub struct InMemorySourceStore {
    orders: Mutex<Vec<SourceOrder>>,
    vouchers: Mutex<Vec<VoucherRecord>>,
    failing_vouchers: Mutex<HashSet<String>>,
    failing_offsets: Mutex<HashSet<i64>>,
    page_requests: AtomicUsize,
}

impl InMemorySourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_orders(orders: Vec<SourceOrder>) -> Self {
        let store = Self::new();
        for o in orders {
            store.add_order(o);
        }
        store
    }

    pub fn add_order(&self, order: SourceOrder) {
        if let Ok(mut orders) = self.orders.lock() {
            orders.push(order);
        }
    }

    pub fn add_voucher(&self, voucher: VoucherRecord) {
        if let Ok(mut vouchers) = self.vouchers.lock() {
            vouchers.push(voucher);
        }
    }

    /// Hace fallar la lectura de vales del pedido indicado.
    pub fn fail_vouchers_for(&self, order_id: &str) {
        if let Ok(mut set) = self.failing_vouchers.lock() {
            set.insert(order_id.to_string());
        }
    }

    /// Hace fallar la página que empieza en `offset`.
    pub fn fail_page_at(&self, offset: i64) {
        if let Ok(mut set) = self.failing_offsets.lock() {
            set.insert(offset);
        }
    }

    /// Número de llamadas a `fetch_page`, incluida la última vacía.
    pub fn page_requests(&self) -> usize {
        self.page_requests.load(Ordering::SeqCst)
    }
}

impl SourceStore for InMemorySourceStore {
    fn fetch_page(&self, filter: &StoreFilter, limit: i64, offset: i64) -> Result<Vec<SourceOrder>, DomainError> {
        self.page_requests.fetch_add(1, Ordering::SeqCst);
        if lock(&self.failing_offsets, "failing_offsets")?.contains(&offset) {
            return Err(DomainError::ExternalError(format!("page fetch failed at offset {}", offset)));
        }
        if limit < 0 || offset < 0 {
            return Err(DomainError::ValidationError(format!("limit/offset inválidos: {} / {}", limit, offset)));
        }
        let orders = lock(&self.orders, "orders")?;
        let mut rows: Vec<SourceOrder> = orders.iter()
                                               .filter(|o| o.storeid.as_deref() == Some(filter.store_id.as_str()))
                                               .cloned()
                                               .collect();
        rows.sort_by(|a, b| {
                b.createddate
                 .cmp(&a.createddate)
                 .then_with(|| b.id.cmp(&a.id))
                 .then_with(|| a.productid.cmp(&b.productid))
            });
        Ok(rows.into_iter().skip(offset as usize).take(limit as usize).collect())
    }

    fn fetch_vouchers(&self, order_id: &str) -> Result<Vec<VoucherRecord>, DomainError> {
        if lock(&self.failing_vouchers, "failing_vouchers")?.contains(order_id) {
            return Err(DomainError::ExternalError(format!("voucher fetch failed for {}", order_id)));
        }
        let vouchers = lock(&self.vouchers, "vouchers")?;
        Ok(vouchers.iter().filter(|v| v.order_id == order_id).cloned().collect())
    }
}

type TableRows = IndexMap<Vec<String>, Record>;

/// Destino en memoria con semántica de upsert por clave de conflicto y
/// escritura todo-o-nada por pedido.
#[derive(Default)]
pub struct InMemoryDestination {
    tables: Mutex<HashMap<&'static str, TableRows>>,
    failing_loads: Mutex<HashSet<String>>,
    failing_reads: Mutex<HashSet<String>>,
}

struct StagedRow {
    table: &'static str,
    key: Vec<String>,
    record: Record,
}

fn stage<S: 'static>(spec: &TableSpec<S>, record: &Record, staged: &mut Vec<StagedRow>) -> Result<(), String> {
    let projected = spec.project(record);
    let key = spec.conflict_key(&projected)
                  .ok_or_else(|| format!("NOT NULL constraint failed: {}.{}", spec.name, spec.conflict_keys.join(",")))?;
    staged.push(StagedRow { table: spec.name, key, record: projected });
    Ok(())
}

fn stage_order(order: &TransformedOrder) -> Result<Vec<StagedRow>, String> {
    let mut staged = Vec::new();
    stage(&ORDER_TABLE, &order.header, &mut staged)?;
    for line in &order.products {
        stage(&PRODUCT_TABLE, &line.record, &mut staged)?;
        if let Some(ext) = &line.extension {
            stage(&PRODUCT_DATA_TABLE, ext, &mut staged)?;
        }
    }
    for total in &order.totals {
        stage(&TOTAL_TABLE, total, &mut staged)?;
    }
    for voucher in &order.vouchers {
        stage(&VOUCHER_TABLE, voucher, &mut staged)?;
    }
    Ok(staged)
}

impl InMemoryDestination {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_loads_for(&self, order_id: &str) {
        if let Ok(mut set) = self.failing_loads.lock() {
            set.insert(order_id.to_string());
        }
    }

    pub fn fail_reads_for(&self, order_id: &str) {
        if let Ok(mut set) = self.failing_reads.lock() {
            set.insert(order_id.to_string());
        }
    }

    /// Modifica una columna de una fila ya cargada (simula deriva del destino).
    pub fn overwrite_value(&self, table: &str, key: &[&str], column: &str, value: SqlValue) -> bool {
        let Ok(mut tables) = self.tables.lock() else { return false };
        let key: Vec<String> = key.iter().map(|k| k.to_string()).collect();
        match tables.get_mut(table).and_then(|rows| rows.get_mut(&key)) {
            Some(row) if row.contains_key(column) => {
                row.insert(column.to_string(), value);
                true
            }
            _ => false,
        }
    }

    /// Elimina una fila ya cargada.
    pub fn remove_row(&self, table: &str, key: &[&str]) -> bool {
        let Ok(mut tables) = self.tables.lock() else { return false };
        let key: Vec<String> = key.iter().map(|k| k.to_string()).collect();
        tables.get_mut(table).and_then(|rows| rows.shift_remove(&key)).is_some()
    }

    pub fn row_count(&self, table: &str) -> usize {
        self.tables
            .lock()
            .map(|t| t.get(table).map(IndexMap::len).unwrap_or(0))
            .unwrap_or(0)
    }

    fn rows_for(tables: &HashMap<&'static str, TableRows>, table: &str, order_id: &str) -> Vec<Record> {
        let id = SqlValue::text(order_id);
        tables.get(table)
              .map(|rows| rows.values().filter(|r| r.get("order_id") == Some(&id)).cloned().collect())
              .unwrap_or_default()
    }
}

impl DestinationStore for InMemoryDestination {
    fn load(&self, order: &TransformedOrder) -> LoadResult {
        match lock(&self.failing_loads, "failing_loads") {
            Ok(set) if set.contains(&order.order_id) => {
                return LoadResult::failed(&order.order_id, "injected load failure");
            }
            Err(e) => return LoadResult::failed(&order.order_id, e.to_string()),
            _ => {}
        }
        // Se prepara todo antes de escribir: un fallo no deja filas parciales.
        let staged = match stage_order(order) {
            Ok(s) => s,
            Err(e) => return LoadResult::failed(&order.order_id, e),
        };
        let mut tables = match lock(&self.tables, "tables") {
            Ok(t) => t,
            Err(e) => return LoadResult::failed(&order.order_id, e.to_string()),
        };
        for row in staged {
            tables.entry(row.table).or_default().insert(row.key, row.record);
        }
        LoadResult::ok(&order.order_id)
    }

    fn read_back(&self, order_id: &str) -> Result<Option<DestinationSnapshot>, DomainError> {
        if lock(&self.failing_reads, "failing_reads")?.contains(order_id) {
            return Err(DomainError::ExternalError(format!("read-back failed for {}", order_id)));
        }
        let tables = lock(&self.tables, "tables")?;
        let header = match tables.get(ORDER_TABLE.name).and_then(|rows| rows.get(&vec![order_id.to_string()])) {
            Some(h) => h.clone(),
            None => return Ok(None),
        };
        Ok(Some(DestinationSnapshot { header,
                                      products: Self::rows_for(&tables, PRODUCT_TABLE.name, order_id),
                                      product_data: Self::rows_for(&tables, PRODUCT_DATA_TABLE.name, order_id),
                                      totals: Self::rows_for(&tables, TOTAL_TABLE.name, order_id),
                                      vouchers: Self::rows_for(&tables, VOUCHER_TABLE.name, order_id) }))
    }
}
