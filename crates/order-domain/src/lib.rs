mod columns;
mod domain_repository;
mod domain_stubs;
mod errors;
mod order;
mod transformer;
mod validator;
mod value;

pub use columns::{ColumnMap, Source, TableSpec, ORDER_TABLE, PRODUCT_DATA_TABLE, PRODUCT_TABLE, TOTAL_TABLE,
                  VOUCHER_TABLE};
pub use domain_repository::{DestinationSnapshot, DestinationStore, InMemoryDestination, InMemorySourceStore, LoadResult,
                            SourceStore};
pub use domain_stubs::DomainStubs;
pub use errors::{DomainError, TransformError};
pub use order::{FieldSource, ProductLine, SourceOrder, StoreFilter, TotalLine, TransformedOrder, VoucherRecord};
pub use transformer::{map_record, transform};
pub use validator::{compare, loosely_equal, validate, Discrepancy, DiscrepancyKind, ValidationResult};
pub use value::{parse_decimal, parse_integer, ColumnKind, Literal, Record, SqlValue};
