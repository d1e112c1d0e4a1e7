//! Crate `order-flow`: motor de migración por lotes de pedidos.
//!
//! El motor (`MigrationEngine`) recorre el origen por páginas y, para cada
//! pedido, lee sus vales, lo transforma, lo carga en el destino y lo valida.
//! Cada pedido termina en exactamente un resultado (éxito, fallo de
//! validación o fallo) que se acumula en `MigrationReport`; `FileReporter`
//! vuelca ese resumen a disco.
//!
//! ```rust
//! use order_domain::{DomainStubs, InMemoryDestination, StoreFilter};
//! use order_flow::{EngineConfig, MemoryLog, MigrationEngine};
//! use std::sync::Arc;
//! let engine = MigrationEngine::new(Arc::new(DomainStubs::sample_source(3)),
//!                                   Arc::new(InMemoryDestination::new()),
//!                                   Arc::new(MemoryLog::new()),
//!                                   EngineConfig::default());
//! let report = engine.run(2, &StoreFilter::new("MTB")).unwrap();
//! assert_eq!(report.stats.success_count, 3);
//! ```
pub mod config;
pub mod engine;
pub mod errors;
pub mod logging;
pub mod report;
pub mod stats;

pub use config::MigrationConfig;
pub use engine::{EngineConfig, MigrationEngine};
pub use errors::{FlowError, RecordError};
pub use logging::{EventLog, MemoryLog, RedactingLogger};
pub use report::{FileReporter, ReportArtifacts};
pub use stats::{FailedOrder, MigrationReport, MigrationStats, RecordOutcome, ValidationFailureDetail};
