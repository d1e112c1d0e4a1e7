//! Persistencia Diesel del pipeline de migración: el origen heredado de
//! pedidos (sólo lectura) y el cargador del destino con sus migraciones
//! embebidas. El backend se elige con la feature `pg` (Postgres) o SQLite por
//! defecto.

mod connection;
mod destination_persistence;
mod source_persistence;
pub mod statements;

pub use connection::{connect, DbBackend, DbConn, DbPool};
pub use destination_persistence::{DieselDestination, MIGRATIONS};
pub use source_persistence::DieselSourceStore;
