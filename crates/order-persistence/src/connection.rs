use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use order_domain::DomainError;
use std::time::Duration;

#[cfg(all(feature = "pg", not(test)))]
pub type DbConn = PgConnection;
#[cfg(any(test, not(feature = "pg")))]
pub type DbConn = SqliteConnection;
#[cfg(all(feature = "pg", not(test)))]
pub type DbBackend = diesel::pg::Pg;
#[cfg(any(test, not(feature = "pg")))]
pub type DbBackend = diesel::sqlite::Sqlite;

pub type DbPool = Pool<ConnectionManager<DbConn>>;
pub(crate) type DbPooled = PooledConnection<ConnectionManager<DbConn>>;

const CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);

/// WAL y espera ante bloqueos en cada conexión SQLite nueva; varios workers
/// pueden escribir a la vez.
#[cfg(any(test, not(feature = "pg")))]
#[derive(Debug)]
struct SqlitePragmas;

#[cfg(any(test, not(feature = "pg")))]
impl diesel::r2d2::CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for SqlitePragmas {
  fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
    use diesel::connection::SimpleConnection;
    conn.batch_execute("PRAGMA journal_mode = WAL; PRAGMA busy_timeout = 5000;")
        .map_err(diesel::r2d2::Error::QueryError)
  }
}

/// Crea un pool de hasta `max_size` conexiones contra `database_url`.
pub fn connect(database_url: &str, max_size: u32) -> Result<DbPool, DomainError> {
  if max_size == 0 {
    return Err(DomainError::ValidationError("el tamaño del pool debe ser mayor que 0".into()));
  }
  let manager = ConnectionManager::<DbConn>::new(database_url);
  let builder = Pool::builder().max_size(max_size).connection_timeout(CONNECTION_TIMEOUT);
  #[cfg(any(test, not(feature = "pg")))]
  let builder = builder.connection_customizer(Box::new(SqlitePragmas));
  builder.build(manager)
         .map_err(|e| DomainError::ExternalError(format!("pool: {}", e)))
}

pub(crate) fn checkout(pool: &DbPool) -> Result<DbPooled, DomainError> {
  pool.get().map_err(|e| DomainError::ExternalError(format!("pool: {}", e)))
}

pub(crate) fn map_db_err<T>(res: std::result::Result<T, diesel::result::Error>) -> Result<T, DomainError> {
  res.map_err(|e| DomainError::ExternalError(format!("db: {}", e)))
}
