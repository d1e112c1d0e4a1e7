// Archivo: config.rs
// Propósito: configuración de la ejecución leída del entorno (y de `.env` si
// existe).
use crate::errors::{FlowError, Result};
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_BATCH_SIZE: usize = 100;
pub const DEFAULT_STORE_ID: &str = "MTB";
pub const DEFAULT_POOL_SIZE: u32 = 10;
pub const DEFAULT_REPORT_DIR: &str = "reports";

#[derive(Debug, Clone, PartialEq)]
pub struct MigrationConfig {
  pub source_db_url: String,
  pub dest_db_url: String,
  pub batch_size: usize,
  pub store_id: String,
  pub pool_size: u32,
  pub workers: usize,
  pub report_dir: PathBuf,
  pub run_migrations: bool,
  /// `true` con `APP_ENV=production`: activa el conjunto de claves
  /// redactadas por defecto.
  pub production: bool,
  pub extra_redact_keys: Vec<String>,
  pub log_level: String,
}

fn required(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String> {
  lookup(key).filter(|v| !v.trim().is_empty())
             .ok_or_else(|| FlowError::Config(format!("falta la variable {}", key)))
}

fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T> {
  match lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
    None => Ok(default),
    Some(raw) => raw.parse::<T>()
                    .map_err(|_| FlowError::Config(format!("valor inválido para {}: '{}'", key, raw))),
  }
}

fn flag(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<bool> {
  match lookup(key).map(|v| v.trim().to_lowercase()).as_deref() {
    None | Some("") | Some("0") | Some("false") | Some("no") => Ok(false),
    Some("1") | Some("true") | Some("yes") => Ok(true),
    Some(other) => Err(FlowError::Config(format!("valor inválido para {}: '{}'", key, other))),
  }
}

impl MigrationConfig {
  /// Lee la configuración del proceso. Carga `.env` si está presente.
  pub fn from_env() -> Result<Self> {
    dotenvy::dotenv().ok();
    Self::from_vars(|k| std::env::var(k).ok())
  }

  /// Igual que `from_env` pero con una función de búsqueda arbitraria.
  pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
    let batch_size = parsed(&lookup, "BATCH_SIZE", DEFAULT_BATCH_SIZE)?;
    if batch_size == 0 {
      return Err(FlowError::Config("BATCH_SIZE debe ser mayor que 0".into()));
    }
    let pool_size = parsed(&lookup, "DB_POOL_SIZE", DEFAULT_POOL_SIZE)?;
    if pool_size == 0 {
      return Err(FlowError::Config("DB_POOL_SIZE debe ser mayor que 0".into()));
    }
    let extra_redact_keys = lookup("LOG_REDACT_KEYS").map(|v| {
                                                       v.split(',')
                                                        .map(|k| k.trim().to_string())
                                                        .filter(|k| !k.is_empty())
                                                        .collect()
                                                     })
                                                     .unwrap_or_default();
    Ok(Self { source_db_url: required(&lookup, "SOURCE_DB_URL")?,
              dest_db_url: required(&lookup, "DEST_DB_URL")?,
              batch_size,
              store_id: lookup("STORE_ID").filter(|s| !s.trim().is_empty())
                                          .unwrap_or_else(|| DEFAULT_STORE_ID.to_string()),
              pool_size,
              workers: parsed(&lookup, "MIGRATION_WORKERS", 1usize)?.max(1),
              report_dir: PathBuf::from(lookup("REPORT_DIR").filter(|s| !s.trim().is_empty())
                                                            .unwrap_or_else(|| DEFAULT_REPORT_DIR.to_string())),
              run_migrations: flag(&lookup, "DEST_RUN_MIGRATIONS")?,
              production: lookup("APP_ENV").map(|v| v.eq_ignore_ascii_case("production")).unwrap_or(false),
              extra_redact_keys,
              log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()) })
  }
}
