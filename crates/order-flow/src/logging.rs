// Archivo: logging.rs
// Propósito: colaborador de logging inyectado en el motor. Los eventos son
// objetos JSON; la implementación por defecto redacta claves sensibles y
// reenvía al facade `log`.
use once_cell::sync::Lazy;
use serde_json::{Map, Value as JsonValue};
use std::collections::HashSet;
use std::sync::Mutex;
use uuid::Uuid;

pub const REDACTED: &str = "[REDACTED]";

/// Claves redactadas en producción.
pub static DEFAULT_REDACTED_KEYS: Lazy<HashSet<String>> = Lazy::new(|| {
  ["clientsecret",
   "secret",
   "password",
   "work_email",
   "first_name",
   "last_name",
   "email",
   "userinput",
   "emp_id",
   "loggedin_email",
   "contact1",
   "auth_company_encryption_key",
   "pwd",
   "new_pwd",
   "confirmed_pwd",
   "old_pwd",
   "employee_email",
   "employee_alternate_email",
   "employee_birthdate",
   "employee_first_name",
   "employee_middle_name",
   "employee_last_name",
   "employee_full_name",
   "employee_primary_mobile",
   "employee_address",
   "employee_address2",
   "employee_zip_code",
   "employee_city",
   "employee_state",
   "profile_image_dp",
   "name",
   "user_input",
   "em",
   "user_email",
   "auth_email_id",
   "otp",
   "resetlink"].iter()
               .map(|k| k.to_string())
               .collect()
});

/// Destino de los eventos de progreso del motor.
pub trait EventLog: Send + Sync {
  fn log(&self, level: log::Level, fields: JsonValue);
}

/// Reemplaza por `[REDACTED]` el valor de toda clave incluida en `keys`
/// (sin distinguir mayúsculas), a cualquier profundidad.
pub fn redact(value: &JsonValue, keys: &HashSet<String>) -> JsonValue {
  match value {
    JsonValue::Object(map) => {
      let mut out = Map::with_capacity(map.len());
      for (k, v) in map {
        let v = if keys.contains(&k.to_lowercase()) { JsonValue::String(REDACTED.into()) } else { redact(v, keys) };
        out.insert(k.clone(), v);
      }
      JsonValue::Object(out)
    }
    JsonValue::Array(items) => JsonValue::Array(items.iter().map(|v| redact(v, keys)).collect()),
    other => other.clone(),
  }
}

/// Logger por defecto: redacta y emite una línea JSON por evento con el id
/// de la ejecución.
pub struct RedactingLogger {
  run_id: Uuid,
  keys: HashSet<String>,
}

impl RedactingLogger {
  pub fn new(run_id: Uuid, keys: HashSet<String>) -> Self {
    Self { run_id, keys: keys.into_iter().map(|k| k.to_lowercase()).collect() }
  }

  /// Claves por defecto sólo en producción, más las adicionales.
  pub fn for_environment(run_id: Uuid, production: bool, extra: &[String]) -> Self {
    let mut keys = if production { DEFAULT_REDACTED_KEYS.clone() } else { HashSet::new() };
    keys.extend(extra.iter().cloned());
    Self::new(run_id, keys)
  }

  pub fn render(&self, fields: &JsonValue) -> String {
    redact(fields, &self.keys).to_string()
  }
}

impl EventLog for RedactingLogger {
  fn log(&self, level: log::Level, fields: JsonValue) {
    log::log!(target: "order_migration", level, "[run:{}] {}", self.run_id, self.render(&fields));
  }
}

/// Registro en memoria para tests.
#[derive(Default)]
pub struct MemoryLog {
  entries: Mutex<Vec<(log::Level, JsonValue)>>,
}

impl MemoryLog {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn entries(&self) -> Vec<(log::Level, JsonValue)> {
    self.entries.lock().map(|e| e.clone()).unwrap_or_default()
  }

  /// Eventos cuyo campo `event` coincide.
  pub fn events(&self, name: &str) -> Vec<JsonValue> {
    self.entries()
        .into_iter()
        .filter(|(_, f)| f.get("event").and_then(JsonValue::as_str) == Some(name))
        .map(|(_, f)| f)
        .collect()
  }
}

impl EventLog for MemoryLog {
  fn log(&self, level: log::Level, fields: JsonValue) {
    if let Ok(mut entries) = self.entries.lock() {
      entries.push((level, fields));
    }
  }
}
