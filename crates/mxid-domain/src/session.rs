use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::threepid::ThreePid;

/// Sesión de validación de un 3PID. Existe como mucho una por par
/// (3PID, secreto).
///
/// Los instantes se persisten con precisión de milisegundos; construirlos con
/// `time::now()` o `time::truncate_millis` para que una lectura posterior sea
/// igual al valor escrito.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreePidSession {
    pub id: String,
    pub server: String,
    pub three_pid: ThreePid,
    pub secret: String,
    pub attempt: i32,
    pub next_link: Option<String>,
    pub token: String,
    pub created_at: DateTime<Utc>,
    pub validated: bool,
    pub validated_at: Option<DateTime<Utc>>,
}

impl ThreePidSession {
    /// Marca la sesión como validada en `at`.
    pub fn validate(&mut self, at: DateTime<Utc>) {
        self.validated = true;
        self.validated_at = Some(crate::time::truncate_millis(at));
    }

    /// Registra un nuevo intento (reenvío del token).
    pub fn increase_attempt(&mut self) {
        self.attempt += 1;
    }
}
