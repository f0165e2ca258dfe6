//! Utilidades de tiempo. Todas las marcas se manejan con precisión de
//! milisegundos para que el valor leído desde cualquier backend sea idéntico
//! al escrito.

use chrono::{DateTime, TimeZone, Utc};

/// Instante actual truncado a milisegundos.
pub fn now() -> DateTime<Utc> {
    truncate_millis(Utc::now())
}

/// Descarta la fracción inferior al milisegundo.
pub fn truncate_millis(ts: DateTime<Utc>) -> DateTime<Utc> {
    from_millis(ts.timestamp_millis()).unwrap_or(ts)
}

/// Convierte milisegundos desde epoch a `DateTime<Utc>`; `None` si el valor
/// queda fuera del rango representable.
pub fn from_millis(ms: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms).single()
}
