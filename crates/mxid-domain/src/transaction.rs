use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Recibo de una transacción entregada por un application service. La clave
/// (localpart, transaction_id) identifica la entrega; una segunda inserción
/// con la misma clave es un reenvío. `completed_at` se guarda en
/// milisegundos.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AsTransaction {
    pub localpart: String,
    pub transaction_id: String,
    pub completed_at: DateTime<Utc>,
    pub result: String,
}
