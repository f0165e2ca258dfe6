use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Token de acceso emitido para una cuenta. `created_at` se guarda en
/// milisegundos.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub token: String,
    pub token_type: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    /// Vigencia en segundos desde `created_at`; `None` = sin expiración.
    pub expires_after: Option<i64>,
}

impl Account {
    pub fn new(token: &str, user_id: &str) -> Self {
        Account {
            token: token.to_string(),
            token_type: "Bearer".to_string(),
            user_id: user_id.to_string(),
            created_at: crate::time::now(),
            expires_after: None,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expires_after {
            Some(secs) => self.created_at + chrono::Duration::seconds(secs) <= now,
            None => false,
        }
    }
}
