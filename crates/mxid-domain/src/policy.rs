//! Políticas (términos de servicio) publicadas y su aceptación por usuario.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Un documento de términos en un idioma concreto.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermObject {
    pub name: String,
    pub url: String,
}

/// Política versionada; `terms` está indexado por código de idioma.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PolicyObject {
    pub version: String,
    pub terms: BTreeMap<String, TermObject>,
}

impl PolicyObject {
    /// Verdadero si alguna URL de términos coincide con `url` sin distinguir
    /// mayúsculas.
    pub fn has_term_url(&self, url: &str) -> bool {
        self.terms.values().any(|t| same_policy_url(&t.url, url))
    }
}

/// Comparación de URLs de términos sin distinguir mayúsculas (Unicode, no
/// sólo ASCII).
pub fn same_policy_url(a: &str, b: &str) -> bool {
    a == b || a.to_lowercase() == b.to_lowercase()
}

/// Aceptación registrada de una URL de términos por un usuario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptedPolicy {
    pub id: i64,
    pub user_id: String,
    pub url: String,
    pub accepted_at: DateTime<Utc>,
}
