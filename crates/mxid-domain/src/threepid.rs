use serde::{Deserialize, Serialize};
use std::fmt;

use crate::DomainError;

/// Identificador de terceros (email, msisdn, ...) asociado a una cuenta.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ThreePid {
    medium: String,
    address: String,
}

impl ThreePid {
    pub fn new(medium: &str, address: &str) -> Result<Self, DomainError> {
        if medium.trim().is_empty() {
            return Err(DomainError::ValidationError("3PID medium cannot be blank".to_string()));
        }
        if address.trim().is_empty() {
            return Err(DomainError::ValidationError("3PID address cannot be blank".to_string()));
        }
        Ok(ThreePid { medium: medium.to_string(), address: address.to_string() })
    }
    pub fn medium(&self) -> &str { &self.medium }
    pub fn address(&self) -> &str { &self.address }
}

impl fmt::Display for ThreePid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.medium, self.address)
    }
}

/// Resultado de una búsqueda inversa: el 3PID en claro y la cuenta Matrix a
/// la que pertenece.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ThreePidMapping {
    pub medium: String,
    pub address: String,
    pub mxid: String,
}
