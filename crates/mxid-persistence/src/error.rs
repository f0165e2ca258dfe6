//! Errores de persistencia.
//! Mapea errores de Diesel / conexión a variantes semánticas: configuración,
//! migración, integridad de almacenamiento y credenciales inválidas. Ningún
//! tipo de error del driver cruza este límite.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use thiserror::Error;

/// Errores de almacenamiento: conteos de filas inesperados, violaciones de
/// integridad y fallos del driver ya clasificados.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("unexpected row count after {operation}: {actual} (expected {expected})")]
    UnexpectedRowCount {
        operation: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("integrity violation: {0}")]
    Integrity(String),
    #[error("unique violation: {0}")]
    UniqueViolation(String),
    #[error("check violation: {0}")]
    CheckViolation(String),
    #[error("foreign key violation: {0}")]
    ForeignKeyViolation(String),
    #[error("serialization conflict")]
    SerializationConflict,
    #[error("transient IO / connection pool error: {0}")]
    TransientIo(String),
    #[error("unknown database error: {0}")]
    Unknown(String),
}

impl StorageError {
    /// Clave duplicada. En transacciones de application services es la señal
    /// de reenvío.
    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, Self::UniqueViolation(_))
    }

    /// Clasificación para quien llama: el almacenamiento nunca reintenta por
    /// su cuenta.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::SerializationConflict | Self::TransientIo(_) => true,
            Self::Unknown(msg) => {
                let m = msg.to_lowercase();
                m.contains("deadlock detected")
                || m.contains("connection closed")
                || m.contains("connection refused")
                || m.contains("timeout")
            }
            _ => false,
        }
    }
}

impl From<DieselError> for StorageError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => Self::Unknown("row not found".into()),
            DieselError::DatabaseError(kind, info) => match kind {
                DatabaseErrorKind::UniqueViolation => Self::UniqueViolation(info.message().to_string()),
                DatabaseErrorKind::CheckViolation => Self::CheckViolation(info.message().to_string()),
                DatabaseErrorKind::ForeignKeyViolation => Self::ForeignKeyViolation(info.message().to_string()),
                DatabaseErrorKind::SerializationFailure => Self::SerializationConflict,
                DatabaseErrorKind::ClosedConnection => Self::TransientIo(info.message().to_string()),
                other => Self::Unknown(format!("db error kind {:?}: {}", other, info.message())),
            },
            DieselError::DeserializationError(e) => Self::Integrity(format!("deser: {e}")),
            DieselError::SerializationError(e) => Self::Unknown(format!("ser: {e}")),
            DieselError::BrokenTransactionManager => Self::TransientIo("broken transaction manager".into()),
            DieselError::QueryBuilderError(e) => Self::Unknown(format!("query builder: {e}")),
            DieselError::RollbackErrorOnCommit { rollback_error, commit_error } => {
                Self::Unknown(format!("rollback={rollback_error}; commit={commit_error}"))
            }
            other => Self::Unknown(format!("unhandled diesel error: {other:?}")),
        }
    }
}

/// Error público del núcleo de persistencia.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Backend no seleccionado/desconocido o destino vacío. Fatal al arrancar.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// Fallo al crear tablas o al aplicar una migración. Fatal al arrancar.
    #[error("migration step {step} failed: {source}")]
    Migration {
        step: String,
        #[source]
        source: StorageError,
    },
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// El token no corresponde a ninguna cuenta.
    #[error("invalid credentials")]
    InvalidCredentials,
}

impl PersistenceError {
    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, Self::Storage(e) if e.is_duplicate_key())
    }
}

impl From<DieselError> for PersistenceError {
    fn from(err: DieselError) -> Self {
        Self::Storage(err.into())
    }
}

/// Verifica que una sentencia afectó exactamente `expected` filas.
pub(crate) fn expect_rows(operation: &'static str, expected: usize, actual: usize) -> Result<(), StorageError> {
    if actual != expected {
        log::error!("{operation}: unexpected row count {actual} (expected {expected})");
        return Err(StorageError::UnexpectedRowCount { operation, expected, actual });
    }
    Ok(())
}
