//! Almacenamiento SQL (SQLite / PostgreSQL) de todas las entidades.
//!
//! Contratos comunes:
//! - Crear, actualizar y borrar exigen que la sentencia afecte exactamente
//!   una fila; cualquier otro conteo es `StorageError::UnexpectedRowCount`.
//! - Las lecturas por clave devuelven `Option`; la ausencia no es error.
//! - Si una consulta con unicidad garantizada devuelve varias filas se reporta
//!   `StorageError::Integrity` en lugar de elegir una.
//!
//! Cada operación toma su propia conexión del pool y la devuelve al terminar;
//! no hay estado en memoria. Todas las llamadas bloquean: desde código async
//! deben ejecutarse en un hilo de bloqueo.

use log::info;

use crate::config::{BackendKind, StorageConfig};
use crate::connection::{build_source, ConnectionSource};
use crate::error::{PersistenceError, StorageError};
use crate::migrations::{default_migrations, ChangelogEntry, Migration, MigrationReport, SchemaMigrator};

mod accounts;
mod hashes;
mod invites;
mod policies;
pub(crate) mod rows;
mod sessions;
mod transactions;

pub use accounts::AccountStore;
pub use hashes::{HashStore, HASH_QUERY_CHUNK};
pub use invites::InviteStore;
pub use policies::PolicyStore;
pub use sessions::SessionStore;
pub use transactions::TransactionStore;

/// Implementación SQL de todos los traits de almacenamiento.
pub struct SqlStorage {
    source: ConnectionSource,
}

impl SqlStorage {
    /// Abre el almacenamiento: construye la fuente de conexiones y corre las
    /// migraciones del producto antes de devolver.
    pub fn open(config: &StorageConfig) -> Result<Self, PersistenceError> {
        let source = build_source(config)?;
        Self::with_migrations(source, default_migrations()).map(|(s, _)| s)
    }

    /// Igual que `open` pero con una lista de migraciones explícita y
    /// devolviendo el reporte de la corrida.
    pub fn with_migrations(source: ConnectionSource,
                           migrations: Vec<Migration>)
                           -> Result<(Self, MigrationReport), PersistenceError> {
        let report = SchemaMigrator::new(migrations).run(&source)?;
        info!("storage ready backend={} applied={:?}", source.backend(), report.applied);
        Ok((Self { source }, report))
    }

    pub fn backend(&self) -> BackendKind {
        self.source.backend()
    }

    /// Acceso a la fuente (p. ej. para volver a correr migraciones).
    pub fn source(&self) -> &ConnectionSource {
        &self.source
    }

    pub fn changelog(&self) -> Result<Vec<ChangelogEntry>, PersistenceError> {
        SchemaMigrator::changelog(&self.source)
    }
}

/// A lo sumo una fila: cero → `None`, una → `Some`, más → falla de integridad.
pub(crate) fn at_most_one<T>(mut rows: Vec<T>, what: impl FnOnce() -> String) -> Result<Option<T>, StorageError> {
    match rows.len() {
        0 => Ok(None),
        1 => Ok(rows.pop()),
        n => {
            let msg = format!("Lookup for {} returned more than one result ({n})", what());
            log::error!("{msg}");
            Err(StorageError::Integrity(msg))
        }
    }
}
