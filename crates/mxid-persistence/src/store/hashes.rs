//! Índice de hashes para búsqueda inversa de 3PID.
//!
//! La tabla se reconstruye completa en cada ciclo de recálculo: `clear_hashes`
//! y luego un `add_hash` por identidad. La búsqueda es por pertenencia a un
//! conjunto (`IN` / `= ANY`), no un bucle por hash.

use diesel::prelude::*;
use log::debug;
use mxid_domain::ThreePidMapping;
use std::collections::BTreeSet;

use super::rows::{HashRow, NewHashRow};
use super::SqlStorage;
use crate::connection::with_connection;
use crate::error::{expect_rows, PersistenceError, StorageError};
use crate::schema::hashes;

/// Máximo de valores por consulta; por debajo del límite de parámetros de
/// SQLite.
pub const HASH_QUERY_CHUNK: usize = 5_000;

pub trait HashStore {
    /// Borra todo el índice. Falla si se borran más o menos filas de las
    /// contadas en la misma pasada (modificación concurrente).
    fn clear_hashes(&self) -> Result<(), PersistenceError>;
    fn add_hash(&self, mxid: &str, medium: &str, address: &str, hash: &str) -> Result<(), PersistenceError>;
    /// Devuelve cada mapeo cuyo hash está en `hashes`, junto al hash que lo
    /// encontró.
    fn find_hashes(&self, hashes: &[String]) -> Result<Vec<(String, ThreePidMapping)>, PersistenceError>;
}

impl HashStore for SqlStorage {
    fn clear_hashes(&self) -> Result<(), PersistenceError> {
        let (counted, deleted) = with_connection!(&self.source, |conn| {
            let counted: i64 = hashes::table.count().get_result(conn)?;
            let deleted = diesel::delete(hashes::table).execute(conn)?;
            (counted, deleted)
        });
        let counted = usize::try_from(counted).map_err(|_| StorageError::Integrity(format!("hash count {counted}")))?;
        expect_rows("clear hashes", counted, deleted)?;
        debug!("clear_hashes:done deleted={deleted}");
        Ok(())
    }

    fn add_hash(&self, mxid: &str, medium: &str, address: &str, hash: &str) -> Result<(), PersistenceError> {
        let row = NewHashRow { mxid, medium, address, hash };
        let created = with_connection!(&self.source, |conn| {
            diesel::insert_into(hashes::table).values(&row).execute(conn)?
        });
        expect_rows("add hash", 1, created)?;
        Ok(())
    }

    fn find_hashes(&self, wanted: &[String]) -> Result<Vec<(String, ThreePidMapping)>, PersistenceError> {
        let unique: Vec<&str> = wanted.iter().map(String::as_str).collect::<BTreeSet<_>>().into_iter().collect();
        if unique.is_empty() {
            return Ok(Vec::new());
        }
        let mut found = Vec::new();
        with_connection!(&self.source, |conn| {
            for chunk in unique.chunks(HASH_QUERY_CHUNK) {
                let rows = hashes::table.filter(hashes::hash.eq_any(chunk.to_vec()))
                                        .select((hashes::mxid, hashes::medium, hashes::address, hashes::hash))
                                        .load::<HashRow>(conn)?;
                found.extend(rows.into_iter().map(HashRow::into_match));
            }
        });
        debug!("find_hashes:done requested={} found={}", unique.len(), found.len());
        Ok(found)
    }
}
