//! Núcleo de almacenamiento del servicio de identidad.
//!
//! Este crate agrupa los dos crates del workspace:
//! - `domain`: registros planos (invitaciones, sesiones, tokens, hashes).
//! - `persistence`: conexión SQLite/PostgreSQL, migraciones y stores.
//!
//! El binario de operación vive en `crates/mxid-cli`.

pub use mxid_domain as domain;
pub use mxid_persistence as persistence;

pub use mxid_domain::{lookup_hash, ThreePid, ThreePidInvite, ThreePidMapping};
pub use mxid_persistence::{PersistenceError, SqlStorage, StorageConfig};
