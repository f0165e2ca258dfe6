//! mxid-persistence
//!
//! Capa de persistencia y evolución de esquema del servicio de identidad.
//! Guarda invitaciones, sesiones de validación, recibos de transacciones de
//! application services, tokens, aceptaciones de políticas y el índice de
//! hashes de búsqueda, sobre SQLite o PostgreSQL (Diesel + r2d2).
//!
//! Módulos:
//! - `config`: selección de backend y parámetros (entorno / `.env`).
//! - `connection`: construcción de la fuente de conexiones por backend.
//! - `migrations`: ledger `changelog` y lista ordenada de migraciones.
//! - `store`: operaciones por entidad (`SqlStorage` y sus traits).
//! - `schema` / `ddl`: declaración Diesel y DDL por backend.

pub mod config;
pub mod connection;
pub mod ddl;
pub mod error;
pub mod migrations;
pub mod schema; // mantenido a mano, alineado con `ddl`
pub mod store;

pub use config::{init_dotenv, BackendKind, PostgresqlConfig, SqliteConfig, StorageConfig};
pub use connection::{build_source, ConnectionSource};
pub use error::{PersistenceError, StorageError};
pub use migrations::{default_migrations, ChangelogEntry, Migration, MigrationReport, SchemaMigrator};
pub use store::{AccountStore, HashStore, InviteStore, PolicyStore, SessionStore, SqlStorage, TransactionStore};
