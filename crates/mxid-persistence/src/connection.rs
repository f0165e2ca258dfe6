//! Construcción de la fuente de conexiones según el backend configurado.
//!
//! Ambos backends se exponen como pools r2d2 de conexiones Diesel:
//! - SQLite: pool de una sola conexión que nunca se recicla, de modo que una
//!   base `:memory:` vive lo mismo que la fuente.
//! - PostgreSQL: una sola conexión si el pooling está desactivado; si no, un
//!   pool ajustado con los parámetros de `PostgresqlConfig`.
//!
//! La fuente se libera al hacer drop (cierra todas las conexiones).

use std::path::Path;
use std::time::Duration;

use diesel::connection::SimpleConnection;
use diesel::pg::PgConnection;
use diesel::r2d2::{self, ConnectionManager, R2D2Connection};
use diesel::sqlite::SqliteConnection;
use log::{info, warn};

use crate::config::{BackendKind, PostgresqlConfig, SqliteConfig, StorageConfig};
use crate::error::{PersistenceError, StorageError};

/// Alias de tipo para el pool r2d2 de conexiones SQLite.
pub type SqlitePool = r2d2::Pool<ConnectionManager<SqliteConnection>>;

/// Alias de tipo para el pool r2d2 de conexiones Postgres.
pub type PgPool = r2d2::Pool<ConnectionManager<PgConnection>>;

/// Fuente de conexiones etiquetada por backend.
#[derive(Clone)]
pub enum ConnectionSource {
    Sqlite(SqlitePool),
    Postgresql(PgPool),
}

impl ConnectionSource {
    pub fn backend(&self) -> BackendKind {
        match self {
            ConnectionSource::Sqlite(_) => BackendKind::Sqlite,
            ConnectionSource::Postgresql(_) => BackendKind::Postgresql,
        }
    }
}

/// Obtiene una conexión del pool.
pub(crate) fn checkout<C>(pool: &r2d2::Pool<ConnectionManager<C>>)
                          -> Result<r2d2::PooledConnection<ConnectionManager<C>>, PersistenceError>
    where C: R2D2Connection + Send + 'static
{
    pool.get()
        .map_err(|e| StorageError::TransientIo(format!("pool error: {e}")).into())
}

/// Ejecuta `$body` con `$conn` ligado a `&mut SqliteConnection` o
/// `&mut PgConnection` según el backend. El cuerpo se compila una vez por
/// backend, así que debe usar sólo el DSL común de Diesel. La conexión vuelve
/// al pool al terminar el bloque; nunca anidar dos invocaciones (un pool de
/// una conexión se bloquearía).
macro_rules! with_connection {
    ($source:expr, |$conn:ident| $body:block) => {
        match $source {
            $crate::connection::ConnectionSource::Sqlite(pool) => {
                let mut pooled = $crate::connection::checkout(pool)?;
                let $conn: &mut ::diesel::sqlite::SqliteConnection = &mut pooled;
                $body
            }
            $crate::connection::ConnectionSource::Postgresql(pool) => {
                let mut pooled = $crate::connection::checkout(pool)?;
                let $conn: &mut ::diesel::pg::PgConnection = &mut pooled;
                $body
            }
        }
    };
}
pub(crate) use with_connection;

/// PRAGMAs aplicados a cada conexión SQLite nueva.
#[derive(Debug)]
struct SqlitePragmas;

impl r2d2::CustomizeConnection<SqliteConnection, r2d2::Error> for SqlitePragmas {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), r2d2::Error> {
        conn.batch_execute("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;")
            .map_err(r2d2::Error::QueryError)
    }
}

/// Construye la fuente de conexiones descrita por `config`.
///
/// Falla con `PersistenceError::Configuration` si no hay backend o el destino
/// está vacío; con `Storage(TransientIo)` si no se puede abrir la conexión.
pub fn build_source(config: &StorageConfig) -> Result<ConnectionSource, PersistenceError> {
    match config.backend {
        Some(BackendKind::Sqlite) => build_sqlite_pool(&config.sqlite).map(ConnectionSource::Sqlite),
        Some(BackendKind::Postgresql) => build_pg_pool(&config.postgresql).map(ConnectionSource::Postgresql),
        None => Err(PersistenceError::Configuration("storage.backend".into())),
    }
}

pub fn build_sqlite_pool(config: &SqliteConfig) -> Result<SqlitePool, PersistenceError> {
    let database = config.database.trim();
    if database.is_empty() {
        return Err(PersistenceError::Configuration("Storage destination cannot be empty".into()));
    }
    if database != ":memory:" {
        if let Some(parent) = Path::new(database).parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                                               PersistenceError::Configuration(format!("create dir {}: {e}",
                                                                                       parent.display()))
                                           })?;
        }
    }
    let manager = ConnectionManager::<SqliteConnection>::new(database);
    let pool = r2d2::Pool::builder().max_size(1)
                                    .min_idle(Some(1))
                                    .max_lifetime(None)
                                    .idle_timeout(None)
                                    .connection_customizer(Box::new(SqlitePragmas))
                                    .build(manager)
                                    .map_err(|e| StorageError::TransientIo(format!("pool build: {e}")))?;
    info!("sqlite storage opened database={database}");
    Ok(pool)
}

pub fn build_pg_pool(config: &PostgresqlConfig) -> Result<PgPool, PersistenceError> {
    if config.database.trim().is_empty() {
        return Err(PersistenceError::Configuration("Storage destination cannot be empty".into()));
    }
    let manager = ConnectionManager::<PgConnection>::new(config.connection_string());
    let builder = if config.pool {
        info!("Enable pooling");
        let max_size = if config.max_connections_free == 0 {
            warn!("max_connections_free=0, ajustando a 1");
            1
        } else {
            config.max_connections_free
        };
        let max_lifetime = positive_duration("MXID_PG_MAX_CONNECTION_AGE_MS", config.max_connection_age_ms)?;
        let idle_timeout = positive_duration("MXID_PG_CHECK_CONNECTIONS_EVERY_MS", config.check_connections_every_ms)?;
        r2d2::Pool::builder().max_size(max_size)
                             .min_idle(Some(1))
                             .max_lifetime(Some(max_lifetime))
                             .idle_timeout(Some(idle_timeout))
                             .test_on_check_out(config.test_before_get)
    } else {
        r2d2::Pool::builder().max_size(1)
                             .min_idle(Some(1))
                             .test_on_check_out(config.test_before_get)
    };
    let pool = builder.build(manager)
                      .map_err(|e| StorageError::TransientIo(format!("pool build: {e}")))?;
    info!("postgresql storage opened pool={} max_size={}", config.pool, pool.max_size());
    Ok(pool)
}

// r2d2 entra en pánico con duraciones en cero.
fn positive_duration(key: &str, ms: u64) -> Result<Duration, PersistenceError> {
    if ms == 0 {
        return Err(PersistenceError::Configuration(format!("{key}: must be positive")));
    }
    Ok(Duration::from_millis(ms))
}
