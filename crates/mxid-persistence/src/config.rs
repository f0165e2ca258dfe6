//! Carga de configuración de almacenamiento desde variables de entorno.
//! El archivo `.env` se carga perezosamente una sola vez; cualquier valor
//! inválido se reporta como `PersistenceError::Configuration` con el nombre de
//! la variable.

use std::env;
use std::fmt;
use std::str::FromStr;

use dotenvy::dotenv;
use once_cell::sync::Lazy;

use crate::error::PersistenceError;

// Carga perezosa del archivo .env una sola vez.
static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenv(); // ignora error si no existe .env
});

/// Forzar carga temprana de .env desde aplicaciones externas si se desea.
pub fn init_dotenv() { Lazy::force(&DOTENV_LOADED); }

/// Backend relacional soportado.
///
/// Además de seleccionar el tipo de conexión, concentra las pocas diferencias
/// de dialecto que el resto del crate necesita conocer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Sqlite,
    Postgresql,
}

impl BackendKind {
    pub fn name(self) -> &'static str {
        match self {
            BackendKind::Sqlite => "sqlite",
            BackendKind::Postgresql => "postgresql",
        }
    }

    /// Columna `id` autoincremental (clave primaria numérica generada).
    pub fn autoincrement_pk(self) -> &'static str {
        match self {
            BackendKind::Sqlite => "id INTEGER PRIMARY KEY AUTOINCREMENT",
            BackendKind::Postgresql => "id BIGSERIAL PRIMARY KEY",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BackendKind {
    type Err = PersistenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(BackendKind::Sqlite),
            "postgresql" => Ok(BackendKind::Postgresql),
            other => Err(PersistenceError::Configuration(format!("storage.backend: unknown backend '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SqliteConfig {
    /// Ruta del archivo o `:memory:`.
    pub database: String,
}

#[derive(Debug, Clone)]
pub struct PostgresqlConfig {
    pub host: String,
    /// Nombre de la base o URL completa `postgres://...`.
    pub database: String,
    pub username: String,
    pub password: String,
    pub pool: bool,
    /// Tamaño máximo del pool.
    pub max_connections_free: u32,
    /// Edad máxima de una conexión antes de reemplazarla. Debe ser positiva.
    pub max_connection_age_ms: u64,
    /// Se usa como `idle_timeout` del pool: una conexión ociosa más tiempo que
    /// este intervalo se cierra y se vuelve a abrir al pedirla, no se
    /// verifica en sitio. Con el valor por defecto las conexiones ociosas se
    /// renuevan cada ~30 s. Debe ser positivo.
    pub check_connections_every_ms: u64,
    /// Verifica la conexión (`test_on_check_out`) antes de entregarla.
    pub test_before_get: bool,
}

impl Default for PostgresqlConfig {
    fn default() -> Self {
        Self { host: "localhost".into(),
               database: String::new(),
               username: String::new(),
               password: String::new(),
               pool: false,
               max_connections_free: 1,
               max_connection_age_ms: 60 * 60 * 1000,
               check_connections_every_ms: 30 * 1000,
               test_before_get: false }
    }
}

impl PostgresqlConfig {
    /// Cadena de conexión para libpq. Si `database` ya es una URL se usa tal
    /// cual; si no, se arma la forma `clave=valor` con los valores escapados.
    pub fn connection_string(&self) -> String {
        let db = self.database.trim();
        if db.starts_with("postgres://") || db.starts_with("postgresql://") {
            return db.to_string();
        }
        let mut parts = vec![format!("host={}", quote_conninfo(&self.host)), format!("dbname={}", quote_conninfo(db))];
        if !self.username.is_empty() {
            parts.push(format!("user={}", quote_conninfo(&self.username)));
        }
        if !self.password.is_empty() {
            parts.push(format!("password={}", quote_conninfo(&self.password)));
        }
        parts.join(" ")
    }
}

fn quote_conninfo(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// Configuración completa del almacenamiento.
#[derive(Debug, Clone, Default)]
pub struct StorageConfig {
    pub backend: Option<BackendKind>,
    pub sqlite: SqliteConfig,
    pub postgresql: PostgresqlConfig,
}

impl StorageConfig {
    /// Configuración SQLite lista para usar (tests, herramientas).
    pub fn sqlite(database: &str) -> Self {
        Self { backend: Some(BackendKind::Sqlite),
               sqlite: SqliteConfig { database: database.to_string() },
               ..Default::default() }
    }

    pub fn postgresql(cfg: PostgresqlConfig) -> Self {
        Self { backend: Some(BackendKind::Postgresql),
               postgresql: cfg,
               ..Default::default() }
    }

    pub fn from_env() -> Result<Self, PersistenceError> {
        // asegura que .env se haya cargado
        Lazy::force(&DOTENV_LOADED);
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Construye la configuración a partir de cualquier fuente clave→valor.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, PersistenceError>
        where F: Fn(&str) -> Option<String>
    {
        let backend = match lookup("MXID_STORAGE_BACKEND") {
            Some(v) if !v.trim().is_empty() => Some(v.parse::<BackendKind>()?),
            _ => None,
        };
        let defaults = PostgresqlConfig::default();
        let postgresql = PostgresqlConfig {
            host: lookup("MXID_PG_HOST").unwrap_or(defaults.host),
            database: lookup("MXID_PG_DATABASE").unwrap_or_default(),
            username: lookup("MXID_PG_USERNAME").unwrap_or_default(),
            password: lookup("MXID_PG_PASSWORD").unwrap_or_default(),
            pool: parse_or(&lookup, "MXID_PG_POOL", defaults.pool)?,
            max_connections_free: parse_or(&lookup, "MXID_PG_MAX_CONNECTIONS_FREE", defaults.max_connections_free)?,
            max_connection_age_ms: parse_or(&lookup, "MXID_PG_MAX_CONNECTION_AGE_MS", defaults.max_connection_age_ms)?,
            check_connections_every_ms: parse_or(&lookup,
                                                 "MXID_PG_CHECK_CONNECTIONS_EVERY_MS",
                                                 defaults.check_connections_every_ms)?,
            test_before_get: parse_or(&lookup, "MXID_PG_TEST_BEFORE_GET", defaults.test_before_get)?,
        };
        Ok(Self { backend,
                  sqlite: SqliteConfig { database: lookup("MXID_SQLITE_DATABASE").unwrap_or_default() },
                  postgresql })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, PersistenceError>
    where F: Fn(&str) -> Option<String>,
          T: FromStr
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) if raw.trim().is_empty() => Ok(default),
        Some(raw) => raw.trim()
                        .parse()
                        .map_err(|_| PersistenceError::Configuration(format!("{key}: invalid value '{raw}'"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_when_nothing_set() {
        let cfg = StorageConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(cfg.backend, None);
        assert!(!cfg.postgresql.pool);
        assert_eq!(cfg.postgresql.max_connections_free, 1);
        assert_eq!(cfg.postgresql.max_connection_age_ms, 3_600_000);
        assert_eq!(cfg.postgresql.check_connections_every_ms, 30_000);
        assert!(!cfg.postgresql.test_before_get);
    }

    #[test]
    fn parses_pool_knobs() {
        let cfg = StorageConfig::from_lookup(lookup_from(&[("MXID_STORAGE_BACKEND", "PostgreSQL"),
                                                           ("MXID_PG_DATABASE", "mxisd"),
                                                           ("MXID_PG_POOL", "true"),
                                                           ("MXID_PG_MAX_CONNECTIONS_FREE", "8"),
                                                           ("MXID_PG_TEST_BEFORE_GET", "true")])).unwrap();
        assert_eq!(cfg.backend, Some(BackendKind::Postgresql));
        assert!(cfg.postgresql.pool);
        assert_eq!(cfg.postgresql.max_connections_free, 8);
        assert!(cfg.postgresql.test_before_get);
    }

    #[test]
    fn unknown_backend_is_configuration_error() {
        let err = StorageConfig::from_lookup(lookup_from(&[("MXID_STORAGE_BACKEND", "mysql")])).unwrap_err();
        assert!(matches!(err, PersistenceError::Configuration(_)));
    }

    #[test]
    fn invalid_number_names_the_variable() {
        let err = StorageConfig::from_lookup(lookup_from(&[("MXID_PG_MAX_CONNECTIONS_FREE", "many")])).unwrap_err();
        match err {
            PersistenceError::Configuration(msg) => assert!(msg.contains("MXID_PG_MAX_CONNECTIONS_FREE")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn conninfo_quotes_values() {
        let cfg = PostgresqlConfig { host: "db.local".into(),
                                     database: "mx isd".into(),
                                     username: "o'neil".into(),
                                     password: "p\\w".into(),
                                     ..Default::default() };
        assert_eq!(cfg.connection_string(),
                   "host='db.local' dbname='mx isd' user='o\\'neil' password='p\\\\w'");
    }

    #[test]
    fn url_database_is_used_verbatim() {
        let cfg = PostgresqlConfig { database: "postgres://u:p@h/db".into(), ..Default::default() };
        assert_eq!(cfg.connection_string(), "postgres://u:p@h/db");
    }
}
