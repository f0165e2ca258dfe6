#![allow(dead_code)]

use chrono::{DateTime, Utc};
use mxid_domain::{ThreePid, ThreePidInvite, ThreePidSession};
use mxid_persistence::{PostgresqlConfig, SqlStorage, StorageConfig};
use std::collections::BTreeMap;

/// Almacenamiento SQLite en memoria ya migrado.
pub fn sqlite_storage() -> SqlStorage {
    SqlStorage::open(&StorageConfig::sqlite(":memory:")).expect("sqlite storage")
}

/// Configuración Postgres si DATABASE_URL está definido.
pub fn pg_config_from_env() -> Option<StorageConfig> {
    let url = std::env::var("DATABASE_URL").ok()?;
    Some(StorageConfig::postgresql(PostgresqlConfig { database: url,
                                                      pool: true,
                                                      max_connections_free: 2,
                                                      ..Default::default() }))
}

pub fn ts(ms: i64) -> DateTime<Utc> {
    mxid_domain::time::from_millis(ms).expect("valid millis")
}

pub fn sample_invite(id: &str) -> ThreePidInvite {
    let mut properties = BTreeMap::new();
    properties.insert("display_name".to_string(), "al...@example.org".to_string());
    properties.insert("public_key".to_string(), "ed25519:0:abcdef".to_string());
    ThreePidInvite { id: id.to_string(),
                     room_id: "!room:example.org".into(),
                     sender: "@bob:example.org".into(),
                     medium: "email".into(),
                     address: "alice@example.org".into(),
                     token: format!("token-{id}"),
                     properties }
}

pub fn sample_session(id: &str, address: &str, secret: &str) -> ThreePidSession {
    ThreePidSession { id: id.to_string(),
                      server: "example.org".into(),
                      three_pid: ThreePid::new("email", address).unwrap(),
                      secret: secret.to_string(),
                      attempt: 1,
                      next_link: Some("https://example.org/next".into()),
                      token: "123456".into(),
                      created_at: ts(1_600_000_000_123),
                      validated: false,
                      validated_at: None }
}
