//! DDL por backend de cada tabla. Todas las sentencias son `IF NOT EXISTS`
//! para poder ejecutarse en cada arranque.
//!
//! Las tablas de invitaciones se crean con columnas acotadas
//! (`VARCHAR(255)`); las migraciones de ensanchado las pasan a `TEXT` en
//! PostgreSQL. En SQLite la longitud declarada no se aplica.

use crate::config::BackendKind;

pub const INVITE_STRING_COLUMNS: &[&str] = &["room_id", "id", "token", "sender", "medium", "address", "properties"];
pub const INVITE_HISTORY_STRING_COLUMNS: &[&str] =
    &["resolved_to", "id", "token", "sender", "medium", "address", "room_id", "properties"];

pub fn changelog(_backend: BackendKind) -> String {
    "CREATE TABLE IF NOT EXISTS changelog (
        id VARCHAR(255) NOT NULL PRIMARY KEY,
        created_at BIGINT NOT NULL,
        comment TEXT NOT NULL
    )".to_string()
}

pub fn invites(_backend: BackendKind) -> String {
    "CREATE TABLE IF NOT EXISTS invite_3pid (
        id VARCHAR(255) NOT NULL PRIMARY KEY,
        room_id VARCHAR(255) NOT NULL,
        sender VARCHAR(255) NOT NULL,
        medium VARCHAR(255) NOT NULL,
        address VARCHAR(255) NOT NULL,
        token VARCHAR(255) NOT NULL,
        properties VARCHAR(255) NOT NULL
    )".to_string()
}

pub fn invite_history(_backend: BackendKind) -> String {
    "CREATE TABLE IF NOT EXISTS invite_3pid_history (
        id VARCHAR(255) NOT NULL PRIMARY KEY,
        room_id VARCHAR(255) NOT NULL,
        sender VARCHAR(255) NOT NULL,
        medium VARCHAR(255) NOT NULL,
        address VARCHAR(255) NOT NULL,
        token VARCHAR(255) NOT NULL,
        properties VARCHAR(255) NOT NULL,
        resolved_to VARCHAR(255) NOT NULL,
        resolved_at BIGINT NOT NULL,
        could_publish BOOLEAN NOT NULL
    )".to_string()
}

pub fn sessions(_backend: BackendKind) -> String {
    "CREATE TABLE IF NOT EXISTS session_3pid (
        id TEXT NOT NULL PRIMARY KEY,
        server TEXT NOT NULL,
        medium TEXT NOT NULL,
        address TEXT NOT NULL,
        secret TEXT NOT NULL,
        attempt INTEGER NOT NULL,
        next_link TEXT,
        token TEXT NOT NULL,
        created_at BIGINT NOT NULL,
        validated BOOLEAN NOT NULL,
        validated_at BIGINT,
        UNIQUE (medium, address, secret)
    )".to_string()
}

pub fn as_transactions(_backend: BackendKind) -> String {
    "CREATE TABLE IF NOT EXISTS as_txn (
        localpart TEXT NOT NULL,
        transaction_id TEXT NOT NULL,
        completed_at BIGINT NOT NULL,
        result TEXT NOT NULL,
        PRIMARY KEY (localpart, transaction_id)
    )".to_string()
}

pub fn accounts(_backend: BackendKind) -> String {
    "CREATE TABLE IF NOT EXISTS account_token (
        token TEXT NOT NULL PRIMARY KEY,
        token_type TEXT NOT NULL,
        user_id TEXT NOT NULL,
        created_at BIGINT NOT NULL,
        expires_after BIGINT
    )".to_string()
}

pub fn accepted(backend: BackendKind) -> String {
    format!("CREATE TABLE IF NOT EXISTS accepted (
        {},
        url TEXT NOT NULL,
        user_id TEXT NOT NULL,
        accepted_at BIGINT NOT NULL,
        UNIQUE (user_id, url)
    )",
            backend.autoincrement_pk())
}

pub fn hashes(backend: BackendKind) -> Vec<String> {
    vec![format!("CREATE TABLE IF NOT EXISTS hashes (
        {},
        mxid TEXT NOT NULL,
        medium TEXT NOT NULL,
        address TEXT NOT NULL,
        hash TEXT NOT NULL,
        UNIQUE (mxid, medium, address)
    )",
                 backend.autoincrement_pk()),
         "CREATE INDEX IF NOT EXISTS idx_hashes_hash ON hashes (hash)".to_string()]
}

/// Todas las tablas base, en orden de creación (el ledger primero).
pub fn base_tables(backend: BackendKind) -> Vec<(&'static str, Vec<String>)> {
    vec![("changelog", vec![changelog(backend)]),
         ("invite_3pid", vec![invites(backend)]),
         ("invite_3pid_history", vec![invite_history(backend)]),
         ("session_3pid", vec![sessions(backend)]),
         ("as_txn", vec![as_transactions(backend)]),
         ("account_token", vec![accounts(backend)]),
         ("accepted", vec![accepted(backend)]),
         ("hashes", hashes(backend))]
}

/// Sentencias que ensanchan a `TEXT` las columnas indicadas (sólo PostgreSQL).
pub fn widen_to_text(table: &str, columns: &[&str]) -> Vec<String> {
    columns.iter()
           .map(|c| format!("ALTER TABLE {table} ALTER COLUMN {c} TYPE TEXT"))
           .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn autoincrement_differs_per_backend() {
        assert!(accepted(BackendKind::Sqlite).contains("INTEGER PRIMARY KEY AUTOINCREMENT"));
        assert!(accepted(BackendKind::Postgresql).contains("BIGSERIAL PRIMARY KEY"));
        assert!(hashes(BackendKind::Postgresql)[0].contains("BIGSERIAL"));
    }

    #[test]
    fn base_tables_start_with_changelog() {
        let tables = base_tables(BackendKind::Sqlite);
        assert_eq!(tables.first().map(|(n, _)| *n), Some("changelog"));
        assert_eq!(tables.len(), 8);
    }

    #[test]
    fn widen_statements() {
        let stmts = widen_to_text("invite_3pid", &["id", "token"]);
        assert_eq!(stmts,
                   vec!["ALTER TABLE invite_3pid ALTER COLUMN id TYPE TEXT".to_string(),
                        "ALTER TABLE invite_3pid ALTER COLUMN token TYPE TEXT".to_string()]);
    }
}
