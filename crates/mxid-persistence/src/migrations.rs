//! Runner de migraciones con ledger propio (`changelog`).
//!
//! En cada arranque:
//! 1. se crean (si faltan) todas las tablas base;
//! 2. se recorre la lista ordenada de migraciones y se aplica cada una cuyo
//!    nombre no esté en el ledger. El cuerpo y el registro en el ledger se
//!    ejecutan en la misma transacción.
//!
//! Como la decisión es por nombre y no por número de versión, una instalación
//! que salta varias versiones aplica las migraciones pendientes igual que si
//! las hubiera recibido una a una. La lista sólo crece por el final.
//!
//! Cualquier error es fatal para el arranque; no hay rollback automático de
//! pasos ya registrados.

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::result::QueryResult;
use log::{debug, info};
use serde::Serialize;

use crate::config::BackendKind;
use crate::connection::{with_connection, ConnectionSource};
use crate::ddl;
use crate::error::{PersistenceError, StorageError};
use crate::schema::changelog;

/// Cuerpo de una migración. Recibe el backend activo para decidir qué hacer;
/// un cuerpo puede no hacer nada en un backend y aun así quedar registrado.
pub type MigrationBody = fn(&mut dyn SimpleConnection, BackendKind) -> QueryResult<()>;

#[derive(Clone, Copy)]
pub struct Migration {
    pub name: &'static str,
    pub description: &'static str,
    pub body: MigrationBody,
}

pub const FIX_ACCEPTED_DAO: &str = "2019_12_09__2254__fix_accepted_dao";
pub const FIX_HASH_DAO_UNIQUE_INDEX: &str = "2020_03_22__1153__fix_hash_dao_unique_index";
pub const CHANGE_TYPE_TO_TEXT_INVITE: &str = "2020_04_21__2338__change_type_table_invites";
pub const CHANGE_TYPE_TO_TEXT_INVITE_HISTORY: &str = "2020_10_26__2200__change_type_table_invite_history";

/// Lista de migraciones del producto, en orden de aplicación.
pub fn default_migrations() -> Vec<Migration> {
    vec![Migration { name: FIX_ACCEPTED_DAO,
                     description: "Recreate the accepted table.",
                     body: recreate_accepted },
         Migration { name: FIX_HASH_DAO_UNIQUE_INDEX,
                     description: "Add the id and migrate the unique index.",
                     body: recreate_hashes },
         Migration { name: CHANGE_TYPE_TO_TEXT_INVITE,
                     description: "Modify column type to text.",
                     body: widen_invites },
         Migration { name: CHANGE_TYPE_TO_TEXT_INVITE_HISTORY,
                     description: "Modify column type to text.",
                     body: widen_invite_history },]
}

fn recreate_accepted(conn: &mut dyn SimpleConnection, backend: BackendKind) -> QueryResult<()> {
    conn.batch_execute("DROP TABLE IF EXISTS accepted")?;
    conn.batch_execute(&ddl::accepted(backend))
}

fn recreate_hashes(conn: &mut dyn SimpleConnection, backend: BackendKind) -> QueryResult<()> {
    conn.batch_execute("DROP TABLE IF EXISTS hashes")?;
    for stmt in ddl::hashes(backend) {
        conn.batch_execute(&stmt)?;
    }
    Ok(())
}

fn widen_invites(conn: &mut dyn SimpleConnection, backend: BackendKind) -> QueryResult<()> {
    if backend == BackendKind::Postgresql {
        for stmt in ddl::widen_to_text("invite_3pid", ddl::INVITE_STRING_COLUMNS) {
            conn.batch_execute(&stmt)?;
        }
    }
    Ok(())
}

fn widen_invite_history(conn: &mut dyn SimpleConnection, backend: BackendKind) -> QueryResult<()> {
    if backend == BackendKind::Postgresql {
        for stmt in ddl::widen_to_text("invite_3pid_history", ddl::INVITE_HISTORY_STRING_COLUMNS) {
            conn.batch_execute(&stmt)?;
        }
    }
    Ok(())
}

/// Entrada del ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangelogEntry {
    pub name: String,
    pub applied_at: chrono::DateTime<chrono::Utc>,
    pub description: String,
}

#[derive(Queryable, Debug)]
struct ChangelogRow {
    id: String,
    created_at: i64,
    comment: String,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = changelog)]
struct NewChangelogRow<'a> {
    id: &'a str,
    created_at: i64,
    comment: &'a str,
}

/// Resultado de una corrida: qué migraciones se aplicaron y cuáles ya
/// estaban registradas.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    pub applied: Vec<String>,
    pub skipped: Vec<String>,
}

pub struct SchemaMigrator {
    migrations: Vec<Migration>,
}

impl SchemaMigrator {
    pub fn new(migrations: Vec<Migration>) -> Self {
        Self { migrations }
    }

    pub fn migrations(&self) -> &[Migration] {
        &self.migrations
    }

    /// Crea las tablas base y aplica las migraciones pendientes.
    pub fn run(&self, source: &ConnectionSource) -> Result<MigrationReport, PersistenceError> {
        let backend = source.backend();
        with_connection!(source, |conn| {
            for (table, stmts) in ddl::base_tables(backend) {
                info!("Create the table if absent: {table}");
                for stmt in stmts {
                    conn.batch_execute(&stmt)
                        .map_err(|e| PersistenceError::Migration { step: format!("create table {table}"),
                                                                   source: e.into() })?;
                }
            }
            let mut report = MigrationReport::default();
            for migration in &self.migrations {
                let applied = conn.transaction::<bool, diesel::result::Error, _>(|tx| {
                                      let found = changelog::table.find(migration.name)
                                                                  .select(changelog::id)
                                                                  .first::<String>(tx)
                                                                  .optional()?;
                                      if found.is_some() {
                                          return Ok(false);
                                      }
                                      info!("Migration: {}", migration.name);
                                      (migration.body)(tx, backend)?;
                                      let row = NewChangelogRow { id: migration.name,
                                                                  created_at: mxid_domain::time::now().timestamp_millis(),
                                                                  comment: migration.description };
                                      diesel::insert_into(changelog::table).values(&row).execute(tx)?;
                                      Ok(true)
                                  })
                                  .map_err(|e| PersistenceError::Migration { step: migration.name.to_string(),
                                                                             source: e.into() })?;
                if applied {
                    report.applied.push(migration.name.to_string());
                } else {
                    debug!("Migration already applied: {}", migration.name);
                    report.skipped.push(migration.name.to_string());
                }
            }
            Ok(report)
        })
    }

    /// Contenido del ledger ordenado por nombre.
    pub fn changelog(source: &ConnectionSource) -> Result<Vec<ChangelogEntry>, PersistenceError> {
        let rows: Vec<ChangelogRow> = with_connection!(source, |conn| {
            changelog::table.order(changelog::id.asc()).load(conn)?
        });
        rows.into_iter()
            .map(|r| {
                let applied_at = mxid_domain::time::from_millis(r.created_at).ok_or_else(|| {
                                     StorageError::Integrity(format!("changelog {}: invalid timestamp {}",
                                                                     r.id, r.created_at))
                                 })?;
                Ok(ChangelogEntry { name: r.id,
                                    applied_at,
                                    description: r.comment })
            })
            .collect()
    }
}

impl Default for SchemaMigrator {
    fn default() -> Self {
        Self::new(default_migrations())
    }
}
