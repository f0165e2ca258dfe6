//! Aceptación de políticas (términos de servicio).
//!
//! Cada operación resuelve primero el token a un usuario y luego opera sobre
//! sus aceptaciones, en dos checkouts separados del pool.

use diesel::prelude::*;
use log::debug;
use mxid_domain::{same_policy_url, AcceptedPolicy, PolicyObject};

use super::rows::{AcceptedRow, NewAcceptedRow};
use super::{AccountStore, SqlStorage};
use crate::connection::with_connection;
use crate::error::{expect_rows, PersistenceError, StorageError};
use crate::schema::accepted;

pub trait PolicyStore {
    /// Registra que el dueño del token aceptó `url`. Aceptar dos veces la misma
    /// URL (sin distinguir mayúsculas) no crea una segunda fila.
    fn accept_policy(&self, token: &str, url: &str) -> Result<(), PersistenceError>;
    /// Verdadero si alguna URL aceptada coincide con algún término de las
    /// políticas dadas.
    fn is_policy_accepted(&self, token: &str, policies: &[PolicyObject]) -> Result<bool, PersistenceError>;
    /// Borra todas las aceptaciones del usuario; devuelve cuántas había.
    fn delete_accepts(&self, token: &str) -> Result<usize, PersistenceError>;
}

impl SqlStorage {
    fn user_for_token(&self, token: &str) -> Result<String, PersistenceError> {
        self.find_account(token)?
            .map(|a| a.user_id)
            .ok_or(PersistenceError::InvalidCredentials)
    }

    /// Aceptaciones registradas del usuario.
    pub fn accepted_policies(&self, user_id: &str) -> Result<Vec<AcceptedPolicy>, PersistenceError> {
        let rows: Vec<AcceptedRow> = with_connection!(&self.source, |conn| {
            accepted::table.filter(accepted::user_id.eq(user_id))
                           .order(accepted::id.asc())
                           .load::<AcceptedRow>(conn)?
        });
        Ok(rows.into_iter().map(AcceptedRow::into_domain).collect::<Result<_, _>>()?)
    }
}

impl PolicyStore for SqlStorage {
    fn accept_policy(&self, token: &str, url: &str) -> Result<(), PersistenceError> {
        let user_id = self.user_for_token(token)?;
        if self.accepted_policies(&user_id)?.iter().any(|a| same_policy_url(&a.url, url)) {
            debug!("accept_policy: already accepted user={user_id} url={url}");
            return Ok(());
        }
        let row = NewAcceptedRow { url,
                                   user_id: &user_id,
                                   accepted_at: mxid_domain::time::now().timestamp_millis() };
        let inserted = with_connection!(&self.source, |conn| {
            diesel::insert_into(accepted::table).values(&row).execute(conn)
        });
        // Otro llamador pudo insertar la misma URL entre la lectura y el insert.
        match inserted.map_err(StorageError::from) {
            Ok(created) => expect_rows("accept policy", 1, created)?,
            Err(e) if e.is_duplicate_key() => {
                debug!("accept_policy: concurrent accept user={user_id} url={url}");
            }
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }

    fn is_policy_accepted(&self, token: &str, policies: &[PolicyObject]) -> Result<bool, PersistenceError> {
        let user_id = self.user_for_token(token)?;
        let accepted = self.accepted_policies(&user_id)?;
        Ok(accepted.iter().any(|a| policies.iter().any(|p| p.has_term_url(&a.url))))
    }

    fn delete_accepts(&self, token: &str) -> Result<usize, PersistenceError> {
        let user_id = self.user_for_token(token)?;
        let deleted = with_connection!(&self.source, |conn| {
            diesel::delete(accepted::table.filter(accepted::user_id.eq(&user_id))).execute(conn)?
        });
        debug!("delete_accepts:done user={user_id} deleted={deleted}");
        Ok(deleted)
    }
}
