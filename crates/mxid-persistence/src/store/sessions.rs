use diesel::prelude::*;
use log::debug;
use mxid_domain::{ThreePid, ThreePidSession};

use super::rows::SessionRow;
use super::{at_most_one, SqlStorage};
use crate::connection::with_connection;
use crate::error::{expect_rows, PersistenceError};
use crate::schema::session_3pid;

/// Sesiones de validación de 3PID.
pub trait SessionStore {
    fn get_session(&self, sid: &str) -> Result<Option<ThreePidSession>, PersistenceError>;
    /// Busca la sesión del par (3PID, secreto). Más de una fila es una falla
    /// de integridad.
    fn find_session(&self, tpid: &ThreePid, secret: &str) -> Result<Option<ThreePidSession>, PersistenceError>;
    fn insert_session(&self, session: &ThreePidSession) -> Result<(), PersistenceError>;
    /// Actualiza una sesión existente; nunca inserta.
    fn update_session(&self, session: &ThreePidSession) -> Result<(), PersistenceError>;
}

impl SessionStore for SqlStorage {
    fn get_session(&self, sid: &str) -> Result<Option<ThreePidSession>, PersistenceError> {
        let row: Option<SessionRow> = with_connection!(&self.source, |conn| {
            session_3pid::table.find(sid).first::<SessionRow>(conn).optional()?
        });
        Ok(row.map(SessionRow::into_domain).transpose()?)
    }

    fn find_session(&self, tpid: &ThreePid, secret: &str) -> Result<Option<ThreePidSession>, PersistenceError> {
        let rows: Vec<SessionRow> = with_connection!(&self.source, |conn| {
            session_3pid::table.filter(session_3pid::medium.eq(tpid.medium()))
                               .filter(session_3pid::address.eq(tpid.address()))
                               .filter(session_3pid::secret.eq(secret))
                               .load::<SessionRow>(conn)?
        });
        let row = at_most_one(rows, || format!("3PID Session {tpid}"))?;
        Ok(row.map(SessionRow::into_domain).transpose()?)
    }

    fn insert_session(&self, session: &ThreePidSession) -> Result<(), PersistenceError> {
        debug!("insert_session:start sid={}", session.id);
        let row = SessionRow::from_domain(session);
        let created = with_connection!(&self.source, |conn| {
            diesel::insert_into(session_3pid::table).values(&row).execute(conn)?
        });
        expect_rows("insert session", 1, created)?;
        Ok(())
    }

    fn update_session(&self, session: &ThreePidSession) -> Result<(), PersistenceError> {
        debug!("update_session:start sid={} attempt={}", session.id, session.attempt);
        let row = SessionRow::from_domain(session);
        let updated = with_connection!(&self.source, |conn| {
            diesel::update(session_3pid::table.find(&row.id)).set(&row).execute(conn)?
        });
        expect_rows("update session", 1, updated)?;
        Ok(())
    }
}
