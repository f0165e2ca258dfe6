//! Invitaciones pendientes e historial de invitaciones resueltas.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use log::debug;
use mxid_domain::{HistoricalInvite, ThreePidInvite};
use uuid::Uuid;

use super::rows::{HistoricalInviteRow, InviteRow};
use super::SqlStorage;
use crate::connection::with_connection;
use crate::error::{expect_rows, PersistenceError};
use crate::schema::{invite_3pid, invite_3pid_history};

pub trait InviteStore {
    fn invites(&self) -> Result<Vec<ThreePidInvite>, PersistenceError>;
    fn find_invite(&self, id: &str) -> Result<Option<ThreePidInvite>, PersistenceError>;
    fn insert_invite(&self, invite: &ThreePidInvite) -> Result<(), PersistenceError>;
    fn delete_invite(&self, id: &str) -> Result<(), PersistenceError>;
    /// Guarda la copia histórica de una invitación resuelta y devuelve el id
    /// aleatorio que quedó asignado.
    fn insert_historical_invite(&self,
                                invite: &ThreePidInvite,
                                resolved_to: &str,
                                resolved_at: DateTime<Utc>,
                                could_publish: bool)
                                -> Result<String, PersistenceError>;
    fn historical_invites(&self) -> Result<Vec<HistoricalInvite>, PersistenceError>;
}

impl InviteStore for SqlStorage {
    fn invites(&self) -> Result<Vec<ThreePidInvite>, PersistenceError> {
        let rows: Vec<InviteRow> = with_connection!(&self.source, |conn| {
            invite_3pid::table.order(invite_3pid::id.asc()).load::<InviteRow>(conn)?
        });
        debug!("invites:done count={}", rows.len());
        Ok(rows.into_iter().map(InviteRow::into_domain).collect::<Result<_, _>>()?)
    }

    fn find_invite(&self, id: &str) -> Result<Option<ThreePidInvite>, PersistenceError> {
        let row: Option<InviteRow> = with_connection!(&self.source, |conn| {
            invite_3pid::table.find(id).first::<InviteRow>(conn).optional()?
        });
        Ok(row.map(InviteRow::into_domain).transpose()?)
    }

    fn insert_invite(&self, invite: &ThreePidInvite) -> Result<(), PersistenceError> {
        debug!("insert_invite:start id={}", invite.id);
        let row = InviteRow::from_domain(invite)?;
        let updated = with_connection!(&self.source, |conn| {
            diesel::insert_into(invite_3pid::table).values(&row).execute(conn)?
        });
        expect_rows("insert invite", 1, updated)?;
        Ok(())
    }

    fn delete_invite(&self, id: &str) -> Result<(), PersistenceError> {
        debug!("delete_invite:start id={id}");
        let updated = with_connection!(&self.source, |conn| {
            diesel::delete(invite_3pid::table.find(id)).execute(conn)?
        });
        expect_rows("delete invite", 1, updated)?;
        Ok(())
    }

    // Dos sentencias sin transacción: se inserta con el id de la invitación y
    // luego se reetiqueta. Si el proceso cae entre ambas, la fila queda con el
    // id original; quien lea el historial debe tolerarlo.
    fn insert_historical_invite(&self,
                                invite: &ThreePidInvite,
                                resolved_to: &str,
                                resolved_at: DateTime<Utc>,
                                could_publish: bool)
                                -> Result<String, PersistenceError> {
        let historical = HistoricalInvite::from_invite(invite, resolved_to, resolved_at, could_publish);
        let row = HistoricalInviteRow::from_domain(&historical)?;
        let new_id = Uuid::new_v4().simple().to_string();
        with_connection!(&self.source, |conn| {
            let created = diesel::insert_into(invite_3pid_history::table).values(&row).execute(conn)?;
            expect_rows("insert historical invite", 1, created)?;
            let updated = diesel::update(invite_3pid_history::table.find(&row.id))
                .set(invite_3pid_history::id.eq(&new_id))
                .execute(conn)?;
            expect_rows("relabel historical invite", 1, updated)?;
        });
        debug!("insert_historical_invite:done invite={} id={new_id}", invite.id);
        Ok(new_id)
    }

    fn historical_invites(&self) -> Result<Vec<HistoricalInvite>, PersistenceError> {
        let rows: Vec<HistoricalInviteRow> = with_connection!(&self.source, |conn| {
            invite_3pid_history::table.order(invite_3pid_history::resolved_at.asc())
                                      .load::<HistoricalInviteRow>(conn)?
        });
        Ok(rows.into_iter().map(HistoricalInviteRow::into_domain).collect::<Result<_, _>>()?)
    }
}
