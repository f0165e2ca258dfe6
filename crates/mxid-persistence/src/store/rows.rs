//! Filas Diesel y su mapeo explícito desde/hacia los registros de dominio.
//! El orden de los campos de cada `Queryable` sigue el de `schema`.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use mxid_domain::{Account, AcceptedPolicy, AsTransaction, HistoricalInvite, ThreePid, ThreePidInvite, ThreePidMapping,
                  ThreePidSession};
use std::collections::BTreeMap;

use crate::error::StorageError;
use crate::schema::{accepted, account_token, as_txn, hashes, invite_3pid, invite_3pid_history, session_3pid};

// Descarta lo que esté por debajo del milisegundo.
pub(crate) fn to_millis(ts: &DateTime<Utc>) -> i64 {
    ts.timestamp_millis()
}

pub(crate) fn from_millis(table: &'static str, column: &'static str, ms: i64) -> Result<DateTime<Utc>, StorageError> {
    mxid_domain::time::from_millis(ms).ok_or_else(|| {
                                          StorageError::Integrity(format!("{table}.{column}: invalid timestamp {ms}"))
                                      })
}

fn encode_properties(props: &BTreeMap<String, String>) -> Result<String, StorageError> {
    serde_json::to_string(props).map_err(|e| StorageError::Unknown(format!("properties: {e}")))
}

fn decode_properties(table: &'static str, raw: &str) -> Result<BTreeMap<String, String>, StorageError> {
    serde_json::from_str(raw).map_err(|e| StorageError::Integrity(format!("{table}.properties: invalid JSON: {e}")))
}

#[derive(Queryable, Insertable, Debug)]
#[diesel(table_name = invite_3pid)]
pub(crate) struct InviteRow {
    pub id: String,
    pub room_id: String,
    pub sender: String,
    pub medium: String,
    pub address: String,
    pub token: String,
    pub properties: String,
}

impl InviteRow {
    pub fn from_domain(inv: &ThreePidInvite) -> Result<Self, StorageError> {
        Ok(Self { id: inv.id.clone(),
                  room_id: inv.room_id.clone(),
                  sender: inv.sender.clone(),
                  medium: inv.medium.clone(),
                  address: inv.address.clone(),
                  token: inv.token.clone(),
                  properties: encode_properties(&inv.properties)? })
    }

    pub fn into_domain(self) -> Result<ThreePidInvite, StorageError> {
        let properties = decode_properties("invite_3pid", &self.properties)?;
        Ok(ThreePidInvite { id: self.id,
                            room_id: self.room_id,
                            sender: self.sender,
                            medium: self.medium,
                            address: self.address,
                            token: self.token,
                            properties })
    }
}

#[derive(Queryable, Insertable, Debug)]
#[diesel(table_name = invite_3pid_history)]
pub(crate) struct HistoricalInviteRow {
    pub id: String,
    pub room_id: String,
    pub sender: String,
    pub medium: String,
    pub address: String,
    pub token: String,
    pub properties: String,
    pub resolved_to: String,
    pub resolved_at: i64,
    pub could_publish: bool,
}

impl HistoricalInviteRow {
    pub fn from_domain(h: &HistoricalInvite) -> Result<Self, StorageError> {
        Ok(Self { id: h.id.clone(),
                  room_id: h.room_id.clone(),
                  sender: h.sender.clone(),
                  medium: h.medium.clone(),
                  address: h.address.clone(),
                  token: h.token.clone(),
                  properties: encode_properties(&h.properties)?,
                  resolved_to: h.resolved_to.clone(),
                  resolved_at: to_millis(&h.resolved_at),
                  could_publish: h.could_publish })
    }

    pub fn into_domain(self) -> Result<HistoricalInvite, StorageError> {
        let properties = decode_properties("invite_3pid_history", &self.properties)?;
        let resolved_at = from_millis("invite_3pid_history", "resolved_at", self.resolved_at)?;
        Ok(HistoricalInvite { id: self.id,
                              room_id: self.room_id,
                              sender: self.sender,
                              medium: self.medium,
                              address: self.address,
                              token: self.token,
                              properties,
                              resolved_to: self.resolved_to,
                              resolved_at,
                              could_publish: self.could_publish })
    }
}

#[derive(Queryable, Insertable, AsChangeset, Debug)]
#[diesel(table_name = session_3pid, treat_none_as_null = true)]
pub(crate) struct SessionRow {
    pub id: String,
    pub server: String,
    pub medium: String,
    pub address: String,
    pub secret: String,
    pub attempt: i32,
    pub next_link: Option<String>,
    pub token: String,
    pub created_at: i64,
    pub validated: bool,
    pub validated_at: Option<i64>,
}

impl SessionRow {
    pub fn from_domain(s: &ThreePidSession) -> Self {
        Self { id: s.id.clone(),
               server: s.server.clone(),
               medium: s.three_pid.medium().to_string(),
               address: s.three_pid.address().to_string(),
               secret: s.secret.clone(),
               attempt: s.attempt,
               next_link: s.next_link.clone(),
               token: s.token.clone(),
               created_at: to_millis(&s.created_at),
               validated: s.validated,
               validated_at: s.validated_at.as_ref().map(to_millis) }
    }

    pub fn into_domain(self) -> Result<ThreePidSession, StorageError> {
        let three_pid = ThreePid::new(&self.medium, &self.address).map_err(|e| {
                                                                     StorageError::Integrity(format!("session_3pid {}: {e}",
                                                                                                     self.id))
                                                                 })?;
        let created_at = from_millis("session_3pid", "created_at", self.created_at)?;
        let validated_at = match self.validated_at {
            Some(ms) => Some(from_millis("session_3pid", "validated_at", ms)?),
            None => None,
        };
        Ok(ThreePidSession { id: self.id,
                             server: self.server,
                             three_pid,
                             secret: self.secret,
                             attempt: self.attempt,
                             next_link: self.next_link,
                             token: self.token,
                             created_at,
                             validated: self.validated,
                             validated_at })
    }
}

#[derive(Queryable, Insertable, Debug)]
#[diesel(table_name = as_txn)]
pub(crate) struct AsTransactionRow {
    pub localpart: String,
    pub transaction_id: String,
    pub completed_at: i64,
    pub result: String,
}

impl AsTransactionRow {
    pub fn into_domain(self) -> Result<AsTransaction, StorageError> {
        let completed_at = from_millis("as_txn", "completed_at", self.completed_at)?;
        Ok(AsTransaction { localpart: self.localpart,
                           transaction_id: self.transaction_id,
                           completed_at,
                           result: self.result })
    }
}

#[derive(Queryable, Insertable, Debug)]
#[diesel(table_name = account_token)]
pub(crate) struct AccountRow {
    pub token: String,
    pub token_type: String,
    pub user_id: String,
    pub created_at: i64,
    pub expires_after: Option<i64>,
}

impl AccountRow {
    pub fn from_domain(a: &Account) -> Self {
        Self { token: a.token.clone(),
               token_type: a.token_type.clone(),
               user_id: a.user_id.clone(),
               created_at: to_millis(&a.created_at),
               expires_after: a.expires_after }
    }

    pub fn into_domain(self) -> Result<Account, StorageError> {
        let created_at = from_millis("account_token", "created_at", self.created_at)?;
        Ok(Account { token: self.token,
                     token_type: self.token_type,
                     user_id: self.user_id,
                     created_at,
                     expires_after: self.expires_after })
    }
}

#[derive(Queryable, Debug)]
pub(crate) struct AcceptedRow {
    pub id: i64,
    pub url: String,
    pub user_id: String,
    pub accepted_at: i64,
}

impl AcceptedRow {
    pub fn into_domain(self) -> Result<AcceptedPolicy, StorageError> {
        let accepted_at = from_millis("accepted", "accepted_at", self.accepted_at)?;
        Ok(AcceptedPolicy { id: self.id,
                            user_id: self.user_id,
                            url: self.url,
                            accepted_at })
    }
}

#[derive(Insertable, Debug)]
#[diesel(table_name = accepted)]
pub(crate) struct NewAcceptedRow<'a> {
    pub url: &'a str,
    pub user_id: &'a str,
    pub accepted_at: i64,
}

#[derive(Queryable, Debug)]
pub(crate) struct HashRow {
    pub mxid: String,
    pub medium: String,
    pub address: String,
    pub hash: String,
}

impl HashRow {
    pub fn into_match(self) -> (String, ThreePidMapping) {
        (self.hash,
         ThreePidMapping { medium: self.medium,
                           address: self.address,
                           mxid: self.mxid })
    }
}

#[derive(Insertable, Debug)]
#[diesel(table_name = hashes)]
pub(crate) struct NewHashRow<'a> {
    pub mxid: &'a str,
    pub medium: &'a str,
    pub address: &'a str,
    pub hash: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_properties_json_is_integrity_fault() {
        let row = InviteRow { id: "i".into(),
                              room_id: "!r".into(),
                              sender: "@s".into(),
                              medium: "email".into(),
                              address: "a@b.c".into(),
                              token: "t".into(),
                              properties: "{not json".into() };
        assert!(matches!(row.into_domain(), Err(StorageError::Integrity(_))));
    }

    #[test]
    fn blank_session_medium_is_integrity_fault() {
        let row = SessionRow { id: "sid".into(),
                               server: "example.org".into(),
                               medium: "".into(),
                               address: "a@b.c".into(),
                               secret: "s".into(),
                               attempt: 1,
                               next_link: None,
                               token: "t".into(),
                               created_at: 0,
                               validated: false,
                               validated_at: None };
        assert!(matches!(row.into_domain(), Err(StorageError::Integrity(_))));
    }
}
