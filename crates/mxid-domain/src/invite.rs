//! Invitaciones 3PID pendientes y su historial una vez resueltas.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::time::truncate_millis;

/// Invitación pendiente a una sala dirigida a un 3PID todavía sin cuenta.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreePidInvite {
    pub id: String,
    pub room_id: String,
    pub sender: String,
    pub medium: String,
    pub address: String,
    pub token: String,
    /// Propiedades arbitrarias de la invitación (display name, claves
    /// públicas, ...). Se persisten como JSON.
    pub properties: BTreeMap<String, String>,
}

/// Copia de una invitación resuelta. El `id` lo asigna el almacenamiento al
/// insertar; no coincide con el de la invitación original.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoricalInvite {
    pub id: String,
    pub room_id: String,
    pub sender: String,
    pub medium: String,
    pub address: String,
    pub token: String,
    pub properties: BTreeMap<String, String>,
    pub resolved_to: String,
    pub resolved_at: DateTime<Utc>,
    pub could_publish: bool,
}

impl HistoricalInvite {
    pub fn from_invite(invite: &ThreePidInvite, resolved_to: &str, resolved_at: DateTime<Utc>, could_publish: bool) -> Self {
        HistoricalInvite {
            id: invite.id.clone(),
            room_id: invite.room_id.clone(),
            sender: invite.sender.clone(),
            medium: invite.medium.clone(),
            address: invite.address.clone(),
            token: invite.token.clone(),
            properties: invite.properties.clone(),
            resolved_to: resolved_to.to_string(),
            resolved_at: truncate_millis(resolved_at),
            could_publish,
        }
    }
}
