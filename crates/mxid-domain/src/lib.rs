// mxid-domain library entry point
//! Registros de dominio del servicio de identidad: invitaciones, sesiones de
//! validación, transacciones de application services, tokens, políticas
//! aceptadas y mapeos de hashes. Son datos planos: no conocen el backend que
//! los persiste.
pub mod account;
pub mod error;
pub mod hashing;
pub mod invite;
pub mod policy;
pub mod session;
pub mod threepid;
pub mod time;
pub mod transaction;

pub use account::Account;
pub use error::DomainError;
pub use hashing::lookup_hash;
pub use invite::{HistoricalInvite, ThreePidInvite};
pub use policy::{same_policy_url, AcceptedPolicy, PolicyObject, TermObject};
pub use session::ThreePidSession;
pub use threepid::{ThreePid, ThreePidMapping};
pub use transaction::AsTransaction;
