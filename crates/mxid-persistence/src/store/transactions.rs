//! Recibos de transacciones de application services.
//!
//! La clave compuesta (localpart, transaction_id) es la guarda de
//! idempotencia: reinsertar la misma clave falla con
//! `StorageError::UniqueViolation` y así se detecta un reenvío.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use log::debug;
use mxid_domain::AsTransaction;

use super::rows::{to_millis, AsTransactionRow};
use super::{at_most_one, SqlStorage};
use crate::connection::with_connection;
use crate::error::{expect_rows, PersistenceError};
use crate::schema::as_txn;

pub trait TransactionStore {
    fn insert_transaction_result(&self,
                                 localpart: &str,
                                 txn_id: &str,
                                 completed_at: DateTime<Utc>,
                                 result: &str)
                                 -> Result<(), PersistenceError>;
    fn get_transaction_result(&self, localpart: &str, txn_id: &str) -> Result<Option<AsTransaction>, PersistenceError>;
}

impl TransactionStore for SqlStorage {
    fn insert_transaction_result(&self,
                                 localpart: &str,
                                 txn_id: &str,
                                 completed_at: DateTime<Utc>,
                                 result: &str)
                                 -> Result<(), PersistenceError> {
        debug!("insert_transaction_result:start localpart={localpart} txn={txn_id}");
        let row = AsTransactionRow { localpart: localpart.to_string(),
                                     transaction_id: txn_id.to_string(),
                                     completed_at: to_millis(&completed_at),
                                     result: result.to_string() };
        let created = with_connection!(&self.source, |conn| {
            diesel::insert_into(as_txn::table).values(&row).execute(conn)?
        });
        expect_rows("insert transaction result", 1, created)?;
        Ok(())
    }

    fn get_transaction_result(&self, localpart: &str, txn_id: &str) -> Result<Option<AsTransaction>, PersistenceError> {
        let rows: Vec<AsTransactionRow> = with_connection!(&self.source, |conn| {
            as_txn::table.filter(as_txn::localpart.eq(localpart))
                         .filter(as_txn::transaction_id.eq(txn_id))
                         .load::<AsTransactionRow>(conn)?
        });
        let row = at_most_one(rows, || format!("Transaction {txn_id} for localpart {localpart}"))?;
        Ok(row.map(AsTransactionRow::into_domain).transpose()?)
    }
}
