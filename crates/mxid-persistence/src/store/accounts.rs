use diesel::prelude::*;
use log::debug;
use mxid_domain::Account;

use super::rows::AccountRow;
use super::SqlStorage;
use crate::connection::with_connection;
use crate::error::{expect_rows, PersistenceError};
use crate::schema::account_token;

/// Tokens de acceso.
pub trait AccountStore {
    fn insert_token(&self, account: &Account) -> Result<(), PersistenceError>;
    fn find_account(&self, token: &str) -> Result<Option<Account>, PersistenceError>;
    fn delete_token(&self, token: &str) -> Result<(), PersistenceError>;
}

impl AccountStore for SqlStorage {
    fn insert_token(&self, account: &Account) -> Result<(), PersistenceError> {
        debug!("insert_token:start user={}", account.user_id);
        let row = AccountRow::from_domain(account);
        let created = with_connection!(&self.source, |conn| {
            diesel::insert_into(account_token::table).values(&row).execute(conn)?
        });
        expect_rows("insert token", 1, created)?;
        Ok(())
    }

    fn find_account(&self, token: &str) -> Result<Option<Account>, PersistenceError> {
        let row: Option<AccountRow> = with_connection!(&self.source, |conn| {
            account_token::table.find(token).first::<AccountRow>(conn).optional()?
        });
        Ok(row.map(AccountRow::into_domain).transpose()?)
    }

    fn delete_token(&self, token: &str) -> Result<(), PersistenceError> {
        let deleted = with_connection!(&self.source, |conn| {
            diesel::delete(account_token::table.find(token)).execute(conn)?
        });
        expect_rows("delete token", 1, deleted)?;
        Ok(())
    }
}
