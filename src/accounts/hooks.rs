use tracing::debug;

use crate::accounts::{error::AccountError, password::PasswordScheme, record::AccountRecord};

/// A candidate record on its way to the store.
#[derive(Debug, Clone)]
pub struct PendingWrite {
    pub record: AccountRecord,
    pub password_changed: bool,
}

impl PendingWrite {
    /// First write of an account: the password always counts as changed.
    pub fn insert(record: AccountRecord) -> Self {
        Self {
            record,
            password_changed: true,
        }
    }

    /// Later write, compared by value with the digest the account was loaded with.
    pub fn update(record: AccountRecord, persisted_password: &str) -> Self {
        let password_changed = record.password != persisted_password;
        Self {
            record,
            password_changed,
        }
    }
}

/// Pre-write step: hashes the password if it changed, otherwise passes the
/// record through untouched. A hashing failure aborts the write.
pub async fn hash_password_if_changed(
    write: PendingWrite,
    scheme: &dyn PasswordScheme,
) -> Result<AccountRecord, AccountError> {
    let PendingWrite {
        mut record,
        password_changed,
    } = write;
    if !password_changed {
        return Ok(record);
    }
    record.password = scheme.hash(&record.password).await?;
    debug!(email = %record.email, "password hashed before write");
    Ok(record)
}
