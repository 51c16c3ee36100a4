use std::sync::Arc;

use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::accounts::{
    error::AccountError,
    hooks::{hash_password_if_changed, PendingWrite},
    password::PasswordScheme,
    record::{normalize_email, AccountPatch, AccountRecord, LoadedAccount, NewAccount},
    repo::AccountStore,
    repo_types::Account,
};

/// Mediates every account write and password check.
///
/// Built once at startup and shared behind an `Arc`.
pub struct AccountModel {
    store: Arc<dyn AccountStore>,
    passwords: Arc<dyn PasswordScheme>,
}

impl AccountModel {
    pub fn new(store: Arc<dyn AccountStore>, passwords: Arc<dyn PasswordScheme>) -> Self {
        Self { store, passwords }
    }

    /// Creates an account, hashing its password before the insert.
    #[instrument(skip(self, new), fields(email = %new.email))]
    pub async fn create(&self, new: NewAccount) -> Result<LoadedAccount, AccountError> {
        let record = AccountRecord::from(new).normalized()?;
        let record = hash_password_if_changed(PendingWrite::insert(record), &*self.passwords).await?;
        let account = self.store.insert(&record).await.map_err(|e| {
            if e.is_constraint_violation() {
                warn!(email = %record.email, "email already registered");
            }
            e
        })?;
        info!(account_id = %account.id, email = %account.email, "account created");
        Ok(LoadedAccount::from_store(account))
    }

    /// Writes back the fields edited since loading, to the id the account was
    /// loaded with. The password is rehashed only if it was reassigned. On
    /// error `account` is left untouched.
    #[instrument(skip(self, account), fields(account_id = %account.persisted_id()))]
    pub async fn save(&self, account: &mut LoadedAccount) -> Result<(), AccountError> {
        let persisted = account.persisted();
        let record = AccountRecord::from(&**account).normalized()?;
        let write = PendingWrite::update(record, &persisted.password);
        let rehashed = write.password_changed;
        let record = hash_password_if_changed(write, &*self.passwords).await?;
        let patch = AccountPatch::between(persisted, record, rehashed);
        let stored = self.store.update(persisted.id, &patch).await?;
        info!(account_id = %stored.id, password_changed = rehashed, "account saved");
        *account = LoadedAccount::from_store(stored);
        Ok(())
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<LoadedAccount>, AccountError> {
        Ok(self.store.find_by_id(id).await?.map(LoadedAccount::from_store))
    }

    /// Looks up by email, normalized the same way writes are.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<LoadedAccount>, AccountError> {
        let email = normalize_email(email);
        Ok(self
            .store
            .find_by_email(&email)
            .await?
            .map(LoadedAccount::from_store))
    }

    /// Compares a candidate plaintext with the account's stored digest.
    pub async fn verify_password(
        &self,
        account: &Account,
        candidate: &str,
    ) -> Result<bool, AccountError> {
        let ok = self.passwords.verify(candidate, &account.password).await?;
        if !ok {
            warn!(account_id = %account.id, "password mismatch");
        }
        Ok(ok)
    }
}
