use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::accounts::{
    error::AccountError,
    record::{AccountPatch, AccountRecord},
    repo::AccountStore,
    repo_types::Account,
};

/// In-process store. The uniqueness check and the write share one lock.
#[derive(Default)]
pub struct MemoryAccountStore {
    accounts: RwLock<HashMap<Uuid, Account>>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn email_taken(accounts: &HashMap<Uuid, Account>, email: &str, except: Option<Uuid>) -> bool {
    accounts
        .values()
        .any(|a| a.email == email && Some(a.id) != except)
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn insert(&self, record: &AccountRecord) -> Result<Account, AccountError> {
        let mut accounts = self.accounts.write().await;
        if email_taken(&accounts, &record.email, None) {
            return Err(AccountError::DuplicateEmail(record.email.clone()));
        }
        let now = OffsetDateTime::now_utc();
        let account = Account {
            id: Uuid::new_v4(),
            email: record.email.clone(),
            password: record.password.clone(),
            first_name: record.first_name.clone(),
            last_name: record.last_name.clone(),
            roles: record.roles.clone(),
            profile_picture: record.profile_picture.clone(),
            address: record.address.clone(),
            created_at: now,
            updated_at: now,
        };
        accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn update(&self, id: Uuid, patch: &AccountPatch) -> Result<Account, AccountError> {
        let mut accounts = self.accounts.write().await;
        if !accounts.contains_key(&id) {
            return Err(AccountError::NotFound(id));
        }
        if let Some(email) = &patch.email {
            if email_taken(&accounts, email, Some(id)) {
                return Err(AccountError::DuplicateEmail(email.clone()));
            }
        }
        let account = accounts.get_mut(&id).ok_or(AccountError::NotFound(id))?;
        if let Some(email) = &patch.email {
            account.email = email.clone();
        }
        if let Some(password) = &patch.password {
            account.password = password.clone();
        }
        if let Some(first_name) = &patch.first_name {
            account.first_name = first_name.clone();
        }
        if let Some(last_name) = &patch.last_name {
            account.last_name = last_name.clone();
        }
        if let Some(roles) = &patch.roles {
            account.roles = roles.clone();
        }
        if let Some(profile_picture) = &patch.profile_picture {
            account.profile_picture = profile_picture.clone();
        }
        if let Some(address) = &patch.address {
            account.address = address.clone();
        }
        account.updated_at = OffsetDateTime::now_utc().max(account.updated_at);
        Ok(account.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, AccountError> {
        Ok(self.accounts.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AccountError> {
        Ok(self
            .accounts
            .read()
            .await
            .values()
            .find(|a| a.email == email)
            .cloned())
    }
}
