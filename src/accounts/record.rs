use std::ops::{Deref, DerefMut};

use serde::Deserialize;
use uuid::Uuid;

use crate::accounts::{
    error::AccountError,
    repo_types::{Account, Address, DEFAULT_ROLE},
};

/// Input for creating an account. Only email and password are required.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAccount {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub roles: Option<Vec<String>>,
    #[serde(default)]
    pub profile_picture: Option<String>,
    #[serde(default)]
    pub address: Option<Address>,
}

impl NewAccount {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            ..Self::default()
        }
    }
}

/// Field values handed to the store on insert or update.
///
/// `password` holds plaintext until the pre-write step has run and a digest
/// afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRecord {
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub roles: Vec<String>,
    pub profile_picture: Option<String>,
    pub address: Option<Address>,
}

/// Lowercased, trimmed email as stored and looked up.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn trim_owned(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string())
}

impl AccountRecord {
    /// Applies field setters and defaults, then checks required fields.
    pub fn normalized(self) -> Result<Self, AccountError> {
        let email = normalize_email(&self.email);
        if email.is_empty() {
            return Err(AccountError::MissingField("email"));
        }
        if self.password.is_empty() {
            return Err(AccountError::MissingField("password"));
        }
        let roles = if self.roles.is_empty() {
            vec![DEFAULT_ROLE.to_string()]
        } else {
            self.roles
        };
        Ok(Self {
            email,
            password: self.password,
            first_name: trim_owned(self.first_name),
            last_name: trim_owned(self.last_name),
            roles,
            profile_picture: self.profile_picture,
            address: self.address,
        })
    }
}

impl From<NewAccount> for AccountRecord {
    fn from(new: NewAccount) -> Self {
        Self {
            email: new.email,
            password: new.password,
            first_name: new.first_name,
            last_name: new.last_name,
            roles: new.roles.unwrap_or_default(),
            profile_picture: new.profile_picture,
            address: new.address,
        }
    }
}

impl From<&Account> for AccountRecord {
    fn from(account: &Account) -> Self {
        Self {
            email: account.email.clone(),
            password: account.password.clone(),
            first_name: account.first_name.clone(),
            last_name: account.last_name.clone(),
            roles: account.roles.clone(),
            profile_picture: account.profile_picture.clone(),
            address: account.address.clone(),
        }
    }
}

/// Columns a save actually changes. `None` leaves the stored value alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountPatch {
    pub email: Option<String>,
    /// Digest; present only when the password was reassigned.
    pub password: Option<String>,
    pub first_name: Option<Option<String>>,
    pub last_name: Option<Option<String>>,
    pub roles: Option<Vec<String>>,
    pub profile_picture: Option<Option<String>>,
    pub address: Option<Option<Address>>,
}

fn changed<T: PartialEq>(persisted: &T, candidate: T) -> Option<T> {
    (*persisted != candidate).then_some(candidate)
}

impl AccountPatch {
    /// Diffs a prepared record against the state it was loaded from.
    pub fn between(persisted: &Account, record: AccountRecord, password_changed: bool) -> Self {
        Self {
            email: changed(&persisted.email, record.email),
            password: password_changed.then_some(record.password),
            first_name: changed(&persisted.first_name, record.first_name),
            last_name: changed(&persisted.last_name, record.last_name),
            roles: changed(&persisted.roles, record.roles),
            profile_picture: changed(&persisted.profile_picture, record.profile_picture),
            address: changed(&persisted.address, record.address),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// An account read from the store. Keeps the state it was loaded with, so a
/// save targets the loaded id and writes only the fields edited since.
#[derive(Debug, Clone)]
pub struct LoadedAccount {
    account: Account,
    persisted: Account,
}

impl LoadedAccount {
    pub(crate) fn from_store(account: Account) -> Self {
        Self {
            persisted: account.clone(),
            account,
        }
    }

    /// Replaces the password with a new plaintext; hashed on the next save.
    pub fn set_password(&mut self, plaintext: impl Into<String>) {
        self.account.password = plaintext.into();
    }

    pub fn password_modified(&self) -> bool {
        self.account.password != self.persisted.password
    }

    /// Id the account was loaded with. Edits to `id` are ignored on save.
    pub fn persisted_id(&self) -> Uuid {
        self.persisted.id
    }

    pub(crate) fn persisted(&self) -> &Account {
        &self.persisted
    }

    pub fn into_inner(self) -> Account {
        self.account
    }
}

impl Deref for LoadedAccount {
    type Target = Account;

    fn deref(&self) -> &Account {
        &self.account
    }
}

impl DerefMut for LoadedAccount {
    fn deref_mut(&mut self) -> &mut Account {
        &mut self.account
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_email_and_names() {
        let record = AccountRecord::from(NewAccount {
            first_name: Some("  Ada ".into()),
            last_name: Some("Lovelace\n".into()),
            ..NewAccount::new("  Foo@X.com ", "secret1")
        })
        .normalized()
        .unwrap();
        assert_eq!(record.email, "foo@x.com");
        assert_eq!(record.first_name.as_deref(), Some("Ada"));
        assert_eq!(record.last_name.as_deref(), Some("Lovelace"));
        assert_eq!(record.password, "secret1");
    }

    #[test]
    fn missing_roles_default_to_user() {
        let record = AccountRecord::from(NewAccount::new("a@x.com", "pw"))
            .normalized()
            .unwrap();
        assert_eq!(record.roles, vec!["user".to_string()]);

        let empty = AccountRecord::from(NewAccount {
            roles: Some(vec![]),
            ..NewAccount::new("a@x.com", "pw")
        })
        .normalized()
        .unwrap();
        assert_eq!(empty.roles, vec!["user".to_string()]);
    }

    #[test]
    fn explicit_roles_are_kept_in_order() {
        let record = AccountRecord::from(NewAccount {
            roles: Some(vec!["admin".into(), "user".into()]),
            ..NewAccount::new("a@x.com", "pw")
        })
        .normalized()
        .unwrap();
        assert_eq!(record.roles, vec!["admin".to_string(), "user".to_string()]);
    }

    #[test]
    fn rejects_missing_required_fields() {
        let err = AccountRecord::from(NewAccount::new("   ", "pw"))
            .normalized()
            .unwrap_err();
        assert!(matches!(err, AccountError::MissingField("email")));

        let err = AccountRecord::from(NewAccount::new("a@x.com", ""))
            .normalized()
            .unwrap_err();
        assert!(matches!(err, AccountError::MissingField("password")));
    }

    #[test]
    fn new_account_deserializes_from_camel_case() {
        let new: NewAccount = serde_json::from_str(
            r#"{"email":"a@x.com","password":"pw","firstName":"Ada","address":{"zipCode":"1"}}"#,
        )
        .unwrap();
        assert_eq!(new.first_name.as_deref(), Some("Ada"));
        assert!(new.roles.is_none());
        assert_eq!(new.address.unwrap().zip_code.as_deref(), Some("1"));
    }

    fn stored(record: AccountRecord) -> Account {
        let now = time::OffsetDateTime::now_utc();
        Account {
            id: Uuid::new_v4(),
            email: record.email,
            password: record.password,
            first_name: record.first_name,
            last_name: record.last_name,
            roles: record.roles,
            profile_picture: record.profile_picture,
            address: record.address,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn patch_carries_only_edited_fields() {
        let base = AccountRecord::from(NewAccount {
            last_name: Some("Lovelace".into()),
            ..NewAccount::new("u1@x.com", "digest")
        })
        .normalized()
        .unwrap();
        let persisted = stored(base.clone());

        let mut edited = base.clone();
        edited.first_name = Some("Ada".into());
        edited.last_name = None;
        let patch = AccountPatch::between(&persisted, edited, false);
        assert_eq!(patch.first_name, Some(Some("Ada".to_string())));
        assert_eq!(patch.last_name, Some(None));
        assert!(patch.email.is_none());
        assert!(patch.password.is_none());
        assert!(patch.roles.is_none());

        assert!(AccountPatch::between(&persisted, base, false).is_empty());
    }

    #[test]
    fn patch_includes_password_only_when_changed() {
        let base = AccountRecord::from(NewAccount::new("u1@x.com", "digest"))
            .normalized()
            .unwrap();
        let persisted = stored(base.clone());
        let mut rehashed = base;
        rehashed.password = "new-digest".into();
        let patch = AccountPatch::between(&persisted, rehashed, true);
        assert_eq!(patch.password.as_deref(), Some("new-digest"));
    }

    #[test]
    fn loaded_account_remembers_its_id() {
        let persisted = stored(
            AccountRecord::from(NewAccount::new("u1@x.com", "digest"))
                .normalized()
                .unwrap(),
        );
        let mut loaded = LoadedAccount::from_store(persisted.clone());
        loaded.id = Uuid::new_v4();
        assert_eq!(loaded.persisted_id(), persisted.id);
        assert!(!loaded.password_modified());
        loaded.set_password("secret2");
        assert!(loaded.password_modified());
    }
}
