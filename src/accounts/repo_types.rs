use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use time::OffsetDateTime;
use uuid::Uuid;

/// Role assigned when an account is written without any.
pub const DEFAULT_ROLE: &str = "user";

/// Postal address attached to an account. No field is validated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub country: Option<String>,
}

/// Account as held by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    /// Digest once persisted. Assign a plaintext here to change the password
    /// on the next save.
    #[serde(skip_serializing)]
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub roles: Vec<String>,
    pub profile_picture: Option<String>,
    pub address: Option<Address>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Row in the `users` table.
#[derive(Debug, FromRow)]
pub struct AccountRow {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub roles: Vec<String>,
    pub profile_picture: Option<String>,
    pub address: Option<Json<Address>>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl From<AccountRow> for Account {
    fn from(row: AccountRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            password: row.password_hash,
            first_name: row.first_name,
            last_name: row.last_name,
            roles: row.roles,
            profile_picture: row.profile_picture,
            address: row.address.map(|Json(a)| a),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Account {
        let now = OffsetDateTime::now_utc();
        Account {
            id: Uuid::new_v4(),
            email: "u1@x.com".into(),
            password: "$argon2id$v=19$m=64,t=1,p=1$c2FsdHNhbHQ$aGFzaA".into(),
            first_name: Some("Ada".into()),
            last_name: None,
            roles: vec![DEFAULT_ROLE.into()],
            profile_picture: None,
            address: Some(Address {
                zip_code: Some("12345".into()),
                ..Address::default()
            }),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn serialization_hides_password_and_uses_camel_case() {
        let json = serde_json::to_value(sample()).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["firstName"], "Ada");
        assert_eq!(json["address"]["zipCode"], "12345");
        assert!(json.get("createdAt").is_some());
    }

    #[test]
    fn row_maps_digest_into_password() {
        let account = sample();
        let row = AccountRow {
            id: account.id,
            email: account.email.clone(),
            password_hash: account.password.clone(),
            first_name: account.first_name.clone(),
            last_name: None,
            roles: account.roles.clone(),
            profile_picture: None,
            address: account.address.clone().map(Json),
            created_at: account.created_at,
            updated_at: account.updated_at,
        };
        assert_eq!(Account::from(row), account);
    }
}
