use async_trait::async_trait;
use sqlx::{types::Json, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::accounts::{
    error::AccountError,
    record::{AccountPatch, AccountRecord},
    repo_types::{Account, AccountRow},
};

/// Persistence service for accounts. Implementations assign ids and
/// timestamps and enforce email uniqueness.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn insert(&self, record: &AccountRecord) -> Result<Account, AccountError>;
    /// Writes only the fields present in `patch`; `updated_at` is always refreshed.
    async fn update(&self, id: Uuid, patch: &AccountPatch) -> Result<Account, AccountError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, AccountError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AccountError>;
}

/// Accounts in the `users` table.
#[derive(Clone)]
pub struct PgAccountStore {
    db: PgPool,
}

impl PgAccountStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

const COLUMNS: &str = "id, email, password_hash, first_name, last_name, roles, \
                       profile_picture, address, created_at, updated_at";

fn map_write_error(e: sqlx::Error, email: &str) -> AccountError {
    match &e {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            AccountError::DuplicateEmail(email.to_string())
        }
        _ => AccountError::Database(e),
    }
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn insert(&self, record: &AccountRecord) -> Result<Account, AccountError> {
        let sql = format!(
            r#"
            INSERT INTO users (id, email, password_hash, first_name, last_name, roles,
                               profile_picture, address)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(&record.email)
            .bind(&record.password)
            .bind(&record.first_name)
            .bind(&record.last_name)
            .bind(&record.roles)
            .bind(&record.profile_picture)
            .bind(record.address.clone().map(Json))
            .fetch_one(&self.db)
            .await
            .map_err(|e| map_write_error(e, &record.email))?;
        Ok(row.into())
    }

    async fn update(&self, id: Uuid, patch: &AccountPatch) -> Result<Account, AccountError> {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE users SET updated_at = now()");
        if let Some(email) = &patch.email {
            qb.push(", email = ").push_bind(email.clone());
        }
        if let Some(password) = &patch.password {
            qb.push(", password_hash = ").push_bind(password.clone());
        }
        if let Some(first_name) = &patch.first_name {
            qb.push(", first_name = ").push_bind(first_name.clone());
        }
        if let Some(last_name) = &patch.last_name {
            qb.push(", last_name = ").push_bind(last_name.clone());
        }
        if let Some(roles) = &patch.roles {
            qb.push(", roles = ").push_bind(roles.clone());
        }
        if let Some(profile_picture) = &patch.profile_picture {
            qb.push(", profile_picture = ").push_bind(profile_picture.clone());
        }
        if let Some(address) = &patch.address {
            qb.push(", address = ").push_bind(address.clone().map(Json));
        }
        qb.push(" WHERE id = ").push_bind(id);
        qb.push(" RETURNING ").push(COLUMNS);

        let row = qb
            .build_query_as::<AccountRow>()
            .fetch_optional(&self.db)
            .await
            .map_err(|e| map_write_error(e, patch.email.as_deref().unwrap_or_default()))?;
        row.map(Account::from).ok_or(AccountError::NotFound(id))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, AccountError> {
        let sql = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(row.map(Account::from))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AccountError> {
        let sql = format!("SELECT {COLUMNS} FROM users WHERE email = $1");
        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(email)
            .fetch_optional(&self.db)
            .await?;
        Ok(row.map(Account::from))
    }
}
