use std::sync::Arc;

use anyhow::Context;

use crate::accounts::{
    memory::MemoryAccountStore, password::Argon2Scheme, repo::PgAccountStore, AccountModel,
};
use crate::config::{AppConfig, PasswordConfig};

/// Process-wide state. The account model is built once here and shared.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub accounts: Arc<AccountModel>,
}

impl AppState {
    /// Startup sequence: config, pool, migrations, account model.
    pub async fn init() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let config = Arc::new(AppConfig::from_env().context("load config")?);

        let db = sqlx::postgres::PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;

        sqlx::migrate!("./migrations")
            .run(&db)
            .await
            .context("run migrations")?;

        let passwords = Argon2Scheme::new(&config.password).context("password hashing params")?;
        let accounts = Arc::new(AccountModel::new(
            Arc::new(PgAccountStore::new(db)),
            Arc::new(passwords),
        ));
        tracing::info!(cost = config.password.cost, "account model ready");

        Ok(Self { config, accounts })
    }

    pub fn from_parts(config: Arc<AppConfig>, accounts: Arc<AccountModel>) -> Self {
        Self { config, accounts }
    }

    /// In-memory state with cheap hashing, for tests and local tooling.
    pub fn fake() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig {
            database_url: String::new(),
            max_connections: 1,
            password: PasswordConfig {
                cost: 1,
                memory_kib: 64,
                parallelism: 1,
            },
        });
        let passwords = Argon2Scheme::new(&config.password).context("password hashing params")?;
        let accounts = Arc::new(AccountModel::new(
            Arc::new(MemoryAccountStore::new()),
            Arc::new(passwords),
        ));
        Ok(Self::from_parts(config, accounts))
    }
}
