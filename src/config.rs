use serde::Deserialize;

/// Argon2 settings for new digests. `cost` is the time cost (work factor).
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct PasswordConfig {
    pub cost: u32,
    pub memory_kib: u32,
    pub parallelism: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            cost: 10,
            memory_kib: 19 * 1024,
            parallelism: 1,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub password: PasswordConfig,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let defaults = PasswordConfig::default();
        let password = PasswordConfig {
            cost: env_or("PASSWORD_COST", defaults.cost),
            memory_kib: env_or("PASSWORD_MEMORY_KIB", defaults.memory_kib),
            parallelism: env_or("PASSWORD_PARALLELISM", defaults.parallelism),
        };
        Ok(Self {
            database_url,
            max_connections: env_or("DB_MAX_CONNECTIONS", 10),
            password,
        })
    }
}
