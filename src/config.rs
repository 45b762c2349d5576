use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub redis: RedisConfig,
    pub storage: StorageConfig,
    pub board: BoardConfig,
    pub limits: LimitsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RedisConfig {
    pub url: String,
    pub sentinel_enabled: bool,
    pub sentinel_url: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Redis,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub key_prefix: String,
    pub user_cache_path: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PasswordScheme {
    Plaintext,
    Bcrypt,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BoardConfig {
    pub principal: String,
    pub default_password: String,
    pub password_scheme: PasswordScheme,
    pub bcrypt_cost: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LimitsConfig {
    pub max_body_size: usize,  // in bytes
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            principal: "TAKEDA".to_string(),
            default_password: "147369".to_string(),
            password_scheme: PasswordScheme::Plaintext,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
impl Config {
    /// In-memory configuration for router tests.
    pub fn for_tests() -> Self {
        Self {
            server: ServerConfig { host: "127.0.0.1".into(), port: 0 },
            redis: RedisConfig {
                url: "redis://127.0.0.1:6379".into(),
                sentinel_enabled: false,
                sentinel_url: None,
            },
            storage: StorageConfig {
                backend: StorageBackend::Memory,
                key_prefix: "board".into(),
                user_cache_path: None,
            },
            board: BoardConfig::default(),
            limits: LimitsConfig { max_body_size: 64 * 1024 },
        }
    }
}
