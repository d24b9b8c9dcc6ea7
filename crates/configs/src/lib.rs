use std::path::Path;

use anyhow::anyhow;
use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub mongo: MongoConfig,
    #[serde(default)]
    pub employees: EmployeesConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: default_host(), port: default_port(), worker_threads: Some(4) }
    }
}

fn default_host() -> String { "127.0.0.1".into() }
fn default_port() -> u16 { 3000 }

/// Backend selection and the flat-file location used by the `map` backend.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: Option<String>,
    #[serde(default = "default_data_file")]
    pub data_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { backend: None, data_file: default_data_file() }
    }
}

fn default_data_file() -> String { "data/employees.json".into() }

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_max_lifetime")]
    pub max_lifetime_secs: u64,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
    #[serde(default)]
    pub sqlx_logging: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            max_lifetime_secs: default_max_lifetime(),
            acquire_timeout_secs: default_acquire_timeout(),
            sqlx_logging: false,
        }
    }
}

fn default_database_url() -> String { sqlite_url("employees.sqlite") }
fn default_max_connections() -> u32 { 10 }
fn default_min_connections() -> u32 { 1 }
fn default_connect_timeout() -> u64 { 30 }
fn default_idle_timeout() -> u64 { 600 }
fn default_max_lifetime() -> u64 { 3600 }
fn default_acquire_timeout() -> u64 { 30 }

/// Build a SQLite connection url that creates the file on first use.
pub fn sqlite_url(file_name: &str) -> String {
    format!("sqlite://{file_name}?mode=rwc")
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoConfig {
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default = "default_mongo_db")]
    pub db_name: String,
    #[serde(default = "default_mongo_collection")]
    pub collection: String,
    /// Binary used by the `mongoInMemory` backend to spawn a throwaway server.
    #[serde(default = "default_mongod_path")]
    pub mongod_path: String,
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            uri: None,
            db_name: default_mongo_db(),
            collection: default_mongo_collection(),
            mongod_path: default_mongod_path(),
        }
    }
}

fn default_mongo_db() -> String { "employees_db".into() }
fn default_mongo_collection() -> String { "employees".into() }
fn default_mongod_path() -> String { "mongod".into() }

/// Business limits applied when validating employee payloads.
#[derive(Debug, Clone, Deserialize)]
pub struct EmployeesConfig {
    #[serde(default = "default_departments")]
    pub departments: Vec<String>,
    #[serde(default = "default_min_salary")]
    pub min_salary: i64,
    #[serde(default = "default_max_salary")]
    pub max_salary: i64,
    #[serde(default = "default_min_age")]
    pub min_age: u32,
    #[serde(default = "default_max_age")]
    pub max_age: u32,
}

impl Default for EmployeesConfig {
    fn default() -> Self {
        Self {
            departments: default_departments(),
            min_salary: default_min_salary(),
            max_salary: default_max_salary(),
            min_age: default_min_age(),
            max_age: default_max_age(),
        }
    }
}

fn default_departments() -> Vec<String> {
    ["QA", "Development", "Audit", "Accounting", "Management"].into_iter().map(String::from).collect()
}
fn default_min_salary() -> i64 { 5000 }
fn default_max_salary() -> i64 { 50000 }
fn default_min_age() -> u32 { 20 }
fn default_max_age() -> u32 { 72 }

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub jwt_secret: String,
    #[serde(default = "default_token_ttl")]
    pub token_ttl_minutes: i64,
    #[serde(default = "default_accounts")]
    pub accounts: Vec<AccountSeed>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self { jwt_secret: String::new(), token_ttl_minutes: default_token_ttl(), accounts: default_accounts() }
    }
}

/// Account provisioned into the in-memory account store at startup.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct AccountSeed {
    pub username: String,
    pub password: String,
    pub role: String,
}

fn default_token_ttl() -> i64 { 60 }

fn default_accounts() -> Vec<AccountSeed> {
    vec![
        AccountSeed { username: "admin@tel-ran.com".into(), password: "Admin12345".into(), role: "ADMIN".into() },
        AccountSeed { username: "user@tel-ran.com".into(), password: "User12345".into(), role: "USER".into() },
    ]
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let cfg: AppConfig = toml::from_str(&content)?;
    Ok(cfg)
}

impl AppConfig {
    /// Load `config.toml` if present (defaults otherwise), apply env overrides, validate.
    pub fn load_and_validate() -> Result<Self> {
        let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        let mut cfg = if Path::new(&path).exists() { load_from_file(&path)? } else { AppConfig::default() };
        cfg.apply_env(|name| std::env::var(name).ok());
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    /// Overlay environment variables on top of file/default values.
    ///
    /// `lookup` resolves a variable name, normally `std::env::var`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("SERVER_HOST") { self.server.host = host; }
        if let Some(port) = lookup("SERVER_PORT").or_else(|| lookup("PORT")).and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }
        if let Some(w) = lookup("TOKIO_WORKER_THREADS").and_then(|v| v.parse().ok()) {
            self.server.worker_threads = Some(w);
        }

        if let Some(backend) = lookup("EMPLOYEES_IMPL").filter(|b| !b.trim().is_empty()) {
            self.storage.backend = Some(backend);
        }
        if let Some(file) = lookup("EMPLOYEES_FILE") { self.storage.data_file = file; }

        if let Some(url) = lookup("DATABASE_URL") {
            self.database.url = url;
        } else if let Some(file) = lookup("SQLITE_FILE_NAME") {
            self.database.url = sqlite_url(&file);
        }

        if let Some(uri) = lookup("MONGO_URI") { self.mongo.uri = Some(uri); }
        if let Some(db) = lookup("MONGO_DB_NAME") { self.mongo.db_name = db; }
        if let Some(c) = lookup("MONGO_COLLECTION_NAME") { self.mongo.collection = c; }
        if let Some(p) = lookup("MONGOD_PATH") { self.mongo.mongod_path = p; }

        if let Some(deps) = lookup("DEPARTMENTS") {
            let parsed: Vec<String> = deps.split(',').map(|d| d.trim().to_string()).filter(|d| !d.is_empty()).collect();
            if !parsed.is_empty() { self.employees.departments = parsed; }
        }
        if let Some(v) = positive(lookup("MIN_SALARY")) { self.employees.min_salary = v; }
        if let Some(v) = positive(lookup("MAX_SALARY")) { self.employees.max_salary = v; }
        if let Some(v) = positive(lookup("MIN_AGE")).and_then(|v| u32::try_from(v).ok()) { self.employees.min_age = v; }
        if let Some(v) = positive(lookup("MAX_AGE")).and_then(|v| u32::try_from(v).ok()) { self.employees.max_age = v; }

        if let Some(secret) = lookup("JWT_SECRET") { self.auth.jwt_secret = secret; }
        if let Some(ttl) = positive(lookup("JWT_TTL_MINUTES")) { self.auth.token_ttl_minutes = ttl; }
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.database.validate()?;
        self.employees.validate()?;
        self.auth.validate()?;
        Ok(())
    }
}

/// Non-positive or unparsable values are ignored so the default stays in place.
fn positive(raw: Option<String>) -> Option<i64> {
    raw.and_then(|v| v.trim().parse::<i64>().ok()).filter(|v| *v > 0)
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port 必须在 1..=65535 范围内"));
        }
        if let Some(w) = self.worker_threads {
            if w == 0 { self.worker_threads = Some(4); }
        } else {
            self.worker_threads = Some(4);
        }
        Ok(())
    }
}

impl DatabaseConfig {
    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(anyhow!("database.url 为空；请在 config.toml 或环境变量 DATABASE_URL 中提供"));
        }
        let lower = self.url.to_lowercase();
        if !(lower.starts_with("sqlite:") || lower.starts_with("postgresql://") || lower.starts_with("postgres://")) {
            return Err(anyhow!("database.url 必须以 sqlite:、postgresql:// 或 postgres:// 开头"));
        }
        if self.min_connections == 0 {
            return Err(anyhow!("database.min_connections 必须 >= 1"));
        }
        if self.max_connections < self.min_connections {
            return Err(anyhow!("database.max_connections 必须 >= min_connections"));
        }
        if self.connect_timeout_secs == 0 || self.acquire_timeout_secs == 0 {
            return Err(anyhow!("database 超时配置必须为正整数秒"));
        }
        Ok(())
    }
}

impl EmployeesConfig {
    pub fn validate(&self) -> Result<()> {
        if self.departments.is_empty() {
            return Err(anyhow!("employees.departments must not be empty"));
        }
        if self.min_salary > self.max_salary {
            return Err(anyhow!("employees.min_salary must be <= max_salary"));
        }
        if self.min_age > self.max_age {
            return Err(anyhow!("employees.min_age must be <= max_age"));
        }
        Ok(())
    }
}

impl AuthConfig {
    pub fn validate(&self) -> Result<()> {
        if self.jwt_secret.trim().is_empty() {
            return Err(anyhow!("missing required setting: JWT_SECRET (or auth.jwt_secret)"));
        }
        if self.token_ttl_minutes <= 0 {
            return Err(anyhow!("auth.token_ttl_minutes must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_match_documented_values() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.server.port, 3000);
        assert_eq!(cfg.storage.data_file, "data/employees.json");
        assert_eq!(cfg.employees.departments.len(), 5);
        assert_eq!((cfg.employees.min_salary, cfg.employees.max_salary), (5000, 50000));
        assert_eq!((cfg.employees.min_age, cfg.employees.max_age), (20, 72));
        assert_eq!(cfg.mongo.db_name, "employees_db");
        assert_eq!(cfg.auth.accounts.len(), 2);
    }

    #[test]
    fn env_overrides_and_bad_numbers_fall_back() {
        let mut cfg = AppConfig::default();
        cfg.apply_env(env(&[
            ("EMPLOYEES_IMPL", "sqlite"),
            ("SQLITE_FILE_NAME", "test.sqlite"),
            ("DEPARTMENTS", " QA , Sales ,"),
            ("MIN_SALARY", "-1"),
            ("MAX_SALARY", "abc"),
            ("MAX_AGE", "65"),
            ("PORT", "8088"),
            ("JWT_SECRET", "s3cret"),
        ]));
        assert_eq!(cfg.storage.backend.as_deref(), Some("sqlite"));
        assert_eq!(cfg.database.url, "sqlite://test.sqlite?mode=rwc");
        assert_eq!(cfg.employees.departments, vec!["QA".to_string(), "Sales".to_string()]);
        assert_eq!(cfg.employees.min_salary, 5000);
        assert_eq!(cfg.employees.max_salary, 50000);
        assert_eq!(cfg.employees.max_age, 65);
        assert_eq!(cfg.server.port, 8088);
        assert!(cfg.normalize_and_validate().is_ok());
    }

    #[test]
    fn database_url_takes_precedence_over_sqlite_file() {
        let mut cfg = AppConfig::default();
        cfg.apply_env(env(&[("DATABASE_URL", "postgres://u:p@localhost/db"), ("SQLITE_FILE_NAME", "x.sqlite")]));
        assert_eq!(cfg.database.url, "postgres://u:p@localhost/db");
    }

    #[test]
    fn missing_jwt_secret_is_rejected() {
        let mut cfg = AppConfig::default();
        assert!(cfg.normalize_and_validate().is_err());
    }

    #[test]
    fn inverted_limits_are_rejected() {
        let mut cfg = AppConfig::default();
        cfg.auth.jwt_secret = "x".into();
        cfg.employees.min_salary = 60000;
        assert!(cfg.normalize_and_validate().is_err());

        let mut cfg = AppConfig::default();
        cfg.auth.jwt_secret = "x".into();
        cfg.database.url = "mysql://nope".into();
        assert!(cfg.normalize_and_validate().is_err());
    }

    #[test]
    fn parses_toml_sections() {
        let raw = r#"
            [server]
            host = "0.0.0.0"
            port = 9000

            [storage]
            backend = "memory"

            [employees]
            departments = ["QA"]
            max_salary = 90000

            [auth]
            jwt_secret = "abc"
            [[auth.accounts]]
            username = "root@example.com"
            password = "Root12345"
            role = "ADMIN"
        "#;
        let mut cfg: AppConfig = toml::from_str(raw).unwrap();
        cfg.normalize_and_validate().unwrap();
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.storage.backend.as_deref(), Some("memory"));
        assert_eq!(cfg.storage.data_file, "data/employees.json");
        assert_eq!(cfg.employees.departments, vec!["QA".to_string()]);
        assert_eq!(cfg.employees.max_salary, 90000);
        assert_eq!(cfg.employees.min_salary, 5000);
        assert_eq!(cfg.auth.accounts.len(), 1);
        assert_eq!(cfg.auth.token_ttl_minutes, 60);
    }

    #[test]
    fn partial_server_table_keeps_defaults() {
        let mut cfg: AppConfig = toml::from_str("[server]\nport = 8080\n").unwrap();
        cfg.auth.jwt_secret = "x".into();
        cfg.normalize_and_validate().unwrap();
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.server.worker_threads, Some(4));

        let cfg: AppConfig = toml::from_str("[server]\nhost = \"0.0.0.0\"\n").unwrap();
        assert_eq!(cfg.server.port, 3000);
    }

    #[test]
    fn oversized_ages_keep_defaults() {
        let mut cfg = AppConfig::default();
        cfg.apply_env(env(&[("MIN_AGE", "4294967317"), ("MAX_AGE", "99999999999")]));
        assert_eq!(cfg.employees.min_age, 20);
        assert_eq!(cfg.employees.max_age, 72);

        cfg.apply_env(env(&[("MIN_AGE", "18"), ("MAX_AGE", "65")]));
        assert_eq!((cfg.employees.min_age, cfg.employees.max_age), (18, 65));
    }
}
