use crate::error::Error;
use config::{Config, Environment, File as ConfigFile};
use directories::BaseDirs;
use serde::Deserialize;
use std::fmt::Write;
use std::path::{Path, PathBuf};

pub const DEFAULT_DB_HOST: &str = "localhost";
pub const DEFAULT_DB_PORT: u16 = 5432;
pub const DEFAULT_DB_NAME: &str = "postgres";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub db_host: String,
    pub db_port: u16,
    pub db_user: Option<String>,
    pub db_password: Option<String>,
    pub db_name: String,
    /// Full connection URL; used as-is unless a `--db_*` flag overrides it.
    pub database_url: Option<String>,
}

/// Connection settings given on the command line.
#[derive(Debug, Clone, Default)]
pub struct DbOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

impl DbOverrides {
    fn is_empty(&self) -> bool {
        self.host.is_none()
            && self.port.is_none()
            && self.user.is_none()
            && self.password.is_none()
            && self.name.is_none()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_host: DEFAULT_DB_HOST.to_string(),
            db_port: DEFAULT_DB_PORT,
            db_user: None,
            db_password: None,
            db_name: DEFAULT_DB_NAME.to_string(),
            database_url: None,
        }
    }
}

impl AppConfig {
    /// Load from an optional `Config` file, then `FSDB_SYNC_*` variables,
    /// then `DATABASE_URL`.
    pub fn load() -> Result<AppConfig, Error> {
        let builder = Config::builder()
            .set_default("db_host", DEFAULT_DB_HOST)?
            .set_default("db_port", DEFAULT_DB_PORT as i64)?
            .set_default("db_name", DEFAULT_DB_NAME)?
            .add_source(ConfigFile::with_name("Config").required(false))
            .add_source(Environment::with_prefix("FSDB_SYNC"))
            .set_override_option("database_url", std::env::var("DATABASE_URL").ok())?
            .build()?;

        Ok(builder.try_deserialize::<AppConfig>()?)
    }

    /// Command-line connection settings win over everything, including
    /// `DATABASE_URL`.
    pub fn apply_overrides(&mut self, overrides: DbOverrides) {
        if overrides.is_empty() {
            return;
        }
        self.database_url = None;
        if let Some(host) = overrides.host {
            self.db_host = host;
        }
        if let Some(port) = overrides.port {
            self.db_port = port;
        }
        if overrides.user.is_some() {
            self.db_user = overrides.user;
        }
        if overrides.password.is_some() {
            self.db_password = overrides.password;
        }
        if let Some(name) = overrides.name {
            self.db_name = name;
        }
    }

    /// Target handed to the database driver: `database_url` if set, otherwise
    /// a libpq keyword/value connection string.
    pub fn connection_target(&self) -> String {
        match &self.database_url {
            Some(url) => url.clone(),
            None => self.conninfo(),
        }
    }

    pub fn conninfo(&self) -> String {
        let mut conninfo = String::new();
        push_conninfo_pair(&mut conninfo, "host", &self.db_host);
        push_conninfo_pair(&mut conninfo, "port", &self.db_port.to_string());
        if let Some(user) = &self.db_user {
            push_conninfo_pair(&mut conninfo, "user", user);
        }
        if let Some(password) = &self.db_password {
            push_conninfo_pair(&mut conninfo, "password", password);
        }
        push_conninfo_pair(&mut conninfo, "dbname", &self.db_name);
        conninfo
    }

    /// Connection target safe for logs. Never contains the password.
    pub fn describe_target(&self) -> String {
        if self.database_url.is_some() {
            return "DATABASE_URL".to_string();
        }
        format!(
            "{}@{}:{}/{}",
            self.db_user.as_deref().unwrap_or("<default user>"),
            self.db_host,
            self.db_port,
            self.db_name
        )
    }
}

/// Quote a libpq value: wrap in single quotes, backslash-escape `'` and `\`.
fn push_conninfo_pair(conninfo: &mut String, keyword: &str, value: &str) {
    if !conninfo.is_empty() {
        conninfo.push(' ');
    }
    let _ = write!(conninfo, "{}='", keyword);
    for c in value.chars() {
        if c == '\'' || c == '\\' {
            conninfo.push('\\');
        }
        conninfo.push(c);
    }
    conninfo.push('\'');
}

/// Expand a leading `~` to the current user's home directory.
pub fn expand_root(root: &Path) -> PathBuf {
    let Ok(rest) = root.strip_prefix("~") else {
        return root.to_path_buf();
    };
    match BaseDirs::new() {
        Some(dirs) => dirs.home_dir().join(rest),
        None => root.to_path_buf(),
    }
}
