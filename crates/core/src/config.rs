use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{DashError, Result};

pub const DEFAULT_BIGQUERY_ENDPOINT: &str = "https://bigquery.googleapis.com/bigquery/v2";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub listen_addr: String,
    pub gateway_url: Option<String>,
    pub public_project_id: Option<String>,
    pub project_id: String,
    pub dataset_id: String,
    pub table_id: String,
    pub credentials_path: PathBuf,
    pub access_token: Option<String>,
    pub bigquery_endpoint: String,
    pub token_lifetime: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:3000".to_string(),
            gateway_url: None,
            public_project_id: None,
            project_id: "logger-462111".to_string(),
            dataset_id: "logging".to_string(),
            table_id: "logs_table".to_string(),
            credentials_path: PathBuf::from("../key.json"),
            access_token: None,
            bigquery_endpoint: DEFAULT_BIGQUERY_ENDPOINT.to_string(),
            token_lifetime: Duration::from_secs(60 * 60),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut cfg = Self::default();
        let config_path = config_file_path();
        if let Some(file_overrides) = load_file_overrides(&config_path)? {
            apply_overrides(&mut cfg, file_overrides, "config file")?;
        }
        let env_overrides = load_env_overrides();
        apply_overrides(&mut cfg, env_overrides, "environment")?;
        Ok(cfg)
    }

    /// Where the page fetches the gateway from.
    pub fn gateway_url(&self) -> String {
        self.gateway_url
            .clone()
            .unwrap_or_else(|| format!("http://{}/api/logs", self.listen_addr))
    }

    /// Header label; falls back to the warehouse project.
    pub fn display_project_id(&self) -> &str {
        self.public_project_id
            .as_deref()
            .unwrap_or(self.project_id.as_str())
    }

    /// `project.dataset.table`, as used in the FROM clause.
    pub fn qualified_table(&self) -> String {
        format!("{}.{}.{}", self.project_id, self.dataset_id, self.table_id)
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigOverrides {
    listen_addr: Option<String>,
    gateway_url: Option<String>,
    public_project_id: Option<String>,
    project_id: Option<String>,
    dataset_id: Option<String>,
    table_id: Option<String>,
    credentials_path: Option<PathBuf>,
    access_token: Option<String>,
    bigquery_endpoint: Option<String>,
    token_lifetime: Option<String>,
}

fn config_file_path() -> PathBuf {
    if let Ok(path) = env::var("LOGDASH_CONFIG") {
        return PathBuf::from(path);
    }

    let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
    let config_home = env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(home).join(".config"));
    config_home.join("logdash/config.toml")
}

fn load_file_overrides(path: &Path) -> Result<Option<ConfigOverrides>> {
    if !path.exists() {
        return Ok(None);
    }

    let raw = fs::read_to_string(path)
        .map_err(|e| DashError::Config(format!("failed reading {}: {e}", path.display())))?;
    let parsed: ConfigOverrides = toml::from_str(&raw)
        .map_err(|e| DashError::Config(format!("failed parsing {}: {e}", path.display())))?;
    Ok(Some(parsed))
}

fn load_env_overrides() -> ConfigOverrides {
    ConfigOverrides {
        listen_addr: env::var("LOGDASH_LISTEN_ADDR").ok(),
        gateway_url: env::var("LOGDASH_GATEWAY_URL").ok(),
        public_project_id: env::var("LOGDASH_PUBLIC_PROJECT_ID")
            .or_else(|_| env::var("NEXT_PUBLIC_PROJECT_ID"))
            .ok(),
        project_id: env::var("LOGDASH_PROJECT_ID")
            .or_else(|_| env::var("GCP_PROJECT_ID"))
            .ok(),
        dataset_id: env::var("LOGDASH_DATASET_ID")
            .or_else(|_| env::var("BIGQUERY_DATASET_ID"))
            .ok(),
        table_id: env::var("LOGDASH_TABLE_ID")
            .or_else(|_| env::var("BIGQUERY_TABLE_ID"))
            .ok(),
        credentials_path: env::var("LOGDASH_CREDENTIALS_PATH")
            .or_else(|_| env::var("GCP_CREDENTIALS"))
            .ok()
            .map(PathBuf::from),
        access_token: env::var("LOGDASH_ACCESS_TOKEN").ok(),
        bigquery_endpoint: env::var("LOGDASH_BIGQUERY_ENDPOINT").ok(),
        token_lifetime: env::var("LOGDASH_TOKEN_LIFETIME").ok(),
    }
}

fn apply_overrides(cfg: &mut Config, overrides: ConfigOverrides, source: &str) -> Result<()> {
    if let Some(v) = overrides.listen_addr {
        cfg.listen_addr = v;
    }
    if let Some(v) = overrides.gateway_url {
        cfg.gateway_url = Some(v);
    }
    if let Some(v) = overrides.public_project_id {
        cfg.public_project_id = Some(v);
    }
    if let Some(v) = overrides.project_id {
        cfg.project_id = non_empty(v, "project_id", source)?;
    }
    if let Some(v) = overrides.dataset_id {
        cfg.dataset_id = non_empty(v, "dataset_id", source)?;
    }
    if let Some(v) = overrides.table_id {
        cfg.table_id = non_empty(v, "table_id", source)?;
    }
    if let Some(v) = overrides.credentials_path {
        cfg.credentials_path = v;
    }
    if let Some(v) = overrides.access_token {
        cfg.access_token = Some(v);
    }
    if let Some(v) = overrides.bigquery_endpoint {
        cfg.bigquery_endpoint = v.trim_end_matches('/').to_string();
    }
    if let Some(v) = overrides.token_lifetime {
        cfg.token_lifetime = humantime::parse_duration(&v).map_err(|e| {
            DashError::Config(format!("bad token_lifetime in {source}: {e} (value={v})"))
        })?;
    }
    Ok(())
}

fn non_empty(value: String, key: &str, source: &str) -> Result<String> {
    if value.trim().is_empty() {
        return Err(DashError::Config(format!("{key} in {source} cannot be empty")));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use serial_test::serial;

    use super::*;

    #[test]
    fn default_targets_logs_table() {
        let cfg = Config::default();
        assert_eq!(cfg.listen_addr, "127.0.0.1:3000");
        assert_eq!(cfg.qualified_table(), "logger-462111.logging.logs_table");
        assert_eq!(cfg.gateway_url(), "http://127.0.0.1:3000/api/logs");
        assert_eq!(cfg.token_lifetime, Duration::from_secs(3600));
    }

    #[test]
    fn display_project_prefers_public_id() {
        let mut cfg = Config::default();
        assert_eq!(cfg.display_project_id(), "logger-462111");
        cfg.public_project_id = Some("public-demo".to_string());
        assert_eq!(cfg.display_project_id(), "public-demo");
    }

    #[test]
    fn apply_file_overrides_updates_fields() {
        let mut cfg = Config::default();
        let file = ConfigOverrides {
            dataset_id: Some("audit".to_string()),
            bigquery_endpoint: Some("http://127.0.0.1:9050/bigquery/v2/".to_string()),
            token_lifetime: Some("30m".to_string()),
            ..ConfigOverrides::default()
        };

        apply_overrides(&mut cfg, file, "config file").unwrap();

        assert_eq!(cfg.dataset_id, "audit");
        assert_eq!(cfg.bigquery_endpoint, "http://127.0.0.1:9050/bigquery/v2");
        assert_eq!(cfg.token_lifetime, Duration::from_secs(1800));
    }

    #[test]
    fn rejects_bad_values() {
        let mut cfg = Config::default();
        let bad_lifetime = ConfigOverrides {
            token_lifetime: Some("forever".to_string()),
            ..ConfigOverrides::default()
        };
        assert!(apply_overrides(&mut cfg, bad_lifetime, "environment").is_err());

        let empty_table = ConfigOverrides {
            table_id: Some("  ".to_string()),
            ..ConfigOverrides::default()
        };
        assert!(apply_overrides(&mut cfg, empty_table, "environment").is_err());
    }

    #[test]
    #[serial]
    fn load_reads_file_then_environment() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "listen_addr = \"0.0.0.0:8080\"").unwrap();
        writeln!(file, "table_id = \"from_file\"").unwrap();

        // SAFETY: serialised by `serial_test`; no other thread reads the environment.
        unsafe {
            env::set_var("LOGDASH_CONFIG", &path);
            env::set_var("LOGDASH_TABLE_ID", "from_env");
        }
        let cfg = Config::load();
        unsafe {
            env::remove_var("LOGDASH_CONFIG");
            env::remove_var("LOGDASH_TABLE_ID");
        }

        let cfg = cfg.unwrap();
        assert_eq!(cfg.listen_addr, "0.0.0.0:8080");
        assert_eq!(cfg.table_id, "from_env");
    }

    #[test]
    #[serial]
    fn load_reports_unparsable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "listen_addr = [").unwrap();

        unsafe {
            env::set_var("LOGDASH_CONFIG", &path);
        }
        let cfg = Config::load();
        unsafe {
            env::remove_var("LOGDASH_CONFIG");
        }

        assert!(matches!(cfg, Err(DashError::Config(_))));
    }
}
