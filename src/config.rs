use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

pub const CONFIG_FILENAME: &str = ".gatorconfig.json";

const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;
const DEFAULT_STORE_TIMEOUT_SECS: u64 = 10;

/// Contents of `~/.gatorconfig.json`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub db_url: String,
    #[serde(default)]
    pub current_user_name: Option<String>,
}

impl Config {
    /// `GATOR_CONFIG` if set, otherwise `$HOME/.gatorconfig.json`.
    pub fn path() -> Result<PathBuf> {
        if let Ok(p) = std::env::var("GATOR_CONFIG") {
            return Ok(PathBuf::from(p));
        }
        let home = std::env::var("HOME").context("HOME is not set; set GATOR_CONFIG to locate the config file")?;
        Ok(Path::new(&home).join(CONFIG_FILENAME))
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    // A missing file is an empty config; a malformed one is an error.
    pub fn load_from(path: &Path) -> Result<Self> {
        match fs::read(path) {
            Ok(raw) => serde_json::from_slice(&raw).with_context(|| format!("parse config {}", path.display())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e).with_context(|| format!("read config {}", path.display())),
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let raw = serde_json::to_vec(self)?;
        fs::write(path, raw).with_context(|| format!("write config {}", path.display()))
    }

    pub fn set_user(&mut self, name: &str) -> Result<()> {
        self.current_user_name = Some(name.to_string());
        self.save_to(&Self::path()?)
    }

    pub fn current_user(&self) -> Option<&str> {
        self.current_user_name.as_deref().filter(|n| !n.is_empty())
    }

    /// `--dsn`, then `DATABASE_URL`, then `db_url` from the file.
    pub fn resolve_dsn(&self, cli_dsn: Option<String>, env_dsn: Option<String>) -> Result<String> {
        let dsn = cli_dsn
            .or(env_dsn)
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| self.db_url.clone());
        if dsn.is_empty() {
            bail!("Please provide --dsn, set DATABASE_URL, or set db_url in {}", CONFIG_FILENAME);
        }
        Ok(dsn)
    }
}

/// Deadlines for the two blocking calls of a fetch cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timeouts {
    pub fetch: Duration,
    pub store: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            fetch: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            store: Duration::from_secs(DEFAULT_STORE_TIMEOUT_SECS),
        }
    }
}

impl Timeouts {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut t = Self::default();
        if let Some(secs) = lookup("GATOR_FETCH_TIMEOUT_SECS").and_then(|v| v.parse::<u64>().ok()).filter(|s| *s > 0) {
            t.fetch = Duration::from_secs(secs);
        }
        if let Some(secs) = lookup("GATOR_STORE_TIMEOUT_SECS").and_then(|v| v.parse::<u64>().ok()).filter(|s| *s > 0) {
            t.store = Duration::from_secs(secs);
        }
        t
    }
}
