use anyhow::{Context, Result, anyhow};
use dotenvy::dotenv;
use keyring::Entry;
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;
use url::Url;

pub const KEYRING_SERVICE: &str = "wadash-api-key";
pub const KEYRING_USER: &str = "Dashboard";

pub const DEFAULT_DASHBOARD_BASE_URL: &str = "http://127.0.0.1:8001";
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 16 * 1024 * 1024; // 16MB
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct ConfigFile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_recipient: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dashboard_base_url: Option<Url>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_upload_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct ConfigEnv {
    default_recipient: Option<String>,
    dashboard_base_url: Option<Url>,
    dashboard_api_key: Option<String>,
    max_upload_bytes: Option<u64>,
    request_timeout: Option<String>,
}

pub struct Config {
    pub default_recipient: Option<String>,
    pub dashboard_base_url: Url,
    pub dashboard_api_key: String,
    pub max_upload_bytes: u64,
    pub request_timeout: Duration,
}

fn merge_config(base: ConfigFile, override_config: ConfigEnv) -> Result<Config> {
    let default_recipient = override_config.default_recipient.or(base.default_recipient);

    let dashboard_base_url = match override_config.dashboard_base_url.or(base.dashboard_base_url) {
        Some(url) => url,
        None => Url::parse(DEFAULT_DASHBOARD_BASE_URL)?,
    };

    let max_upload_bytes = override_config
        .max_upload_bytes
        .or(base.max_upload_bytes)
        .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES);

    let request_timeout = match override_config.request_timeout.or(base.request_timeout) {
        Some(timeout) => humantime::parse_duration(&timeout)
            .with_context(|| format!("Invalid request timeout '{}'", timeout))?,
        None => DEFAULT_REQUEST_TIMEOUT,
    };

    let dashboard_api_key = if let Some(api_key) = override_config.dashboard_api_key {
        api_key
    } else {
        let entry = Entry::new(KEYRING_SERVICE, KEYRING_USER)?;
        let api_key = entry
            .get_secret()
            .context("API key not specified via environment variable nor present in OS keyring")?;
        String::from_utf8(api_key)?
    };

    Ok(Config {
        default_recipient,
        dashboard_base_url,
        dashboard_api_key,
        max_upload_bytes,
        request_timeout,
    })
}

pub fn read_config() -> Result<Config> {
    let _ = dotenv();
    let env_config = envy::from_env::<ConfigEnv>().unwrap_or_default();

    let project_dirs = directories::ProjectDirs::from("com", "wadash", "wadash")
        .ok_or(anyhow!("Unable to determine home directory"))?;
    let config_file = project_dirs.config_dir().join("config.toml");
    let file_config = if let Ok(config) = fs::read_to_string(config_file) {
        toml::from_str(&config)?
    } else {
        ConfigFile::default()
    };

    merge_config(file_config, env_config)
}

pub fn write_config(config: ConfigFile) -> Result<()> {
    let project_dirs = directories::ProjectDirs::from("com", "wadash", "wadash")
        .ok_or(anyhow!("Unable to determine home directory"))?;
    let config_dir = project_dirs.config_dir();
    fs::create_dir_all(config_dir)?;
    let config_file = config_dir.join("config.toml");
    fs::write(&config_file, toml::to_string_pretty(&config)?)?;
    Ok(())
}

pub fn set_api_key_keyring(api_key: String) -> Result<()> {
    let entry = Entry::new(KEYRING_SERVICE, KEYRING_USER)?;
    entry.set_secret(api_key.as_bytes())?;
    println!("API key set for use with wadash");
    Ok(())
}
