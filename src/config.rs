use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;
use tracing::{error, info};

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub submissions_table: String,
    pub public_dir: String,
    pub store_timeout_secs: u64,
    pub export_utc_offset_hours: i32,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

const REQUIRED: [&str; 2] = ["SUPABASE_URL", "SUPABASE_ANON_KEY"];

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let missing: Vec<&str> = REQUIRED.iter().copied().filter(|n| get(*n).is_none()).collect();
        if !missing.is_empty() {
            for name in &missing {
                error!("{} is MISSING", name);
            }
            return Err(Error::Config(format!(
                "Missing environment variable(s): {}",
                missing.join(", ")
            )));
        }

        let port: u16 = parse_or(get("PORT"), "PORT", 3000)?;
        let server_address = get("SERVER_ADDRESS").unwrap_or_else(|| format!("0.0.0.0:{}", port));

        let export_utc_offset_hours: i32 =
            parse_or(get("EXPORT_UTC_OFFSET_HOURS"), "EXPORT_UTC_OFFSET_HOURS", 7)?;
        if !(-23..=23).contains(&export_utc_offset_hours) {
            return Err(Error::Config(format!(
                "Invalid value for EXPORT_UTC_OFFSET_HOURS: {} is outside -23..=23",
                export_utc_offset_hours
            )));
        }

        Ok(Self {
            server_address,
            supabase_url: get("SUPABASE_URL").unwrap_or_default(),
            supabase_anon_key: get("SUPABASE_ANON_KEY").unwrap_or_default(),
            submissions_table: get("SUBMISSIONS_TABLE").unwrap_or_else(|| "submissions".to_string()),
            public_dir: get("PUBLIC_DIR").unwrap_or_else(|| "public".to_string()),
            store_timeout_secs: parse_or(get("STORE_TIMEOUT_SECS"), "STORE_TIMEOUT_SECS", 60)?,
            export_utc_offset_hours,
        })
    }

    /// Logs the store settings with the url and key cut to a prefix.
    pub fn log_summary(&self) {
        info!(
            url = %mask(&self.supabase_url, 30),
            key = %mask(&self.supabase_anon_key, 20),
            table = %self.submissions_table,
            "Supabase configuration loaded"
        );
    }
}

fn parse_or<T>(raw: Option<String>, name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
    }
}

fn mask(value: &str, keep: usize) -> String {
    let prefix: String = value.chars().take(keep).collect();
    format!("{}...", prefix)
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}
