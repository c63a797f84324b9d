use crate::auth::Membership;
use anyhow::{Context, Result};
use std::path::PathBuf;

#[derive(Clone, Debug)]
pub struct PagesConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub bind_address: String,
    pub site_url: String,
    pub storage_path: PathBuf,
    pub default_lang: String,
    pub sysadmins: Vec<String>,
    pub memberships: Vec<Membership>,
}

impl PagesConfig {
    pub fn from_env() -> Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .context("Failed to determine DATABASE_URL from environment variables")?;

        let max_connections = std::env::var("MAX_CONNECTIONS")
            .ok()
            .and_then(|val| val.parse::<u32>().ok())
            .unwrap_or(5);

        let bind_address =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let site_url =
            std::env::var("SITE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());

        let storage_path =
            PathBuf::from(std::env::var("STORAGE_PATH").unwrap_or_else(|_| "./storage".to_string()));

        let default_lang = std::env::var("DEFAULT_LANG").unwrap_or_else(|_| "en".to_string());

        let sysadmins = split_list(&std::env::var("PAGES_SYSADMINS").unwrap_or_default());

        let memberships = split_list(&std::env::var("PAGES_MEMBERS").unwrap_or_default())
            .iter()
            .map(|entry| entry.parse::<Membership>())
            .collect::<Result<Vec<_>>>()
            .context("Failed to parse PAGES_MEMBERS")?;

        Ok(Self {
            database_url,
            max_connections,
            bind_address,
            site_url,
            storage_path,
            default_lang,
            sysadmins,
            memberships,
        })
    }
}

// comma separated, blanks dropped
fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
