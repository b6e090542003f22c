//! Web server command

use std::path::Path;

use anyhow::Result;
use sift_server::ServerConfig;
use tracing::info;

use super::open_db;

/// Comma-separated API keys accepted by the server
const API_KEYS_ENV: &str = "SIFT_API_KEYS";

/// Comma-separated allowed CORS origins
const ALLOWED_ORIGINS_ENV: &str = "SIFT_ALLOWED_ORIGINS";

pub async fn cmd_serve(
    db_path: &Path,
    host: &str,
    port: u16,
    no_auth: bool,
    no_encrypt: bool,
) -> Result<()> {
    let db = open_db(db_path, no_encrypt)?;

    let api_keys: Vec<String> = std::env::var(API_KEYS_ENV)
        .map(|s| {
            s.split(',')
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .collect()
        })
        .unwrap_or_default();

    let allowed_origins: Vec<String> = std::env::var(ALLOWED_ORIGINS_ENV)
        .map(|s| {
            s.split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect()
        })
        .unwrap_or_default();

    if !no_auth && api_keys.is_empty() {
        anyhow::bail!(
            "No API keys configured. Set {} with at least one key, or pass --no-auth for local development.",
            API_KEYS_ENV
        );
    }

    if !api_keys.is_empty() {
        info!("Accepting {} API key(s) from {}", api_keys.len(), API_KEYS_ENV);
    }

    let config = ServerConfig {
        require_auth: !no_auth,
        allowed_origins,
        api_keys,
    };

    sift_server::serve_with_config(db, host, port, config).await
}
