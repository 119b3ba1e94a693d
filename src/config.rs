use std::path::PathBuf;
use std::time::Duration;

use crate::roster::DEFAULT_ROSTER_TTL;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub roster_path: PathBuf,
    pub template_path: PathBuf,
    pub font_path: PathBuf,
    pub roster_ttl: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup; unset keys fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Box<dyn std::error::Error + Send + Sync>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let path = |key: &str, default: &str| {
            base_dir.join(lookup(key).unwrap_or_else(|| default.to_string()))
        };

        let roster_path = path("ROSTER_PATH", "data/students.xlsx");
        let template_path = path("TEMPLATE_PATH", "public/certificate-template.pdf");
        let font_path = path("FONT_PATH", "public/fonts/Acumin-RPro.otf");

        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port: u16 = match lookup("PORT") {
            Some(port) => port
                .parse()
                .map_err(|e| format!("PORT must be a valid port number: {e}"))?,
            None => 3000,
        };

        let roster_ttl = match lookup("ROSTER_CACHE_TTL_SECS") {
            Some(secs) => Duration::from_secs(
                secs.parse()
                    .map_err(|e| format!("ROSTER_CACHE_TTL_SECS must be whole seconds: {e}"))?,
            ),
            None => DEFAULT_ROSTER_TTL,
        };

        Ok(Self {
            host,
            port,
            roster_path,
            template_path,
            font_path,
            roster_ttl,
        })
    }
}
