use resqtrack::geocoding::DEFAULT_GEOCODER_URL;
use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 5000;

/// Server settings, read from `RESQTRACK_*` environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub data_dir: PathBuf,
    pub upload_dir: PathBuf,
    pub host: String,
    pub port: u16,
    pub geocoder_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            data_dir: PathBuf::from("database"),
            upload_dir: PathBuf::from("static/uploads"),
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            geocoder_url: DEFAULT_GEOCODER_URL.to_string(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset or blank keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = ServerConfig::default();

        let port = match get("RESQTRACK_PORT") {
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                log::warn!("Ignoring invalid RESQTRACK_PORT {raw:?}, using {DEFAULT_PORT}");
                DEFAULT_PORT
            }),
            None => defaults.port,
        };

        ServerConfig {
            data_dir: get("RESQTRACK_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            upload_dir: get("RESQTRACK_UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            host: get("RESQTRACK_HOST").unwrap_or(defaults.host),
            port,
            geocoder_url: get("RESQTRACK_GEOCODER_URL").unwrap_or(defaults.geocoder_url),
        }
    }
}
