use crate::auth::jwt::JwtConfig;

/// Geocoding provider settings.
#[derive(Debug, Clone)]
pub struct GeocoderConfig {
    /// Base URL of a Nominatim-compatible endpoint.
    pub url: String,
    /// `User-Agent` sent on every lookup.
    pub user_agent: String,
    /// Language for reverse-geocoded addresses (default: `ko`).
    pub language: String,
}

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have defaults suitable for local
/// development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Largest accepted dataset upload in bytes (default: 10 MiB).
    pub max_upload_bytes: usize,
    /// Marker count at which the map view switches to clustering (default: `10`).
    pub cluster_threshold: usize,
    pub geocoder: GeocoderConfig,
    /// JWT token configuration (secret, expiry).
    pub jwt: JwtConfig,
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.into())
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                               |
    /// |------------------------|---------------------------------------|
    /// | `HOST`                 | `0.0.0.0`                             |
    /// | `PORT`                 | `3000`                                |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`               |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                                  |
    /// | `MAX_UPLOAD_BYTES`     | `10485760`                            |
    /// | `CLUSTER_THRESHOLD`    | `10`                                  |
    /// | `GEOCODER_URL`         | `https://nominatim.openstreetmap.org` |
    /// | `GEOCODER_USER_AGENT`  | `atlasboard/<version>`                |
    /// | `GEOCODER_LANGUAGE`    | `ko`                                  |
    ///
    /// # Panics
    ///
    /// Panics on unparseable numbers and when `JWT_SECRET` is missing;
    /// misconfiguration fails at startup.
    pub fn from_env() -> Self {
        let host = env_or("HOST", "0.0.0.0");

        let port: u16 = env_or("PORT", "3000")
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = env_or("CORS_ORIGINS", "http://localhost:5173")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = env_or("REQUEST_TIMEOUT_SECS", "30")
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let max_upload_bytes: usize = env_or("MAX_UPLOAD_BYTES", "10485760")
            .parse()
            .expect("MAX_UPLOAD_BYTES must be a valid usize");

        let cluster_threshold: usize = env_or("CLUSTER_THRESHOLD", "10")
            .parse()
            .expect("CLUSTER_THRESHOLD must be a valid usize");

        let geocoder = GeocoderConfig {
            url: env_or("GEOCODER_URL", "https://nominatim.openstreetmap.org"),
            user_agent: env_or(
                "GEOCODER_USER_AGENT",
                concat!("atlasboard/", env!("CARGO_PKG_VERSION")),
            ),
            language: env_or("GEOCODER_LANGUAGE", "ko"),
        };

        let jwt = JwtConfig::from_env();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            max_upload_bytes,
            cluster_threshold,
            geocoder,
            jwt,
        }
    }
}
