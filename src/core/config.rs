use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub store: StoreConfig,
    pub auth: AuthConfig,
    pub notify: NotifyConfig,
    pub geocode: GeocodeConfig,
    pub publicize: PublicizeConfig,
    pub swagger: SwaggerConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    pub max_request_body_size: usize,
}

/// Realtime datastore (Firebase RTDB REST dialect) configuration
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Base URL of the realtime database, e.g. `https://mp-alertify.firebaseio.com`
    pub base_url: String,
    /// Database secret or access token appended as `auth=` (optional)
    pub auth_token: Option<String>,
    /// Delay before re-opening a dropped subscription stream
    pub reconnect_backoff: Duration,
}

/// Auth provider (admin gateway) configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Base URL of the auth admin gateway used for token verification,
    /// auth-record lookup and account disabling
    pub base_url: String,
    /// Server key sent as a bearer token to the gateway (optional)
    pub server_key: Option<String>,
    /// How long a resolved session is served before the token is verified
    /// against the gateway again
    pub session_cache_ttl: Duration,
}

/// Push-notification relay configuration
#[derive(Debug, Clone)]
pub struct NotifyConfig {
    /// Endpoint receiving `{token, title, body, data}` payloads
    pub relay_url: String,
}

/// Reverse-geocoding (Nominatim) configuration
#[derive(Debug, Clone)]
pub struct GeocodeConfig {
    pub base_url: String,
    pub user_agent: String,
}

/// Publicize endpoint configuration
#[derive(Debug, Clone)]
pub struct PublicizeConfig {
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct SwaggerConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if exists, ignore if not found (optional for production)
        if let Err(e) = dotenvy::dotenv() {
            // Only error if it's not "file not found" - that's acceptable
            if !e.to_string().contains("not found") {
                eprintln!("Warning: Error loading .env file: {}", e);
            }
        }

        Ok(Config {
            app: AppConfig::from_env()?,
            store: StoreConfig::from_env()?,
            auth: AuthConfig::from_env()?,
            notify: NotifyConfig::from_env()?,
            geocode: GeocodeConfig::from_env()?,
            publicize: PublicizeConfig::from_env()?,
            swagger: SwaggerConfig::from_env()?,
        })
    }
}

impl AppConfig {
    const DEFAULT_MAX_REQUEST_BODY_SIZE: usize = 2 * 1024 * 1024; // 2MB

    pub fn from_env() -> Result<Self, String> {
        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|e| format!("Invalid PORT: {}", e))?;

        // Parse CORS allowed origins from comma-separated string
        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let max_request_body_size = env::var("MAX_REQUEST_BODY_SIZE")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_REQUEST_BODY_SIZE.to_string())
            .parse::<usize>()
            .map_err(|_| "MAX_REQUEST_BODY_SIZE must be a valid number".to_string())?;

        Ok(Self {
            host,
            port,
            cors_allowed_origins,
            max_request_body_size,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl StoreConfig {
    const DEFAULT_RECONNECT_BACKOFF_SECS: u64 = 5;

    pub fn from_env() -> Result<Self, String> {
        let base_url =
            env::var("STORE_BASE_URL").map_err(|_| "STORE_BASE_URL must be set".to_string())?;

        let auth_token = env::var("STORE_AUTH_TOKEN").ok().filter(|s| !s.is_empty());

        let reconnect_backoff_secs = env::var("STORE_RECONNECT_BACKOFF_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_RECONNECT_BACKOFF_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "STORE_RECONNECT_BACKOFF_SECS must be a valid number".to_string())?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_token,
            reconnect_backoff: Duration::from_secs(reconnect_backoff_secs),
        })
    }
}

impl AuthConfig {
    const DEFAULT_SESSION_CACHE_TTL_SECS: u64 = 300; // 5 minutes

    pub fn from_env() -> Result<Self, String> {
        let base_url = env::var("AUTH_GATEWAY_URL")
            .map_err(|_| "AUTH_GATEWAY_URL environment variable is required".to_string())?;

        let server_key = env::var("AUTH_SERVER_KEY").ok().filter(|s| !s.is_empty());

        let session_cache_ttl_secs = env::var("SESSION_CACHE_TTL")
            .unwrap_or_else(|_| Self::DEFAULT_SESSION_CACHE_TTL_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "SESSION_CACHE_TTL must be a valid number".to_string())?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            server_key,
            session_cache_ttl: Duration::from_secs(session_cache_ttl_secs),
        })
    }
}

impl NotifyConfig {
    pub fn from_env() -> Result<Self, String> {
        let relay_url = env::var("NOTIFY_RELAY_URL")
            .map_err(|_| "NOTIFY_RELAY_URL environment variable is required".to_string())?;

        Ok(Self { relay_url })
    }
}

impl GeocodeConfig {
    pub fn from_env() -> Result<Self, String> {
        let base_url = env::var("GEOCODE_BASE_URL")
            .unwrap_or_else(|_| "https://nominatim.openstreetmap.org".to_string());

        let user_agent = env::var("GEOCODE_USER_AGENT")
            .unwrap_or_else(|_| "AlertifyAdminCore/1.0 (emergency-report-dashboard)".to_string());

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            user_agent,
        })
    }
}

impl PublicizeConfig {
    pub fn from_env() -> Result<Self, String> {
        let url = env::var("PUBLICIZE_URL")
            .map_err(|_| "PUBLICIZE_URL environment variable is required".to_string())?;

        Ok(Self { url })
    }
}

impl SwaggerConfig {
    pub fn from_env() -> Result<Self, String> {
        // Only use credentials if they are non-empty
        let username = env::var("SWAGGER_USERNAME").ok().filter(|s| !s.is_empty());
        let password = env::var("SWAGGER_PASSWORD").ok().filter(|s| !s.is_empty());
        let title =
            env::var("SWAGGER_TITLE").unwrap_or_else(|_| "MP-Alertify Admin API".to_string());
        let version = env::var("SWAGGER_VERSION").unwrap_or_else(|_| "0.1.0".to_string());
        let description = env::var("SWAGGER_DESCRIPTION")
            .unwrap_or_else(|_| "Admin dashboard API for MP-Alertify".to_string());

        Ok(Self {
            username,
            password,
            title,
            version,
            description,
        })
    }

    /// Returns credentials in "username:password" format if auth is enabled
    pub fn credentials(&self) -> Option<String> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some(format!("{}:{}", user, pass)),
            _ => None,
        }
    }
}
