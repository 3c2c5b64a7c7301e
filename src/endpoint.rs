use crate::types::constants::{
    DEFAULT_APP_PREFIX, DEFAULT_BACKEND_HOST, DEFAULT_BACKEND_PORT, SOCKET_PATH,
};
use crate::types::{RealtimeError, Result};
use url::Url;

/// Which deployment the client is built for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildMode {
    #[default]
    Development,
    Production,
}

impl BuildMode {
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }
}

/// Where the backend lives, and how the feed and REST URLs are derived from it.
///
/// Production serves the feed under the app prefix on the API host
/// (`wss://<api-host>/<prefix>/socket.io/`). Development talks to the backend
/// directly (`ws://<host>:<port>/socket.io/`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    pub mode: BuildMode,
    /// REST base, e.g. `https://api.example.com/api`. Required in production.
    pub api_base_url: Option<String>,
    pub backend_host: String,
    /// `None` leaves the port out of the URL
    pub backend_port: Option<u16>,
    /// Use `wss`/`https` in development
    pub secure: bool,
    pub app_prefix: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            mode: BuildMode::Development,
            api_base_url: None,
            backend_host: DEFAULT_BACKEND_HOST.to_string(),
            backend_port: Some(DEFAULT_BACKEND_PORT),
            secure: false,
            app_prefix: DEFAULT_APP_PREFIX.to_string(),
        }
    }
}

impl EndpointConfig {
    /// Production config for the given REST base URL
    pub fn production(api_base_url: impl Into<String>) -> Self {
        Self {
            mode: BuildMode::Production,
            api_base_url: Some(api_base_url.into()),
            ..Default::default()
        }
    }

    /// Development config for a backend reachable at `host:port`
    pub fn development(host: impl Into<String>, port: Option<u16>) -> Self {
        Self {
            backend_host: host.into(),
            backend_port: port,
            ..Default::default()
        }
    }

    /// Reads `FOOD_*` variables from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads `FOOD_BUILD_MODE`, `FOOD_API_BASE_URL`, `FOOD_BACKEND_HOST`,
    /// `FOOD_BACKEND_PORT`, `FOOD_SECURE` and `FOOD_APP_PREFIX` through `lookup`.
    ///
    /// An empty `FOOD_BACKEND_PORT` drops the port from development URLs.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let mode = lookup("FOOD_BUILD_MODE")
            .map(|mode| BuildMode::from_str(&mode))
            .unwrap_or_default();

        let backend_port = match lookup("FOOD_BACKEND_PORT") {
            None => defaults.backend_port,
            Some(port) if port.trim().is_empty() => None,
            Some(port) => Some(port.trim().parse::<u16>().map_err(|_| {
                RealtimeError::Config(format!("invalid FOOD_BACKEND_PORT '{}'", port))
            })?),
        };

        let secure = lookup("FOOD_SECURE")
            .map(|value| matches!(value.trim(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let config = Self {
            mode,
            api_base_url: lookup("FOOD_API_BASE_URL").filter(|url| !url.trim().is_empty()),
            backend_host: lookup("FOOD_BACKEND_HOST")
                .filter(|host| !host.trim().is_empty())
                .unwrap_or(defaults.backend_host),
            backend_port,
            secure,
            app_prefix: lookup("FOOD_APP_PREFIX")
                .filter(|prefix| !prefix.trim().is_empty())
                .unwrap_or(defaults.app_prefix),
        };

        if config.mode == BuildMode::Production && config.api_base_url.is_none() {
            return Err(RealtimeError::Config(
                "FOOD_API_BASE_URL is required in production".to_string(),
            ));
        }
        Ok(config)
    }

    /// URL of the event feed
    pub fn websocket_url(&self) -> Result<String> {
        match self.mode {
            BuildMode::Production => {
                let api = self.parsed_api_base()?;
                let host = api.host_str().ok_or_else(|| {
                    RealtimeError::Config("API base URL has no host".to_string())
                })?;
                let authority = match api.port() {
                    Some(port) => format!("{}:{}", host, port),
                    None => host.to_string(),
                };
                Ok(format!(
                    "wss://{}/{}/{}",
                    authority,
                    self.app_prefix.trim_matches('/'),
                    SOCKET_PATH
                ))
            }
            BuildMode::Development => {
                let scheme = if self.secure { "wss" } else { "ws" };
                Ok(format!("{}://{}/{}", scheme, self.dev_authority(), SOCKET_PATH))
            }
        }
    }

    /// Base URL for REST calls, without a trailing slash
    pub fn rest_base_url(&self) -> Result<String> {
        match self.mode {
            BuildMode::Production => {
                self.parsed_api_base()?;
                Ok(self
                    .api_base_url
                    .as_deref()
                    .unwrap_or_default()
                    .trim_end_matches('/')
                    .to_string())
            }
            BuildMode::Development => {
                let scheme = if self.secure { "https" } else { "http" };
                Ok(format!("{}://{}/api", scheme, self.dev_authority()))
            }
        }
    }

    fn parsed_api_base(&self) -> Result<Url> {
        let raw = self.api_base_url.as_deref().ok_or_else(|| {
            RealtimeError::Config("API base URL is required in production".to_string())
        })?;
        Ok(Url::parse(raw)?)
    }

    fn dev_authority(&self) -> String {
        match self.backend_port {
            Some(port) => format!("{}:{}", self.backend_host, port),
            None => self.backend_host.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_production_url_uses_api_host_and_prefix() {
        let config = EndpointConfig::production("https://api.example.com/api");
        assert_eq!(
            config.websocket_url().unwrap(),
            "wss://api.example.com/food-ordering-system/socket.io/"
        );
        assert_eq!(config.rest_base_url().unwrap(), "https://api.example.com/api");
    }

    #[test]
    fn test_development_urls() {
        let config = EndpointConfig::default();
        assert_eq!(config.websocket_url().unwrap(), "ws://localhost:8000/socket.io/");
        assert_eq!(config.rest_base_url().unwrap(), "http://localhost:8000/api");

        let config = EndpointConfig {
            secure: true,
            ..EndpointConfig::development("10.0.0.5", None)
        };
        assert_eq!(config.websocket_url().unwrap(), "wss://10.0.0.5/socket.io/");
    }

    #[test]
    fn test_from_lookup() {
        let config = EndpointConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, EndpointConfig::default());

        let config = EndpointConfig::from_lookup(lookup_from(&[
            ("FOOD_BUILD_MODE", "production"),
            ("FOOD_API_BASE_URL", "https://api.example.com:8443/api/"),
            ("FOOD_APP_PREFIX", "/kiosk/"),
        ]))
        .unwrap();
        assert_eq!(config.mode, BuildMode::Production);
        assert_eq!(
            config.websocket_url().unwrap(),
            "wss://api.example.com:8443/kiosk/socket.io/"
        );
        assert_eq!(config.rest_base_url().unwrap(), "https://api.example.com:8443/api");

        let config = EndpointConfig::from_lookup(lookup_from(&[
            ("FOOD_BACKEND_HOST", "192.168.1.20"),
            ("FOOD_BACKEND_PORT", ""),
        ]))
        .unwrap();
        assert_eq!(config.websocket_url().unwrap(), "ws://192.168.1.20/socket.io/");
    }

    #[test]
    fn test_from_lookup_errors() {
        let err = EndpointConfig::from_lookup(lookup_from(&[("FOOD_BUILD_MODE", "production")]))
            .unwrap_err();
        assert!(matches!(err, RealtimeError::Config(_)));

        let err = EndpointConfig::from_lookup(lookup_from(&[("FOOD_BACKEND_PORT", "eighty")]))
            .unwrap_err();
        assert!(matches!(err, RealtimeError::Config(_)));
    }
}
