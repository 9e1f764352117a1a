use regex::Regex;
use std::sync::OnceLock;
use std::time::Duration;

/// Base URL used when no usable value is configured: the backend's own default bind address.
pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000";

pub const DEFAULT_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_MAX_RETRIES: u32 = 2;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 500;
pub const DEFAULT_PAGE_SIZE: u32 = 20;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub page_size: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let raw_url = std::env::var("YELP_API_URL").ok();

        let config = Self {
            api_base_url: resolve_base_url(raw_url.as_deref()),
            timeout_secs: std::env::var("YELP_API_TIMEOUT_SECS")
                .unwrap_or_else(|_| DEFAULT_TIMEOUT_SECS.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("YELP_API_TIMEOUT_SECS must be a whole number"))
                .and_then(|secs: u64| {
                    if secs == 0 {
                        anyhow::bail!("YELP_API_TIMEOUT_SECS must be greater than zero");
                    }
                    Ok(secs)
                })?,
            max_retries: std::env::var("YELP_API_MAX_RETRIES")
                .unwrap_or_else(|_| DEFAULT_MAX_RETRIES.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("YELP_API_MAX_RETRIES must be a whole number"))?,
            retry_delay_ms: std::env::var("YELP_API_RETRY_DELAY_MS")
                .unwrap_or_else(|_| DEFAULT_RETRY_DELAY_MS.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("YELP_API_RETRY_DELAY_MS must be a whole number"))?,
            page_size: std::env::var("YELP_PAGE_SIZE")
                .unwrap_or_else(|_| DEFAULT_PAGE_SIZE.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("YELP_PAGE_SIZE must be a whole number"))
                .and_then(|size: u32| {
                    if size == 0 {
                        anyhow::bail!("YELP_PAGE_SIZE must be greater than zero");
                    }
                    Ok(size)
                })?,
        };

        tracing::info!("Configuration loaded successfully");
        tracing::debug!("API base URL: {}", config.api_base_url);
        tracing::debug!(
            "Timeout: {}s, retries: {} x {}ms, page size: {}",
            config.timeout_secs,
            config.max_retries,
            config.retry_delay_ms,
            config.page_size
        );

        Ok(config)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)your-load-balancer-dns|<[^>]*>|\$\{[^}]*\}|changeme|example\.invalid")
            .expect("placeholder pattern is a valid regex")
    })
}

/// Returns true when `value` is an unfilled template rather than a real endpoint.
pub fn is_placeholder(value: &str) -> bool {
    placeholder_pattern().is_match(value)
}

/// Resolves the gateway base URL from an optional configured value.
///
/// A configured value is honored verbatim (minus trailing slashes) unless it is
/// blank or looks like a placeholder, in which case [`DEFAULT_API_BASE_URL`] is used.
pub fn resolve_base_url(configured: Option<&str>) -> String {
    match configured.map(|value| value.trim().trim_end_matches('/')) {
        None | Some("") => DEFAULT_API_BASE_URL.to_string(),
        Some(value) if is_placeholder(value) => {
            tracing::warn!(
                "Configured API URL looks like a placeholder ({}), falling back to {}",
                value,
                DEFAULT_API_BASE_URL
            );
            DEFAULT_API_BASE_URL.to_string()
        }
        Some(value) => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_or_blank_url_falls_back() {
        assert_eq!(resolve_base_url(None), DEFAULT_API_BASE_URL);
        assert_eq!(resolve_base_url(Some("")), DEFAULT_API_BASE_URL);
        assert_eq!(resolve_base_url(Some("   ")), DEFAULT_API_BASE_URL);
    }

    #[test]
    fn test_placeholder_url_falls_back() {
        assert_eq!(
            resolve_base_url(Some("http://your-load-balancer-dns.us-east-1.elb.amazonaws.com")),
            DEFAULT_API_BASE_URL
        );
        assert_eq!(
            resolve_base_url(Some("https://<api-host>/")),
            DEFAULT_API_BASE_URL
        );
        assert_eq!(
            resolve_base_url(Some("${YELP_API_URL}")),
            DEFAULT_API_BASE_URL
        );
    }

    #[test]
    fn test_real_url_is_honored() {
        assert_eq!(
            resolve_base_url(Some("https://192.168.0.9")),
            "https://192.168.0.9"
        );
        assert_eq!(
            resolve_base_url(Some("https://api.example.com/yelp/")),
            "https://api.example.com/yelp"
        );
    }

    #[test]
    fn test_default_config_values() {
        let config = Config::default();
        assert_eq!(config.page_size, 20);
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.timeout(), Duration::from_secs(300));
        assert_eq!(config.retry_delay(), Duration::from_millis(500));
    }
}
