use std::{env, path::PathBuf, time::Duration};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_API_URL: &str = "https://api.github.com";
const DEFAULT_DATA_PATH: &str = "data/state.json";
const DEFAULT_INACTIVITY_DELAY_MS: u64 = 300;
const DEFAULT_AUTO_REFRESH_SECS: u64 = 60 * 60;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_path: PathBuf,
    pub github_token: Option<String>,
    pub github_api_url: String,
    pub inactivity_delay: Duration,
    pub auto_refresh: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            github_token: None,
            github_api_url: DEFAULT_API_URL.to_string(),
            inactivity_delay: Duration::from_millis(DEFAULT_INACTIVITY_DELAY_MS),
            auto_refresh: Duration::from_secs(DEFAULT_AUTO_REFRESH_SECS),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let port = env::var("PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(defaults.port);

        let data_path = env::var("APP_DATA_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.data_path);

        let github_token = env::var("GITHUB_TOKEN")
            .ok()
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty());

        let github_api_url = env::var("GITHUB_API_URL")
            .ok()
            .map(|url| url.trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or(defaults.github_api_url);

        let inactivity_delay = env::var("INACTIVITY_DELAY_MS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.inactivity_delay);

        let auto_refresh = env::var("AUTO_REFRESH_SECS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.auto_refresh);

        Self {
            port,
            data_path,
            github_token,
            github_api_url,
            inactivity_delay,
            auto_refresh,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.github_api_url, "https://api.github.com");
        assert_eq!(config.inactivity_delay, Duration::from_millis(300));
        assert_eq!(config.auto_refresh, Duration::from_secs(3600));
        assert!(config.github_token.is_none());
    }
}
