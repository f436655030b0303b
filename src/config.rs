use std::path::Path;

/// Top-level configuration, loaded from a JSON file layered under
/// `_`-separated environment overrides. Every field has a default so a
/// missing or partial file still produces a runnable configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Config {
    #[serde(default = "Config::default_hostname")]
    pub hostname: String,
    #[serde(default = "Config::default_port")]
    pub port: u16,
    #[serde(default = "Config::default_max_threads")]
    pub max_threads: usize,
    #[serde(default = "Config::default_cache_size")]
    pub cache_size: usize,
    #[serde(default)]
    pub log_file: Option<String>,
    #[serde(default = "Config::default_cache_file")]
    pub cache_file: String,
    #[serde(default = "Config::default_proxy_hostname")]
    pub proxy_hostname: String,
    #[serde(default = "Config::default_proxy_port")]
    pub proxy_port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hostname: Self::default_hostname(),
            port: Self::default_port(),
            max_threads: Self::default_max_threads(),
            cache_size: Self::default_cache_size(),
            log_file: None,
            cache_file: Self::default_cache_file(),
            proxy_hostname: Self::default_proxy_hostname(),
            proxy_port: Self::default_proxy_port(),
        }
    }
}

impl Config {
    fn default_hostname() -> String {
        "127.0.0.2".to_string()
    }

    fn default_port() -> u16 {
        53
    }

    fn default_max_threads() -> usize {
        5
    }

    fn default_cache_size() -> usize {
        100
    }

    fn default_cache_file() -> String {
        "cache.bin".to_string()
    }

    fn default_proxy_hostname() -> String {
        "a.root-servers.net".to_string()
    }

    fn default_proxy_port() -> u16 {
        53
    }
}

impl Config {
    /// Loads a JSON file layered under an `Environment` source, falling
    /// back to field defaults for anything missing.
    pub fn load(path: &Path) -> Result<Self, ::config::ConfigError> {
        let conf = ::config::Config::builder()
            .add_source(::config::File::from(path).format(::config::FileFormat::Json).required(true))
            .add_source(::config::Environment::default().separator("_"))
            .build()?;
        conf.try_deserialize()
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.hostname, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_values() {
        let config = Config::default();
        assert_eq!(config.hostname, "127.0.0.2");
        assert_eq!(config.port, 53);
        assert_eq!(config.max_threads, 5);
        assert_eq!(config.cache_size, 100);
        assert_eq!(config.cache_file, "cache.bin");
        assert_eq!(config.proxy_hostname, "a.root-servers.net");
        assert_eq!(config.proxy_port, 53);
        assert!(config.log_file.is_none());
    }

    #[test]
    fn round_trips_through_json() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.hostname, config.hostname);
        assert_eq!(parsed.cache_file, config.cache_file);
    }
}
