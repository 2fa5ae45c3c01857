use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Path of the streaming proxy endpoint.
pub const STREAMING_PROXY_PATH: &str = "/api/v1/streamingProxy";

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_REFERER_URL: &str = "https://streameeeeee.site/";
const DEFAULT_CACHE_TTL_SECS: u64 = 600;
const DEFAULT_STATIC_DIR: &str = "public";

/// Which browser origins receive CORS headers
#[derive(Clone, Debug, PartialEq)]
pub enum AllowedOrigins {
    /// `*`: every origin
    Any,
    /// Exact origins, e.g. `https://player.example.com`
    List(Vec<String>),
}

impl AllowedOrigins {
    /// Parse `*` or a comma-separated list of origins.
    pub fn parse(value: &str) -> Self {
        let origins: Vec<String> = value
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(str::to_string)
            .collect();

        if origins.is_empty() || origins.iter().any(|o| o == "*") {
            AllowedOrigins::Any
        } else {
            AllowedOrigins::List(origins)
        }
    }

    pub fn allows(&self, origin: &str) -> bool {
        match self {
            AllowedOrigins::Any => true,
            AllowedOrigins::List(list) => list.iter().any(|o| o == origin),
        }
    }
}

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    /// CORS allowed-origins policy
    pub allowed_origins: AllowedOrigins,
    /// `Referer` header forced on every upstream request
    pub referer_url: String,
    /// Absolute prefix for rewritten playlist URLs (e.g. `https://proxy.example.com`).
    /// When unset, rewritten URLs are path-only and resolve against the proxy host.
    pub public_base_url: Option<String>,
    /// TTL of the internal response cache
    pub cache_ttl_secs: u64,
    /// Per-request upstream timeout, none by default
    pub upstream_timeout_secs: Option<u64>,
    /// Directory served for unmatched GET paths
    pub static_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables, with defaults for every value.
    ///
    /// Fails only when a variable is set but unparsable.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let port = match env::var("PORT") {
            Ok(v) => v
                .parse()
                .map_err(|e| format!("PORT must be a valid port number: {e}"))?,
            Err(_) => DEFAULT_PORT,
        };

        let allowed_origins =
            AllowedOrigins::parse(&env::var("ALLOWED_ORIGINS").unwrap_or_else(|_| "*".to_string()));

        let referer_url =
            env::var("REFERER_URL").unwrap_or_else(|_| DEFAULT_REFERER_URL.to_string());

        let public_base_url = env::var("PUBLIC_BASE_URL")
            .ok()
            .map(|v| v.trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty());

        let cache_ttl_secs = match env::var("CACHE_TTL_SECS") {
            Ok(v) => v
                .parse()
                .map_err(|e| format!("CACHE_TTL_SECS must be a number of seconds: {e}"))?,
            Err(_) => DEFAULT_CACHE_TTL_SECS,
        };

        let upstream_timeout_secs = match env::var("UPSTREAM_TIMEOUT_SECS") {
            Ok(v) => Some(
                v.parse()
                    .map_err(|e| format!("UPSTREAM_TIMEOUT_SECS must be a number of seconds: {e}"))?,
            ),
            Err(_) => None,
        };

        let static_dir = match env::var("STATIC_DIR") {
            Ok(v) if v.is_empty() => None,
            Ok(v) => Some(PathBuf::from(v)),
            Err(_) => Some(PathBuf::from(DEFAULT_STATIC_DIR)),
        };

        Ok(Config {
            port,
            allowed_origins,
            referer_url,
            public_base_url,
            cache_ttl_secs,
            upstream_timeout_secs,
            static_dir,
        })
    }

    /// Streaming endpoint that rewritten playlist URLs point at.
    pub fn proxy_base(&self) -> String {
        match &self.public_base_url {
            Some(base) => format!("{base}{STREAMING_PROXY_PATH}"),
            None => STREAMING_PROXY_PATH.to_string(),
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn upstream_timeout(&self) -> Option<Duration> {
        self.upstream_timeout_secs.map(Duration::from_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            allowed_origins: AllowedOrigins::Any,
            referer_url: DEFAULT_REFERER_URL.to_string(),
            public_base_url: None,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            upstream_timeout_secs: None,
            static_dir: Some(PathBuf::from(DEFAULT_STATIC_DIR)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Serialize all env-var tests to prevent races between parallel test threads.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const ALL_VARS: &[&str] = &[
        "PORT",
        "ALLOWED_ORIGINS",
        "REFERER_URL",
        "PUBLIC_BASE_URL",
        "CACHE_TTL_SECS",
        "UPSTREAM_TIMEOUT_SECS",
        "STATIC_DIR",
    ];

    /// Set env vars, run `f`, then restore original state.
    ///
    /// Every variable in `ALL_VARS` not named in `set` is removed while `f` runs.
    fn with_env(set: &[(&str, &str)], f: impl FnOnce()) {
        let _lock = ENV_LOCK.lock().unwrap_or_else(|p| p.into_inner());

        let saved: Vec<(&str, Option<String>)> = ALL_VARS
            .iter()
            .map(|k| (*k, std::env::var(k).ok()))
            .collect();

        for k in ALL_VARS {
            // SAFETY: serialized by ENV_LOCK, no other thread modifies env vars concurrently.
            unsafe { std::env::remove_var(k) };
        }
        for (k, v) in set {
            unsafe { std::env::set_var(k, v) };
        }

        f();

        for (k, old) in saved {
            match old {
                Some(v) => unsafe { std::env::set_var(k, v) },
                None => unsafe { std::env::remove_var(k) },
            }
        }
    }

    #[test]
    fn defaults_when_unset() {
        with_env(&[], || {
            let config = Config::from_env().expect("defaults should load");
            assert_eq!(config.port, 3000);
            assert_eq!(config.allowed_origins, AllowedOrigins::Any);
            assert_eq!(config.referer_url, "https://streameeeeee.site/");
            assert_eq!(config.public_base_url, None);
            assert_eq!(config.cache_ttl_secs, 600);
            assert_eq!(config.upstream_timeout_secs, None);
            assert_eq!(config.static_dir, Some(PathBuf::from("public")));
            assert_eq!(config.proxy_base(), "/api/v1/streamingProxy");
        });
    }

    #[test]
    fn invalid_port_is_rejected() {
        with_env(&[("PORT", "not-a-port")], || {
            assert!(Config::from_env().is_err());
        });
    }

    #[test]
    fn invalid_ttl_is_rejected() {
        with_env(&[("CACHE_TTL_SECS", "ten")], || {
            assert!(Config::from_env().is_err());
        });
    }

    #[test]
    fn overrides_are_read() {
        with_env(
            &[
                ("PORT", "8080"),
                ("REFERER_URL", "https://player.example/"),
                ("PUBLIC_BASE_URL", "https://proxy.example.com/"),
                ("CACHE_TTL_SECS", "30"),
                ("UPSTREAM_TIMEOUT_SECS", "15"),
                ("STATIC_DIR", ""),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.port, 8080);
                assert_eq!(config.referer_url, "https://player.example/");
                assert_eq!(
                    config.proxy_base(),
                    "https://proxy.example.com/api/v1/streamingProxy"
                );
                assert_eq!(config.cache_ttl(), Duration::from_secs(30));
                assert_eq!(config.upstream_timeout(), Some(Duration::from_secs(15)));
                assert_eq!(config.static_dir, None);
            },
        );
    }

    #[test]
    fn allowed_origins_list() {
        with_env(
            &[("ALLOWED_ORIGINS", "https://a.example, https://b.example")],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(
                    config.allowed_origins,
                    AllowedOrigins::List(vec![
                        "https://a.example".to_string(),
                        "https://b.example".to_string()
                    ])
                );
                assert!(config.allowed_origins.allows("https://b.example"));
                assert!(!config.allowed_origins.allows("https://evil.example"));
            },
        );
    }

    #[test]
    fn wildcard_anywhere_means_any() {
        assert_eq!(AllowedOrigins::parse("https://a.example,*"), AllowedOrigins::Any);
        assert_eq!(AllowedOrigins::parse(""), AllowedOrigins::Any);
    }
}
