// Application configuration, loaded from environment variables and CLI flags.

use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_DATABASE_URL: &str = "sqlite:bulls.db?mode=rwc";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Database URL (SQLite connection string).
    pub database_url: String,
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Secret used to sign the session cookie. A random key is used when unset,
    /// which invalidates all cookies on restart.
    pub session_secret: Option<String>,
    /// Sessions with no guess for this long are deleted. `None` keeps them forever.
    pub session_idle_ttl: Option<Duration>,
    /// How often the idle-session sweeper runs.
    pub sweep_interval: Duration,
    /// Directory of frontend files served at `/` instead of the bundled page.
    pub static_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables and CLI arguments.
    ///
    /// Environment variables:
    /// - `DATABASE_URL` - SQLite connection string (default: `sqlite:bulls.db?mode=rwc`)
    /// - `PORT` - HTTP server port (default: 8080)
    /// - `SESSION_SECRET` - cookie signing secret
    /// - `SESSION_IDLE_TTL_SECS` - idle session lifetime, unset to disable expiry
    /// - `SWEEP_INTERVAL_SECS` - sweeper period (default: 60)
    /// - `STATIC_DIR` - Path to a frontend directory for static file serving
    ///
    /// CLI flags:
    /// - `--port <PORT>` - Override the port
    /// - `--session-ttl <SECS>` - Override the idle session lifetime
    pub fn load() -> Self {
        let args: Vec<String> = std::env::args().collect();
        Self::from_sources(&args, |key| std::env::var(key).ok())
    }

    /// Build a config from explicit arguments and an environment lookup.
    pub fn from_sources<F>(args: &[String], env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url =
            env("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        // Port: CLI flag --port takes precedence, then env var, then default
        let port = Self::parse_cli_value(args, "--port")
            .and_then(|v| v.parse().ok())
            .or_else(|| env("PORT").and_then(|v| v.parse().ok()))
            .unwrap_or(DEFAULT_PORT);

        let session_secret = env("SESSION_SECRET").filter(|s| !s.is_empty());

        let session_idle_ttl = Self::parse_cli_value(args, "--session-ttl")
            .or_else(|| env("SESSION_IDLE_TTL_SECS"))
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        let sweep_interval = env("SWEEP_INTERVAL_SECS")
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS));

        let static_dir = env("STATIC_DIR").map(PathBuf::from);

        Config {
            database_url,
            port,
            session_secret,
            session_idle_ttl,
            sweep_interval,
            static_dir,
        }
    }

    /// Parse a CLI flag value like `--port 8080`.
    pub(crate) fn parse_cli_value(args: &[String], flag: &str) -> Option<String> {
        args.windows(2).find_map(|pair| {
            if pair[0] == flag {
                Some(pair[1].clone())
            } else {
                None
            }
        })
    }
}
