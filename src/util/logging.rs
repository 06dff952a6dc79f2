//! Structured logging setup for rulesmith
//!
//! The library itself only emits `tracing` events: per-file failures at `warn`,
//! skipped files at `debug`, finished packages at `info`. Binaries and tests that
//! want to see them call one of the initializers below once at startup.
//!
//! # Example
//!
//! ```no_run
//! use rulesmith::util::logging;
//!
//! // RULESMITH_LOG_LEVEL=debug RULESMITH_LOG_JSON=true
//! logging::init_from_env();
//!
//! tracing::info!(dir = "pkg/foo", "Analyzing directory");
//! ```

use std::env;
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LEVEL_ENV: &str = "RULESMITH_LOG_LEVEL";
const JSON_ENV: &str = "RULESMITH_LOG_JSON";

static INIT: Once = Once::new();

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Minimum level for events from this crate. `RUST_LOG` still applies on top.
    pub level: Level,

    /// One JSON object per event instead of human readable lines.
    pub use_json: bool,

    /// Include the module path (e.g. `rulesmith::packages`).
    pub include_target: bool,

    /// Include file and line number.
    pub include_location: bool,

    pub include_thread_ids: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            use_json: false,
            include_target: true,
            include_location: false,
            include_thread_ids: false,
        }
    }
}

impl LoggingConfig {
    pub fn with_level(level: Level) -> Self {
        Self {
            level,
            ..Default::default()
        }
    }

    /// JSON output with full event metadata.
    pub fn production() -> Self {
        Self {
            level: Level::INFO,
            use_json: true,
            include_target: true,
            include_location: true,
            include_thread_ids: true,
        }
    }

    /// Human readable output at debug level.
    pub fn development() -> Self {
        Self {
            level: Level::DEBUG,
            ..Default::default()
        }
    }

    /// Reads `RULESMITH_LOG_LEVEL` and `RULESMITH_LOG_JSON`, falling back to the
    /// defaults for anything unset.
    pub fn from_env() -> Self {
        let level = env::var(LEVEL_ENV)
            .map(|v| parse_level(&v))
            .unwrap_or(Level::INFO);

        let use_json = env::var(JSON_ENV)
            .ok()
            .and_then(|v| v.parse::<bool>().ok())
            .unwrap_or(false);

        Self {
            level,
            use_json,
            ..Default::default()
        }
    }

    fn crate_directive(&self) -> Option<Directive> {
        format!("{}={}", env!("CARGO_PKG_NAME"), self.level)
            .parse()
            .ok()
    }
}

/// Parses a level name, case-insensitively. Unknown names fall back to INFO.
///
/// ```
/// use rulesmith::util::logging::parse_level;
/// use tracing::Level;
///
/// assert_eq!(parse_level("Debug"), Level::DEBUG);
/// assert_eq!(parse_level("loud"), Level::INFO);
/// ```
pub fn parse_level(level_str: &str) -> Level {
    match level_str.trim().to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => {
            eprintln!(
                "Invalid log level '{}', defaulting to INFO. Valid levels: trace, debug, info, warn, error",
                level_str
            );
            Level::INFO
        }
    }
}

/// Installs the global subscriber. Only the first call has any effect.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let mut filter = EnvFilter::from_default_env();
        if let Some(directive) = config.crate_directive() {
            filter = filter.add_directive(directive);
        }

        let registry = tracing_subscriber::registry().with(filter);
        let layer = fmt::layer()
            .with_target(config.include_target)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_thread_ids(config.include_thread_ids)
            .with_thread_names(config.include_thread_ids);

        // try_init: a subscriber installed by the host application wins.
        let result = if config.use_json {
            registry.with(layer.json()).try_init()
        } else {
            registry.with(layer).try_init()
        };
        if let Err(e) = result {
            eprintln!("Logging already initialized: {}", e);
        }
    });
}

pub fn init_default() {
    init_logging(LoggingConfig::default());
}

pub fn init_from_env() {
    init_logging(LoggingConfig::from_env());
}
