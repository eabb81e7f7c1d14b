//! Configuration loader: merges defaults, config.toml, .env, and env vars.

use common::{Error, ServerConfig};
use std::net::SocketAddr;
use std::path::Path;

fn parse_positive_u64(raw: &str, env_name: &str) -> Result<u64, Error> {
    let parsed = raw
        .trim()
        .parse::<u64>()
        .map_err(|_| Error::Config(format!("{env_name} must be an integer > 0")))?;
    if parsed == 0 {
        return Err(Error::Config(format!("{env_name} must be an integer > 0")));
    }
    Ok(parsed)
}

fn parse_positive_usize(raw: &str, env_name: &str) -> Result<usize, Error> {
    let parsed = raw
        .trim()
        .parse::<usize>()
        .map_err(|_| Error::Config(format!("{env_name} must be an integer > 0")))?;
    if parsed == 0 {
        return Err(Error::Config(format!("{env_name} must be an integer > 0")));
    }
    Ok(parsed)
}

fn validate_config(config: &ServerConfig) -> Result<(), Error> {
    let mut issues: Vec<String> = Vec::new();

    if config.bind.parse::<SocketAddr>().is_err() {
        issues.push("bind must be a host:port socket address".into());
    }
    if config.sport_key.trim().is_empty() {
        issues.push("sport_key must not be empty".into());
    }
    if config.regions.trim().is_empty() {
        issues.push("regions must not be empty".into());
    }
    if config.bookmaker.trim().is_empty() {
        issues.push("bookmaker must not be empty".into());
    }
    if !(1..=3).contains(&config.scores_days_from) {
        issues.push("scores_days_from must be between 1 and 3".into());
    }

    if config.throttle.odds_ttl_secs == 0 {
        issues.push("throttle.odds_ttl_secs must be > 0".into());
    }
    if config.throttle.odds_window_secs == 0 {
        issues.push("throttle.odds_window_secs must be > 0".into());
    }
    if config.throttle.scores_ttl_secs == 0 {
        issues.push("throttle.scores_ttl_secs must be > 0".into());
    }
    if config.throttle.scores_window_secs == 0 {
        issues.push("throttle.scores_window_secs must be > 0".into());
    }
    if config.throttle.clock_ttl_secs == 0 {
        issues.push("throttle.clock_ttl_secs must be > 0".into());
    }
    if config.throttle.clock_window_secs == 0 {
        issues.push("throttle.clock_window_secs must be > 0".into());
    }

    if config.history.capacity == 0 {
        issues.push("history.capacity must be > 0".into());
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(Error::Config(format!(
            "Invalid config:\n - {}",
            issues.join("\n - ")
        )))
    }
}

/// Load server configuration from environment and optional config file.
pub fn load_config(config_path: Option<&Path>) -> Result<ServerConfig, Error> {
    // 1. Load .env file from project root or parent directories.
    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!("No .env file loaded: {}", e);
    }

    // 2. Start with defaults.
    let mut config = ServerConfig::default();

    // 3. Load config.toml. An explicitly named file must exist; the default
    //    path is optional.
    let env_path = std::env::var("ODDSBOARD_CONFIG").ok();
    let explicit = config_path.or_else(|| env_path.as_deref().map(Path::new));
    let path = explicit.unwrap_or_else(|| Path::new("config.toml"));
    if path.exists() {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        config = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))?;
    } else if explicit.is_some() {
        return Err(Error::Config(format!(
            "Config file not found: {}",
            path.display()
        )));
    }

    // 4. Override with environment variables (highest priority).
    if let Ok(key) = std::env::var("ODDS_API_KEY") {
        config.odds_api_key = key;
    }
    if let Ok(bind) = std::env::var("ODDSBOARD_BIND") {
        config.bind = bind;
    }
    if let Ok(sport) = std::env::var("ODDSBOARD_SPORT") {
        config.sport_key = sport;
    }
    if let Ok(bookmaker) = std::env::var("ODDSBOARD_BOOKMAKER") {
        config.bookmaker = bookmaker;
    }
    if let Ok(raw) = std::env::var("ODDSBOARD_HISTORY_CAPACITY") {
        config.history.capacity = parse_positive_usize(&raw, "ODDSBOARD_HISTORY_CAPACITY")?;
    }
    if let Ok(raw) = std::env::var("ODDSBOARD_ODDS_TTL_SECS") {
        config.throttle.odds_ttl_secs = parse_positive_u64(&raw, "ODDSBOARD_ODDS_TTL_SECS")?;
    }
    if let Ok(raw) = std::env::var("ODDSBOARD_ODDS_WINDOW_SECS") {
        config.throttle.odds_window_secs = parse_positive_u64(&raw, "ODDSBOARD_ODDS_WINDOW_SECS")?;
    }
    if let Ok(raw) = std::env::var("ODDSBOARD_SCORES_TTL_SECS") {
        config.throttle.scores_ttl_secs = parse_positive_u64(&raw, "ODDSBOARD_SCORES_TTL_SECS")?;
    }
    if let Ok(raw) = std::env::var("ODDSBOARD_SCORES_WINDOW_SECS") {
        config.throttle.scores_window_secs =
            parse_positive_u64(&raw, "ODDSBOARD_SCORES_WINDOW_SECS")?;
    }
    if let Ok(raw) = std::env::var("ODDSBOARD_CLOCK_TTL_SECS") {
        config.throttle.clock_ttl_secs = parse_positive_u64(&raw, "ODDSBOARD_CLOCK_TTL_SECS")?;
    }
    if let Ok(raw) = std::env::var("ODDSBOARD_CLOCK_WINDOW_SECS") {
        config.throttle.clock_window_secs =
            parse_positive_u64(&raw, "ODDSBOARD_CLOCK_WINDOW_SECS")?;
    }

    // 5. Validate required fields.
    if config.odds_api_key.is_empty() {
        return Err(Error::Config(
            "ODDS_API_KEY is required (set in .env or environment)".into(),
        ));
    }

    validate_config(&config)?;

    Ok(config)
}
