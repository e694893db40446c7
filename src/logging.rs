use std::io::IsTerminal;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::DEFAULT_LOG_LEVEL;

/// Installs the global `tracing` subscriber. `RUST_LOG`, when set, overrides
/// `level`.
pub fn init(level: &str) {
    let filter = build_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok(), level);
    let use_ansi = std::io::stdout().is_terminal();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_ansi(use_ansi).with_target(true))
        .init();
}

fn build_filter(env: Option<String>, level: &str) -> EnvFilter {
    env.and_then(|directives| EnvFilter::try_new(directives).ok())
        .or_else(|| EnvFilter::try_new(level).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_LEVEL))
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;

    #[test]
    fn build_filter__should_use_level_without_env() {
        assert_eq!(build_filter(None, "debug").to_string(), "debug");
    }

    #[test]
    fn build_filter__should_prefer_env_directives() {
        assert_eq!(
            build_filter(Some("pushkit=trace".to_string()), "info").to_string(),
            "pushkit=trace"
        );
    }
}
