use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::cli::LogLevel;

/// Effective level: `--log-level`, then `--verbose`, then the config file,
/// then warnings only
pub fn effective_level(
    flag: Option<LogLevel>,
    verbose: bool,
    configured: Option<&str>,
) -> LevelFilter {
    if let Some(level) = flag {
        return level.into();
    }
    if verbose {
        return LevelFilter::DEBUG;
    }
    configured
        .and_then(|s| s.parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::WARN)
}

/// Install the global subscriber, writing to stderr.
///
/// `RUST_LOG` wins over everything else when set.
pub fn init(level: LevelFilter) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = level.to_string().to_lowercase();
        EnvFilter::new(format!(
            "zettel_cli={level},zettel_core={level},zettel_config={level}"
        ))
    });

    // a second init (e.g. in tests) is harmless
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precedence() {
        assert_eq!(
            effective_level(Some(LogLevel::Trace), true, Some("error")),
            LevelFilter::TRACE
        );
        assert_eq!(effective_level(None, true, Some("error")), LevelFilter::DEBUG);
        assert_eq!(effective_level(None, false, Some("error")), LevelFilter::ERROR);
        assert_eq!(effective_level(None, false, Some("loud")), LevelFilter::WARN);
        assert_eq!(effective_level(None, false, None), LevelFilter::WARN);
    }
}
