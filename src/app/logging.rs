use super::config::{LogFormat, LogLevel};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Directives appended to every filter so dependency chatter stays out of the console.
const QUIET_DIRECTIVES: &[&str] = &["redis=warn", "mio=warn"];

/// Build the filter from `RUST_LOG` when set, otherwise from `level`.
pub fn build_filter(level: LogLevel) -> EnvFilter {
    let mut filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str()));
    for directive in QUIET_DIRECTIVES {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }
    filter
}

/// Install the global subscriber.
///
/// Returns `false` when a subscriber was already installed (tests, embedding hosts);
/// the existing one is kept.
pub fn init_tracing(level: LogLevel, format: LogFormat) -> bool {
    let filter = build_filter(level);

    let result = match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_current_span(true),
            )
            .with(filter)
            .try_init(),
        LogFormat::Compact => tracing_subscriber::registry()
            .with(fmt::layer().compact().with_target(true))
            .with(filter)
            .try_init(),
    };

    result.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_includes_quiet_directives() {
        let filter = build_filter(LogLevel::Debug).to_string();
        assert!(filter.contains("redis=warn"));
    }
}
