//! Logging setup

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter for the verbosity flag; `RUST_LOG` takes precedence
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "factsync=info"
    } else {
        "factsync=warn"
    }
}

/// Install the global subscriber. Call once, from the binary.
pub fn init(verbose: bool) {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter(verbose).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_selects_level() {
        assert_eq!(default_filter(true), "factsync=info");
        assert_eq!(default_filter(false), "factsync=warn");
        assert!(default_filter(true).parse::<EnvFilter>().is_ok());
    }
}
