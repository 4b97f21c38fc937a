//! Tracing initialisation for subeval binaries.
//!
//! Call [`init_tracing`] once at program start. Later calls are ignored
//! because the global subscriber can only be set once per process.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Filter used when `RUST_LOG` is unset: subeval crates at `level`,
/// everything else at `warn`.
fn default_directives(level: Level) -> String {
    format!("warn,subeval_core={0},subeval={0}", level.as_str().to_lowercase())
}

/// Initialise the global tracing subscriber.
///
/// * `json` — emit newline-delimited JSON log lines.
/// * `level` — verbosity of subeval's own events when `RUST_LOG` is not set.
///
/// Logs go to stderr; stdout carries command output only.
pub fn init_tracing(json: bool, level: Level) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)));
    let layer = fmt::layer().with_target(false).with_writer(std::io::stderr);

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry.with(layer.json()).try_init().ok();
    } else {
        registry.with(layer).try_init().ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_directives_scope_level_to_subeval() {
        assert_eq!(
            default_directives(Level::DEBUG),
            "warn,subeval_core=debug,subeval=debug"
        );
    }
}
