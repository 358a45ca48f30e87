//! Diagnostic logging for the session clients.

use classeviva_domain::{LogSink, Logging};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Target used for messages emitted through [`DebugLog`].
pub const LOG_TARGET: &str = "classeviva";

/// Output format of the global subscriber
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

/// The `Logging` capability of a client
///
/// Silent unless enabled. Enabled messages go to the configured sink, or to
/// `tracing` at debug level when there is none.
#[derive(Debug, Clone)]
pub struct DebugLog {
    enabled: bool,
    component: &'static str,
    sink: Option<LogSink>,
}

impl DebugLog {
    pub fn new(component: &'static str, enabled: bool, sink: Option<LogSink>) -> Self {
        Self { enabled, component, sink }
    }

    pub fn disabled(component: &'static str) -> Self {
        Self::new(component, false, None)
    }

    #[must_use]
    pub fn component(&self) -> &'static str {
        self.component
    }
}

impl Logging for DebugLog {
    fn debug_enabled(&self) -> bool {
        self.enabled
    }

    fn log(&self, message: &str) {
        if !self.enabled {
            return;
        }

        match &self.sink {
            Some(sink) => sink.write(&format!("[{}] {message}", self.component)),
            None => tracing::debug!(target: LOG_TARGET, component = self.component, "{message}"),
        }
    }
}

fn env_filter(debug: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if debug { "debug" } else { "info" };
        EnvFilter::new(format!("{level},hyper=warn,reqwest=warn,rustls=warn"))
    })
}

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` wins over `debug`. Returns `false` when a subscriber was
/// already installed, which is not an error.
pub fn init_tracing(debug: bool, format: LogFormat) -> bool {
    let registry = tracing_subscriber::registry().with(env_filter(debug));

    let installed = match format {
        LogFormat::Compact => registry
            .with(tracing_subscriber::fmt::layer().compact().with_target(true))
            .try_init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .try_init(),
    };

    installed.is_ok()
}
