//! Capability contracts a session client composes
//!
//! The three traits are narrow and independent: logging, app
//! identity and authorization state. None of them exposes a way to change the
//! authorization state; that only happens inside the client lifecycle.

use std::fmt;
use std::sync::Arc;

use crate::types::App;

/// Diagnostic logging, active only when debug is enabled.
pub trait Logging {
    fn debug_enabled(&self) -> bool;

    /// Emit a diagnostic message. Must never fail.
    fn log(&self, message: &str);
}

/// Application identity sent in outbound identification headers.
pub trait AppIdentity {
    fn app(&self) -> Option<App>;
}

/// Read-only view of the authorization state.
pub trait Authorization {
    fn authorized(&self) -> bool;
}

/// User supplied destination for diagnostic messages.
#[derive(Clone)]
pub struct LogSink(Arc<dyn Fn(&str) + Send + Sync>);

impl LogSink {
    pub fn new(sink: impl Fn(&str) + Send + Sync + 'static) -> Self {
        Self(Arc::new(sink))
    }

    pub fn write(&self, message: &str) {
        (self.0)(message);
    }
}

impl fmt::Debug for LogSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("LogSink(..)")
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[test]
    fn log_sink_forwards_messages() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let captured = Arc::clone(&seen);
        let sink = LogSink::new(move |msg| captured.lock().unwrap().push(msg.to_string()));

        sink.write("hello");
        sink.clone().write("again");

        assert_eq!(*seen.lock().unwrap(), vec!["hello".to_string(), "again".to_string()]);
        assert_eq!(format!("{sink:?}"), "LogSink(..)");
    }
}
