//! Advisory diagnostics and the single-subscriber error sink.
//!
//! Scanning and resolution never abort on ordinary misconfiguration; they
//! report a [`Diagnostic`] through the session's [`ErrorSink`] and continue
//! with a safe default. Severities are labels for the host, nothing more —
//! the engine never decides what counts as fatal.
//!
//! The sink holds at most one subscriber. Registering a new handler replaces
//! the previous one, and emitting with no handler registered is a silent
//! no-op: diagnostics are never buffered.

use std::fmt;

/// Advisory severity of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Notice,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Notice => "notice",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        f.write_str(s)
    }
}

/// Machine-readable diagnostic codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagCode {
    /// A version string failed to parse.
    VersionParse,
    /// A manifest document was empty or malformed.
    MetadataParse,
    /// `api_version` was absent or malformed in a manifest.
    InvalidApiVersion,
    /// `mod_version` was absent or malformed in a manifest.
    InvalidModVersion,
    /// A mod's API version scored below the configured minimum.
    ApiConflict,
    /// A mod's own version scored below patch level against its slot
    /// requirement.
    ModVersionConflict,
    /// Minor mismatch against an unstable (major 0) required API.
    PrereleaseApi,
    /// A mod directory has no reserved manifest document.
    MissingMetadata,
    /// A mod directory has no icon file.
    MissingIcon,
    /// A merge-rule contributor was malformed or unreadable.
    MergeFailure,
    /// An append-rule contributor was unreadable or not text.
    AppendFailure,
    /// An operation was invoked before any session existed.
    NoSession,
}

impl DiagCode {
    pub fn as_str(self) -> &'static str {
        match self {
            DiagCode::VersionParse => "version-parse",
            DiagCode::MetadataParse => "metadata-parse",
            DiagCode::InvalidApiVersion => "invalid-api-version",
            DiagCode::InvalidModVersion => "invalid-mod-version",
            DiagCode::ApiConflict => "api-conflict",
            DiagCode::ModVersionConflict => "mod-version-conflict",
            DiagCode::PrereleaseApi => "prerelease-api",
            DiagCode::MissingMetadata => "missing-metadata",
            DiagCode::MissingIcon => "missing-icon",
            DiagCode::MergeFailure => "merge-failure",
            DiagCode::AppendFailure => "append-failure",
            DiagCode::NoSession => "no-session",
        }
    }
}

impl fmt::Display for DiagCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One advisory report. Transient: delivered at most once, never persisted.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: DiagCode,
    pub message: String,
    /// What the diagnostic is about: a mod id, directory alias or virtual
    /// path, depending on the origin of the report.
    pub origin: String,
}

impl Diagnostic {
    pub fn notice(code: DiagCode, origin: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Notice,
            code,
            message: message.into(),
            origin: origin.into(),
        }
    }

    pub fn warning(code: DiagCode, origin: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
            origin: origin.into(),
        }
    }

    pub fn error(code: DiagCode, origin: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
            origin: origin.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} ({}): {}",
            self.severity, self.code, self.origin, self.message
        )
    }
}

type Handler = Box<dyn FnMut(&Diagnostic) + Send>;

/// Single-subscriber advisory channel shared by scanner and resolver.
#[derive(Default)]
pub struct ErrorSink {
    handler: Option<Handler>,
}

impl ErrorSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler, replacing any previous one.
    pub fn subscribe<F>(&mut self, handler: F)
    where
        F: FnMut(&Diagnostic) + Send + 'static,
    {
        self.handler = Some(Box::new(handler));
    }

    /// Remove the current handler, if any.
    pub fn unsubscribe(&mut self) {
        self.handler = None;
    }

    /// Deliver a diagnostic to the current handler, or drop it.
    ///
    /// Every diagnostic is also mirrored to the `tracing` log at a level
    /// matching its severity, so hosts without a subscriber still get logs.
    pub fn emit(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Notice => tracing::debug!(
                code = diagnostic.code.as_str(),
                origin = %diagnostic.origin,
                "{}",
                diagnostic.message
            ),
            Severity::Warning => tracing::warn!(
                code = diagnostic.code.as_str(),
                origin = %diagnostic.origin,
                "{}",
                diagnostic.message
            ),
            Severity::Error => tracing::error!(
                code = diagnostic.code.as_str(),
                origin = %diagnostic.origin,
                "{}",
                diagnostic.message
            ),
        }

        if let Some(handler) = &mut self.handler {
            handler(&diagnostic);
        }
    }
}

impl fmt::Debug for ErrorSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorSink")
            .field("subscribed", &self.handler.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_emit_without_subscriber_is_noop() {
        let mut sink = ErrorSink::new();
        sink.emit(Diagnostic::error(DiagCode::ApiConflict, "m", "dropped"));
    }

    #[test]
    fn test_subscribe_replaces_prior_handler() {
        let first = Arc::new(Mutex::new(0u32));
        let second = Arc::new(Mutex::new(0u32));

        let mut sink = ErrorSink::new();
        let counter = Arc::clone(&first);
        sink.subscribe(move |_| *counter.lock().unwrap() += 1);
        sink.emit(Diagnostic::notice(DiagCode::MissingIcon, "a", "one"));

        let counter = Arc::clone(&second);
        sink.subscribe(move |_| *counter.lock().unwrap() += 1);
        sink.emit(Diagnostic::notice(DiagCode::MissingIcon, "a", "two"));
        sink.emit(Diagnostic::notice(DiagCode::MissingIcon, "a", "three"));

        assert_eq!(*first.lock().unwrap(), 1);
        assert_eq!(*second.lock().unwrap(), 2);
    }

    #[test]
    fn test_unsubscribe_drops_emissions() {
        let count = Arc::new(Mutex::new(0u32));
        let mut sink = ErrorSink::new();
        let counter = Arc::clone(&count);
        sink.subscribe(move |_| *counter.lock().unwrap() += 1);
        sink.unsubscribe();
        sink.emit(Diagnostic::warning(DiagCode::NoSession, "", "dropped"));
        assert_eq!(*count.lock().unwrap(), 0);
    }
}
