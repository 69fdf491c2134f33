//! Diagnostic reporting
//!
//! Warnings that accompany a valid fallback result, and fatal resource
//! errors that end the process, are reported through a [`DiagnosticSink`].
//! Recoverable failures are returned as `Err` values instead.

use std::fmt;
use std::sync::Mutex;

/// How serious a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    /// The operation produced a well-defined fallback result.
    Warning,
    /// The operation failed; the caller sees an `Err`.
    Error,
    /// A resource could not be acquired; the process terminates.
    FatalResourceError,
}

/// What went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// A bounding box came out empty.
    GeometryDoesNotContainImage,
    /// Scratch memory or a lookup table could not be allocated.
    MemoryAllocationFailed,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DiagnosticKind::GeometryDoesNotContainImage => "GeometryDoesNotContainImage",
            DiagnosticKind::MemoryAllocationFailed => "MemoryAllocationFailed",
        };
        f.write_str(name)
    }
}

/// One reported condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    /// Free-form context, usually the image filename.
    pub context: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {} `{}'", self.severity, self.kind, self.context)
    }
}

/// Receiver for diagnostics.
pub trait DiagnosticSink: Send + Sync + fmt::Debug {
    fn report(&self, diagnostic: Diagnostic);
}

/// Forwards diagnostics to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Warning => tracing::warn!(
                kind = %diagnostic.kind,
                context = %diagnostic.context,
                "image attribute warning"
            ),
            Severity::Error | Severity::FatalResourceError => tracing::error!(
                kind = %diagnostic.kind,
                context = %diagnostic.context,
                severity = ?diagnostic.severity,
                "image attribute error"
            ),
        }
    }
}

/// Keeps every diagnostic in memory, for callers that inspect them later.
#[derive(Debug, Default)]
pub struct CollectingSink {
    diagnostics: Mutex<Vec<Diagnostic>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything reported so far.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        match self.diagnostics.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Number of diagnostics of the given kind.
    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.diagnostics().iter().filter(|d| d.kind == kind).count()
    }
}

impl DiagnosticSink for CollectingSink {
    fn report(&self, diagnostic: Diagnostic) {
        tracing::debug!(%diagnostic, "collected");
        match self.diagnostics.lock() {
            Ok(mut guard) => guard.push(diagnostic),
            Err(poisoned) => poisoned.into_inner().push(diagnostic),
        }
    }
}

/// Report a fatal resource error and terminate the process.
pub fn fatal_resource_error(sink: &dyn DiagnosticSink, context: &str) -> ! {
    sink.report(Diagnostic {
        severity: Severity::FatalResourceError,
        kind: DiagnosticKind::MemoryAllocationFailed,
        context: context.to_string(),
    });
    std::process::abort()
}

/// Allocate a zeroed scratch vector, terminating the process if the
/// allocation cannot be satisfied.
pub fn acquire_scratch<T: Clone + Default>(
    sink: &dyn DiagnosticSink,
    len: usize,
    context: &str,
) -> Vec<T> {
    let mut v = Vec::new();
    if v.try_reserve_exact(len).is_err() {
        fatal_resource_error(sink, context);
    }
    v.resize(len, T::default());
    v
}
