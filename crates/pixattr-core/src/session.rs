//! Per-call environment: resource limits, diagnostics, and worker pools

use crate::diagnostics::{DiagnosticSink, TracingSink};
use crate::error::{Error, Result};
use std::sync::Arc;

/// Environment variable holding the worker thread ceiling.
pub const THREAD_LIMIT_ENV: &str = "PIXATTR_THREAD_LIMIT";

/// Process-wide resource ceilings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceLimits {
    threads: usize,
}

impl ResourceLimits {
    /// Limits with an explicit thread ceiling (at least 1).
    pub fn new(threads: usize) -> Self {
        Self {
            threads: threads.max(1),
        }
    }

    /// Read limits from `PIXATTR_THREAD_LIMIT`, falling back to the
    /// available parallelism.
    pub fn from_env() -> Self {
        let threads = std::env::var(THREAD_LIMIT_ENV)
            .ok()
            .and_then(|v| v.trim().parse::<usize>().ok())
            .filter(|&n| n > 0)
            .unwrap_or_else(|| {
                std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(1)
            });
        Self::new(threads)
    }

    /// Maximum number of worker threads.
    #[inline]
    pub fn threads(&self) -> usize {
        self.threads
    }
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Resource limits plus the diagnostic sink, passed to every operation.
///
/// # Examples
///
/// ```
/// use pixattr_core::{ResourceLimits, Session};
///
/// let session = Session::new(ResourceLimits::new(2));
/// assert_eq!(session.limits().threads(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct Session {
    limits: ResourceLimits,
    sink: Arc<dyn DiagnosticSink>,
}

impl Session {
    /// A session reporting to `tracing`.
    pub fn new(limits: ResourceLimits) -> Self {
        Self {
            limits,
            sink: Arc::new(TracingSink),
        }
    }

    /// Replace the diagnostic sink.
    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    #[inline]
    pub fn limits(&self) -> ResourceLimits {
        self.limits
    }

    #[inline]
    pub fn sink(&self) -> &dyn DiagnosticSink {
        self.sink.as_ref()
    }

    /// Build a worker pool for `units` independent units of work (rows or
    /// palette entries).
    ///
    /// The thread count is read once here: `min(thread limit, units)`.
    pub fn worker_pool(&self, units: usize) -> Result<rayon::ThreadPool> {
        let threads = self.limits.threads().min(units.max(1));
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("pixattr-worker-{i}"))
            .build()
            .map_err(|e| Error::WorkerPool(e.to_string()))
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(ResourceLimits::from_env())
    }
}
