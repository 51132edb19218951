use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation flag for long-running scans.
/// Cloned handles share the same flag; any holder may raise it.
#[derive(Debug, Clone, Default)]
pub struct AbortFlag {
    raised: Arc<AtomicBool>,
}

impl AbortFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn abort(&self) {
        self.raised.store(true, Ordering::Relaxed);
    }

    pub fn is_aborted(&self) -> bool {
        self.raised.load(Ordering::Relaxed)
    }

    /// A guard that raises this flag when it goes out of scope.
    pub fn abort_on_drop(&self) -> AbortOnDrop {
        AbortOnDrop(self.clone())
    }
}

/// Raises the wrapped flag on drop, so work tied to an abandoned future stops.
#[derive(Debug)]
pub struct AbortOnDrop(AbortFlag);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}
