//! Cooperative cancellation and progress reporting.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Progress callback receiving the completed fraction in `[0, 1]`.
pub type ProgressCallback = Arc<dyn Fn(f64) + Send + Sync>;

/// Shared cancellation flag, checked by the engines between time steps or
/// scenario batches.
///
/// # Examples
///
/// ```rust
/// use storage_pricing::config::CancellationToken;
///
/// let token = CancellationToken::new();
/// let handle = token.clone();
/// handle.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Clone, Debug, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// Creates a token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    #[inline]
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Returns true once cancellation has been requested.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Optional cancellation token and progress callback for a run.
#[derive(Clone, Default)]
pub struct RunControl {
    cancellation: Option<CancellationToken>,
    progress: Option<ProgressCallback>,
}

impl RunControl {
    /// No cancellation, no progress reporting.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Attach a progress callback.
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(f64) + Send + Sync + 'static,
    {
        self.progress = Some(Arc::new(callback));
        self
    }

    /// True if a cancellation token is attached and has been cancelled.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }

    /// Same cancellation token, progress reporting dropped. Used for
    /// sub-runs that execute concurrently with the reporting run.
    pub(crate) fn without_progress(&self) -> Self {
        Self {
            cancellation: self.cancellation.clone(),
            progress: None,
        }
    }

    /// Report progress, clamped to `[0, 1]`.
    #[inline]
    pub fn report(&self, fraction: f64) {
        if let Some(callback) = &self.progress {
            callback(fraction.clamp(0.0, 1.0));
        }
    }
}

impl fmt::Debug for RunControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunControl")
            .field("cancellation", &self.cancellation)
            .field("progress", &self.progress.as_ref().map(|_| "<fn>"))
            .finish()
    }
}
