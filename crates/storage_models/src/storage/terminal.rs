//! Terminal storage value collaborator.

use std::fmt;
use std::sync::Arc;

/// Injected pure function `(price, inventory) -> value` credited at storage end.
///
/// # Examples
///
/// ```
/// use storage_models::storage::TerminalStorageNpv;
///
/// let npv = TerminalStorageNpv::new(|price, inventory| price * inventory - 15.4);
/// assert_eq!(npv.evaluate(2.0, 10.0), 4.6);
/// ```
#[derive(Clone)]
pub struct TerminalStorageNpv(Arc<dyn Fn(f64, f64) -> f64 + Send + Sync>);

impl TerminalStorageNpv {
    /// Wrap a terminal value function.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(f64, f64) -> f64 + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Evaluate at the terminal spot price and inventory.
    #[inline]
    pub fn evaluate(&self, price: f64, inventory: f64) -> f64 {
        (self.0)(price, inventory)
    }
}

impl fmt::Debug for TerminalStorageNpv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TerminalStorageNpv(<fn>)")
    }
}
