//! Shared atomic controls.

use core::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// A shared float variable that can be accessed from multiple threads.
///
/// ### Example
/// ```
/// use pvoc::shared::Shared;
/// let shared = Shared::new(1.0);
/// let control = shared.clone();
/// control.set_value(2.0);
/// assert_eq!(shared.value(), 2.0);
/// ```
#[derive(Default, Clone)]
pub struct Shared {
    value: Arc<AtomicU32>,
}

impl Shared {
    pub fn new(value: f32) -> Self {
        Self {
            value: Arc::new(AtomicU32::new(value.to_bits())),
        }
    }

    /// Set the value of this variable.
    #[inline]
    pub fn set_value(&self, value: f32) {
        self.value.store(value.to_bits(), Ordering::Relaxed);
    }

    /// Get the value of this variable.
    #[inline]
    pub fn value(&self) -> f32 {
        f32::from_bits(self.value.load(Ordering::Relaxed))
    }
}

/// A node parameter: either a fixed scalar or a [`Shared`] control that a
/// host thread modulates while the node runs. Nodes re-read parameters on
/// every hop, so control changes take effect at the next spectral frame.
#[derive(Clone)]
pub enum Param {
    Fixed(f32),
    Control(Shared),
}

impl Param {
    /// Current parameter value.
    #[inline]
    pub fn value(&self) -> f32 {
        match self {
            Param::Fixed(x) => *x,
            Param::Control(shared) => shared.value(),
        }
    }
}

impl Default for Param {
    fn default() -> Self {
        Param::Fixed(0.0)
    }
}

impl From<f32> for Param {
    fn from(value: f32) -> Self {
        Param::Fixed(value)
    }
}

impl From<f64> for Param {
    fn from(value: f64) -> Self {
        Param::Fixed(value as f32)
    }
}

impl From<Shared> for Param {
    fn from(shared: Shared) -> Self {
        Param::Control(shared)
    }
}

impl From<&Shared> for Param {
    fn from(shared: &Shared) -> Self {
        Param::Control(shared.clone())
    }
}
