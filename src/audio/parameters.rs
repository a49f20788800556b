// Atomic parameters - Lock-free communication UI ↔ Audio thread
// Uses atomic operations to share parameters between threads without locks

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Thread-safe f32 parameter using atomic operations
/// Converts f32 to u32 bits for atomic storage
#[derive(Clone)]
pub struct AtomicF32 {
    inner: Arc<AtomicU32>,
}

impl AtomicF32 {
    pub fn new(value: f32) -> Self {
        Self {
            inner: Arc::new(AtomicU32::new(value.to_bits())),
        }
    }

    /// Set the value (called from UI thread)
    pub fn set(&self, value: f32) {
        self.inner.store(value.to_bits(), Ordering::Relaxed);
    }

    /// Get the value (called from audio thread)
    pub fn get(&self) -> f32 {
        f32::from_bits(self.inner.load(Ordering::Relaxed))
    }
}

impl Default for AtomicF32 {
    fn default() -> Self {
        Self::new(0.0)
    }
}

/// Feature flags set by the entitlement/UI side
///
/// Clones share the same flags. Readers poll at the moment they need the
/// value; nothing is cached per event.
#[derive(Clone, Default)]
pub struct FeatureFlags {
    fx: Arc<AtomicBool>,
    quantize: Arc<AtomicBool>,
}

impl FeatureFlags {
    pub fn new(fx_enabled: bool, quantize_enabled: bool) -> Self {
        Self {
            fx: Arc::new(AtomicBool::new(fx_enabled)),
            quantize: Arc::new(AtomicBool::new(quantize_enabled)),
        }
    }

    pub fn fx_enabled(&self) -> bool {
        self.fx.load(Ordering::Relaxed)
    }

    pub fn set_fx_enabled(&self, enabled: bool) {
        self.fx.store(enabled, Ordering::Relaxed);
    }

    pub fn quantize_enabled(&self) -> bool {
        self.quantize.load(Ordering::Relaxed)
    }

    pub fn set_quantize_enabled(&self, enabled: bool) {
        self.quantize.store(enabled, Ordering::Relaxed);
    }

    /// Flip the fx flag, returning the new value
    pub fn toggle_fx(&self) -> bool {
        !self.fx.fetch_xor(true, Ordering::Relaxed)
    }

    /// Flip the quantize flag, returning the new value
    pub fn toggle_quantize(&self) -> bool {
        !self.quantize.fetch_xor(true, Ordering::Relaxed)
    }
}
