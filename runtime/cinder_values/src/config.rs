//! Engine configuration.

use tracing::warn;

/// Payloads at or below this many bytes are stored inline.
pub const DEFAULT_INLINE_THRESHOLD: usize = 384;

/// Foreign bytes allocated since the last collection that force the next one.
pub const DEFAULT_ALLOC_LIMIT_TRIGGER: usize = 64 * 1024 * 1024;

/// Tunables for an [`Engine`](crate::Engine).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    pub inline_threshold: usize,
    pub alloc_limit_trigger: usize,
    /// Fill freed foreign buffers with `0xbb` before releasing them.
    pub poison_freed: bool,
    /// Initial object capacity of the heap.
    pub initial_heap_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            inline_threshold: DEFAULT_INLINE_THRESHOLD,
            alloc_limit_trigger: DEFAULT_ALLOC_LIMIT_TRIGGER,
            poison_freed: cfg!(debug_assertions),
            initial_heap_capacity: 1024,
        }
    }
}

impl EngineConfig {
    #[must_use]
    pub fn with_inline_threshold(mut self, bytes: usize) -> Self {
        self.inline_threshold = bytes;
        self
    }

    #[must_use]
    pub fn with_alloc_limit_trigger(mut self, bytes: usize) -> Self {
        self.alloc_limit_trigger = bytes;
        self
    }

    #[must_use]
    pub fn with_poison_freed(mut self, poison: bool) -> Self {
        self.poison_freed = poison;
        self
    }

    /// Defaults overridden by `CINDER_INLINE_MAX` and `CINDER_GC_TRIGGER`.
    ///
    /// Unparseable values are ignored with a warning.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(v) = env_usize("CINDER_INLINE_MAX") {
            config.inline_threshold = v;
        }
        if let Some(v) = env_usize("CINDER_GC_TRIGGER") {
            config.alloc_limit_trigger = v;
        }
        config
    }
}

fn env_usize(var: &str) -> Option<usize> {
    let raw = std::env::var(var).ok()?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(var, value = %raw, "ignoring non-numeric setting");
            None
        }
    }
}
