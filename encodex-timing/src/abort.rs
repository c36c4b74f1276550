use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Process-wide abort signal. Cloning shares the flag; once cancelled it stays cancelled.
#[derive(Debug, Clone, Default)]
pub struct AbortToken {
    cancelled: Arc<AtomicBool>,
}

impl AbortToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
