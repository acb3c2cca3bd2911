//! Cooperative stop signal, polled between tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Asked between tests whether the run should stop scheduling more tests.
///
/// A running test body is never interrupted.
pub trait Stopper: Send + Sync {
    fn stop_requested(&self) -> bool;
}

/// A stopper that never fires.
#[derive(Debug, Default, Clone, Copy)]
pub struct NeverStop;

impl Stopper for NeverStop {
    fn stop_requested(&self) -> bool {
        false
    }
}

/// A shareable flag; clones observe the same state.
#[derive(Debug, Default, Clone)]
pub struct StopFlag {
    requested: Arc<AtomicBool>,
}

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_stop(&self) {
        if !self.requested.swap(true, Ordering::SeqCst) {
            tracing::debug!("stop requested");
        }
    }
}

impl Stopper for StopFlag {
    fn stop_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_state() {
        let flag = StopFlag::new();
        let other = flag.clone();
        assert!(!other.stop_requested());
        flag.request_stop();
        assert!(other.stop_requested());
        assert!(!NeverStop.stop_requested());
    }
}
