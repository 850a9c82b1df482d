//! Cooperative stop/pause flags shared between the manager and the engine.
//!
//! The engine only ever reads these at wave boundaries — it never aborts a
//! node that is already running.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct RunControl {
    stopped: Arc<AtomicBool>,
    paused: Arc<AtomicBool>,
}

impl RunControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_and_pause_are_independent_flags() {
        let control = RunControl::new();
        assert!(!control.is_stopped());
        assert!(!control.is_paused());

        control.pause();
        assert!(control.is_paused());
        assert!(!control.is_stopped());

        control.stop();
        assert!(control.is_stopped());

        control.resume();
        assert!(!control.is_paused());
        assert!(control.is_stopped());
    }

    #[test]
    fn clones_share_the_same_flags() {
        let control = RunControl::new();
        let clone = control.clone();
        clone.stop();
        assert!(control.is_stopped());
    }
}
