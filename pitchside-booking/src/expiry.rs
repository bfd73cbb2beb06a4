use std::collections::HashMap;
use std::sync::Mutex;

use tokio::task::JoinHandle;
use uuid::Uuid;

/// Registry of the cancellable hold timers, one per Pending booking.
///
/// Aborting a timer that already fired is harmless: the expiry path
/// re-validates booking state under the partition lock before acting.
pub struct HoldTimers {
    timers: Mutex<HashMap<Uuid, JoinHandle<()>>>,
}

impl HoldTimers {
    pub fn new() -> Self {
        Self {
            timers: Mutex::new(HashMap::new()),
        }
    }

    /// Track the timer task guarding one booking's hold
    pub fn track(&self, booking_id: Uuid, handle: JoinHandle<()>) {
        let mut timers = self.timers.lock().unwrap();
        if let Some(previous) = timers.insert(booking_id, handle) {
            previous.abort();
        }
    }

    /// Abort and drop a booking's timer. Returns false when no timer was
    /// tracked (already fired or never scheduled).
    pub fn abort(&self, booking_id: &Uuid) -> bool {
        let handle = self.timers.lock().unwrap().remove(booking_id);
        match handle {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    /// Drop the bookkeeping for a timer that has fired
    pub fn forget(&self, booking_id: &Uuid) {
        self.timers.lock().unwrap().remove(booking_id);
    }

    /// Number of timers currently tracked
    pub fn active(&self) -> usize {
        self.timers.lock().unwrap().len()
    }
}

impl Default for HoldTimers {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_tracked_timer_fires_after_delay() {
        let timers = HoldTimers::new();
        let fired = Arc::new(AtomicBool::new(false));
        let booking_id = Uuid::new_v4();

        let flag = fired.clone();
        timers.track(
            booking_id,
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(900)).await;
                flag.store(true, Ordering::SeqCst);
            }),
        );

        // Poll the spawned task once so its sleep registers before the
        // paused clock moves.
        tokio::task::yield_now().await;

        tokio::time::advance(Duration::from_secs(899)).await;
        tokio::task::yield_now().await;
        assert!(!fired.load(Ordering::SeqCst));

        tokio::time::advance(Duration::from_secs(2)).await;
        tokio::task::yield_now().await;
        assert!(fired.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_aborted_timer_never_fires() {
        let timers = HoldTimers::new();
        let fired = Arc::new(AtomicBool::new(false));
        let booking_id = Uuid::new_v4();

        let flag = fired.clone();
        timers.track(
            booking_id,
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(900)).await;
                flag.store(true, Ordering::SeqCst);
            }),
        );

        assert!(timers.abort(&booking_id));
        assert_eq!(timers.active(), 0);

        tokio::time::advance(Duration::from_secs(2000)).await;
        tokio::task::yield_now().await;
        assert!(!fired.load(Ordering::SeqCst));

        // A second abort is a no-op
        assert!(!timers.abort(&booking_id));
    }
}
