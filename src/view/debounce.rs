/// Restartable delay for coalescing saves.
///
/// Each `queue` replaces the pending deadline; `take_ready` fires at most
/// once per queued burst.
#[derive(Debug, Clone)]
pub struct SaveDebouncer {
    delay_ms: u64,
    queued_at: Option<u64>,
}

impl SaveDebouncer {
    pub const fn new(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            queued_at: None,
        }
    }

    pub const fn delay_ms(&self) -> u64 {
        self.delay_ms
    }

    /// Start (or restart) the delay at `now_ms`.
    pub const fn queue(&mut self, now_ms: u64) {
        self.queued_at = Some(now_ms);
    }

    /// Returns `true` once the delay has elapsed, clearing the pending state.
    pub fn take_ready(&mut self, now_ms: u64) -> bool {
        let Some(queued_at) = self.queued_at else {
            return false;
        };
        if now_ms.saturating_sub(queued_at) >= self.delay_ms {
            self.queued_at = None;
            true
        } else {
            false
        }
    }

    pub const fn cancel(&mut self) {
        self.queued_at = None;
    }

    pub const fn is_pending(&self) -> bool {
        self.queued_at.is_some()
    }

    /// When the pending save becomes due.
    pub fn deadline(&self) -> Option<u64> {
        self.queued_at
            .map(|queued_at| queued_at.saturating_add(self.delay_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_ready_before_delay() {
        let mut debouncer = SaveDebouncer::new(100);
        debouncer.queue(1_000);
        assert!(!debouncer.take_ready(1_099));
        assert!(debouncer.is_pending());
        assert!(debouncer.take_ready(1_100));
        assert!(!debouncer.is_pending());
        assert!(!debouncer.take_ready(5_000));
    }

    #[test]
    fn test_requeue_restarts_delay() {
        let mut debouncer = SaveDebouncer::new(100);
        debouncer.queue(0);
        debouncer.queue(80);
        assert!(!debouncer.take_ready(150));
        assert_eq!(debouncer.deadline(), Some(180));
        assert!(debouncer.take_ready(180));
    }

    #[test]
    fn test_cancel_clears_pending() {
        let mut debouncer = SaveDebouncer::new(10);
        debouncer.queue(0);
        debouncer.cancel();
        assert!(!debouncer.take_ready(100));
        assert_eq!(debouncer.deadline(), None);
    }
}
