//! Execution counters served by the Status request.

use parking_lot::Mutex;

#[derive(Debug, Default, Clone, Copy)]
struct Counters {
    started: u64,
    completed: u64,
    timed_out: u64,
}

/// Process-wide execution counters: the only mutable state the daemon
/// shares across connections.
#[derive(Debug, Default)]
pub struct DaemonStats {
    counters: Mutex<Counters>,
}

impl DaemonStats {
    pub fn record_start(&self) {
        self.counters.lock().started += 1;
    }

    pub fn record_completion(&self, timed_out: bool) {
        let mut counters = self.counters.lock();
        counters.completed += 1;
        if timed_out {
            counters.timed_out += 1;
        }
    }

    /// (started, completed, timed_out)
    pub fn snapshot(&self) -> (u64, u64, u64) {
        let counters = *self.counters.lock();
        (counters.started, counters.completed, counters.timed_out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let stats = DaemonStats::default();
        stats.record_start();
        stats.record_start();
        stats.record_completion(false);
        stats.record_completion(true);

        assert_eq!(stats.snapshot(), (2, 2, 1));
    }
}
