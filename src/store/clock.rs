use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

pub fn wall_clock_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

// Replica-side tag generator, encoded as last_ms * 1000 + seq. Lives under
// the store mutex, so no interior synchronization.
#[derive(Debug)]
pub struct TimestampGenerator {
    last_ms: i64,
    seq: i64,
}

impl TimestampGenerator {
    pub fn new() -> Self {
        Self { last_ms: 0, seq: 0 }
    }

    pub fn generate(&mut self) -> i64 {
        let now = wall_clock_ms();
        if now * 1000 > self.last_ms * 1000 + self.seq {
            self.last_ms = now;
            self.seq = 0;
        } else {
            self.seq += 1;
        }
        self.last_ms * 1000 + self.seq
    }

    // Keeps the next generate() strictly above any tag already installed.
    pub fn observe(&mut self, ts: i64) {
        if ts > self.last_ms * 1000 + self.seq {
            self.last_ms = ts / 1000;
            self.seq = ts % 1000;
        }
    }
}

impl Default for TimestampGenerator {
    fn default() -> Self {
        Self::new()
    }
}

// Client logical clock, seeded from the wall clock and advanced past every
// server-reported tag. Shared across a client's fan-out tasks.
#[derive(Debug)]
pub struct ClientClock {
    counter: AtomicI64,
}

impl ClientClock {
    pub fn new() -> Self {
        Self {
            counter: AtomicI64::new(wall_clock_ms()),
        }
    }

    pub fn next(&self) -> i64 {
        self.counter.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn advance_past(&self, ts: i64) -> i64 {
        loop {
            let current = self.counter.load(Ordering::SeqCst);
            let next = current.max(ts) + 1;
            if self
                .counter
                .compare_exchange_weak(current, next, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                return next;
            }
        }
    }

    pub fn observe(&self, ts: i64) {
        loop {
            let current = self.counter.load(Ordering::SeqCst);
            if ts <= current {
                return;
            }
            if self
                .counter
                .compare_exchange_weak(current, ts, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                return;
            }
        }
    }

    pub fn current(&self) -> i64 {
        self.counter.load(Ordering::SeqCst)
    }
}

impl Default for ClientClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generator_is_strictly_increasing() {
        let mut gen = TimestampGenerator::new();
        let mut last = 0;
        for _ in 0..10_000 {
            let ts = gen.generate();
            assert!(ts > last, "tag {ts} not above {last}");
            last = ts;
        }
    }

    #[test]
    fn generator_stays_above_observed_tags() {
        let mut gen = TimestampGenerator::new();
        let far_ahead = 5_000_000_000_000_000_000;
        gen.observe(far_ahead);
        assert!(gen.generate() > far_ahead);
    }

    #[test]
    fn observing_an_old_tag_is_a_no_op() {
        let mut gen = TimestampGenerator::new();
        let ts = gen.generate();
        gen.observe(ts - 1);
        assert!(gen.generate() > ts);
    }

    #[test]
    fn client_clock_next_is_strictly_increasing() {
        let clock = ClientClock::new();
        let a = clock.next();
        let b = clock.next();
        assert!(b > a);
        assert_eq!(clock.current(), b);
    }

    #[test]
    fn advance_past_lands_above_the_observation() {
        let clock = ClientClock::new();
        let observed = clock.current() + 1_000;
        let advanced = clock.advance_past(observed);
        assert_eq!(advanced, observed + 1);
        assert_eq!(clock.current(), advanced);
    }

    #[test]
    fn observe_never_moves_the_clock_backwards() {
        let clock = ClientClock::new();
        let before = clock.current();
        clock.observe(before - 50);
        assert_eq!(clock.current(), before);
        clock.observe(before + 50);
        assert_eq!(clock.current(), before + 50);
    }
}
