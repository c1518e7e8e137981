use std::fmt;
use std::net::Ipv4Addr;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Statistics shared between the probe loop and the interrupt handler.
pub type SharedStatistics = Arc<Mutex<RunStatistics>>;

/// Lock the shared statistics. A panic on the other side does not leave the
/// counters half-written, so a poisoned lock is still usable.
pub fn lock(stats: &SharedStatistics) -> MutexGuard<'_, RunStatistics> {
    stats.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Round-trip samples in milliseconds, in arrival order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleSet(Vec<f64>);

impl SampleSet {
    pub fn push(&mut self, rtt_ms: f64) {
        self.0.push(rtt_ms);
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug)]
pub struct RunStatistics {
    target: Ipv4Addr,
    cname: String,
    started_at: Instant,
    attempts: u64,
    transmitted: u64,
    received: u64,
    min: f64,
    max: f64,
    sum: f64,
    samples: SampleSet,
    finalized: bool,
}

impl RunStatistics {
    pub fn new(cname: impl Into<String>, target: Ipv4Addr) -> Self {
        Self {
            target,
            cname: cname.into(),
            started_at: Instant::now(),
            attempts: 0,
            transmitted: 0,
            received: 0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            sum: 0.0,
            samples: SampleSet::default(),
            finalized: false,
        }
    }

    pub fn shared(self) -> SharedStatistics {
        Arc::new(Mutex::new(self))
    }

    pub fn target(&self) -> Ipv4Addr {
        self.target
    }

    pub fn cname(&self) -> &str {
        &self.cname
    }

    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    pub fn transmitted(&self) -> u64 {
        self.transmitted
    }

    pub fn received(&self) -> u64 {
        self.received
    }

    /// Sum of all RTT samples in milliseconds.
    pub fn sum(&self) -> f64 {
        self.sum
    }

    pub fn samples(&self) -> &SampleSet {
        &self.samples
    }

    /// A round has started, whatever its outcome.
    pub fn begin_attempt(&mut self) {
        self.attempts += 1;
    }

    /// The request of the current round left the host.
    pub fn record_transmit(&mut self) {
        self.transmitted += 1;
    }

    pub fn record_reply(&mut self, rtt: Duration) -> f64 {
        let rtt_ms = rtt.as_nanos() as f64 / 1e6;
        self.received += 1;
        self.min = self.min.min(rtt_ms);
        self.max = self.max.max(rtt_ms);
        self.sum += rtt_ms;
        self.samples.push(rtt_ms);
        rtt_ms
    }

    /// Produce the run summary. Only the first call returns `Some`.
    pub fn finalize(&mut self) -> Option<Summary> {
        if self.finalized {
            return None;
        }
        self.finalized = true;

        let (avg, mdev) = mean_and_mdev(self.samples.as_slice(), self.attempts);
        let (min, max) = if self.samples.is_empty() {
            (0.0, 0.0)
        } else {
            (self.min, self.max)
        };

        Some(Summary {
            cname: self.cname.clone(),
            transmitted: self.transmitted,
            received: self.received,
            loss: packet_loss(self.attempts, self.transmitted, self.received),
            elapsed: self.started_at.elapsed(),
            min,
            avg,
            max,
            mdev,
        })
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }
}

/// Mean and mean deviation of `samples`.
///
/// Both divide by `attempts`, lost rounds included, not by the number of
/// samples. This matches the output of the tool this one replaces.
pub fn mean_and_mdev(samples: &[f64], attempts: u64) -> (f64, f64) {
    if attempts == 0 {
        return (0.0, 0.0);
    }
    let n = attempts as f64;
    let mean = samples.iter().sum::<f64>() / n;
    let squares: f64 = samples.iter().map(|s| (s - mean).powi(2)).sum();
    (mean, (squares / n).sqrt())
}

/// Reported loss: `attempts * 2 - transmitted - received`.
pub fn packet_loss(attempts: u64, transmitted: u64, received: u64) -> u64 {
    (attempts * 2).saturating_sub(transmitted + received)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub cname: String,
    pub transmitted: u64,
    pub received: u64,
    pub loss: u64,
    pub elapsed: Duration,
    pub min: f64,
    pub avg: f64,
    pub max: f64,
    pub mdev: f64,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\n--- {} ping statistics ---", self.cname)?;
        writeln!(
            f,
            "{} packets transmitted, {} received, {} packet loss, time {:.3}ms",
            self.transmitted,
            self.received,
            self.loss,
            self.elapsed.as_secs_f64() * 1000.0
        )?;
        write!(
            f,
            "rtt min/avg/max/mdev = {:.3}/{:.3}/{:.3}/{:.3} ms",
            self.min, self.avg, self.max, self.mdev
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn mean_and_mdev_of_three() {
        let (mean, mdev) = mean_and_mdev(&[10.0, 20.0, 30.0], 3);
        assert!((mean - 20.0).abs() < 1e-9);
        assert!((mdev - (200.0f64 / 3.0).sqrt()).abs() < 1e-9);
        assert!((mdev - 8.165).abs() < 1e-3);
    }

    #[test]
    fn lost_rounds_inflate_divisor() {
        let (mean, _) = mean_and_mdev(&[10.0, 20.0, 30.0], 4);
        assert!((mean - 15.0).abs() < 1e-9);
    }

    #[test]
    fn no_attempts() {
        assert_eq!(mean_and_mdev(&[], 0), (0.0, 0.0));
    }

    #[test]
    fn loss_formula() {
        assert_eq!(packet_loss(6, 5, 3), 4);
        assert_eq!(packet_loss(3, 3, 3), 0);
        assert_eq!(packet_loss(0, 0, 0), 0);
    }

    #[test]
    fn records_extremes_and_samples() {
        let mut stats = RunStatistics::new("example.com", Ipv4Addr::new(1, 2, 3, 4));
        for rtt in [20, 10, 30] {
            stats.begin_attempt();
            stats.record_transmit();
            stats.record_reply(ms(rtt));
        }
        stats.begin_attempt();
        stats.record_transmit();

        assert_eq!(stats.attempts(), 4);
        assert_eq!(stats.transmitted(), 4);
        assert_eq!(stats.received(), 3);
        assert_eq!(stats.samples().as_slice(), &[20.0, 10.0, 30.0]);
        assert_eq!(stats.samples().len(), 3);
        assert_eq!(stats.sum(), 60.0);

        let summary = stats.finalize().unwrap();
        assert_eq!(summary.cname, "example.com");
        assert_eq!(summary.min, 10.0);
        assert_eq!(summary.max, 30.0);
        assert!((summary.avg - 15.0).abs() < 1e-9);
        assert_eq!(summary.loss, 1);
    }

    #[test]
    fn finalize_only_once() {
        let mut stats = RunStatistics::new("a", Ipv4Addr::LOCALHOST);
        assert!(stats.finalize().is_some());
        assert!(stats.is_finalized());
        assert!(stats.finalize().is_none());
    }

    #[test]
    fn summary_without_replies() {
        let mut stats = RunStatistics::new("a", Ipv4Addr::LOCALHOST);
        stats.begin_attempt();
        let summary = stats.finalize().unwrap();
        assert_eq!((summary.min, summary.max), (0.0, 0.0));
        assert_eq!(summary.loss, 2);
    }

    #[test]
    fn summary_format() {
        let summary = Summary {
            cname: "example.com".into(),
            transmitted: 3,
            received: 3,
            loss: 0,
            elapsed: ms(2003),
            min: 10.0,
            avg: 20.0,
            max: 30.0,
            mdev: 8.16496580927726,
        };
        assert_eq!(
            summary.to_string(),
            "\n--- example.com ping statistics ---\n\
             3 packets transmitted, 3 received, 0 packet loss, time 2003.000ms\n\
             rtt min/avg/max/mdev = 10.000/20.000/30.000/8.165 ms"
        );
    }

    #[test]
    fn shared_lock_survives_poison() {
        let shared = RunStatistics::new("a", Ipv4Addr::LOCALHOST).shared();
        let clone = Arc::clone(&shared);
        let _ = std::thread::spawn(move || {
            let _guard = clone.lock().unwrap();
            panic!("poison");
        })
        .join();
        lock(&shared).begin_attempt();
        assert_eq!(lock(&shared).attempts(), 1);
    }

    proptest! {
        #[test]
        fn mean_bounded_by_extremes(samples in proptest::collection::vec(0.01f64..5000.0, 1..64)) {
            let attempts = samples.len() as u64;
            let (mean, mdev) = mean_and_mdev(&samples, attempts);
            let min = samples.iter().cloned().fold(f64::INFINITY, f64::min);
            let max = samples.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            prop_assert!(mean >= min - 1e-9 && mean <= max + 1e-9);
            prop_assert!(mdev >= 0.0 && mdev <= (max - min) + 1e-9);
        }

        #[test]
        fn loss_counts_each_missing_step(attempts in 0u64..1000, lost_writes in 0u64..1000, lost_reads in 0u64..1000) {
            let lost_writes = lost_writes.min(attempts);
            let transmitted = attempts - lost_writes;
            let received = transmitted - lost_reads.min(transmitted);
            prop_assert_eq!(
                packet_loss(attempts, transmitted, received),
                2 * lost_writes + (transmitted - received)
            );
        }
    }
}
