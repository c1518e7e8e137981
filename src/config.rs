use std::time::Duration;

use crate::error::{PingError, Result};
use crate::packet::{ICMP_HEADER_LEN, IPV4_HEADER_LEN, MAX_PAYLOAD_LEN};

pub const DEFAULT_TIMEOUT_MS: u64 = 1000;
pub const DEFAULT_INTERVAL_MS: u64 = 1000;
pub const DEFAULT_SIZE: usize = 56;

/// Run settings, built once at startup and passed to whoever needs them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// How long each round waits for its reply.
    pub timeout: Duration,
    /// Period of the probe ticker.
    pub interval: Duration,
    /// Payload bytes per request.
    pub size: usize,
    /// Stop after this many rounds; `None` runs until interrupted.
    pub count: Option<u32>,
}

impl Config {
    pub fn new(timeout_ms: u64, interval_ms: u64, size: usize, count: Option<u32>) -> Result<Self> {
        if timeout_ms == 0 {
            return Err(PingError::InvalidConfig("timeout must be positive".into()));
        }
        if interval_ms == 0 {
            return Err(PingError::InvalidConfig("interval must be positive".into()));
        }
        if size > MAX_PAYLOAD_LEN {
            return Err(PingError::InvalidConfig(format!(
                "packet size {} is too large, maximum is {}",
                size, MAX_PAYLOAD_LEN
            )));
        }

        Ok(Self {
            timeout: Duration::from_millis(timeout_ms),
            interval: Duration::from_millis(interval_ms),
            size,
            count: count.filter(|&n| n != 0),
        })
    }

    /// Size of the IPv4 datagram carrying one request.
    pub fn datagram_size(&self) -> usize {
        self.size + ICMP_HEADER_LEN + IPV4_HEADER_LEN
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            interval: Duration::from_millis(DEFAULT_INTERVAL_MS),
            size: DEFAULT_SIZE,
            count: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.timeout, Duration::from_secs(1));
        assert_eq!(config.interval, Duration::from_secs(1));
        assert_eq!(config.size, 56);
        assert_eq!(config.count, None);
        assert_eq!(config.datagram_size(), 84);
        assert_eq!(Config::new(1000, 1000, 56, None).unwrap(), config);
    }

    #[test]
    fn zero_count_means_unlimited() {
        assert_eq!(Config::new(10, 10, 0, Some(0)).unwrap().count, None);
        assert_eq!(Config::new(10, 10, 0, Some(3)).unwrap().count, Some(3));
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(matches!(Config::new(0, 1000, 56, None), Err(PingError::InvalidConfig(_))));
        assert!(matches!(Config::new(1000, 0, 56, None), Err(PingError::InvalidConfig(_))));
        assert!(Config::new(1000, 1000, MAX_PAYLOAD_LEN, None).is_ok());
        assert!(matches!(
            Config::new(1000, 1000, MAX_PAYLOAD_LEN + 1, None),
            Err(PingError::InvalidConfig(_))
        ));
    }
}
