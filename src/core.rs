use std::fmt;
use std::io;
use std::thread;
use std::time::{Duration, Instant};

use colored::Colorize;
use log::{debug, info};

use crate::config::Config;
use crate::conn::Connection;
use crate::error::{PingError, Result};
use crate::packet::{self, EchoReply, EchoRequest};
use crate::stats::{self, SharedStatistics};

/// Something that paces the probe loop.
pub trait Tick {
    /// Block until the next round is due.
    fn tick(&mut self);
}

/// Fires at `start + k * interval`. The first tick is one interval after
/// creation. Ticks that passed while a round overran are dropped.
pub struct Ticker {
    interval: Duration,
    next: Instant,
}

impl Ticker {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next: Instant::now() + interval,
        }
    }
}

impl Tick for Ticker {
    fn tick(&mut self) {
        let now = Instant::now();
        if self.next > now {
            thread::sleep(self.next - now);
        }
        if self.interval.is_zero() {
            return;
        }

        let behind = Instant::now().saturating_duration_since(self.next);
        let phase = behind.as_nanos() % self.interval.as_nanos();
        self.next += behind + self.interval - Duration::from_nanos(phase as u64);
    }
}

/// A completed round.
#[derive(Debug, Clone, PartialEq)]
pub struct Probe {
    pub reply: EchoReply,
    pub rtt_ms: f64,
}

impl fmt::Display for Probe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} bytes from {}: icmp_seq={} time={:.3}ms ttl={}",
            self.reply.size, self.reply.source, self.reply.seq, self.rtt_ms, self.reply.ttl
        )
    }
}

/// Drives echo rounds over one connection and feeds the shared statistics.
pub struct Prober<C> {
    conn: C,
    ident: u16,
    seq: u16,
    config: Config,
    stats: SharedStatistics,
}

impl<C: Connection> Prober<C> {
    pub fn new(conn: C, ident: u16, config: Config, stats: SharedStatistics) -> Self {
        Self {
            conn,
            ident,
            seq: 0,
            config,
            stats,
        }
    }

    pub fn ident(&self) -> u16 {
        self.ident
    }

    pub fn connection(&self) -> &C {
        &self.conn
    }

    /// Run rounds on every tick until `count` rounds are done, or forever.
    pub fn run<T: Tick>(&mut self, ticker: &mut T) {
        info!(
            "probing with ident {:#06x}, interval {:?}, timeout {:?}",
            self.ident(), self.config.interval, self.config.timeout
        );

        let mut rounds: u32 = 0;
        while self.config.count.map_or(true, |n| rounds < n) {
            ticker.tick();
            rounds += 1;

            match self.round() {
                Ok(probe) => println!("{}", probe),
                Err(e) => {
                    debug!("round {} lost: {:?}", self.seq, e);
                    println!("{}", format!("{}", e).red());
                }
            }
        }
    }

    /// One round: send a request, wait for its reply, record the outcome.
    /// An error means the round is lost; the attempt has been counted.
    pub fn round(&mut self) -> Result<Probe> {
        self.seq = self.seq.wrapping_add(1);
        let request = EchoRequest::new(self.ident, self.seq, self.config.size);
        stats::lock(&self.stats).begin_attempt();

        let (reply, rtt) = self.ping(&request)?;
        let rtt_ms = stats::lock(&self.stats).record_reply(rtt);
        Ok(Probe { reply, rtt_ms })
    }

    fn ping(&mut self, request: &EchoRequest) -> Result<(EchoReply, Duration)> {
        let packet = request.encode()?;

        self.conn
            .set_deadline(Instant::now() + self.config.timeout)?;
        let send_at = Instant::now();
        self.conn.write(&packet)?;
        stats::lock(&self.stats).record_transmit();
        debug!("sent icmp_seq={} ({} bytes)", request.seq, packet.len());

        self.wait_reply(request)
            .map(|(reply, t)| (reply, t.duration_since(send_at)))
    }

    fn wait_reply(&mut self, request: &EchoRequest) -> Result<(EchoReply, Instant)> {
        let mut buffer = vec![0u8; packet::reply_buffer_len(request.size)];

        // read until the reply we want shows up or the deadline fires
        loop {
            let size = self.conn.read(&mut buffer).map_err(|e| match e.kind() {
                io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => {
                    PingError::Timeout(request.seq)
                }
                _ => PingError::IOError(e),
            })?;
            let recv_at = Instant::now();

            match packet::decode_echo_reply(&buffer[..size]) {
                Ok(reply) if reply.answers(request) => return Ok((reply, recv_at)),
                Ok(reply) => {
                    debug!(
                        "discarding reply ident={:#06x} icmp_seq={}",
                        reply.ident, reply.seq
                    );
                }
                Err(PingError::NotEchoReply(typ)) => {
                    debug!("discarding icmp type {:?}", typ);
                }
                // truncated or corrupt, possibly another process's reply
                Err(PingError::InvalidPacket(e)) => {
                    debug!("discarding packet: {}", e);
                }
                Err(e) => return Err(e),
            }
        }
    }
}
