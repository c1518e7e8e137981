use std::io::{self, Read};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::{Duration, Instant};

use socket2::{Domain, Protocol, Socket, Type};

use crate::error::{PingError, Result};

/// The handle a probe round talks through.
///
/// `read` must fail with [`io::ErrorKind::TimedOut`] once the last deadline
/// passed to `set_deadline` has expired.
pub trait Connection {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize>;
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;
    fn set_deadline(&mut self, deadline: Instant) -> io::Result<()>;
}

/// Raw ICMPv4 socket connected to a single target.
pub struct RawConnection {
    socket: Socket,
    deadline: Option<Instant>,
}

impl RawConnection {
    pub fn open(to_addr: Ipv4Addr) -> Result<Self> {
        let addr = IpAddr::V4(to_addr);
        let connect_err = |source| PingError::Connect { addr, source };

        let socket = Socket::new(Domain::IPV4, Type::RAW, Some(Protocol::ICMPV4))
            .map_err(connect_err)?;
        // connecting lets the kernel drop replies from other hosts
        socket
            .connect(&SocketAddr::new(addr, 0).into())
            .map_err(connect_err)?;

        Ok(Self {
            socket,
            deadline: None,
        })
    }
}

const MIN_READ_TIMEOUT: Duration = Duration::from_micros(1);

/// Socket read timeout left before `deadline`, or `None` once it has passed.
///
/// The kernel takes whole microseconds and reads a zero timeout as "block
/// forever", so anything shorter is rounded up to one microsecond.
fn read_timeout(deadline: Instant, now: Instant) -> Option<Duration> {
    let remaining = deadline.saturating_duration_since(now);
    if remaining.is_zero() {
        return None;
    }
    Some(remaining.max(MIN_READ_TIMEOUT))
}

impl Connection for RawConnection {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.socket.send(buf)
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if let Some(deadline) = self.deadline {
            let timeout = read_timeout(deadline, Instant::now())
                .ok_or_else(|| io::Error::from(io::ErrorKind::TimedOut))?;
            self.socket.set_read_timeout(Some(timeout))?;
        }

        (&self.socket).read(buf).map_err(|e| {
            if e.kind() == io::ErrorKind::WouldBlock {
                io::ErrorKind::TimedOut.into()
            } else {
                e
            }
        })
    }

    fn set_deadline(&mut self, deadline: Instant) -> io::Result<()> {
        self.deadline = Some(deadline);
        Ok(())
    }
}
