pub mod checksum;
pub mod config;
pub mod conn;
mod core;
mod error;
pub mod logging;
pub mod packet;
pub mod resolve;
pub mod stats;

pub use crate::config::Config;
pub use crate::conn::{Connection, RawConnection};
pub use crate::core::{Probe, Prober, Tick, Ticker};
pub use crate::error::{InvalidPacketError, PingError, Result};
pub use crate::resolve::{resolve, Resolution};
pub use crate::stats::{RunStatistics, SharedStatistics, Summary};
