use std::io;
use std::process;
use std::sync::Arc;

use clap::{self, value_t, Arg, ArgMatches};
use colored::Colorize;
use icmp_ping::stats::{self, SharedStatistics};
use icmp_ping::{logging, resolve, Config, PingError, Prober, RawConnection, RunStatistics, Ticker};
use log::{error, info, LevelFilter};
use rand::random;

// Package meta info
const NAME: &str = env!("CARGO_PKG_NAME");
const VERSION: &str = env!("CARGO_PKG_VERSION");
const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

struct Arguments {
    target: String,
    verbose: bool,
    config: Config,
}

fn app() -> clap::App<'static, 'static> {
    clap::App::new(NAME)
        .version(VERSION)
        .about(DESCRIPTION)
        .arg(
            Arg::with_name("target")
                .value_name("HOST")
                .help("domain name or ipv4 address")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::with_name("timeout")
                .short("w")
                .value_name("TIMEOUT")
                .help("millisecond to wait for each reply")
                .default_value("1000")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("interval")
                .short("i")
                .value_name("INTERVAL")
                .help("millisecond between sending each packet")
                .default_value("1000")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("size")
                .short("l")
                .value_name("SIZE")
                .help("number of data bytes to be sent")
                .default_value("56")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("count")
                .short("c")
                .value_name("COUNT")
                .help("stop after <count> packets, 0 means never")
                .default_value("0")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .help("log every packet sent and discarded"),
        )
}

fn parse_args(matches: &ArgMatches) -> Result<Arguments, PingError> {
    let number = |e: clap::Error| PingError::InvalidConfig(e.message);

    let timeout = value_t!(matches, "timeout", u64).map_err(number)?;
    let interval = value_t!(matches, "interval", u64).map_err(number)?;
    let size = value_t!(matches, "size", usize).map_err(number)?;
    let count = value_t!(matches, "count", u32).map_err(number)?;

    Ok(Arguments {
        target: matches.value_of("target").unwrap_or_default().to_string(),
        verbose: matches.is_present("verbose"),
        config: Config::new(timeout, interval, size, Some(count))?,
    })
}

/// Print the summary unless it was already printed.
fn finish(stats: &SharedStatistics) {
    let mut stats = stats::lock(stats);
    if let Some(summary) = stats.finalize() {
        info!("stopped pinging {}", stats.target());
        println!("{}", summary);
    }
}

fn run(arguments: Arguments) -> Result<(), PingError> {
    let resolution = resolve(&arguments.target)?;
    let to_addr = resolution.addr();
    let conn = RawConnection::open(to_addr)?;

    let config = arguments.config;
    println!(
        "PING {} ({}) {}({}) bytes of data.",
        resolution.cname.blue(),
        format!("{}", to_addr).blue(),
        config.size,
        config.datagram_size()
    );

    let shared = RunStatistics::new(resolution.cname, to_addr).shared();
    let on_interrupt = Arc::clone(&shared);
    ctrlc::set_handler(move || {
        finish(&on_interrupt);
        process::exit(0);
    })
    .map_err(|e| PingError::IOError(io::Error::new(io::ErrorKind::Other, e.to_string())))?;

    let mut ticker = Ticker::new(config.interval);
    let mut prober = Prober::new(conn, random::<u16>(), config, Arc::clone(&shared));
    prober.run(&mut ticker);

    info!("all rounds done");
    finish(&shared);
    Ok(())
}

fn main() {
    let matches = app().get_matches();

    let arguments = match parse_args(&matches) {
        Ok(arguments) => arguments,
        Err(e) => {
            let _ = logging::init(LevelFilter::Warn);
            error!("{}", e);
            return;
        }
    };

    let level = if arguments.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    let _ = logging::init(level);

    let target = arguments.target.clone();
    match run(arguments) {
        Err(e) if e.is_fatal() => error!("cannot ping {}: {}", target, e),
        Err(e) => error!("ping {} aborted: {}", target, e),
        Ok(()) => {}
    }
}
