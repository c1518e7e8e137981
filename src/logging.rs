//! Stderr backend for the `log` facade.

use std::io::{self, Write};

use colored::{ColoredString, Colorize};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};

struct StderrLogger;

static LOGGER: StderrLogger = StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let _ = writeln!(
            io::stderr().lock(),
            "{} {}",
            format_prefix(record.level(), record.target()),
            record.args()
        );
    }

    fn flush(&self) {
        let _ = io::stderr().flush();
    }
}

fn level_name(level: Level) -> ColoredString {
    match level {
        Level::Error => "ERROR".red(),
        Level::Warn => "WARN".yellow(),
        Level::Info => "INFO".green(),
        Level::Debug => "DEBUG".cyan(),
        Level::Trace => "TRACE".white(),
    }
}

fn format_prefix(level: Level, target: &str) -> String {
    format!("{} {}:", level_name(level), target)
}

/// Install the logger. Fails if a logger is already set.
pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_logger(&LOGGER)?;
    log::set_max_level(level);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_names_level_and_target() {
        colored::control::set_override(false);
        assert_eq!(format_prefix(Level::Warn, "icmp_ping::core"), "WARN icmp_ping::core:");
        assert_eq!(format_prefix(Level::Error, "main"), "ERROR main:");
    }

    #[test]
    fn second_init_fails() {
        let _ = init(LevelFilter::Warn);
        assert!(init(LevelFilter::Debug).is_err());
        assert!(log::log_enabled!(log::Level::Error));
    }
}
